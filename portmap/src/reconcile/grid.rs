//! Cell-addressable grid boundary.
//!
//! Rows and columns are zero-based sheet coordinates (`A1` is `(0, 0)`).
//! A grid loads one rectangle, serves reads from it, stages writes, and
//! flushes every staged write in one batched save.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{GridError, Result};

static A1_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)([0-9]+):([A-Za-z]+)([0-9]+)$").unwrap());

/// An inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl GridRange {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.first_row..=self.last_row
    }

    pub fn cols(&self) -> std::ops::RangeInclusive<usize> {
        self.first_col..=self.last_col
    }

    /// A1 address of a single cell.
    pub fn cell_a1(row: usize, col: usize) -> String {
        format!("{}{}", column_name(col), row + 1)
    }
}

impl fmt::Display for GridRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            Self::cell_a1(self.first_row, self.first_col),
            Self::cell_a1(self.last_row, self.last_col)
        )
    }
}

impl FromStr for GridRange {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GridError::InvalidRange(s.to_string());
        let caps = A1_RANGE.captures(s.trim()).ok_or_else(invalid)?;

        let row = |i: usize| -> Option<usize> {
            caps[i].parse::<usize>().ok().and_then(|r| r.checked_sub(1))
        };
        let (first_row, last_row) = (row(2).ok_or_else(invalid)?, row(4).ok_or_else(invalid)?);
        let first_col = column_index(&caps[1]).ok_or_else(invalid)?;
        let last_col = column_index(&caps[3]).ok_or_else(invalid)?;

        if first_row > last_row || first_col > last_col {
            return Err(invalid().into());
        }
        Ok(Self::new(first_row, first_col, last_row, last_col))
    }
}

/// Zero-based index of a column name (`A` = 0, `AA` = 26).
pub fn column_index(name: &str) -> Option<usize> {
    let mut acc: usize = 0;
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    acc.checked_sub(1)
}

/// Column name of a zero-based index.
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        n -= 1;
        name.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    name.iter().rev().collect()
}

/// External cell grid.
pub trait CellGrid: Send {
    /// Load a rectangle, replacing anything loaded before.
    fn load(&mut self, range: GridRange) -> impl Future<Output = Result<()>> + Send;

    /// Current value of a loaded cell (staged value if one exists).
    /// `None` outside the loaded rectangle.
    fn get(&self, row: usize, col: usize) -> Option<&str>;

    /// Stage a write. Returns `false` when the cell already holds `value`.
    fn set(&mut self, row: usize, col: usize, value: &str) -> Result<bool>;

    /// Flush all staged writes in one batch. Returns the number of cells written.
    fn save(&mut self) -> impl Future<Output = Result<usize>> + Send;
}

/// Loaded rectangle plus staged writes, shared by grid backends.
#[derive(Debug, Clone, Default)]
pub struct CellBuffer {
    range: Option<GridRange>,
    /// Rows relative to the range origin; may be ragged.
    values: Vec<Vec<String>>,
    staged: IndexMap<(usize, usize), String>,
}

impl CellBuffer {
    /// Replace the buffer contents with freshly loaded rows.
    pub fn fill(&mut self, range: GridRange, values: Vec<Vec<String>>) {
        self.range = Some(range);
        self.values = values;
        self.staged.clear();
    }

    pub fn range(&self) -> Option<GridRange> {
        self.range
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        let range = self.range.filter(|r| r.contains(row, col))?;
        if let Some(value) = self.staged.get(&(row, col)) {
            return Some(value.as_str());
        }
        let loaded = self
            .values
            .get(row - range.first_row)
            .and_then(|r| r.get(col - range.first_col))
            .map(String::as_str);
        Some(loaded.unwrap_or(""))
    }

    pub fn set(&mut self, row: usize, col: usize, value: &str) -> Result<bool> {
        match self.get(row, col) {
            None => Err(GridError::OutOfBounds { row, col }.into()),
            Some(current) if current == value => Ok(false),
            Some(_) => {
                self.staged.insert((row, col), value.to_string());
                Ok(true)
            }
        }
    }

    /// Staged writes in staging order.
    pub fn staged(&self) -> impl Iterator<Item = ((usize, usize), &str)> {
        self.staged.iter().map(|(&cell, value)| (cell, value.as_str()))
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Fold staged writes into the loaded values after a successful save.
    pub fn commit(&mut self) -> usize {
        let Some(range) = self.range else {
            return 0;
        };
        let count = self.staged.len();
        for ((row, col), value) in self.staged.drain(..) {
            let (r, c) = (row - range.first_row, col - range.first_col);
            if self.values.len() <= r {
                self.values.resize_with(r + 1, Vec::new);
            }
            let cells = &mut self.values[r];
            if cells.len() <= c {
                cells.resize(c + 1, String::new());
            }
            cells[c] = value;
        }
        count
    }
}

/// In-memory grid standing in for a remote sheet.
#[derive(Debug, Clone, Default)]
pub struct MemoryGrid {
    /// The backing "remote" cells, absolute coordinates.
    cells: Vec<Vec<String>>,
    buffer: CellBuffer,
    saves: usize,
}

impl MemoryGrid {
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            cells: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            ..Self::default()
        }
    }

    /// Value held by the backing sheet, ignoring anything unsaved.
    pub fn saved_cell(&self, row: usize, col: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .map_or("", String::as_str)
    }

    /// Number of non-empty batched saves performed.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl CellGrid for MemoryGrid {
    async fn load(&mut self, range: GridRange) -> Result<()> {
        let values = self
            .cells
            .iter()
            .skip(range.first_row)
            .take(range.last_row - range.first_row + 1)
            .map(|row| {
                row.iter()
                    .skip(range.first_col)
                    .take(range.last_col - range.first_col + 1)
                    .cloned()
                    .collect()
            })
            .collect();
        self.buffer.fill(range, values);
        Ok(())
    }

    fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.buffer.get(row, col)
    }

    fn set(&mut self, row: usize, col: usize, value: &str) -> Result<bool> {
        self.buffer.set(row, col, value)
    }

    async fn save(&mut self) -> Result<usize> {
        if self.buffer.staged_len() == 0 {
            return Ok(0);
        }
        for ((row, col), value) in self.buffer.staged() {
            if self.cells.len() <= row {
                self.cells.resize_with(row + 1, Vec::new);
            }
            let cells = &mut self.cells[row];
            if cells.len() <= col {
                cells.resize(col + 1, String::new());
            }
            cells[col] = value.to_string();
        }
        self.saves += 1;
        Ok(self.buffer.commit())
    }
}
