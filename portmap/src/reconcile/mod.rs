//! Spreadsheet reconciliation.
//!
//! Each data row names a switch (`ConnIP`, `ConnPort`) and a physical port
//! (`PortAlias`). The first inventory record at that location fills the
//! row's MAC cell and, when those columns exist, its target IP and speed
//! cells. Rows are never added or removed; rows without a match are left
//! untouched. All writes are flushed in one batched save.

pub mod auth;
pub mod grid;
pub mod header;
pub mod sheets;

pub use auth::{ServiceAccount, SheetAuth};
pub use grid::{CellGrid, GridRange, MemoryGrid};
pub use header::{ColumnMap, HeaderField};
pub use sheets::SheetsGrid;

use log::info;

use crate::correlate::DeviceRecord;
use crate::error::Result;
use crate::inventory::{Inventory, PLACEHOLDER_KEY};

/// Human-readable label for a vendor speed code. Unknown codes have none.
pub fn speed_label(code: &str) -> Option<&'static str> {
    match code {
        "2500" => Some("2.5G"),
        "1000" => Some("1G"),
        _ => None,
    }
}

/// Cells to write for one matched row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    /// Zero-based sheet row.
    pub row: usize,
    pub mac: String,
    pub ip: String,
    pub speed_code: String,
    /// `(column, value)` pairs.
    pub cells: Vec<(usize, String)>,
}

/// Options for a reconciliation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Plan and log updates without staging or saving anything.
    pub dry_run: bool,
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub columns: Option<ColumnMap>,
    pub updates: Vec<RowUpdate>,
    /// Cells actually changed by the batched save.
    pub cells_written: usize,
}

impl ReconcileSummary {
    pub fn rows_matched(&self) -> usize {
        self.updates.len()
    }
}

/// First record, in inventory order, located at the given triple.
fn find_record<'a>(
    inventory: &'a Inventory,
    conn_ip: &str,
    conn_port: &str,
    port_alias: &str,
) -> Option<(&'a str, &'a DeviceRecord)> {
    inventory
        .iter()
        .filter(|(mac, _)| *mac != PLACEHOLDER_KEY)
        .find(|(_, record)| record.is_at(conn_ip, conn_port, port_alias))
}

/// Work out every row update without touching the grid.
pub fn plan_updates<G: CellGrid>(
    grid: &G,
    range: &GridRange,
    columns: &ColumnMap,
    inventory: &Inventory,
) -> Vec<RowUpdate> {
    let mut updates = Vec::new();

    for row in range.rows().skip(1) {
        let cell = |col: usize| grid.get(row, col).unwrap_or("");
        let (conn_ip, conn_port, port_alias) = (
            cell(columns.conn_ip),
            cell(columns.conn_port),
            cell(columns.port_alias),
        );
        if conn_ip.is_empty() || conn_port.is_empty() || port_alias.is_empty() {
            continue;
        }

        let Some((mac, record)) = find_record(inventory, conn_ip, conn_port, port_alias) else {
            continue;
        };

        let mut cells = vec![(columns.mac, mac.to_string())];
        if let Some(col) = columns.target_ip.filter(|_| !record.ip_address.is_empty()) {
            cells.push((col, record.ip_address.clone()));
        }
        if let (Some(col), Some(label)) = (columns.speed, speed_label(&record.speed_code)) {
            cells.push((col, label.to_string()));
        }

        updates.push(RowUpdate {
            row,
            mac: mac.to_string(),
            ip: record.ip_address.clone(),
            speed_code: record.speed_code.clone(),
            cells,
        });
    }

    updates
}

/// Load `range`, match rows against the inventory, stage and save updates.
///
/// Fails before staging anything when a required header column is missing.
pub async fn reconcile<G: CellGrid>(
    grid: &mut G,
    range: GridRange,
    inventory: &Inventory,
    options: ReconcileOptions,
) -> Result<ReconcileSummary> {
    grid.load(range).await?;
    info!("Loaded cells {}", range);

    let columns = ColumnMap::resolve(&*grid, &range)?;
    info!(
        "Resolved columns: ConnIP={}, ConnPort={}, PortAlias={}, MAC={}, TargetIP={:?}, Speed={:?}",
        columns.conn_ip,
        columns.conn_port,
        columns.port_alias,
        columns.mac,
        columns.target_ip,
        columns.speed
    );

    let updates = plan_updates(&*grid, &range, &columns, inventory);
    for update in &updates {
        info!(
            "{} row {}: MAC={}, IP={}, Speed={}",
            if options.dry_run { "Would update" } else { "Updating" },
            update.row + 1,
            update.mac,
            update.ip,
            update.speed_code
        );
    }

    let mut summary = ReconcileSummary {
        columns: Some(columns),
        updates,
        cells_written: 0,
    };

    if options.dry_run {
        info!("Dry run: {} rows would be updated", summary.rows_matched());
        return Ok(summary);
    }

    for update in &summary.updates {
        for (col, value) in &update.cells {
            grid.set(update.row, *col, value)?;
        }
    }
    summary.cells_written = grid.save().await?;

    info!(
        "Done: {} rows matched, {} cells written",
        summary.rows_matched(),
        summary.cells_written
    );
    Ok(summary)
}
