//! Header row column resolution.

use std::fmt;

use super::grid::{CellGrid, GridRange};
use crate::error::{ReconcileError, Result};

/// Logical columns the reconciler reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    ConnIp,
    ConnPort,
    PortAlias,
    Mac,
    TargetIp,
    Speed,
}

impl HeaderField {
    /// Classification order: a header cell binds to the first field it matches.
    pub const ALL: [HeaderField; 6] = [
        HeaderField::ConnIp,
        HeaderField::ConnPort,
        HeaderField::PortAlias,
        HeaderField::Mac,
        HeaderField::TargetIp,
        HeaderField::Speed,
    ];

    /// Lower-case substrings that identify this field's header.
    pub fn needles(self) -> &'static [&'static str] {
        match self {
            HeaderField::ConnIp => &["connip", "連線ip", "conn ip"],
            HeaderField::ConnPort => &["connport", "連線port", "conn port"],
            HeaderField::PortAlias => &["portalias", "port別名", "port alias"],
            HeaderField::Mac => &["mac"],
            HeaderField::TargetIp => &["對接ip", "target ip", "targetip"],
            HeaderField::Speed => &["speed", "速度"],
        }
    }

    /// Whether the reconciler cannot run without this column.
    pub fn is_required(self) -> bool {
        !matches!(self, HeaderField::TargetIp | HeaderField::Speed)
    }

    /// The field a header text names, if any. Case-insensitive substring match.
    pub fn classify(header: &str) -> Option<HeaderField> {
        let header = header.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.needles().iter().any(|n| header.contains(n)))
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeaderField::ConnIp => "ConnIP",
            HeaderField::ConnPort => "ConnPort",
            HeaderField::PortAlias => "PortAlias",
            HeaderField::Mac => "MAC",
            HeaderField::TargetIp => "TargetIP",
            HeaderField::Speed => "Speed",
        };
        f.write_str(name)
    }
}

/// Resolved column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub conn_ip: usize,
    pub conn_port: usize,
    pub port_alias: usize,
    pub mac: usize,
    pub target_ip: Option<usize>,
    pub speed: Option<usize>,
}

impl ColumnMap {
    /// Scan the first row of `range` left to right. The leftmost column
    /// matching a field is bound to it; later matches are ignored.
    pub fn resolve<G: CellGrid>(grid: &G, range: &GridRange) -> Result<Self> {
        let mut found: [Option<usize>; 6] = [None; 6];

        for col in range.cols() {
            let Some(text) = grid.get(range.first_row, col) else {
                continue;
            };
            if let Some(field) = HeaderField::classify(text) {
                let slot = &mut found[field as usize];
                if slot.is_none() {
                    *slot = Some(col);
                }
            }
        }

        let required = |field: HeaderField| -> Result<usize> {
            found[field as usize].ok_or_else(|| ReconcileError::MissingColumn(field).into())
        };

        Ok(Self {
            conn_ip: required(HeaderField::ConnIp)?,
            conn_port: required(HeaderField::ConnPort)?,
            port_alias: required(HeaderField::PortAlias)?,
            mac: required(HeaderField::Mac)?,
            target_ip: found[HeaderField::TargetIp as usize],
            speed: found[HeaderField::Speed as usize],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::grid::MemoryGrid;

    async fn resolve(headers: &[&str]) -> Result<ColumnMap> {
        let mut grid = MemoryGrid::from_rows(vec![headers.to_vec()]);
        let range: GridRange = "A1:M5".parse().unwrap();
        grid.load(range).await.unwrap();
        ColumnMap::resolve(&grid, &range)
    }

    #[test]
    fn test_classify_language_variants() {
        assert_eq!(HeaderField::classify("ConnPort"), Some(HeaderField::ConnPort));
        assert_eq!(HeaderField::classify("連線port"), Some(HeaderField::ConnPort));
        assert_eq!(HeaderField::classify("Conn Port"), Some(HeaderField::ConnPort));
        assert_eq!(HeaderField::classify("連線IP"), Some(HeaderField::ConnIp));
        assert_eq!(HeaderField::classify("Port別名"), Some(HeaderField::PortAlias));
        assert_eq!(HeaderField::classify("MAC Address"), Some(HeaderField::Mac));
        assert_eq!(HeaderField::classify("對接IP"), Some(HeaderField::TargetIp));
        assert_eq!(HeaderField::classify("Link 速度"), Some(HeaderField::Speed));
        assert_eq!(HeaderField::classify("Notes"), None);
    }

    #[tokio::test]
    async fn test_resolve_all_columns() {
        let columns = resolve(&["Name", "ConnIP", "ConnPort", "PortAlias", "MAC", "TargetIP", "Speed"])
            .await
            .unwrap();
        assert_eq!(
            columns,
            ColumnMap {
                conn_ip: 1,
                conn_port: 2,
                port_alias: 3,
                mac: 4,
                target_ip: Some(5),
                speed: Some(6),
            }
        );
    }

    #[tokio::test]
    async fn test_leftmost_match_wins() {
        let columns = resolve(&["mac", "ConnIP", "ConnPort", "PortAlias", "Old MAC"])
            .await
            .unwrap();
        assert_eq!(columns.mac, 0);
    }

    #[tokio::test]
    async fn test_optional_columns_may_be_missing() {
        let columns = resolve(&["連線IP", "連線Port", "Port別名", "MAC"]).await.unwrap();
        assert_eq!(columns.target_ip, None);
        assert_eq!(columns.speed, None);
    }

    #[tokio::test]
    async fn test_missing_required_column_named() {
        let err = resolve(&["ConnIP", "ConnPort", "MAC"]).await.unwrap_err();
        assert!(err.to_string().contains("PortAlias"));
    }
}
