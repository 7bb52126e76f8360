//! Parsers for the three switch CLI reports.
//!
//! Each parser takes the raw stdout of one command and returns an ordered
//! mapping. Lines that do not have the expected shape are skipped; a parser
//! never fails. Column positions are fixed by the vendor's table layout:
//!
//! | Report | Line filter | Key | Value |
//! |---|---|---|---|
//! | `show mac address-table` | not a header/legend line | token 1 (MAC) | token 3 (port) |
//! | `show ip arp` | contains `Internet` | token 3 (MAC) | token 1 (IP) |
//! | `show interface status` | first token starts with `eth-` | token 0 (port) | token 3 (speed) |
//!
//! Later lines override earlier ones for the same key.

pub mod arp_table;
pub mod interface_status;
pub mod mac_table;

use std::fmt;

use indexmap::IndexMap;

use crate::session::ExecOutput;

/// MAC address -> physical port.
pub type MacTable = IndexMap<String, String>;

/// MAC address -> IP address.
pub type ArpTable = IndexMap<String, String>;

/// Port name -> raw vendor speed code.
pub type SpeedTable = IndexMap<String, String>;

/// Minimum number of whitespace-separated tokens on a data line.
const MIN_TOKENS: usize = 4;

/// The three reports fetched from every switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    MacTable,
    ArpTable,
    InterfaceStatus,
}

impl ReportKind {
    /// All kinds, in the order they are issued.
    pub const ALL: [ReportKind; 3] = [
        ReportKind::MacTable,
        ReportKind::ArpTable,
        ReportKind::InterfaceStatus,
    ];

    /// The CLI command that produces this report.
    pub fn command(self) -> &'static str {
        match self {
            ReportKind::MacTable => "show mac address-table",
            ReportKind::ArpTable => "show ip arp",
            ReportKind::InterfaceStatus => "show interface status",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportKind::MacTable => "mac-table",
            ReportKind::ArpTable => "arp-table",
            ReportKind::InterfaceStatus => "interface-status",
        };
        f.write_str(name)
    }
}

/// Raw text of one report, consumed once by its parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    pub kind: ReportKind,
    pub text: String,
    pub exit_status: Option<u32>,
}

impl RawReport {
    /// Build a report from command output. Only stdout is parsed.
    pub fn from_output(kind: ReportKind, output: ExecOutput) -> Self {
        Self {
            kind,
            text: output.stdout,
            exit_status: output.exit_status,
        }
    }
}

/// Split a trimmed line into tokens if it has enough columns.
fn columns(line: &str) -> Option<Vec<&str>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    (tokens.len() >= MIN_TOKENS).then_some(tokens)
}
