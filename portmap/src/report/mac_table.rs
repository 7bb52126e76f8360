//! `show mac address-table` parser.

use std::collections::HashSet;

use indexmap::IndexSet;
use log::trace;

use super::{MacTable, columns};

/// Substrings that mark a title, header, rule or legend line.
const SKIP_MARKERS: &[&str] = &["---", "Vlan", "Mac Address Table", "(*)", "(MO)", "(E)"];

/// Check whether a trimmed line is a candidate table row.
pub fn is_entry_line(line: &str) -> bool {
    !line.is_empty() && !SKIP_MARKERS.iter().any(|m| line.contains(m))
}

/// Extract `(mac, port)` from a line, if it has the table row shape.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if !is_entry_line(line) {
        return None;
    }
    let tokens = columns(line)?;
    Some((tokens[1], tokens[3]))
}

/// Parse the MAC address table into MAC -> port.
///
/// A MAC seen on any ignored port is dropped from the result entirely, in
/// whichever order the lines arrive. Otherwise the last line for a MAC wins.
/// An ignored-port line followed by an allowed-port line for the same MAC
/// still drops that MAC.
pub fn parse(text: &str, ignore_ports: &IndexSet<String>) -> MacTable {
    let mut table = MacTable::new();
    let mut excluded: HashSet<&str> = HashSet::new();

    for line in text.lines() {
        let Some((mac, port)) = parse_line(line) else {
            trace!("mac-table: skipping line {:?}", line);
            continue;
        };

        if ignore_ports.contains(port) {
            table.shift_remove(mac);
            excluded.insert(mac);
            continue;
        }

        if !excluded.contains(mac) {
            table.insert(mac.to_string(), port.to_string());
        }
    }

    table
}
