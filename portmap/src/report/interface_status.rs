//! `show interface status` parser.

use super::{SpeedTable, columns};

/// Physical port names start with this prefix.
pub const PORT_PREFIX: &str = "eth-";

/// Extract `(port, speed)` from a line, if it describes a physical port.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if !line.starts_with(PORT_PREFIX) {
        return None;
    }
    let tokens = columns(line)?;
    Some((tokens[0], tokens[3]))
}

/// Parse interface status into port -> speed code. Last line wins per port.
pub fn parse(text: &str) -> SpeedTable {
    let mut table = SpeedTable::new();
    for (port, speed) in text.lines().filter_map(parse_line) {
        table.insert(port.to_string(), speed.to_string());
    }
    table
}
