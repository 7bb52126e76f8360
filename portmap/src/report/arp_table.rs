//! `show ip arp` parser.

use super::{ArpTable, columns};

/// Only lines carrying this marker are ARP entries.
const ENTRY_MARKER: &str = "Internet";

/// Extract `(mac, ip)` from a line, if it is an ARP entry.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if !line.contains(ENTRY_MARKER) {
        return None;
    }
    let tokens = columns(line)?;
    Some((tokens[3], tokens[1]))
}

/// Parse the ARP table into MAC -> IP. Last line wins per MAC.
pub fn parse(text: &str) -> ArpTable {
    let mut table = ArpTable::new();
    for (mac, ip) in text.lines().filter_map(parse_line) {
        table.insert(mac.to_string(), ip.to_string());
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Protocol  Address          Age (min)  Hardware Addr   Interface
Internet  192.168.1.10     5          001b.2133.4e5f  vlan1
Internet  192.168.1.11     -          001b.2133.4e60  vlan1
Total number of entries: 2
";

    #[test]
    fn test_parse_sample() {
        let table = parse(SAMPLE);
        assert_eq!(table.len(), 2);
        assert_eq!(table["001b.2133.4e5f"], "192.168.1.10");
        assert_eq!(table["001b.2133.4e60"], "192.168.1.11");
    }

    #[test]
    fn test_last_line_wins() {
        let text = "Internet 10.0.0.1 1 aa:bb vlan1\nInternet 10.0.0.2 1 aa:bb vlan1\n";
        assert_eq!(parse(text)["aa:bb"], "10.0.0.2");
    }

    #[test]
    fn test_short_internet_line_skipped() {
        assert!(parse("Internet 10.0.0.1 1\n").is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
    }
}
