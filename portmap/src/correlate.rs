//! Joins the three parsed reports into device records.

use serde::{Deserialize, Serialize};

use crate::report::{ArpTable, MacTable, SpeedTable};

/// One device seen in a switch's MAC address table.
///
/// The MAC address is the inventory key, so it is not part of the
/// serialized value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(skip)]
    pub mac_address: String,

    #[serde(rename = "SwitchIP")]
    pub switch_address: String,

    #[serde(rename = "SwitchPort")]
    pub switch_port: String,

    #[serde(rename = "LanPort")]
    pub physical_port: String,

    /// Raw vendor speed code, e.g. "1000".
    #[serde(rename = "Speed")]
    pub speed_code: String,

    #[serde(rename = "IP")]
    pub ip_address: String,
}

impl DeviceRecord {
    /// Whether this record sits on the given switch address, switch port and
    /// physical port.
    pub fn is_at(&self, switch_address: &str, switch_port: &str, physical_port: &str) -> bool {
        self.switch_address == switch_address
            && self.switch_port == switch_port
            && self.physical_port == physical_port
    }
}

/// Build one record per MAC table entry, in MAC table order.
///
/// IP and speed are filled from the ARP and interface tables when present and
/// left empty otherwise. ARP or interface entries alone never create a record.
pub fn correlate(
    mac_table: &MacTable,
    arp_table: &ArpTable,
    speed_table: &SpeedTable,
    switch_address: &str,
    switch_port: &str,
) -> Vec<DeviceRecord> {
    mac_table
        .iter()
        .map(|(mac, port)| DeviceRecord {
            mac_address: mac.clone(),
            switch_address: switch_address.to_string(),
            switch_port: switch_port.to_string(),
            physical_port: port.clone(),
            speed_code: speed_table.get(port).cloned().unwrap_or_default(),
            ip_address: arp_table.get(mac).cloned().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> indexmap::IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_full_join() {
        let macs = table(&[("aa:bb", "eth-0-5")]);
        let arp = table(&[("aa:bb", "10.0.0.9")]);
        let speeds = table(&[("eth-0-5", "1000")]);

        let records = correlate(&macs, &arp, &speeds, "10.0.0.1", "22");
        assert_eq!(
            records,
            vec![DeviceRecord {
                mac_address: "aa:bb".into(),
                switch_address: "10.0.0.1".into(),
                switch_port: "22".into(),
                physical_port: "eth-0-5".into(),
                speed_code: "1000".into(),
                ip_address: "10.0.0.9".into(),
            }]
        );
    }

    #[test]
    fn test_missing_arp_and_speed_default_empty() {
        let macs = table(&[("aa:bb", "eth-0-5")]);
        let records = correlate(&macs, &table(&[]), &table(&[]), "10.0.0.1", "22");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ip_address, "");
        assert_eq!(records[0].speed_code, "");
    }

    #[test]
    fn test_arp_only_mac_is_not_a_device() {
        let macs = table(&[("aa:bb", "eth-0-5")]);
        let arp = table(&[("aa:bb", "10.0.0.9"), ("cc:dd", "10.0.0.10")]);
        let speeds = table(&[("eth-0-5", "1000"), ("eth-0-6", "2500")]);

        let records = correlate(&macs, &arp, &speeds, "10.0.0.1", "22");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mac_address, "aa:bb");
    }

    #[test]
    fn test_preserves_mac_table_order() {
        let macs = table(&[("m2", "eth-0-2"), ("m1", "eth-0-1"), ("m3", "eth-0-3")]);
        let records = correlate(&macs, &table(&[]), &table(&[]), "sw", "22");
        let order: Vec<&str> = records.iter().map(|r| r.mac_address.as_str()).collect();
        assert_eq!(order, vec!["m2", "m1", "m3"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let record = DeviceRecord {
            mac_address: "aa:bb".into(),
            switch_address: "10.0.0.1".into(),
            switch_port: "22".into(),
            physical_port: "eth-0-5".into(),
            speed_code: "1000".into(),
            ip_address: "10.0.0.9".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "SwitchIP": "10.0.0.1",
                "SwitchPort": "22",
                "LanPort": "eth-0-5",
                "Speed": "1000",
                "IP": "10.0.0.9"
            })
        );
    }
}
