// Inventory document persistence through the filesystem.

use pretty_assertions::assert_eq;

use portmap::{DeviceRecord, Error, Inventory};

fn record(mac: &str, switch: &str, port: &str, speed: &str, ip: &str) -> DeviceRecord {
    DeviceRecord {
        mac_address: mac.into(),
        switch_address: switch.into(),
        switch_port: "22".into(),
        physical_port: port.into(),
        speed_code: speed.into(),
        ip_address: ip.into(),
    }
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switch_data.json");

    let mut inventory = Inventory::new();
    inventory.merge(vec![
        record("aa:bb", "10.0.0.1", "eth-0-5", "1000", "10.0.0.9"),
        record("cc:dd", "10.0.0.1", "eth-0-6", "", ""),
    ]);
    inventory.save(&path).unwrap();

    let loaded = Inventory::load(&path).unwrap();
    assert_eq!(loaded, inventory);
    for (mac, record) in loaded.iter() {
        assert_eq!(inventory.get(mac), Some(record));
    }

    // no temp file left behind
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_save_overwrites_previous_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switch_data.json");

    let first: Inventory = vec![record("aa:bb", "10.0.0.1", "eth-0-5", "1000", "")]
        .into_iter()
        .collect();
    first.save(&path).unwrap();

    let second: Inventory = vec![record("ee:ff", "10.0.0.2", "eth-0-1", "2500", "")]
        .into_iter()
        .collect();
    second.save(&path).unwrap();

    let loaded = Inventory::load(&path).unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded.get("ee:ff").is_some());
}

#[test]
fn test_document_is_pretty_printed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switch_data.json");

    let inventory: Inventory = vec![record("aa:bb", "10.0.0.1", "eth-0-5", "1000", "10.0.0.9")]
        .into_iter()
        .collect();
    inventory.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        r#"{
  "aa:bb": {
    "SwitchIP": "10.0.0.1",
    "SwitchPort": "22",
    "LanPort": "eth-0-5",
    "Speed": "1000",
    "IP": "10.0.0.9"
  }
}"#
    );
}

#[test]
fn test_load_missing_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    let err = Inventory::load(&path).unwrap_err();
    assert!(matches!(err, Error::Inventory(_)));
    assert!(err.to_string().contains("missing.json"));
}
