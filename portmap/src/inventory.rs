//! Inventory store: every device across all switches, keyed by MAC.
//!
//! The persisted document is a pretty-printed JSON object keyed by MAC
//! address, in first-seen order. It is the only hand-off between collection
//! and reconciliation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::correlate::DeviceRecord;
use crate::error::{InventoryError, Result};

/// Inventory key written by the parser for legend lines; never a device.
pub const PLACEHOLDER_KEY: &str = "-";

/// Devices keyed by MAC address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    records: IndexMap<String, DeviceRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one switch's records. A MAC already present is overwritten in
    /// place and keeps its original position.
    pub fn merge(&mut self, records: impl IntoIterator<Item = DeviceRecord>) {
        for record in records {
            self.records.insert(record.mac_address.clone(), record);
        }
    }

    pub fn get(&self, mac: &str) -> Option<&DeviceRecord> {
        self.records.get(mac)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceRecord)> {
        self.records.iter().map(|(mac, record)| (mac.as_str(), record))
    }

    /// Pretty-printed JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(InventoryError::Json)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(InventoryError::Json)?)
    }

    /// Write the document atomically: a sibling temp file is written,
    /// synced, then renamed over `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let tmp = temp_path(path);

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        };

        write().map_err(|source| {
            let _ = fs::remove_file(&tmp);
            InventoryError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| InventoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Inventory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut records = IndexMap::<String, DeviceRecord>::deserialize(deserializer)?;
        for (mac, record) in records.iter_mut() {
            record.mac_address.clone_from(mac);
        }
        Ok(Self { records })
    }
}

impl FromIterator<DeviceRecord> for Inventory {
    fn from_iter<I: IntoIterator<Item = DeviceRecord>>(iter: I) -> Self {
        let mut inventory = Self::new();
        inventory.merge(iter);
        inventory
    }
}
