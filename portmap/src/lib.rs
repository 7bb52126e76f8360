//! # Portmap
//!
//! Switch inventory collector and spreadsheet reconciler.
//!
//! A run connects to each configured switch over SSH, fetches the MAC
//! address table, ARP table and interface status, joins them into one
//! [`DeviceRecord`] per learned MAC address and persists the merged
//! [`Inventory`] as JSON. A separate reconciliation pass reads that document
//! back and fills MAC, IP and speed cells of a spreadsheet whose rows name a
//! switch and port.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use portmap::{AppConfig, SshConnector, collect::collect_configured};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), portmap::Error> {
//!     let config = AppConfig::load(Path::new("portmap.toml"))?;
//!     config.validate_collect()?;
//!     let report = collect_configured(&SshConnector::new(&config), &config).await;
//!     report.inventory.save(&config.inventory_path)?;
//!     Ok(())
//! }
//! ```

pub mod collect;
pub mod config;
pub mod correlate;
pub mod error;
pub mod inventory;
pub mod reconcile;
pub mod report;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use config::{AppConfig, Credentials, SwitchTarget};
pub use correlate::DeviceRecord;
pub use error::{Error, Result};
pub use inventory::Inventory;
pub use reconcile::{CellGrid, GridRange, ReconcileOptions, ReconcileSummary, reconcile};
pub use session::{CommandSession, Connector, ExitStatusPolicy, SshConnector, SwitchOutcome};
pub use transport::{AuthMethod, SshConfig};
