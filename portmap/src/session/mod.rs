//! Session manager: one remote session per switch, three reports per session.
//!
//! [`Connector`] and [`CommandSession`] are the seams between the collector
//! and the SSH transport, so the collection flow can run against any
//! command-execution backend.

mod output;

pub use output::ExecOutput;

use std::future::Future;

use log::{debug, error, info, warn};

use crate::config::{AppConfig, SwitchTarget};
use crate::correlate::{DeviceRecord, correlate};
use crate::error::{CommandError, Result};
use crate::report::{RawReport, ReportKind, arp_table, interface_status, mac_table};
use crate::transport::SshTransport;

/// An open remote command session.
pub trait CommandSession: Send + Sync {
    /// Execute a command and collect its output.
    ///
    /// Takes `&self` so several commands can be in flight on one session.
    fn exec(&self, command: &str) -> impl Future<Output = Result<ExecOutput>> + Send;

    /// Release the session.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens sessions to switches.
pub trait Connector: Send + Sync {
    type Session: CommandSession;

    fn connect(&self, target: &SwitchTarget) -> impl Future<Output = Result<Self::Session>> + Send;
}

impl CommandSession for SshTransport {
    fn exec(&self, command: &str) -> impl Future<Output = Result<ExecOutput>> + Send {
        SshTransport::exec(self, command)
    }

    fn close(self) -> impl Future<Output = Result<()>> + Send {
        SshTransport::close(self)
    }
}

/// Connects over SSH with the shared credentials from the run configuration.
pub struct SshConnector<'a> {
    config: &'a AppConfig,
}

impl<'a> SshConnector<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }
}

impl Connector for SshConnector<'_> {
    type Session = SshTransport;

    fn connect(&self, target: &SwitchTarget) -> impl Future<Output = Result<SshTransport>> + Send {
        let config = self.config.ssh_config(target);
        async move { SshTransport::connect(config?).await }
    }
}

/// The three raw reports from one switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReports {
    pub mac_table: RawReport,
    pub arp_table: RawReport,
    pub interface_status: RawReport,
}

impl SwitchReports {
    /// Parse and join the reports into device records.
    pub fn into_records(self, target: &SwitchTarget) -> Vec<DeviceRecord> {
        let macs = mac_table::parse(&self.mac_table.text, &target.ignore_ports);
        let arp = arp_table::parse(&self.arp_table.text);
        let speeds = interface_status::parse(&self.interface_status.text);
        correlate(&macs, &arp, &speeds, &target.address, &target.port.to_string())
    }
}

/// How exit statuses of report commands are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitStatusPolicy {
    /// Parse stdout whatever the exit status; warn on non-zero.
    #[default]
    Ignore,
    /// Fail the switch on any non-zero or missing exit status.
    Enforce,
}

impl ExitStatusPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Enforce } else { Self::Ignore }
    }

    fn check(self, target: &SwitchTarget, output: &ExecOutput) -> Result<()> {
        if output.is_success() {
            return Ok(());
        }
        match self {
            Self::Ignore => {
                warn!(
                    "{}: '{}' exited with status {:?}, parsing output anyway",
                    target, output.command, output.exit_status
                );
                Ok(())
            }
            Self::Enforce => Err(CommandError::NonZeroExit {
                command: output.command.clone(),
                status: output.exit_status,
                stderr: output.stderr.trim().to_string(),
            }
            .into()),
        }
    }
}

/// Result of collecting one switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The switch answered; it may legitimately have zero devices.
    Collected(Vec<DeviceRecord>),
    /// The switch could not be collected. It contributes no devices.
    Failed { reason: String },
}

impl SwitchOutcome {
    /// Devices contributed to the inventory (none on failure).
    pub fn records(&self) -> &[DeviceRecord] {
        match self {
            Self::Collected(records) => records,
            Self::Failed { .. } => &[],
        }
    }

    pub fn into_records(self) -> Vec<DeviceRecord> {
        match self {
            Self::Collected(records) => records,
            Self::Failed { .. } => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Issue the three report commands concurrently on an open session.
pub async fn fetch_reports<S: CommandSession>(
    session: &S,
    target: &SwitchTarget,
    policy: ExitStatusPolicy,
) -> Result<SwitchReports> {
    for kind in ReportKind::ALL {
        debug!("{}: sending '{}'", target, kind.command());
    }

    let (mac, arp, interfaces) = tokio::try_join!(
        session.exec(ReportKind::MacTable.command()),
        session.exec(ReportKind::ArpTable.command()),
        session.exec(ReportKind::InterfaceStatus.command()),
    )?;

    for output in [&mac, &arp, &interfaces] {
        policy.check(target, output)?;
    }

    Ok(SwitchReports {
        mac_table: RawReport::from_output(ReportKind::MacTable, mac),
        arp_table: RawReport::from_output(ReportKind::ArpTable, arp),
        interface_status: RawReport::from_output(ReportKind::InterfaceStatus, interfaces),
    })
}

/// Connect, fetch, parse and correlate one switch.
///
/// Never fails: connection and command errors become
/// [`SwitchOutcome::Failed`]. The session is closed on every path once it
/// has been opened.
pub async fn collect_switch<C: Connector>(
    connector: &C,
    target: &SwitchTarget,
    policy: ExitStatusPolicy,
) -> SwitchOutcome {
    let session = match connector.connect(target).await {
        Ok(session) => session,
        Err(e) => {
            error!("Error connecting to switch {}: {}", target, e);
            return SwitchOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    info!("Connected to switch: {}", target);

    let fetched = fetch_reports(&session, target, policy).await;

    if let Err(e) = session.close().await {
        warn!("{}: failed to close session: {}", target, e);
    }

    match fetched {
        Ok(reports) => {
            let records = reports.into_records(target);
            info!("Collected {} devices from {}", records.len(), target);
            SwitchOutcome::Collected(records)
        }
        Err(e) => {
            error!("Error collecting from switch {}: {}", target, e);
            SwitchOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
