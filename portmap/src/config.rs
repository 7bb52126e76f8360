//! Run configuration.
//!
//! Loaded once from a TOML file plus `PORTMAP_`-prefixed environment
//! variables (`__` separates nesting levels), validated, then passed by
//! reference to the collector and reconciler. Nothing here changes during a run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use indexmap::IndexSet;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::reconcile::auth::{DEFAULT_TOKEN_URI, ServiceAccount, SheetAuth};
use crate::reconcile::GridRange;
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig};

/// Default location of the persisted inventory document.
pub const DEFAULT_INVENTORY_PATH: &str = "switch_data.json";

/// Default cell rectangle loaded from the sheet.
pub const DEFAULT_SHEET_RANGE: &str = "A1:M500";

/// Default Sheets API endpoint.
pub const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Where the inventory document is written and read back.
    #[serde(default = "default_inventory_path")]
    pub inventory_path: PathBuf,

    /// How many switches are collected at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Fail a switch when any report command exits non-zero.
    #[serde(default)]
    pub strict_exit_status: bool,

    /// Login shared by every switch. Only required by `collect`.
    #[serde(default)]
    pub credentials: Option<Credentials>,

    #[serde(default)]
    pub ssh: SshSettings,

    /// Switches in merge order.
    #[serde(default)]
    pub switches: Vec<SwitchTarget>,

    /// Spreadsheet to reconcile against. Only required by `reconcile`.
    pub sheet: Option<SheetSettings>,
}

fn default_inventory_path() -> PathBuf {
    PathBuf::from(DEFAULT_INVENTORY_PATH)
}
fn default_concurrency() -> usize {
    1
}

/// One managed switch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwitchTarget {
    pub address: String,

    #[serde(default = "default_ssh_port")]
    pub port: u16,

    /// Uplink/trunk ports whose MAC entries are not devices.
    #[serde(default)]
    pub ignore_ports: IndexSet<String>,
}

fn default_ssh_port() -> u16 {
    22
}

impl SwitchTarget {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            ignore_ports: IndexSet::new(),
        }
    }

    /// Add ports to the ignore set.
    pub fn with_ignore_ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_ports.extend(ports.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for SwitchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Shared switch login.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub passphrase: Option<String>,
}

impl Credentials {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            private_key_path: None,
            passphrase: None,
        }
    }

    /// Authentication method; a private key takes precedence over a password.
    pub fn auth_method(&self) -> AuthMethod {
        match &self.private_key_path {
            Some(path) => AuthMethod::PrivateKey {
                path: path.clone(),
                passphrase: self.passphrase.clone().map(SecretString::from),
            },
            None => AuthMethod::Password(SecretString::from(
                self.password.clone().unwrap_or_default(),
            )),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// SSH client settings shared by every switch.
#[derive(Debug, Clone, Deserialize)]
pub struct SshSettings {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default)]
    pub host_key_verification: HostKeyVerification,

    pub known_hosts_path: Option<PathBuf>,
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

/// External spreadsheet location and access.
#[derive(Clone, Deserialize)]
pub struct SheetSettings {
    pub spreadsheet_id: String,

    /// Sheet (tab) title; the first sheet when unset.
    pub sheet_title: Option<String>,

    #[serde(default = "default_sheet_range")]
    pub range: String,

    /// OAuth bearer token with the spreadsheets scope. Takes precedence
    /// over the service account.
    pub access_token: Option<String>,

    /// Service account that mints tokens when no access token is set.
    pub service_account_email: Option<String>,

    /// PEM private key of the service account.
    pub private_key: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default = "default_sheets_api")]
    pub api_base: String,
}

fn default_sheet_range() -> String {
    DEFAULT_SHEET_RANGE.into()
}
fn default_sheets_api() -> String {
    DEFAULT_SHEETS_API.into()
}
fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.into()
}

impl SheetSettings {
    /// How to authenticate; a fixed access token wins over the service account.
    pub fn auth(&self) -> Result<SheetAuth> {
        if let Some(token) = &self.access_token {
            return Ok(SheetAuth::Token(SecretString::from(token.clone())));
        }
        match (&self.service_account_email, &self.private_key) {
            (Some(email), Some(key)) => Ok(ServiceAccount::new(email, SecretString::from(key.clone()))
                .with_token_uri(&self.token_uri)
                .into()),
            _ => Err(invalid(
                "sheet",
                "either access_token or service_account_email and private_key are required",
            )),
        }
    }
}

impl fmt::Debug for SheetSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetSettings")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_title", &self.sheet_title)
            .field("range", &self.range)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("service_account_email", &self.service_account_email)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("token_uri", &self.token_uri)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl AppConfig {
    /// Load from a TOML file and the environment.
    ///
    /// Each run mode checks what it needs with [`validate_collect`] or
    /// [`validate_reconcile`].
    ///
    /// [`validate_collect`]: Self::validate_collect
    /// [`validate_reconcile`]: Self::validate_reconcile
    pub fn load(path: &Path) -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PORTMAP_").split("__"));
        Self::from_figment(&figment)
    }

    /// Extract from an already-assembled figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Check what a collection run needs: switches and a login.
    pub fn validate_collect(&self) -> Result<()> {
        if self.switches.is_empty() {
            return Err(invalid("switches", "at least one switch is required"));
        }
        for (i, switch) in self.switches.iter().enumerate() {
            if switch.address.trim().is_empty() {
                return Err(invalid(&format!("switches[{i}].address"), "must not be empty"));
            }
            if switch.port == 0 {
                return Err(invalid(&format!("switches[{i}].port"), "must not be 0"));
            }
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }
        let credentials = self.credentials()?;
        if credentials.username.is_empty() {
            return Err(invalid("credentials.username", "must not be empty"));
        }
        if credentials.password.is_none() && credentials.private_key_path.is_none() {
            return Err(invalid(
                "credentials",
                "either password or private_key_path is required",
            ));
        }
        Ok(())
    }

    /// Check what a reconciliation run needs: a sheet, its range and a way in.
    pub fn validate_reconcile(&self) -> Result<()> {
        let sheet = self.sheet()?;
        if sheet.spreadsheet_id.trim().is_empty() {
            return Err(invalid("sheet.spreadsheet_id", "must not be empty"));
        }
        sheet
            .range
            .parse::<GridRange>()
            .map_err(|_| invalid("sheet.range", "must be an A1 range like A1:M500"))?;
        sheet.auth()?;
        Ok(())
    }

    /// The shared switch login, required for collection.
    pub fn credentials(&self) -> Result<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| invalid("credentials", "section is required for collection"))
    }

    /// The sheet section, required for reconciliation.
    pub fn sheet(&self) -> Result<&SheetSettings> {
        self.sheet
            .as_ref()
            .ok_or_else(|| invalid("sheet", "section is required for reconciliation"))
    }

    /// SSH connection settings for one switch.
    pub fn ssh_config(&self, target: &SwitchTarget) -> Result<SshConfig> {
        let credentials = self.credentials()?;
        Ok(SshConfig {
            host: target.address.clone(),
            port: target.port,
            username: credentials.username.clone(),
            auth: credentials.auth_method(),
            connect_timeout: Duration::from_secs(self.ssh.connect_timeout_secs),
            host_key_verification: self.ssh.host_key_verification.clone(),
            known_hosts_path: self.ssh.known_hosts_path.clone(),
        })
    }
}

fn invalid(field: &str, reason: &str) -> crate::Error {
    ConfigError::Validation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
