//! Output of a single remote command.

/// Output of one remote command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// The command that was executed.
    pub command: String,

    /// Everything the command wrote to stdout.
    pub stdout: String,

    /// Everything the command wrote to stderr.
    pub stderr: String,

    /// Exit status reported by the server, if it sent one.
    pub exit_status: Option<u32>,
}

impl ExecOutput {
    /// Create a new command output.
    pub fn new(
        command: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        exit_status: Option<u32>,
    ) -> Self {
        Self {
            command: command.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status,
        }
    }

    /// Check if the command reported a zero exit status.
    pub fn is_success(&self) -> bool {
        self.exit_status == Some(0)
    }
}
