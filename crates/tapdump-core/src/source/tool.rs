use std::fs::File;
use std::path::Path;
use std::process::Command;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{LineSource, SourceError, decode_line};

/// Arguments that make tcpdump print one numeric, fully timestamped header
/// per packet followed by its hex payload lines. The capture path follows
/// `-r`.
const DEFAULT_ARGS: [&str; 4] = ["-n", "-tttt", "-x", "-r"];
/// Number of trailing stderr bytes kept in invocation errors.
const STDERR_TAIL: usize = 512;

/// How the dump tool is invoked. Passed explicitly to the adapter.
///
/// # Examples
/// ```
/// use tapdump_core::ToolConfig;
///
/// let config = ToolConfig::default();
/// assert_eq!(config.program, "tcpdump");
/// assert_eq!(config.args.last().map(String::as_str), Some("-r"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Program name or path.
    pub program: String,
    /// Arguments placed before the capture path.
    pub args: Vec<String>,
    /// Version reported alongside results.
    pub version: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "tcpdump".to_string(),
            args: DEFAULT_ARGS.iter().map(|arg| arg.to_string()).collect(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ToolConfig {
    /// Program file name without directories (`/usr/sbin/tcpdump` -> `tcpdump`).
    pub fn program_name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.program)
    }
}

/// Lines printed by the dump tool for one capture file.
///
/// The tool runs to completion in [`ToolLineSource::run`]; its standard
/// output is then handed out line by line.
pub struct ToolLineSource {
    lines: std::vec::IntoIter<String>,
}

impl ToolLineSource {
    /// Run the configured tool against `path` and collect its output.
    ///
    /// # Errors
    /// Returns `SourceError::ToolInvocationFailed` when the capture file
    /// cannot be read, the program cannot be started, or it exits with a
    /// non-zero status.
    pub fn run(config: &ToolConfig, path: &Path) -> Result<Self, SourceError> {
        let failed = |reason: String| SourceError::ToolInvocationFailed {
            program: config.program.clone(),
            reason,
        };

        File::open(path).map_err(|err| failed(format!("cannot read {}: {err}", path.display())))?;

        info!("running {} on {}", config.program, path.display());
        let output = Command::new(&config.program)
            .args(&config.args)
            .arg(path)
            .output()
            .map_err(|err| failed(err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(stderr_tail(&output.stderr));
            return Err(failed(format!("{}: {}", output.status, stderr.trim())));
        }

        let lines: Vec<String> = output
            .stdout
            .split_inclusive(|byte| *byte == b'\n')
            .map(decode_line)
            .collect();
        debug!("{} produced {} lines", config.program, lines.len());

        Ok(Self {
            lines: lines.into_iter(),
        })
    }
}

impl LineSource for ToolLineSource {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        Ok(self.lines.next())
    }
}

fn stderr_tail(stderr: &[u8]) -> &[u8] {
    let start = stderr.len().saturating_sub(STDERR_TAIL);
    &stderr[start..]
}
