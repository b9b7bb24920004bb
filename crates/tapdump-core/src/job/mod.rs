//! Control-plane request types for capture workers.
//!
//! A capture job asks for a worker to be started on a NIC; lifecycle
//! requests name one or more existing workers. Only validation and command
//! rendering live here, the container runtime is somebody else's concern.

pub mod error;

pub use error::JobError;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Script each capture worker runs.
pub const WORKER_SCRIPT: &str = "/tmp/run.sh";
/// Container ids are reported in their short form.
pub const SHORT_ID_LEN: usize = 12;
/// `iters` value asking a worker to capture until stopped.
pub const CONTINUOUS_ITERS: &str = "-1";

/// Capture job request as received on the wire.
///
/// Every field may be missing at this stage; `filter` defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureJobRequest {
    pub id: Option<String>,
    pub nic: Option<String>,
    pub interval: Option<String>,
    #[serde(default)]
    pub filter: String,
    pub iters: Option<String>,
}

/// Validated capture job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureJob {
    pub id: String,
    pub nic: String,
    pub interval: String,
    pub filter: String,
    pub iters: String,
}

impl CaptureJobRequest {
    pub fn from_json(payload: &str) -> Result<Self, JobError> {
        parse_payload(payload)
    }

    /// Check that every required field is present.
    ///
    /// # Examples
    /// ```
    /// use tapdump_core::job::{CaptureJobRequest, JobError};
    ///
    /// let request = CaptureJobRequest::from_json(r#"{"id": "1", "interval": "60", "iters": "1"}"#)?;
    /// assert_eq!(request.validate(), Err(JobError::MissingField("nic")));
    /// # Ok::<(), JobError>(())
    /// ```
    pub fn validate(self) -> Result<CaptureJob, JobError> {
        let nic = self.nic.ok_or(JobError::MissingField("nic"))?;
        let id = self.id.ok_or(JobError::MissingField("id"))?;
        let interval = self.interval.ok_or(JobError::MissingField("interval"))?;
        let iters = self.iters.ok_or(JobError::MissingField("iters"))?;
        Ok(CaptureJob {
            id,
            nic,
            interval,
            filter: self.filter,
            iters,
        })
    }
}

impl CaptureJob {
    /// Command line the worker container is started with.
    ///
    /// # Examples
    /// ```
    /// use tapdump_core::job::CaptureJobRequest;
    ///
    /// let job = CaptureJobRequest::from_json(
    ///     r#"{"id": "7", "nic": "eth0", "interval": "60", "iters": "2", "filter": "tcp port 80"}"#,
    /// )?
    /// .validate()?;
    /// assert_eq!(job.worker_command(), r#"/tmp/run.sh eth0 60 7 2 "tcp port 80""#);
    /// # Ok::<(), tapdump_core::job::JobError>(())
    /// ```
    pub fn worker_command(&self) -> String {
        format!(
            "{WORKER_SCRIPT} {} {} {} {} \"{}\"",
            self.nic, self.interval, self.id, self.iters, self.filter
        )
    }

    /// Arguments the worker script receives, as a listing reports them.
    pub fn worker_args(&self) -> Vec<String> {
        vec![
            self.nic.clone(),
            self.interval.clone(),
            self.id.clone(),
            self.iters.clone(),
            self.filter.clone(),
        ]
    }

    /// Whether the worker loops until it is stopped.
    pub fn is_continuous(&self) -> bool {
        self.iters == CONTINUOUS_ITERS
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkerIds {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct WorkerSelectionRequest {
    id: Option<WorkerIds>,
}

/// One or more worker ids targeted by a lifecycle operation.
///
/// Accepts `{"id": "123"}` as well as `{"id": ["123", "456"]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSelection {
    ids: Vec<String>,
}

impl WorkerSelection {
    pub fn from_json(payload: &str) -> Result<Self, JobError> {
        let request: WorkerSelectionRequest = parse_payload(payload)?;
        let ids = match request.id.ok_or(JobError::MissingField("id"))? {
            WorkerIds::One(id) => vec![id],
            WorkerIds::Many(ids) => ids,
        };
        Ok(Self { ids })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Lifecycle operations applied to existing workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Start,
    Stop,
    Delete,
}

impl LifecycleOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOp::Start => "start",
            LifecycleOp::Stop => "stop",
            LifecycleOp::Delete => "delete",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(LifecycleOp::Start),
            "stop" => Ok(LifecycleOp::Stop),
            "delete" => Ok(LifecycleOp::Delete),
            other => Err(format!("unknown lifecycle operation '{other}'")),
        }
    }
}

/// Worker entry in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub id: String,
    pub status: String,
    pub args: Vec<String>,
}

impl WorkerStatus {
    /// Build a listing entry; the container id is shortened.
    pub fn new(container_id: &str, status: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: container_id.chars().take(SHORT_ID_LEN).collect(),
            status: status.into(),
            args,
        }
    }
}

/// Service information endpoint payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub version: String,
}

fn parse_payload<T: DeserializeOwned>(payload: &str) -> Result<T, JobError> {
    if payload.trim().is_empty() {
        return Err(JobError::MalformedPayload);
    }
    serde_json::from_str(payload).map_err(|_| JobError::MalformedPayload)
}
