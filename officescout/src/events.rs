//! Progress and error notifications emitted while a search runs.
//!
//! The engine never prints anything itself. Front ends pass a
//! [`SearchReporter`] to [`Scout::search`](crate::Scout::search) and decide
//! how to show the events: [`ChannelReporter`] forwards them to another
//! thread, [`LogReporter`] turns them into tracing events, and
//! [`NullReporter`] drops them.

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::SearchError;

/// Integer percentage of `current` out of `total`, rounded down.
///
/// Clamped to `[0, 100]`; an empty run counts as complete.
pub fn percentage(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (current as u128 * 100) / total as u128;
    pct.min(100) as u8
}

/// Emitted once per eligible file after it has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub current: usize,
    pub total: usize,
    pub percentage: u8,
}

impl ProgressEvent {
    pub fn new(current: usize, total: usize) -> Self {
        Self {
            current,
            total,
            percentage: percentage(current, total),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    DirectoryRead,
    FileRead,
    Decode,
    Other,
}

/// A failure local to one file or directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEvent {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(err: &SearchError) -> Self {
        let (kind, message) = match err {
            SearchError::DirectoryRead { source, .. } => (ErrorKind::DirectoryRead, source.to_string()),
            SearchError::FileRead { source, .. } => (ErrorKind::FileRead, source.to_string()),
            SearchError::Decode { message, .. } => (ErrorKind::Decode, message.clone()),
            other => (ErrorKind::Other, other.to_string()),
        };
        Self {
            path: err.path().map(Path::to_path_buf).unwrap_or_default(),
            kind,
            message,
        }
    }
}

impl From<SearchError> for ErrorEvent {
    fn from(err: SearchError) -> Self {
        Self::from_error(&err)
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Anything a reporter can receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Progress(ProgressEvent),
    Error(ErrorEvent),
}

/// Sink for search notifications.
///
/// Called from worker threads; progress calls are serialized by the engine so
/// `current` arrives strictly increasing.
pub trait SearchReporter: Send + Sync {
    fn progress(&self, event: ProgressEvent);
    fn error(&self, event: &ErrorEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl SearchReporter for NullReporter {
    fn progress(&self, _event: ProgressEvent) {}
    fn error(&self, _event: &ErrorEvent) {}
}

/// Forwards events as tracing records
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl SearchReporter for LogReporter {
    fn progress(&self, event: ProgressEvent) {
        debug!(
            "Progress {}/{} ({}%)",
            event.current, event.total, event.percentage
        );
    }

    fn error(&self, event: &ErrorEvent) {
        warn!("{:?} {}", event.kind, event);
    }
}

/// Sends events over a crossbeam channel
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: Sender<SearchEvent>,
}

impl ChannelReporter {
    pub fn new(sender: Sender<SearchEvent>) -> Self {
        Self { sender }
    }

    /// Creates a reporter together with the receiving end of an unbounded channel
    pub fn unbounded() -> (Self, Receiver<SearchEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::new(sender), receiver)
    }
}

impl SearchReporter for ChannelReporter {
    fn progress(&self, event: ProgressEvent) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.sender.send(SearchEvent::Progress(event));
    }

    fn error(&self, event: &ErrorEvent) {
        let _ = self.sender.send(SearchEvent::Error(event.clone()));
    }
}
