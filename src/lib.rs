use std::error::Error as StdError;
use std::fmt;

mod dom;
mod events;
mod harness;
mod html;
mod simulator;

pub use dom::NodeId;
pub use events::{EventDetail, EventState, LegacyKeyCode, ListenerId};
pub use harness::{ExtensionHost, Harness};
pub use simulator::{InputSimulator, SIMULATE_INPUT_EVENT};

pub(crate) use dom::Dom;
pub(crate) use events::{ListenerStore, TraceState};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    TargetNotFound(String),
    MalformedDetail(String),
    TypeMismatch {
        target: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        target: String,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::TargetNotFound(id) => write!(f, "target not found: {id}"),
            Self::MalformedDetail(msg) => write!(f, "malformed detail: {msg}"),
            Self::TypeMismatch {
                target,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {target}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                target,
                expected,
                actual,
            } => write!(
                f,
                "assertion failed for {target}: expected {expected}, actual {actual}"
            ),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests;
