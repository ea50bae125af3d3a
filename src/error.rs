#![warn(missing_docs)]
//! optrace specific error structures
use std::{error::Error, fmt::Display};

/// optrace application specific Result type
pub type OptResult<T> = std::result::Result<T, OptraceError>;

/// Errors that can be returned by various optrace functions.
///
/// Geometric misses are not errors. They are handled by pruning the affected ray.
#[derive(Debug, PartialEq, Eq)]
pub enum OptraceError {
    /// errors while handling reference frames (unknown ids or axes, stale poses)
    Frame(String),
    /// numerically degenerate input such as collinear tripod legs or zero-length vectors
    Degenerate(String),
    /// invalid physical or geometric parameters (e.g. negative radius)
    Configuration(String),
    /// errors while sampling apertures
    Sampler(String),
    /// unknown or duplicate factory names
    Registry(String),
    /// errors while reading or building a scenario
    Scenario(String),
    /// errors console io
    Console(String),
    /// errors not falling in one of the categories above
    Other(String),
}

impl Display for OptraceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Frame(m) => {
                write!(f, "Frame:{m}")
            }
            Self::Degenerate(m) => {
                write!(f, "Degenerate:{m}")
            }
            Self::Configuration(m) => {
                write!(f, "Configuration:{m}")
            }
            Self::Sampler(m) => {
                write!(f, "Sampler:{m}")
            }
            Self::Registry(m) => {
                write!(f, "Registry:{m}")
            }
            Self::Scenario(m) => {
                write!(f, "Scenario:{m}")
            }
            Self::Console(m) => {
                write!(f, "Console:{m}")
            }
            Self::Other(m) => write!(f, "optrace Error:Other:{m}"),
        }
    }
}
impl Error for OptraceError {}

impl std::convert::From<String> for OptraceError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}
#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn from() {
        let error = OptraceError::from("test".to_string());
        assert_eq!(error, OptraceError::Other("test".to_string()));
    }
    #[test]
    fn display() {
        assert_eq!(
            format!("{}", OptraceError::Frame("test".to_string())),
            "Frame:test"
        );
        assert_eq!(
            format!("{}", OptraceError::Degenerate("test".to_string())),
            "Degenerate:test"
        );
        assert_eq!(
            format!("{}", OptraceError::Configuration("test".to_string())),
            "Configuration:test"
        );
        assert_eq!(
            format!("{}", OptraceError::Sampler("test".to_string())),
            "Sampler:test"
        );
        assert_eq!(
            format!("{}", OptraceError::Registry("test".to_string())),
            "Registry:test"
        );
        assert_eq!(
            format!("{}", OptraceError::Scenario("test".to_string())),
            "Scenario:test"
        );
        assert_eq!(
            format!("{}", OptraceError::Console("test".to_string())),
            "Console:test"
        );
        assert_eq!(
            format!("{}", OptraceError::Other("test".to_string())),
            "optrace Error:Other:test"
        );
    }
    #[test]
    fn debug() {
        assert_eq!(
            format!("{:?}", OptraceError::Degenerate("test".to_string())),
            "Degenerate(\"test\")"
        );
    }
}
