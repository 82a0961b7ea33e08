use thiserror::Error;

pub type Result<T> = std::result::Result<T, CleanError>;

/// Fatal conditions that abort a whole `clean` call.
///
/// Every variant carries the 1-based line number of the offending input line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanError {
    #[error("line {line}: invalid WebVTT header: {reason}")]
    Format { line: usize, reason: String },

    #[error("line {line}: malformed cue structure: {reason}")]
    Structure { line: usize, reason: String },

    #[error("line {line}: invalid cue timing: {reason}")]
    Timing { line: usize, reason: String },
}

impl CleanError {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        CleanError::Format {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn structure(line: usize, reason: impl Into<String>) -> Self {
        CleanError::Structure {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn timing(line: usize, reason: impl Into<String>) -> Self {
        CleanError::Timing {
            line,
            reason: reason.into(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            CleanError::Format { line, .. }
            | CleanError::Structure { line, .. }
            | CleanError::Timing { line, .. } => *line,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            CleanError::Format { reason, .. }
            | CleanError::Structure { reason, .. }
            | CleanError::Timing { reason, .. } => reason,
        }
    }
}
