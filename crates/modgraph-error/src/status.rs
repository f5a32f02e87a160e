//! Retry classification carried by every [`Error`](crate::Error).

use strum_macros::{Display, IntoStaticStr};

use crate::ErrorKind;

/// How a caller should treat a failed load, evaluation or assembly.
///
/// Rule, descriptor and graph errors come from the inputs and stay
/// `Permanent` until a rule file or the config changes. File system reads
/// start out `Temporary`; a caller that gives up on them marks the error
/// `Persistent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorStatus {
    #[default]
    Permanent,
    Temporary,
    Persistent,
}

impl ErrorStatus {
    /// Status a freshly raised error of `kind` starts with.
    pub fn for_kind(kind: ErrorKind) -> Self {
        if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        }
    }

    pub fn is_retryable(self) -> bool {
        self == ErrorStatus::Temporary
    }

    /// Stop retrying. Only `Temporary` changes.
    pub fn persist(self) -> Self {
        match self {
            ErrorStatus::Temporary => ErrorStatus::Persistent,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
