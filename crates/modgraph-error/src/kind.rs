//! Error kinds for modgraph operations

use strum_macros::{Display, IntoStaticStr};

/// The kind of error that occurred.
///
/// Callers match on the kind to decide how to report or recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// Catch-all for unhandled cases
    Unexpected,

    /// The requested operation is not supported
    Unsupported,

    /// Invalid workspace configuration
    ConfigInvalid,

    // =========================================================================
    // Descriptor errors
    // =========================================================================
    /// A rule file could not be parsed
    ParseFailed,

    /// A module descriptor violates one of its invariants
    InvalidDescriptor,

    /// A module lists itself as a dependency
    SelfDependency,

    // =========================================================================
    // Graph errors
    // =========================================================================
    /// Two descriptors share the same module name
    DuplicateModule,

    /// A dependency names a module that no descriptor provides
    ModuleNotFound,

    /// Modules depend on each other through a cycle that is not allowed
    CircularDependency,

    // =========================================================================
    // File/IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Directory traversal failed
    TraversalFailed,

    // =========================================================================
    // Output errors
    // =========================================================================
    /// Serializing a result failed
    SerializationFailed,

    // =========================================================================
    // Validation errors
    // =========================================================================
    /// Invalid argument passed to a function or command
    InvalidArgument,

    /// Internal invariant violation
    InvariantViolation,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::IoFailed)
    }
}
