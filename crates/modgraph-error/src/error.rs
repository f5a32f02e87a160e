//! The main Error type for modgraph.

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// Unified error type for all modgraph operations.
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: ErrorStatus::for_kind(kind),
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Get the operation that caused this error
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Look up the first context value stored under `key`.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the source error (if any).
    pub fn source_ref(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_ref().map(|e| e.as_ref())
    }

    /// Mark as temporary (retryable)
    pub fn temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(Box::new(source));
        self
    }

    /// Mark as persistent after failed retries.
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.status)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::new(ErrorKind::Unexpected, msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::new(ErrorKind::Unexpected, msg)
    }
}

impl Error {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    pub fn invalid_descriptor(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDescriptor, message).with_context("module", module)
    }

    pub fn self_dependency(module: impl Into<String>) -> Self {
        let module = module.into();
        Self::new(
            ErrorKind::SelfDependency,
            format!("module '{}' depends on itself", module),
        )
        .with_context("module", module)
    }

    pub fn duplicate_module(module: impl Into<String>) -> Self {
        let module = module.into();
        Self::new(
            ErrorKind::DuplicateModule,
            format!("module '{}' is declared more than once", module),
        )
        .with_context("module", module)
    }

    /// A dependency edge `from -> missing` names a module nobody declares.
    pub fn module_not_found(from: impl Into<String>, missing: impl Into<String>) -> Self {
        let from = from.into();
        let missing = missing.into();
        Self::new(
            ErrorKind::ModuleNotFound,
            format!("module '{}' depends on unknown module '{}'", from, missing),
        )
        .with_context("module", from)
        .with_context("missing", missing)
    }

    /// A query named a module that is not part of the graph.
    pub fn unknown_module(module: impl Into<String>) -> Self {
        let module = module.into();
        Self::new(
            ErrorKind::ModuleNotFound,
            format!("module '{}' is not in the graph", module),
        )
        .with_context("module", module)
    }

    /// Create a CircularDependency error listing the modules of the cycle.
    pub fn circular_dependency<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cycle: Vec<String> = modules
            .into_iter()
            .map(|m| m.as_ref().to_string())
            .collect();
        Self::new(
            ErrorKind::CircularDependency,
            format!("circular dependency: {}", cycle.join(" -> ")),
        )
        .with_context("cycle", cycle.join(","))
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(ErrorKind::FileNotFound, format!("file '{}' not found", path))
            .with_context("path", path)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvariantViolation, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::ParseFailed, "unexpected key");
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert_eq!(err.message(), "unexpected key");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::new(ErrorKind::InvalidDescriptor, "bad name")
            .with_operation("rules::evaluate")
            .with_context("module", "Core")
            .with_context("file", "Core.module.toml");

        assert_eq!(err.operation(), "rules::evaluate");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("module", "Core".to_string()));
        assert_eq!(err.context_value("file"), Some("Core.module.toml"));
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::new(ErrorKind::ModuleNotFound, "failed")
            .with_operation("graph::link")
            .with_operation("graph::assemble");

        assert_eq!(err.operation(), "graph::assemble");
        assert_eq!(err.context().len(), 1);
        assert_eq!(err.context()[0], ("called", "graph::link".to_string()));
    }

    #[test]
    fn test_persist() {
        let err = Error::new(ErrorKind::IoFailed, "device busy");
        assert!(err.is_retryable());

        let err = err.persist();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), ErrorStatus::Persistent);
    }

    #[test]
    fn test_display() {
        let err = Error::module_not_found("Renderer", "RHI").with_operation("graph::assemble");

        let display = format!("{}", err);
        assert!(display.contains("ModuleNotFound"));
        assert!(display.contains("permanent"));
        assert!(display.contains("graph::assemble"));
        assert!(display.contains("missing: RHI"));
    }

    #[test]
    fn test_circular_dependency_lists_cycle() {
        let err = Error::circular_dependency(["A", "B", "A"]);
        assert_eq!(err.kind(), ErrorKind::CircularDependency);
        assert!(err.message().contains("A -> B -> A"));
        assert_eq!(err.context_value("cycle"), Some("A,B,A"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert!(err.source_ref().is_some());
    }
}
