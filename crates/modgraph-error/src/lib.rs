//! # modgraph-error
//!
//! Unified error handling for modgraph.
//!
//! - **ErrorKind**: what went wrong (e.g. ModuleNotFound, CircularDependency)
//! - **ErrorStatus**: whether retrying can help (Permanent, Temporary, Persistent)
//! - **Context**: the failing operation plus key/value pairs locating the cause
//! - **Source**: the wrapped underlying error, never leaked as a raw type
//!
//! ```rust
//! use modgraph_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ModuleNotFound, "unknown module")
//!         .with_operation("graph::assemble")
//!         .with_context("module", "Renderer")
//!         .with_context("missing", "RHI"))
//! }
//! ```
//!
//! All fallible functions return `Result<T, modgraph_error::Error>`. External
//! errors are wrapped with `set_source(err)`; once an error has been handled,
//! callers only append context.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using modgraph Error
pub type Result<T> = std::result::Result<T, Error>;
