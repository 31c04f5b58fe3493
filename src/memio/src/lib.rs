//! # memio
//!
//! Read and write typed structures in a byte stream, most usefully the live
//! memory of another process exposed through procfs.
//!
//! This library provides:
//! - A process-wide registry of codecs keyed by string aliases (`u64`, `c_str`, `cpp/string`, ...)
//! - [`MemoryIo`], a typed reader/writer over any positionable stream
//! - An address evaluator for expressions such as `"heap + 0x10 * 8"`
//! - Native structure codecs, including the short-string-optimized `std::string` layout
//! - A procfs memory source that maps library names to base addresses
//!
//! ## Example
//!
//! ```no_run
//! use memio::{MemorySource, ReadOptions};
//!
//! # fn main() -> memio::Result<()> {
//! let process = memio::attach(1234)?;
//!
//! // Four unsigned 64-bit integers at the start of the heap
//! let values = process.read("heap", 4, ReadOptions::new().as_type("u64"))?;
//! println!("{:?}", values);
//!
//! // A std::string whose address is known
//! let string = process.read(0x7ffe539ca250u64, 1, ReadOptions::new().as_type("string"))?;
//! println!("{}", string);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod address;
pub mod io;
pub mod source;
pub mod stream;
pub mod types;
pub mod util;
mod value;

#[doc(inline)]
pub use address::{evaluate, resolve, Address, Bases};
#[doc(inline)]
pub use io::{MemoryIo, ReadOptions, TypeSpec, WriteOptions};
#[doc(inline)]
pub use source::{
    Access, BufferSource, FilePermission, MemoryRegion, MemorySource, Process,
};
#[doc(inline)]
pub use stream::{keep_pos, PositionGuard, Stream};
#[doc(inline)]
pub use types::{cpp::CppString, Codec, Entry, Registry};
#[doc(inline)]
pub use value::Value;

/// Errors from typed memory access
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid argument `as`: {0}. It should be a codec, a function, or a registered type name")]
    InvalidType(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Value {value} cannot be encoded as {codec}")]
    InvalidValue { codec: String, value: String },

    #[error("Register '{name}' fails because other objects with same name has been registered (tried {keys:?}). Specify an unused alias")]
    NameCollision { name: String, keys: Vec<String> },

    #[error("Type registry is already installed")]
    RegistryFrozen,

    #[error("Failed to parse address {expr:?}: {reason}")]
    Parse { expr: String, reason: String },

    #[error("Failed to evaluate address {expr:?}: {reason}")]
    Eval { expr: String, reason: String },

    #[error("Unexpected end of data: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("No such file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach to a process by id.
///
/// Only procfs-based systems are supported, i.e. `/proc` must be mounted.
pub fn attach(pid: u32) -> Result<Process> {
    Process::new(pid)
}
