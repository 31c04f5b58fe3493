//! Codecs and the process-wide type registry.
//!
//! A codec decodes one logical type from a [`Stream`] and encodes it back. Codecs
//! are registered under one or more string keys, and callers refer to them by key:
//!
//! | Keys | Type |
//! |------|------|
//! | `u8` `u16` `u32` `u64` (`basic/u8`, ...) | little-endian unsigned integers |
//! | `s8` `s16` `s32` `s64` (`basic/s8`, ...) | little-endian signed integers |
//! | `float` `double` | IEEE-754 floating numbers |
//! | `c_str` (`clang/c_str`) | null-terminated string |
//! | `string` (`cpp/string`) | C++11 `std::string` |
//!
//! The registry is populated once. [`global`] installs the built-in codecs on first
//! use, and [`install`] is the only way to add custom codecs to it, before anything
//! else touches the registry.

pub mod basic;
pub mod clang;
pub mod cpp;
mod registry;

pub use registry::{Entry, Registry, SourceLocation};

use once_cell::sync::OnceCell;

use crate::stream::Stream;
use crate::{util, Error, Result, Value};

/// Paired decoder and encoder for one logical type
pub trait Codec: Send + Sync {
    /// Qualified type path such as `CPP::String`.
    ///
    /// Default registry keys are derived from it. Anonymous codecs, e.g. one
    /// instance per integer width, return `None` and rely on aliases.
    fn type_path(&self) -> Option<&'static str> {
        None
    }

    /// Decode one value, leaving the stream after it
    fn read(&self, stream: &mut dyn Stream) -> Result<Value>;

    /// Encode one value at the current position
    fn write(&self, stream: &mut dyn Stream, value: &Value) -> Result<()>;

    /// Parse a textual literal into a value this codec can write
    fn from_text(&self, text: &str) -> Result<Value> {
        Err(Error::InvalidValue {
            codec: self.type_path().unwrap_or("codec").to_string(),
            value: text.to_string(),
        })
    }
}

static REGISTRY: OnceCell<Registry> = OnceCell::new();

/// The process-wide registry, installing the built-in codecs on first use
pub fn global() -> Result<&'static Registry> {
    REGISTRY.get_or_try_init(Registry::with_builtins)
}

/// Install the process-wide registry with custom codecs on top of the built-ins.
///
/// Must run once at startup, before [`global`] or any typed read. Later calls fail
/// with [`Error::RegistryFrozen`].
pub fn install<F>(setup: F) -> Result<&'static Registry>
where
    F: FnOnce(&mut Registry) -> Result<()>,
{
    if REGISTRY.get().is_some() {
        return Err(Error::RegistryFrozen);
    }
    let mut registry = Registry::with_builtins()?;
    setup(&mut registry)?;
    REGISTRY.set(registry).map_err(|_| Error::RegistryFrozen)?;
    global()
}

/// Find a registered type by a free-form name.
///
/// Exact keys win; otherwise the name is normalized the same way default keys
/// are derived, so `CPP::String` finds `cpp/string`.
pub fn find(name: &str) -> Result<Option<&'static Entry>> {
    let registry = global()?;
    if let Some(entry) = registry.find(name) {
        return Ok(Some(entry));
    }
    let normalized = util::underscore(name.trim());
    tracing::debug!(name, %normalized, "normalized type name");
    Ok(registry.find(&normalized))
}
