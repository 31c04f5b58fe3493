//! Memory Source Trait
//!
//! Core abstraction for reading and writing typed values in an address space.

use crate::address::{self, Address, Bases};
use crate::io::{MemoryIo, ReadOptions, WriteOptions};
use crate::stream::Stream;
use crate::{Result, Value};

/// How a stream is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    pub fn reads(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    pub fn writes(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

/// An address space that can be opened as a stream (live process, snapshot, etc.)
pub trait MemorySource {
    type Stream: Stream;

    /// Open a fresh stream positioned at address 0
    fn open(&self, access: Access) -> Result<Self::Stream>;

    /// Base addresses available to address expressions
    fn bases(&self) -> Result<Bases>;

    /// Resolve an address; bases are only consulted for expressions
    fn resolve(&self, addr: &Address) -> Result<u64> {
        match addr {
            Address::Absolute(addr) => Ok(*addr),
            Address::Expr(_) => address::resolve(addr, &self.bases()?),
        }
    }

    /// Read `count` elements at `addr`, see [`MemoryIo::read`].
    ///
    /// `addr` takes the place of `options.from`.
    fn read(
        &self,
        addr: impl Into<Address>,
        count: usize,
        options: ReadOptions<'_>,
    ) -> Result<Value> {
        let addr = self.resolve(&addr.into())?;
        let stream = self.open(Access::Read)?;
        MemoryIo::new(stream).read(count, options.from(addr))
    }

    /// Write `value` at `addr`, see [`MemoryIo::write`]
    fn write(
        &self,
        addr: impl Into<Address>,
        value: impl Into<Value>,
        options: WriteOptions<'_>,
    ) -> Result<()> {
        let addr = self.resolve(&addr.into())?;
        let stream = self.open(Access::Write)?;
        MemoryIo::new(stream).write(value, options.from(addr))
    }
}
