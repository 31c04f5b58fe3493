//! In-Memory Source
//!
//! An address space backed by a byte buffer mapped at a base address. Useful
//! for tests and offline snapshots.

use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::rc::Rc;

use super::{Access, MemorySource};
use crate::{Bases, Result};

/// Bytes mapped at `base`, plus a name table for address expressions
#[derive(Debug, Clone)]
pub struct BufferSource {
    data: Rc<RefCell<Vec<u8>>>,
    base: u64,
    bases: Bases,
}

impl BufferSource {
    pub fn new(data: Vec<u8>, base: u64) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
            base,
            bases: Bases::new(),
        }
    }

    /// Add a named base address
    pub fn with_base(mut self, name: impl Into<String>, addr: u64) -> Self {
        self.bases.insert(name.into(), addr);
        self
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.borrow().clone()
    }
}

impl MemorySource for BufferSource {
    type Stream = BufferStream;

    fn open(&self, _access: Access) -> Result<BufferStream> {
        Ok(BufferStream {
            data: Rc::clone(&self.data),
            base: self.base,
            pos: 0,
        })
    }

    fn bases(&self) -> Result<Bases> {
        Ok(self.bases.clone())
    }
}

/// Stream over a [`BufferSource`], positioned by absolute address.
///
/// Addresses below the base are an error. Reads and writes past the end are
/// short, like accesses to unmapped memory.
#[derive(Debug)]
pub struct BufferStream {
    data: Rc<RefCell<Vec<u8>>>,
    base: u64,
    pos: u64,
}

impl BufferStream {
    fn offset(&self) -> io::Result<usize> {
        let offset = self.pos.checked_sub(self.base).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("address {:#x} below base {:#x}", self.pos, self.base),
            )
        })?;
        usize::try_from(offset).map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))
    }
}

impl Read for BufferStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let offset = self.offset()?;
        let data = self.data.borrow();
        let available = data.get(offset..).unwrap_or_default();
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for BufferStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let offset = self.offset()?;
        let mut data = self.data.borrow_mut();
        let Some(target) = data.get_mut(offset..) else {
            return Ok(0);
        };
        let n = target.len().min(buf.len());
        target[..n].copy_from_slice(&buf[..n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for BufferStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.base + self.data.borrow().len() as u64;
        let target = match pos {
            SeekFrom::Start(pos) => Some(pos),
            SeekFrom::End(delta) => len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        self.pos = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid seek to a negative position")
        })?;
        Ok(self.pos)
    }
}
