//! Live Process Memory Source
//!
//! Reads and writes another process's memory through `/proc/<pid>/mem`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use super::{bases_of, parse_maps, Access, FilePermission, MemoryRegion, MemorySource};
use crate::{Bases, Error, Result};

const PTRACE_HINT: &str = "\
You have no permission to read/write this process.

Check the setting of /proc/sys/kernel/yama/ptrace_scope, or try
again as the root user.

To enable attach another process, do:

$ echo 0 | sudo tee /proc/sys/kernel/yama/ptrace_scope";

/// A process attached through procfs
#[derive(Debug, Clone)]
pub struct Process {
    pid: u32,
    mem: PathBuf,
    perm: FilePermission,
}

impl Process {
    /// Attach to a process.
    ///
    /// Fails with [`Error::NotFound`] when `/proc/<pid>/mem` does not exist. Lacking
    /// both read and write permission only warns; opening a stream will fail later.
    pub fn new(pid: u32) -> Result<Self> {
        let mem = PathBuf::from(format!("/proc/{}/mem", pid));
        let perm = FilePermission::probe(&mem).ok_or_else(|| Error::NotFound(mem.clone()))?;
        if !perm.readable && !perm.writable {
            tracing::warn!("{}", PTRACE_HINT);
        }
        Ok(Self { pid, mem, perm })
    }

    /// The calling process
    pub fn current() -> Result<Self> {
        Self::new(std::process::id())
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn perm(&self) -> FilePermission {
        self.perm
    }

    /// Mapped regions, in the order procfs lists them
    pub fn regions(&self) -> Result<Vec<MemoryRegion>> {
        let maps = PathBuf::from(format!("/proc/{}/maps", self.pid));
        let content = fs::read_to_string(&maps).map_err(|err| open_error(&maps, err))?;
        Ok(parse_maps(&content))
    }
}

impl MemorySource for Process {
    type Stream = File;

    fn open(&self, access: Access) -> Result<File> {
        tracing::debug!(pid = self.pid, ?access, "opening process memory");
        OpenOptions::new()
            .read(access.reads())
            .write(access.writes())
            .open(&self.mem)
            .map_err(|err| open_error(&self.mem, err))
    }

    fn bases(&self) -> Result<Bases> {
        Ok(bases_of(&self.regions()?))
    }
}

fn open_error(path: &Path, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
        _ => Error::Io(err),
    }
}
