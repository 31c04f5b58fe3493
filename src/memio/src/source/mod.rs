//! Memory sources
//!
//! A source hands out positionable streams over an address space, together with
//! the name → base-address table used to evaluate address expressions:
//! - Live processes through procfs via [`Process`]
//! - In-memory snapshots via [`BufferSource`]

mod buffer;
mod permission;
mod process;
mod region;
mod traits;

pub use buffer::{BufferSource, BufferStream};
pub use permission::FilePermission;
pub use process::Process;
pub use region::{bases_of, parse_maps, MemoryRegion};
pub use traits::{Access, MemorySource};
