//! Target process selection

use anyhow::{bail, Context, Result};
use memio::Process;
use sysinfo::System;

use crate::cli::TargetArgs;
use crate::config::Config;

/// Attach to the process named by `--pid`, `--name`, or the configured default
pub fn attach(target: &TargetArgs, config: &Config) -> Result<Process> {
    let pid = match (target.pid, target.name.as_deref().or(config.process.as_deref())) {
        (Some(pid), _) => pid,
        (None, Some(name)) => find_process(name)?,
        (None, None) => bail!(
            "No target process. Pass --pid or --name, or set one with `memio configure --process NAME`"
        ),
    };
    memio::attach(pid).with_context(|| format!("Failed to attach to process {}", pid))
}

/// Find a running process by name.
///
/// Threads resolve to their thread group leader; with several matches the one
/// using the most memory wins.
pub fn find_process(name: &str) -> Result<u32> {
    let mut system = System::new_all();
    system.refresh_all();

    let mut candidates: Vec<(u32, u64)> = Vec::new();

    for process in system.processes().values() {
        let pid = process.pid().as_u32();
        if process.name().to_string_lossy() == name {
            let tgid = get_tgid(pid).unwrap_or(pid);
            candidates.push((tgid, process.memory()));
        }
    }

    candidates.sort_by(|a, b| b.1.cmp(&a.1));
    candidates.dedup_by(|a, b| a.0 == b.0);

    if let Some((pid, memory)) = candidates.first() {
        tracing::info!(pid, memory_mb = memory / 1_000_000, "found process {}", name);
        return Ok(*pid);
    }

    bail!("Process {:?} not found. Is it running?", name)
}

/// Get the thread group ID (main process) for a given PID/TID
pub fn get_tgid(pid: u32) -> Option<u32> {
    let status = std::fs::read_to_string(format!("/proc/{}/status", pid)).ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("Tgid:") {
            return rest.trim().parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_tgid_of_self() {
        let pid = std::process::id();
        assert_eq!(get_tgid(pid), Some(pid));
    }

    #[test]
    fn test_attach_by_pid() {
        let target = TargetArgs {
            pid: Some(std::process::id()),
            name: None,
        };
        let process = attach(&target, &Config::default()).unwrap();
        assert_eq!(process.pid(), std::process::id());
    }

    #[test]
    fn test_attach_without_target() {
        assert!(attach(&TargetArgs::default(), &Config::default()).is_err());
    }

    #[test]
    fn test_find_missing_process() {
        assert!(find_process("memio-no-such-process-name").is_err());
    }
}
