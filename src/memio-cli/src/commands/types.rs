//! Type listing

use anyhow::{Context, Result};

/// Handle the types command
///
/// Lists every registered type with its keys, and its documentation when verbose.
pub fn handle(verbose: bool) -> Result<()> {
    let registry = memio::types::global().context("Failed to load type registry")?;

    for entry in registry.entries() {
        println!("{}", entry.keys().join(", "));
        let doc = entry.doc();
        if verbose {
            for line in doc.lines() {
                println!("    {}", line);
            }
        } else if let Some(summary) = doc.lines().next() {
            println!("    {}", summary);
        }
    }

    Ok(())
}
