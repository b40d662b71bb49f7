//! Paths command handler.
//!
//! Displays all resolved paths for diagnostics and debugging.

use anyhow::Result;

use monteur_core::ResolvedPaths;

/// Resolve and print every path in `key = value` format.
pub fn execute() -> Result<()> {
    let paths = ResolvedPaths::resolve().map_err(crate::CliError::from)?;
    println!("{paths}");
    Ok(())
}
