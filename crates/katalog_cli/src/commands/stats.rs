//! Stats command implementation.

use std::path::Path;

use super::{open_database, CommandResult};

/// Prints catalogue statistics.
pub fn run(path: &Path) -> CommandResult {
    let db = open_database(path)?;
    let stats = db.stats()?;
    db.close()?;

    println!("Catalogue statistics");
    println!("====================");
    println!();
    println!("Path:        {}", path.display());
    println!("ID:          {}", stats.id);
    println!("Version:     {}", stats.version);
    println!("Volumes:     {}", stats.volumes);
    println!("Directories: {}", stats.directories);
    println!("Files:       {}", stats.files);
    println!("Created:     {}", stats.created.to_rfc3339());
    println!("Last saved:  {}", stats.last_saved.to_rfc3339());
    Ok(())
}
