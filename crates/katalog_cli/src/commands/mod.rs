//! CLI command implementations.

pub mod init;
pub mod stats;
pub mod volume;

use katalog_db::Database;
use katalog_store::{Config, RedbStore};
use std::path::Path;

/// Boxed error type shared by all commands.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Opens an existing catalogue, refusing to create one.
pub fn open_database(path: &Path) -> Result<Database, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!(
            "no catalogue at {}, run `katalog init` first",
            path.display()
        )
        .into());
    }
    let store = RedbStore::open_with_config(path, Config::new().create_if_missing(false))?;
    Ok(Database::new(Box::new(store)))
}
