//! Init command implementation.

use katalog_db::Database;
use katalog_store::{Config, RedbStore};
use std::path::Path;

use super::CommandResult;

/// Creates a new catalogue file at `path`.
pub fn run(path: &Path) -> CommandResult {
    if path.exists() {
        return Err(format!("catalogue {} already exists", path.display()).into());
    }

    let store = RedbStore::open_with_config(path, Config::new().error_if_exists(true))?;
    let db = Database::new(Box::new(store));
    let id = db.init()?;
    db.close()?;

    println!("Created catalogue {} (id {id})", path.display());
    Ok(())
}
