//! Init command - initialize configuration file.

use std::path::Path;

use tileproxy::config::{config_file_path, ConfigFile, ENV_ACCOUNT_ID};

use crate::error::CliError;

/// Run the init command.
///
/// An existing file is loaded and written back, which keeps its values and
/// adds any settings it was missing.
pub fn run(config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    let existed = path.exists();
    let config = ConfigFile::load_from(&path)?;
    config.save_to(&path)?;

    if existed {
        println!("Updated configuration file: {}", path.display());
    } else {
        println!("Created configuration file: {}", path.display());
    }
    println!();
    println!("Edit this file to point TileProxy at your bucket.");
    if config.storage.endpoint.is_none() && config.storage.account_id.is_none() {
        println!(
            "Set [storage] account_id (or export {}) before running 'tileproxy serve'.",
            ENV_ACCOUNT_ID
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");

        run(Some(&path)).unwrap();
        assert!(path.is_file());
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_init_keeps_existing_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[cache]\nretention_secs = 90\n").unwrap();

        run(Some(&path)).unwrap();
        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.cache.retention_secs, 90);
        assert!(std::fs::read_to_string(&path).unwrap().contains("[storage]"));
    }
}
