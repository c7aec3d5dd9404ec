//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::{ConfigFile, StorageBackend};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the
/// INI. A `[layers]` or `[legends]` section replaces the default table
/// entirely.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server]
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("bind") {
            config.server.bind = v.trim().parse().map_err(|_| {
                invalid("server", "bind", v, "expected an address like 0.0.0.0:5000")
            })?;
        }
    }

    // [storage]
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = section.get("backend") {
            config.storage.backend = v
                .parse::<StorageBackend>()
                .map_err(|_| invalid("storage", "backend", v, "must be 's3' or 'directory'"))?;
        }
        if let Some(v) = non_empty(section, "endpoint") {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid(
                    "storage",
                    "endpoint",
                    &v,
                    "must start with http:// or https://",
                ));
            }
            config.storage.endpoint = Some(v);
        }
        if let Some(v) = non_empty(section, "account_id") {
            config.storage.account_id = Some(v);
        }
        if let Some(v) = non_empty(section, "bucket") {
            config.storage.bucket = v;
        }
        if let Some(v) = non_empty(section, "region") {
            config.storage.region = v;
        }
        if let Some(v) = non_empty(section, "directory") {
            config.storage.directory = Some(expand_tilde(&v));
        }
        if let Some(v) = non_empty(section, "access_key") {
            config.storage.access_key = Some(v);
        }
        if let Some(v) = non_empty(section, "secret_key") {
            config.storage.secret_key = Some(v);
        }
        if let Some(v) = section.get("timeout_secs") {
            config.storage.timeout_secs = parse_positive("storage", "timeout_secs", v)?;
        }
    }

    // [cache]
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "directory") {
            config.cache.directory = expand_tilde(&v);
        }
        if let Some(v) = section.get("retention_secs") {
            config.cache.retention_secs = parse_positive("cache", "retention_secs", v)?;
        }
        if let Some(v) = section.get("sweep_interval_secs") {
            config.cache.sweep_interval_secs = parse_positive("cache", "sweep_interval_secs", v)?;
        }
    }

    // [tiles]
    if let Some(section) = ini.section(Some("tiles")) {
        if section.contains_key("static_layer") {
            config.tiles.static_layer = non_empty(section, "static_layer");
        }
        if let Some(v) = non_empty(section, "placeholder_key") {
            config.tiles.placeholder_key = v;
        }
        if let Some(v) = non_empty(section, "cache_control") {
            config.tiles.cache_control = v;
        }
    }

    // [layers]
    if let Some(section) = ini.section(Some("layers")) {
        config.layers = section
            .iter()
            .map(|(name, prefix)| (name.trim().to_string(), prefix.trim().to_string()))
            .collect();
        if let Some((name, prefix)) = config.layers.iter().find(|(_, p)| p.is_empty()) {
            return Err(invalid("layers", name, prefix, "prefix must not be empty"));
        }
    }

    // [legends]
    if let Some(section) = ini.section(Some("legends")) {
        config.legends = section
            .iter()
            .map(|(file, key)| (file.trim().to_string(), key.trim().to_string()))
            .collect();
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(&v);
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty(section: &Properties, key: &str) -> Option<String> {
    section
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_positive(section: &str, key: &str, value: &str) -> Result<u64, ConfigFileError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(
            section,
            key,
            value,
            "must be a positive integer (seconds)",
        )),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
