//! INI serialization: `ConfigFile` → commented config.ini text.

use std::fmt::Write;
use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    let storage_directory = config
        .storage
        .directory
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();

    let mut out = format!(
        r#"[server]
; Address the HTTP server listens on
bind = {bind}

[storage]
; Remote backend:
;   s3        - S3-compatible bucket (Cloudflare R2 by default)
;   directory - local directory laid out like the bucket
backend = {backend}
; Explicit endpoint URL. If empty, derived from account_id as
; https://<account_id>.r2.cloudflarestorage.com
endpoint = {endpoint}
; Cloudflare account id (env: R2_ACCOUNT_ID)
account_id = {account_id}
bucket = {bucket}
region = {region}
; Root directory when backend = directory
directory = {storage_directory}
; Credentials (env: R2_ACCESS_KEY, R2_SECRET_KEY). Leave empty for public buckets.
access_key = {access_key}
secret_key = {secret_key}
; Deadline for one remote call, in seconds
timeout_secs = {timeout_secs}

[cache]
; Local tile cache root
directory = {cache_directory}
; Entries older than this are deleted (seconds, default 12 hours)
retention_secs = {retention_secs}
; Time between cache sweeps (seconds, default 1 hour)
sweep_interval_secs = {sweep_interval_secs}

[tiles]
; Layer whose "static" tiles are stored without a timestamp segment
static_layer = {static_layer}
; Object served when a tile is missing
placeholder_key = {placeholder_key}
; Cache-Control header sent with tiles
cache_control = {cache_control}

[logging]
file = {log_file}

[layers]
; <layer name> = <remote prefix>
"#,
        bind = config.server.bind,
        backend = config.storage.backend,
        endpoint = opt(&config.storage.endpoint),
        account_id = opt(&config.storage.account_id),
        bucket = config.storage.bucket,
        region = config.storage.region,
        storage_directory = storage_directory,
        access_key = opt(&config.storage.access_key),
        secret_key = opt(&config.storage.secret_key),
        timeout_secs = config.storage.timeout_secs,
        cache_directory = path_to_string(&config.cache.directory),
        retention_secs = config.cache.retention_secs,
        sweep_interval_secs = config.cache.sweep_interval_secs,
        static_layer = opt(&config.tiles.static_layer),
        placeholder_key = config.tiles.placeholder_key,
        cache_control = config.tiles.cache_control,
        log_file = path_to_string(&config.logging.file),
    );

    for (name, prefix) in &config.layers {
        let _ = writeln!(out, "{} = {}", name, prefix);
    }

    out.push_str("\n[legends]\n; <legend filename> = <object key>\n");
    for (file, key) in &config.legends {
        let _ = writeln!(out, "{} = {}", file, key);
    }

    out
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
