//! Human-readable byte counts for CLI output.

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Format a byte count using the largest binary unit that fits.
///
/// Whole multiples print without a fraction (`2MB`); other values keep one
/// decimal (`1.5KB`).
pub fn format_size(bytes: u64) -> String {
    let (unit, suffix) = if bytes >= GB {
        (GB, "GB")
    } else if bytes >= MB {
        (MB, "MB")
    } else if bytes >= KB {
        (KB, "KB")
    } else {
        return format!("{}B", bytes);
    };

    if bytes % unit == 0 {
        format!("{}{}", bytes / unit, suffix)
    } else {
        format!("{:.1}{}", bytes as f64 / unit as f64, suffix)
    }
}
