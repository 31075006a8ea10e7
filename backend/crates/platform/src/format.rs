//! Display formatting helpers

const UNITS: [&str; 5] = ["", "K", "M", "G", "T"];

/// Human-readable byte count for metadata responses
///
/// `None` and zero render as `"UNK"`. The value is divided by 1024 while it
/// is strictly greater than 1024, so `1024` stays `"1024.0B"` and `1536`
/// becomes `"1.5KB"`.
pub fn format_bytes(size: Option<u64>) -> String {
    let Some(size) = size.filter(|&s| s > 0) else {
        return "UNK".to_string();
    };

    let mut value = size as f64;
    let mut unit = 0;
    while value > 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}B", value, UNITS[unit])
}
