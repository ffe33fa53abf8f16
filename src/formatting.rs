// src/formatting.rs

/// Renders a byte count with a binary unit suffix, e.g. `1.50 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while rounds_to_at_least(value, 1024.0) && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Renders a count with a decimal suffix, e.g. `12.35K` or `3.00M`.
pub fn format_number(n: u64) -> String {
    const UNITS: [&str; 3] = ["K", "M", "B"];

    if n < 1000 {
        return n.to_string();
    }

    let mut value = n as f64 / 1e3;
    let mut unit = 0;
    while rounds_to_at_least(value, 1000.0) && unit < UNITS.len() - 1 {
        value /= 1e3;
        unit += 1;
    }
    format!("{:.2}{}", value, UNITS[unit])
}

/// True if `value` shown with two decimals would read `limit` or more.
fn rounds_to_at_least(value: f64, limit: f64) -> bool {
    (value * 100.0).round() / 100.0 >= limit
}
