//! Formatting helpers for the presentation layer
//!
//! Pure functions that render stored numbers the way the bot shows them in
//! chat: file sizes with one decimal and a binary unit, audio durations as
//! `h:mm:ss` (or `m:ss` under an hour).

/// Formats a file size in bytes into a human-readable string.
///
/// `None` renders as "Noma'lum" (unknown), which is what book cards show
/// for files Telegram reported no size for.
pub fn format_file_size(size_bytes: Option<u64>) -> String {
    let Some(size) = size_bytes else {
        return "Noma'lum".to_string();
    };

    let mut value = size as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} TB", value)
}

/// Formats an audio duration in seconds as `h:mm:ss`, or `m:ss` when the
/// recording is shorter than an hour. Zero or missing duration renders as
/// "Noma'lum".
pub fn format_duration(seconds: Option<u32>) -> String {
    let Some(total) = seconds.filter(|s| *s > 0) else {
        return "Noma'lum".to_string();
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_size_units() {
        assert_eq!(format_file_size(Some(512)), "512.0 B");
        assert_eq!(format_file_size(Some(2048)), "2.0 KB");
        assert_eq!(format_file_size(Some(5 * 1024 * 1024)), "5.0 MB");
        assert_eq!(format_file_size(Some(3 * 1024 * 1024 * 1024)), "3.0 GB");
    }

    #[test]
    fn file_size_unknown() {
        assert_eq!(format_file_size(None), "Noma'lum");
    }

    #[test]
    fn duration_under_an_hour() {
        assert_eq!(format_duration(Some(125)), "2:05");
        assert_eq!(format_duration(Some(59)), "0:59");
    }

    #[test]
    fn duration_with_hours() {
        assert_eq!(format_duration(Some(3600)), "1:00:00");
        assert_eq!(format_duration(Some(3725)), "1:02:05");
    }

    #[test]
    fn duration_unknown() {
        assert_eq!(format_duration(None), "Noma'lum");
        assert_eq!(format_duration(Some(0)), "Noma'lum");
    }
}
