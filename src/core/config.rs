use once_cell::sync::Lazy;
use std::env;

/// Configuration constants for the bot

/// Path to the SQLite database file
/// Read from DATABASE_PATH environment variable, defaults to "kitobxona.sqlite"
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "kitobxona.sqlite".to_string()));

/// Path to the log file
/// Read from LOG_FILE_PATH environment variable, defaults to "kitobxona.log"
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "kitobxona.log".to_string()));

/// Admin configuration
pub mod admin {
    use super::*;

    /// Super-admin Telegram IDs (comma-separated)
    /// Read from SUPER_ADMIN_IDS environment variable.
    /// Super-admins hold the highest role, are configured statically and
    /// cannot be demoted through the bot.
    pub static SUPER_ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("SUPER_ADMIN_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .collect()
    });

    /// Check if a Telegram ID belongs to a configured super-admin
    pub fn is_super_admin(telegram_id: i64) -> bool {
        SUPER_ADMIN_IDS.contains(&telegram_id)
    }
}

/// Conversation session configuration
pub mod session {
    use super::*;
    use std::time::Duration;

    /// Session time-to-live in seconds
    /// Read from SESSION_TTL_SECS environment variable.
    /// 0 or unset means sessions never expire (abandoned dialogs persist
    /// until overwritten or cancelled).
    pub static SESSION_TTL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    });

    /// Session TTL as a Duration, None when expiry is disabled
    pub fn ttl() -> Option<Duration> {
        match *SESSION_TTL_SECS {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Validation configuration
pub mod validation {
    /// Maximum length of a category or book name
    pub const MAX_NAME_LENGTH: usize = 128;

    /// Maximum length of a description
    pub const MAX_DESCRIPTION_LENGTH: usize = 1024;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_admin_list_defaults_to_empty() {
        if env::var("SUPER_ADMIN_IDS").is_err() {
            assert!(admin::SUPER_ADMIN_IDS.is_empty());
            assert!(!admin::is_super_admin(42));
        }
    }

    #[test]
    fn session_ttl_disabled_by_default() {
        if env::var("SESSION_TTL_SECS").is_err() {
            assert!(session::ttl().is_none());
        }
    }
}
