//! Utility helpers: path resolution, timestamps, string manipulation.

use std::path::PathBuf;

/// Get the Scribe data directory (e.g. `~/.scribe/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".scribe")
}

/// Get current ISO 8601 timestamp.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Local-time stamp for file names: `YYYYMMDD_HHMMSS_mmm`.
pub fn file_stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Sanitize a human-chosen name into a directory-safe slug.
///
/// Alphanumerics, `-` and `_` survive; whitespace runs become `_`;
/// everything else is dropped. Leading/trailing `_`/`-` and dots are trimmed.
pub fn safe_dirname(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.trim().chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else if c.is_whitespace() {
            pending_sep = true;
        }
    }
    out.trim_matches(|c| c == '_' || c == '-').to_string()
}

/// Mask a secret for display: `abcd...wxyz`. Short secrets are fully hidden.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let result = truncate_string("hello world, this is a long string", 15);
        assert_eq!(result, "hello world,...");
    }

    #[test]
    fn test_truncate_unicode() {
        let result = truncate_string("こんにちは世界です", 5);
        assert_eq!(result, "こん...");
    }

    #[test]
    fn test_safe_dirname() {
        assert_eq!(safe_dirname("The Last Star"), "The_Last_Star");
        assert_eq!(safe_dirname("  sci-fi: collection!  "), "sci-fi_collection");
        assert_eq!(safe_dirname("../../etc/passwd"), "etcpasswd");
        assert_eq!(safe_dirname("???"), "");
    }

    #[test]
    fn test_safe_dirname_collapses_whitespace() {
        assert_eq!(safe_dirname("a   b\tc"), "a_b_c");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcd1234efgh5678"), "abcd...5678");
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn test_file_stamp_format() {
        let stamp = file_stamp();
        // YYYYMMDD_HHMMSS_mmm
        assert_eq!(stamp.len(), 19);
        assert_eq!(stamp.chars().nth(8), Some('_'));
        assert_eq!(stamp.chars().nth(15), Some('_'));
    }

    #[test]
    fn test_timestamp_is_valid() {
        chrono::DateTime::parse_from_rfc3339(&timestamp()).unwrap();
    }

    #[test]
    fn test_data_path_ends_with_scribe() {
        assert!(get_data_path().ends_with(".scribe"));
    }
}
