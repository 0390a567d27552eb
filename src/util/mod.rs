//
//  schematics-cli
//  util/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Utility Module
//!
//! Helpers shared by the CLI commands and the API layer.
//!
//! ## Categories
//!
//! - **Time**: [`format_time`], [`format_duration`], [`format_relative_time`]
//! - **Strings**: [`truncate`], [`mask_secret`], [`parse_key_value`]
//! - **Files**: [`read_document`]
//! - **System**: [`open_browser`]
//!
//! ## Example
//!
//! ```rust
//! use schematics_cli::util::{mask_secret, parse_key_value, truncate};
//!
//! assert_eq!(truncate("terraform-workspace", 10), "terraf...");
//! assert_eq!(mask_secret("abcdefghijklmnop"), "abcd************");
//! assert_eq!(parse_key_value("region=us-south").unwrap(), ("region".into(), "us-south".into()));
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::de::DeserializeOwned;

/// Formats an RFC 3339 timestamp as local `YYYY-MM-DD HH:MM:SS`.
///
/// Values that do not parse are returned unchanged.
pub fn format_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// Compact duration: `45s`, `3m 12s`, `2h 5m`, `1d 4h`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// "5 minutes ago" style rendering of an RFC 3339 timestamp.
pub fn format_relative_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => relative_to(dt.with_timezone(&Utc), Utc::now()),
        Err(_) => timestamp.to_string(),
    }
}

fn relative_to(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - then).num_seconds();
    if diff < 0 {
        return "in the future".to_string();
    }

    let (amount, unit) = match diff {
        0..=59 => return "just now".to_string(),
        60..=3599 => (diff / 60, "minute"),
        3600..=86399 => (diff / 3600, "hour"),
        86400..=604799 => (diff / 86400, "day"),
        604800..=2591999 => (diff / 604800, "week"),
        2592000..=31535999 => (diff / 2592000, "month"),
        _ => (diff / 31536000, "year"),
    };
    format!("{} {}{} ago", amount, unit, if amount == 1 { "" } else { "s" })
}

/// Shortens `s` to at most `max_len` characters, ending in `...`.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max_len).collect()
    }
}

/// Hides a secret for display, keeping the first four characters of
/// secrets long enough that doing so reveals little.
pub fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len < 12 {
        return "*".repeat(len.max(4));
    }
    let head: String = secret.chars().take(4).collect();
    format!("{}{}", head, "*".repeat(len - 4))
}

/// Splits `KEY=VALUE`. The value may itself contain `=`.
pub fn parse_key_value(input: &str) -> Result<(String, String)> {
    let (key, value) = input
        .split_once('=')
        .with_context(|| format!("expected KEY=VALUE, got '{}'", input))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{}'", input);
    }
    Ok((key.to_string(), value.to_string()))
}

/// Reads a request document from a JSON or YAML file.
///
/// `.yaml` and `.yml` files are read as YAML, anything else as JSON. A path
/// of `-` reads JSON or YAML from stdin.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut content)?;
        // YAML is a superset of JSON
        return serde_yaml::from_str(&content).context("Failed to parse document from stdin");
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Opens `url` in the default browser.
pub fn open_browser(url: &str) -> Result<()> {
    webbrowser::open(url).with_context(|| format!("Failed to open {}", url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_secs(192)), "3m 12s");
        assert_eq!(format_duration(Duration::from_secs(7500)), "2h 5m");
        assert_eq!(format_duration(Duration::from_secs(100800)), "1d 4h");
    }

    #[test]
    fn test_relative_time() {
        let now = Utc.with_ymd_and_hms(2026, 1, 12, 12, 0, 0).unwrap();
        assert_eq!(relative_to(now, now), "just now");
        assert_eq!(relative_to(now - chrono::Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_to(now - chrono::Duration::hours(5), now), "5 hours ago");
        assert_eq!(relative_to(now - chrono::Duration::days(14), now), "2 weeks ago");
        assert_eq!(relative_to(now + chrono::Duration::days(1), now), "in the future");
    }

    #[test]
    fn test_unparseable_timestamps_pass_through() {
        assert_eq!(format_time("yesterday"), "yesterday");
        assert_eq!(format_relative_time(""), "");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("workspace-éééé", 12), "workspace...");
        assert_eq!(truncate("ééééé", 2), "éé");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "****");
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret("0123456789abcdef"), "0123************");
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_key_value("empty=").unwrap().1, "");
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_read_document_by_extension() {
        #[derive(serde::Deserialize)]
        struct Doc {
            name: String,
        }

        let dir = tempfile::tempdir().unwrap();

        let json = dir.path().join("req.json");
        std::fs::File::create(&json)
            .unwrap()
            .write_all(br#"{"name":"from-json"}"#)
            .unwrap();
        let yaml = dir.path().join("req.yml");
        std::fs::write(&yaml, "name: from-yaml\n").unwrap();

        assert_eq!(read_document::<Doc>(&json).unwrap().name, "from-json");
        assert_eq!(read_document::<Doc>(&yaml).unwrap().name, "from-yaml");
        assert!(read_document::<Doc>(&dir.path().join("missing.json")).is_err());
    }
}
