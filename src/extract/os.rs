//! Operating system inference.
//!
//! Neither console states the OS outright; it hides in the AMI name,
//! platform details or blueprint text. This module turns that text into a
//! distribution name and version.

use once_cell::sync::Lazy;
use regex::Regex;

static DOTTED_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}\.\d{1,2}\b").unwrap());
static MAJOR_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}\b").unwrap());
static YEAR_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b20\d{2}\b").unwrap());

/// Ubuntu release codenames that show up in AMI names
const UBUNTU_CODENAMES: &[(&str, &str)] = &[
    ("noble", "24.04"),
    ("jammy", "22.04"),
    ("focal", "20.04"),
    ("bionic", "18.04"),
    ("xenial", "16.04"),
];

/// Distribution name and version inferred from descriptive text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsInfo {
    pub os: Option<String>,
    pub version: Option<String>,
}

/// Infer the OS from AMI name, platform details or blueprint text.
/// Returns an empty `OsInfo` when nothing matches.
pub fn infer_os(text: &str) -> OsInfo {
    let lower = text.to_lowercase();

    if lower.contains("ubuntu") {
        let version = DOTTED_VERSION
            .find(&lower)
            .map(|m| m.as_str().to_string())
            .or_else(|| {
                UBUNTU_CODENAMES
                    .iter()
                    .find(|(codename, _)| lower.contains(codename))
                    .map(|(_, v)| (*v).to_string())
            });
        return OsInfo { os: Some("Ubuntu".to_string()), version };
    }
    if lower.contains("al2023") || lower.contains("amazon linux 2023") {
        return OsInfo {
            os: Some("Amazon Linux".to_string()),
            version: Some("2023".to_string()),
        };
    }
    if lower.contains("amzn2") || lower.contains("amazon linux") {
        return OsInfo {
            os: Some("Amazon Linux".to_string()),
            version: Some("2".to_string()),
        };
    }
    if lower.contains("windows") {
        let version = YEAR_VERSION.find(&lower).map(|m| m.as_str().to_string());
        return OsInfo { os: Some("Windows Server".to_string()), version };
    }
    if lower.contains("red hat") || lower.contains("rhel") {
        let version = DOTTED_VERSION
            .find(&lower)
            .or_else(|| MAJOR_VERSION.find(&lower))
            .map(|m| m.as_str().to_string());
        return OsInfo {
            os: Some("Red Hat Enterprise Linux".to_string()),
            version,
        };
    }
    if lower.contains("debian") {
        let version = MAJOR_VERSION.find(&lower).map(|m| m.as_str().to_string());
        return OsInfo { os: Some("Debian".to_string()), version };
    }
    if lower.contains("centos") {
        let version = MAJOR_VERSION.find(&lower).map(|m| m.as_str().to_string());
        return OsInfo { os: Some("CentOS".to_string()), version };
    }
    if lower.contains("suse") {
        let version = MAJOR_VERSION.find(&lower).map(|m| m.as_str().to_string());
        return OsInfo { os: Some("SUSE Linux".to_string()), version };
    }

    OsInfo::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ubuntu_with_dotted_version() {
        let info = infer_os("ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server");
        assert_eq!(info.os.as_deref(), Some("Ubuntu"));
        assert_eq!(info.version.as_deref(), Some("22.04"));
    }

    #[test]
    fn test_ubuntu_codename_only() {
        let info = infer_os("ubuntu-noble-amd64-server");
        assert_eq!(info.os.as_deref(), Some("Ubuntu"));
        assert_eq!(info.version.as_deref(), Some("24.04"));
    }

    #[test]
    fn test_amazon_linux_variants() {
        assert_eq!(
            infer_os("al2023-ami-2023.4.20240528.0-kernel-6.1-x86_64").version.as_deref(),
            Some("2023")
        );
        assert_eq!(
            infer_os("amzn2-ami-hvm-2.0-x86_64-gp2").version.as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_windows_year_version() {
        let info = infer_os("Windows_Server-2022-English-Full-Base");
        assert_eq!(info.os.as_deref(), Some("Windows Server"));
        assert_eq!(info.version.as_deref(), Some("2022"));
    }

    #[test]
    fn test_unknown_text_yields_nothing() {
        let info = infer_os("some custom appliance image");
        assert!(info.os.is_none());
        assert!(info.version.is_none());
    }
}
