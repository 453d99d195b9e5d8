//! Legacy client detection.
//!
//! The login endpoint refuses to be driven by Internet Explorer 6, 7 or 8.
//! Detection works on the same pair of strings a browser reports as
//! `navigator.appName` and `navigator.appVersion`.

use serde::{Deserialize, Serialize};

/// Application name reported by Internet Explorer
const IE_APP_NAME: &str = "Microsoft Internet Explorer";

/// Name and version string of the client driving the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub app_name: String,
    pub app_version: String,
}

impl ClientIdentity {
    pub fn new(app_name: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
        }
    }

    /// Identity of this build of logindesk
    pub fn current() -> Self {
        Self::new("logindesk", format!("{} (terminal)", env!("CARGO_PKG_VERSION")))
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self::current()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyBrowser {
    Ie6,
    Ie7,
    Ie8,
}

impl LegacyBrowser {
    /// Version token as it appears once spaces are stripped
    pub fn token(&self) -> &'static str {
        match self {
            LegacyBrowser::Ie6 => "MSIE6.0",
            LegacyBrowser::Ie7 => "MSIE7.0",
            LegacyBrowser::Ie8 => "MSIE8.0",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        [LegacyBrowser::Ie6, LegacyBrowser::Ie7, LegacyBrowser::Ie8]
            .into_iter()
            .find(|b| b.token() == token)
    }
}

/// Check whether the identity is one of the unsupported IE versions.
///
/// The version string is split on `;` and only the second segment is
/// inspected, with every space removed. A version string without a second
/// segment is never legacy.
pub fn detect_legacy(identity: &ClientIdentity) -> Option<LegacyBrowser> {
    if identity.app_name != IE_APP_NAME {
        return None;
    }
    let segment = identity.app_version.split(';').nth(1)?;
    let token: String = segment.chars().filter(|c| *c != ' ').collect();
    LegacyBrowser::from_token(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ie(version: &str) -> ClientIdentity {
        ClientIdentity::new(IE_APP_NAME, version)
    }

    fn is_legacy(identity: &ClientIdentity) -> bool {
        detect_legacy(identity).is_some()
    }

    #[test]
    fn test_detects_legacy_ie_versions() {
        assert_eq!(
            detect_legacy(&ie("4.0 (compatible; MSIE 6.0; Windows NT 5.1)")),
            Some(LegacyBrowser::Ie6)
        );
        assert_eq!(
            detect_legacy(&ie("4.0 (compatible; MSIE 7.0; Windows NT 6.0)")),
            Some(LegacyBrowser::Ie7)
        );
        assert_eq!(
            detect_legacy(&ie("4.0 (compatible; MSIE 8.0; Windows NT 6.1; Trident/4.0)")),
            Some(LegacyBrowser::Ie8)
        );
    }

    #[test]
    fn test_spaces_inside_token_are_ignored() {
        assert!(is_legacy(&ie("4.0 (compatible;  M S I E 7 . 0 ; Windows)")));
    }

    #[test]
    fn test_newer_ie_is_not_legacy() {
        assert!(!is_legacy(&ie("4.0 (compatible; MSIE 9.0; Windows NT 6.1)")));
        assert!(!is_legacy(&ie("5.0 (Windows NT 10.0; Trident/7.0; rv:11.0)")));
    }

    #[test]
    fn test_other_app_names_never_match() {
        let netscape = ClientIdentity::new("Netscape", "4.0 (compatible; MSIE 6.0; Windows NT 5.1)");
        assert!(!is_legacy(&netscape));
        assert!(!is_legacy(&ClientIdentity::current()));
    }

    #[test]
    fn test_token_must_be_second_segment() {
        assert!(!is_legacy(&ie("MSIE 6.0; compatible")));
        assert!(!is_legacy(&ie("4.0 (compatible; Windows; MSIE 6.0)")));
    }

    #[test]
    fn test_version_without_separator_is_not_legacy() {
        assert!(!is_legacy(&ie("")));
        assert!(!is_legacy(&ie("MSIE 6.0")));
    }
}
