//! User-facing text.
//!
//! Only the invalid-credentials text is fixed by the login backend's
//! conventions; the rest follows the selected locale.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "en")]
    En,
}

/// Message table for one locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    pub navigator_warning: &'static str,
    pub login_error: &'static str,
    pub invalid_credentials: &'static str,
    pub storage_error: &'static str,
    pub signing_in: &'static str,
    pub already_signing_in: &'static str,
}

const ZH_CN: Messages = Messages {
    navigator_warning: "您的浏览器版本过低，请升级到 IE9 以上版本或使用其他浏览器",
    login_error: "登录失败，请稍后重试",
    invalid_credentials: "用户名和密码不正确",
    storage_error: "无法保存登录信息",
    signing_in: "正在登录...",
    already_signing_in: "正在登录，请稍候",
};

const EN: Messages = Messages {
    navigator_warning: "Your browser is too old. Please upgrade to IE9 or later, or use another browser.",
    login_error: "Login failed. Please try again later.",
    invalid_credentials: "Incorrect username or password",
    storage_error: "Could not save the login session",
    signing_in: "Signing in...",
    already_signing_in: "Sign-in already in progress",
};

impl Messages {
    pub fn for_locale(locale: Locale) -> &'static Messages {
        match locale {
            Locale::ZhCn => &ZH_CN,
            Locale::En => &EN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locale_invalid_credentials_text() {
        let messages = Messages::for_locale(Locale::default());
        assert_eq!(messages.invalid_credentials, "用户名和密码不正确");
    }

    #[test]
    fn test_locale_serde_names() {
        assert_eq!(serde_json::to_string(&Locale::ZhCn).unwrap(), "\"zh-CN\"");
        let en: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(en, Locale::En);
        assert_eq!(Messages::for_locale(en).invalid_credentials, "Incorrect username or password");
    }
}
