//! Login form state and request body encoding.
//!
//! The form is serialized into an ordered name/value map, JSON-encoded and
//! then base64-encoded. The resulting string is the whole POST body.

use anyhow::{Context, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde_json::{Map, Value};
use tracing::warn;

/// Maximum length for email input.
/// 254 is the longest address SMTP allows.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Form field names as the login endpoint expects them
pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

/// Text inputs of the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn value(&self, field: LoginField) -> &str {
        match field {
            LoginField::Email => &self.email,
            LoginField::Password => &self.password,
        }
    }

    /// Append a typed character, ignoring it if the field is full or the
    /// character is a control character. Returns whether it was accepted.
    pub fn push_char(&mut self, field: LoginField, c: char) -> bool {
        let accepted = match field {
            LoginField::Email => can_add_email_char(self.email.chars().count(), c),
            LoginField::Password => can_add_password_char(self.password.chars().count(), c),
        };
        if accepted {
            self.field_mut(field).push(c);
        }
        accepted
    }

    pub fn pop_char(&mut self, field: LoginField) {
        self.field_mut(field).pop();
    }

    /// Clear both inputs
    pub fn reset(&mut self) {
        self.email.clear();
        self.password.clear();
    }

    /// Serialize the form, inputs first, followed by any extra fields.
    /// Extra fields cannot replace the typed email or password.
    pub fn to_fields(&self, extra: &[(String, String)]) -> FormFields {
        let mut fields = FormFields::new();
        fields.insert(EMAIL_FIELD, &self.email);
        fields.insert(PASSWORD_FIELD, &self.password);
        for (name, value) in extra {
            if name == EMAIL_FIELD || name == PASSWORD_FIELD {
                warn!(field = %name, "Ignoring extra field that shadows a form input");
                continue;
            }
            fields.insert(name, value);
        }
        fields
    }

    fn field_mut(&mut self, field: LoginField) -> &mut String {
        match field {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }
}

/// Insertion-ordered map of form field name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields(Map<String, Value>);

impl FormFields {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set a field. A repeated name keeps its first position and takes the
    /// new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), Value::String(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// base64(JSON(fields)), the login request body
    pub fn encode_body(&self) -> Result<String> {
        let json = serde_json::to_string(&self.0).context("Failed to serialize form fields")?;
        Ok(BASE64_STANDARD.encode(json))
    }

    /// Inverse of `encode_body`. Non-string values are rejected.
    pub fn decode_body(body: &str) -> Result<Self> {
        let bytes = BASE64_STANDARD
            .decode(body.trim())
            .context("Request body is not valid base64")?;
        let map: Map<String, Value> =
            serde_json::from_slice(&bytes).context("Request body is not a JSON object")?;
        if let Some((name, _)) = map.iter().find(|(_, v)| !v.is_string()) {
            anyhow::bail!("Form field '{}' is not a string", name);
        }
        Ok(Self(map))
    }
}

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}
