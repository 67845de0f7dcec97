//! Bot credentials submitted through the configuration form.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Form field names, in submission order.
pub const FIELDS: [&str; 4] = [
    "telegram_token",
    "twilio_account_sid",
    "twilio_auth_token",
    "twilio_phone_number",
];

/// The credentials a bot needs to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSettings {
    pub telegram_token: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
}

impl BotSettings {
    /// Field name/value pairs for a form-encoded POST.
    pub fn form_fields(&self) -> [(&'static str, &str); 4] {
        [
            (FIELDS[0], &self.telegram_token),
            (FIELDS[1], &self.twilio_account_sid),
            (FIELDS[2], &self.twilio_auth_token),
            (FIELDS[3], &self.twilio_phone_number),
        ]
    }

    /// Build settings from decoded form pairs.
    ///
    /// Every field must be present; an empty value is accepted. When a key
    /// repeats, the first occurrence wins.
    pub fn from_form(pairs: &[(String, String)]) -> Result<Self> {
        let get = |name: &str| -> Result<String> {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .with_context(|| format!("missing form field: {name}"))
        };
        Ok(Self {
            telegram_token: get(FIELDS[0])?,
            twilio_account_sid: get(FIELDS[1])?,
            twilio_auth_token: get(FIELDS[2])?,
            twilio_phone_number: get(FIELDS[3])?,
        })
    }

    /// Write the settings as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let body = toml::to_string_pretty(self).context("failed to serialize bot settings")?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Read settings previously written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).context("failed to parse bot settings")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_form_requires_every_field() {
        let err = BotSettings::from_form(&pairs(&[
            ("telegram_token", "t"),
            ("twilio_account_sid", "s"),
            ("twilio_auth_token", "a"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("twilio_phone_number"));
    }

    #[test]
    fn from_form_accepts_empty_values_and_extra_fields() {
        let settings = BotSettings::from_form(&pairs(&[
            ("csrf", "ignored"),
            ("telegram_token", ""),
            ("twilio_account_sid", "AC1"),
            ("twilio_auth_token", "secret"),
            ("twilio_phone_number", "+15550100"),
        ]))
        .unwrap();
        assert_eq!(settings.telegram_token, "");
        assert_eq!(settings.twilio_phone_number, "+15550100");
    }

    #[test]
    fn form_fields_follow_field_order() {
        let settings = BotSettings {
            telegram_token: "t".into(),
            twilio_account_sid: "s".into(),
            twilio_auth_token: "a".into(),
            twilio_phone_number: "p".into(),
        };
        let names: Vec<_> = settings.form_fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(names, FIELDS);
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("botdash-settings-{}", std::process::id()));
        let path = dir.join("nested").join("bot-settings.toml");
        let settings = BotSettings {
            telegram_token: "123:abc".into(),
            twilio_account_sid: "AC9".into(),
            twilio_auth_token: "tok".into(),
            twilio_phone_number: "+1".into(),
        };
        settings.save(&path).unwrap();
        assert_eq!(BotSettings::load(&path).unwrap(), settings);
        let _ = fs::remove_dir_all(&dir);
    }
}
