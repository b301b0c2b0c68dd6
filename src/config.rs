use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::pdf::PageStyle;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub default_lang: Option<String>,
    pub default_model: Option<String>,
    pub translate_to: Option<String>,
    pub output_path: Option<PathBuf>,
    pub header: Option<String>,
    pub closing_title: Option<String>,
    pub smtp: Option<SmtpConfig>,
}

/// Outbound mail settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; defaults to `username`
    pub from: Option<String>,
}

impl SmtpConfig {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_SMTP_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SMTP_PORT)
    }

    pub fn from_address(&self) -> Option<&str> {
        self.from.as_deref().or(self.username.as_deref())
    }

    /// Password from the config file, or `YTDIGEST_SMTP_PASSWORD`
    pub fn password(&self) -> Option<String> {
        self.password
            .clone()
            .or_else(|| std::env::var("YTDIGEST_SMTP_PASSWORD").ok())
    }
}

impl Config {
    /// Load config from ~/.config/ytdigest/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// API key for `provider`, preferring the config file over the environment
    pub fn api_key(&self, provider: Provider) -> Option<String> {
        let configured = match provider {
            Provider::Gemini => &self.gemini_api_key,
            Provider::Anthropic => &self.anthropic_api_key,
            Provider::OpenAi => &self.openai_api_key,
        };
        configured
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(provider.env_var()).ok())
    }

    pub fn page_style(&self) -> PageStyle {
        let mut style = PageStyle::default();
        if let Some(ref header) = self.header {
            style.header = header.clone();
        }
        if let Some(ref closing) = self.closing_title {
            style.closing_title = closing.clone();
        }
        style
    }
}

/// LLM vendor, chosen by model name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Anthropic,
    OpenAi,
}

impl Provider {
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("gemini") {
            Provider::Gemini
        } else if model.starts_with("claude") {
            Provider::Anthropic
        } else {
            Provider::OpenAi
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "Gemini"),
            Provider::Anthropic => write!(f, "Anthropic"),
            Provider::OpenAi => write!(f, "OpenAI"),
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytdigest")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
gemini_api_key = "g-key"
default_lang = "es"
default_model = "gemini-1.5-pro"
translate_to = "de"
output_path = "/tmp/digest.pdf"
header = "Weekly Digest"

[smtp]
host = "mail.example.com"
port = 2525
username = "me@example.com"
password = "secret"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("g-key"));
        assert_eq!(config.default_lang.as_deref(), Some("es"));
        assert_eq!(config.default_model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(config.translate_to.as_deref(), Some("de"));
        assert_eq!(config.output_path, Some(PathBuf::from("/tmp/digest.pdf")));

        let smtp = config.smtp.as_ref().unwrap();
        assert_eq!(smtp.host(), "mail.example.com");
        assert_eq!(smtp.port(), 2525);
        assert_eq!(smtp.from_address(), Some("me@example.com"));
        assert_eq!(smtp.password().as_deref(), Some("secret"));

        let style = config.page_style();
        assert_eq!(style.header, "Weekly Digest");
        assert_eq!(style.closing_title, crate::pdf::DEFAULT_CLOSING_TITLE);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.default_lang.is_none());
        assert!(config.smtp.is_none());
        assert_eq!(config.page_style().header, crate::pdf::DEFAULT_HEADER);
    }

    #[test]
    fn test_smtp_defaults() {
        let config: Config = toml::from_str("[smtp]\nusername = \"a@b.c\"\nfrom = \"news@b.c\"").unwrap();
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host(), DEFAULT_SMTP_HOST);
        assert_eq!(smtp.port(), DEFAULT_SMTP_PORT);
        assert_eq!(smtp.from_address(), Some("news@b.c"));
    }

    #[test]
    fn test_configured_key_wins() {
        let config = Config {
            openai_api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_key(Provider::OpenAi).as_deref(), Some("from-file"));
    }

    #[test]
    fn test_provider_for_model() {
        assert_eq!(Provider::for_model("gemini-1.5-flash"), Provider::Gemini);
        assert_eq!(Provider::for_model("claude-sonnet-4-6"), Provider::Anthropic);
        assert_eq!(Provider::for_model("gpt-4o"), Provider::OpenAi);
    }
}
