use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

/// SMTP relay settings for the contact-form dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub subject: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "Folio <no-reply@localhost>".to_string(),
            subject: "Thanks for reaching out".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    pub jwt_secret: String,
    /// Directory uploaded attachments are written to and served from.
    pub upload_dir: PathBuf,
    pub template_path: PathBuf,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
    /// Allowed CORS origin; unset means any origin.
    pub cors_origin: Option<String>,
    pub smtp: SmtpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:folio.sqlite".to_string(),
            loglevel: "info".to_string(),
            jwt_secret: "change-me".to_string(),
            upload_dir: PathBuf::from("public/uploads"),
            template_path: PathBuf::from("templates/contact.html"),
            max_upload_bytes: 10 * 1024 * 1024,
            request_timeout_secs: 30,
            cors_origin: None,
            smtp: SmtpConfig::default(),
        }
    }
}

impl Config {
    /// Layer `FOLIO_`-prefixed environment variables over the defaults.
    /// Nested SMTP fields use a double underscore: `FOLIO_SMTP__HOST`.
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("FOLIO_").split("__"))
            .extract()
    }
}

pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::from_env().expect("invalid configuration"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8000");
        assert!(cfg.max_upload_bytes > 0);
        assert!(cfg.cors_origin.is_none());
    }

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FOLIO_LISTEN_ADDR", "127.0.0.1:9000");
            jail.set_env("FOLIO_SMTP__HOST", "smtp.example.com");
            let cfg = Config::from_env().expect("config should parse");
            assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
            assert_eq!(cfg.smtp.host, "smtp.example.com");
            assert_eq!(cfg.database_url, "sqlite:folio.sqlite");
            Ok(())
        });
    }
}
