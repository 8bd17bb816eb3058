//! Handles settings for the application.
//!
//! Configuration is read from `settings.toml` (optional, the path can be
//! changed with `--config`) and overridden by `DUETTO__<SECTION>__<KEY>`
//! environment variables, e.g. `DUETTO__SERVER__PORT=8080`.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 3000
//! database = { sqlite = "duetto.db" }
//!
//! [engine]
//! settlement_mode = "equal_split"
//! invitation_ttl_days = 7
//! allowed_emails = ["alice@example.com", "bob@example.com"]
//!
//! [avatars]
//! dir = "avatars"
//! public_base_url = "/avatars"
//! ```

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use engine::SettlementMode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: None,
            port: 3000,
            database: Database::Sqlite("duetto.db".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Engine {
    pub settlement_mode: SettlementMode,
    pub invitation_ttl_days: i64,
    /// Empty: anyone may create a profile.
    pub allowed_emails: Vec<String>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            settlement_mode: SettlementMode::default(),
            invitation_ttl_days: engine::DEFAULT_TTL_DAYS,
            allowed_emails: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Avatars {
    pub dir: PathBuf,
    pub public_base_url: String,
}

impl Default for Avatars {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("avatars"),
            public_base_url: "/avatars".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub engine: Engine,
    pub avatars: Avatars,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("DUETTO")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("engine.allowed_emails")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = Settings::new("does-not-exist").unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.engine.settlement_mode, SettlementMode::EqualSplit);
        assert_eq!(settings.engine.invitation_ttl_days, 7);
        assert!(matches!(settings.server.database, Database::Sqlite(ref p) if p == "duetto.db"));
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080
database = "memory"

[engine]
settlement_mode = "per_expense_shared"
allowed_emails = ["alice@example.com"]
"#
        )
        .unwrap();

        let settings = Settings::new(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert!(matches!(settings.server.database, Database::Memory));
        assert_eq!(
            settings.engine.settlement_mode,
            SettlementMode::PerExpenseShared
        );
        assert_eq!(settings.engine.allowed_emails, vec!["alice@example.com"]);
        assert_eq!(settings.avatars.public_base_url, "/avatars");
    }
}
