use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Process configuration. Precedence: environment > config file > defaults.
/// Environment keys use the `BIDEPASS_SECTION_KEY` shape, e.g.
/// `BIDEPASS_DATABASE_HOST` or `BIDEPASS_LOG_LEVEL`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub nats: NatsConfig,
    pub push: PushConfig,
    pub telemetry: TelemetryConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Opaque credential blob for the external notification service.
    pub credentials: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub sink: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            user: "transit".to_string(),
            password: String::new(),
            dbname: "bidepass".to_string(),
            sslmode: "disable".to_string(),
        }
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        NatsConfig {
            url: "nats://localhost:4222".to_string(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig {
            credentials: String::new(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig { sink: None }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            nats: NatsConfig::default(),
            push: PushConfig::default(),
            telemetry: TelemetryConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn dsn(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.dbname, self.sslmode
        )
    }
}

impl Config {
    /// Loads `config.toml` from the working directory when present, then
    /// applies `BIDEPASS_*` environment overrides.
    pub fn load() -> Result<Config, Box<dyn std::error::Error + Sync + Send>> {
        let mut config = match Path::new("config.toml").exists() {
            true => {
                let raw = std::fs::read_to_string("config.toml")?;
                toml::from_str(&raw)?
            }
            false => Config::default(),
        };

        let env: HashMap<String, String> = std::env::vars().collect();
        config.apply_env(&env)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_env(
        &mut self,
        env: &HashMap<String, String>,
    ) -> Result<(), Box<dyn std::error::Error + Sync + Send>> {
        if let Some(v) = env.get("BIDEPASS_DATABASE_HOST") {
            self.database.host = v.clone();
        }
        if let Some(v) = env.get("BIDEPASS_DATABASE_PORT") {
            self.database.port = v.parse()?;
        }
        if let Some(v) = env.get("BIDEPASS_DATABASE_USER") {
            self.database.user = v.clone();
        }
        if let Some(v) = env.get("BIDEPASS_DATABASE_PASSWORD") {
            self.database.password = v.clone();
        }
        if let Some(v) = env.get("BIDEPASS_DATABASE_DBNAME") {
            self.database.dbname = v.clone();
        }
        if let Some(v) = env.get("BIDEPASS_DATABASE_SSLMODE") {
            self.database.sslmode = v.clone();
        }
        if let Some(v) = env.get("BIDEPASS_NATS_URL") {
            self.nats.url = v.clone();
        }
        if let Some(v) = env.get("BIDEPASS_PUSH_CREDENTIALS") {
            self.push.credentials = v.clone();
        }
        if let Some(v) = env.get("BIDEPASS_TELEMETRY_SINK") {
            self.telemetry.sink = Some(v.clone());
        }
        if let Some(v) = env.get("BIDEPASS_LOG_LEVEL") {
            self.log.level = v.clone();
        }
        if let Some(v) = env.get("BIDEPASS_LOG_FORMAT") {
            self.log.format = v.clone();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error + Sync + Send>> {
        let mut problems: Vec<String> = Vec::new();

        if self.database.host.is_empty() {
            problems.push("database.host is required".to_string());
        }
        if self.database.port == 0 {
            problems.push("database.port must be 1-65535".to_string());
        }
        if self.database.user.is_empty() {
            problems.push("database.user is required".to_string());
        }
        if self.database.dbname.is_empty() {
            problems.push("database.dbname is required".to_string());
        }
        if self.nats.url.is_empty() {
            problems.push("nats.url is required".to_string());
        }
        if !matches!(self.log.level.as_str(), "debug" | "info" | "warn" | "error") {
            problems.push(format!("log.level must be one of debug/info/warn/error, got {}", self.log.level));
        }
        if !matches!(self.log.format.as_str(), "json" | "text") {
            problems.push(format!("log.format must be json or text, got {}", self.log.format));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(format!("config validation failed:\n  - {}", problems.join("\n  - ")).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, "text");
    }

    #[test]
    fn test_dsn_assembly() {
        let config = Config::default();
        assert_eq!(
            config.database.dsn(),
            "postgres://transit:@localhost:5432/bidepass?sslmode=disable"
        );
    }

    #[test]
    fn test_env_overrides_defaults() {
        let mut config = Config::default();
        let mut env = HashMap::new();
        env.insert("BIDEPASS_DATABASE_HOST".to_string(), "db.internal".to_string());
        env.insert("BIDEPASS_DATABASE_PORT".to_string(), "6432".to_string());
        env.insert("BIDEPASS_LOG_FORMAT".to_string(), "json".to_string());
        config.apply_env(&env).unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6432);
        assert_eq!(config.log.format, "json");
        // untouched keys keep their defaults
        assert_eq!(config.database.dbname, "bidepass");
    }

    #[test]
    fn test_file_values_survive_without_env() {
        let mut config: Config =
            toml::from_str("[nats]\nurl = \"nats://bus:4222\"\n").unwrap();
        config.apply_env(&HashMap::new()).unwrap();
        assert_eq!(config.nats.url, "nats://bus:4222");
        assert_eq!(config.database.host, "localhost");
    }

    #[test]
    fn test_validate_rejects_bad_level() {
        let mut config = Config::default();
        config.log.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_nats_url() {
        let mut config = Config::default();
        config.nats.url = String::new();
        assert!(config.validate().is_err());
    }
}
