use crate::error::{AppError, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseConfig {
    /// The dataset is externally owned and static, so it is always opened
    /// read-only. A missing file fails at connect time instead of being
    /// created empty.
    pub fn connection_string(&self) -> String {
        format!("sqlite://{}?mode=ro", self.path)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_server_port", deserialize_with = "deserialize_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

/// Custom deserializer that handles port as both number and string
///
/// Accepts:
/// - `port: 8080` (number)
/// - `port: "8080"` (string that parses to number)
/// - `port: ${SERVER_PORT}` (env var substituted to either)
fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        String(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(n) => Ok(n),
        PortValue::String(s) => s
            .parse::<u16>()
            .map_err(|_| serde::de::Error::custom(format!("Invalid port number: '{}'", s))),
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        // Substitute environment variables
        let expanded = expand_env_vars(&content)?;

        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Checks for:
    /// - Unexpanded environment variables
    /// - Non-empty required fields
    /// - Valid port and connection bounds
    fn validate(&self) -> Result<()> {
        let fields_to_check = [
            ("DATABASE_PATH", &self.database.path),
            ("SERVER_HOST", &self.server.host),
        ];

        for (field_name, value) in &fields_to_check {
            if value.contains("${") {
                return Err(AppError::Config(format!(
                    "{} environment variable is not set. \
                     Please set it or create a .env file. \
                     See .env.example for required variables.",
                    field_name
                )));
            }
        }

        if self.database.path.is_empty() {
            return Err(AppError::Config(
                "Database path cannot be empty".to_string(),
            ));
        }

        if self.server.host.is_empty() {
            return Err(AppError::Config("Server host cannot be empty".to_string()));
        }

        // u16 max is 65535, so no upper bound check needed
        if self.server.port == 0 {
            return Err(AppError::Config("Server port cannot be 0".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(AppError::Config(
                "Database max_connections must be at least 1".to_string(),
            ));
        }

        if self.database.max_connections > 100 {
            return Err(AppError::Config(format!(
                "Database max_connections {} seems too high, maximum recommended is 100",
                self.database.max_connections
            )));
        }

        Ok(())
    }
}

fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}").unwrap();

    let mut missing_vars = Vec::new();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(&cap[0], &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        return Err(AppError::Config(format!(
            "Missing required environment variable{}: {}\n\n\
             To fix this:\n\
             1. Create a .env file in the project root (copy .env.example)\n\
             2. Set the missing variable{}: export {}=<value>\n\
             3. Or set {} in your environment before running",
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars.join(", "),
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars[0],
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_port_deserialize_from_number() {
        let yaml = "port: 8080";
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_port_deserialize_from_string() {
        let yaml = r#"port: "8080""#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_port_deserialize_invalid_string() {
        let yaml = r#"port: "not_a_number""#;
        let result: std::result::Result<ServerConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Invalid port number") || err_msg.contains("not_a_number"));
    }

    #[test]
    fn test_defaults_applied() {
        let yaml = "database:\n  path: data/climate.sqlite\nserver: {}\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_read_only_connection_string() {
        let db = DatabaseConfig {
            path: "data/climate.sqlite".to_string(),
            max_connections: 5,
        };
        assert_eq!(
            db.connection_string(),
            "sqlite://data/climate.sqlite?mode=ro"
        );
    }

    #[test]
    fn test_load_expands_env_vars() {
        std::env::set_var("TEST_CLIMATE_DB_PATH", "data/climate.sqlite");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database:\n  path: ${{TEST_CLIMATE_DB_PATH}}\nserver:\n  port: \"9090\""
        )
        .unwrap();

        let config = Config::load(file.path()).expect("load should succeed");
        assert_eq!(config.database.path, "data/climate.sqlite");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_load_reports_missing_env_var() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database:\n  path: ${{TEST_CLIMATE_UNSET_VAR}}\nserver: {{}}"
        )
        .unwrap();

        let err = Config::load(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("TEST_CLIMATE_UNSET_VAR"), "got: {}", msg);
        assert!(msg.contains(".env.example") || msg.contains(".env"), "got: {}", msg);
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let yaml = "database:\n  path: \"\"\nserver: {}\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("path cannot be empty"));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let yaml = "database:\n  path: data/climate.sqlite\nserver:\n  port: 0\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port cannot be 0"));
    }

    #[test]
    fn test_validate_rejects_excessive_connections() {
        let yaml = "database:\n  path: data/climate.sqlite\n  max_connections: 500\nserver: {}\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }
}
