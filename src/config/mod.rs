// Configuration module entry point
// Layers defaults, an optional config file and the environment into `Config`

mod state;
mod types;

use std::net::{IpAddr, SocketAddr};

pub use state::AppState;
pub use types::{Config, CorsConfig};

/// Port used when `PORT` is unset or empty
pub const DEFAULT_PORT: u16 = 8080;

/// Keys that hold comma-separated lists when set through `POINTS_*`
const ENV_LIST_KEYS: [&str; 4] = [
    "cors.allowed_origins",
    "cors.allowed_methods",
    "cors.allowed_headers",
    "dataset.paths",
];

impl Config {
    /// Load configuration from `config.toml` (optional), `POINTS_*` variables
    /// and the bare `PORT` variable
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self::load_from("config", env)
    }

    /// Load configuration from specified file path (without extension) and
    /// the given environment. `PORT` wins over every other source when it
    /// holds a port number.
    pub fn load_from(
        config_path: &str,
        env: ::config::Map<String, String>,
    ) -> Result<Self, ::config::ConfigError> {
        let port = parse_port(env.get("PORT").map(String::as_str))?;

        let environment = ENV_LIST_KEYS.into_iter().fold(
            ::config::Environment::with_prefix("POINTS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
            |environment, key| environment.with_list_parse_key(key),
        );

        let mut builder = ::config::Config::builder()
            .add_source(::config::File::with_name(config_path).required(false))
            .add_source(environment.source(Some(env)))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.shutdown_grace_period", 5)?;

        if let Some(port) = port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|e| format!("Invalid address '{}': {e}", self.server.host))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

/// Interpret the raw `PORT` value. Unset, empty and blank values mean
/// "not provided".
pub fn parse_port(raw: Option<&str>) -> Result<Option<u16>, ::config::ConfigError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<u16>().map(Some).map_err(|e| {
        ::config::ConfigError::Message(format!(
            "PORT must be a decimal port number, got '{raw}': {e}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_FILE: &str = "this-config-file-does-not-exist";

    fn env(vars: &[(&str, &str)]) -> ::config::Map<String, String> {
        vars.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_port_unset_and_empty() {
        assert_eq!(parse_port(None).unwrap(), None);
        assert_eq!(parse_port(Some("")).unwrap(), None);
        assert_eq!(parse_port(Some("   ")).unwrap(), None);
    }

    #[test]
    fn test_parse_port_values() {
        assert_eq!(parse_port(Some("9090")).unwrap(), Some(9090));
        assert_eq!(parse_port(Some(" 3000 ")).unwrap(), Some(3000));
        assert!(parse_port(Some("http")).is_err());
        assert!(parse_port(Some("70000")).is_err());
        assert!(parse_port(Some("-1")).is_err());
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::load_from(MISSING_FILE, env(&[])).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, DEFAULT_PORT);
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.performance.keep_alive);
        assert_eq!(cfg.cors, CorsConfig::default());
        assert_eq!(
            cfg.dataset.paths,
            vec!["conversions.json", "../public/data/conversions.json"]
        );
    }

    #[test]
    fn test_empty_port_falls_back_to_default() {
        let cfg = Config::load_from(MISSING_FILE, env(&[("PORT", "")])).unwrap();
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn test_port_override() {
        let cfg = Config::load_from(MISSING_FILE, env(&[("PORT", "9090")])).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "0.0.0.0:9090".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(Config::load_from(MISSING_FILE, env(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_config_file_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 7000

[cors]
allowed_origins = ["https://staging.points-converter.com"]

[dataset]
paths = ["/srv/data/conversions.json"]
"#,
        )
        .unwrap();
        let stem = dir.path().join("config");

        let cfg = Config::load_from(stem.to_str().unwrap(), env(&[])).unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(
            cfg.cors.allowed_origins,
            vec!["https://staging.points-converter.com"]
        );
        // Fields missing from the file keep their defaults
        assert_eq!(cfg.cors.allowed_methods.len(), 5);
        assert_eq!(cfg.dataset.paths, vec!["/srv/data/conversions.json"]);

        // PORT still wins over the file
        let cfg = Config::load_from(stem.to_str().unwrap(), env(&[("PORT", "7100")])).unwrap();
        assert_eq!(cfg.server.port, 7100);
    }

    #[test]
    fn test_invalid_host() {
        let mut cfg = Config::load_from(MISSING_FILE, env(&[])).unwrap();
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }

    #[test]
    fn test_env_layer() {
        let cfg = Config::load_from(
            MISSING_FILE,
            env(&[
                ("POINTS_SERVER__HOST", "127.0.0.1"),
                ("POINTS_SERVER__PORT", "7200"),
                ("POINTS_PERFORMANCE__KEEP_ALIVE", "false"),
                ("POINTS_PERFORMANCE__MAX_CONNECTIONS", "64"),
                (
                    "POINTS_CORS__ALLOWED_ORIGINS",
                    "https://staging.points-converter.com,http://localhost:3000",
                ),
                ("POINTS_CORS__ALLOWED_METHODS", "GET"),
                ("POINTS_DATASET__PATHS", "/srv/data/conversions.json"),
                ("UNRELATED", "ignored"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 7200);
        assert!(!cfg.performance.keep_alive);
        assert_eq!(cfg.performance.max_connections, Some(64));
        assert_eq!(
            cfg.cors.allowed_origins,
            vec![
                "https://staging.points-converter.com",
                "http://localhost:3000"
            ]
        );
        assert_eq!(cfg.cors.allowed_methods, vec!["GET"]);
        assert_eq!(cfg.cors.allowed_headers.len(), 4);
        assert_eq!(cfg.dataset.paths, vec!["/srv/data/conversions.json"]);
    }

    #[test]
    fn test_port_wins_over_env_layer() {
        let cfg = Config::load_from(
            MISSING_FILE,
            env(&[("POINTS_SERVER__PORT", "7200"), ("PORT", "7300")]),
        )
        .unwrap();
        assert_eq!(cfg.server.port, 7300);
    }
}
