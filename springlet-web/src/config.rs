//! Startup configuration, read once before anything else. Values come from an optional
//! `springlet.*` file (any format the `config` crate supports) overlaid with
//! `SPRINGLET_`-prefixed environment variables; missing values fall back to opinionated
//! defaults - except the scan namespace, which has no sensible default and is fatal when absent.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Name of the default config file, without extension.
pub const CONFIG_FILE: &str = "springlet";

const CONFIG_ENV_PREFIX: &str = "SPRINGLET";

/// Hosting server configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Address on which to listen.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Context prefix under which the application is hosted; stripped from request paths before
    /// route matching.
    #[serde(default)]
    pub context_path: String,
}

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            context_path: String::new(),
        }
    }
}

/// Framework configuration driving the startup phases.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct FrameworkConfig {
    /// Root namespace to scan for components. Required.
    pub scan_package: String,

    pub server: ServerConfig,

    /// Fail startup on unresolved injectable fields instead of leaving them empty.
    pub strict_wiring: bool,

    /// Should a default tracing logger be installed in the scope of the application.
    pub install_tracing_logger: bool,
}

impl FrameworkConfig {
    /// Creates a config with defaults for everything but the required scan namespace.
    pub fn with_scan_package<T: Into<String>>(scan_package: T) -> Self {
        Self {
            scan_package: scan_package.into(),
            server: Default::default(),
            strict_wiring: false,
            install_tracing_logger: true,
        }
    }

    /// Loads the configuration from the default file and environment sources.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX).separator("__"))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalFrameworkConfig>())
            .and_then(OptionalFrameworkConfig::into_config)
    }
}

#[derive(Deserialize)]
struct OptionalFrameworkConfig {
    #[serde(alias = "scanPackage", alias = "scanpackage")]
    scan_package: Option<String>,
    server: Option<ServerConfig>,
    strict_wiring: Option<bool>,
    install_tracing_logger: Option<bool>,
}

impl OptionalFrameworkConfig {
    fn into_config(self) -> Result<FrameworkConfig, ConfigError> {
        let scan_package = self
            .scan_package
            .ok_or_else(|| ConfigError::NotFound("scanPackage".to_string()))?;

        let mut config = FrameworkConfig::with_scan_package(scan_package);
        if let Some(server) = self.server {
            config.server = server;
        }
        if let Some(strict_wiring) = self.strict_wiring {
            config.strict_wiring = strict_wiring;
        }
        if let Some(install_tracing_logger) = self.install_tracing_logger {
            config.install_tracing_logger = install_tracing_logger;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{FrameworkConfig, OptionalFrameworkConfig, ServerConfig};
    use config::ConfigError;

    #[test]
    fn should_default_everything_but_the_scan_namespace() {
        let config = FrameworkConfig::with_scan_package("demo");
        assert_eq!(config.scan_package, "demo");
        assert_eq!(config.server.listen_address, "0.0.0.0:8080");
        assert_eq!(config.server.context_path, "");
        assert!(!config.strict_wiring);
        assert!(config.install_tracing_logger);
    }

    #[test]
    fn should_fail_without_scan_namespace() {
        let optional = OptionalFrameworkConfig {
            scan_package: None,
            server: None,
            strict_wiring: None,
            install_tracing_logger: None,
        };

        assert!(matches!(
            optional.into_config().unwrap_err(),
            ConfigError::NotFound(..)
        ));
    }

    #[test]
    fn should_overlay_provided_values() {
        let optional = OptionalFrameworkConfig {
            scan_package: Some("demo".to_string()),
            server: Some(ServerConfig {
                listen_address: "127.0.0.1:9000".to_string(),
                context_path: "/app".to_string(),
            }),
            strict_wiring: Some(true),
            install_tracing_logger: Some(false),
        };

        let config = optional.into_config().unwrap();
        assert_eq!(config.server.listen_address, "127.0.0.1:9000");
        assert_eq!(config.server.context_path, "/app");
        assert!(config.strict_wiring);
        assert!(!config.install_tracing_logger);
    }
}
