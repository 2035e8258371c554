//! Configuration data types.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Status API listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Polling settings
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Global configuration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{}', expected json or pretty", other)),
        }
    }
}

/// Status API listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Full socket address of the listener.
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Poll cycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Time between poll cycles
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Hard per-probe timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Environment keys starting with this prefix are monitored targets
    #[serde(default = "default_endpoint_prefix")]
    pub endpoint_prefix: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: default_timeout(),
            endpoint_prefix: default_endpoint_prefix(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

fn default_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_timeout() -> Duration {
    Duration::from_millis(8000)
}

fn default_endpoint_prefix() -> String {
    "api_endpoint".to_string()
}

/// Custom serde module for humantime durations.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.global.log_level, "info");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.monitor.interval, Duration::from_secs(60));
        assert_eq!(config.monitor.timeout, Duration::from_millis(8000));
        assert_eq!(config.monitor.endpoint_prefix, "api_endpoint");
    }

    #[test]
    fn test_monitor_durations_serde() {
        let monitor: MonitorConfig = serde_yaml::from_str("interval: 5m\ntimeout: 2s").unwrap();
        assert_eq!(monitor.interval, Duration::from_secs(300));
        assert_eq!(monitor.timeout, Duration::from_secs(2));
        assert_eq!(monitor.endpoint_prefix, "api_endpoint");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_server_address() {
        let server = ServerConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
        };
        assert_eq!(server.address(), "127.0.0.1:8080".parse().unwrap());
    }
}
