//! Command-line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use url::Url;

use crate::error::ConfigError;
use crate::logging::LogFormat;
use crate::target::direct::SpeakerAddress;

/// How speakers are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// Through a node-sonos-http-api style HTTP gateway
    #[default]
    Gateway,
    /// UPnP control requests straight to the configured speakers
    Direct,
}

/// Play music on Sonos speakers from NFC tags
#[derive(Parser, Debug, Clone)]
#[command(name = "sonos-nfc")]
#[command(version, about)]
pub struct Args {
    /// How to reach the speakers
    #[arg(long, value_enum, default_value_t = Backend::Gateway, env = "SONOS_NFC_BACKEND")]
    pub backend: Backend,

    /// Base URL of the HTTP gateway
    #[arg(long, default_value = "http://localhost:5005", env = "SONOS_NFC_GATEWAY_URL")]
    pub gateway_url: String,

    /// Room selected at startup
    #[arg(short, long, default_value = "Living Room", env = "SONOS_NFC_ROOM")]
    pub room: String,

    /// Reader bridge device, FIFO or `-` for stdin
    #[arg(long, default_value = "-", env = "SONOS_NFC_READER")]
    pub reader: PathBuf,

    /// Speaker for direct control as ROOM=HOST[:PORT] (repeatable)
    #[arg(long = "speaker", env = "SONOS_NFC_SPEAKERS", value_delimiter = ',')]
    pub speakers: Vec<String>,

    /// Send anonymous usage statistics
    #[arg(long, env = "SONOS_NFC_TELEMETRY")]
    pub telemetry: bool,

    /// Where usage statistics are posted
    #[arg(long, env = "SONOS_NFC_TELEMETRY_URL")]
    pub telemetry_url: Option<String>,

    /// Timeout for requests to speakers and the gateway, in seconds
    #[arg(long, default_value = "5", env = "SONOS_NFC_TIMEOUT")]
    pub timeout: u64,

    /// How long each poll waits for a tag, in milliseconds
    #[arg(long, default_value = "100", env = "SONOS_NFC_POLL_INTERVAL")]
    pub poll_interval: u64,

    /// Volume change for volume_up / volume_down commands
    #[arg(long, default_value = "5", env = "SONOS_NFC_VOLUME_STEP")]
    pub volume_step: u8,

    /// Skip the startup probe of the gateway
    #[arg(long, env = "SONOS_NFC_NO_CHECK")]
    pub no_check: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, env = "SONOS_NFC_LOG")]
    pub log_format: LogFormat,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room.trim().is_empty() {
            return Err(ConfigError::Value {
                field: "room",
                reason: "must not be empty".to_string(),
            });
        }

        if self.timeout == 0 {
            return Err(ConfigError::Value {
                field: "timeout",
                reason: "must be positive".to_string(),
            });
        }

        if self.poll_interval == 0 {
            return Err(ConfigError::Value {
                field: "poll-interval",
                reason: "must be positive".to_string(),
            });
        }

        if self.volume_step == 0 || self.volume_step > 100 {
            return Err(ConfigError::Value {
                field: "volume-step",
                reason: format!("{} is not between 1 and 100", self.volume_step),
            });
        }

        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(ConfigError::Value {
                    field: "log-level",
                    reason: format!(
                        "'{}' is not one of error, warn, info, debug, trace",
                        self.log_level
                    ),
                })
            }
        }

        if self.telemetry && self.telemetry_url.is_none() {
            return Err(ConfigError::Value {
                field: "telemetry-url",
                reason: "required when telemetry is enabled".to_string(),
            });
        }

        if self.backend == Backend::Direct && self.speakers.is_empty() {
            return Err(ConfigError::Value {
                field: "speaker",
                reason: "direct control needs at least one --speaker ROOM=HOST".to_string(),
            });
        }

        Ok(())
    }
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub gateway_url: Url,
    pub room: String,
    pub reader: PathBuf,
    pub speakers: Vec<SpeakerAddress>,
    /// `Some` when telemetry is enabled
    pub telemetry_url: Option<String>,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub volume_step: u8,
    pub check: bool,
    pub log_format: LogFormat,
    pub log_level: String,
}

impl Config {
    /// Parse and validate the process arguments and environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::try_from(Args::parse())
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        args.validate()?;

        let gateway_url = parse_gateway_url(&args.gateway_url)?;
        let speakers = args
            .speakers
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse())
            .collect::<Result<Vec<SpeakerAddress>, _>>()?;

        let telemetry_url = args.telemetry_url.filter(|_| args.telemetry);

        Ok(Self {
            backend: args.backend,
            gateway_url,
            room: args.room.trim().to_string(),
            reader: args.reader,
            speakers,
            telemetry_url,
            timeout: Duration::from_secs(args.timeout),
            poll_interval: Duration::from_millis(args.poll_interval),
            volume_step: args.volume_step,
            check: !args.no_check,
            log_format: args.log_format,
            log_level: args.log_level.to_lowercase(),
        })
    }
}

fn parse_gateway_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::GatewayUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["sonos-nfc"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::try_from(args(&[])).unwrap();
        assert_eq!(config.backend, Backend::Gateway);
        assert_eq!(config.gateway_url.as_str(), "http://localhost:5005/");
        assert_eq!(config.room, "Living Room");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.volume_step, 5);
        assert!(config.telemetry_url.is_none());
        assert!(config.check);
    }

    #[test]
    fn test_startup_check_can_be_disabled() {
        let config = Config::try_from(args(&["--no-check"])).unwrap();
        assert!(!config.check);
    }

    #[test]
    fn test_direct_backend_with_speakers() {
        let config = Config::try_from(args(&[
            "--backend",
            "direct",
            "--speaker",
            "Kitchen=10.0.0.2",
            "--speaker",
            "Office=10.0.0.3:1401",
            "--room",
            " Kitchen ",
        ]))
        .unwrap();
        assert_eq!(config.backend, Backend::Direct);
        assert_eq!(config.room, "Kitchen");
        assert_eq!(config.speakers.len(), 2);
        assert_eq!(config.speakers[1].port, 1401);
    }

    #[test]
    fn test_direct_backend_requires_speakers() {
        let err = Config::try_from(args(&["--backend", "direct"])).unwrap_err();
        assert!(matches!(err, ConfigError::Value { field: "speaker", .. }));
    }

    #[test]
    fn test_bad_speaker_rejected() {
        let err = Config::try_from(args(&["--speaker", "Kitchen"])).unwrap_err();
        assert!(matches!(err, ConfigError::Speaker(_)));
    }

    #[test]
    fn test_gateway_url_must_be_http() {
        let err = Config::try_from(args(&["--gateway-url", "ftp://nas/sonos"])).unwrap_err();
        assert!(matches!(err, ConfigError::GatewayUrl { .. }));

        let err = Config::try_from(args(&["--gateway-url", "not a url"])).unwrap_err();
        assert!(matches!(err, ConfigError::GatewayUrl { .. }));
    }

    #[test]
    fn test_telemetry_needs_url() {
        let err = Config::try_from(args(&["--telemetry"])).unwrap_err();
        assert!(matches!(err, ConfigError::Value { field: "telemetry-url", .. }));

        let config = Config::try_from(args(&["--telemetry-url", "http://stats.local/x"])).unwrap();
        assert!(config.telemetry_url.is_none());

        let config = Config::try_from(args(&["--telemetry", "--telemetry-url", "http://stats.local/x"])).unwrap();
        assert_eq!(config.telemetry_url.as_deref(), Some("http://stats.local/x"));
    }

    #[test]
    fn test_invalid_values() {
        for extra in [
            &["--timeout", "0"][..],
            &["--poll-interval", "0"][..],
            &["--volume-step", "0"][..],
            &["--volume-step", "101"][..],
            &["--log-level", "loud"][..],
            &["--room", "  "][..],
        ] {
            assert!(
                matches!(Config::try_from(args(extra)), Err(ConfigError::Value { .. })),
                "accepted {:?}",
                extra
            );
        }
    }
}
