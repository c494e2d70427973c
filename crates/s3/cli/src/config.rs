//! Configuration for the s3 command line

use s3_coordinator::MembershipMode;
use s3_governance::GovernanceConfig;
use s3_types::RobotId;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Config {
    /// Consent procedure settings shared by every agent
    #[serde(default)]
    pub governance: GovernanceConfig,

    /// Network membership
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network membership configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Robots that get a governance agent
    #[serde(default = "default_membership")]
    pub membership: Vec<RobotId>,

    /// How impact-scope ids without an agent are treated
    #[serde(default)]
    pub membership_mode: MembershipMode,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            membership: default_membership(),
            membership_mode: MembershipMode::Lenient,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_membership() -> Vec<RobotId> {
    (1..=5).map(|i| RobotId::new(format!("robot_{i}"))).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl S3Config {
    /// Load configuration: defaults, then the optional file, then `S3_`
    /// environment variables (`S3_GOVERNANCE__FULL_TIMEOUT_MS=1000`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&S3Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("S3")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
