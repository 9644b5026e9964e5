use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub orders: OrderRules,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default)]
    pub seed_demo_data: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Business rules for the order core.
#[derive(Debug, Deserialize, Clone)]
pub struct OrderRules {
    #[serde(default)]
    pub refund_policy: RefundPolicy,
}

/// Whether refunds demand a recorded payment first. `Unrestricted`
/// reproduces the legacy behavior where refund was a bare administrative
/// action with no state guard.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefundPolicy {
    #[default]
    RequirePaid,
    Unrestricted,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    256
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Environment overrides, e.g. MERCATO__SERVER__PORT=9000
            .add_source(config::Environment::with_prefix("MERCATO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
