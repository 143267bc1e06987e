use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;

use porteiro_core::notification_types::NotificationReceiver;

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    /// Upper bound for a single backing-store call, in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    /// Directory holding the persisted session blob.
    pub state_dir: String,
    /// Key under which the blob is stored.
    pub state_key: String,
    /// Lifetime of a persisted session before restore requires a fresh login.
    pub ttl_minutes: i64,
    /// Signing secret for the persisted session envelope.
    pub secret: SecretString,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub debug: bool,
    pub store: StoreSettings,
    pub session: SessionSettings,
    pub auth: AuthSettings,
    #[serde(default = "default_receivers")]
    pub notifications: Vec<NotificationReceiver>,
}

fn default_receivers() -> Vec<NotificationReceiver> {
    vec![NotificationReceiver::Log]
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debug: false,
            store: StoreSettings { timeout_secs: 5 },
            session: SessionSettings {
                state_dir: ".porteiro".to_string(),
                state_key: "session".to_string(),
                ttl_minutes: 8 * 60,
                secret: SecretString::from("insecure-dev-secret".to_string()),
            },
            auth: AuthSettings {
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            notifications: default_receivers(),
        }
    }
}

impl Settings {
    pub fn get_environment() -> Environment {
        Environment::default()
            .prefix("PORTEIRO")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("PORTEIRO_RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("debug", false)?
            .set_default("store.timeout_secs", 5u64)?
            .set_default("session.state_dir", ".porteiro")?
            .set_default("session.state_key", "session")?
            .set_default("session.ttl_minutes", 8 * 60i64)?
            .set_default("session.secret", "insecure-dev-secret")?
            .set_default("auth.bcrypt_cost", u64::from(bcrypt::DEFAULT_COST))?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Self::get_environment());

        builder.build()?.try_deserialize()
    }
}
