use std::env;

use chrono::Duration;
use feast_common::{Money, Secret};
use feast_engine::{PaymentConfig, SettlementConfig};
use log::*;

const DEFAULT_FEAST_HOST: &str = "127.0.0.1";
const DEFAULT_FEAST_PORT: u16 = 8480;
const DEFAULT_COD_SURCHARGE_RUPEES: i64 = 10;
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NOTIFICATION_LOG_SIZE: usize = 500;
const DEFAULT_PENDING_REMINDER: Duration = Duration::minutes(15);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Gateway secret and COD surcharge, passed through to the payment verification adapter.
    pub payment: PaymentConfig,
    /// Commission and withholding rates for the settlement engine.
    pub settlement: SettlementConfig,
    pub notifications: NotificationConfig,
    /// How long an order may sit in `pending_seller` before the reminder worker nudges the seller.
    pub pending_reminder_after: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct NotificationConfig {
    /// HTTP endpoint of the transactional email provider. Unset means the email channel is skipped.
    pub email_api_url: Option<String>,
    pub email_api_token: Secret<String>,
    pub email_from: String,
    /// HTTP endpoint of the WhatsApp message provider. Unset means the WhatsApp channel is skipped.
    pub whatsapp_api_url: Option<String>,
    pub whatsapp_api_token: Secret<String>,
    /// Upper bound on a single delivery attempt, per channel.
    pub channel_timeout: std::time::Duration,
    /// Capacity of the in-memory record of recent notification attempts.
    pub event_log_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FEAST_HOST.to_string(),
            port: DEFAULT_FEAST_PORT,
            database_url: String::default(),
            payment: PaymentConfig {
                gateway_secret: Secret::default(),
                cod_surcharge: Money::from_rupees(DEFAULT_COD_SURCHARGE_RUPEES),
            },
            settlement: SettlementConfig::default(),
            notifications: NotificationConfig::default(),
            pending_reminder_after: DEFAULT_PENDING_REMINDER,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FEAST_HOST").ok().unwrap_or_else(|| DEFAULT_FEAST_HOST.into());
        let port = env::var("FEAST_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for FEAST_PORT. {e} Using the default, {DEFAULT_FEAST_PORT}, \
                         instead."
                    );
                    DEFAULT_FEAST_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FEAST_PORT);
        let database_url = env::var("FEAST_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ FEAST_DATABASE_URL is not set. Please set it to the URL for the order database.");
            String::default()
        });
        let gateway_secret = env::var("FEAST_GATEWAY_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ FEAST_GATEWAY_SECRET is not set. Payment proof verification will reject every online payment \
                 until it is configured."
            );
            String::default()
        });
        let cod_surcharge = env::var("FEAST_COD_SURCHARGE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for FEAST_COD_SURCHARGE. {e}"))
                    .ok()
            })
            .map(Money::from_rupees)
            .unwrap_or_else(|| Money::from_rupees(DEFAULT_COD_SURCHARGE_RUPEES));
        let payment = PaymentConfig { gateway_secret: Secret::new(gateway_secret), cod_surcharge };
        let settlement = settlement_config_from_env();
        let notifications = NotificationConfig::from_env_or_defaults();
        let pending_reminder_after = env::var("FEAST_PENDING_REMINDER_MINS")
            .map_err(|_| {
                info!(
                    "🪛️ FEAST_PENDING_REMINDER_MINS is not set. Using the default value of {} minutes.",
                    DEFAULT_PENDING_REMINDER.num_minutes()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::minutes)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for FEAST_PENDING_REMINDER_MINS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_PENDING_REMINDER);
        Self { host, port, database_url, payment, settlement, notifications, pending_reminder_after }
    }
}

fn settlement_config_from_env() -> SettlementConfig {
    let default = SettlementConfig::default();
    let rate = |var: &str, default: f64| {
        env::var(var)
            .ok()
            .and_then(|s| {
                s.parse::<f64>().map_err(|e| warn!("🪛️ Invalid configuration value for {var}. {e}")).ok()
            })
            .filter(|r| {
                let valid = (0.0..1.0).contains(r);
                if !valid {
                    warn!("🪛️ {var} must be a fraction in [0, 1). Using the default instead.");
                }
                valid
            })
            .unwrap_or(default)
    };
    SettlementConfig {
        fee_rate: rate("FEAST_PLATFORM_FEE_RATE", default.fee_rate),
        tcs_rate: rate("FEAST_TCS_RATE", default.tcs_rate),
        tds_rate: rate("FEAST_TDS_RATE", default.tds_rate),
    }
}

impl NotificationConfig {
    pub fn from_env_or_defaults() -> Self {
        let email_api_url = env::var("FEAST_EMAIL_API_URL").ok();
        if email_api_url.is_none() {
            info!("🪛️ FEAST_EMAIL_API_URL is not set. Order emails will not be sent.");
        }
        let email_api_token = Secret::new(env::var("FEAST_EMAIL_API_TOKEN").ok().unwrap_or_default());
        let email_from = env::var("FEAST_EMAIL_FROM").ok().unwrap_or_else(|| "orders@feast.example".to_string());
        let whatsapp_api_url = env::var("FEAST_WHATSAPP_API_URL").ok();
        if whatsapp_api_url.is_none() {
            info!("🪛️ FEAST_WHATSAPP_API_URL is not set. WhatsApp updates will not be sent.");
        }
        let whatsapp_api_token = Secret::new(env::var("FEAST_WHATSAPP_API_TOKEN").ok().unwrap_or_default());
        let channel_timeout = env::var("FEAST_NOTIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for FEAST_NOTIFY_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_SECS);
        Self {
            email_api_url,
            email_api_token,
            email_from,
            whatsapp_api_url,
            whatsapp_api_token,
            channel_timeout: std::time::Duration::from_secs(channel_timeout),
            event_log_size: DEFAULT_NOTIFICATION_LOG_SIZE,
        }
    }
}
