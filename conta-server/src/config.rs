//! Environment-driven server configuration.

/// Outbound webhook endpoints for the automation tool.
///
/// Unconfigured endpoints reject their trigger with a 500, mirroring the
/// upstream behavior when an automation URL is absent.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    /// Accounting-process trigger (`MAKE_WEBHOOK_ACCOUNTING_URL`).
    pub accounting_url: Option<String>,
    /// Expense-upload trigger (`MAKE_WEBHOOK_GASTOS_URL`).
    pub gastos_url: Option<String>,
    /// Income-upload trigger (`MAKE_WEBHOOK_INGRESOS_URL`).
    pub ingresos_url: Option<String>,
    /// Drive file-forwarding webhook (`DRIVE_WEBHOOK_URL`).
    pub drive_url: Option<String>,
}

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Postgres connection string; the server runs on the in-memory
    /// store when absent.
    pub database_url: Option<String>,
    pub webhooks: WebhookConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: None,
            webhooks: WebhookConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from environment variables, with defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("CONTA_HOST").unwrap_or(defaults.host),
            port: std::env::var("CONTA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").ok(),
            webhooks: WebhookConfig {
                accounting_url: std::env::var("MAKE_WEBHOOK_ACCOUNTING_URL").ok(),
                gastos_url: std::env::var("MAKE_WEBHOOK_GASTOS_URL").ok(),
                ingresos_url: std::env::var("MAKE_WEBHOOK_INGRESOS_URL").ok(),
                drive_url: std::env::var("DRIVE_WEBHOOK_URL").ok(),
            },
        }
    }
}
