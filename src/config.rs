//! Environment-derived service configuration

use std::path::PathBuf;

use anyhow::Context;

/// Everything the service reads from the environment, gathered once at
/// startup. SMTP and NATS are optional collaborators; leaving them
/// unconfigured disables emails and staff push respectively.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub cors_allowed_origin: Option<String>,
    pub nats_url: Option<String>,
    pub staff_notify_subject: String,
    pub smtp: Option<SmtpConfig>,
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{}", port));

        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) => {
                let port = std::env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse::<u16>()
                    .context("SMTP_PORT is not a valid port number")?;
                Some(SmtpConfig {
                    host,
                    port,
                    username: std::env::var("SMTP_USERNAME").context("SMTP_USERNAME is not set")?,
                    password: std::env::var("SMTP_PASSWORD").context("SMTP_PASSWORD is not set")?,
                    from: std::env::var("SMTP_FROM").context("SMTP_FROM is not set")?,
                })
            }
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN").ok(),
            nats_url: std::env::var("NATS_URL").ok(),
            staff_notify_subject: std::env::var("STAFF_NOTIFY_SUBJECT")
                .unwrap_or_else(|_| "bookhaven.staff.notifications".to_string()),
            smtp,
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()).into(),
        })
    }
}
