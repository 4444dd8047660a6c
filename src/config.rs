use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mailchimp_api_key: String,
    pub mailchimp_base_url: String,
    pub mailchimp_timeout_secs: u64,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mailchimp_api_key = std::env::var("MAILCHIMP_API_KEY")
            .map_err(|_| anyhow::anyhow!("MAILCHIMP_API_KEY environment variable required"))
            .and_then(|key| {
                if key.trim().is_empty() {
                    anyhow::bail!("MAILCHIMP_API_KEY cannot be empty");
                }
                Ok(key)
            })?;

        let mailchimp_base_url = match std::env::var("MAILCHIMP_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
        {
            Some(url) => validate_http_url("MAILCHIMP_BASE_URL", url)?,
            None => default_base_url(&mailchimp_api_key)?,
        };

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            mailchimp_api_key,
            mailchimp_base_url,
            mailchimp_timeout_secs: std::env::var("MAILCHIMP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAILCHIMP_TIMEOUT_SECS must be a whole number"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a whole number"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::debug!("Database URL: {}", redacted_url(&config.database_url));
        tracing::debug!("MailChimp Base URL: {}", config.mailchimp_base_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Derives the REST root from the datacenter suffix of an API key (`<secret>-us6`).
pub fn default_base_url(api_key: &str) -> anyhow::Result<String> {
    let datacenter = api_key
        .rsplit_once('-')
        .map(|(_, dc)| dc.trim())
        .filter(|dc| !dc.is_empty() && dc.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "MAILCHIMP_API_KEY has no datacenter suffix; set MAILCHIMP_BASE_URL explicitly"
            )
        })?;

    Ok(format!("https://{}.api.mailchimp.com/3.0", datacenter))
}

/// Drops the password from a connection URL before it is logged.
fn redacted_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() && parsed.set_password(Some("***")).is_err() {
                return "<unprintable>".to_string();
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}

fn validate_http_url(name: &str, url: String) -> anyhow::Result<String> {
    let parsed =
        url::Url::parse(&url).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}
