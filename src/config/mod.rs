use rust_decimal::Decimal;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Quote provider
    pub quote_api_base: Option<String>,
    pub quote_timeout_secs: u64,
    pub quote_cache_ttl_secs: u64,

    // Trading
    pub starting_balance: Decimal,
    pub execute_max_retries: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            quote_api_base: env::var("QUOTE_API_BASE").ok(),
            quote_timeout_secs: env::var("QUOTE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
            quote_cache_ttl_secs: env::var("QUOTE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),

            starting_balance: env::var("STARTING_BALANCE")
                .unwrap_or_else(|_| "100000".into())
                .parse()
                .unwrap_or(Decimal::from(100_000)),
            execute_max_retries: env::var("EXECUTE_MAX_RETRIES")
                .unwrap_or_else(|_| "3".into())
                .parse()
                .unwrap_or(3),
        })
    }
}
