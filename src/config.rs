use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub redis_url: Option<String>,
    pub public_base_url: String,
    pub preorder_ttl: Duration,
    pub toss: TossConfig,
}

#[derive(Debug, Clone)]
pub struct TossConfig {
    pub api_base: String,
    pub secret_key: String,
    pub client_key: Option<String>,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();
        let preorder_ttl = Duration::from_secs(secs_from_env("PREORDER_TTL_SECS", 15 * 60));

        let secret_key = env::var("TOSS_SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("TOSS_SECRET_KEY is not set"))?;
        let toss = TossConfig {
            api_base: env::var("TOSS_API_BASE")
                .unwrap_or_else(|_| "https://api.tosspayments.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            secret_key,
            client_key: env::var("TOSS_CLIENT_KEY").ok(),
            timeout: Duration::from_secs(secs_from_env("GATEWAY_TIMEOUT_SECS", 10)),
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            redis_url,
            public_base_url,
            preorder_ttl,
            toss,
        })
    }
}

fn secs_from_env(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
