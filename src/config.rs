use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail_from: String,
    pub test_mail_recipient: String,
    pub quotes_api_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "campus-api".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "campus-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let mail_from =
            std::env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@campus.local".into());
        let test_mail_recipient =
            std::env::var("TEST_MAIL_RECIPIENT").unwrap_or_else(|_| "nas2dev@gmail.com".into());
        let quotes_api_url = std::env::var("QUOTES_API_URL")
            .unwrap_or_else(|_| "https://zenquotes.io/api/random".into());
        Ok(Self {
            database_url,
            jwt,
            mail_from,
            test_mail_recipient,
            quotes_api_url,
        })
    }
}
