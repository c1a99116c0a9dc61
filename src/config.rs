use std::env;

/// Process configuration, read from the environment once at startup and
/// shared immutably through `web::Data<Config>`.
///
/// The token-signing secret lives here so it is never compiled into the
/// binary; rotating it is a restart, not a rebuild.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub database_url: String,
    pub jwt_secret: String,
}

impl Config {
    /// HOST and PORT have sensible defaults; DATABASE_URL and JWT_SECRET
    /// do not, and startup fails without them.
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
        })
    }
}
