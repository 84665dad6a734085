use std::env;

/// Configuração do serviço, lida do ambiente (e do `.env`, via dotenv).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub bcrypt_cost: u32,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests never touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| format!("PORT must be a valid port number, got {:?}: {}", raw, e))?,
            None => 8080,
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => {
                let cost = raw
                    .parse::<u32>()
                    .map_err(|e| format!("BCRYPT_COST must be a number, got {:?}: {}", raw, e))?;
                if !(4..=31).contains(&cost) {
                    return Err(format!("BCRYPT_COST must be between 4 and 31, got {}", cost));
                }
                cost
            }
            None => bcrypt::DEFAULT_COST,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            host,
            port,
            database_url,
            bcrypt_cost,
            cors_allowed_origins,
        })
    }
}
