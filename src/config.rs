use anyhow::Context;

pub struct Config {
    /// Address the server binds to
    pub bind_addr: String,

    /// Idle time before a browser session (and its login flag) expires
    pub session_idle_minutes: i64,
    pub allow_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        dotenv::dotenv().ok();

        let bind_addr = dotenv::var("BIND_ADDR").unwrap_or("0.0.0.0:8080".to_string());
        let session_idle_minutes = match dotenv::var("SESSION_IDLE_MINUTES") {
            Ok(raw) => raw.parse().context("SESSION_IDLE_MINUTES must be a number of minutes")?,
            Err(_) => 5,
        };
        let allow_origins = dotenv::var("ALLOW_ORIGINS")
            .unwrap_or("http://localhost:5173".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();
        let max_upload_bytes = match dotenv::var("MAX_UPLOAD_BYTES") {
            Ok(raw) => raw.parse().context("MAX_UPLOAD_BYTES must be a byte count")?,
            Err(_) => 5 * 1024 * 1024,
        };

        Ok(Config {
            bind_addr,
            session_idle_minutes,
            allow_origins,
            max_upload_bytes,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            session_idle_minutes: 5,
            allow_origins: vec!["http://localhost:5173".to_string()],
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}
