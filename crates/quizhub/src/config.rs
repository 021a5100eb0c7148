//! Process configuration, read once from the environment at startup.

/// Server configuration. Immutable after [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the listener binds to. From `PORT`; a bare `:8080`-style
    /// value is accepted and normalized to all interfaces.
    pub listen_addr: String,

    /// Deployment environment label. From `ENVIRONMENT`; only logged.
    pub environment: String,
}

impl Config {
    /// Reads `PORT` and `ENVIRONMENT`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::var("PORT").ok(),
            std::env::var("ENVIRONMENT").ok(),
        )
    }

    fn resolve(port: Option<String>, environment: Option<String>) -> Self {
        let listen_addr = match port.filter(|p| !p.is_empty()) {
            Some(addr) if addr.starts_with(':') => format!("0.0.0.0{addr}"),
            Some(addr) => addr,
            None => "0.0.0.0:8080".to_string(),
        };
        Self {
            listen_addr,
            environment: environment
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "dev".to_string()),
        }
    }
}
