//! Client configuration resolved from the environment.

/// Base URLs of the two authorities.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub inventory_url: String,
    pub invoicing_url: String,
}

impl ClientConfig {
    /// Read `KORP_INVENTORY_URL` / `KORP_INVOICING_URL`, falling back to the
    /// local development ports.
    pub fn from_env() -> Self {
        Self {
            inventory_url: env_or("KORP_INVENTORY_URL", "http://localhost:8081"),
            invoicing_url: env_or("KORP_INVOICING_URL", "http://localhost:8082"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        tracing::debug!("{key} not set; using {default}");
        default.to_string()
    })
}
