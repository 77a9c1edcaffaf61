use std::env;

use super::{ServerConfig, tls_from_paths};
use crate::core::realtime::{DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;

/// Read a variable, treating empty values as unset.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load configuration from environment variables, falling back to defaults
pub(crate) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match var("PORT") {
        Some(port) => port
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT value '{port}': {e}"))?,
        None => DEFAULT_PORT,
    };

    let tls = tls_from_paths(var("TLS_CERT_PATH"), var("TLS_KEY_PATH"))?;

    Ok(ServerConfig {
        host,
        port,
        tls,
        openai_api_key: var("OPENAI_API_KEY"),
        realtime_url: var("OPENAI_REALTIME_URL").unwrap_or_else(|| OPENAI_REALTIME_URL.to_string()),
        realtime_model: var("OPENAI_REALTIME_MODEL")
            .unwrap_or_else(|| DEFAULT_REALTIME_MODEL.to_string()),
        response_instructions: var("RESPONSE_INSTRUCTIONS"),
    })
}
