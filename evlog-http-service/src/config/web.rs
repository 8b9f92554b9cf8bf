use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebServer {
    /// Хост (ip/dns) на котором весит сервер
    pub host: String,

    /// Порт на котором весит сервер
    pub port: u16,
}

impl Default for WebServer {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
