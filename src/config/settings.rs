use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for both the WebSocket server and the hub.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub hub: HubSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the server will bind to.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration settings for the hub.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HubSettings {
    /// New sockets beyond this many live connections are turned away.
    pub max_connections: usize,
    /// Seconds between heartbeats; `0` turns the heartbeat off.
    pub heartbeat_interval_secs: u64,
    /// Frames queued per connection before it is dropped as too slow.
    pub send_queue_capacity: usize,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub hub: Option<PartialHubSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialHubSettings {
    pub max_connections: Option<usize>,
    pub heartbeat_interval_secs: Option<u64>,
    pub send_queue_capacity: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            hub: HubSettings {
                max_connections: 1000,
                heartbeat_interval_secs: 30,
                send_queue_capacity: 256,
            },
        }
    }
}

impl PartialSettings {
    /// Fill every missing value from the defaults.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();
        let server = self.server.unwrap_or_default();
        let hub = self.hub.unwrap_or_default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(default.server.host),
                port: server.port.unwrap_or(default.server.port),
            },
            hub: HubSettings {
                max_connections: hub.max_connections.unwrap_or(default.hub.max_connections),
                heartbeat_interval_secs: hub
                    .heartbeat_interval_secs
                    .unwrap_or(default.hub.heartbeat_interval_secs),
                send_queue_capacity: hub
                    .send_queue_capacity
                    .unwrap_or(default.hub.send_queue_capacity),
            },
        }
    }
}
