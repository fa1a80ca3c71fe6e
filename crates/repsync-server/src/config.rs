use serde::Deserialize;

/// Top-level server configuration, loaded from `repsync.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub limits: LimitsConfig,
    pub bots: BotFillConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            limits: LimitsConfig::default(),
            bots: BotFillConfig::default(),
        }
    }
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    /// Outbound message buffer per connection; full buffers are skipped
    /// during broadcast rather than awaited.
    pub player_message_buffer: usize,
    pub ws_rate_limit_per_sec: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            player_message_buffer: 256,
            ws_rate_limit_per_sec: 50.0,
        }
    }
}

/// Bot-fill policy for under-populated rooms.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotFillConfig {
    /// A lobby below this many participants gets a fill check scheduled.
    pub min_players: usize,
    /// Delay before the fill check re-reads the durable player count.
    pub fill_delay_ms: u64,
}

impl Default for BotFillConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            fill_delay_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Validate configuration, exiting on values the server cannot run with.
    pub fn validate(&self) {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(
                addr = %self.listen_addr,
                "listen_addr is not a valid socket address"
            );
            std::process::exit(1);
        }
        if self.limits.max_ws_connections == 0 {
            tracing::error!("limits.max_ws_connections must be > 0");
            std::process::exit(1);
        }
        if self.limits.player_message_buffer == 0 {
            tracing::error!("limits.player_message_buffer must be > 0");
            std::process::exit(1);
        }
        if self.limits.ws_rate_limit_per_sec <= 0.0 {
            tracing::error!("limits.ws_rate_limit_per_sec must be > 0");
            std::process::exit(1);
        }
        if self.bots.min_players == 0 {
            tracing::error!("bots.min_players must be > 0");
            std::process::exit(1);
        }
    }

    /// Load config from `repsync.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("repsync.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from repsync.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse repsync.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No repsync.toml found, using defaults");
                ServerConfig::default()
            },
        };

        if let Ok(addr) = std::env::var("REPSYNC_LISTEN_ADDR")
            && !addr.is_empty()
        {
            config.listen_addr = addr;
        }
        if let Ok(val) = std::env::var("REPSYNC_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            config.limits.max_ws_connections = n;
        }
        if let Ok(val) = std::env::var("REPSYNC_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            config.limits.ws_rate_limit_per_sec = n;
        }
        if let Ok(val) = std::env::var("REPSYNC_BOT_FILL_DELAY_MS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.bots.fill_delay_ms = n;
        }
        if let Ok(val) = std::env::var("REPSYNC_BOT_MIN_PLAYERS")
            && let Ok(n) = val.parse::<usize>()
        {
            config.bots.min_players = n;
        }

        config
    }
}
