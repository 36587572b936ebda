//! Server configuration: flags with environment fallbacks.

use clap::Parser;
use gridrush_room::ArenaConfig;

use crate::ServerError;

/// Gridrush — realtime multiplayer grid-arena server.
#[derive(Parser, Debug, Clone)]
#[command(name = "gridrush", version)]
#[command(about = "Realtime multiplayer grid-arena server")]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: std::net::SocketAddr,

    /// Host (and port) advertised to clients in the WebSocket URL.
    #[arg(long, env = "ENDPOINT", default_value = "localhost:8080")]
    pub endpoint: String,

    /// Scheme of the advertised WebSocket URL (`ws` or `wss`).
    #[arg(long, env = "HTTP_TYPE", default_value = "ws")]
    pub ws_scheme: String,

    /// Side length of every room's grid.
    #[arg(long, env = "GRID_SIZE", default_value_t = 15)]
    pub grid_size: i32,

    /// Obstacles placed per round.
    #[arg(long, env = "OBSNUMBER", default_value_t = 10)]
    pub obstacle_count: usize,

    /// Coins placed per round.
    #[arg(long, env = "COINNUMBER", default_value_t = 10)]
    pub coin_count: usize,

    /// Diamonds placed per round.
    #[arg(long, env = "DIAMOND", default_value_t = 2)]
    pub diamond_count: usize,

    /// Hold joiners out of a running round until the next one seats
    /// players. With `false`, joiners are seated immediately.
    #[arg(
        long,
        env = "RUNNING_GAME_JOIN_PROTECT",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub join_protect: bool,

    /// Room ids created at startup, comma separated.
    #[arg(long, env = "ROOM_IDS", value_delimiter = ',', default_value = "A,B")]
    pub room_ids: Vec<String>,
}

impl ServerConfig {
    /// The per-room arena settings derived from this configuration.
    pub fn arena_config(&self) -> ArenaConfig {
        ArenaConfig {
            grid_size: self.grid_size,
            obstacle_count: self.obstacle_count,
            coin_count: self.coin_count,
            diamond_count: self.diamond_count,
            join_protect: self.join_protect,
        }
    }

    /// The WebSocket URL advertised by `/v1/game/ws-url`.
    pub fn ws_url(&self) -> String {
        format!("{}://{}/v1/game/ws", self.ws_scheme, self.endpoint)
    }

    /// Rejects unusable configurations. The server aborts startup on `Err`.
    pub fn validate(&self) -> Result<(), ServerError> {
        self.arena_config().validate().map_err(ServerError::Config)?;
        if self.room_ids.is_empty() {
            return Err(ServerError::Config("at least one room id is required".into()));
        }
        if self.ws_scheme != "ws" && self.ws_scheme != "wss" {
            return Err(ServerError::Config(format!(
                "ws scheme must be ws or wss, got {}",
                self.ws_scheme
            )));
        }
        Ok(())
    }
}
