use crate::churn::ChurnConfig;
use clap::Args;
use duet_core::IceServerConfig;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

/// Signaling server settings. Every flag can also come from the environment.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "DUET_BIND", default_value = "0.0.0.0:4000")]
    pub bind: SocketAddr,

    /// STUN server URLs handed to clients.
    #[arg(
        long = "stun",
        env = "DUET_STUN",
        value_delimiter = ',',
        default_value = DEFAULT_STUN_URL
    )]
    pub stun_urls: Vec<String>,

    #[arg(long, env = "TURN_URL")]
    pub turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME")]
    pub turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL")]
    pub turn_credential: Option<String>,

    /// Inject simulated participants that join and leave periodically.
    #[arg(long, env = "DUET_CHURN")]
    pub churn: bool,

    #[arg(long, env = "DUET_CHURN_INTERVAL_SECS", default_value_t = 10)]
    pub churn_interval_secs: u64,

    #[arg(long, env = "DUET_CHURN_LIFETIME_SECS", default_value_t = 30)]
    pub churn_lifetime_secs: u64,
}

impl ServerConfig {
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let mut servers = Vec::new();
        if !self.stun_urls.is_empty() {
            servers.push(IceServerConfig {
                urls: self.stun_urls.clone(),
                username: None,
                credential: None,
            });
        }
        if let Some(turn_url) = &self.turn_url {
            servers.push(IceServerConfig {
                urls: vec![turn_url.clone()],
                username: self.turn_username.clone(),
                credential: self.turn_credential.clone(),
            });
        }
        servers
    }

    pub fn churn(&self) -> Option<ChurnConfig> {
        self.churn.then(|| ChurnConfig {
            interval: Duration::from_secs(self.churn_interval_secs.max(1)),
            lifetime: Duration::from_secs(self.churn_lifetime_secs),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 4000)),
            stun_urls: vec![DEFAULT_STUN_URL.to_owned()],
            turn_url: None,
            turn_username: None,
            turn_credential: None,
            churn: false,
            churn_interval_secs: 10,
            churn_lifetime_secs: 30,
        }
    }
}
