use clickrush::EngineConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

const DEFAULT_HTTP_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);
const DEFAULT_TCP_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3001);
const DEFAULT_STORE_URL: &str = "sqlite://clickrush.db?mode=rwc";

/// Server configuration, read from the environment once at startup.
///
/// Contest rules ride along in `engine`; none of this is mutable at runtime.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP ingress bind address. `CLICKRUSH_HTTP_ADDR`.
    pub http_addr: SocketAddr,
    /// TCP click ingress bind address. `CLICKRUSH_TCP_ADDR`.
    pub tcp_addr: SocketAddr,
    /// Identity store location. `CLICKRUSH_STORE_URL`; `memory:` selects the
    /// in-process store.
    pub store_url: String,
    /// Engine rules. `CLICKRUSH_DURATION_SECS`,
    /// `CLICKRUSH_INACTIVE_TIMEOUT_SECS`, `CLICKRUSH_MAX_CLICKS_PER_SECOND`.
    pub engine: EngineConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            session_duration: env_secs("CLICKRUSH_DURATION_SECS")
                .unwrap_or(defaults.session_duration),
            inactive_timeout: env_secs("CLICKRUSH_INACTIVE_TIMEOUT_SECS")
                .unwrap_or(defaults.inactive_timeout),
            max_clicks_per_second: env_parse("CLICKRUSH_MAX_CLICKS_PER_SECOND")
                .unwrap_or(defaults.max_clicks_per_second),
            ..defaults
        };
        Self {
            http_addr: env_parse("CLICKRUSH_HTTP_ADDR").unwrap_or(DEFAULT_HTTP_ADDR),
            tcp_addr: env_parse("CLICKRUSH_TCP_ADDR").unwrap_or(DEFAULT_TCP_ADDR),
            store_url: std::env::var("CLICKRUSH_STORE_URL")
                .unwrap_or_else(|_| DEFAULT_STORE_URL.to_string()),
            engine,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_secs)
}
