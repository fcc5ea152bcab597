use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{config_error, Error};

const TOKEN_PLACEHOLDER: &str = "paste_your_mapbox_api_key_here";

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub mapbox_token: Option<String>,
    pub mapbox_api_base: String,
    pub nominatim_api_base: String,
    pub openweather_api_key: Option<String>,
    pub openweather_api_base: String,
    pub geocode_delay: Duration,
}

impl Config {
    /// Reads the process environment after loading `.env`, if present.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host: IpAddr = match get("HOST") {
            Some(host) => host
                .parse()
                .map_err(|_| config_error(format!("HOST is not an IP address: {}", host)))?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let port = parse_or(get("PORT"), "PORT", 5000)?;
        let max_connections = parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 5)?;
        let geocode_delay_ms = parse_or(get("GEOCODE_DELAY_MS"), "GEOCODE_DELAY_MS", 1000)?;

        Ok(Self {
            addr: SocketAddr::new(host, port),
            database_url: get("DATABASE_URL"),
            max_connections,
            mapbox_token: get("MAPBOX_ACCESS_TOKEN").filter(|t| t != TOKEN_PLACEHOLDER),
            mapbox_api_base: get("MAPBOX_API_BASE").unwrap_or_else(|| "https://api.mapbox.com".into()),
            nominatim_api_base: get("NOMINATIM_API_BASE")
                .unwrap_or_else(|| "https://nominatim.openstreetmap.org".into()),
            openweather_api_key: get("OPENWEATHER_API_KEY"),
            openweather_api_base: get("OPENWEATHER_API_BASE")
                .unwrap_or_else(|| "https://api.openweathermap.org".into()),
            geocode_delay: Duration::from_millis(geocode_delay_ms),
        })
    }

    pub fn require_mapbox_token(&self) -> Result<&str, Error> {
        self.mapbox_token
            .as_deref()
            .ok_or_else(|| config_error("MAPBOX_ACCESS_TOKEN is not set"))
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, Error> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| config_error(format!("{} has an invalid value: {}", key, v))),
        None => Ok(default),
    }
}

#[test]
fn defaults_without_environment() {
    let config = Config::from_lookup(|_| None).unwrap();

    assert_eq!(config.addr, "127.0.0.1:5000".parse().unwrap());
    assert_eq!(config.database_url, None);
    assert_eq!(config.max_connections, 5);
    assert_eq!(config.geocode_delay, Duration::from_secs(1));
    assert!(config.require_mapbox_token().unwrap_err().is_config());
}

#[test]
fn placeholder_token_counts_as_missing() {
    let config = Config::from_lookup(|key| match key {
        "MAPBOX_ACCESS_TOKEN" => Some(TOKEN_PLACEHOLDER.into()),
        "PORT" => Some("8080".into()),
        "GEOCODE_DELAY_MS" => Some("250".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.mapbox_token, None);
    assert_eq!(config.addr.port(), 8080);
    assert_eq!(config.geocode_delay, Duration::from_millis(250));
}

#[test]
fn malformed_port_is_a_config_error() {
    let err = Config::from_lookup(|key| (key == "PORT").then(|| "http".to_string())).unwrap_err();
    assert!(err.is_config());
}
