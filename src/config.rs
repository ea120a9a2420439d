//! Process configuration read from the environment.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `HOST` | `0.0.0.0` | Interface to bind |
//! | `PORT` | `3000` | TCP port to bind |
//!
//! Log verbosity is controlled separately through `RUST_LOG`.

use std::env;
use std::net::{IpAddr, SocketAddr};

use crate::error::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// Resolved server settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
}

impl Config {
    /// Reads `HOST` and `PORT`, falling back to defaults when unset.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(env::var("HOST").ok(), env::var("PORT").ok())
    }

    fn from_vars(host: Option<String>, port: Option<String>) -> Result<Self, Error> {
        let host = host.as_deref().map(str::trim).filter(|h| !h.is_empty()).unwrap_or(DEFAULT_HOST);
        let ip: IpAddr = host
            .parse()
            .map_err(|_| Error::Config(format!("HOST `{host}` is not an IP address")))?;

        let port = match port.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT `{p}` is not a valid port number")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self { addr: SocketAddr::new(ip, port) })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { addr: SocketAddr::new(IpAddr::from([0, 0, 0, 0]), DEFAULT_PORT) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_vars(None, None).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.addr.to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn reads_host_and_port() {
        let cfg = Config::from_vars(Some("127.0.0.1".into()), Some("8080".into())).unwrap();
        assert_eq!(cfg.addr.to_string(), "127.0.0.1:8080");

        let cfg = Config::from_vars(Some("::1".into()), Some(" 9000 ".into())).unwrap();
        assert_eq!(cfg.addr.to_string(), "[::1]:9000");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_vars(None, Some("http".into())),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_vars(None, Some("70000".into())),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_vars(Some("localhost".into()), None),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = Config::from_vars(Some("".into()), Some("  ".into())).unwrap();
        assert_eq!(cfg, Config::default());
    }
}
