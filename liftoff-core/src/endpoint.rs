//! Remote endpoints: running against a server the harness did not start.

use crate::error::HarnessError;
use crate::protocol::ProtocolSetup;
use url::Url;

/// Port assumed when a remote server URL does not name one.
pub const DEFAULT_REMOTE_PORT: u16 = 443;

/// A pre-existing server to run commands against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    /// Host of the server.
    pub hostname: String,
    /// Port of the server.
    pub port: u16,
}

impl RemoteEndpoint {
    /// Create an endpoint from its parts.
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    /// Parse a server URL such as `https://example.com:3000`.
    ///
    /// A URL without an explicit port maps to [`DEFAULT_REMOTE_PORT`]
    /// whatever its scheme.
    pub fn parse(server: &str) -> Result<Self, HarnessError> {
        let url = Url::parse(server).map_err(|e| {
            HarnessError::Construction(format!("remote_server {server:?} is not a valid url: {e}"))
        })?;
        let hostname = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| {
                HarnessError::Construction(format!("remote_server {server:?} has no host"))
            })?;
        // `Url::port` hides a port equal to the scheme default, so an
        // explicit `http://host:80` needs the known default back.
        let port = match url.port() {
            Some(port) => port,
            None if has_explicit_port(server) => url
                .port_or_known_default()
                .unwrap_or(DEFAULT_REMOTE_PORT),
            None => DEFAULT_REMOTE_PORT,
        };
        Ok(Self::new(hostname, port))
    }

    /// The protocol setup for this endpoint.
    pub fn setup(&self) -> ProtocolSetup {
        ProtocolSetup::Remote {
            hostname: self.hostname.clone(),
            port: self.port,
        }
    }
}

/// Whether the authority of `server` spells out a port.
fn has_explicit_port(server: &str) -> bool {
    let rest = server.split_once("://").map_or(server, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    after_host
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_explicit_port() {
        let endpoint = RemoteEndpoint::parse("http://example.com:3000").unwrap();
        assert_eq!(endpoint, RemoteEndpoint::new("example.com", 3000));
    }

    #[test]
    fn parse_https_default_port() {
        // `Url::port` elides the scheme default, so this exercises the fallback.
        let endpoint = RemoteEndpoint::parse("https://host:443").unwrap();
        assert_eq!(endpoint, RemoteEndpoint::new("host", 443));
    }

    #[test]
    fn parse_keeps_explicit_scheme_default_port() {
        assert_eq!(RemoteEndpoint::parse("http://host:80").unwrap().port, 80);
        assert_eq!(RemoteEndpoint::parse("ws://host:80/websocket").unwrap().port, 80);
        assert_eq!(RemoteEndpoint::parse("http://user:pw@host:80").unwrap().port, 80);
        assert_eq!(RemoteEndpoint::parse("http://[::1]:80").unwrap().port, 80);
    }

    #[test]
    fn parse_ipv6_without_port_is_443() {
        assert_eq!(RemoteEndpoint::parse("http://[::1]/").unwrap().port, 443);
    }

    #[test]
    fn parse_missing_port_is_443_for_any_scheme() {
        let endpoint = RemoteEndpoint::parse("http://example.com").unwrap();
        assert_eq!(endpoint.port, 443);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = RemoteEndpoint::parse("not a url").unwrap_err();
        assert!(matches!(err, HarnessError::Construction(_)));
    }

    #[test]
    fn parse_rejects_hostless_url() {
        let err = RemoteEndpoint::parse("file:///tmp/socket").unwrap_err();
        assert!(err.to_string().contains("has no host"));
    }

    #[test]
    fn setup_is_remote() {
        let setup = RemoteEndpoint::new("host", 443).setup();
        assert_eq!(setup.hostname(), "host");
        assert_eq!(setup.port(), 443);
        assert_eq!(setup.process_id(), None);
    }
}
