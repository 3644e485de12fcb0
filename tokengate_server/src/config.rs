//! Startup configuration
//!
//! Every value can arrive as a long flag or through the environment. The
//! issuer and audience are required: without both, the process exits
//! before binding a socket.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

/// Runtime configuration for the validation service
#[derive(Clone, Debug, Parser)]
#[command(
    name = "tokengate_server",
    about = "Bearer-token validation endpoint for reverse proxies"
)]
pub struct Config {
    /// Trusted token issuer, e.g. `https://tenant.example.com/`
    ///
    /// Also the base of the JWKS endpoint the signing keys are fetched
    /// from.
    #[arg(long, env = "ISSUER_URI")]
    pub issuer: String,

    /// Audience value accepted tokens must carry
    #[arg(long, env = "AUDIENCE")]
    pub audience: String,

    /// Socket address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Seconds a fetched key set stays fresh before a lookup re-fetches it
    #[arg(long, env = "JWKS_TTL_SECS", default_value_t = 300)]
    pub jwks_ttl_secs: u64,

    /// Timeout in seconds for requests to the JWKS endpoint
    #[arg(long, env = "JWKS_TIMEOUT_SECS", default_value_t = 10)]
    pub jwks_timeout_secs: u64,

    /// Grace period in seconds applied to token expiration checks
    #[arg(long, env = "LEEWAY_SECS", default_value_t = 0)]
    pub leeway_secs: u64,
}

impl Config {
    /// The issuer's JWKS endpoint
    #[must_use]
    pub fn jwks_url(&self) -> String {
        format!(
            "{}/.well-known/jwks.json",
            self.issuer.trim_end_matches('/')
        )
    }

    /// Key set time-to-live
    #[must_use]
    pub fn jwks_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_ttl_secs)
    }

    /// JWKS request timeout
    #[must_use]
    pub fn jwks_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_timeout_secs)
    }

    /// Expiration leeway
    #[must_use]
    pub fn leeway(&self) -> Duration {
        Duration::from_secs(self.leeway_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwks_url_strips_a_trailing_slash() {
        let config = Config::try_parse_from([
            "tokengate_server",
            "--issuer",
            "https://tenant.example.com/",
            "--audience",
            "my-api",
        ])
        .unwrap();

        assert_eq!(
            config.jwks_url(),
            "https://tenant.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn jwks_url_without_trailing_slash() {
        let config = Config::try_parse_from([
            "tokengate_server",
            "--issuer",
            "https://tenant.example.com",
            "--audience",
            "my-api",
        ])
        .unwrap();

        assert_eq!(
            config.jwks_url(),
            "https://tenant.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn issuer_and_audience_are_required() {
        let missing_audience = Config::try_parse_from([
            "tokengate_server",
            "--issuer",
            "https://tenant.example.com/",
        ]);
        assert!(missing_audience.is_err());

        let missing_issuer =
            Config::try_parse_from(["tokengate_server", "--audience", "my-api"]);
        assert!(missing_issuer.is_err());
    }

    #[test]
    fn defaults_are_applied() {
        let config = Config::try_parse_from([
            "tokengate_server",
            "--issuer",
            "https://tenant.example.com/",
            "--audience",
            "my-api",
        ])
        .unwrap();

        assert_eq!(config.listen, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.jwks_ttl(), Duration::from_secs(300));
        assert_eq!(config.jwks_timeout(), Duration::from_secs(10));
        assert_eq!(config.leeway(), Duration::ZERO);
    }
}
