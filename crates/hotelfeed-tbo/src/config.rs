//! Upstream credentials and endpoint configuration

use anyhow::Context;

/// Credentials and endpoint for the TBO API, read once at startup.
pub struct TboConfig {
    pub base_url: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
    pub end_user_ip: String,
}

fn require(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} environment variable required"))
}

impl TboConfig {
    /// Read configuration from the environment. Every variable is
    /// mandatory; a missing one fails the run before any request is made.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            base_url: require("TBO_BASE_URL")?,
            client_id: require("TBO_CLIENT_ID")?,
            username: require("TBO_USERNAME")?,
            password: require("TBO_PASSWORD")?,
            end_user_ip: require("END_USER_IP")?,
        })
    }
}

impl std::fmt::Debug for TboConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TboConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("end_user_ip", &self.end_user_ip)
            .finish()
    }
}
