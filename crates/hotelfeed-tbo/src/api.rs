//! TBO API client
//!
//! Three POST endpoints: `Authenticate` on the shared-data service, then
//! `GetDestinationSearchStaticData` and `GetHotelStaticData` on the
//! static-data service. Every call goes through the retry policy.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use hotelfeed_core::{FetchError, RetryPolicy, retry};

use crate::config::TboConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Session token returned by `Authenticate`, valid for the whole run.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token is a credential, keep it out of debug output
        write!(f, "AuthToken(..)")
    }
}

/// One destination row from `GetDestinationSearchStaticData`.
#[derive(Debug, Clone, Deserialize)]
pub struct Destination {
    #[serde(rename = "DestinationId", deserialize_with = "id_string")]
    pub destination_id: String,
    #[serde(rename = "CountryCode", default)]
    pub country_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The upstream serves ids as numbers or strings depending on endpoint
/// version; normalize both to a string.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "DestinationId must be a string or number, got {other}"
        ))),
    }
}

/// Upstream seam, mocked in tests.
#[async_trait]
pub trait HotelApi: Send + Sync + 'static {
    async fn authenticate(&self) -> anyhow::Result<AuthToken>;

    async fn destinations(
        &self,
        token: &AuthToken,
        country_code: &str,
    ) -> anyhow::Result<Vec<Destination>>;

    /// Full hotel static-data body for one destination.
    async fn hotel_detail(
        &self,
        destination_id: &str,
        token: &AuthToken,
    ) -> anyhow::Result<Map<String, Value>>;
}

/// Live client over reqwest.
pub struct TboClient {
    http: reqwest::Client,
    config: Arc<TboConfig>,
    retry: RetryPolicy,
}

impl TboClient {
    pub fn new(config: Arc<TboConfig>, retry: RetryPolicy) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            config,
            retry,
        })
    }

    /// POST a JSON body and decode the JSON response, with retries.
    async fn post(&self, path: &str, body: Value) -> Result<Value, FetchError> {
        let url = format!("{}{path}", self.config.base_url);
        retry::execute(&self.retry, || {
            let request = self.http.post(&url).json(&body);
            async move {
                let response = request
                    .send()
                    .await
                    .map_err(|e| FetchError::from_reqwest(&e))?
                    .error_for_status()
                    .map_err(|e| FetchError::from_reqwest(&e))?;
                response
                    .json::<Value>()
                    .await
                    .map_err(|e| FetchError::from_reqwest(&e))
            }
        })
        .await
    }
}

fn token_from_response(body: &Value) -> Result<AuthToken, FetchError> {
    body.get("TokenId")
        .and_then(Value::as_str)
        .map(AuthToken::new)
        .ok_or_else(|| FetchError::Decode("Authenticate response missing TokenId".to_string()))
}

fn destinations_from_response(body: Value) -> Result<Vec<Destination>, FetchError> {
    let rows = match body {
        Value::Object(mut map) => match map.remove("Destinations") {
            Some(Value::Array(rows)) => rows,
            // No rows for this country is a valid answer
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(FetchError::Decode(format!(
                    "Destinations must be an array, got {other}"
                )));
            }
        },
        other => {
            return Err(FetchError::Decode(format!(
                "destination response must be an object, got {other}"
            )));
        }
    };
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| FetchError::Decode(e.to_string()))
        })
        .collect()
}

#[async_trait]
impl HotelApi for TboClient {
    async fn authenticate(&self) -> anyhow::Result<AuthToken> {
        let body = json!({
            "ClientId": self.config.client_id,
            "UserName": self.config.username,
            "Password": self.config.password,
            "EndUserIp": self.config.end_user_ip,
        });
        let response = self.post("/SharedData.svc/rest/Authenticate", body).await?;
        Ok(token_from_response(&response)?)
    }

    async fn destinations(
        &self,
        token: &AuthToken,
        country_code: &str,
    ) -> anyhow::Result<Vec<Destination>> {
        let body = json!({
            "EndUserIp": self.config.end_user_ip,
            "TokenId": token.as_str(),
            "CountryCode": country_code,
            "SearchType": "2",
        });
        let response = self
            .post("/StaticData.svc/rest/GetDestinationSearchStaticData", body)
            .await?;
        Ok(destinations_from_response(response)?)
    }

    async fn hotel_detail(
        &self,
        destination_id: &str,
        token: &AuthToken,
    ) -> anyhow::Result<Map<String, Value>> {
        let body = json!({
            "HotelId": destination_id,
            "ClientId": self.config.client_id,
            "EndUserIp": self.config.end_user_ip,
            "TokenId": token.as_str(),
        });
        let response = self
            .post("/StaticData.svc/rest/GetHotelStaticData", body)
            .await?;
        match response {
            Value::Object(map) => Ok(map),
            other => Err(FetchError::Decode(format!(
                "hotel detail response must be an object, got {other}"
            ))
            .into()),
        }
    }
}
