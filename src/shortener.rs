//! Shortening Client: one synchronous call against the Rebrandly API.
//! No local retries; fallback on failure is the caller's policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{BotError, BotResult};

const REBRANDLY_ENDPOINT: &str = "https://api.rebrandly.com/v1/links";
const REBRANDLY_DOMAIN: &str = "rebrand.ly";

#[async_trait]
pub trait UrlShortener: Send + Sync {
    async fn shorten(&self, long_url: &str) -> BotResult<String>;
}

pub struct RebrandlyClient {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ShortenRequest<'a> {
    destination: &'a str,
    domain: Domain<'a>,
}

#[derive(Debug, Serialize)]
struct Domain<'a> {
    #[serde(rename = "fullName")]
    full_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    #[serde(rename = "shortUrl")]
    short_url: String,
}

impl RebrandlyClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl UrlShortener for RebrandlyClient {
    async fn shorten(&self, long_url: &str) -> BotResult<String> {
        let body = ShortenRequest {
            destination: long_url,
            domain: Domain {
                full_name: REBRANDLY_DOMAIN,
            },
        };

        let response = self
            .client
            .post(REBRANDLY_ENDPOINT)
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::ShorteningFailed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ShortenResponse = response.json().await.map_err(|e| {
            BotError::parse_error(format!("bad shortener response: {}", e))
        })?;

        // Rebrandly returns the short URL without a scheme
        Ok(normalize_short_url(&parsed.short_url))
    }
}

fn normalize_short_url(short_url: &str) -> String {
    if short_url.starts_with("http://") || short_url.starts_with("https://") {
        short_url.to_string()
    } else {
        format!("https://{}", short_url)
    }
}

#[cfg(test)]
pub mod testing {
    //! Canned shortener for controller tests.

    use super::*;
    use std::sync::Mutex;

    pub struct FakeShortener {
        pub fail: bool,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeShortener {
        pub fn succeeding() -> Self {
            Self {
                fail: false,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl UrlShortener for FakeShortener {
        async fn shorten(&self, long_url: &str) -> BotResult<String> {
            self.requests.lock().unwrap().push(long_url.to_string());
            if self.fail {
                return Err(BotError::ShorteningFailed {
                    status: 403,
                    body: "invalid api key".to_string(),
                });
            }
            Ok("https://rebrand.ly/fake".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_the_api_shape() {
        let body = ShortenRequest {
            destination: "https://cdn/video",
            domain: Domain {
                full_name: REBRANDLY_DOMAIN,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["destination"], "https://cdn/video");
        assert_eq!(json["domain"]["fullName"], "rebrand.ly");
    }

    #[test]
    fn response_short_url_is_parsed() {
        let parsed: ShortenResponse =
            serde_json::from_str(r#"{"id": "x", "shortUrl": "rebrand.ly/abc"}"#).unwrap();
        assert_eq!(parsed.short_url, "rebrand.ly/abc");
    }

    #[test]
    fn scheme_is_prefixed_when_missing() {
        assert_eq!(normalize_short_url("rebrand.ly/abc"), "https://rebrand.ly/abc");
        assert_eq!(
            normalize_short_url("https://rebrand.ly/abc"),
            "https://rebrand.ly/abc"
        );
    }
}
