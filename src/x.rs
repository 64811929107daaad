//! Posting to X through the v2 API.
//!
//! Requests are signed with OAuth 1.0a (HMAC-SHA1) using the app's consumer
//! key pair and the account's access token pair.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha1::Sha1;
use streamcal_core::announcer::Publisher;
use streamcal_core::error::{Error, Result};

use crate::config::XCredentials;

const CREATE_POST_URL: &str = "https://api.x.com/2/tweets";

pub struct XClient {
    http: reqwest::Client,
    credentials: XCredentials,
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: Option<CreatedPost>,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
}

impl XClient {
    pub fn new(credentials: XCredentials) -> Result<Self> {
        Ok(XClient {
            http: crate::fetch::client()?,
            credentials,
        })
    }

    fn authorization(&self, method: &str, url: &str) -> Result<String> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        oauth_header(&self.credentials, method, url, &nonce, &timestamp)
    }
}

#[async_trait]
impl Publisher for XClient {
    async fn publish(&self, text: &str) -> Result<Option<String>> {
        let response = self
            .http
            .post(CREATE_POST_URL)
            .header(
                reqwest::header::AUTHORIZATION,
                self.authorization("POST", CREATE_POST_URL)?,
            )
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| Error::Publish(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Publish(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Publish(format!("HTTP {}: {}", status, body)));
        }

        // A post that went through is not retried over an odd response body
        let id = serde_json::from_str::<CreatePostResponse>(&body)
            .ok()
            .and_then(|r| r.data)
            .map(|d| d.id);
        Ok(id)
    }
}

/// RFC 3986 percent-encoding, as OAuth 1.0a requires.
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Build the `Authorization: OAuth ...` header value.
///
/// JSON bodies are not part of the signature, so only the oauth_* parameters
/// are signed.
fn oauth_header(
    credentials: &XCredentials,
    method: &str,
    url: &str,
    nonce: &str,
    timestamp: &str,
) -> Result<String> {
    let mut params = vec![
        ("oauth_consumer_key", credentials.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let base = signature_base_string(method, url, &params);
    let key = format!(
        "{}&{}",
        encode(&credentials.api_secret),
        encode(&credentials.access_token_secret)
    );
    let signature = sign(&key, &base)?;
    params.push(("oauth_signature", signature.as_str()));

    let fields: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect();
    Ok(format!("OAuth {}", fields.join(", ")))
}

fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (encode(k), encode(v))).collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&param_string)
    )
}

fn sign(key: &str, base: &str) -> Result<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| Error::Publish(format!("could not sign request: {}", e)))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
