// Thin blocking HTTP helper shared by all REST clients: 200 is a JSON
// body, 404 is "no such thing" (None), anything else is a Service error
// carrying the REST message when one can be parsed out of the body.

use crate::error::{Result, SplitGenError};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct RestEnvelope {
    rest: RestMessage,
}

#[derive(Deserialize)]
struct RestMessage {
    #[serde(default)]
    message: String,
}

#[derive(Clone, Debug)]
pub struct Responder {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl Responder {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        let mut base_url = base_url.trim_end_matches('/').to_string();
        base_url.push('/');
        Ok(Self { base_url, client })
    }

    /// A bare query-string endpoint addresses the base URL itself.
    fn url(&self, endpoint: &str) -> String {
        match endpoint.strip_prefix('?') {
            Some(query) => format!("{}?{query}", self.base_url.trim_end_matches('/')),
            None => format!("{}{}", self.base_url, endpoint),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>> {
        let url = self.url(endpoint);
        debug!("GET {url}");
        let response = self.client.get(&url).send()?;
        Self::decode(&url, response)
    }

    pub fn post_form<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Option<T>> {
        let url = self.url(endpoint);
        debug!("POST {url}");
        let response = self.client.post(&url).form(body).send()?;
        Self::decode(&url, response)
    }

    fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<Option<T>> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<RestEnvelope>(&text)
                .map(|envelope| envelope.rest.message)
                .unwrap_or(text);
            return Err(SplitGenError::Service(format!("{url}: {status}: {message}")));
        }
        let parsed = serde_json::from_str(&text)?;
        Ok(Some(parsed))
    }
}
