//! HTTP transport to the ACS.
//!
//! One [`AcsClient`] per session: the cookie jar lives with the client, so
//! `Set-Cookie` session binding survives across the request/response pairs
//! of the session and is dropped with it. Every round trip is bounded by a
//! 30-second timeout; any status other than 200/204 ends the session.

use std::time::Duration;

use cwmp_soap::{ResponseEnvelope, SoapError};
use tracing::{debug, instrument, warn};

pub const ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(30);
pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";
pub const SOAP_ACTION: &str = "urn:dslforum-org:cwmp-1-2";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Soap(#[from] SoapError),

    #[error("session deadline expired")]
    Timeout,
}

impl From<reqwest::Error> for SessionError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// What the ACS answered with.
#[derive(Debug)]
pub enum AcsReply {
    Envelope(ResponseEnvelope),
    /// Body-less 204 (or an empty 200): the ACS has nothing further.
    End,
}

pub struct AcsClient {
    http: reqwest::Client,
    acs_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl AcsClient {
    pub fn new(
        acs_url: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .use_native_tls()
            .cookie_store(true)
            .timeout(ROUND_TRIP_TIMEOUT)
            .build()
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            acs_url: acs_url.into(),
            username,
            password,
        })
    }

    /// Posts one envelope (or the empty body that solicits the next ACS
    /// request) and parses the reply.
    #[instrument(level = "debug", skip(self, body), fields(url = %self.acs_url))]
    pub async fn post(&self, body: Option<String>) -> Result<AcsReply, SessionError> {
        let payload = body.unwrap_or_default();
        debug!(bytes = payload.len(), "posting to ACS");

        let mut request = self
            .http
            .post(&self.acs_url)
            .header("Content-Type", CONTENT_TYPE)
            .header("SOAPAction", SOAP_ACTION)
            .body(payload);
        if let Some(username) = &self.username {
            if !username.is_empty() {
                request = request.basic_auth(username, self.password.as_deref());
            }
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "ACS answered");

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(AcsReply::End);
        }
        if status != reqwest::StatusCode::OK {
            warn!(status = status.as_u16(), "non-OK status from ACS");
            return Err(SessionError::Transport(format!(
                "ACS returned status {status}"
            )));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(AcsReply::End);
        }
        Ok(AcsReply::Envelope(ResponseEnvelope::from_xml(&text)?))
    }
}
