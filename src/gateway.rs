//! Single-call HTTP round trips to the CLU's HAlistener endpoint.
//!
//! Reads are a GET with a `{"status": "<expr>"}` JSON body, writes a POST
//! with `{"command": "<expr>"}`. Each call builds its own short-lived
//! client; there is no shared pool, no retry, and the hub's poll interval
//! is the only retry mechanism.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection failure, timeout, non-2xx status, or a malformed reply body.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TransportError(#[from] reqwest::Error);

#[derive(Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
}

#[derive(Serialize)]
struct CommandRequest<'a> {
    command: &'a str,
}

/// Reply to a read. Sensor expressions answer in `status`, output
/// (light/switch) expressions in `object_value`; either may be absent.
#[derive(Debug, Default, Deserialize)]
pub struct ReadReply {
    #[serde(default)]
    pub status: Option<f64>,
    #[serde(default)]
    pub object_value: Option<f64>,
}

// A dead CLU should cost one bounded poll cycle, not wedge the loop.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn client() -> Result<reqwest::Client, TransportError> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Evaluate a read expression on the CLU and return the decoded reply.
pub async fn read(endpoint: &str, expression: &str) -> Result<ReadReply, TransportError> {
    let reply = client()?
        .get(endpoint)
        .json(&StatusRequest { status: expression })
        .send()
        .await?
        .error_for_status()?
        .json::<ReadReply>()
        .await?;
    Ok(reply)
}

/// Submit a write expression to the CLU. The reply body is ignored;
/// only a 2xx status counts as success.
pub async fn send(endpoint: &str, expression: &str) -> Result<(), TransportError> {
    client()?
        .post(endpoint)
        .json(&CommandRequest {
            command: expression,
        })
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
