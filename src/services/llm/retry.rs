// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

//! Exponential backoff for provider requests that get throttled or hit a
//! failing upstream.

use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::warn;

const INITIAL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_INTERVAL: Duration = Duration::from_secs(30);

/// Statuses worth another attempt: rate limiting and gateway/server failures.
pub fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Send the request built by `build`, retrying retryable statuses up to
/// `max_retries` times with exponential backoff.
///
/// Transport errors are returned immediately. Once retries run out, the last
/// response is returned as-is so the caller reports its status.
pub async fn send_with_retry<F>(max_retries: u32, mut build: F) -> reqwest::Result<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: INITIAL_INTERVAL,
        max_interval: MAX_INTERVAL,
        max_elapsed_time: None,
        ..Default::default()
    };
    let mut retries = 0;

    loop {
        let response = build().send().await?;
        let status = response.status();

        if !is_retryable(status) || retries >= max_retries {
            return Ok(response);
        }
        let Some(wait) = backoff.next_backoff() else {
            return Ok(response);
        };

        retries += 1;
        warn!(
            status = %status,
            retry = retries,
            max_retries,
            wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            "provider request failed, retrying"
        );
        tokio::time::sleep(wait).await;
    }
}
