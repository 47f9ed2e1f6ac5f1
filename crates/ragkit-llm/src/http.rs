//! Shared HTTP plumbing for provider clients.
//!
//! Retry strategy: HTTP 429 and 5xx retry with exponential backoff
//! (1s, 2s, 4s, … capped at 2^5); other 4xx fail immediately; network
//! errors retry.

use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// POST a JSON body and return the parsed JSON response.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    headers: HeaderMap,
    body: &Value,
    max_retries: u32,
) -> Result<Value, String> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            debug!(url, attempt, ?delay, "retrying provider call");
            tokio::time::sleep(delay).await;
        }

        let result = client
            .post(url)
            .headers(headers.clone())
            .json(body)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response
                        .json::<Value>()
                        .await
                        .map_err(|e| format!("invalid json from {url}: {e}"));
                }

                let body_text = response.text().await.unwrap_or_default();

                // Rate limited or server error: retry.
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(format!("{url} returned {status}: {body_text}"));
                    continue;
                }

                // Other client errors are final.
                return Err(format!("{url} returned {status}: {body_text}"));
            }
            Err(e) => {
                last_err = Some(format!("request to {url} failed: {e}"));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| format!("request to {url} failed after retries")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_json_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api");
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        let value = post_json(
            &client(),
            &format!("{}/api", server.base_url()),
            HeaderMap::new(),
            &json!({"q": 1}),
            0,
        )
        .await
        .unwrap();

        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_post_json_client_error_no_retry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api");
                then.status(401).body("unauthorized");
            })
            .await;

        let err = post_json(
            &client(),
            &format!("{}/api", server.base_url()),
            HeaderMap::new(),
            &json!({}),
            3,
        )
        .await
        .unwrap_err();

        assert!(err.contains("401"));
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_post_json_server_error_retries() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api");
                then.status(500).body("boom");
            })
            .await;

        let err = post_json(
            &client(),
            &format!("{}/api", server.base_url()),
            HeaderMap::new(),
            &json!({}),
            1,
        )
        .await
        .unwrap_err();

        assert!(err.contains("500"));
        mock.assert_hits(2);
    }
}
