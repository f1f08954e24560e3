//! HTTP upload sink for the collector API.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use stepsync_core::{StepsPayload, SyncConfig, SyncError, UploadSink};

pub struct HttpUploadSink {
    client: reqwest::Client,
    url: String,
    secret: String,
}

impl HttpUploadSink {
    /// `timeout` must be strictly shorter than the lease window so the
    /// guard's forced-expiration path stays a safety net.
    pub fn new(url: String, secret: String, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url,
            secret,
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        Self::new(
            config.api_url.clone(),
            config.api_secret.clone(),
            config.upload_timeout(),
        )
    }
}

impl UploadSink for HttpUploadSink {
    fn send(&self, payload: StepsPayload) -> BoxFuture<'_, stepsync_core::Result<()>> {
        async move {
            let steps = payload.steps;
            let response = self
                .client
                .post(&self.url)
                .header("api-secret", &self.secret)
                .json(&payload)
                .send()
                .await
                .map_err(|e| SyncError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SyncError::UploadRejected {
                    status: status.as_u16(),
                    body,
                });
            }

            tracing::debug!(steps, status = %status, "upload accepted");
            Ok(())
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use stepsync_core::ErrorKind;

    #[tokio::test]
    async fn posts_payload_with_secret_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/entries")
            .match_header("api-secret", "hunter2")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"steps": 1235}),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let sink = HttpUploadSink::new(
            format!("{}/entries", server.url()),
            "hunter2".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        sink.send(StepsPayload::new(1234.6)).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_2xx_maps_to_upload_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/entries")
            .with_status(403)
            .with_body("bad secret")
            .create_async()
            .await;

        let sink = HttpUploadSink::new(
            format!("{}/entries", server.url()),
            "wrong".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = sink.send(StepsPayload::new(100.0)).await.unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::UploadRejected));
        match err {
            SyncError::UploadRejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "bad secret");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_collector_maps_to_network_error() {
        // Port 1 is never listening.
        let sink = HttpUploadSink::new(
            "http://127.0.0.1:1/entries".into(),
            "hunter2".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = sink.send(StepsPayload::new(100.0)).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NetworkError));
    }
}
