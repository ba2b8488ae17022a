use std::time::Duration;

use async_trait::async_trait;
use fleetgrid_application::PolicyStore;
use fleetgrid_core::{AppError, AppResult};
use fleetgrid_domain::Policy;
use serde::Deserialize;

/// HTTP adapter for an external relationship-tuple backend.
///
/// Transient failures (5xx, 429, transport errors) are retried with linear
/// backoff; a denied check comes back as a forbidden error rather than a
/// transport failure.
pub struct HttpPolicyStore {
    http_client: reqwest::Client,
    base_url: String,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ObjectsResponse {
    objects: Vec<String>,
}

impl HttpPolicyStore {
    /// Creates a policy store client against `base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        max_attempts: u8,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_with_retry<F>(&self, mut build: F) -> AppResult<reqwest::Response>
    where
        F: FnMut(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = build(&self.http_client).send().await;

            match response {
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    tracing::warn!(
                        status = %response.status(),
                        attempt,
                        "transient policy backend failure, retrying"
                    );
                    last_error = Some(format!(
                        "transient HTTP status {} from policy backend",
                        response.status()
                    ));
                }
                Ok(response) => return Ok(response),
                Err(error) => {
                    last_error = Some(format!("policy backend transport error: {error}"));
                }
            }

            if attempt < self.max_attempts {
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Internal(last_error.unwrap_or_else(|| {
            "policy backend request exhausted retries".to_owned()
        })))
    }

    async fn expect_success(response: reqwest::Response, context: &str) -> AppResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());
        Err(AppError::Internal(format!(
            "{context} failed with status {status}: {body}"
        )))
    }
}

#[async_trait]
impl PolicyStore for HttpPolicyStore {
    async fn add_policies(&self, policies: &[Policy]) -> AppResult<()> {
        if policies.is_empty() {
            return Ok(());
        }

        let url = self.endpoint("/v1/policies");
        let response = self
            .post_with_retry(|client| {
                client
                    .post(url.as_str())
                    .json(&serde_json::json!({ "policies": policies }))
            })
            .await?;

        Self::expect_success(response, "adding policies").await
    }

    async fn delete_policies(&self, policies: &[Policy]) -> AppResult<()> {
        if policies.is_empty() {
            return Ok(());
        }

        let url = self.endpoint("/v1/policies/delete");
        let response = self
            .post_with_retry(|client| {
                client
                    .post(url.as_str())
                    .json(&serde_json::json!({ "policies": policies }))
            })
            .await?;

        Self::expect_success(response, "deleting policies").await
    }

    async fn delete_policy_filter(&self, filter: &Policy) -> AppResult<()> {
        let url = self.endpoint("/v1/policies/delete_filter");
        let response = self
            .post_with_retry(|client| client.post(url.as_str()).json(filter))
            .await?;

        Self::expect_success(response, "deleting policies by filter").await
    }

    async fn check_policy(&self, policy: &Policy) -> AppResult<()> {
        let url = self.endpoint("/v1/policies/check");
        let response = self
            .post_with_retry(|client| client.post(url.as_str()).json(policy))
            .await?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            return Err(AppError::Forbidden(
                "relationship does not hold".to_owned(),
            ));
        }

        Self::expect_success(response, "checking policy").await
    }

    async fn list_all_objects(&self, filter: &Policy) -> AppResult<Vec<String>> {
        let url = self.endpoint("/v1/policies/objects");
        let response = self
            .post_with_retry(|client| client.post(url.as_str()).json(filter))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(AppError::Internal(format!(
                "listing policy objects failed with status {status}: {body}"
            )));
        }

        let parsed: ObjectsResponse = response.json().await.map_err(|error| {
            AppError::Internal(format!("malformed policy objects response: {error}"))
        })?;

        Ok(parsed.objects)
    }
}
