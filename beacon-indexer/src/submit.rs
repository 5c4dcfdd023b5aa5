use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Publish endpoint of the indexing API.
pub const DEFAULT_ENDPOINT: &str = "https://indexing.googleapis.com/v3/urlNotifications:publish";

/// Client-side pacing: wait after every item, and take a longer break after
/// every batch. The provider allows 200 requests per day.
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(10);
pub const DEFAULT_BATCH_SIZE: usize = 50;

pub type ProgressCallback = Arc<dyn Fn(usize, &SubmissionResult) + Send + Sync>;

/// Outcome of a single URL submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// The endpoint accepted the notification.
    Accepted,
    /// The endpoint answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The request never completed (connection refused, timeout, ...).
    Transport { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub url: String,
    pub outcome: SubmitOutcome,
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SubmitOutcome::Accepted)
    }

    pub fn failure_message(&self) -> Option<String> {
        match &self.outcome {
            SubmitOutcome::Accepted => None,
            SubmitOutcome::Rejected { status, message } if message.is_empty() => {
                Some(format!("HTTP {}", status))
            }
            SubmitOutcome::Rejected { status, message } => {
                Some(format!("HTTP {}: {}", status, message))
            }
            SubmitOutcome::Transport { message } => Some(message.clone()),
        }
    }
}

/// Tally of a submission run. Success and failure always sum to the number of
/// URLs that went in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub success_count: usize,
    pub failed_count: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.success_count + self.failed_count
    }

    fn record(&mut self, result: &SubmissionResult) {
        if result.is_success() {
            self.success_count += 1;
        } else {
            self.failed_count += 1;
        }
    }
}

/// Thin client for the URL notification endpoint.
pub struct IndexingClient {
    client: Client,
    endpoint: String,
}

impl IndexingClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("Beacon/0.1 (https://github.com/trapdoorsec/beacon)")
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Publish an "URL updated" notification for a single URL.
    ///
    /// Never returns an error: every failure mode is captured as a typed
    /// outcome so the caller's loop can carry on.
    pub async fn publish_update(&self, access_token: &str, url: &str) -> SubmitOutcome {
        debug!("Publishing update notification for {}", url);

        let body = json!({
            "url": url,
            "type": "URL_UPDATED",
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => SubmitOutcome::Accepted,
            Ok(response) => {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                SubmitOutcome::Rejected { status, message }
            }
            Err(e) => SubmitOutcome::Transport {
                message: e.to_string(),
            },
        }
    }
}

impl Default for IndexingClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Submits URLs strictly in order with client-side pacing.
pub struct Submitter {
    client: IndexingClient,
    item_delay: Duration,
    batch_pause: Duration,
    batch_size: usize,
    progress_callback: Option<ProgressCallback>,
}

impl Submitter {
    pub fn new(client: IndexingClient) -> Self {
        Self {
            client,
            item_delay: DEFAULT_ITEM_DELAY,
            batch_pause: DEFAULT_BATCH_PAUSE,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_callback: None,
        }
    }

    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Submit every URL in order. One bad URL never stops the run.
    pub async fn submit_all(
        &self,
        access_token: &str,
        urls: &[String],
    ) -> (Vec<SubmissionResult>, RunSummary) {
        let mut results = Vec::with_capacity(urls.len());
        let mut summary = RunSummary::default();

        for (index, url) in urls.iter().enumerate() {
            let outcome = self.client.publish_update(access_token, url).await;
            let result = SubmissionResult {
                url: url.clone(),
                outcome,
            };

            if !result.is_success() {
                warn!(
                    "Submission failed for {}: {}",
                    url,
                    result.failure_message().unwrap_or_default()
                );
            }

            summary.record(&result);
            if let Some(ref callback) = self.progress_callback {
                callback(index, &result);
            }
            results.push(result);

            tokio::time::sleep(self.item_delay).await;

            if self.batch_size > 0 && (index + 1) % self.batch_size == 0 {
                debug!("Pausing after {} submissions", index + 1);
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        (results, summary)
    }
}
