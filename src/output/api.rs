//! HTTP forwarding of scraped posts

use crate::model::Post;
use crate::output::traits::{PostSink, SinkError, SinkResult};
use crate::sites::Site;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// JSON body sent for each post
#[derive(Debug, Serialize)]
struct ForwardPayload<'a> {
    site: Site,
    scraped_at: String,
    post: &'a Post,
}

/// POSTs every accepted post as JSON to a configured endpoint
#[derive(Debug, Clone)]
pub struct ApiForwarder {
    client: reqwest::Client,
    endpoint: Url,
}

impl ApiForwarder {
    /// Creates a forwarder for `endpoint`
    ///
    /// # Arguments
    ///
    /// * `endpoint` - URL receiving the POST requests
    /// * `timeout` - Budget for each request
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("board-harvest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PostSink for ApiForwarder {
    fn name(&self) -> &str {
        "api"
    }

    async fn accept(&self, post: &Post) -> SinkResult<()> {
        let payload = ForwardPayload {
            site: post.site,
            scraped_at: Utc::now().to_rfc3339(),
            post,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }

        debug!("Forwarded {}/{} [{}]", post.site, post.post_id, status);
        Ok(())
    }
}
