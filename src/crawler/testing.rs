//! Test doubles for the crawler

use crate::config::ScrapeConfig;
use crate::crawler::fetcher::{PageFetcher, RawContent, Readiness};
use crate::{FetchError, FetchErrorKind};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// One scripted response
#[derive(Debug, Clone)]
pub enum Reply {
    Page(String),
    Fail(FetchErrorKind),
}

/// A [`PageFetcher`] answering from a per-URL script
///
/// Replies for a URL are consumed in order; the last one repeats. Unknown
/// URLs answer `NotFound`. Every call is recorded with its start time.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, url: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
        self
    }

    pub fn page(self, url: &str, body: String) -> Self {
        self.script(url, vec![Reply::Page(body)])
    }

    pub fn fail(self, url: &str, kind: FetchErrorKind) -> Self {
        self.script(url, vec![Reply::Fail(kind)])
    }

    /// Recorded calls as `(url, start time)`, in call order
    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .count()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        url: &Url,
        _readiness: &Readiness,
        _config: &ScrapeConfig,
    ) -> Result<RawContent, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            scripts.get_mut(url.as_str()).and_then(|replies| {
                if replies.len() > 1 {
                    replies.pop_front()
                } else {
                    replies.front().cloned()
                }
            })
        };

        match reply {
            Some(Reply::Page(body)) => Ok(RawContent {
                requested_url: url.clone(),
                final_url: url.clone(),
                status: 200,
                body,
            }),
            Some(Reply::Fail(kind)) => Err(FetchError::new(kind, url.as_str(), "scripted failure")),
            None => Err(FetchError::new(
                FetchErrorKind::NotFound,
                url.as_str(),
                "no script for URL",
            )
            .with_status(404)),
        }
    }
}

/// A Clien board listing page linking the given post ids
pub fn clien_listing(ids: &[u32]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="list_item symph_row"><a class="list_subject" href="/service/board/park/{id}">post {id}</a></div>"#
            )
        })
        .collect();
    format!(r#"<html><body><div class="list_content">{items}</div></body></html>"#)
}

/// A minimal Clien post page
pub fn clien_post(title: &str) -> String {
    format!(
        r#"<html><body><div class="post_view">
            <h3 class="post_subject"><span>{title}</span></h3>
            <div class="post_info"><span class="nickname">writer</span></div>
            <div class="post_article"><p>body of {title}</p></div>
        </div></body></html>"#
    )
}

/// A Clien post page missing its title
pub fn clien_post_without_title() -> String {
    r#"<html><body><div class="post_view">
        <div class="post_info"><span class="nickname">writer</span></div>
        <div class="post_article"><p>orphaned body</p></div>
    </div></body></html>"#
        .to_string()
}
