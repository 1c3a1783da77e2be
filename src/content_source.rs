use std::future::Future;

use crate::{config::AppConfig, document::TopicDocument, log_util};
use color_eyre::eyre::{Context, Result, eyre};
use reqwest::{Client, header::ACCEPT};
use serde::{Deserialize, de::DeserializeOwned};

/// A single entry returned by the hosting API's "list directory contents" endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryEntry {
    #[serde(default)]
    pub name: String,
    /// `null` for directories and submodules.
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Where topic listings and topic documents come from.
pub trait ContentSource {
    /// Fetch the raw directory listing that holds the topic documents.
    fn list_directory(&self) -> impl Future<Output = Result<Vec<DirectoryEntry>>> + Send;

    /// Fetch and parse the topic document stored at `location`.
    fn fetch_document(&self, location: &str) -> impl Future<Output = Result<TopicDocument>> + Send;
}

/// [`ContentSource`] backed by plain HTTP GET requests.
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    client: Client,
    catalog_url: String,
}

impl HttpContentSource {
    pub fn new(catalog_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .wrap_err("failed to build HTTP client")?;
        Ok(Self {
            client,
            catalog_url: catalog_url.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.catalog_url.clone(), &config.user_agent)
    }

    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log_util::log_debug(&format!("HttpContentSource: GET {}", url));
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .wrap_err_with(|| format!("failed to request {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|err| format!("<failed to read body: {}>", err));
            log_util::log_debug(&format!(
                "HttpContentSource: {} returned {}: {}",
                url, status, body
            ));
            return Err(eyre!("{} returned {}", url, status));
        }

        response
            .json()
            .await
            .wrap_err_with(|| format!("failed to parse response from {} as JSON", url))
    }
}

impl ContentSource for HttpContentSource {
    async fn list_directory(&self) -> Result<Vec<DirectoryEntry>> {
        self.get_json(&self.catalog_url).await
    }

    async fn fetch_document(&self, location: &str) -> Result<TopicDocument> {
        self.get_json(location).await
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::{
        collections::HashMap,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    /// In-memory source used by tests. Unknown locations fail like a 404.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct FakeSource {
        listing: Option<Vec<DirectoryEntry>>,
        documents: HashMap<String, TopicDocument>,
        fetches: Arc<AtomicUsize>,
    }

    impl FakeSource {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_entry(mut self, name: &str, download_url: Option<&str>) -> Self {
            self.listing
                .get_or_insert_with(Vec::new)
                .push(DirectoryEntry {
                    name: name.to_string(),
                    download_url: download_url.map(str::to_string),
                });
            self
        }

        pub(crate) fn with_file(self, name: &str) -> Self {
            let location = Self::location(name);
            self.with_entry(name, Some(&location))
        }

        pub(crate) fn with_document(mut self, name: &str, document: TopicDocument) -> Self {
            self.documents.insert(Self::location(name), document);
            self
        }

        pub(crate) fn location(name: &str) -> String {
            format!("https://raw.example.test/data/{name}")
        }

        pub(crate) fn document_fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl ContentSource for FakeSource {
        async fn list_directory(&self) -> Result<Vec<DirectoryEntry>> {
            self.listing
                .clone()
                .ok_or_else(|| eyre!("listing unavailable"))
        }

        async fn fetch_document(&self, location: &str) -> Result<TopicDocument> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.documents
                .get(location)
                .cloned()
                .ok_or_else(|| eyre!("{} returned 404 Not Found", location))
        }
    }
}
