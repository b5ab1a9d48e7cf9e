//! Knowledge lookup providers: a live web-search client and the curated
//! fallback.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use shared_types::{KnowledgeLookupProvider, KnowledgeSource, LookupFilters, ProviderError};

use crate::authorities::{allowed_domains, curated_sources};

const MAX_RESULTS: usize = 5;

lazy_static! {
    static ref HOST_RE: Regex = Regex::new(r"^https?://([^/]+)").unwrap();
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_domains: Option<&'a [&'static str]>,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: Option<String>,
}

/// Live web-search client. Results are restricted to the jurisdiction's
/// regulatory domains, URL-deduplicated, and capped at five; an error or
/// an empty answer falls back to the curated authority table so lookup
/// never blocks the pipeline.
#[derive(Debug, Clone)]
pub struct KnowledgeSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl KnowledgeSearch {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn live_search(
        &self,
        query: &str,
        filters: &LookupFilters,
    ) -> Result<Vec<KnowledgeSource>, ProviderError> {
        let domains = allowed_domains(filters.jurisdiction.as_deref());
        let request = SearchRequest {
            query,
            include_domains: if domains.is_empty() { None } else { Some(domains) },
            max_results: MAX_RESULTS,
        };

        let response = self
            .client
            .post(format!("{}/search", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status: status.as_u16(), message });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(filter_results(body.results, domains))
    }
}

fn filter_results(results: Vec<SearchResult>, domains: &[&str]) -> Vec<KnowledgeSource> {
    let mut seen = std::collections::HashSet::new();
    let mut sources = Vec::new();
    for result in results {
        let url = result.url.trim().to_string();
        if url.is_empty() || !seen.insert(url.clone()) {
            continue;
        }
        if !domains.is_empty() && !host_allowed(&url, domains) {
            tracing::debug!(%url, "dropping search result outside the allowed domains");
            continue;
        }
        let name = if result.title.trim().is_empty() {
            url.clone()
        } else {
            result.title.trim().to_string()
        };
        sources.push(KnowledgeSource { name, url, excerpt: result.content });
        if sources.len() >= MAX_RESULTS {
            break;
        }
    }
    sources
}

fn host_allowed(url: &str, domains: &[&str]) -> bool {
    let Some(captures) = HOST_RE.captures(url) else {
        return false;
    };
    let host = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    domains
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

#[async_trait]
impl KnowledgeLookupProvider for KnowledgeSearch {
    async fn search(
        &self,
        query: &str,
        filters: &LookupFilters,
    ) -> Result<Vec<KnowledgeSource>, ProviderError> {
        match self.live_search(query, filters).await {
            Ok(sources) if !sources.is_empty() => Ok(sources),
            Ok(_) => {
                tracing::info!("live search returned nothing; using curated authorities");
                Ok(curated_sources(filters.jurisdiction.as_deref()))
            }
            Err(error) => {
                tracing::warn!(%error, "live search failed; using curated authorities");
                Ok(curated_sources(filters.jurisdiction.as_deref()))
            }
        }
    }
}

/// Lookup provider for deployments with no live search configured: the
/// curated table is the whole answer.
#[derive(Debug, Clone, Default)]
pub struct CuratedLookup;

#[async_trait]
impl KnowledgeLookupProvider for CuratedLookup {
    async fn search(
        &self,
        _query: &str,
        filters: &LookupFilters,
    ) -> Result<Vec<KnowledgeSource>, ProviderError> {
        Ok(curated_sources(filters.jurisdiction.as_deref()))
    }
}
