//! Airtable ledger source.
//!
//! Reads the whole operations table page by page, following the `offset`
//! cursor until the API stops returning one.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use ledgerfolio_core::errors::{LedgerError, Result};
use ledgerfolio_core::ledger::{LedgerSource, LedgerTier};
use ledgerfolio_core::operations::LedgerRecord;

use crate::config::AirtableConfig;

const BASE_URL: &str = "https://api.airtable.com/v0";
const PAGE_SIZE: &str = "100";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Stops a misbehaving cursor from looping forever.
const MAX_PAGES: usize = 1_000;
const SOURCE_NAME: &str = "airtable";

#[derive(Debug, Deserialize)]
struct RecordsPage {
    #[serde(default)]
    records: Vec<LedgerRecord>,
    #[serde(default)]
    offset: Option<String>,
}

pub struct AirtableSource {
    client: Client,
    url: String,
    api_key: String,
}

impl AirtableSource {
    pub fn new(config: &AirtableConfig) -> Self {
        Self::with_base_url(config, BASE_URL)
    }

    pub fn with_base_url(config: &AirtableConfig, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            url: table_url(base_url, &config.base_id, &config.table_name),
            api_key: config.api_key.clone(),
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| unavailable(format!("invalid API key header: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    async fn fetch_page(&self, offset: Option<&str>) -> Result<RecordsPage> {
        let response = self
            .client
            .get(&self.url)
            .headers(self.headers()?)
            .query(&page_params(offset))
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("Airtable responded {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        parse_page(&body)
    }
}

#[async_trait]
impl LedgerSource for AirtableSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn tier(&self) -> LedgerTier {
        LedgerTier::Live
    }

    async fn fetch_records(&self) -> Result<Vec<LedgerRecord>> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        for page_number in 1..=MAX_PAGES {
            let page = self.fetch_page(offset.as_deref()).await?;
            debug!(
                "Airtable page {}: {} records",
                page_number,
                page.records.len()
            );
            records.extend(page.records);
            offset = page.offset;
            if offset.is_none() {
                break;
            }
        }

        info!("Fetched {} records from Airtable", records.len());
        Ok(records)
    }
}

fn table_url(base_url: &str, base_id: &str, table_name: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        base_id,
        urlencoding::encode(table_name)
    )
}

/// Query of one page, sorted by date ascending.
fn page_params(offset: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("pageSize", PAGE_SIZE.to_string()),
        ("sort[0][field]", "Date".to_string()),
        ("sort[0][direction]", "asc".to_string()),
    ];
    if let Some(offset) = offset {
        params.push(("offset", offset.to_string()));
    }
    params
}

fn parse_page(body: &str) -> Result<RecordsPage> {
    serde_json::from_str(body)
        .map_err(|e| unavailable(format!("unreadable Airtable page: {e}")))
}

fn unavailable(message: String) -> ledgerfolio_core::Error {
    LedgerError::SourceUnavailable {
        source_name: SOURCE_NAME.to_string(),
        message,
    }
    .into()
}
