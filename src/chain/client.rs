use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Local, NaiveDate};
use log::{debug, info};
use serde_json::Value;
use url::Url;

use super::graph::Chain;
use super::transactions::{Transaction, decode_transactions};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// First day of the current month through today.
    pub fn current_month() -> Self {
        let today = Local::now().date_naive();
        let start = today.with_day(1).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("start_date", self.start.format(DATE_FORMAT).to_string()),
            ("end_date", self.end.format(DATE_FORMAT).to_string()),
        ]
    }
}

/// Parameters of a root-address network search.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkQuery {
    pub chain: Chain,
    pub address: String,
    pub depth: u8,
    pub range: DateRange,
    pub min_amount: Option<f64>,
}

/// The backend the explorer reads from. Implemented over HTTP by [`ApiClient`].
pub trait NetworkSource: Send + Sync {
    fn network(&self, query: &NetworkQuery) -> Result<Value>;

    fn network_between(&self, query: &NetworkQuery, second_address: &str) -> Result<Value>;

    fn transactions(&self, chain: Chain, address: &str, range: DateRange)
    -> Result<Vec<Transaction>>;

    fn transactions_between(
        &self,
        chain: Chain,
        address: &str,
        second_address: &str,
        range: DateRange,
    ) -> Result<Vec<Transaction>>;
}

pub struct ApiClient {
    base_url: Url,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid API base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL cannot carry a path: {base_url}"));
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, resource: &str, chain: Chain, address: &str) -> Result<Url> {
        endpoint_url(&self.base_url, resource, chain, address)
    }

    fn get_json(&self, url: Url) -> Result<Value> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url.clone())
            .send()
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        let body = response
            .text()
            .with_context(|| format!("failed to read response body from {url}"))?;

        if !status.is_success() {
            return Err(anyhow!("{status}: {}", error_message(&body)));
        }

        serde_json::from_str(&body).with_context(|| format!("invalid JSON from {url}"))
    }

    fn get_transactions(&self, url: Url) -> Result<Vec<Transaction>> {
        let raw = self.get_json(url)?;
        let transactions =
            decode_transactions(raw).context("unexpected transaction list shape")?;
        info!("received {} transactions", transactions.len());
        Ok(transactions)
    }
}

pub(crate) fn endpoint_url(base: &Url, resource: &str, chain: Chain, address: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| anyhow!("API base URL cannot carry a path: {base}"))?
        .pop_if_empty()
        .extend([resource, chain.as_str(), address]);
    Ok(url)
}

pub(crate) fn network_url(base: &Url, query: &NetworkQuery, second_address: Option<&str>) -> Result<Url> {
    let mut url = endpoint_url(base, "network", query.chain, &query.address)?;
    {
        let mut pairs = url.query_pairs_mut();
        match second_address {
            Some(second) => {
                pairs.append_pair("second_address", second);
            }
            None => {
                pairs.append_pair("depth", &query.depth.to_string());
            }
        }
        for (key, value) in query.range.query_pairs() {
            pairs.append_pair(key, &value);
        }
        if let Some(min_amount) = query.min_amount {
            pairs.append_pair("min_amount", &min_amount.to_string());
        }
    }
    Ok(url)
}

pub(crate) fn transactions_url(
    base: &Url,
    chain: Chain,
    address: &str,
    second_address: Option<&str>,
    range: DateRange,
) -> Result<Url> {
    let mut url = endpoint_url(base, "transactions", chain, address)?;
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(second) = second_address {
            pairs.append_pair("second_address", second);
        }
        for (key, value) in range.query_pairs() {
            pairs.append_pair(key, &value);
        }
    }
    Ok(url)
}

/// Human-readable message from an error body (`detail`, `message` or `error`), else the body.
pub(crate) fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let field = parsed.as_ref().and_then(|value| {
        ["detail", "message", "error"]
            .iter()
            .find_map(|key| value.get(*key))
    });

    match field {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None if body.trim().is_empty() => "empty response body".to_owned(),
        None => body.trim().to_owned(),
    }
}

impl NetworkSource for ApiClient {
    fn network(&self, query: &NetworkQuery) -> Result<Value> {
        info!(
            "fetching {} network for {} (depth {})",
            query.chain.as_str(),
            query.address,
            query.depth
        );
        self.get_json(network_url(&self.base_url, query, None)?)
            .with_context(|| format!("failed to fetch network for {}", query.address))
    }

    fn network_between(&self, query: &NetworkQuery, second_address: &str) -> Result<Value> {
        info!(
            "fetching {} network between {} and {second_address}",
            query.chain.as_str(),
            query.address
        );
        self.get_json(network_url(&self.base_url, query, Some(second_address))?)
            .with_context(|| {
                format!(
                    "failed to fetch network between {} and {second_address}",
                    query.address
                )
            })
    }

    fn transactions(
        &self,
        chain: Chain,
        address: &str,
        range: DateRange,
    ) -> Result<Vec<Transaction>> {
        let url = transactions_url(&self.base_url, chain, address, None, range)?;
        self.get_transactions(url)
            .with_context(|| format!("failed to fetch transactions for {address}"))
    }

    fn transactions_between(
        &self,
        chain: Chain,
        address: &str,
        second_address: &str,
        range: DateRange,
    ) -> Result<Vec<Transaction>> {
        let url = transactions_url(&self.base_url, chain, address, Some(second_address), range)?;
        self.get_transactions(url).with_context(|| {
            format!("failed to fetch transactions between {address} and {second_address}")
        })
    }
}
