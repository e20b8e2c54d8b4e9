//! Brand New Day: JSON fund list and a paginated form-POST quote service.

use super::util::{fetch_body, slugify};
use crate::core::{Cache, Fund, Quote, QuoteError, QuoteProvider, Resource};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, error, instrument};

/// Rate dates arrive as `/Date(1616284800000)/`, epoch milliseconds.
static RATE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/Date\((-?[0-9]+)\)/").expect("rate date regex must compile"));

pub const PAGE_SIZE: u32 = 60;
/// Earliest date requested from the quote service.
pub const HISTORY_START: &str = "01-01-2010";

pub struct BrandNewDayProvider {
    base_url: String,
    client: Client,
    funds: Arc<dyn Cache<String, Fund>>,
    quotes: Arc<dyn Cache<String, Vec<Quote>>>,
}

#[derive(Debug, Deserialize)]
struct FundsEnvelope {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FundEntry {
    /// Sent as a number or a string depending on the endpoint version.
    #[serde(rename = "Key")]
    key: serde_json::Value,
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct NavPage {
    #[serde(rename = "Data")]
    data: Vec<NavValue>,
}

#[derive(Debug, Deserialize)]
struct NavValue {
    #[serde(rename = "LastRate")]
    last_rate: f64,
    #[serde(rename = "RateDate")]
    rate_date: String,
}

impl BrandNewDayProvider {
    pub fn new(
        base_url: &str,
        client: Client,
        funds: Arc<dyn Cache<String, Fund>>,
        quotes: Arc<dyn Cache<String, Vec<Quote>>>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            funds,
            quotes,
        }
    }

    fn endpoint(&self, service: &str) -> String {
        format!("{}/{}/", self.base_url, service)
    }

    #[instrument(name = "BrandNewDayFundsFetch", skip(self))]
    async fn fetch_funds(&self) -> Result<(), QuoteError> {
        let request = self.client.get(self.endpoint("getfundsnew"));
        let body = fetch_body(request, Resource::Funds).await?;
        let funds = parse_funds(&body).inspect_err(|e| error!(error = %e, "Unusable fund list"))?;

        // the fund list changed underneath any cached pages
        self.quotes.clear().await;
        self.funds.clear().await;

        debug!("Fetched {} funds", funds.len());
        for fund in funds {
            self.funds.put(fund.id.clone(), fund).await;
        }
        Ok(())
    }

    #[instrument(name = "BrandNewDayQuotesFetch", skip(self))]
    async fn fetch_quotes(&self, fund_id: &str, page: i64) -> Result<Vec<Quote>, QuoteError> {
        let end_date = Local::now().date_naive().format("%d-%m-%Y").to_string();
        let form = [
            ("page", page.to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
            ("fundId", fund_id.to_string()),
            ("startDate", HISTORY_START.to_string()),
            ("endDate", end_date),
        ];
        let request = self.client.post(self.endpoint("navvaluesforfund")).form(&form);
        let body = fetch_body(request, Resource::Quotes).await?;

        parse_quotes(&body).inspect_err(|e| error!(error = %e, "Unusable quote page"))
    }
}

pub fn cache_key(fund_id: &str, page: i64) -> String {
    format!("{fund_id}@{page}")
}

/// The fund list is a JSON document whose `Message` field is itself a
/// JSON-encoded array of `{Key, Value}` pairs.
pub fn parse_funds(body: &str) -> Result<Vec<Fund>, QuoteError> {
    let envelope: FundsEnvelope = serde_json::from_str(body)
        .map_err(|e| QuoteError::parse(Resource::Funds, e.to_string()))?;
    let entries: Vec<FundEntry> = serde_json::from_str(&envelope.message)
        .map_err(|e| QuoteError::parse(Resource::Funds, e.to_string()))?;

    Ok(entries
        .into_iter()
        .map(|entry| {
            let id = match entry.key {
                serde_json::Value::String(id) => id,
                other => other.to_string(),
            };
            Fund::new(id, slugify(&entry.value))
        })
        .collect())
}

pub fn parse_quotes(body: &str) -> Result<Vec<Quote>, QuoteError> {
    let page: NavPage = serde_json::from_str(body)
        .map_err(|e| QuoteError::parse(Resource::Quotes, e.to_string()))?;

    page.data
        .into_iter()
        .map(|nav| parse_rate_date(&nav.rate_date).map(|date| Quote::new(date, nav.last_rate)))
        .collect()
}

/// Converts `/Date(<epoch ms>)/` into a UTC calendar datetime.
pub fn parse_rate_date(raw: &str) -> Result<NaiveDateTime, QuoteError> {
    let millis: i64 = RATE_DATE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| QuoteError::parse(Resource::Quotes, format!("Unexpected rate date: {raw}")))?;

    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| QuoteError::parse(Resource::Quotes, format!("Rate date out of range: {raw}")))
}

#[async_trait]
impl QuoteProvider for BrandNewDayProvider {
    fn name(&self) -> &'static str {
        "brandnewday"
    }

    async fn list_funds(&self) -> Result<Vec<Fund>, QuoteError> {
        if self.funds.is_empty().await {
            self.fetch_funds().await?;
        }
        Ok(self.funds.values().await)
    }

    async fn list_quotes(
        &self,
        fund_name: &str,
        page: Option<i64>,
    ) -> Result<Vec<Quote>, QuoteError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(QuoteError::InvalidPage(page));
        }

        let fund = self
            .list_funds()
            .await?
            .into_iter()
            .find(|f| f.matches(fund_name))
            .ok_or_else(|| QuoteError::NotFound(fund_name.to_string()))?;

        let key = cache_key(&fund.id, page);
        if let Some(cached) = self.quotes.get(&key).await {
            return Ok(cached);
        }

        let quotes = self.fetch_quotes(&fund.id, page).await?;
        self.quotes.put(key, quotes.clone()).await;
        Ok(quotes)
    }
}
