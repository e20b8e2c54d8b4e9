//! Zwitserleven: a single price table listing every fund with its latest
//! price. One fetch fills both the fund list and all quotes.

use super::util::{clean_fund_name, fetch_body};
use crate::core::{Cache, Fund, Quote, QuoteError, QuoteProvider, Resource};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, error, instrument};

const PRICE_DATE_FORMAT: &str = "%d-%m-%Y";

pub struct ZwitserlevenProvider {
    url: String,
    client: Client,
    // slug -> the single displayed quote
    quotes: Arc<dyn Cache<String, Vec<Quote>>>,
}

impl ZwitserlevenProvider {
    pub fn new(url: &str, client: Client, quotes: Arc<dyn Cache<String, Vec<Quote>>>) -> Self {
        Self {
            url: url.to_string(),
            client,
            quotes,
        }
    }

    #[instrument(name = "ZwitserlevenFetch", skip(self))]
    async fn fetch_funds(&self) -> Result<(), QuoteError> {
        let body = fetch_body(self.client.get(&self.url), Resource::Funds).await?;
        let rows =
            parse_price_table(&body).inspect_err(|e| error!(error = %e, "Unusable price table"))?;

        self.quotes.clear().await;

        debug!("Fetched {} funds", rows.len());
        for (slug, quote) in rows {
            self.quotes.put(slug, vec![quote]).await;
        }
        Ok(())
    }

    async fn ensure_loaded(&self) -> Result<(), QuoteError> {
        if self.quotes.is_empty().await {
            self.fetch_funds().await?;
        }
        Ok(())
    }
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Parses a decimal-comma price such as `64,25`.
pub fn parse_price(raw: &str) -> Result<f64, QuoteError> {
    raw.trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| QuoteError::parse(Resource::Funds, format!("Unexpected price: {raw}")))
}

/// One `(slug, quote)` pair per `tr.showFonds` row, in page order.
pub fn parse_price_table(html: &str) -> Result<Vec<(String, Quote)>, QuoteError> {
    let document = Html::parse_document(html);
    let selector = |css: &str| {
        Selector::parse(css).map_err(|e| QuoteError::parse(Resource::Funds, e.to_string()))
    };
    let row_selector = selector("tr.showFonds")?;
    let name_selector = selector("a")?;
    let price_selector = selector("td.koers")?;

    document
        .select(&row_selector)
        .map(|row| -> Result<(String, Quote), QuoteError> {
            let name = row
                .select(&name_selector)
                .next()
                .map(|link| cell_text(&link))
                .ok_or_else(|| QuoteError::parse(Resource::Funds, "Fund row without name"))?;
            let cells: Vec<String> = row.select(&price_selector).map(|c| cell_text(&c)).collect();
            let [price, date, ..] = cells.as_slice() else {
                return Err(QuoteError::parse(
                    Resource::Funds,
                    format!("Fund row {name} lacks price or date"),
                ));
            };

            let close = parse_price(price)?;
            let date = NaiveDate::parse_from_str(date, PRICE_DATE_FORMAT)
                .map_err(|e| QuoteError::parse(Resource::Funds, format!("Bad date {date}: {e}")))?
                .and_time(chrono::NaiveTime::MIN);

            Ok((clean_fund_name(&name), Quote::new(date, close)))
        })
        .collect()
}

#[async_trait]
impl QuoteProvider for ZwitserlevenProvider {
    fn name(&self) -> &'static str {
        "zwitserleven"
    }

    async fn list_funds(&self) -> Result<Vec<Fund>, QuoteError> {
        self.ensure_loaded().await?;
        Ok(self
            .quotes
            .keys()
            .await
            .into_iter()
            .map(Fund::from_slug)
            .collect())
    }

    async fn list_quotes(
        &self,
        fund_name: &str,
        _page: Option<i64>,
    ) -> Result<Vec<Quote>, QuoteError> {
        self.ensure_loaded().await?;

        let slug = fund_name.trim().to_lowercase();
        self.quotes
            .get(&slug)
            .await
            .ok_or_else(|| QuoteError::NotFound(fund_name.to_string()))
    }
}
