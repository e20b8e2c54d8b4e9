//! Meesman: fund overview page and per-fund pages with inline chart data.

use super::util::fetch_body;
use crate::core::{Cache, Fund, Quote, QuoteError, QuoteProvider, Resource};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, error, instrument, warn};

/// Chart series embedded in the fund page scripts, e.g. `data: [{"x":..,"y":..}]`.
static CHART_DATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data:\s(\[\{.*\}+\])").expect("chart data regex must compile"));

const CHART_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct MeesmanProvider {
    base_url: String,
    client: Client,
    funds: Arc<dyn Cache<String, Fund>>,
    quotes: Arc<dyn Cache<String, Vec<Quote>>>,
}

#[derive(Debug, Deserialize)]
struct ChartPoint {
    x: String,
    y: f64,
}

impl MeesmanProvider {
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

    #[instrument(name = "MeesmanFundsFetch", skip(self))]
    async fn fetch_funds(&self) -> Result<(), QuoteError> {
        let request = self.client.get(format!("{}/", self.base_url));
        let body = fetch_body(request, Resource::Funds).await?;
        let slugs =
            parse_fund_slugs(&body).inspect_err(|e| error!(error = %e, "Unusable fund overview"))?;

        self.quotes.clear().await;
        self.funds.clear().await;

        debug!("Fetched {} funds", slugs.len());
        for slug in slugs {
            self.funds.put(slug.clone(), Fund::from_slug(slug)).await;
        }
        Ok(())
    }

    #[instrument(name = "MeesmanQuotesFetch", skip(self))]
    async fn fetch_quotes(&self, slug: &str) -> Result<Vec<Quote>, QuoteError> {
        let request = self.client.get(format!("{}/{}/", self.base_url, slug));
        let body = fetch_body(request, Resource::Quotes).await?;

        let quotes =
            parse_quotes(&body).inspect_err(|e| error!(error = %e, "Unusable chart data"))?;
        if quotes.is_empty() {
            warn!("No chart data found on fund page");
        }
        Ok(quotes)
    }
}

/// Fund slugs from the overview table. Only the first link of each
/// `td.fund-name` cell names the fund; its slug is the third `/`-separated
/// segment of the link path, as in `/onze-fondsen/<slug>/`.
pub fn parse_fund_slugs(html: &str) -> Result<Vec<String>, QuoteError> {
    let document = Html::parse_document(html);
    let cell_selector = Selector::parse("td.fund-name")
        .map_err(|e| QuoteError::parse(Resource::Funds, e.to_string()))?;
    let link_selector = Selector::parse("a[href]")
        .map_err(|e| QuoteError::parse(Resource::Funds, e.to_string()))?;

    Ok(document
        .select(&cell_selector)
        .filter_map(|cell| cell.select(&link_selector).next())
        .filter_map(|link| link.value().attr("href"))
        .filter_map(slug_from_href)
        .collect())
}

fn slug_from_href(href: &str) -> Option<String> {
    // absolute links carry scheme and host in front of the path
    let path = match href.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
        None => href,
    };
    path.split('/')
        .nth(2)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Concatenates every inline chart series on a fund page.
pub fn parse_quotes(html: &str) -> Result<Vec<Quote>, QuoteError> {
    let mut quotes = Vec::new();
    for caps in CHART_DATA.captures_iter(html) {
        let points: Vec<ChartPoint> = serde_json::from_str(&caps[1])
            .map_err(|e| QuoteError::parse(Resource::Quotes, e.to_string()))?;
        for point in points {
            let date = NaiveDateTime::parse_from_str(&point.x, CHART_DATE_FORMAT).map_err(|e| {
                QuoteError::parse(Resource::Quotes, format!("Bad chart date {}: {e}", point.x))
            })?;
            quotes.push(Quote::new(date, point.y));
        }
    }
    Ok(quotes)
}

#[async_trait]
impl QuoteProvider for MeesmanProvider {
    fn name(&self) -> &'static str {
        "meesman"
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
        _page: Option<i64>,
    ) -> Result<Vec<Quote>, QuoteError> {
        let fund = self
            .list_funds()
            .await?
            .into_iter()
            .find(|f| f.matches(fund_name))
            .ok_or_else(|| QuoteError::NotFound(fund_name.to_string()))?;

        if let Some(cached) = self.quotes.get(&fund.id).await {
            return Ok(cached);
        }

        let quotes = self.fetch_quotes(&fund.id).await?;
        self.quotes.put(fund.id, quotes.clone()).await;
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCache;
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FUNDS_PAGE: &str = r#"<html><table>
    <tr>
        <td class="fund-name"><a href="/onze-fondsen/aandelen-wereldwijd-totaal/">Aandelen Wereldwijd Totaal</a></td>
    </tr>
    <tr>
        <td class="fund-name"><a href="/onze-fondsen/aandelen-ontwikkelde-landen/">Aandelen Ontwikkelde Landen</a></td>
    </tr>
    <tr>
        <td class="fund-name"><a href="/onze-fondsen/aandelen-opkomende-landen/">Aandelen Opkomende Landen</a></td>
    </tr>
    </table></html>"#;

    const FUND_PAGE: &str = r#"data: [{"x":"2021-01-01T00:00:00","y":10},{"x":"2021-01-02T00:00:00","y":10.50},{"x":"2021-01-03T00:00:00","y":11}]"#;

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn expected_quotes() -> Vec<Quote> {
        vec![
            Quote::new(midnight(2021, 1, 1), 10.0),
            Quote::new(midnight(2021, 1, 2), 10.5),
            Quote::new(midnight(2021, 1, 3), 11.0),
        ]
    }

    struct Fixture {
        server: MockServer,
        funds: Arc<MemoryCache<String, Fund>>,
        quotes: Arc<MemoryCache<String, Vec<Quote>>>,
        provider: MeesmanProvider,
    }

    async fn fixture() -> Fixture {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onze-fondsen/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FUNDS_PAGE))
            .mount(&server)
            .await;

        let funds: Arc<MemoryCache<String, Fund>> = Arc::new(MemoryCache::default());
        let quotes: Arc<MemoryCache<String, Vec<Quote>>> = Arc::new(MemoryCache::default());
        let provider = MeesmanProvider::new(
            &format!("{}/onze-fondsen", server.uri()),
            Client::new(),
            funds.clone(),
            quotes.clone(),
        );
        Fixture {
            server,
            funds,
            quotes,
            provider,
        }
    }

    #[test]
    fn test_parse_fund_slugs() {
        assert_eq!(
            parse_fund_slugs(FUNDS_PAGE).unwrap(),
            vec![
                "aandelen-wereldwijd-totaal",
                "aandelen-ontwikkelde-landen",
                "aandelen-opkomende-landen"
            ]
        );
    }

    #[test]
    fn test_parse_fund_slugs_ignores_other_cells() {
        let html = r#"<table><tr><td class="price"><a href="/elders/">x</a></td></tr></table>"#;
        assert!(parse_fund_slugs(html).unwrap().is_empty());
    }

    #[test]
    fn test_parse_fund_slugs_uses_first_link_per_cell() {
        let html = r#"<table><tr><td class="fund-name">
            <a href="/onze-fondsen/aandelen-wereldwijd-totaal/">Aandelen Wereldwijd Totaal</a>
            <a href="/onze-fondsen/aandelen-wereldwijd-totaal/factsheet.pdf">Factsheet</a>
        </td></tr></table>"#;

        assert_eq!(
            parse_fund_slugs(html).unwrap(),
            vec!["aandelen-wereldwijd-totaal"]
        );
    }

    #[test]
    fn test_parse_fund_slugs_from_path_segment() {
        let html = r#"<table>
            <tr><td class="fund-name"><a href="https://www.meesman.nl/onze-fondsen/obligaties-wereldwijd/">Obligaties</a></td></tr>
            <tr><td class="fund-name"><a href="/onze-fondsen/mixfonds-offensief">Mixfonds</a></td></tr>
            <tr><td class="fund-name"><a href="/">Home</a></td></tr>
        </table>"#;

        assert_eq!(
            parse_fund_slugs(html).unwrap(),
            vec!["obligaties-wereldwijd", "mixfonds-offensief"]
        );
    }

    #[test]
    fn test_parse_quotes() {
        assert_eq!(parse_quotes(FUND_PAGE).unwrap(), expected_quotes());
    }

    #[test]
    fn test_parse_quotes_concatenates_series() {
        let html = r#"<script>
            chart1 = { data: [{"x":"2021-01-01T00:00:00","y":10}] };
            chart2 = { data: [{"x":"2021-02-01T00:00:00","y":12.25}] };
        </script>"#;

        assert_eq!(
            parse_quotes(html).unwrap(),
            vec![
                Quote::new(midnight(2021, 1, 1), 10.0),
                Quote::new(midnight(2021, 2, 1), 12.25),
            ]
        );
    }

    #[test]
    fn test_parse_quotes_rejects_malformed_series() {
        let err = parse_quotes(r#"data: [{"x":"01/01/2021","y":10}]"#).unwrap_err();
        assert!(matches!(
            err,
            QuoteError::Parse {
                resource: Resource::Quotes,
                ..
            }
        ));
        assert!(parse_quotes(r#"data: [{"x": oops}]"#).is_err());
    }

    #[tokio::test]
    async fn test_list_funds() {
        let fx = fixture().await;

        let names: Vec<_> = fx
            .provider
            .list_funds()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();

        assert_eq!(
            names,
            vec![
                "aandelen-wereldwijd-totaal",
                "aandelen-ontwikkelde-landen",
                "aandelen-opkomende-landen"
            ]
        );
        assert_eq!(fx.funds.len().await, 3);
    }

    #[tokio::test]
    async fn test_fund_refetch_clears_quote_cache() {
        let fx = fixture().await;
        fx.quotes
            .put("aandelen-wereldwijd-totaal".to_string(), expected_quotes())
            .await;
        assert_eq!(fx.quotes.len().await, 1);

        fx.provider.list_funds().await.unwrap();

        assert!(fx.quotes.is_empty().await);
        assert_eq!(fx.funds.len().await, 3);
    }

    #[tokio::test]
    async fn test_list_quotes_is_cached() {
        let fx = fixture().await;
        Mock::given(method("GET"))
            .and(path("/onze-fondsen/aandelen-wereldwijd-totaal/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FUND_PAGE))
            .expect(1)
            .mount(&fx.server)
            .await;

        assert!(fx.quotes.is_empty().await);
        let first = fx
            .provider
            .list_quotes("aandelen-wereldwijd-totaal", None)
            .await
            .unwrap();
        assert_eq!(first, expected_quotes());
        assert_eq!(fx.quotes.len().await, 1);

        let second = fx
            .provider
            .list_quotes(" Aandelen-Wereldwijd-Totaal", None)
            .await
            .unwrap();
        assert_eq!(second, expected_quotes());
        assert_eq!(
            fx.quotes.get(&"aandelen-wereldwijd-totaal".to_string()).await,
            Some(expected_quotes())
        );
    }

    #[tokio::test]
    async fn test_page_is_ignored() {
        let fx = fixture().await;
        Mock::given(method("GET"))
            .and(path("/onze-fondsen/aandelen-wereldwijd-totaal/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FUND_PAGE))
            .expect(1)
            .mount(&fx.server)
            .await;

        for page in [Some(0), Some(1), Some(7)] {
            let quotes = fx
                .provider
                .list_quotes("aandelen-wereldwijd-totaal", page)
                .await
                .unwrap();
            assert_eq!(quotes, expected_quotes());
        }
    }

    #[tokio::test]
    async fn test_unknown_fund_is_not_found() {
        let fx = fixture().await;

        let err = fx.provider.list_quotes("unknown", None).await.unwrap_err();

        assert!(matches!(err, QuoteError::NotFound(_)));
        assert!(fx.quotes.is_empty().await);
    }

    #[tokio::test]
    async fn test_quote_server_error() {
        let fx = fixture().await;
        Mock::given(method("GET"))
            .and(path("/onze-fondsen/aandelen-wereldwijd-totaal/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("unknown"))
            .mount(&fx.server)
            .await;

        let err = fx
            .provider
            .list_quotes("aandelen-wereldwijd-totaal", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            QuoteError::Upstream {
                resource: Resource::Quotes,
                ..
            }
        ));
        assert!(fx.quotes.is_empty().await);
    }

    #[tokio::test]
    async fn test_funds_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onze-fondsen/"))
            .respond_with(ResponseTemplate::new(502).set_body_string("error"))
            .mount(&server)
            .await;
        let funds = Arc::new(MemoryCache::<String, Fund>::default());
        let provider = MeesmanProvider::new(
            &format!("{}/onze-fondsen", server.uri()),
            Client::new(),
            funds.clone(),
            Arc::new(MemoryCache::<String, Vec<Quote>>::default()),
        );

        let err = provider.list_funds().await.unwrap_err();

        assert!(matches!(
            err,
            QuoteError::Upstream {
                resource: Resource::Funds,
                ..
            }
        ));
        assert!(funds.is_empty().await);
    }
}
