//! Fund and quote abstractions shared by every provider

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::QuoteError;

/// An investable product as listed by a provider.
///
/// `name` is the normalized slug used as the public lookup key, `id` is
/// whatever the provider uses to address the fund upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    pub id: String,
    pub name: String,
}

impl Fund {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Funds whose slug doubles as their upstream id.
    pub fn from_slug(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: slug.clone(),
            name: slug,
        }
    }

    /// Case-insensitive, whitespace-trimmed comparison against a requested name.
    pub fn matches(&self, requested: &str) -> bool {
        self.name == requested.trim().to_lowercase()
    }
}

/// A closing price on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "Date")]
    pub date: NaiveDateTime,
    #[serde(rename = "Close")]
    pub close: f64,
}

impl Quote {
    pub fn new(date: NaiveDateTime, close: f64) -> Self {
        Self { date, close }
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Route prefix and CLI name of the provider.
    fn name(&self) -> &'static str;

    async fn list_funds(&self) -> Result<Vec<Fund>, QuoteError>;

    /// Quotes for the fund named `fund_name`. `page` is 1-based and only
    /// meaningful for paginated providers; others ignore it.
    async fn list_quotes(
        &self,
        fund_name: &str,
        page: Option<i64>,
    ) -> Result<Vec<Quote>, QuoteError>;
}
