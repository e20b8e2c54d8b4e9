//! One-shot lookups printed as JSON, the same shape the server returns.

use crate::core::Quote;
use crate::providers::{SharedProvider, find_provider};
use anyhow::{Context, Result, anyhow};

fn provider_by_name<'a>(providers: &'a [SharedProvider], name: &str) -> Result<&'a SharedProvider> {
    find_provider(providers, name).ok_or_else(|| {
        let known: Vec<_> = providers.iter().map(|p| p.name()).collect();
        anyhow!("Unknown provider {name}, expected one of: {}", known.join(", "))
    })
}

pub async fn funds_json(providers: &[SharedProvider], provider: &str) -> Result<String> {
    let provider = provider_by_name(providers, provider)?;
    let names: Vec<String> = provider
        .list_funds()
        .await
        .with_context(|| format!("Failed to list {} funds", provider.name()))?
        .into_iter()
        .map(|f| f.name)
        .collect();
    serde_json::to_string_pretty(&names).context("Failed to serialize funds")
}

pub async fn quotes_json(
    providers: &[SharedProvider],
    provider: &str,
    fund: &str,
    page: Option<i64>,
) -> Result<String> {
    let provider = provider_by_name(providers, provider)?;
    let quotes: Vec<Quote> = provider
        .list_quotes(fund, page)
        .await
        .with_context(|| format!("Failed to list quotes for {} fund {fund}", provider.name()))?;
    serde_json::to_string_pretty(&quotes).context("Failed to serialize quotes")
}
