pub mod brandnewday;
pub mod meesman;
pub mod util;
pub mod zwitserleven;

use crate::core::{Fund, Quote, QuoteProvider};
use crate::core::config::AppConfig;
use crate::store::MemoryCache;
use anyhow::{Context, Result};
use std::sync::Arc;

use brandnewday::BrandNewDayProvider;
use meesman::MeesmanProvider;
use zwitserleven::ZwitserlevenProvider;

pub type SharedProvider = Arc<dyn QuoteProvider>;

/// Every provider with its own fresh caches, in route registration order.
pub fn build_providers(config: &AppConfig) -> Result<Vec<SharedProvider>> {
    let client = util::build_client(&config.http).context("Failed to build HTTP client")?;
    let policy = config.cache.policy();
    let providers = &config.providers;

    let brandnewday: SharedProvider = Arc::new(BrandNewDayProvider::new(
        &providers.brandnewday.base_url,
        client.clone(),
        Arc::new(MemoryCache::<String, Fund>::new(policy)),
        Arc::new(MemoryCache::<String, Vec<Quote>>::new(policy)),
    ));
    let meesman: SharedProvider = Arc::new(MeesmanProvider::new(
        &providers.meesman.base_url,
        client.clone(),
        Arc::new(MemoryCache::<String, Fund>::new(policy)),
        Arc::new(MemoryCache::<String, Vec<Quote>>::new(policy)),
    ));
    let zwitserleven: SharedProvider = Arc::new(ZwitserlevenProvider::new(
        &providers.zwitserleven.url,
        client,
        Arc::new(MemoryCache::<String, Vec<Quote>>::new(policy)),
    ));

    Ok(vec![brandnewday, meesman, zwitserleven])
}

pub fn find_provider<'a>(providers: &'a [SharedProvider], name: &str) -> Option<&'a SharedProvider> {
    providers
        .iter()
        .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_providers_registers_all_routes() {
        let providers = build_providers(&AppConfig::default()).unwrap();
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();

        assert_eq!(names, vec!["brandnewday", "meesman", "zwitserleven"]);
    }

    #[test]
    fn test_find_provider() {
        let providers = build_providers(&AppConfig::default()).unwrap();

        assert_eq!(
            find_provider(&providers, "Meesman").map(|p| p.name()),
            Some("meesman")
        );
        assert!(find_provider(&providers, "yahoo").is_none());
    }
}
