use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

use super::cache::{CachePolicy, DEFAULT_CAPACITY, DEFAULT_TTL};

pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000);
pub const BRANDNEWDAY_URL: &str = "https://secure.brandnewday.nl/service";
pub const MEESMAN_URL: &str = "https://www.meesman.nl/onze-fondsen";
pub const ZWITSERLEVEN_URL: &str = "https://www.zwitserleven.nl/webtools/fondskoersen_2011/fondskoersen.aspx?cms_id=14421&amp;cms_template=NL2015+Infopagina";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN,
        }
    }
}

/// Settings of the outbound HTTP client shared by all providers.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("quotes/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy::new(Duration::from_secs(self.ttl_secs), self.capacity)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BrandNewDayProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MeesmanProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ZwitserlevenProviderConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub brandnewday: BrandNewDayProviderConfig,
    pub meesman: MeesmanProviderConfig,
    pub zwitserleven: ZwitserlevenProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            brandnewday: BrandNewDayProviderConfig {
                base_url: BRANDNEWDAY_URL.to_string(),
            },
            meesman: MeesmanProviderConfig {
                base_url: MEESMAN_URL.to_string(),
            },
            zwitserleven: ZwitserlevenProviderConfig {
                url: ZWITSERLEVEN_URL.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("nl", "totalechaos", "quotes")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// YAML written by `quotes setup`.
    pub fn default_yaml() -> Result<String> {
        serde_yaml::to_string(&Self::default()).context("Failed to serialize default config")
    }
}
