use std::fmt::Display;
use thiserror::Error;

/// What a failed upstream call was trying to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Funds,
    Quotes,
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Resource::Funds => "funds",
                Resource::Quotes => "quotes",
            }
        )
    }
}

#[derive(Debug, Error)]
pub enum QuoteError {
    /// Transport failure or non-success status from an upstream source.
    #[error("Could not retrieve {resource}")]
    Upstream {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered, but not in a shape we understand.
    #[error("Could not parse {resource}: {reason}")]
    Parse { resource: Resource, reason: String },

    #[error("Fund {0} could not be found")]
    NotFound(String),

    #[error("Invalid page, must be >= 1")]
    InvalidPage(i64),
}

impl QuoteError {
    pub fn upstream(resource: Resource, source: reqwest::Error) -> Self {
        QuoteError::Upstream { resource, source }
    }

    pub fn parse(resource: Resource, reason: impl Into<String>) -> Self {
        QuoteError::Parse {
            resource,
            reason: reason.into(),
        }
    }

    /// Message safe to hand to API clients. Parse failures read the same as
    /// upstream failures so parser details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            QuoteError::Upstream { resource, .. } | QuoteError::Parse { resource, .. } => {
                format!("Could not retrieve {resource}")
            }
            other => other.to_string(),
        }
    }
}
