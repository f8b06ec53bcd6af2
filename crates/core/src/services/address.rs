//! Document-endpoint addressing.
//!
//! The content servlet wants five `cofomatadata` fields derived from the
//! locator shown on the listing page:
//!
//! | field | value |
//! |---|---|
//! | 1 | constant `cofo` |
//! | 2 | region letter |
//! | 3 | first three characters of the stripped locator |
//! | 4 | next three characters of the stripped locator + `000` |
//! | 5 | the locator exactly as listed (leading letter kept) |
//!
//! "Stripped" means a leading uppercase borough letter removed. Any missing
//! field gets a silent 404 from the portal.

use reqwest::Url;
use thiserror::Error;

use crate::model::{DocumentLocator, RegionCode};

/// Stripped locator characters required ahead of the extension.
pub const MIN_STEM_LEN: usize = 6;

const DOCUMENT_MARKER: &str = "cofo";
const FIELD4_PAD: &str = "000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Locator '{locator}' is too short: need {min_len} characters before the extension")]
    MalformedLocator { locator: String, min_len: usize },
    #[error("Invalid document endpoint '{0}'")]
    InvalidEndpoint(String),
}

/// Fully parameterized request for one document. Recomputed on every use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalAddress {
    pub endpoint: String,
    pub region: RegionCode,
    pub field3: String,
    pub field4: String,
    pub locator: DocumentLocator,
    pub request_id: String,
}

impl RetrievalAddress {
    /// Query fields in the order the servlet expects.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("passjobnumber", "null".to_string()),
            ("cofomatadata1", DOCUMENT_MARKER.to_string()),
            ("cofomatadata2", self.region.letter().to_string()),
            ("cofomatadata3", self.field3.clone()),
            ("cofomatadata4", self.field4.clone()),
            ("cofomatadata5", self.locator.as_str().to_string()),
            ("requestid", self.request_id.clone()),
        ]
    }

    pub fn to_url(&self) -> Result<String, AddressError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|_| AddressError::InvalidEndpoint(self.endpoint.clone()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.fields() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(url.to_string())
    }
}

/// Derive the retrieval address for `locator` in `region`.
pub fn synthesize(
    locator: &DocumentLocator,
    region: RegionCode,
    endpoint: &str,
    request_id: &str,
) -> Result<RetrievalAddress, AddressError> {
    let stripped = locator.stripped();
    let stem = stripped.split('.').next().unwrap_or("");
    let malformed =
        || AddressError::MalformedLocator { locator: locator.to_string(), min_len: MIN_STEM_LEN };

    if stem.chars().count() < MIN_STEM_LEN {
        return Err(malformed());
    }
    let field3 = stripped.get(0..3).ok_or_else(malformed)?;
    let field4 = stripped.get(3..6).ok_or_else(malformed)?;

    Ok(RetrievalAddress {
        endpoint: endpoint.to_string(),
        region,
        field3: field3.to_string(),
        field4: format!("{field4}{FIELD4_PAD}"),
        locator: locator.clone(),
        request_id: request_id.to_string(),
    })
}
