//! Core data model for certificate lookups.
//!
//! This module contains:
//! - Caller-supplied keys (`BuildingId`, `RegionCode`)
//! - Pipeline artifacts (`DocumentLocator`, `RawDocument`)
//! - The final report (`Resolution`, `LocatorReport`, `LocatorOutcome`)

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing caller-supplied keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Building identifier must not be empty")]
    EmptyBuildingId,
    #[error("Unknown region code '{0}'. Allowed: M, X, B, Q, R (or 1-5)")]
    UnknownRegion(String),
}

/// Building Identification Number as understood by the portal.
///
/// Kept opaque: the portal accepts it verbatim in the listing query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(String);

impl BuildingId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, KeyError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(KeyError::EmptyBuildingId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BuildingId {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Borough code required by the document endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionCode {
    #[serde(rename = "M")]
    Manhattan,
    #[serde(rename = "X")]
    Bronx,
    #[serde(rename = "B")]
    Brooklyn,
    #[serde(rename = "Q")]
    Queens,
    #[serde(rename = "R")]
    StatenIsland,
}

impl RegionCode {
    pub const ALL: [RegionCode; 5] = [
        RegionCode::Manhattan,
        RegionCode::Bronx,
        RegionCode::Brooklyn,
        RegionCode::Queens,
        RegionCode::StatenIsland,
    ];

    /// Single-letter code as sent on the wire.
    pub fn letter(self) -> char {
        match self {
            RegionCode::Manhattan => 'M',
            RegionCode::Bronx => 'X',
            RegionCode::Brooklyn => 'B',
            RegionCode::Queens => 'Q',
            RegionCode::StatenIsland => 'R',
        }
    }

    /// Borough number as used by PAD-style datasets.
    pub fn number(self) -> u8 {
        match self {
            RegionCode::Manhattan => 1,
            RegionCode::Bronx => 2,
            RegionCode::Brooklyn => 3,
            RegionCode::Queens => 4,
            RegionCode::StatenIsland => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RegionCode::Manhattan => "Manhattan",
            RegionCode::Bronx => "Bronx",
            RegionCode::Brooklyn => "Brooklyn",
            RegionCode::Queens => "Queens",
            RegionCode::StatenIsland => "Staten Island",
        }
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for RegionCode {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = RegionCode::ALL.into_iter().find(|r| {
            trimmed.eq_ignore_ascii_case(&r.letter().to_string())
                || trimmed == r.number().to_string()
        });
        code.ok_or_else(|| KeyError::UnknownRegion(s.to_string()))
    }
}

/// Filename-like token naming one candidate certificate (e.g. `M1208518-3.PDF`).
///
/// No uniqueness guarantee; duplicates are processed redundantly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentLocator(String);

impl DocumentLocator {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Locator with a leading uppercase borough letter removed, if present.
    pub fn stripped(&self) -> &str {
        match self.0.chars().next() {
            Some(c) if c.is_ascii_uppercase() => &self.0[1..],
            _ => &self.0,
        }
    }
}

impl fmt::Display for DocumentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentLocator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Bytes of one downloaded certificate plus its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub locator: DocumentLocator,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Why a single locator contributed nothing to the reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LocatorFailure {
    MalformedLocator(String),
    PermanentNotFound,
    GaveUp { attempts: u32 },
    Transport(String),
    NormalizationFailure(String),
    ExtractionFailure(String),
}

impl fmt::Display for LocatorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorFailure::MalformedLocator(msg) => write!(f, "malformed locator: {msg}"),
            LocatorFailure::PermanentNotFound => {
                write!(f, "portal reported file not found (address synthesis mismatch)")
            }
            LocatorFailure::GaveUp { attempts } => {
                write!(f, "gave up after {attempts} attempts")
            }
            LocatorFailure::Transport(msg) => write!(f, "transport error: {msg}"),
            LocatorFailure::NormalizationFailure(msg) => write!(f, "normalization failed: {msg}"),
            LocatorFailure::ExtractionFailure(msg) => write!(f, "text extraction failed: {msg}"),
        }
    }
}

/// Per-locator result recorded in a `Resolution`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum LocatorOutcome {
    Dated(NaiveDate),
    NoDates,
    Failed(LocatorFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorReport {
    pub locator: DocumentLocator,
    pub outcome: LocatorOutcome,
}

impl LocatorReport {
    pub fn date(&self) -> Option<NaiveDate> {
        match self.outcome {
            LocatorOutcome::Dated(d) => Some(d),
            _ => None,
        }
    }
}

/// Final result of resolving one building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub bin: BuildingId,
    pub region: RegionCode,
    /// Latest of the per-document earliest dates, if any document yielded one.
    pub date: Option<NaiveDate>,
    pub fetch_timed_out: bool,
    pub locators: Vec<LocatorReport>,
}

/// Reduce per-document dates to the latest one.
pub fn latest_of(dates: impl IntoIterator<Item = NaiveDate>) -> Option<NaiveDate> {
    dates.into_iter().max()
}
