//! co-core
//!
//! Core library for reading Certificate of Occupancy dates from the NYC
//! Department of Buildings Building Information System.
//!
//! The pipeline for one building:
//! 1. fetch the certificate listing, waiting out the load-balancer page,
//! 2. pull the PDF locators out of the listing,
//! 3. synthesize each document's retrieval address,
//! 4. poll the document endpoint until the PDF arrives,
//! 5. de-lock the PDF via OCR and extract its text,
//! 6. take the earliest date in each document and the latest across documents.
//!
//! Network, OCR and text extraction sit behind traits so every stage can be
//! exercised without the portal or the external tools.

pub mod config;
pub mod model;
pub mod services;

pub use config::PortalConfig;
pub use model::{BuildingId, DocumentLocator, RegionCode, Resolution};
pub use services::cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use services::resolver::{CertificateResolver, ResolveError};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
