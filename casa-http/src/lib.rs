//! casa-http
//!
//! HTTP connectors that implement the casa role traits against the public
//! sources: the listing catalog, the market value estimate site, the
//! assessed-value desk and published spreadsheets for search settings.
//!
//! Every connector classifies failures the same way: 404 and 410 become
//! `NotFound`, 408, 429, 5xx and dropped connections become `Transient`, and
//! anything else is a fatal `Connector` error.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use casa_http::{FundaConnector, KadasterConnector, WozConnector};
//!
//! let casa = casa::Casa::builder()
//!     .with_connector(Arc::new(FundaConnector::new(Arc::new(MyPageParser))?))
//!     .with_connector(Arc::new(KadasterConnector::new()?))
//!     .with_connector(Arc::new(WozConnector::new()?))
//!     .with_sink(sink)
//!     .build()?;
//! ```
#![warn(missing_docs)]

mod funda;
mod http;
mod kadaster;
mod sheets;
mod woz;

pub use funda::{DetailParser, FundaConnector, parse_search_page};
pub use http::{classify_status, classify_transport, default_client};
pub use kadaster::{KadasterConnector, parse_estimate_page};
pub use sheets::{GoogleSheetsSource, rows_from_csv};
pub use woz::WozConnector;
