//! Commodity rate sourcing.
//!
//! The rest of the system only sees `aurum_core::RateProvider`; this crate
//! supplies the layered implementation behind it:
//!
//! - **Fetchers** (`fetch`, `subprocess`, `http`, `fixture`) - pluggable ways
//!   of obtaining raw per-gram prices
//! - **Service** (`service`) - a 60-second cache, operator manual overrides,
//!   and the multi-level fallback chain (previous snapshot, then hardcoded
//!   safe constants)
//!
//! Failures never escape: callers always receive a usable `RateSnapshot`
//! whose source tag records which path produced it.

pub mod fetch;
pub mod fixture;
pub mod http;
pub mod service;
pub mod subprocess;

pub use fetch::{FetchedRates, RateFetchError, RateFetcher};
pub use fixture::StaticRateFetcher;
pub use http::HttpRateFetcher;
pub use aurum_core::clock::{Clock, SystemClock};
pub use service::RateService;
pub use subprocess::SubprocessRateFetcher;
