//! Search aggregation: concurrent provider fan-out, filtering, merging.
//!
//! This module queries every provider concurrently, waits for all of them,
//! normalises and filters candidate URLs against the ad/tracker denylist,
//! and merges per-provider lists in a fixed priority order.

pub mod aggregator;
pub mod merge;
pub mod url_filter;

pub use aggregator::{Aggregator, ProviderReport};
pub use url_filter::Denylist;
