//! Record source modules.
//!
//! Fetching row records from the remote tabular endpoint.

pub mod fetcher;

pub use fetcher::fetch_records;
