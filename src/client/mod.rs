//! HTTP clients for external data

pub mod fetch;


pub use fetch::{HttpFetcher, RetryPolicy};
