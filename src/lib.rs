// src/lib.rs
//
// Daily report extraction pipeline: an authorized client fetches one day of
// analytics data at a time, the normalizer flattens it into a rectangular
// table, and the sink writes one delimited file per day.

pub mod auth;
pub mod batch;
pub mod error;
pub mod fetch;
pub mod report;
pub mod sink;

pub use error::{Error, Result};
