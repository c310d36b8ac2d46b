//! Async client for the Financial Modeling Prep "stable" REST API.
//!
//! Covers the three endpoints the ingestion pipeline needs: company profile,
//! full end-of-day price history, and the company screener used to seed the
//! ticker universe.

mod client;
mod errors;
mod query;
pub mod types;

pub use self::client::{Client, DEFAULT_BASE_URL};
pub use self::errors::Error;
pub use self::query::{Query, ScreenerQuery, SymbolQuery};
