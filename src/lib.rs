//! Typed Rust client for the Sklik.cz XML-RPC API.
//!
//! The crate is split the same way the API is used: a domain layer of
//! entities and credentials, a marshalling layer converting them to wire
//! values, a transport layer speaking XML-RPC over HTTPS, and a client layer
//! that owns the session, classifies statuses and retries failed calls.
//!
//! ```rust,no_run
//! use sklik::{AdsFilter, Credentials, SklikClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = SklikClient::connect(Credentials::new("login@seznam.cz", "...")?).await?;
//!     let ads = client.list_ads(&AdsFilter::by_groups([12])).await?;
//!     println!("{} ads", ads.len());
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod domain;
pub mod marshalling;
pub mod transport;

pub use client::{
    ClientConfig, ConfigError, RetryPolicy, SklikClient, SklikClientBuilder, SklikError,
};
pub use domain::{
    Ad, AdsFilter, ApiResponse, ApiStatus, ApiVersion, Campaign, CampaignsFilter, Completion,
    Credentials, Diagnostic, Entity, Field, Group, GroupsFilter, Keyword, KeywordsFilter, Limits,
    Region, UserId, ValidationError, Vertex,
};
pub use marshalling::{FromWire, MarshallError, Mapping, ToWire, Value, WireDateTime};
