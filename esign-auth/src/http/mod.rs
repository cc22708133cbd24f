//! HTTP client building for the authorization server and the REST API.

mod client;

pub use client::{ClientBuilder, HttpClientConfig};
