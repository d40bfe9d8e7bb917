mod api;
mod cache;
mod client;
mod cloudflare;

pub use api::ApiClient;
pub use cache::{CachedResponse, ResponseCache};
pub use client::{FetchClient, FetchOptions};
