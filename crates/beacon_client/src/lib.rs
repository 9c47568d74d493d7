pub mod cache;
pub mod client;
pub mod errors;
pub mod http_client;
pub mod single_flight;

pub use client::BeaconApiClient;
