pub mod adapter;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod fits;
pub mod output;
pub mod query;
pub mod records;
pub mod resolve;
pub mod spatial;
pub mod transport;

pub use client::Kplr;
pub use error::KplrError;
