//! Yahoo Finance quote API provider.

mod client;
mod parse;
mod types;

pub use client::YahooFinance;
