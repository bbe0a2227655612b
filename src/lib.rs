//! Starferry host with the TradingView MPC relay plugin.
//!
//! The host mounts plugins under `/plugins/{name}`; the `tradingview_mpc`
//! plugin forwards status, symbol and chart requests to a separately running
//! TradingView API server.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod plugins;
