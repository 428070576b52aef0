//! Terminal client for the duro refresh scheduler dashboard.
//!
//! Talks to the dashboard's JSON endpoints, formats durations and
//! timestamps the way the web page does, and queues table refreshes.

pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod format;
pub mod logging;
pub mod view;
