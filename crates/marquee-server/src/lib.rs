//! Process wiring for the marquee list resolver: configuration, logging,
//! and the HTTP surface (list endpoint and SMS webhook).

pub mod config;
pub mod logging;
pub mod message;
pub mod rest;
