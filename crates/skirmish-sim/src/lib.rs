//! Skirmish Sim - headless runner for the combat core.
//!
//! Builds an arena from a TOML config, drives the player with a simple
//! autopilot and logs every combat event through `tracing`.

#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod scenario;
