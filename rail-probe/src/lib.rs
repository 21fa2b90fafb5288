//! # rail-probe
//!
//! Drives a single RemoteApp launch against a peer that speaks raw RAIL
//! PDUs over TCP, reporting whether the server started the program.

pub mod config;
pub mod probe;
