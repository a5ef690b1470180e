//! Ingress adapters for the clickrush engine.
//!
//! Two transports feed the one coordinator: a line-framed TCP listener for
//! click events and an HTTP API for signup, clicks, and the winner query.
//! Adapters stamp arrival times, forward to the coordinator, and translate
//! outcomes to wire responses; malformed payloads and disconnects never reach
//! the validation logic.

pub mod config;
pub mod http;
pub mod tcp;
