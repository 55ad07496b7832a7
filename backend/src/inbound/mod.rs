//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! HTTP handlers live under [`http`]; the subscriber binary drives the
//! subscription manager directly.

pub mod http;
