//! Caller-side client for the dashboard forwarding proxy.

pub mod client;

pub use client::{ClientError, PostBody, ProxyClient, ProxyPayload, ResponseMetadata};
