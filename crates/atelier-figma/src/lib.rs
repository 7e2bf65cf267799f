//! # atelier-figma
//!
//! Stateless client for the Figma REST API, implementing the hub's
//! [`DesignSource`](atelier_core::DesignSource) seam. Only read endpoints
//! are exposed; mutations flow through the plugin over the WebSocket.

#![deny(unsafe_code)]

pub mod client;

pub use client::FigmaClient;
