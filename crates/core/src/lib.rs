//! VendAI Core - Shared domain types.
//!
//! This crate provides the types shared by every VendAI component:
//! - `assistant` - HTTP chat service with tool routing
//! - `cli` - Catalog, order and tool registry tooling
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no LLM
//! calls. Loading the catalog from disk and talking to the model both live
//! in `vendai-assistant`.
//!
//! # Modules
//!
//! - [`types`] - Prices, products, order lines, conversation turns, users

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
