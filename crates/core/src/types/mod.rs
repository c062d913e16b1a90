//! Core types for VendAI.
//!
//! This module provides type-safe wrappers for the catalog, orders and chat.

pub mod conversation;
pub mod email;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use conversation::{ConversationTurn, UserInfo, UserInfoError};
pub use email::{Email, EmailError};
pub use order::OrderLine;
pub use price::{CurrencyCode, Price, PriceError};
pub use product::Product;
pub use status::*;
