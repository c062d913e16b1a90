//! Order lines produced by the order builder.

use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// A single product requested by a user.
///
/// Product names are not checked against the catalog here; the catalog store
/// decides what to do with unknown names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub user_name: String,
    pub product_name: String,
    pub status: OrderStatus,
}

impl OrderLine {
    /// New line in the `Pending` state.
    #[must_use]
    pub fn pending(user_name: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            product_name: product_name.into(),
            status: OrderStatus::Pending,
        }
    }
}
