//! The closed set of tools the dispatcher knows how to run.

use serde::{Deserialize, Serialize};

/// A tool with a local handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Turn a data request into SQL (never executed).
    GenerateSql,
    /// Answer a platform-error question from the knowledge base.
    PerformRag,
    /// Look up products and build orders from the catalog.
    LocalDiscovery,
}

impl ToolKind {
    pub const ALL: [Self; 3] = [Self::GenerateSql, Self::PerformRag, Self::LocalDiscovery];

    /// The function name offered to the model.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GenerateSql => "generate_sql",
            Self::PerformRag => "perform_rag",
            Self::LocalDiscovery => "local_discovery",
        }
    }

    /// Map a function name from the model to a kind.
    ///
    /// `product_discovery` is accepted as another name for `local_discovery`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "generate_sql" => Some(Self::GenerateSql),
            "perform_rag" => Some(Self::PerformRag),
            "local_discovery" | "product_discovery" => Some(Self::LocalDiscovery),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
