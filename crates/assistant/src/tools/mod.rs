//! Tool registry.
//!
//! The registry holds the tool descriptors offered to the model. It is built
//! once at startup, validated, and shared read-only behind an `Arc`.
//!
//! ## YAML Format
//!
//! ```yaml
//! - name: generate_sql
//!   description: Generate an optimized SQL query from a customer's request.
//!   parameters:
//!     type: object
//!     properties:
//!       query:
//!         type: string
//!         description: What the customer wants retrieved.
//!     required: [query]
//! ```

mod descriptor;
mod kind;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::openai::FunctionDefinition;

pub use descriptor::{ArgumentError, ParamType, ParameterSchema, ParameterSpec, ToolDescriptor};
pub use kind::ToolKind;

/// Function names accepted by the chat-completions API.
static TOOL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").expect("Invalid regex"));

/// Malformed or conflicting tool descriptors. Fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("invalid tool name '{0}': must match ^[a-zA-Z0-9_-]{{1,64}}$")]
    InvalidName(String),

    #[error("tool '{0}' has an empty description")]
    EmptyDescription(String),

    #[error("tool '{tool}' requires undeclared argument '{argument}'")]
    UndeclaredRequired { tool: String, argument: String },

    #[error("tool '{tool}': parameters must be a JSON-Schema object, got type '{found}'")]
    NotAnObjectSchema { tool: String, found: String },

    #[error("no descriptor for built-in tool '{0}'")]
    MissingTool(&'static str),

    #[error("failed to parse tool YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Validated, ordered set of tool descriptors.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Build a registry, validating every descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on a duplicate name, an invalid name, an empty
    /// description, a non-object schema, or a required argument that is not
    /// declared.
    pub fn new(descriptors: Vec<ToolDescriptor>) -> Result<Self, RegistryError> {
        let registry = Self { tools: descriptors };
        registry.validate()?;
        Ok(registry)
    }

    /// The three built-in tools.
    ///
    /// Not validated here; [`crate::state::AppState`] runs [`Self::validate`]
    /// on whatever registry it is given.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            tools: builtin_descriptors(),
        }
    }

    /// Re-run the checks [`Self::new`] applies.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] found, in registration order.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for tool in &self.tools {
            validate_descriptor(tool)?;
            if !seen.insert(tool.name.as_str()) {
                return Err(RegistryError::DuplicateTool(tool.name.clone()));
            }
        }
        Ok(())
    }

    /// Parse and validate descriptors from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Yaml`] for unparseable input, or any
    /// validation error from [`Self::new`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RegistryError> {
        let descriptors: Vec<ToolDescriptor> = serde_yaml::from_str(yaml)?;
        Self::new(descriptors)
    }

    /// Check that every [`ToolKind`] has a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingTool`] naming the first kind without one.
    pub fn require_builtin_kinds(&self) -> Result<(), RegistryError> {
        for kind in ToolKind::ALL {
            if self.get(kind.name()).is_none() {
                return Err(RegistryError::MissingTool(kind.name()));
            }
        }
        Ok(())
    }

    /// All descriptors in registration order.
    #[must_use]
    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Look up a descriptor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Descriptor for a built-in kind.
    #[must_use]
    pub fn for_kind(&self, kind: ToolKind) -> Option<&ToolDescriptor> {
        self.get(kind.name())
    }

    /// Function definitions for a completion request.
    #[must_use]
    pub fn functions(&self) -> Vec<FunctionDefinition> {
        self.tools.iter().map(ToolDescriptor::to_function).collect()
    }

    /// Serialize the registry back to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, RegistryError> {
        Ok(serde_yaml::to_string(&self.tools)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn validate_descriptor(tool: &ToolDescriptor) -> Result<(), RegistryError> {
    if !TOOL_NAME_RE.is_match(&tool.name) {
        return Err(RegistryError::InvalidName(tool.name.clone()));
    }
    if tool.description.trim().is_empty() {
        return Err(RegistryError::EmptyDescription(tool.name.clone()));
    }
    if tool.parameters.schema_type != "object" {
        return Err(RegistryError::NotAnObjectSchema {
            tool: tool.name.clone(),
            found: tool.parameters.schema_type.clone(),
        });
    }
    if let Some(argument) = tool
        .parameters
        .required
        .iter()
        .find(|r| !tool.parameters.properties.contains_key(*r))
    {
        return Err(RegistryError::UndeclaredRequired {
            tool: tool.name.clone(),
            argument: argument.clone(),
        });
    }
    Ok(())
}

fn builtin_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            ToolKind::GenerateSql.name(),
            "Generate an optimized SQL query from a customer's natural language request. \
             This tool should be used when the customer wants to retrieve specific data from a database. \
             Ensure the query follows standard SQL syntax and is formatted correctly. \
             The database schema and tables are only the customer's orders, deliveries, and purchases.",
            ParameterSchema::default().required_property(
                "query",
                ParameterSpec::string(
                    "The user's query describing their orders, deliveries, and purchases related data \
                     that they want retrieved from the database.",
                ),
            ),
        ),
        ToolDescriptor::new(
            ToolKind::PerformRag.name(),
            "Perform a retrieval augmented generation (RAG) task to retrieve information about errors \
             from Vendease's platform backend. This tool should be used when the customer is having \
             issues with the platform and wants to resolve the error. Give a detailed and helpful answer \
             in a friendly and professional manner like a customer-service agent, using emojis and a \
             friendly tone to engage with customers.",
            ParameterSchema::default().required_property(
                "query",
                ParameterSpec::string(
                    "The user's query asking for a solution to errors they are having with the Vendease platform.",
                ),
            ),
        ),
        ToolDescriptor::new(
            ToolKind::LocalDiscovery.name(),
            "Tool to perform 3 major tasks: \
             1) Retrieve product data from the catalog (category, sub-category, product, price in USD). \
             2) Suggest products that closely match the user's query when the product is not in the \
             catalog, using products from the same sub-category. \
             3) Help the user place an order: pass the list of product names they want in 'products'.",
            ParameterSchema::default()
                .required_property("query", ParameterSpec::string("The user's query."))
                .property(
                    "products",
                    ParameterSpec::string_array(
                        "Exact product names the user wants to order, if they are placing an order.",
                    ),
                ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(
            name,
            "Does something",
            ParameterSchema::default().required_property("query", ParameterSpec::string("q")),
        )
    }

    #[test]
    fn test_builtin_registry_is_valid() {
        let builtin = ToolRegistry::builtin();
        let rebuilt = ToolRegistry::new(builtin.list_tools().to_vec()).expect("builtin validates");
        assert_eq!(rebuilt.len(), 3);
        rebuilt.require_builtin_kinds().expect("all kinds present");

        let names: Vec<&str> = builtin.list_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["generate_sql", "perform_rag", "local_discovery"]);
        builtin.validate().expect("builtin passes validate");
    }

    #[test]
    fn test_validate_catches_unchecked_registry() {
        let mut bad = tool("generate_sql");
        bad.parameters.required.push("missing".to_string());
        let registry = ToolRegistry {
            tools: vec![bad],
        };
        assert!(matches!(
            registry.validate(),
            Err(RegistryError::UndeclaredRequired { ref argument, .. }) if argument == "missing"
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = ToolRegistry::new(vec![tool("generate_sql"), tool("generate_sql")]);
        assert!(matches!(result, Err(RegistryError::DuplicateTool(ref n)) if n == "generate_sql"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        for name in ["", "has space", "dots.not.allowed", &"x".repeat(65)] {
            let result = ToolRegistry::new(vec![tool(name)]);
            assert!(
                matches!(result, Err(RegistryError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(ToolRegistry::new(vec![tool("get-orders_v2")]).is_ok());
    }

    #[test]
    fn test_empty_description_rejected() {
        let mut bad = tool("generate_sql");
        bad.description = "   ".to_string();
        assert!(matches!(
            ToolRegistry::new(vec![bad]),
            Err(RegistryError::EmptyDescription(_))
        ));
    }

    #[test]
    fn test_required_must_be_declared() {
        let mut bad = tool("generate_sql");
        bad.parameters.required.push("limit".to_string());
        assert!(matches!(
            ToolRegistry::new(vec![bad]),
            Err(RegistryError::UndeclaredRequired { ref argument, .. }) if argument == "limit"
        ));
    }

    #[test]
    fn test_missing_builtin_kind() {
        let registry = ToolRegistry::new(vec![tool("generate_sql")]).expect("valid");
        assert!(matches!(
            registry.require_builtin_kinds(),
            Err(RegistryError::MissingTool("perform_rag"))
        ));
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r"
- name: generate_sql
  description: SQL from text
  parameters:
    type: object
    properties:
      query:
        type: string
        description: The request
    required: [query]
- name: perform_rag
  description: Error help
  parameters:
    properties:
      query: { type: string, description: The error }
    required: [query]
";
        let registry = ToolRegistry::from_yaml_str(yaml).expect("valid yaml");
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get("perform_rag").map(|t| t.parameters.schema_type.as_str()),
            Some("object")
        );
    }

    #[test]
    fn test_from_yaml_str_rejects_non_object_schema() {
        let yaml = "- name: t\n  description: d\n  parameters:\n    type: string\n";
        assert!(matches!(
            ToolRegistry::from_yaml_str(yaml),
            Err(RegistryError::NotAnObjectSchema { .. })
        ));
    }

    #[test]
    fn test_yaml_round_trip_of_builtin() {
        let yaml = ToolRegistry::builtin().to_yaml().expect("serialize");
        let parsed = ToolRegistry::from_yaml_str(&yaml).expect("parse back");
        assert_eq!(parsed.list_tools(), ToolRegistry::builtin().list_tools());
    }

    #[test]
    fn test_functions() {
        let functions = ToolRegistry::builtin().functions();
        assert_eq!(functions.len(), 3);
        assert_eq!(functions[2].parameters["properties"]["products"]["type"], "array");
    }
}
