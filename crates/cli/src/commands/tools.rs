//! Tool registry inspection.

use std::path::Path;

use tracing::{error, info, warn};
use vendai_assistant::tools::ToolRegistry;

/// Print the builtin tools.
///
/// # Errors
///
/// Returns an error if YAML serialization fails.
pub fn list(yaml: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ToolRegistry::builtin();

    #[allow(clippy::print_stdout)]
    {
        if yaml {
            print!("{}", registry.to_yaml()?);
        } else {
            for tool in registry.list_tools() {
                let required = tool.parameters.required.join(", ");
                println!("{}  (required: {required})", tool.name);
                println!("    {}", first_line(&tool.description));
            }
        }
    }
    Ok(())
}

/// Validate a YAML file of tool descriptors.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the descriptors are invalid.
pub fn validate(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    info!(path = %path.display(), "Loading tool descriptors from file");

    let content = std::fs::read_to_string(path)?;
    let registry = match ToolRegistry::from_yaml_str(&content) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Tool descriptor validation failed:");
            error!("  - {e}");
            return Err(e.into());
        }
    };

    info!(tools = registry.len(), "Tool descriptors validated successfully");
    if let Err(e) = registry.require_builtin_kinds() {
        warn!("{e}; the assistant will not start with this registry");
    }
    Ok(())
}

fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
}
