//! VendAI CLI - catalog, order and tool-registry tools.
//!
//! # Usage
//!
//! ```bash
//! # Write the demo catalog
//! vendai catalog seed -o data/products.csv
//!
//! # Search the catalog
//! vendai catalog list -q juice
//!
//! # Price an order
//! vendai order -u Ada Apple "Milk (1 gallon)"
//!
//! # Inspect or check tool descriptors
//! vendai tools list --yaml
//! vendai tools validate tools.yaml
//!
//! # Route one question through the assistant
//! vendai ask "Why is my card payment failing?"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vendai")]
#[command(author, version, about = "VendAI CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Build and price an order
    Order {
        /// Customer name on the order
        #[arg(short, long)]
        user: String,

        /// Catalog CSV to price against
        #[arg(short, long, default_value = "data/products.csv")]
        catalog: PathBuf,

        /// Product names, in order
        #[arg(required = true)]
        products: Vec<String>,
    },
    /// Inspect tool descriptors
    Tools {
        #[command(subcommand)]
        action: ToolsAction,
    },
    /// Resolve and answer one message through the assistant
    Ask {
        /// The message
        message: String,

        /// Name used to personalise replies and place orders
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Write the demo catalog CSV
    Seed {
        /// Output file
        #[arg(short, long, default_value = "data/products.csv")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// List products, optionally filtered by a search query
    List {
        #[arg(short, long, default_value = "data/products.csv")]
        catalog: PathBuf,

        #[arg(short, long)]
        query: Option<String>,
    },
}

#[derive(Subcommand)]
enum ToolsAction {
    /// List the builtin tools
    List {
        /// Print descriptors as YAML
        #[arg(long)]
        yaml: bool,
    },
    /// Validate a YAML file of tool descriptors
    Validate {
        /// Path to the YAML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Seed { output, force } => commands::catalog::seed(&output, force)?,
            CatalogAction::List { catalog, query } => {
                commands::catalog::list(&catalog, query.as_deref())?;
            }
        },
        Commands::Order {
            user,
            catalog,
            products,
        } => commands::order::build(&catalog, &user, &products)?,
        Commands::Tools { action } => match action {
            ToolsAction::List { yaml } => commands::tools::list(yaml)?,
            ToolsAction::Validate { file } => commands::tools::validate(&file)?,
        },
        Commands::Ask { message, name } => {
            commands::ask::ask(&message, name.as_deref()).await?;
        }
    }
    Ok(())
}
