//! rules-console - command-line front end for the rules backend
//!
//! Drives the rule, entity and parametric services from a terminal.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use rules_console::forms::FieldGenerator;
use rules_console::metadata::ParametricaMetadata;
use rules_console::simulation::{random_customer, Customer};
use rules_console::{Backend, ConsoleConfig, ParametricKind};

#[derive(Parser)]
#[command(name = "rules-console")]
#[command(version, about = "Administrative console for the rules backend", long_about = None)]
struct Cli {
    /// Path to console.yaml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config and CONSOLE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage stored rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Run the rules against a customer
    Simulate {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, default_value = "30")]
        age: i32,

        #[arg(long, default_value = "5000")]
        total_purchases: f64,

        #[arg(long, default_value = "500")]
        loyalty_points: i64,

        #[arg(long, default_value = "30")]
        days_since_registration: i64,

        /// Ignore the other flags and use a random customer
        #[arg(long)]
        random: bool,
    },

    /// Browse parametric tables
    Entities {
        #[command(subcommand)]
        action: EntitiesAction,
    },

    /// Print the form fields generated from a metadata file (YAML or JSON)
    Form {
        file: PathBuf,

        /// Entity the metadata belongs to (e.g. topes, uit)
        #[arg(short, long)]
        entity: String,

        /// Reference year for year selects
        #[arg(long)]
        year: Option<i32>,
    },

    /// Print the metadata catalog
    Catalog,

    /// Print every parametric value in force on a date
    Vigentes {
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Print the backend health line
    Health,
}

#[derive(Subcommand)]
enum RulesAction {
    List,
    Toggle { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum EntitiesAction {
    List {
        entity: ParametricKind,

        /// Validity year filter
        #[arg(long)]
        year: Option<i32>,
    },
    Get {
        entity: ParametricKind,
        id: i64,
    },
    Delete {
        entity: ParametricKind,
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), String> {
    let mut config = ConsoleConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    let backend = Backend::new(&config.api);

    match cli.command {
        Commands::Rules { action } => rules(&backend, action).await,
        Commands::Simulate {
            name,
            email,
            age,
            total_purchases,
            loyalty_points,
            days_since_registration,
            random,
        } => {
            let customer = if random {
                random_customer()
            } else {
                Customer {
                    name: name.unwrap_or_default(),
                    email: email.unwrap_or_default(),
                    age,
                    total_purchases,
                    loyalty_points,
                    days_since_registration,
                    is_active: true,
                }
            };
            customer.validate_for_simulation().map_err(|e| e.to_string())?;
            print_json(&backend.rules.execute_rules(&customer).await)
        }
        Commands::Entities { action } => entities(&backend, action).await,
        Commands::Form { file, entity, year } => form(file, &entity, year),
        Commands::Catalog => {
            let catalog = backend.parametricas.catalog().await.map_err(|e| e.to_string())?;
            for (name, metadata) in &catalog.parametricas {
                println!(
                    "{:<22} {:>4} records  {}",
                    name,
                    metadata.total_registros.unwrap_or(0),
                    metadata.description
                );
            }
            Ok(())
        }
        Commands::Vigentes { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let snapshot = backend.parametricas.vigentes(date).await.map_err(|e| e.to_string())?;
            print_json(&snapshot)
        }
        Commands::Health => {
            let line = backend.parametricas.health().await.map_err(|e| e.to_string())?;
            println!("{}", line);
            Ok(())
        }
    }
}

async fn rules(backend: &Backend, action: RulesAction) -> Result<(), String> {
    match action {
        RulesAction::List => {
            for rule in backend.rules.list_rules().await {
                let marker = if rule.active { "✓" } else { "✗" };
                println!("{} {:>4}  {:<28} {}", marker, rule.id, rule.name, rule.description);
            }
            Ok(())
        }
        RulesAction::Toggle { id } => {
            let rule = backend.rules.toggle_rule(id).await;
            println!(
                "Rule {} is now {}",
                rule.id,
                if rule.active { "active" } else { "inactive" }
            );
            Ok(())
        }
        RulesAction::Delete { id } => {
            if backend.rules.delete_rule(id).await {
                println!("Rule {} deleted", id);
                Ok(())
            } else {
                Err(format!("Could not delete rule {}", id))
            }
        }
    }
}

async fn entities(backend: &Backend, action: EntitiesAction) -> Result<(), String> {
    match action {
        EntitiesAction::List { entity, year } => {
            let records = backend
                .entities
                .list(entity.path(), year)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&records)
        }
        EntitiesAction::Get { entity, id } => {
            let record = backend
                .entities
                .get(entity.path(), id)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&record)
        }
        EntitiesAction::Delete { entity, id } => {
            if backend.entities.delete(entity.path(), id).await {
                println!("{} {} deleted", entity.config().friendly_name, id);
                Ok(())
            } else {
                Err(format!("Could not delete {} {}", entity, id))
            }
        }
    }
}

fn form(file: PathBuf, entity: &str, year: Option<i32>) -> Result<(), String> {
    let contents = std::fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let metadata: ParametricaMetadata = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", file.display(), e))?;

    let generator = match year {
        Some(year) => FieldGenerator::with_reference_year(year),
        None => FieldGenerator::new(),
    };
    print_json(&generator.generate(entity, Some(&metadata)))
}
