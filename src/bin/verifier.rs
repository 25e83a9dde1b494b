//! Case Verifier CLI
//!
//! Validates case records, inspects the schema registry and marks stored
//! cases as verified.

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use judgement_schemas::config::VerifierConfig;
use judgement_schemas::derive::day_of_week;
use judgement_schemas::export::to_json_schema;
use judgement_schemas::{
    CaseRecord, EditSession, Grant, JsonFileStore, SchemaError, SchemaRegistry, Section,
    SynthesisMode, Synthesizer, Validator,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "case-verifier")]
#[command(about = "Validate and verify judgement case records")]
struct Cli {
    /// Configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a case record file and print the transformed record
    Validate {
        file: PathBuf,
    },

    /// Print the default value for a field
    Default {
        field: String,
        #[arg(short, long)]
        parent: Option<String>,
        /// Wrap array-valued fields in a one-element array
        #[arg(long)]
        append: bool,
    },

    /// List enum options for a field
    Options {
        field: String,
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// List computed fields
    Computed,

    /// Show weekday and holiday status of a date
    Holiday {
        date: NaiveDate,
    },

    /// Export a section's input schema as JSON Schema
    Export {
        section: Section,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mark a stored case as verified
    Verify {
        case_id: String,
    },

    /// Show or write configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        #[arg(default_value = "verifier.toml")]
        path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

/// Returns whether the command succeeded without findings
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = VerifierConfig::load_from(cli.config.as_deref())?;
    let registry = SchemaRegistry::standard()?.with_holidays(config.holiday_calendar());
    let output = config.output.format;

    match cli.command {
        Commands::Validate { file } => {
            let content = std::fs::read_to_string(&file)?;
            let record: CaseRecord = serde_json::from_str(&content)?;
            let result = Validator::new(&registry).validate(&record);
            println!("{}", output.render(&serde_json::to_value(&result)?)?);
            Ok(result.is_valid())
        }

        Commands::Default { field, parent, append } => {
            let mode = if append {
                SynthesisMode::ArrayAppend
            } else {
                SynthesisMode::WholeField
            };
            let value = Synthesizer::new(&registry).synthesize(&field, parent.as_deref(), mode);
            println!("{}", output.render(&value)?);
            Ok(true)
        }

        Commands::Options { field, parent } => {
            match registry.options_for(&field, parent.as_deref()) {
                Some(options) => {
                    for option in options {
                        println!("{}", option);
                    }
                    Ok(true)
                }
                None => {
                    eprintln!("No options registered for '{}'", field);
                    Ok(false)
                }
            }
        }

        Commands::Computed => {
            for name in registry.computed_fields() {
                println!("{}", name);
            }
            Ok(true)
        }

        Commands::Holiday { date } => {
            if !registry.holidays().covers(date.year()) {
                eprintln!(
                    "No holiday calendar for {}; add its gazetted dates to [holidays] extra_dates",
                    date.year()
                );
                return Ok(false);
            }
            let facts = json!({
                "date": date.to_string(),
                "day_of_week": day_of_week(date),
                "is_hk_public_holiday": registry.holidays().is_holiday(date),
            });
            println!("{}", output.render(&facts)?);
            Ok(true)
        }

        Commands::Export { section, output: path } => {
            let schema = to_json_schema(&registry, section)?;
            let rendered = output.render(&schema)?;
            match path {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Schema for {} written to {}", section, path.display());
                }
                None => println!("{}", rendered),
            }
            Ok(true)
        }

        Commands::Verify { case_id } => {
            let mut store = JsonFileStore::open(config.store_path())?;
            let reviewer = Grant {
                user: config.store.author.clone(),
                edit: true,
                verify: true,
            };
            let mut session = EditSession::load(&registry, &store, &case_id)?;
            session.start_editing(&reviewer)?;

            match session.mark_verified(&mut store, &reviewer) {
                Ok(()) => {
                    println!("Case {} verified", case_id);
                    Ok(true)
                }
                Err(SchemaError::VerificationBlocked(count)) => {
                    println!("Case {} has errors in {} section(s):", case_id, count);
                    for (section, errors) in &session.result().errors {
                        for error in errors {
                            println!("  {}: {}", section, error);
                        }
                    }
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(true)
            }
            ConfigAction::Init { path } => {
                VerifierConfig::default().save(&path)?;
                println!("Configuration written to {}", path);
                Ok(true)
            }
        },
    }
}
