use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Dealership back-office persistence tools",
    long_about = "Seed and inspect the classifier registry, query banks by example and check model-year ranges against a dealer SQLite database."
)]
pub struct Cli {
    #[arg(
        long,
        env = "DEALER_DB_PATH",
        value_name = "PATH",
        help = "SQLite database file; `:memory:` for a throwaway database"
    )]
    pub db: Option<PathBuf>,

    #[arg(
        long,
        env = "DEALER_LOG_DIR",
        value_name = "DIR",
        help = "Write rotating log files into DIR"
    )]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Resolve every canonical classifier, creating missing rows")]
    Seed,
    #[command(about = "List stored classifiers, optionally of one type")]
    Classifiers {
        #[arg(long = "type", value_name = "TYPE")]
        classifier_type: Option<String>,
    },
    #[command(about = "Resolve a classifier by type and value, creating it when absent")]
    Resolve {
        #[arg(value_name = "TYPE")]
        classifier_type: String,
        #[arg(value_name = "VALUE")]
        value: String,
        #[arg(long, default_value = "", help = "Label stored when the row is created")]
        label: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    #[command(about = "Query banks by example")]
    Banks {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(
            long,
            default_value_t = false,
            help = "Substring match on text fields instead of equality"
        )]
        search: bool,
    },
    #[command(about = "List stored associations overlapping a model-year range")]
    CheckOverlap {
        #[arg(value_enum, value_name = "KIND")]
        kind: AssociationKind,
        #[arg(value_name = "OWNER_ID", help = "Item or product id")]
        owner_id: i64,
        #[arg(value_name = "MODEL_ID")]
        model_id: i64,
        #[arg(value_name = "START")]
        start: i32,
        #[arg(value_name = "END")]
        end: i32,
        #[arg(long, value_name = "ID", help = "Ignore this association id")]
        exclude: Option<i64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    Item,
    Product,
}

pub fn parse() -> Cli {
    Cli::parse()
}
