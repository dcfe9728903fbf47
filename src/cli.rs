use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::parser::DEFAULT_DELIMITER;
use crate::product::{MetadataQuery, Product};

#[derive(Parser, Debug)]
#[command(name = "schema-leveler")]
#[command(version, about = "Assign foreign-key load levels to database tables")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute table levels from a SQLite database or delimited metadata files
    Level {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the level list to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pipe)]
        format: OutputFormat,

        /// Write levels as "LV n" instead of bare numbers
        #[arg(long)]
        prefixed: bool,
    },

    /// Level tables and pick an incremental load strategy for each
    Plan {
        #[command(flatten)]
        source: SourceArgs,

        /// Column list file (table_name and data_type columns)
        #[arg(long, value_name = "FILE")]
        columns: Option<PathBuf>,

        /// Key constraint list file (table_name, optional constraint_type)
        #[arg(long, value_name = "FILE")]
        constraints: Option<PathBuf>,

        /// Write the plan to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pipe)]
        format: OutputFormat,

        /// Write levels as "LV n" instead of bare numbers
        #[arg(long)]
        prefixed: bool,
    },

    /// Show tables grouped by level from a level list
    Batches {
        /// Level list written by `level`
        level_list: PathBuf,

        /// Only show this level
        #[arg(short, long)]
        level: Option<u32>,
    },

    /// Generate one command per table of a level
    Scripts {
        /// Level list written by `level`
        level_list: PathBuf,

        /// Level to generate commands for
        #[arg(short, long)]
        level: u32,

        /// Schema name substituted for {schema}
        #[arg(short, long)]
        schema: String,

        /// Command template using {schema}, {table} and {level}
        #[arg(short, long)]
        template: String,

        /// Write the commands to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the metadata SQL for a database product
    Queries {
        /// oracle, postgresql, mysql, mariadb or sqlite
        product: Product,

        /// Schema (owner, database, or attached SQLite database name)
        schema: String,

        /// Only print this query
        #[arg(short, long, value_enum)]
        kind: Option<QueryKind>,
    },

    /// Validate and list configured connections
    Credentials {
        /// Credential file (defaults to the user config directory)
        #[arg(short, long, env = "SCHEMA_LEVELER_CREDENTIALS")]
        file: Option<PathBuf>,
    },
}

/// Where the tables and foreign keys to level come from
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// SQLite database to read tables and foreign keys from
    #[arg(long, value_name = "DB")]
    pub sqlite: Option<PathBuf>,

    /// Table list file (table_name column)
    #[arg(short, long, value_name = "FILE")]
    pub tables: Option<PathBuf>,

    /// Relation list file (table_name and parent_table_name columns)
    #[arg(short, long, value_name = "FILE")]
    pub relations: Option<PathBuf>,

    /// Drop relations that name tables missing from the table list
    #[arg(long)]
    pub allow_unknown: bool,

    /// Field separator of the input files
    #[arg(short, long, default_value_t = DEFAULT_DELIMITER)]
    pub delimiter: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `table name|LEVEL` rows
    Pipe,
    /// JSON array of {"table", "level"}
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryKind {
    Tables,
    Relations,
    Columns,
    Constraints,
}

impl From<QueryKind> for MetadataQuery {
    fn from(kind: QueryKind) -> Self {
        match kind {
            QueryKind::Tables => MetadataQuery::Tables,
            QueryKind::Relations => MetadataQuery::Relations,
            QueryKind::Columns => MetadataQuery::Columns,
            QueryKind::Constraints => MetadataQuery::Constraints,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
