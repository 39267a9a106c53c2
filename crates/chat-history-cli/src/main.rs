//! chat-history - Command-line interface for SQLite chat history tables.

mod commands;
mod logging;
mod output;

use anyhow::Result;
use chat_history_store::Config;
use clap::{Parser, Subcommand};
use commands::MessageRole;
use std::path::PathBuf;
use tracing::{debug, warn};

/// chat-history - Create, inspect, and edit chat history tables.
#[derive(Parser)]
#[command(name = "chat-history")]
#[command(about = "Manage chat message history stored in SQLite")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON config file
    #[arg(long, global = true, env = "CHAT_HISTORY_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the config
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append JSON logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a chat history table, or check an existing one
    InitTable {
        /// Table name
        table: Option<String>,
    },

    /// Drop a chat history table
    DropTable {
        /// Table name
        table: Option<String>,
        /// Succeed when the table does not exist
        #[arg(long)]
        if_exists: bool,
    },

    /// Validate a table's columns
    Validate {
        /// Table name
        table: Option<String>,
        /// Also require TEXT affinity on session_id and data
        #[arg(long)]
        strict: bool,
    },

    /// Append a message to a session
    Add {
        /// Session ID
        #[arg(short, long)]
        session: String,
        /// Table name
        #[arg(short, long)]
        table: Option<String>,
        /// Message author
        #[arg(short, long, value_enum, default_value = "human")]
        role: MessageRole,
        /// Message text
        text: String,
    },

    /// List a session's messages
    List {
        /// Session ID
        #[arg(short, long)]
        session: String,
        /// Table name
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Delete a session's messages
    Clear {
        /// Session ID
        #[arg(short, long)]
        session: String,
        /// Table name
        #[arg(short, long)]
        table: Option<String>,
    },

    /// List the sessions stored in a table
    Sessions {
        /// Table name
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Print a new random session ID
    NewSession,
}

fn run(cli: Cli) -> Result<()> {
    let (mut config, ignored) = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    logging::init_logging(&level, cli.log_file.as_deref())?;
    for message in &ignored {
        warn!("{}", message);
    }
    debug!(database = %config.database_path.display(), "Configuration loaded");

    let format = cli.format;
    if let Commands::NewSession = cli.command {
        return commands::new_session(&format);
    }

    let engine = commands::open_engine(&config)?;

    match cli.command {
        Commands::InitTable { table } => {
            commands::init_table(&engine, commands::resolve_table(&config, table.as_deref()), &format)
        }
        Commands::DropTable { table, if_exists } => commands::drop_table(
            &engine,
            commands::resolve_table(&config, table.as_deref()),
            if_exists,
            &format,
        ),
        Commands::Validate { table, strict } => commands::validate_table(
            &engine,
            commands::resolve_table(&config, table.as_deref()),
            strict,
            &format,
        ),
        Commands::Add {
            session,
            table,
            role,
            text,
        } => commands::add_message(
            &engine,
            commands::resolve_table(&config, table.as_deref()),
            &session,
            role,
            &text,
            &format,
        ),
        Commands::List { session, table } => commands::list_messages(
            &engine,
            commands::resolve_table(&config, table.as_deref()),
            &session,
            &format,
        ),
        Commands::Clear { session, table } => commands::clear_messages(
            &engine,
            commands::resolve_table(&config, table.as_deref()),
            &session,
            &format,
        ),
        Commands::Sessions { table } => commands::list_sessions(
            &engine,
            commands::resolve_table(&config, table.as_deref()),
            &format,
        ),
        Commands::NewSession => commands::new_session(&format),
    }
}

fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli) {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}
