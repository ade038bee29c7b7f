//! basic-auth admin CLI.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use basic_auth::collection::{CredentialDetails, DateRange};
use basic_auth::{StoreConfig, logging, open_collection};

#[derive(Parser, Debug)]
#[command(name = "basic-auth", version, about = "Manage Basic-Auth credentials")]
struct Cli {
    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create credentials for a user
    Create {
        #[arg(long)]
        user: String,
        /// `username:password`; random credentials when omitted
        #[arg(long)]
        token: Option<String>,
    },
    /// Show the stored token of a user
    Get { user: String },
    /// List users and usernames
    List {
        /// Only entries updated at or after this RFC 3339 time
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Only entries updated at or before this RFC 3339 time
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },
    /// Replace the credentials of a user
    Update {
        user: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Delete the credentials of a user
    Delete { user: String },
    /// Check a username/password pair
    Check { username: String, password: String },
    /// Check a username/password pair against the API credentials
    CheckApi { username: String, password: String },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = StoreConfig::from_env().context("Failed to load configuration")?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let _guard = logging::init_logging(config.log_dir.as_deref())?;

    let collection = open_collection(&config)
        .await
        .context("Failed to open credentials collection")?;

    match cli.command {
        Command::Create { user, token } => {
            let record = collection.create(CredentialDetails { user, token }).await?;
            print_json(&record)?;
        }
        Command::Get { user } => {
            print_json(&collection.get(&user).await?)?;
        }
        Command::List { since, until } => {
            print_json(&collection.get_all(DateRange::new(since, until)).await?)?;
        }
        Command::Update { user, token } => {
            print_json(&collection.update(&user, token.as_deref()).await?)?;
        }
        Command::Delete { user } => {
            collection.delete(&user).await?;
            tracing::info!("deleted credentials for {}", user);
        }
        Command::Check { username, password } => {
            let matched = collection.credentials_match(&username, &password).await?;
            print_json(&serde_json::json!({ "match": matched }))?;
        }
        Command::CheckApi { username, password } => {
            let matched = collection
                .api_credentials_match(&username, &password)
                .await?;
            print_json(&serde_json::json!({ "match": matched }))?;
        }
    }

    Ok(())
}
