//! cardboard - Personal Trello dashboard

mod cli;

use anyhow::{Context, Result};
use cardboard_core::config::{
    DEFAULT_RECENT_MONTHS, DEFAULT_TRELLO_API_URL, ENV_API_KEY, ENV_API_URL, ENV_BATCH_SIZE,
    ENV_RECENT_MONTHS, ENV_REQUEST_TIMEOUT_SECS, ENV_TOKEN, MAX_BATCH_SIZE,
};
use cardboard_core::models::CheckState;
use cardboard_core::{DashboardConfig, DashboardStore};
use cardboard_web::auth::{ENV_AUTH_PASSWORD, ENV_PROTECT_API, ENV_SECURE_COOKIE};
use cardboard_web::AuthConfig;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cardboard",
    version,
    about = "Personal Trello dashboard",
    long_about = "Shows the Trello cards assigned to you that saw activity recently,\n\
                  with board and list names and checklists resolved in batches.\n\
                  \n\
                  Examples:\n\
                    cardboard web                    # Serve the JSON API on port 3000\n\
                    cardboard cards                  # Print recent cards\n\
                    cardboard card <card-id>         # One card with its checklists\n\
                    cardboard lists <board-id>       # Lists of a board\n\
                    cardboard move <card> <list>     # Move a card\n\
                    cardboard check <card> <item> complete\n\
                  \n\
                  A .env file in the working directory is loaded before flags are read."
)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Trello API key
    #[arg(long, env = ENV_API_KEY, hide_env_values = true)]
    api_key: String,

    /// Trello API token
    #[arg(long, env = ENV_TOKEN, hide_env_values = true)]
    token: String,

    /// Trello REST base URL
    #[arg(long, env = ENV_API_URL, default_value = DEFAULT_TRELLO_API_URL)]
    api_url: String,

    /// URLs per batch request (1-10)
    #[arg(long, env = ENV_BATCH_SIZE, default_value_t = MAX_BATCH_SIZE)]
    batch_size: usize,

    /// Hide cards idle for longer than this many months
    #[arg(long, env = ENV_RECENT_MONTHS, default_value_t = DEFAULT_RECENT_MONTHS)]
    recent_months: u32,

    /// Per-request timeout in seconds
    #[arg(long, env = ENV_REQUEST_TIMEOUT_SECS)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the web server
    Web {
        /// Port for web server
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Dashboard password (login answers 500 without one)
        #[arg(long, env = ENV_AUTH_PASSWORD, hide_env_values = true)]
        password: Option<String>,

        /// Mark the session cookie Secure
        #[arg(long, env = ENV_SECURE_COOKIE)]
        secure_cookie: bool,

        /// Require a session for card and board routes
        #[arg(long, env = ENV_PROTECT_API)]
        protect_api: bool,
    },
    /// Print recently active cards
    Cards {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Disable ANSI colors
        #[arg(long, env = "NO_COLOR")]
        no_color: bool,
    },
    /// Show one card with its description and checklists
    Card {
        card_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the lists of a board
    Lists {
        board_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a card to another list
    Move { card_id: String, list_id: String },
    /// Set a checklist item to complete or incomplete
    Check {
        card_id: String,
        check_item_id: String,
        state: CheckState,
    },
}

impl Cli {
    fn dashboard_config(&self) -> Result<DashboardConfig> {
        let config = DashboardConfig {
            api_url: self.api_url.trim_end_matches('/').to_string(),
            api_key: self.api_key.clone(),
            token: self.token.clone(),
            batch_size: self.batch_size,
            recent_months: self.recent_months,
            request_timeout: self.timeout.map(Duration::from_secs),
        };
        config.validate().context("Invalid Trello configuration")?;
        Ok(config)
    }
}

fn auth_config(password: Option<String>, secure_cookie: bool, protect_api: bool) -> AuthConfig {
    AuthConfig {
        password: password.filter(|p| !p.is_empty()),
        secure_cookie,
        protect_api,
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine; real env vars win
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(match cli.mode {
        Mode::Web { .. } => "info",
        _ => "warn",
    });

    let store = DashboardStore::from_config(cli.dashboard_config()?)
        .context("Failed to create Trello client")?;

    match cli.mode {
        Mode::Web {
            port,
            host,
            password,
            secure_cookie,
            protect_api,
        } => {
            let auth = auth_config(password, secure_cookie, protect_api);
            run_web(store, auth, host, port).await?;
        }
        Mode::Cards { json, no_color } => {
            let cards = store.my_cards().await.context("Failed to fetch cards")?;
            println!("{}", cli::format_card_table(&cards, Utc::now(), json, no_color));
        }
        Mode::Card { card_id, json } => {
            let card = store.card(&card_id).await.context("Failed to load card")?;
            println!("{}", cli::format_card_detail(&card, Utc::now(), json));
        }
        Mode::Lists { board_id, json } => {
            let lists = store
                .board_lists(&board_id)
                .await
                .with_context(|| format!("Failed to fetch lists of board {}", board_id))?;
            println!("{}", cli::format_lists(&lists, json));
        }
        Mode::Move { card_id, list_id } => {
            store
                .move_card(&card_id, &list_id)
                .await
                .context("Failed to move card")?;
            println!("Moved card {} to list {}", card_id, list_id);
        }
        Mode::Check {
            card_id,
            check_item_id,
            state,
        } => {
            store
                .set_check_item_state(&card_id, None, &check_item_id, state)
                .await
                .context("Failed to update check item")?;
            println!("Marked item {} as {}", check_item_id, state);
        }
    }

    Ok(())
}

async fn run_web(store: DashboardStore, auth: AuthConfig, host: IpAddr, port: u16) -> Result<()> {
    if auth.password.is_none() {
        eprintln!("Warning: {} is not set; /api/authenticate will answer 500", ENV_AUTH_PASSWORD);
    }

    println!("\nBackend API: http://{}:{}/api/*", host, port);
    cardboard_web::run(Arc::new(store), auth, host, port).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["cardboard", "--api-key", "key", "--token", "tok"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_config_from_flags() {
        let cli = parse(&[
            "--api-url",
            "http://localhost:9999/1/",
            "--batch-size",
            "4",
            "--timeout",
            "15",
            "cards",
        ]);

        let config = cli.dashboard_config().unwrap();

        assert_eq!(config.api_url, "http://localhost:9999/1");
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_out_of_range_batch_size_rejected() {
        let cli = parse(&["--batch-size", "25", "cards"]);
        assert!(cli.dashboard_config().is_err());
    }

    #[test]
    fn test_check_parses_state() {
        let cli = parse(&["check", "c1", "i1", "complete"]);
        assert!(matches!(
            cli.mode,
            Mode::Check {
                state: CheckState::Complete,
                ..
            }
        ));

        let bad = Cli::try_parse_from([
            "cardboard", "--api-key", "key", "--token", "tok", "check", "c1", "i1", "done",
        ]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_card_subcommand() {
        let cli = parse(&["card", "c1", "--json"]);
        assert!(matches!(cli.mode, Mode::Card { ref card_id, json: true } if card_id == "c1"));
    }

    #[test]
    fn test_empty_password_counts_as_unset() {
        assert!(auth_config(Some(String::new()), false, false).password.is_none());
        let auth = auth_config(Some("hunter2".to_string()), true, false);
        assert_eq!(auth.password.as_deref(), Some("hunter2"));
        assert!(auth.secure_cookie);
    }
}
