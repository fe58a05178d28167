//! CardHub CLI - browse the catalog, manage the cart and the account.
//!
//! # Usage
//!
//! ```bash
//! # Search the catalog
//! cardhub search "lightning bolt" --page 2
//!
//! # Add two slightly played copies to the cart
//! cardhub cart add "lightning bolt" --id 1042 --quality SP --quantity 2
//!
//! # Show the cart, split into purchases and pre-orders
//! cardhub cart show
//!
//! # Sign in (password from CARDHUB_PASSWORD or --password)
//! cardhub login -e jace@example.com
//!
//! # Link Telegram for order notifications
//! cardhub profile update --telegram @jace_tg
//! ```
//!
//! Settings come from the environment (see `StorefrontConfig::from_env`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use cardhub_core::{CardId, Quality};
use cardhub_storefront::checkout::CheckoutKind;
use cardhub_storefront::config::StorefrontConfig;
use cardhub_storefront::error::AppError;
use cardhub_storefront::session::Registration;
use cardhub_storefront::telemetry;

mod commands;
mod render;

use commands::Context;

#[derive(Parser)]
#[command(name = "cardhub")]
#[command(author, version, about = "CardHub trading card storefront")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog by card name
    Search {
        /// Part of the card name
        query: String,

        /// Results page (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Show one card from a search
    Card {
        /// Card name to search for
        query: String,

        /// Pick this card id from the results
        #[arg(long)]
        id: Option<CardId>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "CARDHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "CARDHUB_PASSWORD", hide_env_values = true)]
        password: String,

        /// Repeat the password
        #[arg(long, env = "CARDHUB_PASSWORD_CONFIRM", hide_env_values = true)]
        confirm_password: String,
    },
    /// Sign out
    Logout,
    /// Show or edit the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// List the cart
    Show,
    /// Add a card found by name
    Add {
        /// Card name to search for
        query: String,

        /// Pick this card id from the results
        #[arg(long)]
        id: Option<CardId>,

        /// Grade (NM, SP, MP, HP, DM)
        #[arg(short, long, default_value_t = Quality::NM)]
        quality: Quality,

        #[arg(short = 'n', long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line
    Remove {
        card_id: CardId,

        #[arg(default_value_t = Quality::NM)]
        quality: Quality,
    },
    /// Change the quantity of a line
    Set {
        card_id: CardId,
        quality: Quality,
        quantity: u32,
    },
    /// Empty the cart
    Clear,
    /// Check out part of the cart
    Checkout {
        #[command(subcommand)]
        kind: CheckoutTarget,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum CheckoutTarget {
    /// In-stock cards
    Purchase,
    /// Pre-orders, sent to a manager
    Preorder,
    /// Both at once
    All,
}

impl From<CheckoutTarget> for CheckoutKind {
    fn from(target: CheckoutTarget) -> Self {
        match target {
            CheckoutTarget::Purchase => Self::Purchase,
            CheckoutTarget::Preorder => Self::Preorder,
            CheckoutTarget::All => Self::All,
        }
    }
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the signed-in account
    Show,
    /// Change the display name or Telegram handle
    Update {
        #[arg(short, long)]
        username: Option<String>,

        /// Telegram handle, with or without the leading @
        #[arg(short, long)]
        telegram: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            render::failure(&AppError::from(e));
            return ExitCode::FAILURE;
        }
    };

    let _telemetry = telemetry::init(&config.sentry, config.log_format, cli.verbose);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            render::failure(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &StorefrontConfig) -> Result<(), AppError> {
    let ctx = Context::new(config)?;

    match command {
        Commands::Search { query, page } => commands::catalog::search(&ctx, &query, page).await,
        Commands::Card { query, id } => commands::catalog::show(&ctx, &query, id).await,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx),
            CartAction::Add {
                query,
                id,
                quality,
                quantity,
            } => commands::cart::add(&ctx, &query, id, quality, quantity).await,
            CartAction::Remove { card_id, quality } => {
                commands::cart::remove(&ctx, card_id, quality)
            }
            CartAction::Set {
                card_id,
                quality,
                quantity,
            } => commands::cart::set(&ctx, card_id, quality, quantity),
            CartAction::Clear => commands::cart::clear(&ctx),
            CartAction::Checkout { kind } => commands::cart::checkout(&ctx, kind.into()),
        },
        Commands::Login { email, password } => {
            commands::account::login(&ctx, &email, &SecretString::from(password)).await
        }
        Commands::Register {
            username,
            email,
            password,
            confirm_password,
        } => {
            let form = Registration {
                username,
                email,
                password: SecretString::from(password),
                confirm_password: SecretString::from(confirm_password),
            };
            commands::account::register(&ctx, &form).await
        }
        Commands::Logout => commands::account::logout(&ctx),
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::account::profile(&ctx).await,
            ProfileAction::Update { username, telegram } => {
                commands::account::update_profile(&ctx, username.as_deref(), telegram.as_deref())
                    .await
            }
        },
    }
}
