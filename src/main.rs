//! cedrik - command-line client for the CEDRIK learning platform
//!
//! Sign in, chat with the course assistants and follow lab progress
//! from a terminal.

mod agent;
mod api;
mod app;
mod auth;
mod commands;
mod config;
mod models;
mod notify;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::agent::Agent;
use crate::app::App;
use crate::commands::{account, chat, labs};
use crate::notify::Notice;

#[derive(Parser)]
#[command(name = "cedrik")]
#[command(about = "CLI client for the CEDRIK education platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Assistant persona to chat with
    #[arg(short, long, global = true, value_enum, default_value_t = Agent::Professor)]
    agent: Agent,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Change username and/or password
    UpdateProfile {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Reset a forgotten password with an emailed code
    ForgotPassword {
        #[arg(short, long)]
        email: Option<String>,
    },

    /// List users (admin only)
    Users {
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long, default_value = "20")]
        max_items: u32,
    },

    /// List your conversations
    Chats {
        /// Maximum number of chats to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Read messages from a conversation
    Read {
        /// Conversation ID (from `chats` output)
        conversation_id: String,

        /// Maximum number of messages to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Send a single message
    Send {
        /// Conversation ID; a new conversation is started when omitted
        #[arg(short, long)]
        conversation: Option<String>,

        /// File to attach
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Message content
        message: String,
    },

    /// Interactive chat
    Chat {
        /// Continue this conversation instead of starting a new one
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// List lab scenarios
    Scenarios,

    /// Show one lab scenario
    Scenario { scenario_id: String },

    /// Start a lab scenario
    Start { scenario_id: String },

    /// Show your exercise progress
    Progress {
        #[arg(short, long)]
        scenario: Option<String>,
    },

    /// Show your lab grades
    Grades,

    /// Show your lab summary
    Summary,

    /// KaliGPT status, or connect with --connect
    Kaligpt {
        #[arg(long)]
        connect: bool,
    },
}

impl Commands {
    /// Heading for failure notices
    fn title(&self) -> &'static str {
        match self {
            Commands::Register { .. } => "Sign up failed",
            Commands::Login { .. } => "Login failed",
            Commands::Logout => "Logout failed",
            Commands::UpdateProfile { .. } => "Update failed",
            Commands::ForgotPassword { .. } => "Password reset failed",
            _ => "Error",
        }
    }
}

async fn run(app: &mut App, command: Commands) -> Result<()> {
    match command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            tracing::info!("Creating account...");
            account::register(app, username, email, password).await
        }
        Commands::Login { email, password } => {
            tracing::info!("Signing in...");
            account::login(app, email, password).await
        }
        Commands::Logout => {
            tracing::info!("Logging out...");
            account::logout(app).await
        }
        Commands::Whoami => account::whoami(app).await,
        Commands::UpdateProfile { username, password } => {
            account::update_profile(app, username, password).await
        }
        Commands::ForgotPassword { email } => account::forgot_password(app, email).await,
        Commands::Users { page, max_items } => account::list_users(app, page, max_items).await,
        Commands::Chats { limit } => {
            tracing::info!("Fetching chats...");
            chat::list_chats(app, limit).await
        }
        Commands::Read {
            conversation_id,
            limit,
        } => chat::read_conversation(app, &conversation_id, limit).await,
        Commands::Send {
            conversation,
            file,
            message,
        } => {
            tracing::info!("Sending message...");
            chat::send(app, conversation, &message, file).await
        }
        Commands::Chat { conversation } => chat::run_chat(app, conversation).await,
        Commands::Scenarios => labs::list_scenarios(app).await,
        Commands::Scenario { scenario_id } => labs::show_scenario(app, &scenario_id).await,
        Commands::Start { scenario_id } => labs::start_scenario(app, &scenario_id).await,
        Commands::Progress { scenario } => labs::show_progress(app, scenario.as_deref()).await,
        Commands::Grades => labs::show_grades(app).await,
        Commands::Summary => labs::show_summary(app).await,
        Commands::Kaligpt { connect } => labs::kaligpt(app, connect).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = config::Config::load()?;
    let mut app = App::start(config, cli.agent).await?;

    let title = cli.command.title();
    let result = run(&mut app, cli.command).await;

    // Cookies may have changed even when the command failed
    if let Err(e) = app.persist() {
        tracing::warn!("Failed to save session: {}", e);
    }

    if let Err(e) = result {
        Notice::from_any(title, &e).print();
        std::process::exit(1);
    }
    Ok(())
}
