pub mod api;
pub mod app;
pub mod auth;
pub mod avatar;
pub mod blocks;
pub mod cli;
pub mod command;
pub mod config;
pub mod event;
pub mod popup;
pub mod ui;

use app::App;
use avatar::{AvatarLoader, DisplayContext};
use clap::Parser;
use cli::{Cli, CliCommand};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Initialize tracing (logs to stderr if RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        // No subcommand → popup for the viewer's own profile.
        None => run_tui(None, None, cli.ephemeral_blocks).await,
        Some(CliCommand::Tui { user, channel }) => {
            run_tui(user, channel, cli.ephemeral_blocks).await
        }
        // All other subcommands → non-interactive JSONL output.
        Some(cmd) => cli::run_command(cmd, cli.ephemeral_blocks).await,
    }
}

/// Launch the interactive popup.
async fn run_tui(
    user: Option<String>,
    channel: Option<String>,
    ephemeral_blocks: bool,
) -> color_eyre::Result<()> {
    let session = cli::connect(ephemeral_blocks).await?;

    let target = match user {
        Some(ref user) => session.resolve_user(user).await?,
        None => session.viewer.user_id.clone(),
    };
    let channel = cli::channel_arg(channel.as_deref())?;

    let popup = session.open_popup(target, channel);
    let avatar_loader = AvatarLoader::new(
        reqwest::Client::new(),
        DisplayContext::square(session.config.avatar_size),
    );

    let terminal = ratatui::init();
    let result = App::new(session.config.clone(), popup, avatar_loader)
        .run(terminal)
        .await;
    ratatui::restore();
    result
}
