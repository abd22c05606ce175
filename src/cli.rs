use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{self, eyre};

use crate::api::HelixApiClient;
use crate::auth::credentials::load_credentials;
use crate::auth::{Viewer, validate_token};
use crate::blocks::{BlockStore, FileBlockStore, MemoryBlockStore};
use crate::command::{UserRef, parse_channel, parse_user_ref};
use crate::config::{AppConfig, load_config};
use crate::popup::{
    DateFormatter, PopupAction, PopupArgs, PopupState, UserPopupController,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "chattertui", about = "Twitch user popup for the terminal")]
pub struct Cli {
    /// Keep blocks in memory instead of the block list file
    #[arg(long, global = true)]
    pub ephemeral_blocks: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Open the interactive popup (default: your own profile)
    Tui {
        /// Login (with or without @), numeric id, or channel URL
        user: Option<String>,
        /// Channel to show the follow date for
        #[arg(long, short)]
        channel: Option<String>,
    },
    /// Print the popup state for a user (JSONL)
    User(TargetArgs),
    /// Follow a user and print the reloaded state (JSONL)
    Follow(TargetArgs),
    /// Unfollow a user and print the reloaded state (JSONL)
    Unfollow(TargetArgs),
    /// Block a user and print the reloaded state (JSONL)
    Block(TargetArgs),
    /// Unblock a user and print the reloaded state (JSONL)
    Unblock(TargetArgs),
    /// List locally blocked user ids (JSONL)
    Blocks,
    /// Validate the token and print the viewer (JSONL)
    Whoami,
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Login (with or without @), numeric id, or channel URL
    pub user: String,
    /// Channel to show the follow date for
    #[arg(long, short)]
    pub channel: Option<String>,
}

// ---------------------------------------------------------------------------
// Session (shared with main.rs TUI path)
// ---------------------------------------------------------------------------

/// Everything needed to open popups for the authenticated viewer.
pub struct Session {
    pub config: AppConfig,
    pub client: Arc<HelixApiClient>,
    pub viewer: Viewer,
    pub blocks: Arc<dyn BlockStore>,
}

/// Build the block store selected by config and flags.
pub fn block_store(config: &AppConfig, ephemeral: bool) -> Arc<dyn BlockStore> {
    if ephemeral {
        tracing::info!("using in-memory block list");
        Arc::new(MemoryBlockStore::default())
    } else {
        let path = config.block_list_path();
        tracing::debug!(path = %path.display(), "using block list file");
        Arc::new(FileBlockStore::new(path))
    }
}

/// Load credentials, validate the token, and build the API client.
pub async fn connect(ephemeral_blocks: bool) -> eyre::Result<Session> {
    let config = load_config();
    let creds = load_credentials()?;

    let viewer = validate_token(&reqwest::Client::new(), &creds).await?;
    tracing::info!(login = %viewer.login, user_id = %viewer.user_id, "authenticated");

    let client = HelixApiClient::with_base_url(viewer.client_id.clone(), &config.helix_base_url);
    let blocks = block_store(&config, ephemeral_blocks);

    Ok(Session {
        config,
        client: Arc::new(client),
        viewer,
        blocks,
    })
}

impl Session {
    /// Resolve a user argument to a numeric id.
    pub async fn resolve_user(&self, input: &str) -> eyre::Result<String> {
        match parse_user_ref(input).ok_or_else(|| eyre!("not a user id, login, or URL: {input}"))? {
            UserRef::Id(id) => Ok(id),
            UserRef::Login(login) => Ok(self
                .client
                .get_user_id_by_name(&self.viewer.oauth_token, &login)
                .await?),
        }
    }

    /// Create a popup controller for `target_user_id`; the initial load starts
    /// immediately.
    pub fn open_popup(&self, target_user_id: String, channel: Option<String>) -> UserPopupController {
        let args = PopupArgs {
            target_user_id,
            current_user_id: self.viewer.user_id.clone(),
            channel,
            oauth: self.viewer.oauth_token.clone(),
        };
        UserPopupController::new(
            self.client.clone(),
            Arc::clone(&self.blocks),
            args,
            DateFormatter::new(&self.config.date_format),
        )
    }
}

/// Normalize an optional `--channel` argument to a login.
pub fn channel_arg(channel: Option<&str>) -> eyre::Result<Option<String>> {
    channel
        .map(|c| parse_channel(c).ok_or_else(|| eyre!("not a channel name or URL: {c}")))
        .transpose()
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

/// Self-contained JSON object for one popup state.
fn state_json(state: &PopupState) -> serde_json::Value {
    match state {
        PopupState::Loading => serde_json::json!({ "state": "loading" }),
        PopupState::Error { cause: None } => serde_json::json!({
            "state": "error",
            "cause": null,
        }),
        PopupState::Error { cause: Some(cause) } => serde_json::json!({
            "state": "error",
            "cause": cause.to_string(),
        }),
        PopupState::Success(user) => serde_json::json!({
            "state": "success",
            "user": user,
        }),
    }
}

fn print_state(state: &PopupState) -> eyre::Result<()> {
    println!("{}", serde_json::to_string(&state_json(state))?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

fn action_for(cmd: &CliCommand) -> Option<(PopupAction, &TargetArgs)> {
    match cmd {
        CliCommand::Follow(target) => Some((PopupAction::Follow, target)),
        CliCommand::Unfollow(target) => Some((PopupAction::Unfollow, target)),
        CliCommand::Block(target) => Some((PopupAction::Block, target)),
        CliCommand::Unblock(target) => Some((PopupAction::Unblock, target)),
        _ => None,
    }
}

pub async fn run_command(cmd: CliCommand, ephemeral_blocks: bool) -> eyre::Result<()> {
    match cmd {
        CliCommand::Tui { .. } => unreachable!("tui is handled in main"),

        // Local only; no token needed.
        CliCommand::Blocks => {
            let blocks = block_store(&load_config(), ephemeral_blocks);
            for id in blocks.list_blocks().await? {
                let line = serde_json::to_string(&serde_json::json!({ "user_id": id }))?;
                println!("{line}");
            }
        }

        CliCommand::Whoami => {
            let session = connect(ephemeral_blocks).await?;
            let viewer = &session.viewer;
            let line = serde_json::to_string(&serde_json::json!({
                "login": viewer.login,
                "user_id": viewer.user_id,
                "client_id": viewer.client_id,
            }))?;
            println!("{line}");
        }

        CliCommand::User(target) => {
            let session = connect(ephemeral_blocks).await?;
            let user_id = session.resolve_user(&target.user).await?;
            let channel = channel_arg(target.channel.as_deref())?;

            let popup = session.open_popup(user_id, channel);
            let state = popup.settled().await;
            print_state(&state)?;
            if let PopupState::Error { cause } = state {
                return Err(match cause {
                    Some(cause) => eyre!("failed to load {}: {cause}", target.user),
                    None => eyre!("no such user: {}", target.user),
                });
            }
        }

        ref cmd => {
            let Some((action, target)) = action_for(cmd) else {
                unreachable!("every other command is an action");
            };
            let session = connect(ephemeral_blocks).await?;
            let user_id = session.resolve_user(&target.user).await?;
            let channel = channel_arg(target.channel.as_deref())?;

            let popup = session.open_popup(user_id, channel);
            popup.idle().await;
            let handle = popup
                .perform(action)
                .ok_or_else(|| eyre!("popup is busy, {action} not sent"))?;
            handle.await?;

            let state = popup.state();
            print_state(&state)?;
            if let PopupState::Error { cause } = state {
                let cause = cause.map_or_else(|| "user not found".to_string(), |c| c.to_string());
                return Err(eyre!("{action} failed: {cause}"));
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClientError;
    use crate::popup::{PopupError, UserInfo};

    fn info() -> UserInfo {
        UserInfo {
            user_id: "123".into(),
            username: "foo".into(),
            display_name: "Foo".into(),
            created_at: "Jan 1, 2019".into(),
            avatar_url: "u".into(),
            is_following: false,
            following_since: Some("Jan 1, 2020".into()),
            followed_at: None,
            is_blocked: true,
        }
    }

    #[test]
    fn success_state_embeds_user() {
        let json = state_json(&PopupState::Success(info()));
        assert_eq!(json["state"], "success");
        assert_eq!(json["user"]["user_id"], "123");
        assert_eq!(json["user"]["following_since"], "Jan 1, 2020");
        assert_eq!(json["user"]["is_blocked"], true);
        assert!(json["user"].get("followed_at").is_none());
    }

    #[test]
    fn error_state_carries_cause_text() {
        let missing = state_json(&PopupState::Error { cause: None });
        assert_eq!(missing["state"], "error");
        assert!(missing["cause"].is_null());

        let failed = state_json(&PopupState::error(PopupError::Service(
            ApiClientError::NotFound("xqc".into()),
        )));
        assert_eq!(failed["cause"], "no such user: xqc");
    }

    #[test]
    fn channel_arg_accepts_names_and_urls() {
        assert_eq!(channel_arg(None).unwrap(), None);
        assert_eq!(channel_arg(Some("#XQC")).unwrap().as_deref(), Some("xqc"));
        assert_eq!(
            channel_arg(Some("https://www.twitch.tv/xqc")).unwrap().as_deref(),
            Some("xqc")
        );
        assert!(channel_arg(Some("not a channel")).is_err());
    }

    #[test]
    fn action_commands_map_to_popup_actions() {
        let target = TargetArgs {
            user: "foo".into(),
            channel: None,
        };
        let cmd = CliCommand::Unblock(target);
        let (action, target) = action_for(&cmd).unwrap();
        assert_eq!(action, PopupAction::Unblock);
        assert_eq!(target.user, "foo");
        assert!(action_for(&CliCommand::Whoami).is_none());
    }

    #[test]
    fn cli_parses_target_and_channel() {
        let cli = Cli::parse_from(["chattertui", "follow", "@foo", "--channel", "xqc"]);
        let Some(CliCommand::Follow(target)) = cli.command else {
            panic!("expected follow");
        };
        assert_eq!(target.user, "@foo");
        assert_eq!(target.channel.as_deref(), Some("xqc"));
        assert!(!cli.ephemeral_blocks);
    }
}
