//! User-info popup controller.
//!
//! Owns the popup's [`PopupState`], loads it from the [`UserService`] and
//! [`BlockStore`] collaborators, and reloads it after every follow/block
//! action. One load or action runs at a time; dispatches made while one is in
//! flight are rejected.

pub mod state;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::types::FollowsResponse;
use crate::api::{ApiClientError, UserService};
use crate::blocks::{BlockStore, BlockStoreError};

pub use state::{DateFormatter, PopupState, UserInfo};

#[derive(Debug, Error)]
pub enum PopupError {
    #[error(transparent)]
    Service(#[from] ApiClientError),
    #[error(transparent)]
    BlockStore(#[from] BlockStoreError),
}

/// Fixed inputs for one popup, read-only for its lifetime.
#[derive(Clone)]
pub struct PopupArgs {
    pub target_user_id: String,
    pub current_user_id: String,
    /// Channel the popup was opened from, by login name.
    pub channel: Option<String>,
    pub oauth: String,
}

impl fmt::Debug for PopupArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupArgs")
            .field("target_user_id", &self.target_user_id)
            .field("current_user_id", &self.current_user_id)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
    Follow,
    Unfollow,
    Block,
    Unblock,
}

impl fmt::Display for PopupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Follow => "follow",
            Self::Unfollow => "unfollow",
            Self::Block => "block",
            Self::Unblock => "unblock",
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Load,
    Action(PopupAction),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct UserPopupController {
    shared: Arc<Shared>,
    state_rx: watch::Receiver<PopupState>,
}

struct Shared {
    service: Arc<dyn UserService>,
    blocks: Arc<dyn BlockStore>,
    args: PopupArgs,
    dates: DateFormatter,
    state_tx: watch::Sender<PopupState>,
    in_flight: Arc<Mutex<()>>,
    cancel: CancellationToken,
}

impl UserPopupController {
    /// Create the controller and start the initial load.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        service: Arc<dyn UserService>,
        blocks: Arc<dyn BlockStore>,
        args: PopupArgs,
        dates: DateFormatter,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(PopupState::Loading);
        let controller = Self {
            shared: Arc::new(Shared {
                service,
                blocks,
                args,
                dates,
                state_tx,
                in_flight: Arc::new(Mutex::new(())),
                cancel: CancellationToken::new(),
            }),
            state_rx,
        };
        let _ = controller.dispatch(Operation::Load);
        controller
    }

    pub fn args(&self) -> &PopupArgs {
        &self.shared.args
    }

    /// Latest state value.
    pub fn state(&self) -> PopupState {
        self.state_rx.borrow().clone()
    }

    /// Observe every state replacement.
    pub fn subscribe(&self) -> watch::Receiver<PopupState> {
        self.shared.state_tx.subscribe()
    }

    /// Wait for the first state that is not `Loading`.
    pub async fn settled(&self) -> PopupState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            // Sender lives in `shared`, which we hold.
            Err(_) => self.state(),
        }
    }

    /// Wait until no load or action is in flight.
    pub async fn idle(&self) {
        let _guard = self.shared.in_flight.lock().await;
    }

    pub fn is_busy(&self) -> bool {
        self.shared.in_flight.try_lock().is_err()
    }

    /// Re-run the full load, e.g. to retry from an error state.
    pub fn reload(&self) -> Option<JoinHandle<()>> {
        self.dispatch(Operation::Load)
    }

    pub fn follow_user(&self) -> Option<JoinHandle<()>> {
        self.perform(PopupAction::Follow)
    }

    pub fn unfollow_user(&self) -> Option<JoinHandle<()>> {
        self.perform(PopupAction::Unfollow)
    }

    pub fn block_user(&self) -> Option<JoinHandle<()>> {
        self.perform(PopupAction::Block)
    }

    pub fn unblock_user(&self) -> Option<JoinHandle<()>> {
        self.perform(PopupAction::Unblock)
    }

    /// Run `action` and reload. Returns `None` if another operation is in
    /// flight or the controller has been shut down.
    pub fn perform(&self, action: PopupAction) -> Option<JoinHandle<()>> {
        self.dispatch(Operation::Action(action))
    }

    /// Cancel any in-flight work; later dispatches are ignored.
    pub fn shutdown(&self) {
        self.shared.cancel.cancel();
    }

    fn dispatch(&self, op: Operation) -> Option<JoinHandle<()>> {
        if self.shared.cancel.is_cancelled() {
            tracing::debug!(?op, "popup shut down, ignoring");
            return None;
        }
        let Ok(permit) = Arc::clone(&self.shared.in_flight).try_lock_owned() else {
            tracing::debug!(?op, "popup busy, ignoring");
            return None;
        };

        let shared = Arc::clone(&self.shared);
        Some(tokio::spawn(async move {
            let _permit = permit;
            tokio::select! {
                biased;
                _ = shared.cancel.cancelled() => {
                    tracing::debug!(?op, "popup operation cancelled");
                }
                _ = shared.run(op) => {}
            }
        }))
    }
}

impl Drop for UserPopupController {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl Shared {
    fn publish(&self, state: PopupState) {
        self.state_tx.send_replace(state);
    }

    async fn run(&self, op: Operation) {
        self.publish(PopupState::Loading);

        if let Operation::Action(action) = op {
            if let Err(e) = self.apply(action).await {
                tracing::warn!(%action, user_id = %self.args.target_user_id, error = %e, "popup action failed");
                self.publish(PopupState::error(e));
                return;
            }
            tracing::info!(%action, user_id = %self.args.target_user_id, "popup action applied");
        }

        let state = match self.load().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(user_id = %self.args.target_user_id, error = %e, "popup load failed");
                PopupState::error(e)
            }
        };
        if matches!(state, PopupState::Error { cause: None }) {
            tracing::warn!(user_id = %self.args.target_user_id, "user not found");
        }
        self.publish(state);
    }

    async fn apply(&self, action: PopupAction) -> Result<(), PopupError> {
        let args = &self.args;
        let auth = args.oauth.as_str();
        let target = args.target_user_id.as_str();

        match action {
            PopupAction::Follow => {
                self.service
                    .follow_user(auth, &args.current_user_id, target)
                    .await?;
            }
            PopupAction::Unfollow => {
                self.service
                    .unfollow_user(auth, &args.current_user_id, target)
                    .await?;
            }
            PopupAction::Block => {
                self.service.block_user(auth, target).await?;
                self.blocks.add_user_block(target).await?;
            }
            PopupAction::Unblock => {
                self.service.unblock_user(auth, target).await?;
                self.blocks.remove_user_block(target).await?;
            }
        }
        Ok(())
    }

    /// The target user's follow of the viewed channel, if there is one.
    async fn channel_follows(&self) -> Result<Option<FollowsResponse>, PopupError> {
        let Some(channel) = self.args.channel.as_deref() else {
            return Ok(None);
        };
        let auth = self.args.oauth.as_str();
        let channel_id = self.service.get_user_id_by_name(auth, channel).await?;
        let follows = self
            .service
            .get_user_follows(auth, &self.args.target_user_id, &channel_id)
            .await?;
        Ok(Some(follows))
    }

    async fn load(&self) -> Result<PopupState, PopupError> {
        let args = &self.args;
        let auth = args.oauth.as_str();
        let target = args.target_user_id.as_str();

        let user = async { Ok::<_, PopupError>(self.service.get_user(auth, target).await?) };
        let viewer_follows = async {
            Ok::<_, PopupError>(
                self.service
                    .get_user_follows(auth, &args.current_user_id, target)
                    .await?,
            )
        };
        let is_blocked = async { Ok::<_, PopupError>(self.blocks.is_user_blocked(target).await?) };

        let (channel_follows, user, viewer_follows, is_blocked) = tokio::try_join!(
            self.channel_follows(),
            user,
            viewer_follows,
            is_blocked
        )?;

        Ok(state::reduce(
            state::LoadedData {
                channel_follows,
                user,
                viewer_follows,
                is_blocked,
            },
            &self.dates,
        ))
    }
}
