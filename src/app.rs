use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::avatar::{Avatar, AvatarLoader, AvatarTarget, DisplayContext};
use crate::config::AppConfig;
use crate::event::{AppEvent, Event, EventHandler};
use crate::popup::{PopupAction, PopupState, UserInfo, UserPopupController};
use crate::ui;

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: AppConfig,

    // Popup
    pub popup: UserPopupController,
    /// Last successfully loaded user, used to pick toggle directions.
    pub last_user: Option<UserInfo>,

    // Avatar
    pub avatar: Option<Avatar>,
    avatar_loader: AvatarLoader,
    avatar_url: Option<String>,

    // Status
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: AppConfig, popup: UserPopupController, avatar_loader: AvatarLoader) -> Self {
        Self {
            running: true,
            events: EventHandler::new(config.tick_rate_fps),
            config,
            popup,
            last_user: None,
            avatar: None,
            avatar_loader,
            avatar_url: None,
            status_message: None,
        }
    }

    pub fn avatar_context(&self) -> DisplayContext {
        self.avatar_loader.context()
    }

    // -- Main event loop ----------------------------------------------------

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.forward_popup_state();
        self.on_popup_state(self.popup.state());

        while self.running {
            terminal.draw(|frame| self.draw(frame))?;
            match self.events.next().await? {
                // Ticks only drive redraws.
                Event::Tick => {}
                Event::Crossterm(event) => {
                    if let crossterm::event::Event::Key(key) = event
                        && key.kind == crossterm::event::KeyEventKind::Press
                    {
                        self.handle_key_event(key);
                    }
                }
                Event::App(app_event) => self.handle_app_event(*app_event),
            }
        }

        self.popup.shutdown();
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame) {
        ui::draw(frame, self);
    }

    /// Relay popup state changes into the event loop.
    fn forward_popup_state(&self) {
        self.events
            .forward_changes(self.popup.subscribe(), || AppEvent::PopupStateChanged);
    }

    // -- Key event routing --------------------------------------------------

    fn handle_key_event(&mut self, key: KeyEvent) {
        // Ctrl-C always quits.
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c' | 'C'))
        {
            self.events.send(AppEvent::Quit);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.events.send(AppEvent::Quit);
            }
            KeyCode::Char('f') => {
                self.events.send(AppEvent::Perform(self.follow_toggle()));
            }
            KeyCode::Char('b') => {
                self.events.send(AppEvent::Perform(self.block_toggle()));
            }
            KeyCode::Char('r') => {
                self.events.send(AppEvent::Reload);
            }
            KeyCode::Char('o') => {
                self.events.send(AppEvent::OpenChannelPage);
            }
            _ => {}
        }
    }

    /// Follow unless the last loaded state says we already do.
    pub fn follow_toggle(&self) -> PopupAction {
        match self.last_user {
            Some(ref user) if user.is_following => PopupAction::Unfollow,
            _ => PopupAction::Follow,
        }
    }

    pub fn block_toggle(&self) -> PopupAction {
        match self.last_user {
            Some(ref user) if user.is_blocked => PopupAction::Unblock,
            _ => PopupAction::Block,
        }
    }

    // -- App event handling -------------------------------------------------

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => {
                self.running = false;
            }
            AppEvent::Perform(action) => {
                if self.popup.perform(action).is_some() {
                    self.status_message = None;
                } else {
                    self.status_message = Some(format!("Busy, {action} ignored"));
                }
            }
            AppEvent::Reload => {
                if self.popup.reload().is_none() {
                    self.status_message = Some("Busy, reload ignored".to_string());
                }
            }
            AppEvent::OpenChannelPage => self.open_channel_page(),
            AppEvent::PopupStateChanged => self.on_popup_state(self.popup.state()),
            AppEvent::AvatarReady(avatar) => {
                self.avatar = Some(avatar);
            }
        }
    }

    fn on_popup_state(&mut self, state: PopupState) {
        let PopupState::Success(user) = state else {
            return;
        };
        if self.avatar_url.as_deref() != Some(user.avatar_url.as_str()) {
            self.load_avatar(&user.avatar_url);
        }
        self.last_user = Some(user);
    }

    fn load_avatar(&mut self, url: &str) {
        self.avatar_url = Some(url.to_string());
        self.avatar = None;

        let loader = self.avatar_loader.clone();
        let sender = self.events.sender();
        let url = url.to_string();
        tokio::spawn(async move {
            // Runs off the event loop; avatars come back as events.
            let mut target = AvatarTarget::new(loader.context(), move |avatar| {
                let _ = sender.send(Event::App(Box::new(AppEvent::AvatarReady(avatar))));
            });
            let _ = loader.load(&url, &mut target).await;
        });
    }

    fn open_channel_page(&mut self) {
        let Some(ref user) = self.last_user else {
            self.status_message = Some("Nothing to open yet".to_string());
            return;
        };
        let page = format!("https://www.twitch.tv/{}", user.username);
        if let Err(e) = open::that(&page) {
            tracing::warn!("failed to open browser: {e}");
            self.status_message = Some(format!("Could not open {page}"));
        }
    }
}
