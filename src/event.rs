use color_eyre::eyre::OptionExt;
use crossterm::event::Event as CrosstermEvent;
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::avatar::Avatar;
use crate::popup::PopupAction;

const DEFAULT_TICK_FPS: f64 = 30.0;

/// Everything the app loop reacts to.
#[derive(Clone, Debug)]
pub enum Event {
    /// Redraw tick.
    Tick,
    /// Raw terminal input.
    Crossterm(CrosstermEvent),
    App(Box<AppEvent>),
}

/// Application events sent from key handlers and background tasks.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Quit,

    // -- Popup requests (sent from key handlers) --
    Perform(PopupAction),
    Reload,
    OpenChannelPage,

    // -- Background results (sent from async tasks back to the event loop) --
    PopupStateChanged,
    AvatarReady(Avatar),
}

/// Single queue merging terminal input, ticks, and app events.
#[derive(Debug)]
pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Spawn the terminal reader; must run inside a tokio runtime.
    pub fn new(tick_rate_fps: f64) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let reader = TerminalReader {
            sender: sender.clone(),
            tick_rate: tick_interval(tick_rate_fps),
        };
        tokio::spawn(reader.run());
        Self { sender, receiver }
    }

    pub async fn next(&mut self) -> color_eyre::Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_eyre("event channel closed")
    }

    pub fn send(&self, app_event: AppEvent) {
        let _ = self.sender.send(Event::App(Box::new(app_event)));
    }

    /// Sender for background tasks that report back to the loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }

    /// Emit `event()` every time `rx` sees a new value, until either side
    /// goes away.
    pub fn forward_changes<T, F>(&self, mut rx: watch::Receiver<T>, event: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> AppEvent + Send + 'static,
    {
        let sender = self.sender();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if sender.send(Event::App(Box::new(event()))).is_err() {
                    break;
                }
            }
        });
    }
}

/// Tick period for `fps`, falling back to the default rate for
/// non-positive or non-finite values.
fn tick_interval(fps: f64) -> Duration {
    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        DEFAULT_TICK_FPS
    };
    Duration::from_secs_f64(1.0 / fps)
}

struct TerminalReader {
    sender: mpsc::UnboundedSender<Event>,
    tick_rate: Duration,
}

impl TerminalReader {
    async fn run(self) {
        let mut input = crossterm::event::EventStream::new();
        let mut ticks = tokio::time::interval(self.tick_rate);
        loop {
            let tick = ticks.tick();
            let next_input = input.next().fuse();
            let event = tokio::select! {
                _ = self.sender.closed() => break,
                _ = tick => Event::Tick,
                Some(Ok(evt)) = next_input => Event::Crossterm(evt),
            };
            if self.sender.send(event).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_interval_follows_fps() {
        assert_eq!(tick_interval(4.0), Duration::from_millis(250));
    }

    #[test]
    fn bad_fps_uses_default_rate() {
        let default = Duration::from_secs_f64(1.0 / DEFAULT_TICK_FPS);
        assert_eq!(tick_interval(0.0), default);
        assert_eq!(tick_interval(-5.0), default);
        assert_eq!(tick_interval(f64::NAN), default);
    }

    #[tokio::test]
    async fn watch_changes_become_app_events() {
        // No terminal reader; only forwarded events arrive.
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut handler = EventHandler { sender, receiver };

        let (tx, rx) = watch::channel(0u32);
        handler.forward_changes(rx, || AppEvent::PopupStateChanged);
        tx.send_replace(1);

        let event = handler.next().await.unwrap();
        assert!(matches!(
            event,
            Event::App(ref app) if matches!(**app, AppEvent::PopupStateChanged)
        ));
    }
}
