//! The one "current result" shown to the user.
//!
//! Every search writes its final outcome into the same slot and the newest
//! write replaces whatever was there. Searches running at the same time are
//! not cancelled, so the one that settles last is what stays on screen.

use std::sync::Arc;
use tokio::sync::watch;

use crate::model::SearchOutcome;

/// Loading feedback shown while a lookup is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingCountry,
    ResolvingWeather,
    Locating,
    ReverseGeocoding,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::ResolvingCountry => "Fetching country info…",
            Stage::ResolvingWeather => "Fetching weather for capital…",
            Stage::Locating => "Getting your location…",
            Stage::ReverseGeocoding => "Resolving your country…",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    Empty,
    Outcome(SearchOutcome),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Screen {
    pub loading: Option<Stage>,
    pub content: Content,
}

#[derive(Debug, Clone)]
pub struct DisplaySlot {
    tx: Arc<watch::Sender<Screen>>,
}

impl Default for DisplaySlot {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySlot {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Screen::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<Screen> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Screen {
        self.tx.borrow().clone()
    }

    /// Start of a new lookup: the old card goes away and the stage shows.
    pub fn begin(&self, stage: Stage) {
        self.tx.send_replace(Screen {
            loading: Some(stage),
            content: Content::Empty,
        });
    }

    pub fn stage(&self, stage: Stage) {
        self.tx.send_modify(|screen| screen.loading = Some(stage));
    }

    /// Replace the whole screen with a finished outcome.
    pub fn publish(&self, outcome: SearchOutcome) {
        self.tx.send_replace(Screen {
            loading: None,
            content: Content::Outcome(outcome),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_replaces_loading_and_content() {
        let slot = DisplaySlot::new();
        slot.begin(Stage::ResolvingCountry);
        assert_eq!(slot.current().loading, Some(Stage::ResolvingCountry));

        slot.stage(Stage::ResolvingWeather);
        assert_eq!(slot.current().loading, Some(Stage::ResolvingWeather));

        slot.publish(SearchOutcome::failure("boom"));
        let screen = slot.current();
        assert_eq!(screen.loading, None);
        assert_eq!(
            screen.content,
            Content::Outcome(SearchOutcome::failure("boom"))
        );
    }

    #[test]
    fn last_write_wins() {
        let slot = DisplaySlot::new();
        slot.publish(SearchOutcome::failure("first"));
        slot.publish(SearchOutcome::failure("second"));

        assert_eq!(
            slot.current().content,
            Content::Outcome(SearchOutcome::failure("second"))
        );
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let slot = DisplaySlot::new();
        let mut rx = slot.subscribe();

        slot.begin(Stage::Locating);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().loading, Some(Stage::Locating));
    }
}
