/// App is the coordinator between the chat gateway and the game core. It
/// owns the oracle and the store, keeps game state partitioned per
/// channel, and exposes the two inbound operations the gateway glue
/// calls: a game-start signal and a guess-feedback event. Events for one
/// channel are serialized behind that channel's lock; different channels
/// proceed concurrently.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use log::*;
use tokio::sync::Mutex;

use crate::feedback;
use crate::oracle::SuggestOracle;
use crate::session::{Session, Status};
use crate::store::{SessionStore, Stats};

/// Outcome of a game-start signal.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StartOutcome {
    Started,
    /// A game is already live in this channel; the signal was ignored.
    AlreadyActive,
}

/// Outcome of a guess-feedback event, handed to the reply layer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GuessOutcome {
    /// The guess was merged and the game continues.
    Continue { suggestion: Option<String> },
    Solved { word: String },
    Lost,
    /// No live game in this channel; the event was dropped.
    NoSession,
    /// The guess number didn't match the expected next one.
    OutOfOrder { expected: u32 },
    /// The feedback row didn't decode into a full, in-order row.
    Unparseable,
}

pub struct App {
    oracle: Box<dyn SuggestOracle>,
    store: Box<dyn SessionStore>,
    word_length: usize,
    max_guesses: u32,
    channel_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl App {
    pub fn new(
        oracle: Box<dyn SuggestOracle>,
        store: Box<dyn SessionStore>,
        word_length: usize,
        max_guesses: u32,
    ) -> App {
        App {
            oracle,
            store,
            word_length,
            max_guesses,
            channel_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the lock that serializes all event processing for one
    /// channel. The outer map lock is held only long enough to fetch it.
    async fn channel_lock(&self, channel_id: &str) -> Arc<Mutex<()>> {
        self.channel_locks
            .lock()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .clone()
    }

    /// Handles a "fresh board posted" signal. Starts a new session unless
    /// one is already live, in which case the signal is ignored.
    pub async fn on_game_start_signal(&self, channel_id: &str) -> Result<StartOutcome> {
        let lock = self.channel_lock(channel_id).await;
        let _guard = lock.lock().await;

        let mut record = self.store.load(channel_id).await?.unwrap_or_default();

        if let Some(session) = &record.session {
            if session.status == Status::Active {
                info!(
                    "channel {}: start signal while a game is live, ignoring",
                    channel_id
                );
                return Ok(StartOutcome::AlreadyActive);
            }
        }

        record.session = Some(Session::new(channel_id, self.word_length));
        record.stats.games += 1;
        self.store.save(channel_id, &record).await?;

        info!("channel {}: game {} started", channel_id, record.stats.games);
        Ok(StartOutcome::Started)
    }

    /// Handles one guess-feedback event: guard, merge, settle, persist,
    /// and (while the game stays live) fetch a suggestion. Rejected
    /// events leave the stored state untouched.
    pub async fn on_guess_feedback(
        &self,
        channel_id: &str,
        guess_number: u32,
        feedback_row: &str,
        guessed_word: &str,
    ) -> Result<GuessOutcome> {
        let lock = self.channel_lock(channel_id).await;
        let _guard = lock.lock().await;

        let mut record = self.store.load(channel_id).await?.unwrap_or_default();

        let session = match &record.session {
            Some(session) if session.status == Status::Active => session,
            _ => {
                info!(
                    "channel {}: guess feedback with no live game, dropping",
                    channel_id
                );
                return Ok(GuessOutcome::NoSession);
            }
        };

        let expected = session.expected_guess_number();
        if guess_number != expected {
            info!(
                "channel {}: feedback for guess {} but expecting {}, dropping",
                channel_id, guess_number, expected
            );
            return Ok(GuessOutcome::OutOfOrder { expected });
        }

        let row = feedback::parse_row(feedback_row);
        if !row.is_complete(self.word_length) {
            warn!(
                "channel {}: feedback row for guess {} did not decode cleanly \
                 ({} tuples, {} blanks, {} skipped), dropping",
                channel_id,
                guess_number,
                row.tuples.len(),
                row.blanks,
                row.skipped
            );
            return Ok(GuessOutcome::Unparseable);
        }

        let next = session.advance(guessed_word, &row.tuples, self.max_guesses);
        let status = next.status;
        let solution = next.solution().map(str::to_string);

        if status == Status::Solved {
            record.stats.solved += 1;
        }
        record.session = Some(next);
        self.store.save(channel_id, &record).await?;

        match status {
            Status::Solved => {
                let word = solution.unwrap_or_else(|| guessed_word.to_uppercase());
                info!(
                    "channel {}: solved with {} on guess {} ({})",
                    channel_id, word, guess_number, record.stats
                );
                Ok(GuessOutcome::Solved { word })
            }
            Status::Lost => {
                info!("channel {}: out of guesses", channel_id);
                Ok(GuessOutcome::Lost)
            }
            Status::Active => {
                // The save already happened: a dead oracle can cost us a
                // suggestion, never a merged guess.
                let suggestion = match &record.session {
                    Some(live) => self.oracle.suggest(live).await,
                    None => None,
                };
                Ok(GuessOutcome::Continue { suggestion })
            }
        }
    }

    /// Current session for a channel, if any. Used by the reply layer.
    pub async fn session(&self, channel_id: &str) -> Result<Option<Session>> {
        let record = self.store.load(channel_id).await?;
        Ok(record.and_then(|r| r.session))
    }

    /// The channel's running stats.
    pub async fn stats(&self, channel_id: &str) -> Result<Stats> {
        let record = self.store.load(channel_id).await?;
        Ok(record.map(|r| r.stats).unwrap_or_default())
    }
}
