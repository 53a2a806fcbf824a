/// A Session is the per-channel record of one word-guessing game: the
/// constraints learned from every feedback row so far, plus the win/loss
/// bookkeeping around them. Sessions are plain serializable documents;
/// all updates go through `merge`/`advance`, which return a new value and
/// leave the prior state untouched.
use std::collections::{BTreeMap, BTreeSet};

use log::*;
use serde::{Deserialize, Serialize};

use crate::feedback::{Color, FeedbackTuple};

pub const DEFAULT_WORD_LENGTH: usize = 5;
pub const DEFAULT_MAX_GUESSES: u32 = 6;

/// Status represents where a game stands. There is no "not started":
/// a session only exists once a game has begun.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Solved,
    Lost,
}

/// One accepted guess: the word, its raw feedback row, and its 1-based
/// ordinal. History is append-only and is used for the oracle transcript,
/// not for re-deriving constraints.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub word: String,
    pub feedback: Vec<FeedbackTuple>,
    pub guess_number: u32,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub channel_id: String,
    pub status: Status,
    pub word_length: usize,
    pub current_guess_number: u32,

    /// Positions confirmed green. A confirmed position is never
    /// overwritten with a different letter.
    pub correct_letters: BTreeMap<usize, char>,

    /// Letters known to be in the word, mapped to the positions they are
    /// known NOT to occupy.
    pub misplaced_letters: BTreeMap<char, BTreeSet<usize>>,

    /// Letters confirmed absent from the word. Presence always wins: a
    /// letter later seen green or yellow is removed from this set.
    pub wrong_letters: BTreeSet<char>,

    pub guess_history: Vec<GuessRecord>,
}

impl Session {
    /// `new` creates a live session for a channel, with no constraints yet.
    pub fn new(channel_id: impl Into<String>, word_length: usize) -> Session {
        Session {
            channel_id: channel_id.into(),
            status: Status::Active,
            word_length,
            current_guess_number: 0,
            correct_letters: BTreeMap::new(),
            misplaced_letters: BTreeMap::new(),
            wrong_letters: BTreeSet::new(),
            guess_history: Vec::new(),
        }
    }

    /// The guess number the next feedback event must carry.
    pub fn expected_guess_number(&self) -> u32 {
        self.current_guess_number + 1
    }

    /// `merge` folds one guess's feedback row into the constraint state
    /// and returns the updated session. The row is applied left to right:
    ///
    /// - green records the position and clears the letter from the
    ///   misplaced and wrong sets;
    /// - yellow records a position exclusion and clears the letter from
    ///   the wrong set;
    /// - gray marks the letter absent only if it isn't already known
    ///   green or yellow somewhere. If it's known yellow, the gray slot
    ///   still says "not here", so that position is excluded too.
    ///
    /// `merge` never touches `status`; win/loss is decided by `advance`.
    pub fn merge(&self, word: &str, feedback: &[FeedbackTuple]) -> Session {
        let mut next = self.clone();

        for tuple in feedback {
            let letter = tuple.letter.to_ascii_uppercase();
            match tuple.color {
                Color::Green => {
                    match next.correct_letters.get(&tuple.position) {
                        Some(&existing) if existing != letter => {
                            warn!(
                                "channel {}: position {} already confirmed as {}, ignoring green {}",
                                next.channel_id, tuple.position, existing, letter
                            );
                        }
                        _ => {
                            next.correct_letters.insert(tuple.position, letter);
                        }
                    }
                    next.misplaced_letters.remove(&letter);
                    next.wrong_letters.remove(&letter);
                }
                Color::Yellow => {
                    next.misplaced_letters
                        .entry(letter)
                        .or_default()
                        .insert(tuple.position);
                    next.wrong_letters.remove(&letter);
                }
                Color::Gray => {
                    let known_green = next.correct_letters.values().any(|&c| c == letter);
                    let known_yellow = next
                        .misplaced_letters
                        .get(&letter)
                        .map_or(false, |positions| !positions.is_empty());

                    if known_yellow {
                        // The letter is in the word; this slot just isn't it.
                        next.misplaced_letters
                            .entry(letter)
                            .or_default()
                            .insert(tuple.position);
                    } else if !known_green {
                        next.wrong_letters.insert(letter);
                    }
                    // Known green only: the gray refers to an extra
                    // occurrence of an already-placed letter.
                }
            }
        }

        next.guess_history.push(GuessRecord {
            word: word.to_uppercase(),
            feedback: feedback.to_vec(),
            guess_number: next.current_guess_number + 1,
        });
        next.current_guess_number += 1;

        next
    }

    /// `advance` merges one feedback row and then settles the game state:
    /// an all-green row solves the game on any guess, and running out of
    /// guesses without one loses it.
    pub fn advance(&self, word: &str, feedback: &[FeedbackTuple], max_guesses: u32) -> Session {
        let mut next = self.merge(word, feedback);

        if row_solves(feedback, next.word_length) {
            next.status = Status::Solved;
        } else if next.current_guess_number >= max_guesses {
            next.status = Status::Lost;
        }

        next
    }

    /// The solved word, once the game is won.
    pub fn solution(&self) -> Option<&str> {
        match self.status {
            Status::Solved => self.guess_history.last().map(|record| record.word.as_str()),
            _ => None,
        }
    }
}

/// `row_solves` is true for a full row of greens.
pub fn row_solves(feedback: &[FeedbackTuple], word_length: usize) -> bool {
    feedback.len() == word_length && feedback.iter().all(|t| t.color == Color::Green)
}
