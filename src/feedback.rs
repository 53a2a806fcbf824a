/// The game bot reports each guess as a row of colored-letter emojis, one
/// custom emoji per board slot: `:green_e:` for a letter in the right spot,
/// `:yellow_a:` for a letter in the word but misplaced, `:gray_c:` for a
/// letter that isn't there, and `:blank:` for a slot with no guess yet.
///
/// This module decodes one such row into positional feedback tuples.
use log::*;
use serde::{Deserialize, Serialize};

/// Token name for an empty board slot. A row made up entirely of these is
/// the "fresh board" a new game starts with.
const BLANK_TOKEN: &str = "blank";

/// Color carried by a single feedback token.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Color {
    Green,
    Yellow,
    Gray,
}

/// One decoded token: a letter, its color, and its slot in the row.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeedbackTuple {
    pub letter: char,
    pub color: Color,
    pub position: usize,
}

/// The result of decoding one feedback row.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ParsedRow {
    /// Decoded letter tokens, in row order.
    pub tuples: Vec<FeedbackTuple>,
    /// Number of `:blank:` placeholder slots seen.
    pub blanks: usize,
    /// Number of tokens that failed to decode and were dropped.
    pub skipped: usize,
}

impl ParsedRow {
    /// Returns true if the row is the all-placeholder board a new game
    /// posts before any guess has been made.
    pub fn is_board_reset(&self, word_length: usize) -> bool {
        self.tuples.is_empty() && self.skipped == 0 && self.blanks == word_length
    }

    /// Returns true if the row decoded into exactly one tuple per slot,
    /// in order. Only complete rows are safe to merge: a dropped token
    /// leaves the remaining positions misaligned.
    pub fn is_complete(&self, word_length: usize) -> bool {
        self.tuples.len() == word_length
            && self.blanks == 0
            && self.skipped == 0
            && self.tuples.iter().enumerate().all(|(i, t)| t.position == i)
    }
}

/// `parse_row` decodes a feedback row left to right. Each recognized token
/// occupies the next board slot; unrecognized tokens are dropped with a
/// warning and do not advance the slot counter.
pub fn parse_row(row: &str) -> ParsedRow {
    let mut parsed = ParsedRow::default();
    let mut position = 0;

    // Adjacent custom emojis arrive with no separator between them.
    let row = row.replace("><", "> <");

    for raw in row.split_whitespace() {
        let name = token_name(raw);
        if name == BLANK_TOKEN {
            parsed.blanks += 1;
            position += 1;
            continue;
        }
        match decode_token(name) {
            Some((letter, color)) => {
                parsed.tuples.push(FeedbackTuple {
                    letter,
                    color,
                    position,
                });
                position += 1;
            }
            None => {
                warn!("dropping unrecognized feedback token {:?}", raw);
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

/// `token_name` extracts the emoji name from a raw chunk: `<:green_a:1234>`
/// and `:green_a:` both yield `green_a`. Plain names pass through.
fn token_name(raw: &str) -> &str {
    let raw = raw.trim_start_matches('<').trim_end_matches('>');
    raw.split(':').find(|part| !part.is_empty()).unwrap_or("")
}

/// `decode_token` maps an emoji name to its letter and color. Letters come
/// back uppercased, which is how the rest of the game state stores them.
fn decode_token(name: &str) -> Option<(char, Color)> {
    let (color, letter) = name.split_once('_')?;
    let color = match color {
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "gray" => Color::Gray,
        _ => return None,
    };

    let mut chars = letter.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii_lowercase() {
        return None;
    }

    Some((c.to_ascii_uppercase(), color))
}
