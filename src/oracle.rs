/// The suggestion oracle turns a session's constraint state into a
/// natural-language request against an external text-generation service
/// and hands back a validated next-guess word. One attempt, bounded by a
/// timeout; any transport error, bad status, or unusable reply collapses
/// to `None` and the caller moves on without a suggestion.
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};

use crate::session::Session;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait SuggestOracle: Send + Sync {
    /// Suggests a next guess for a live session, or `None` if no usable
    /// suggestion could be produced. Never mutates the session.
    async fn suggest(&self, session: &Session) -> Option<String>;
}

/// HttpOracle queries a chat-completions style HTTPS endpoint.
pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl HttpOracle {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<HttpOracle> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Error building oracle HTTP client")?;

        Ok(HttpOracle {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Error sending oracle request")?
            .error_for_status()
            .context("Oracle returned an error status")?;

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Error deserializing oracle response")?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .context("Oracle response had no choices")?;

        Ok(choice.message.content)
    }
}

#[async_trait]
impl SuggestOracle for HttpOracle {
    async fn suggest(&self, session: &Session) -> Option<String> {
        let prompt = build_prompt(session);

        match self.request(&prompt).await {
            Ok(raw) => match validate_suggestion(&raw, session.word_length) {
                Some(word) => {
                    info!("channel {}: oracle suggests {}", session.channel_id, word);
                    Some(word)
                }
                None => {
                    warn!(
                        "channel {}: oracle reply {:?} failed validation",
                        session.channel_id, raw
                    );
                    None
                }
            },
            Err(e) => {
                warn!("channel {}: oracle unavailable: {:#}", session.channel_id, e);
                None
            }
        }
    }
}

/// NullOracle never has a suggestion. Stands in when no API key is
/// configured.
pub struct NullOracle;

#[async_trait]
impl SuggestOracle for NullOracle {
    async fn suggest(&self, session: &Session) -> Option<String> {
        debug!(
            "channel {}: no oracle configured, skipping suggestion",
            session.channel_id
        );
        None
    }
}

/// `build_prompt` spells the constraint state out as explicit instructions:
/// exact length, every confirmed letter and its slot, every known-present
/// letter with its forbidden slots, every excluded letter, and the guess
/// transcript so far. Positions are 1-based for the reader.
pub fn build_prompt(session: &Session) -> String {
    let mut prompt = format!(
        "We are solving a word puzzle. Suggest one English word of exactly {} letters.\n",
        session.word_length
    );

    for (position, letter) in &session.correct_letters {
        prompt.push_str(&format!(
            "The word has the letter {} at position {}.\n",
            letter,
            position + 1
        ));
    }

    for (letter, positions) in &session.misplaced_letters {
        let spots = positions
            .iter()
            .map(|p| (p + 1).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!(
            "The word contains the letter {}, but not at position {}.\n",
            letter, spots
        ));
    }

    if !session.wrong_letters.is_empty() {
        let excluded = session
            .wrong_letters
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!(
            "The word does not contain any of these letters: {}.\n",
            excluded
        ));
    }

    if !session.guess_history.is_empty() {
        prompt.push_str("Guesses so far:\n");
        for record in &session.guess_history {
            prompt.push_str(&format!(
                "  {}. {} -> {}\n",
                record.guess_number,
                record.word,
                describe_row(record)
            ));
        }
    }

    prompt.push_str("Reply with the suggested word only, nothing else.");
    prompt
}

fn describe_row(record: &crate::session::GuessRecord) -> String {
    use crate::feedback::Color;

    record
        .feedback
        .iter()
        .map(|t| {
            let color = match t.color {
                Color::Green => "green",
                Color::Yellow => "yellow",
                Color::Gray => "gray",
            };
            format!("{} {}", t.letter, color)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `validate_suggestion` normalizes a raw oracle reply (trims whitespace
/// and surrounding punctuation, uppercases) and accepts it only if it is
/// exactly the right length and purely alphabetic.
pub fn validate_suggestion(raw: &str, word_length: usize) -> Option<String> {
    let word: String = raw
        .trim()
        .trim_matches(|c: char| !c.is_ascii_alphabetic())
        .to_ascii_uppercase();

    if word.len() == word_length && word.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(word)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::parse_row;
    use crate::session::{Session, DEFAULT_WORD_LENGTH};

    #[test]
    fn validation_accepts_clean_words() {
        assert_eq!(validate_suggestion("fault", 5), Some("FAULT".into()));
        assert_eq!(validate_suggestion(" FAULT.\n", 5), Some("FAULT".into()));
        assert_eq!(validate_suggestion("\"baker\"", 5), Some("BAKER".into()));
    }

    #[test]
    fn validation_rejects_unusable_replies() {
        // Wrong length for the game.
        assert_eq!(validate_suggestion("oven", 5), None);
        // Multi-word prose.
        assert_eq!(validate_suggestion("I would try FAULT", 5), None);
        assert_eq!(validate_suggestion("", 5), None);
        assert_eq!(validate_suggestion("f4ult", 5), None);
    }

    #[test]
    fn prompt_carries_all_constraints() {
        let session = Session::new("chan", DEFAULT_WORD_LENGTH);
        let row = parse_row(":gray_c: :gray_r: :yellow_a: :gray_n: :green_e:");
        let session = session.merge("crane", &row.tuples);

        let prompt = build_prompt(&session);
        assert!(prompt.contains("exactly 5 letters"));
        assert!(prompt.contains("letter E at position 5"));
        assert!(prompt.contains("letter A, but not at position 3"));
        assert!(prompt.contains("C, N, R"));
        assert!(prompt.contains("1. CRANE -> C gray, R gray, A yellow, N gray, E green"));
    }
}
