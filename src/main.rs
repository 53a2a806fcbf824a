use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;
use log::*;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{App, GuessOutcome, StartOutcome};
use crate::oracle::{HttpOracle, NullOracle, SuggestOracle};
use crate::store::{FileStore, MemoryStore, SessionStore};

mod app;
mod feedback;
mod oracle;
mod session;
mod store;

#[cfg(test)]
mod feedback_test;

#[derive(FromArgs)]
/// Wordle assistant: folds game feedback rows into per-channel constraint
/// state and asks the suggestion oracle for the next guess.
struct Args {
    /// directory where per-channel game documents are saved (in-memory if unset)
    #[argh(option, short = 's', default = "String::new()")]
    save_dir: String,

    /// word length for the game
    #[argh(option, default = "crate::session::DEFAULT_WORD_LENGTH")]
    word_length: usize,

    /// maximum number of guesses per game
    #[argh(option, default = "crate::session::DEFAULT_MAX_GUESSES")]
    max_guesses: u32,

    /// chat-completions endpoint for the suggestion oracle
    #[argh(option, default = "String::from(crate::oracle::DEFAULT_ENDPOINT)")]
    oracle_url: String,

    /// model requested from the suggestion oracle
    #[argh(option, default = "String::from(crate::oracle::DEFAULT_MODEL)")]
    oracle_model: String,

    /// oracle request timeout in seconds
    #[argh(option, default = "crate::oracle::DEFAULT_TIMEOUT.as_secs()")]
    oracle_timeout_s: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let oracle: Box<dyn SuggestOracle> = match std::env::var("ORACLE_API_KEY") {
        Ok(key) if !key.is_empty() => Box::new(HttpOracle::new(
            args.oracle_url.clone(),
            key,
            args.oracle_model.clone(),
            Duration::from_secs(args.oracle_timeout_s),
        )?),
        _ => {
            warn!("ORACLE_API_KEY not set, suggestions disabled");
            Box::new(NullOracle)
        }
    };

    let store: Box<dyn SessionStore> = if args.save_dir.is_empty() {
        Box::new(MemoryStore::default())
    } else {
        Box::new(FileStore::new(&args.save_dir))
    };

    let app = App::new(oracle, store, args.word_length, args.max_guesses);

    info!("Starting event loop...");
    println!(
        "commands: start <channel> | board <channel> <row> | \
         guess <channel> <n> <word> <feedback-row> | show <channel> | stats <channel> | quit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("start") => {
                let Some(channel) = parts.next() else {
                    println!("usage: start <channel>");
                    continue;
                };
                match app.on_game_start_signal(channel).await {
                    Ok(StartOutcome::Started) => println!("game on in {}", channel),
                    Ok(StartOutcome::AlreadyActive) => {
                        println!("a game is already running in {}", channel)
                    }
                    Err(e) => error!("start failed: {:#}", e),
                }
            }
            Some("guess") => {
                let (Some(channel), Some(number), Some(word)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    println!("usage: guess <channel> <n> <word> <feedback-row>");
                    continue;
                };
                let Ok(number) = number.parse::<u32>() else {
                    println!("guess number must be an integer");
                    continue;
                };
                let row = parts.collect::<Vec<_>>().join(" ");

                match app.on_guess_feedback(channel, number, &row, word).await {
                    Ok(GuessOutcome::Continue {
                        suggestion: Some(word),
                    }) => println!("try {}", word),
                    Ok(GuessOutcome::Continue { suggestion: None }) => {
                        println!("no suggestion this round, pick your own guess")
                    }
                    Ok(GuessOutcome::Solved { word }) => println!("solved: {}", word),
                    Ok(GuessOutcome::Lost) => println!("out of guesses"),
                    Ok(GuessOutcome::NoSession) => println!("no game running in {}", channel),
                    Ok(GuessOutcome::OutOfOrder { expected }) => {
                        println!("expected guess {}", expected)
                    }
                    Ok(GuessOutcome::Unparseable) => println!("could not read that feedback row"),
                    Err(e) => error!("guess failed: {:#}", e),
                }
            }
            Some("board") => {
                // What the gateway glue does when the game bot posts or
                // edits its board message: a fresh all-blank row means a
                // new game, anything else arrives as a guess event.
                let Some(channel) = parts.next() else {
                    println!("usage: board <channel> <row>");
                    continue;
                };
                let row = parts.collect::<Vec<_>>().join(" ");
                if feedback::parse_row(&row).is_board_reset(args.word_length) {
                    match app.on_game_start_signal(channel).await {
                        Ok(StartOutcome::Started) => println!("game on in {}", channel),
                        Ok(StartOutcome::AlreadyActive) => {
                            println!("a game is already running in {}", channel)
                        }
                        Err(e) => error!("start failed: {:#}", e),
                    }
                } else {
                    println!("not a fresh board; report guesses with the guess command");
                }
            }
            Some("show") => {
                let Some(channel) = parts.next() else {
                    println!("usage: show <channel>");
                    continue;
                };
                match app.session(channel).await {
                    Ok(Some(session)) => {
                        println!(
                            "{}: {:?}, guess {}, green {:?}, present-not-at {:?}, absent {:?}",
                            channel,
                            session.status,
                            session.current_guess_number,
                            session.correct_letters,
                            session.misplaced_letters,
                            session.wrong_letters
                        );
                    }
                    Ok(None) => println!("no game on record in {}", channel),
                    Err(e) => error!("show failed: {:#}", e),
                }
            }
            Some("stats") => {
                let Some(channel) = parts.next() else {
                    println!("usage: stats <channel>");
                    continue;
                };
                match app.stats(channel).await {
                    Ok(stats) => println!("{}: {}", channel, stats),
                    Err(e) => error!("stats failed: {:#}", e),
                }
            }
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unknown command: {}", other),
            None => {}
        }
    }

    Ok(())
}
