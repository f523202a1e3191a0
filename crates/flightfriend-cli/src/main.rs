//! Flight Friend terminal client.
//!
//! A readline REPL over the conversational engine: user text goes through
//! the engine, emitted search commands run against the provider chain, and
//! both sides of the transcript are persisted through the history service.

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Parser;
use colored::Colorize;
use rand::seq::SliceRandom;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flightfriend_application::{command, templates, ChatbotEngine};
use flightfriend_core::config::AppConfig;
use flightfriend_core::dialogue::DialogueState;
use flightfriend_core::message::Message;
use flightfriend_infrastructure::{
    ChatHistoryRepository, ConversationService, InMemoryHistoryRepository,
    SupabaseHistoryRepository,
};
use flightfriend_interaction::{GeminiClient, MockFlightProvider, ProviderChain};

/// Routes the startup deal banner draws from.
const DEAL_ROUTES: [(&str, &str); 4] = [
    ("DEL", "BOM"),
    ("BLR", "DEL"),
    ("BOM", "GOI"),
    ("MAA", "CCU"),
];

#[derive(Parser)]
#[command(name = "flightfriend")]
#[command(about = "Flight Friend - conversational flight search assistant", long_about = None)]
struct Cli {
    /// Force mock data even when API keys are configured
    #[arg(long)]
    mock: bool,

    /// User id that chat history is stored under
    #[arg(long, default_value = "local")]
    user: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = if cli.mock {
        AppConfig::mock_only()
    } else {
        AppConfig::load()
    };

    let gemini = Arc::new(GeminiClient::new(config.gemini_api_key.clone()));
    let providers = ProviderChain::from_config(&config);
    let engine = ChatbotEngine::new(gemini);

    let repository: Arc<dyn ChatHistoryRepository> =
        match (&config.history_url, &config.history_api_key) {
            (Some(url), Some(key)) => {
                info!("[flightfriend] Persisting chat history to hosted backend");
                Arc::new(SupabaseHistoryRepository::new(url.clone(), key.clone()))
            }
            _ => Arc::new(InMemoryHistoryRepository::new()),
        };
    let history = ConversationService::new(repository, cli.user.clone());

    println!("{}", "=== Flight Friend ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a travel request, '/new' for a fresh conversation, '/history' to list past ones, or 'quit' to exit."
            .bright_black()
    );
    print_deal_banner();
    println!();

    let mut state = DialogueState::new();
    let opening = engine.initial_greeting();
    print_bot(&opening.text);
    history.record(&Message::bot(opening.text.clone())).await;

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match trimmed {
                    "quit" | "exit" | "/quit" => {
                        println!("{}", "Safe travels!".bright_green());
                        break;
                    }
                    "/new" => {
                        history.start_new().await;
                        state.reset();
                        let opening = engine.initial_greeting();
                        print_bot(&opening.text);
                        history.record(&Message::bot(opening.text.clone())).await;
                        continue;
                    }
                    "/history" => {
                        print_history(&history).await;
                        continue;
                    }
                    _ => {}
                }

                history.record(&Message::user(trimmed)).await;

                let reply = engine.respond(&mut state, trimmed).await;
                print_bot(&reply.text);
                history.record(&Message::bot(reply.render())).await;

                // An emitted command runs against the provider chain and
                // its results come back through the engine for display.
                if let Some(params) = reply.command {
                    let flights = providers.search(&params).await;
                    let presented = engine.present_results(&mut state, &params, flights);
                    let display = templates::strip_results_block(&presented.text);
                    print_bot(&display);
                    print_cards(&presented.text);
                    history.record(&Message::bot(presented.text.clone())).await;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}

fn print_bot(text: &str) {
    let display = command::strip_commands(text);
    for line in display.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
}

/// Renders the parsed flight cards as an aligned table.
fn print_cards(message: &str) {
    let cards = templates::parse_results_block(message);
    if cards.is_empty() {
        return;
    }
    for card in cards {
        println!(
            "  {}  {}  {} -> {}  {}  {}",
            card.airline.bold(),
            card.flight_number.bright_black(),
            card.departure_time,
            card.arrival_time,
            card.duration.bright_black(),
            card.price.bright_green()
        );
    }
    println!();
}

/// Shows a discounted fare for a random popular route on startup.
fn print_deal_banner() {
    let mut rng = rand::thread_rng();
    let (source, destination) = DEAL_ROUTES.choose(&mut rng).copied().unwrap_or(DEAL_ROUTES[0]);
    let date = Utc::now().date_naive() + Duration::days(1);
    let deal = MockFlightProvider::new().generate_deal(source, destination, date);
    println!(
        "{}",
        format!(
            "Today's deal: {} {} -> {} on {} for {} (was {})",
            deal.airline,
            deal.source,
            deal.destination,
            templates::display_date(deal.date),
            flightfriend_core::flight::format_inr(deal.price),
            flightfriend_core::flight::format_inr(deal.old_price),
        )
        .bright_yellow()
    );
}

async fn print_history(history: &ConversationService) {
    let conversations = history.list().await;
    if conversations.is_empty() {
        println!("{}", "No saved conversations yet.".bright_black());
        return;
    }
    for summary in conversations {
        println!(
            "  {}  {}  {}",
            summary.conversation_id.bright_black(),
            summary.started_at.format("%Y-%m-%d %H:%M"),
            summary.first_message
        );
    }
    println!();
}
