//! Queue Tester CLI Tool
//!
//! Interactive command-line tool for exercising the matchmaking engine
//! with an in-process queue.
//!
//! Usage:
//!   cargo run --bin queue-tester -- --help
//!   cargo run --bin queue-tester run-scenario --scenario two-players
//!   cargo run --bin queue-tester run-scenario --scenario concurrent-claim
//!   cargo run --bin queue-tester simulate --players 20 --mode blitz

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::Rng;
use skittles_room::auth::TrustedProxyAuthenticator;
use skittles_room::game::store::InMemoryGameStore;
use skittles_room::matchmaker::Matchmaker;
use skittles_room::queue::store::InMemoryQueueStore;
use skittles_room::rating::storage::{InMemoryRatingStorage, RatingEntry, RatingStorage};
use skittles_room::rating::TierTable;
use skittles_room::types::{GameResult, PairingOutcome, PairingRequest};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "queue-tester")]
#[command(about = "Interactive queue testing tool for skittles-room matchmaking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a canned matchmaking scenario
    RunScenario {
        /// Scenario name (two-players, fifo-fairness, concurrent-claim)
        #[arg(short, long)]
        scenario: String,
    },
    /// Simulate a population of players queueing and playing
    Simulate {
        /// Number of players to simulate
        #[arg(short, long, default_value = "20")]
        players: usize,
        /// Game mode to queue for
        #[arg(short, long, default_value = "blitz")]
        mode: String,
    },
}

fn create_engine() -> (Matchmaker, Arc<InMemoryRatingStorage>) {
    let ratings = Arc::new(InMemoryRatingStorage::new());
    let engine = Matchmaker::new(
        Arc::new(InMemoryQueueStore::new()),
        Arc::new(InMemoryGameStore::new()),
        ratings.clone(),
        Arc::new(TrustedProxyAuthenticator::new()),
    );
    (engine, ratings)
}

fn request(player_id: &str, mode: &str) -> PairingRequest {
    PairingRequest {
        player_id: player_id.to_string(),
        game_mode: mode.to_string(),
        timestamp: skittles_room::utils::current_timestamp(),
        auth_token: None,
    }
}

async fn scenario_two_players() -> Result<()> {
    println!("Scenario: two players at equal rating queue for blitz");
    let (engine, _) = create_engine();

    let first = engine.handle_pairing_request(request("alice", "blitz")).await?;
    println!("  alice -> {}", matched_str(&first));

    let second = engine.handle_pairing_request(request("bob", "blitz")).await?;
    match &second {
        PairingOutcome::Matched { game } => {
            println!(
                "  bob -> matched into game {} (white: {}, black: {})",
                game.id, game.white_player_id, game.black_player_id
            );

            let (white, black) = engine
                .report_result(GameResult {
                    game_id: game.id,
                    winner: Some(game.white_player_id.clone()),
                })
                .await?;
            println!(
                "  result: {} {} -> {}, {} {} -> {}",
                white.player_id, white.old_rating, white.new_rating,
                black.player_id, black.old_rating, black.new_rating
            );
        }
        PairingOutcome::Queued => println!("  bob -> queued (unexpected)"),
    }

    Ok(())
}

async fn scenario_fifo_fairness() -> Result<()> {
    println!("Scenario: oldest compatible entry wins the pairing");
    let (engine, ratings) = create_engine();

    for (player, rating) in [("old_timer", 1200), ("newcomer", 1250), ("strong", 1800)] {
        ratings
            .store_rating(RatingEntry::new(player.to_string(), rating))
            .await?;
    }
    ratings
        .store_rating(RatingEntry::new("requester".to_string(), 1220))
        .await?;

    // Enqueue in order: old_timer first
    for player in ["old_timer", "newcomer", "strong"] {
        let outcome = engine.handle_pairing_request(request(player, "blitz")).await?;
        println!("  {} -> {}", player, matched_str(&outcome));
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let outcome = engine
        .handle_pairing_request(request("requester", "blitz"))
        .await?;
    match outcome {
        PairingOutcome::Matched { game } => println!(
            "  requester (1220) paired with {}",
            game.opponent_of("requester").unwrap()
        ),
        PairingOutcome::Queued => println!("  requester -> queued (unexpected)"),
    }

    Ok(())
}

async fn scenario_concurrent_claim() -> Result<()> {
    println!("Scenario: two simultaneous requests, one waiting candidate");
    let (engine, _) = create_engine();

    engine.handle_pairing_request(request("candidate", "blitz")).await?;

    let left = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.handle_pairing_request(request("left", "blitz")).await })
    };
    let right = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.handle_pairing_request(request("right", "blitz")).await })
    };

    let left = left.await??;
    let right = right.await??;

    println!("  left  -> {}", matched_str(&left));
    println!("  right -> {}", matched_str(&right));

    let matched = [&left, &right].iter().filter(|o| o.is_matched()).count();
    println!(
        "  exactly one pairing won the candidate: {}",
        if matched == 1 { "yes" } else { "NO (bug!)" }
    );

    Ok(())
}

async fn simulate(players: usize, mode: &str) -> Result<()> {
    println!("Simulating {} players queueing for {}", players, mode);
    let (engine, ratings) = create_engine();
    let tiers = TierTable::standard();
    let mut rng = rand::thread_rng();

    for i in 0..players {
        let player_id = format!("player_{}", i);
        let rating = rng.gen_range(900..2400);
        ratings
            .store_rating(RatingEntry::new(player_id, rating))
            .await?;
    }

    let mut games = Vec::new();
    for i in 0..players {
        let player_id = format!("player_{}", i);
        match engine.handle_pairing_request(request(&player_id, mode)).await? {
            PairingOutcome::Matched { game } => games.push(game),
            PairingOutcome::Queued => {}
        }
    }

    let stats = engine.stats().await?;
    println!(
        "  {} matches created, {} players still waiting",
        stats.matches_created, stats.players_waiting
    );

    for game in &games {
        let winner = if rng.gen_bool(0.5) {
            Some(game.white_player_id.clone())
        } else {
            Some(game.black_player_id.clone())
        };
        let (white, black) = engine
            .report_result(GameResult {
                game_id: game.id,
                winner,
            })
            .await?;
        println!(
            "  {}: {} -> {} ({}), {} -> {} ({})",
            game.id,
            white.old_rating,
            white.new_rating,
            tiers.tier_for(white.new_rating),
            black.old_rating,
            black.new_rating,
            tiers.tier_for(black.new_rating)
        );
    }

    Ok(())
}

fn matched_str(outcome: &PairingOutcome) -> String {
    match outcome {
        PairingOutcome::Matched { game } => format!("matched (game {})", game.id),
        PairingOutcome::Queued => "queued".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario { scenario } => match scenario.as_str() {
            "two-players" => scenario_two_players().await?,
            "fifo-fairness" => scenario_fifo_fairness().await?,
            "concurrent-claim" => scenario_concurrent_claim().await?,
            other => {
                eprintln!(
                    "Unknown scenario: {} (try two-players, fifo-fairness, concurrent-claim)",
                    other
                );
                std::process::exit(1);
            }
        },
        Commands::Simulate { players, mode } => simulate(players, &mode).await?,
    }

    Ok(())
}
