//! High concurrency stress tests for pairing request processing
//!
//! These tests validate the conditional-claim protocol under contention:
//! a waiting player can be paired at most once no matter how many
//! requests race for them.

use skittles_room::auth::TrustedProxyAuthenticator;
use skittles_room::game::store::{GameStore, InMemoryGameStore};
use skittles_room::matchmaker::Matchmaker;
use skittles_room::queue::store::{InMemoryQueueStore, QueueStore};
use skittles_room::rating::storage::InMemoryRatingStorage;
use skittles_room::types::{PairingOutcome, PairingRequest};
use std::collections::HashSet;
use std::sync::Arc;

fn create_load_test_system() -> (Matchmaker, Arc<InMemoryQueueStore>, Arc<InMemoryGameStore>) {
    let queue = Arc::new(InMemoryQueueStore::new());
    let games = Arc::new(InMemoryGameStore::new());
    let ratings = Arc::new(InMemoryRatingStorage::new());

    let engine = Matchmaker::new(
        queue.clone(),
        games.clone(),
        ratings,
        Arc::new(TrustedProxyAuthenticator::new()),
    );

    (engine, queue, games)
}

fn request(player_id: &str) -> PairingRequest {
    PairingRequest {
        player_id: player_id.to_string(),
        game_mode: "blitz".to_string(),
        timestamp: skittles_room::utils::current_timestamp(),
        auth_token: None,
    }
}

#[tokio::test]
async fn test_single_candidate_claimed_exactly_once() {
    // Two simultaneous pairing attempts against one waiting player must
    // produce exactly one match and one re-queue, never two matches.
    for _ in 0..50 {
        let (engine, queue, games) = create_load_test_system();

        engine
            .handle_pairing_request(request("candidate"))
            .await
            .unwrap();

        let left = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.handle_pairing_request(request("left")).await })
        };
        let right = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.handle_pairing_request(request("right")).await })
        };

        let left = left.await.unwrap().unwrap();
        let right = right.await.unwrap().unwrap();

        let matched = [&left, &right].iter().filter(|o| o.is_matched()).count();
        assert_eq!(matched, 1, "exactly one request wins the candidate");

        // One game exists and it names the candidate exactly once
        assert_eq!(games.len().await.unwrap(), 1);
        for outcome in [&left, &right] {
            if let PairingOutcome::Matched { game } = outcome {
                assert!(game.involves("candidate"));
            }
        }

        // The loser re-queued itself
        assert_eq!(queue.len().await.unwrap(), 1);
    }
}

#[tokio::test]
async fn test_many_concurrent_requests_pair_consistently() {
    let (engine, queue, _) = create_load_test_system();
    let player_count = 100;

    let mut handles = Vec::new();
    for i in 0..player_count {
        let engine = engine.clone();
        let player_id = format!("player_{}", i);
        handles.push(tokio::spawn(async move {
            engine.handle_pairing_request(request(&player_id)).await
        }));
    }

    let mut matched_players: Vec<String> = Vec::new();
    let mut matched_requests = 0usize;
    let mut queued_requests = 0usize;
    for outcome in futures::future::join_all(handles).await {
        match outcome.unwrap().unwrap() {
            PairingOutcome::Matched { game } => {
                matched_requests += 1;
                matched_players.push(game.white_player_id.clone());
                matched_players.push(game.black_player_id.clone());
            }
            PairingOutcome::Queued => queued_requests += 1,
        }
    }

    // Every request resolved one way or the other
    assert_eq!(matched_requests + queued_requests, player_count);
    assert_eq!(matched_players.len(), matched_requests * 2);

    // Every paired player appears in exactly one game
    let distinct: HashSet<&String> = matched_players.iter().collect();
    assert_eq!(
        distinct.len(),
        matched_players.len(),
        "no player may be paired twice"
    );

    // Everyone is accounted for: each player is either in a game or
    // still waiting in the queue.
    let waiting = queue.len().await.unwrap();
    assert_eq!(waiting, player_count - matched_players.len());
}

#[tokio::test]
async fn test_concurrent_cancels_and_requests_stay_consistent() {
    let (engine, queue, _) = create_load_test_system();

    // Seed some waiting players
    for i in 0..10 {
        engine
            .handle_pairing_request(request(&format!("waiting_{}", i)))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..10 {
        // Cancel the waiting players while new requesters arrive
        let cancel_engine = engine.clone();
        let cancel_id = format!("waiting_{}", i);
        handles.push(tokio::spawn(async move {
            cancel_engine.cancel_search(&cancel_id).await.map(|_| ())
        }));

        let request_engine = engine.clone();
        let requester_id = format!("requester_{}", i);
        handles.push(tokio::spawn(async move {
            request_engine
                .handle_pairing_request(request(&requester_id))
                .await
                .map(|_| ())
        }));
    }

    for handle in handles {
        // No interleaving may produce an error
        handle.await.unwrap().unwrap();
    }

    // The queue still holds at most one entry per player
    let stats = engine.stats().await.unwrap();
    assert!(stats.players_waiting <= 20);
    assert_eq!(stats.players_waiting, queue.len().await.unwrap());
}
