//! Performance benchmarks for rating and pairing calculations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skittles_room::queue::matching::{CandidateMatcher, MatchingConfig, RatingWindowMatcher};
use skittles_room::rating::elo::EloCalculator;
use skittles_room::rating::tiers::TierTable;
use skittles_room::types::{GameMode, Outcome, QueueEntry, SearchContext};

fn bench_elo_updates(c: &mut Criterion) {
    let calculator = EloCalculator::default();

    c.bench_function("elo_update_pair", |b| {
        b.iter(|| {
            calculator.update_pair(black_box(1500), black_box(1480), black_box(Outcome::Win))
        })
    });

    c.bench_function("elo_expected_score", |b| {
        b.iter(|| calculator.expected_score(black_box(1500), black_box(1700)))
    });
}

fn bench_tier_classification(c: &mut Criterion) {
    let table = TierTable::standard();

    c.bench_function("tier_for_rating_sweep", |b| {
        b.iter(|| {
            for rating in (800..2600).step_by(100) {
                black_box(table.tier_for(black_box(rating)));
            }
        })
    });
}

fn bench_candidate_selection(c: &mut Criterion) {
    let matcher = RatingWindowMatcher::new();
    let config = MatchingConfig::default();
    let now = skittles_room::utils::current_timestamp();

    // A busy queue: 1000 waiting entries spread over the rating range
    let entries: Vec<QueueEntry> = (0..1000)
        .map(|i| {
            QueueEntry::new(
                format!("player_{}", i),
                GameMode::Blitz,
                900 + (i % 1500) as i32,
            )
        })
        .collect();

    let ctx = SearchContext {
        player_id: "requester".to_string(),
        mode: GameMode::Blitz,
        rating: 1500,
    };

    c.bench_function("rank_candidates_1000_entries", |b| {
        b.iter(|| {
            matcher.rank_candidates(
                black_box(&ctx),
                black_box(entries.clone()),
                now,
                black_box(&config),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_elo_updates,
    bench_tier_classification,
    bench_candidate_selection
);
criterion_main!(benches);
