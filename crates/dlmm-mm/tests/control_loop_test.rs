//! Control loop integration tests against the paper venue.
//!
//! Covers:
//! - Ticks abandoned on missing market data
//! - Quote placement, hedging and widening across ticks
//! - Unwinding offsetting inventory
//! - Startup seeding, cleanup and bounded runs

mod common;

use common::{book, config, level, pair, venue};

use dlmm_core::{OrderBook, OrderKind, OrderRequest, Price, Side, Volume};
use dlmm_mm::{
    MakerConfig, MarketMaker, MmError, SyncOutcome, TickOutcome, TickPhase, UnwindDirection,
    UnwindStop,
};
use dlmm_venue::{DynVenue, Venue};
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

fn maker(venue: DynVenue, config: MakerConfig, bid: Price, ask: Price) -> MarketMaker {
    MarketMaker::with_quotes(config, pair(), venue, bid, ask).unwrap()
}

fn completed(outcome: TickOutcome) -> dlmm_mm::TickReport {
    match outcome {
        TickOutcome::Completed(report) => report,
        TickOutcome::Skipped { phase, error, .. } => {
            panic!("tick skipped at {phase}: {error}")
        }
    }
}

#[tokio::test]
async fn test_empty_liquid_book_skips_tick() {
    let paper = venue(OrderBook::empty(), book(dec!(100.0), dec!(100.2), 10));
    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );

    let outcome = mm.tick().await;

    match outcome {
        TickOutcome::Skipped { phase, error, .. } => {
            assert_eq!(phase, TickPhase::QuoteUpdate);
            assert!(matches!(error, MmError::NoData { .. }));
        }
        TickOutcome::Completed(_) => panic!("tick should be skipped"),
    }
    assert_eq!(paper.mutation_count(), 0);
    assert_eq!(mm.engine().bid(), Price::new(dec!(99.2)));
    assert_eq!(mm.engine().ask(), Price::new(dec!(101.0)));
    assert_eq!(mm.tick_count(), 1);
}

#[tokio::test]
async fn test_one_sided_illiquid_book_skips_tick() {
    let illiquid = OrderBook::new(vec![level(dec!(100.0), 10)], vec![]);
    let paper = venue(book(dec!(100.0), dec!(100.2), 50), illiquid);
    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );

    let outcome = mm.tick().await;

    assert!(!outcome.is_completed());
    assert_eq!(paper.mutation_count(), 0);
}

#[tokio::test]
async fn test_unavailable_venue_skips_tick() {
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    paper.set_unavailable(true);
    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );

    match mm.tick().await {
        TickOutcome::Skipped { error, .. } => assert!(matches!(error, MmError::Venue(_))),
        TickOutcome::Completed(_) => panic!("tick should be skipped"),
    }
}

#[tokio::test]
async fn test_first_tick_narrows_and_quotes_both_sides() {
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );

    let report = completed(mm.tick().await);

    assert_eq!(report.bid, Price::new(dec!(99.3)));
    assert_eq!(report.ask, Price::new(dec!(100.9)));
    assert!(report.hedge.is_none());
    assert!(!report.widened.any());
    assert!(report.unwind.pairs.is_empty());

    let sides: Vec<_> = report.syncs.iter().map(|(side, _)| *side).collect();
    assert_eq!(sides, vec![Side::Ask, Side::Bid]);

    let placed = paper.placed_orders();
    assert_eq!(placed.len(), 2);
    assert_eq!(placed[0].side, Side::Ask);
    assert_eq!(placed[0].price, Price::new(dec!(100.9)));
    assert_eq!(placed[0].volume, Volume::new(14));
    assert_eq!(placed[1].side, Side::Bid);
    assert_eq!(placed[1].price, Price::new(dec!(99.3)));
    assert!(placed.iter().all(|o| o.kind == OrderKind::Resting));
}

#[tokio::test]
async fn test_narrowing_tick_at_pillow_refreshes_both_sides() {
    let pair = pair();
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    // Partly filled bid left over from an earlier tick.
    let leftover = OrderRequest::resting(
        pair.illiquid.clone(),
        Side::Bid,
        Price::new(dec!(99.9)),
        Volume::new(5),
    );
    paper.place_order(leftover).await.unwrap();

    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.9)),
        Price::new(dec!(100.3)),
    )
    .starting_at(9);

    let report = completed(mm.tick().await);

    assert!(report.quotes.bid_updated && report.quotes.ask_updated);
    assert_eq!(report.bid, Price::new(dec!(99.9)));
    assert_eq!(report.ask, Price::new(dec!(100.3)));
    assert_eq!(report.syncs.len(), 2);
    assert!(matches!(
        report.syncs[1],
        (Side::Bid, SyncOutcome::Replaced { cancelled: 1, .. })
    ));

    let outstanding = paper.outstanding_orders(&pair.illiquid).await.unwrap();
    assert_eq!(outstanding.len(), 2);
    assert!(outstanding.values().all(|o| o.volume == Volume::new(14)));
}

#[tokio::test]
async fn test_failed_cancel_still_hedges() {
    let pair = pair();
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    let resting = OrderRequest::resting(
        pair.illiquid.clone(),
        Side::Ask,
        Price::new(dec!(101.0)),
        Volume::new(8),
    );
    paper.place_order(resting).await.unwrap();
    paper.set_position(&pair.illiquid, -6);
    paper.fail_next_cancels(1, "cancel timeout");

    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );

    let report = completed(mm.tick().await);

    assert!(matches!(report.syncs[0], (Side::Ask, SyncOutcome::Failed { .. })));
    assert!(matches!(report.syncs[1], (Side::Bid, SyncOutcome::Replaced { .. })));

    let hedge = report.hedge.expect("net short must be hedged");
    assert_eq!(hedge.order.side, Side::Bid);
    assert_eq!(hedge.order.volume, Volume::new(6));
    assert_eq!(paper.position_of(&pair.liquid), 6);
}

#[tokio::test]
async fn test_fill_is_hedged_and_side_widened() {
    let pair = pair();
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );
    completed(mm.tick().await);

    // Counterparty lifts our bid between ticks.
    assert_eq!(paper.fill_resting(&pair.illiquid, Side::Bid), Volume::new(14));

    let report = completed(mm.tick().await);

    assert!(report.syncs.is_empty());
    let hedge = report.hedge.expect("net long must be hedged");
    assert_eq!(hedge.order.instrument, pair.liquid);
    assert_eq!(hedge.order.side, Side::Ask);
    assert_eq!(hedge.order.price, Price::new(dec!(100.0)));
    assert_eq!(hedge.order.volume, Volume::new(14));
    assert_eq!(hedge.order.kind, OrderKind::Immediate);

    assert!(report.widened.bid_updated);
    assert!(!report.widened.ask_updated);
    assert_eq!(report.bid, Price::new(dec!(99.1)));
    assert_eq!(report.ask, Price::new(dec!(100.9)));

    // Illiquid bid 100.0 is below the liquid ask 100.2: nothing to unwind.
    assert_eq!(
        report.unwind.direction,
        Some(UnwindDirection::SellIlliquid)
    );
    assert_eq!(report.unwind.stop, UnwindStop::Unfavorable { level: 0 });

    assert_eq!(paper.position_of(&pair.liquid), -14);
    assert_eq!(paper.position_of(&pair.illiquid), 14);
}

#[tokio::test]
async fn test_offsetting_positions_unwound() {
    let pair = pair();
    let liquid = OrderBook::new(
        vec![level(dec!(99.8), 50)],
        vec![level(dec!(100.0), 4), level(dec!(100.3), 10)],
    );
    let illiquid = OrderBook::new(vec![level(dec!(100.1), 30)], vec![level(dec!(100.5), 30)]);
    let paper = venue(liquid, illiquid);
    paper.set_position(&pair.liquid, -6);
    paper.set_position(&pair.illiquid, 6);

    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.0)),
        Price::new(dec!(101.5)),
    )
    .starting_at(1);

    let report = completed(mm.tick().await);

    assert!(report.hedge.is_none());
    assert_eq!(report.unwind.pairs.len(), 1);
    assert_eq!(report.unwind.pairs[0].volume, Volume::new(4));
    assert_eq!(report.unwind.stop, UnwindStop::Unfavorable { level: 1 });

    assert_eq!(paper.position_of(&pair.liquid), -2);
    assert_eq!(paper.position_of(&pair.illiquid), 2);

    let placed = paper.placed_orders();
    assert_eq!(placed.len(), 2);
    assert_eq!(placed[0].instrument, pair.illiquid);
    assert_eq!(placed[0].side, Side::Ask);
    assert_eq!(placed[0].price, Price::new(dec!(100.1)));
    assert_eq!(placed[1].instrument, pair.liquid);
    assert_eq!(placed[1].side, Side::Bid);
    assert_eq!(placed[1].price, Price::new(dec!(100.0)));
}

#[tokio::test]
async fn test_position_limit_guards_bid() {
    let pair = pair();
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 500),
        book(dec!(100.0), dec!(100.2), 10),
    );
    paper.set_position(&pair.liquid, -201);
    paper.set_position(&pair.illiquid, 201);

    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );

    let report = completed(mm.tick().await);

    assert_eq!(report.syncs.len(), 2);
    assert!(matches!(report.syncs[0], (Side::Ask, SyncOutcome::Replaced { .. })));
    assert_eq!(report.syncs[1], (Side::Bid, SyncOutcome::Guarded));

    let outstanding = paper.outstanding_orders(&pair.illiquid).await.unwrap();
    assert_eq!(outstanding.len(), 1);
    assert!(outstanding.values().all(|o| o.side == Side::Ask));
}

#[tokio::test]
async fn test_settlement_delay_runs() {
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    let config = MakerConfig {
        settlement_delay_ms: 5,
        ..Default::default()
    };
    let mut mm = maker(paper, config, Price::new(dec!(99.2)), Price::new(dec!(101.0)));

    let started = std::time::Instant::now();
    completed(mm.tick().await);
    assert!(started.elapsed() >= std::time::Duration::from_millis(5));
}

#[tokio::test]
async fn test_pillow_holds_over_many_ticks() {
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 1_000),
        book(dec!(100.0), dec!(100.2), 1_000),
    );
    let mut mm = maker(
        paper,
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );

    for _ in 0..60 {
        let report = completed(mm.tick().await);
        assert!(dec!(100.0) - report.bid.inner() >= dec!(0.1));
        assert!(report.ask.inner() - dec!(100.2) >= dec!(0.1));
    }
}

#[tokio::test]
async fn test_initialize_seeds_and_clears_orders() {
    let pair = pair();
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    // Leftovers from a previous run.
    for instrument in pair.both() {
        paper
            .place_order(dlmm_core::OrderRequest::resting(
                instrument.clone(),
                Side::Bid,
                Price::new(dec!(90)),
                Volume::new(3),
            ))
            .await
            .unwrap();
    }

    let token = CancellationToken::new();
    let mm = MarketMaker::initialize(config(), pair.clone(), paper.clone(), &token)
        .await
        .unwrap();

    assert_eq!(mm.engine().bid(), Price::new(dec!(99.2)));
    assert_eq!(mm.engine().ask(), Price::new(dec!(101.0)));
    for instrument in pair.both() {
        assert!(paper.outstanding_orders(instrument).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_initialize_rejects_invalid_config() {
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    let bad = MakerConfig {
        narrow_period: 0,
        ..config()
    };

    let result = MarketMaker::initialize(bad, pair(), paper, &CancellationToken::new()).await;

    assert!(matches!(result, Err(MmError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_run_stops_at_max_steps() {
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    let mut mm = maker(
        paper,
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );

    let summary = mm.run(&CancellationToken::new(), Some(5)).await;

    assert_eq!(summary.ticks, 5);
    assert_eq!(summary.completed, 5);
    assert_eq!(mm.tick_count(), 5);
}

#[tokio::test]
async fn test_run_stops_between_ticks_on_shutdown() {
    let paper = venue(
        book(dec!(100.0), dec!(100.2), 50),
        book(dec!(100.0), dec!(100.2), 10),
    );
    let mut mm = maker(
        paper.clone(),
        config(),
        Price::new(dec!(99.2)),
        Price::new(dec!(101.0)),
    );
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let summary = mm.run(&shutdown, None).await;

    assert_eq!(summary.ticks, 0);
    assert_eq!(paper.mutation_count(), 0);
}
