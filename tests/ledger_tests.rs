//! End-to-end session lifecycle: writes through the stores, reads back
//! through reports.

mod harness;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use harness::temp_db::TempDb;
use legbook::domain::{
    NewEvent, NewOrder, NewPosition, NewSession, NewSnapshot, OrderExecution, OrderFilter,
    OrderSide, OrderStatus, OrderType, PositionEntry, PositionExit, PositionFilter, PositionStatus,
    SessionCounters, SessionId, SessionStatus,
};
use legbook::error::Error;
use legbook::port::outbound::report::SessionReportReader;
use legbook::port::outbound::store::{EventStore, OrderStore, PositionStore, SessionStore};
use rust_decimal_macros::dec;

fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 30).unwrap()
}

#[tokio::test]
async fn completed_session_rolls_up_into_reports() {
    let db = TempDb::create();
    let started = Utc.with_ymd_and_hms(2026, 4, 28, 3, 45, 0).unwrap();
    let id = SessionId::new("run-1");
    db.db()
        .sessions()
        .create(
            &NewSession::new(id.clone(), "NIFTY", expiry())
                .with_contract(50, 75)
                .with_session_date(started),
        )
        .await
        .unwrap();

    let positions = db.db().positions();
    let orders = db.db().orders();
    for (leg, pnl) in [(1, dec!(1200)), (2, dec!(-300))] {
        let symbol = format!("NIFTY26APR2240{leg}CE");
        let position = positions
            .open(
                &id,
                &NewPosition::new(leg, &symbol).with_strikes(22500, 22400),
            )
            .await
            .unwrap();
        let order = orders
            .place(
                &id,
                &NewOrder::new(OrderType::Entry, &symbol, OrderSide::Buy, 75).for_leg(leg),
            )
            .await
            .unwrap();
        orders
            .record_execution(order.id, &OrderExecution::executed(dec!(100), 75))
            .await
            .unwrap();
        db.db()
            .sessions()
            .increment_counters(&id, &SessionCounters::order_executed())
            .await
            .unwrap();
        positions
            .record_entry(
                position.id,
                &PositionEntry {
                    time: started + Duration::minutes(5),
                    price: dec!(100),
                    quantity: 75,
                    order_id: None,
                    current_sl: dec!(80),
                    lock_profit: dec!(0),
                },
            )
            .await
            .unwrap();
        positions
            .append_snapshot(position.id, &NewSnapshot::new("ENTRY").with_price(dec!(100)))
            .await
            .unwrap();
        positions
            .record_exit(
                position.id,
                &PositionExit {
                    time: started + Duration::hours(5),
                    price: dec!(100) + pnl / dec!(75),
                    quantity: Some(75),
                    order_id: None,
                    reason: "EOD".to_string(),
                    realized_pnl: pnl,
                    pnl_percentage: pnl / dec!(75),
                },
            )
            .await
            .unwrap();
    }

    db.db()
        .sessions()
        .update_status(&id, SessionStatus::Completed, Some("done"))
        .await
        .unwrap();

    let reports = db.db().reports();
    let summary = reports.summary(&id).unwrap().expect("summary");
    assert_eq!(summary.status, SessionStatus::Completed);
    assert!(summary.end_time.is_some());
    assert_eq!(summary.total_positions, 2);
    assert_eq!(summary.closed_positions, 2);
    assert_eq!(summary.total_orders, 2);
    assert_eq!(summary.net_pnl, dec!(900));
    assert_eq!(summary.legs.len(), 2);

    let performance = reports.expiry_performance(expiry()).unwrap().expect("performance");
    assert_eq!(performance.num_sessions, 1);
    assert_eq!(performance.total_positions, 2);
    assert_eq!(performance.total_orders, 2);
    assert_eq!(performance.net_pnl, dec!(900));

    let executed = orders
        .list(&OrderFilter::for_session(id.clone()).with_status(OrderStatus::Executed))
        .await
        .unwrap();
    assert_eq!(executed.len(), 2);
}

#[tokio::test]
async fn writes_for_unknown_session_leave_no_rows() {
    let db = TempDb::create();
    let ghost = SessionId::new("ghost");

    let position = db
        .db()
        .positions()
        .open(&ghost, &NewPosition::new(1, "X"))
        .await
        .unwrap_err();
    let order = db
        .db()
        .orders()
        .place(&ghost, &NewOrder::new(OrderType::Entry, "X", OrderSide::Buy, 1))
        .await
        .unwrap_err();
    let event = db
        .db()
        .events()
        .append(&ghost, &NewEvent::new("ERROR"))
        .await
        .unwrap_err();

    for err in [position, order, event] {
        assert!(matches!(err, Error::ReferentialIntegrity { .. }), "got {err:?}");
    }
    assert!(db.counts().is_empty());
}

#[tokio::test]
async fn crashed_sessions_are_detected_and_marked() {
    let db = TempDb::create();
    let date = Utc.with_ymd_and_hms(2026, 4, 29, 3, 45, 0).unwrap();
    db.seed_session("live", "NIFTY", date, 2).await;
    db.seed_session("idle", "NIFTY", date, 1).await;
    let live = SessionId::new("live");

    let legs = db
        .db()
        .positions()
        .list(&PositionFilter::for_session(live.clone()))
        .await
        .unwrap();
    db.db()
        .positions()
        .record_entry(
            legs[0].id,
            &PositionEntry {
                time: date,
                price: dec!(50),
                quantity: 75,
                order_id: None,
                current_sl: dec!(40),
                lock_profit: dec!(0),
            },
        )
        .await
        .unwrap();

    let reports = db.db().reports();
    let crashed = reports.crashed_sessions().unwrap();
    assert_eq!(crashed.len(), 1);
    assert_eq!(crashed[0].session_id, live);
    assert_eq!(crashed[0].active_positions, vec![legs[0].id]);

    let marked = reports
        .mark_crashed(&[live.clone(), SessionId::new("missing")], "power loss")
        .unwrap();
    assert_eq!(marked, 1);
    let session = db.db().sessions().get(&live).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Crashed);
    assert!(session.end_time.is_some());
    assert!(session.notes.unwrap_or_default().contains("[CRASHED] power loss"));
    assert!(reports.crashed_sessions().unwrap().is_empty());

    assert_eq!(reports.mark_recovered(&[legs[0].id]).unwrap(), 1);
    let leg = db.db().positions().get(legs[0].id).await.unwrap().unwrap();
    assert_eq!(leg.status, PositionStatus::Recovered);
}
