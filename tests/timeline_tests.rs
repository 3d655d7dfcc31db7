mod harness;

use chrono::{DateTime, TimeZone, Utc};
use harness::temp_db::TempDb;
use legbook::domain::{
    NewEvent, NewOrder, NewSession, OrderExecution, OrderSide, OrderType, SessionId,
    TimelineSource,
};
use legbook::port::outbound::report::TimelineReader;
use legbook::port::outbound::store::{EventStore, OrderStore, SessionStore};
use rust_decimal_macros::dec;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 5, 9, minute, 0).unwrap()
}

async fn session(db: &TempDb, id: &str) -> SessionId {
    db.db()
        .sessions()
        .create(&NewSession::new(id, "NIFTY", at(0).date_naive()).with_session_date(at(0)))
        .await
        .unwrap();
    SessionId::new(id)
}

#[tokio::test]
async fn events_and_orders_merge_chronologically() {
    let db = TempDb::create();
    let id = session(&db, "t1").await;
    let events = db.db().events();
    let orders = db.db().orders();

    events
        .append(&id, &NewEvent::new("STRATEGY_START").at(at(15)).describe("boot"))
        .await
        .unwrap();
    let entry = orders
        .place(
            &id,
            &NewOrder::new(OrderType::Entry, "NIFTY26FEB22500CE", OrderSide::Buy, 75)
                .for_leg(1)
                .at(at(16)),
        )
        .await
        .unwrap();
    orders
        .record_execution(entry.id, &OrderExecution::executed(dec!(101.5), 75))
        .await
        .unwrap();
    orders
        .place(
            &id,
            &NewOrder::new(OrderType::Exit, "NIFTY26FEB22500CE", OrderSide::Sell, 75)
                .for_leg(1)
                .at(at(20)),
        )
        .await
        .unwrap();
    events
        .append(
            &id,
            &NewEvent::new("POSITION_ACTIVE")
                .at(at(17))
                .for_leg(1, "NIFTY26FEB22500CE"),
        )
        .await
        .unwrap();

    let timeline = db.db().timeline().timeline(&id).unwrap();
    let rows: Vec<(TimelineSource, String, String)> = timeline
        .iter()
        .map(|e| (e.source, e.action.clone(), e.details.clone()))
        .collect();

    assert_eq!(
        rows,
        vec![
            (TimelineSource::Event, "STRATEGY_START".into(), "boot".into()),
            (
                TimelineSource::Order,
                "ENTRY".into(),
                "status=EXECUTED; exec_price=101.5".into()
            ),
            (TimelineSource::Event, "POSITION_ACTIVE".into(), String::new()),
            (
                TimelineSource::Order,
                "EXIT".into(),
                "status=PENDING; exec_price=NULL".into()
            ),
        ]
    );
}

#[tokio::test]
async fn equal_timestamps_list_events_first() {
    let db = TempDb::create();
    let id = session(&db, "t2").await;

    db.db()
        .orders()
        .place(&id, &NewOrder::new(OrderType::Entry, "X", OrderSide::Buy, 1).at(at(30)))
        .await
        .unwrap();
    db.db()
        .events()
        .append(&id, &NewEvent::new("ORDER_PLACED").at(at(30)))
        .await
        .unwrap();

    let timeline = db.db().timeline().timeline(&id).unwrap();
    let sources: Vec<TimelineSource> = timeline.iter().map(|e| e.source).collect();

    assert_eq!(sources, vec![TimelineSource::Event, TimelineSource::Order]);
}

#[tokio::test]
async fn timeline_is_scoped_to_one_session() {
    let db = TempDb::create();
    db.seed_session("a", "NIFTY", at(1), 2).await;
    db.seed_session("b", "NIFTY", at(2), 3).await;

    let timeline = db.db().timeline().timeline(&SessionId::new("a")).unwrap();

    assert_eq!(timeline.len(), 4);
    assert!(timeline
        .iter()
        .all(|e| e.symbol.as_deref().is_some_and(|s| s.starts_with("NIFTY-LEG"))));
}

#[tokio::test]
async fn unknown_session_has_empty_timeline() {
    let db = TempDb::create();
    db.seed_session("a", "NIFTY", at(1), 1).await;

    let timeline = db.db().timeline().timeline(&SessionId::new("ghost")).unwrap();

    assert!(timeline.is_empty());
    assert_eq!(timeline.iter().count(), 0);
}

#[tokio::test]
async fn csv_export_matches_merged_rows() {
    let db = TempDb::create();
    let id = session(&db, "t3").await;
    db.db()
        .events()
        .append(&id, &NewEvent::new("ERROR").at(at(40)).describe("feed lost, retrying"))
        .await
        .unwrap();

    let timeline = db.db().timeline().timeline(&id).unwrap();
    let mut out = Vec::new();
    timeline.write_csv(&mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "source,timestamp,action,leg_number,symbol,details");
    assert_eq!(
        lines[1],
        "EVENT,2026-02-05T09:40:00.000000Z,ERROR,,,\"feed lost, retrying\""
    );
    assert_eq!(lines.len(), 2);
}
