//! Database model types for Diesel ORM.
//!
//! Queryable rows convert into domain records with `TryFrom`; stored text
//! that fails to parse surfaces as a domain error rather than a panic.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use super::schema::{events, orders, position_snapshots, positions, sessions};
use crate::domain::time::{parse_date, parse_timestamp};
use crate::domain::{
    Event, EventId, Order, OrderId, Position, PositionId, Session, SessionCounters, SessionId,
    SessionKey, Snapshot, SnapshotId,
};
use crate::error::{Error, Result};

/// Convert a decimal to f64 for storage.
#[must_use]
pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Convert a stored f64 to Decimal.
#[must_use]
pub fn f64_to_decimal(f: f64) -> Decimal {
    Decimal::from_f64(f).unwrap_or(Decimal::ZERO)
}

fn timestamp(text: &str) -> Result<DateTime<Utc>> {
    Ok(parse_timestamp(text)?)
}

fn optional_timestamp(text: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    text.map(timestamp).transpose()
}

fn optional_decimal(value: Option<f64>) -> Option<Decimal> {
    value.map(f64_to_decimal)
}

/// Row id of the most recent insert on a connection.
#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    id: i32,
}

/// Read back the id SQLite assigned to the last inserted row.
///
/// Must run on the connection that performed the insert.
pub fn last_insert_rowid(conn: &mut SqliteConnection) -> QueryResult<i32> {
    diesel::sql_query("SELECT last_insert_rowid() AS id")
        .get_result::<LastInsertRowId>(conn)
        .map(|row| row.id)
}

/// Database row for a session.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SessionRow {
    pub id: i32,
    pub session_id: String,
    pub index_symbol: String,
    pub strike_diff: i32,
    pub lot_size: i32,
    pub expiry_date: String,
    pub status: String,
    pub total_orders_placed: i32,
    pub total_orders_executed: i32,
    pub total_orders_rejected: i32,
    pub total_legs_opened: i32,
    pub total_legs_closed: i32,
    pub net_pnl: f64,
    pub notes: Option<String>,
    pub session_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Database row for a session (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = sessions)]
pub struct NewSessionRow {
    pub session_id: String,
    pub index_symbol: String,
    pub strike_diff: i32,
    pub lot_size: i32,
    pub expiry_date: String,
    pub status: String,
    pub notes: Option<String>,
    pub session_date: String,
    pub start_time: Option<String>,
    pub created_at: String,
}

impl TryFrom<SessionRow> for Session {
    type Error = Error;

    fn try_from(row: SessionRow) -> Result<Self> {
        Ok(Self {
            key: SessionKey::new(row.id),
            session_id: SessionId::new(row.session_id),
            index_symbol: row.index_symbol,
            strike_diff: row.strike_diff,
            lot_size: row.lot_size,
            expiry_date: parse_date(&row.expiry_date)?,
            status: row.status.parse()?,
            counters: SessionCounters {
                orders_placed: row.total_orders_placed,
                orders_executed: row.total_orders_executed,
                orders_rejected: row.total_orders_rejected,
                legs_opened: row.total_legs_opened,
                legs_closed: row.total_legs_closed,
            },
            net_pnl: f64_to_decimal(row.net_pnl),
            notes: row.notes,
            session_date: timestamp(&row.session_date)?,
            start_time: optional_timestamp(row.start_time.as_deref())?,
            end_time: optional_timestamp(row.end_time.as_deref())?,
            created_at: timestamp(&row.created_at)?,
            updated_at: optional_timestamp(row.updated_at.as_deref())?,
        })
    }
}

/// Database row for a position.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionRow {
    pub id: i32,
    pub session_id: i32,
    pub leg_number: i32,
    pub symbol: String,
    pub status: String,
    pub entry_time: Option<String>,
    pub entry_price: Option<f64>,
    pub entry_quantity: Option<i32>,
    pub entry_order_id: Option<String>,
    pub atm_strike: Option<i32>,
    pub itm_level: Option<i32>,
    pub exit_time: Option<String>,
    pub exit_price: Option<f64>,
    pub exit_quantity: Option<i32>,
    pub exit_order_id: Option<String>,
    pub exit_reason: Option<String>,
    pub current_sl: Option<f64>,
    pub lock_profit: f64,
    pub current_price: Option<f64>,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub pnl_percentage: f64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Database row for a position (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = positions)]
pub struct NewPositionRow {
    pub session_id: i32,
    pub leg_number: i32,
    pub symbol: String,
    pub status: String,
    pub entry_time: Option<String>,
    pub entry_price: Option<f64>,
    pub entry_quantity: Option<i32>,
    pub atm_strike: Option<i32>,
    pub itm_level: Option<i32>,
    pub created_at: String,
}

impl TryFrom<PositionRow> for Position {
    type Error = Error;

    fn try_from(row: PositionRow) -> Result<Self> {
        Ok(Self {
            id: PositionId::new(row.id),
            session: SessionKey::new(row.session_id),
            leg_number: row.leg_number,
            symbol: row.symbol,
            status: row.status.parse()?,
            entry_time: optional_timestamp(row.entry_time.as_deref())?,
            entry_price: optional_decimal(row.entry_price),
            entry_quantity: row.entry_quantity,
            entry_order_id: row.entry_order_id,
            atm_strike: row.atm_strike,
            itm_level: row.itm_level,
            exit_time: optional_timestamp(row.exit_time.as_deref())?,
            exit_price: optional_decimal(row.exit_price),
            exit_quantity: row.exit_quantity,
            exit_order_id: row.exit_order_id,
            exit_reason: row.exit_reason,
            current_sl: optional_decimal(row.current_sl),
            lock_profit: f64_to_decimal(row.lock_profit),
            current_price: optional_decimal(row.current_price),
            realized_pnl: f64_to_decimal(row.realized_pnl),
            unrealized_pnl: f64_to_decimal(row.unrealized_pnl),
            pnl_percentage: f64_to_decimal(row.pnl_percentage),
            created_at: timestamp(&row.created_at)?,
            updated_at: optional_timestamp(row.updated_at.as_deref())?,
        })
    }
}

/// Database row for a position snapshot.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = position_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SnapshotRow {
    pub id: i32,
    pub position_id: i32,
    pub timestamp: String,
    pub event_type: Option<String>,
    pub current_price: Option<f64>,
    pub current_sl: Option<f64>,
    pub lock_profit: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub pnl_percentage: Option<f64>,
    pub notes: Option<String>,
}

/// Database row for a position snapshot (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = position_snapshots)]
pub struct NewSnapshotRow {
    pub position_id: i32,
    pub timestamp: String,
    pub event_type: Option<String>,
    pub current_price: Option<f64>,
    pub current_sl: Option<f64>,
    pub lock_profit: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub pnl_percentage: Option<f64>,
    pub notes: Option<String>,
}

impl TryFrom<SnapshotRow> for Snapshot {
    type Error = Error;

    fn try_from(row: SnapshotRow) -> Result<Self> {
        Ok(Self {
            id: SnapshotId::new(row.id),
            position_id: PositionId::new(row.position_id),
            timestamp: timestamp(&row.timestamp)?,
            event_type: row.event_type,
            current_price: optional_decimal(row.current_price),
            current_sl: optional_decimal(row.current_sl),
            lock_profit: optional_decimal(row.lock_profit),
            unrealized_pnl: optional_decimal(row.unrealized_pnl),
            pnl_percentage: optional_decimal(row.pnl_percentage),
            notes: row.notes,
        })
    }
}

/// Database row for an order.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderRow {
    pub id: i32,
    pub session_id: i32,
    pub order_id: Option<String>,
    pub leg_number: Option<i32>,
    pub order_type: String,
    pub symbol: String,
    pub exchange: String,
    pub side: String,
    pub quantity: i32,
    pub price: Option<f64>,
    pub order_time: String,
    pub status: String,
    pub execution_price: Option<f64>,
    pub executed_quantity: Option<i32>,
    pub execution_time: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Database row for an order (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub session_id: i32,
    pub leg_number: Option<i32>,
    pub order_type: String,
    pub symbol: String,
    pub exchange: String,
    pub side: String,
    pub quantity: i32,
    pub price: Option<f64>,
    pub order_time: String,
    pub status: String,
    pub created_at: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = Error;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Self {
            id: OrderId::new(row.id),
            session: SessionKey::new(row.session_id),
            broker_order_id: row.order_id,
            leg_number: row.leg_number,
            order_type: row.order_type.parse()?,
            symbol: row.symbol,
            exchange: row.exchange,
            side: row.side.parse()?,
            quantity: row.quantity,
            price: optional_decimal(row.price),
            order_time: timestamp(&row.order_time)?,
            status: row.status.parse()?,
            execution_price: optional_decimal(row.execution_price),
            executed_quantity: row.executed_quantity,
            execution_time: optional_timestamp(row.execution_time.as_deref())?,
            error_message: row.error_message,
            created_at: timestamp(&row.created_at)?,
            updated_at: optional_timestamp(row.updated_at.as_deref())?,
        })
    }
}

/// Database row for an event.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRow {
    pub id: i32,
    pub session_id: i32,
    pub event_time: String,
    pub event_type: String,
    pub leg_number: Option<i32>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub data: Option<String>,
    pub created_at: String,
}

/// Database row for an event (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = events)]
pub struct NewEventRow {
    pub session_id: i32,
    pub event_time: String,
    pub event_type: String,
    pub leg_number: Option<i32>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub data: Option<String>,
    pub created_at: String,
}

impl TryFrom<EventRow> for Event {
    type Error = Error;

    fn try_from(row: EventRow) -> Result<Self> {
        let data: Option<serde_json::Value> = row
            .data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(Self {
            id: EventId::new(row.id),
            session: SessionKey::new(row.session_id),
            event_time: timestamp(&row.event_time)?,
            event_type: row.event_type,
            leg_number: row.leg_number,
            symbol: row.symbol,
            description: row.description,
            data,
        })
    }
}
