//! SQLite position and snapshot store implementation.

use chrono::Utc;
use diesel::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::database::connection::{checkout, database_error, DbPool};
use super::database::model::{
    decimal_to_f64, last_insert_rowid, NewPositionRow, NewSnapshotRow, OrderRow, PositionRow,
    SnapshotRow,
};
use super::database::schema::{orders, position_snapshots, positions, sessions};
use super::session::{require_session, session_key};
use crate::domain::position::{SNAPSHOT_PROFIT_UPDATED, SNAPSHOT_SL_UPDATED};
use crate::domain::time::format_timestamp;
use crate::domain::{
    NewPosition, NewSnapshot, Order, Position, PositionEntry, PositionExit, PositionFilter,
    PositionId, PositionMark, PositionStatus, SessionId, Snapshot,
};
use crate::error::{Error, Result};
use crate::port::outbound::store::PositionStore;

fn load_position(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<PositionRow>> {
    positions::table
        .find(id)
        .select(PositionRow::as_select())
        .first(conn)
        .optional()
}

fn insert_snapshot(
    conn: &mut SqliteConnection,
    position: PositionId,
    snapshot: &NewSnapshot,
) -> Result<Snapshot> {
    let row = NewSnapshotRow {
        position_id: position.value(),
        timestamp: format_timestamp(&snapshot.timestamp.unwrap_or_else(Utc::now)),
        event_type: snapshot.event_type.clone(),
        current_price: snapshot.current_price.map(decimal_to_f64),
        current_sl: snapshot.current_sl.map(decimal_to_f64),
        lock_profit: snapshot.lock_profit.map(decimal_to_f64),
        unrealized_pnl: snapshot.unrealized_pnl.map(decimal_to_f64),
        pnl_percentage: snapshot.pnl_percentage.map(decimal_to_f64),
        notes: snapshot.notes.clone(),
    };

    diesel::insert_into(position_snapshots::table)
        .values(&row)
        .execute(conn)
        .map_err(|e| database_error("snapshot", e))?;
    let id = last_insert_rowid(conn)?;
    let stored: SnapshotRow = position_snapshots::table
        .find(id)
        .select(SnapshotRow::as_select())
        .first(conn)?;
    Snapshot::try_from(stored)
}

/// SQLite-backed position store.
#[derive(Clone)]
pub struct SqlitePositionStore {
    pool: DbPool,
}

impl SqlitePositionStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run a single-row update, reporting whether the position existed.
    fn update_one<F>(&self, id: PositionId, update: F) -> Result<bool>
    where
        F: FnOnce(&mut SqliteConnection, String) -> QueryResult<usize>,
    {
        let mut conn = checkout(&self.pool)?;
        let now = format_timestamp(&Utc::now());
        let updated = update(&mut conn, now).map_err(|e| database_error("position", e))?;
        if updated == 0 {
            debug!(position_id = id.value(), "Position not found for update");
        }
        Ok(updated > 0)
    }
}

impl PositionStore for SqlitePositionStore {
    async fn open(&self, session: &SessionId, position: &NewPosition) -> Result<Position> {
        let mut conn = checkout(&self.pool)?;

        let opened = conn.transaction(|conn| -> Result<Position> {
            let key = require_session(conn, session, "position")?;
            let strike_diff: i32 = sessions::table
                .find(key)
                .select(sessions::strike_diff)
                .first(conn)?;
            let now = format_timestamp(&Utc::now());
            let entered = position.entry_price.is_some();

            let row = NewPositionRow {
                session_id: key,
                leg_number: position.leg_number,
                symbol: position.symbol.clone(),
                status: position.initial_status().as_str().to_string(),
                entry_time: entered.then(|| now.clone()),
                entry_price: position.entry_price.map(decimal_to_f64),
                entry_quantity: position.quantity,
                atm_strike: position.atm_strike,
                itm_level: position.itm_level(strike_diff),
                created_at: now,
            };
            diesel::insert_into(positions::table)
                .values(&row)
                .execute(conn)
                .map_err(|e| database_error("position", e))?;

            let id = last_insert_rowid(conn)?;
            let stored = load_position(conn, id)?.ok_or_else(|| Error::NotFound {
                entity: "position",
                id: id.to_string(),
            })?;
            Position::try_from(stored)
        })?;

        info!(
            session_id = %session,
            leg = opened.leg_number,
            symbol = %opened.symbol,
            position_id = opened.id.value(),
            "Opened position"
        );
        Ok(opened)
    }

    async fn get(&self, id: PositionId) -> Result<Option<Position>> {
        let mut conn = checkout(&self.pool)?;
        load_position(&mut conn, id.value())
            .map_err(|e| database_error("position", e))?
            .map(Position::try_from)
            .transpose()
    }

    async fn list(&self, filter: &PositionFilter) -> Result<Vec<Position>> {
        let mut conn = checkout(&self.pool)?;

        let mut query = positions::table
            .select(PositionRow::as_select())
            .into_boxed();
        if let Some(session) = &filter.session {
            let Some(key) =
                session_key(&mut conn, session).map_err(|e| database_error("position", e))?
            else {
                return Ok(Vec::new());
            };
            query = query.filter(positions::session_id.eq(key));
        }
        if let Some(status) = filter.status {
            query = query.filter(positions::status.eq(status.as_str()));
        }
        if let Some(symbol) = &filter.symbol {
            query = query.filter(positions::symbol.eq(symbol.clone()));
        }

        let rows: Vec<PositionRow> = query
            .order((
                positions::session_id.asc(),
                positions::leg_number.asc(),
                positions::id.asc(),
            ))
            .load(&mut conn)
            .map_err(|e| database_error("position", e))?;
        rows.into_iter().map(Position::try_from).collect()
    }

    async fn record_entry(&self, id: PositionId, entry: &PositionEntry) -> Result<bool> {
        let price = decimal_to_f64(entry.price);
        self.update_one(id, |conn, now| {
            diesel::update(positions::table.find(id.value()))
                .set((
                    positions::entry_time.eq(Some(format_timestamp(&entry.time))),
                    positions::entry_price.eq(Some(price)),
                    positions::entry_quantity.eq(Some(entry.quantity)),
                    positions::entry_order_id.eq(entry.order_id.clone()),
                    positions::status.eq(PositionStatus::Active.as_str()),
                    positions::current_sl.eq(Some(decimal_to_f64(entry.current_sl))),
                    positions::lock_profit.eq(decimal_to_f64(entry.lock_profit)),
                    positions::current_price.eq(Some(price)),
                    positions::updated_at.eq(Some(now)),
                ))
                .execute(conn)
        })
    }

    async fn update_mark(&self, id: PositionId, mark: &PositionMark) -> Result<bool> {
        self.update_one(id, |conn, now| {
            diesel::update(positions::table.find(id.value()))
                .set((
                    positions::current_price.eq(Some(decimal_to_f64(mark.current_price))),
                    positions::unrealized_pnl.eq(decimal_to_f64(mark.unrealized_pnl)),
                    positions::pnl_percentage.eq(decimal_to_f64(mark.pnl_percentage)),
                    positions::updated_at.eq(Some(now)),
                ))
                .execute(conn)
        })
    }

    async fn update_risk(
        &self,
        id: PositionId,
        current_sl: Decimal,
        lock_profit: Decimal,
    ) -> Result<bool> {
        let mut conn = checkout(&self.pool)?;

        conn.transaction(|conn| -> Result<bool> {
            let Some(row) = load_position(conn, id.value())? else {
                return Ok(false);
            };
            let current = Position::try_from(row)?;
            let now = Utc::now();

            diesel::update(positions::table.find(id.value()))
                .set((
                    positions::current_sl.eq(Some(decimal_to_f64(current_sl))),
                    positions::lock_profit.eq(decimal_to_f64(lock_profit)),
                    positions::updated_at.eq(Some(format_timestamp(&now))),
                ))
                .execute(conn)?;

            let tag = if current.current_sl == Some(current_sl) {
                SNAPSHOT_PROFIT_UPDATED
            } else {
                SNAPSHOT_SL_UPDATED
            };
            let snapshot = NewSnapshot {
                current_sl: Some(current_sl),
                lock_profit: Some(lock_profit),
                ..NewSnapshot::of(&current, tag)
            }
            .at(now);
            insert_snapshot(conn, id, &snapshot)?;

            debug!(
                position_id = id.value(),
                sl = %current_sl,
                lock_profit = %lock_profit,
                tag,
                "Updated position risk"
            );
            Ok(true)
        })
    }

    async fn record_exit(&self, id: PositionId, exit: &PositionExit) -> Result<bool> {
        let updated = self.update_one(id, |conn, now| {
            diesel::update(positions::table.find(id.value()))
                .set((
                    positions::exit_time.eq(Some(format_timestamp(&exit.time))),
                    positions::exit_price.eq(Some(decimal_to_f64(exit.price))),
                    positions::exit_quantity.eq(exit.quantity),
                    positions::exit_order_id.eq(exit.order_id.clone()),
                    positions::exit_reason.eq(Some(exit.reason.clone())),
                    positions::status.eq(PositionStatus::Closed.as_str()),
                    positions::realized_pnl.eq(decimal_to_f64(exit.realized_pnl)),
                    positions::pnl_percentage.eq(decimal_to_f64(exit.pnl_percentage)),
                    positions::unrealized_pnl.eq(0.0),
                    positions::updated_at.eq(Some(now)),
                ))
                .execute(conn)
        })?;
        if updated {
            info!(
                position_id = id.value(),
                reason = %exit.reason,
                pnl = %exit.realized_pnl,
                "Closed position"
            );
        }
        Ok(updated)
    }

    async fn append_snapshot(&self, position: PositionId, snapshot: &NewSnapshot) -> Result<Snapshot> {
        let mut conn = checkout(&self.pool)?;
        conn.transaction(|conn| -> Result<Snapshot> {
            if load_position(conn, position.value())?.is_none() {
                return Err(Error::ReferentialIntegrity {
                    entity: "snapshot",
                    reference: position.to_string(),
                });
            }
            insert_snapshot(conn, position, snapshot)
        })
    }

    async fn snapshots(&self, position: PositionId) -> Result<Vec<Snapshot>> {
        let mut conn = checkout(&self.pool)?;
        let rows: Vec<SnapshotRow> = position_snapshots::table
            .filter(position_snapshots::position_id.eq(position.value()))
            .select(SnapshotRow::as_select())
            .order((position_snapshots::timestamp.asc(), position_snapshots::id.asc()))
            .load(&mut conn)
            .map_err(|e| database_error("snapshot", e))?;
        rows.into_iter().map(Snapshot::try_from).collect()
    }

    async fn orders_for_leg(&self, session: &SessionId, leg_number: i32) -> Result<Vec<Order>> {
        let mut conn = checkout(&self.pool)?;
        let Some(key) = session_key(&mut conn, session).map_err(|e| database_error("order", e))?
        else {
            return Ok(Vec::new());
        };

        let rows: Vec<OrderRow> = orders::table
            .filter(orders::session_id.eq(key))
            .filter(orders::leg_number.eq(leg_number))
            .select(OrderRow::as_select())
            .order((orders::order_time.asc(), orders::id.asc()))
            .load(&mut conn)
            .map_err(|e| database_error("order", e))?;
        rows.into_iter().map(Order::try_from).collect()
    }
}
