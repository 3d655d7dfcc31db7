//! SQLite order store implementation.
//!
//! Orders reference their session only. The link to a position is the
//! `(session, leg_number)` pair, queried on demand.

use chrono::Utc;
use diesel::prelude::*;
use tracing::{info, warn};

use super::database::connection::{checkout, database_error, DbPool};
use super::database::model::{decimal_to_f64, last_insert_rowid, NewOrderRow, OrderRow};
use super::database::schema::orders;
use super::session::{require_session, session_key};
use crate::domain::time::format_timestamp;
use crate::domain::{NewOrder, Order, OrderExecution, OrderFilter, OrderId, OrderStatus, SessionId};
use crate::error::Result;
use crate::port::outbound::store::OrderStore;

fn load_order(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<OrderRow>> {
    orders::table
        .find(id)
        .select(OrderRow::as_select())
        .first(conn)
        .optional()
}

/// SQLite-backed order store.
#[derive(Clone)]
pub struct SqliteOrderStore {
    pool: DbPool,
}

impl SqliteOrderStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for SqliteOrderStore {
    async fn place(&self, session: &SessionId, order: &NewOrder) -> Result<Order> {
        let mut conn = checkout(&self.pool)?;

        let placed = conn.transaction(|conn| -> Result<Order> {
            let key = require_session(conn, session, "order")?;
            let row = NewOrderRow {
                session_id: key,
                leg_number: order.leg_number,
                order_type: order.order_type.as_str().to_string(),
                symbol: order.symbol.clone(),
                exchange: order.exchange.clone(),
                side: order.side.as_str().to_string(),
                quantity: order.quantity,
                price: order.price.map(decimal_to_f64),
                order_time: format_timestamp(&order.order_time),
                status: OrderStatus::Pending.as_str().to_string(),
                created_at: format_timestamp(&Utc::now()),
            };
            diesel::insert_into(orders::table)
                .values(&row)
                .execute(conn)
                .map_err(|e| database_error("order", e))?;

            let id = last_insert_rowid(conn)?;
            let stored: OrderRow = orders::table
                .find(id)
                .select(OrderRow::as_select())
                .first(conn)?;
            Order::try_from(stored)
        })?;

        info!(
            session_id = %session,
            order_id = placed.id.value(),
            symbol = %placed.symbol,
            side = %placed.side,
            quantity = placed.quantity,
            "Placed order"
        );
        Ok(placed)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let mut conn = checkout(&self.pool)?;
        load_order(&mut conn, id.value())
            .map_err(|e| database_error("order", e))?
            .map(Order::try_from)
            .transpose()
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let mut conn = checkout(&self.pool)?;

        let mut query = orders::table.select(OrderRow::as_select()).into_boxed();
        if let Some(session) = &filter.session {
            let Some(key) =
                session_key(&mut conn, session).map_err(|e| database_error("order", e))?
            else {
                return Ok(Vec::new());
            };
            query = query.filter(orders::session_id.eq(key));
        }
        if let Some(status) = filter.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(symbol) = &filter.symbol {
            query = query.filter(orders::symbol.eq(symbol.clone()));
        }
        if let Some(from) = &filter.from {
            query = query.filter(orders::order_time.ge(format_timestamp(from)));
        }
        if let Some(to) = &filter.to {
            query = query.filter(orders::order_time.lt(format_timestamp(to)));
        }

        let rows: Vec<OrderRow> = query
            .order((orders::order_time.asc(), orders::id.asc()))
            .load(&mut conn)
            .map_err(|e| database_error("order", e))?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn record_execution(&self, id: OrderId, execution: &OrderExecution) -> Result<bool> {
        let mut conn = checkout(&self.pool)?;
        let now = format_timestamp(&Utc::now());

        let updated = diesel::update(orders::table.find(id.value()))
            .set((
                orders::order_id.eq(execution.broker_order_id.clone()),
                orders::status.eq(execution.status.as_str()),
                orders::execution_price.eq(execution.price.map(decimal_to_f64)),
                orders::executed_quantity.eq(execution.quantity),
                orders::execution_time.eq(Some(format_timestamp(&execution.time))),
                orders::updated_at.eq(Some(now)),
            ))
            .execute(&mut conn)
            .map_err(|e| database_error("order", e))?;

        if updated > 0 {
            info!(
                order_id = id.value(),
                status = %execution.status,
                price = ?execution.price,
                "Recorded order execution"
            );
        }
        Ok(updated > 0)
    }

    async fn record_rejection(&self, id: OrderId, message: &str) -> Result<bool> {
        let mut conn = checkout(&self.pool)?;
        let now = format_timestamp(&Utc::now());

        let updated = diesel::update(orders::table.find(id.value()))
            .set((
                orders::status.eq(OrderStatus::Rejected.as_str()),
                orders::error_message.eq(Some(message)),
                orders::updated_at.eq(Some(now)),
            ))
            .execute(&mut conn)
            .map_err(|e| database_error("order", e))?;

        if updated > 0 {
            warn!(order_id = id.value(), error = message, "Order rejected");
        }
        Ok(updated > 0)
    }
}
