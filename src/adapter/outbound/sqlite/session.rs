//! SQLite session store implementation.

use chrono::Utc;
use diesel::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::database::connection::{checkout, database_error, DbPool};
use super::database::model::{decimal_to_f64, last_insert_rowid, NewSessionRow, SessionRow};
use super::database::schema::sessions;
use crate::domain::time::{format_date, format_timestamp};
use crate::domain::{NewSession, Session, SessionCounters, SessionFilter, SessionId, SessionStatus};
use crate::error::{Error, Result};
use crate::port::outbound::store::SessionStore;

/// Surrogate key of the session with external id `id`, if it exists.
pub(crate) fn session_key(conn: &mut SqliteConnection, id: &SessionId) -> QueryResult<Option<i32>> {
    sessions::table
        .filter(sessions::session_id.eq(id.as_str()))
        .select(sessions::id)
        .first(conn)
        .optional()
}

/// Surrogate key of an owning session, failing when it does not exist.
///
/// `entity` names the child record being written.
pub(crate) fn require_session(
    conn: &mut SqliteConnection,
    id: &SessionId,
    entity: &'static str,
) -> Result<i32> {
    session_key(conn, id)
        .map_err(|e| database_error(entity, e))?
        .ok_or_else(|| Error::ReferentialIntegrity {
            entity,
            reference: format!("session {id}"),
        })
}

/// Notes with `note` appended on its own line.
pub(crate) fn append_note(notes: Option<&str>, note: &str) -> String {
    match notes {
        Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
        _ => note.to_string(),
    }
}

pub(crate) fn load_session(conn: &mut SqliteConnection, key: i32) -> Result<Session> {
    let row: SessionRow = sessions::table
        .find(key)
        .select(SessionRow::as_select())
        .first(conn)
        .map_err(|e| database_error("session", e))?;
    Session::try_from(row)
}

/// SQLite-backed session store.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: DbPool,
}

impl SqliteSessionStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(session: &NewSession) -> NewSessionRow {
        let now = format_timestamp(&Utc::now());
        NewSessionRow {
            session_id: session.session_id.as_str().to_string(),
            index_symbol: session.index_symbol.clone(),
            strike_diff: session.strike_diff,
            lot_size: session.lot_size,
            expiry_date: format_date(&session.expiry_date),
            status: SessionStatus::Running.as_str().to_string(),
            notes: session.notes.clone(),
            session_date: format_timestamp(&session.session_date),
            start_time: Some(now.clone()),
            created_at: now,
        }
    }
}

impl SessionStore for SqliteSessionStore {
    async fn create(&self, session: &NewSession) -> Result<Session> {
        if session.index_symbol.trim().is_empty() {
            return Err(crate::domain::error::DomainError::EmptyIndexSymbol.into());
        }
        let row = Self::to_row(session);
        let mut conn = checkout(&self.pool)?;

        let created = conn.transaction(|conn| -> Result<Session> {
            diesel::insert_into(sessions::table)
                .values(&row)
                .execute(conn)
                .map_err(|e| database_error("session", e))?;
            let key = last_insert_rowid(conn).map_err(|e| database_error("session", e))?;
            load_session(conn, key)
        })?;

        info!(
            session_id = %created.session_id,
            index = %created.index_symbol,
            "Created session"
        );
        Ok(created)
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        let mut conn = checkout(&self.pool)?;
        let row: Option<SessionRow> = sessions::table
            .filter(sessions::session_id.eq(id.as_str()))
            .select(SessionRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| database_error("session", e))?;
        row.map(Session::try_from).transpose()
    }

    async fn list(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        let mut conn = checkout(&self.pool)?;

        let mut query = sessions::table
            .select(SessionRow::as_select())
            .into_boxed();
        if let Some(index_symbol) = &filter.index_symbol {
            query = query.filter(sessions::index_symbol.eq(index_symbol.clone()));
        }
        if let Some(status) = filter.status {
            query = query.filter(sessions::status.eq(status.as_str()));
        }
        if let Some(expiry_date) = &filter.expiry_date {
            query = query.filter(sessions::expiry_date.eq(format_date(expiry_date)));
        }
        if let Some(from) = &filter.from {
            query = query.filter(sessions::session_date.ge(format_timestamp(from)));
        }
        if let Some(to) = &filter.to {
            query = query.filter(sessions::session_date.lt(format_timestamp(to)));
        }
        query = query.order((sessions::session_date.desc(), sessions::id.desc()));
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let rows: Vec<SessionRow> = query
            .load(&mut conn)
            .map_err(|e| database_error("session", e))?;
        rows.into_iter().map(Session::try_from).collect()
    }

    async fn update_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
        note: Option<&str>,
    ) -> Result<bool> {
        let mut conn = checkout(&self.pool)?;

        let updated = conn.transaction(|conn| {
            let current: Option<(i32, Option<String>)> = sessions::table
                .filter(sessions::session_id.eq(id.as_str()))
                .select((sessions::id, sessions::notes))
                .first(conn)
                .optional()?;
            let Some((key, notes)) = current else {
                return Ok(false);
            };

            let now = format_timestamp(&Utc::now());
            let notes = match note {
                Some(note) => Some(append_note(notes.as_deref(), note)),
                None => notes,
            };
            let end_time = status.is_terminal().then(|| now.clone());

            diesel::update(sessions::table.find(key))
                .set((
                    sessions::status.eq(status.as_str()),
                    sessions::notes.eq(notes),
                    sessions::updated_at.eq(Some(now)),
                ))
                .execute(conn)?;
            if let Some(end_time) = end_time {
                diesel::update(sessions::table.find(key))
                    .set(sessions::end_time.eq(Some(end_time)))
                    .execute(conn)?;
            }
            Ok::<bool, diesel::result::Error>(true)
        });

        let updated = updated.map_err(|e| database_error("session", e))?;
        if updated {
            info!(session_id = %id, status = %status, "Updated session status");
        }
        Ok(updated)
    }

    async fn increment_counters(&self, id: &SessionId, delta: &SessionCounters) -> Result<bool> {
        let mut conn = checkout(&self.pool)?;
        let now = format_timestamp(&Utc::now());

        let updated = diesel::update(sessions::table.filter(sessions::session_id.eq(id.as_str())))
            .set((
                sessions::total_orders_placed.eq(sessions::total_orders_placed + delta.orders_placed),
                sessions::total_orders_executed
                    .eq(sessions::total_orders_executed + delta.orders_executed),
                sessions::total_orders_rejected
                    .eq(sessions::total_orders_rejected + delta.orders_rejected),
                sessions::total_legs_opened.eq(sessions::total_legs_opened + delta.legs_opened),
                sessions::total_legs_closed.eq(sessions::total_legs_closed + delta.legs_closed),
                sessions::updated_at.eq(Some(now)),
            ))
            .execute(&mut conn)
            .map_err(|e| database_error("session", e))?;

        debug!(session_id = %id, ?delta, "Incremented session counters");
        Ok(updated > 0)
    }

    async fn set_net_pnl(&self, id: &SessionId, pnl: Decimal) -> Result<bool> {
        let mut conn = checkout(&self.pool)?;
        let now = format_timestamp(&Utc::now());

        let updated = diesel::update(sessions::table.filter(sessions::session_id.eq(id.as_str())))
            .set((
                sessions::net_pnl.eq(decimal_to_f64(pnl)),
                sessions::updated_at.eq(Some(now)),
            ))
            .execute(&mut conn)
            .map_err(|e| database_error("session", e))?;
        Ok(updated > 0)
    }
}
