//! SQLite event store implementation.

use chrono::Utc;
use diesel::prelude::*;
use tracing::debug;

use super::database::connection::{checkout, database_error, DbPool};
use super::database::model::{last_insert_rowid, EventRow, NewEventRow};
use super::database::schema::events;
use super::session::{require_session, session_key};
use crate::domain::time::format_timestamp;
use crate::domain::{Event, EventFilter, NewEvent, SessionId};
use crate::error::Result;
use crate::port::outbound::store::EventStore;

/// Insert `event` for the session with surrogate key `session_key`.
pub(crate) fn insert_event(
    conn: &mut SqliteConnection,
    session_key: i32,
    event: &NewEvent,
) -> Result<Event> {
    let data = event.data.as_ref().map(serde_json::to_string).transpose()?;
    let row = NewEventRow {
        session_id: session_key,
        event_time: format_timestamp(&event.event_time),
        event_type: event.event_type.clone(),
        leg_number: event.leg_number,
        symbol: event.symbol.clone(),
        description: event.description.clone(),
        data,
        created_at: format_timestamp(&Utc::now()),
    };

    diesel::insert_into(events::table)
        .values(&row)
        .execute(conn)
        .map_err(|e| database_error("event", e))?;
    let id = last_insert_rowid(conn)?;
    let stored: EventRow = events::table
        .find(id)
        .select(EventRow::as_select())
        .first(conn)?;
    Event::try_from(stored)
}

/// SQLite-backed event store.
#[derive(Clone)]
pub struct SqliteEventStore {
    pool: DbPool,
}

impl SqliteEventStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EventStore for SqliteEventStore {
    async fn append(&self, session: &SessionId, event: &NewEvent) -> Result<Event> {
        let mut conn = checkout(&self.pool)?;
        let appended = conn.transaction(|conn| -> Result<Event> {
            let key = require_session(conn, session, "event")?;
            insert_event(conn, key, event)
        })?;

        debug!(
            session_id = %session,
            event_type = %appended.event_type,
            "Appended event"
        );
        Ok(appended)
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let mut conn = checkout(&self.pool)?;

        let mut query = events::table.select(EventRow::as_select()).into_boxed();
        if let Some(session) = &filter.session {
            let Some(key) =
                session_key(&mut conn, session).map_err(|e| database_error("event", e))?
            else {
                return Ok(Vec::new());
            };
            query = query.filter(events::session_id.eq(key));
        }
        if let Some(event_type) = &filter.event_type {
            query = query.filter(events::event_type.eq(event_type.clone()));
        }
        if let Some(from) = &filter.from {
            query = query.filter(events::event_time.ge(format_timestamp(from)));
        }
        if let Some(to) = &filter.to {
            query = query.filter(events::event_time.lt(format_timestamp(to)));
        }

        let rows: Vec<EventRow> = query
            .order((events::event_time.asc(), events::id.asc()))
            .load(&mut conn)
            .map_err(|e| database_error("event", e))?;
        rows.into_iter().map(Event::try_from).collect()
    }
}
