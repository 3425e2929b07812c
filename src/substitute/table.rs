//! Event table selection for the date clause
//!
//! `created_at` exists on both the event and the session view, so the date
//! clause has to be qualified. Callers can name the table explicitly; without
//! that the table is guessed from what the query already references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const EVENT_TABLE: &str = "umami_views.event";
const SESSION_TABLE: &str = "umami_views.session";

/// Warehouse view a date clause filters on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventTable {
    #[default]
    Event,
    Session,
}

impl EventTable {
    /// Dataset-qualified view name
    pub fn table_name(&self) -> &'static str {
        match self {
            EventTable::Event => EVENT_TABLE,
            EventTable::Session => SESSION_TABLE,
        }
    }

    /// Backticked view name, prefixed with the warehouse project when known
    pub fn qualified(&self, project: Option<&str>) -> String {
        match project.map(str::trim).filter(|p| !p.is_empty()) {
            Some(project) => format!("`{}.{}`", project, self.table_name()),
            None => format!("`{}`", self.table_name()),
        }
    }
}

impl fmt::Display for EventTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTable::Event => f.write_str("event"),
            EventTable::Session => f.write_str("session"),
        }
    }
}

impl FromStr for EventTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" => Ok(EventTable::Event),
            "session" => Ok(EventTable::Session),
            other => Err(format!("unknown table '{}', expected event or session", other)),
        }
    }
}

/// Guess the table from the query text
///
/// Plain substring search: the session view wins only when the event view is
/// not mentioned anywhere. A comment naming a view counts as a reference.
pub fn infer_event_table(sql: &str) -> EventTable {
    let references_event = sql.contains(EVENT_TABLE);
    let references_session = sql.contains(SESSION_TABLE);

    if references_session && !references_event {
        EventTable::Session
    } else {
        EventTable::Event
    }
}
