//! Session state machine.
//!
//! A session moves through these stages:
//!
//! ```text
//! Created    -> PurposeSet   (setPurpose)
//! PurposeSet -> Collecting   (setPeople, setDay, addOption, any order)
//! Collecting -> Finished     (addOption with negative intent)
//! ```
//!
//! The stage is derived from the stored fields rather than stored itself.
//! Only the `Finished` edge is enforced: once a session is finished, option
//! appends fail with [`CoreError::SessionFinished`]. Every other stage call
//! is accepted at any time.

mod intent;

use std::fmt;

use tracing::{debug, info};
use uuid::Uuid;

use waypoint_db::models::Session;
use waypoint_db::queries::sessions::{GuardedUpdate, SessionFields};

use crate::error::{CoreError, CoreResult};
use crate::generation::{StructuredAdapter, TextAdapter, Variables};
use crate::schema::PlaceFeatures;
use crate::store::Store;

use intent::negative_intent_term;

/// Read-only stage view of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Created,
    PurposeSet,
    Collecting,
    Finished,
}

impl SessionStage {
    pub fn of(session: &Session) -> Self {
        if session.finished {
            Self::Finished
        } else if session.people.is_some() || session.day.is_some() || !session.options.is_empty() {
            Self::Collecting
        } else if !session.main_purpose.is_empty() {
            Self::PurposeSet
        } else {
            Self::Created
        }
    }
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::PurposeSet => "purpose_set",
            Self::Collecting => "collecting",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Result of an options turn.
#[derive(Debug, Clone)]
pub enum OptionOutcome {
    /// The option text was appended.
    Appended(Session),
    /// The text expressed negative intent; the session is now finished.
    Finished(Session),
}

impl OptionOutcome {
    pub fn session(&self) -> &Session {
        match self {
            Self::Appended(s) | Self::Finished(s) => s,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            Self::Appended(s) | Self::Finished(s) => s,
        }
    }
}

fn non_empty<'a>(text: &'a str, what: &str) -> CoreResult<&'a str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}

/// Session lifecycle operations.
pub struct SessionMachine;

impl SessionMachine {
    /// Extract traits for `destination` and persist a new session.
    ///
    /// Nothing is written if extraction fails.
    pub async fn create(
        store: &dyn Store,
        traits: &StructuredAdapter<PlaceFeatures>,
        destination: &str,
    ) -> CoreResult<Session> {
        let place = non_empty(destination, "destination")?;

        let features = traits
            .generate(Variables::new().text("place", place))
            .await?
            .normalize(place);
        let categories = serde_json::to_value(&features)
            .map_err(|e| CoreError::Store(anyhow::Error::new(e).context("failed to encode categories")))?;

        let session = store.insert_session(&categories).await?;
        info!(
            session_id = %session.id,
            place,
            traits = features.primary_traits.len(),
            "session created"
        );
        Ok(session)
    }

    pub async fn get(store: &dyn Store, id: Uuid) -> CoreResult<Session> {
        store
            .get_session(id)
            .await?
            .ok_or(CoreError::SessionNotFound(id))
    }

    pub async fn list(store: &dyn Store, limit: i64) -> CoreResult<Vec<Session>> {
        Ok(store.list_sessions(limit).await?)
    }

    /// Record the trip purpose and return the model's advisory reply.
    ///
    /// The reply is generated before the write, so a generation failure
    /// leaves the session unchanged. The reply itself is not stored.
    pub async fn set_purpose(
        store: &dyn Store,
        purpose: &TextAdapter,
        id: Uuid,
        text: &str,
    ) -> CoreResult<String> {
        let session = Self::get(store, id).await?;
        let text = non_empty(text, "purpose")?;

        let features = serde_json::to_string_pretty(&session.categories)
            .map_err(|e| CoreError::Store(anyhow::Error::new(e).context("failed to encode categories")))?;
        let reply = purpose
            .generate(
                Variables::new()
                    .text("place_features", features)
                    .text("user_purpose", text),
            )
            .await?;

        Self::update(
            store,
            id,
            SessionFields {
                main_purpose: Some(text.to_owned()),
                ..Default::default()
            },
        )
        .await?;
        info!(session_id = %id, "purpose set");
        Ok(reply)
    }

    pub async fn set_people(store: &dyn Store, id: Uuid, text: &str) -> CoreResult<Session> {
        let session = Self::update(
            store,
            id,
            SessionFields {
                people: Some(text.to_owned()),
                ..Default::default()
            },
        )
        .await?;
        info!(session_id = %id, "people set");
        Ok(session)
    }

    pub async fn set_day(store: &dyn Store, id: Uuid, text: &str) -> CoreResult<Session> {
        let session = Self::update(
            store,
            id,
            SessionFields {
                day: Some(text.to_owned()),
                ..Default::default()
            },
        )
        .await?;
        info!(session_id = %id, "day set");
        Ok(session)
    }

    /// Append an option, or finish the session if the text expresses
    /// negative intent.
    ///
    /// Checks run in order: session exists, session is open, text is
    /// non-empty. The append itself is guarded, so an append that races a
    /// finish still fails with [`CoreError::SessionFinished`].
    pub async fn add_option(store: &dyn Store, id: Uuid, text: &str) -> CoreResult<OptionOutcome> {
        let session = Self::get(store, id).await?;
        if session.finished {
            return Err(CoreError::SessionFinished(id));
        }
        non_empty(text, "option")?;

        if let Some(term) = negative_intent_term(text) {
            debug!(session_id = %id, term, "negative intent detected");
            let session = Self::guarded(id, store.finish_session(id).await?)?;
            info!(session_id = %id, options = session.options.len(), "session finished");
            return Ok(OptionOutcome::Finished(session));
        }

        let session = Self::guarded(id, store.append_option(id, text).await?)?;
        info!(session_id = %id, options = session.options.len(), "option added");
        Ok(OptionOutcome::Appended(session))
    }

    async fn update(store: &dyn Store, id: Uuid, fields: SessionFields) -> CoreResult<Session> {
        store
            .update_session_fields(id, &fields)
            .await?
            .ok_or(CoreError::SessionNotFound(id))
    }

    fn guarded(id: Uuid, outcome: GuardedUpdate) -> CoreResult<Session> {
        match outcome {
            GuardedUpdate::Applied(session) => Ok(session),
            GuardedUpdate::AlreadyFinished => Err(CoreError::SessionFinished(id)),
            GuardedUpdate::NotFound => Err(CoreError::SessionNotFound(id)),
        }
    }
}
