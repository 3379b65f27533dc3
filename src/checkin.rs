//! Check-in admission and submission.
//!
//! The duplicate guard is a pure read-and-decide step: it looks at the
//! user's recent check-ins and the current local time and decides whether
//! a new submission is admissible under the configured policy. The actual
//! insert happens later, after the user confirms, so two devices racing
//! the same user can both pass the guard. That window is accepted; the
//! UNIQUE object key is the only persistence-level backstop.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use image::DynamicImage;
use thiserror::Error;
use tracing::warn;

use crate::config::{CheckinConfig, DedupPolicy};
use crate::db::{parse_timestamp, CheckinRecord, Database};
use crate::photo;
use crate::storage::{path::object_key, PhotoStore, StoreError};

/// How many prior check-ins the guard inspects. Both policies only need
/// the tail of the history: any blocking record is newer than any
/// non-blocking one.
const GUARD_HISTORY: usize = 8;

/// Outcome of the duplicate guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admissibility {
    Allowed,
    /// Blocked by the cooldown policy; admissible again at `retry_at`.
    CooldownActive {
        last: DateTime<Tz>,
        retry_at: DateTime<Tz>,
    },
    /// Blocked by the daily policy; already checked in this calendar day.
    AlreadyToday { last: DateTime<Tz> },
}

impl Admissibility {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admissibility::Allowed)
    }

    /// User-facing explanation for a blocked submission.
    pub fn describe(&self) -> String {
        match self {
            Admissibility::Allowed => "check-in allowed".to_string(),
            Admissibility::CooldownActive { retry_at, .. } => format!(
                "already checked in recently; try again at {}",
                retry_at.format("%H:%M")
            ),
            Admissibility::AlreadyToday { last } => format!(
                "already checked in today at {}",
                last.format("%H:%M")
            ),
        }
    }
}

/// Decide admissibility from the user's prior check-in instants.
///
/// `now_local` carries the configured timezone; stored instants are UTC
/// and are converted before any calendar comparison. Cooldown blocks while
/// the newest prior check-in is strictly younger than the window, so a
/// check-in exactly `cooldown` old is admissible again.
pub fn evaluate(
    policy: DedupPolicy,
    cooldown: Duration,
    now_local: DateTime<Tz>,
    prior: &[DateTime<Utc>],
) -> Admissibility {
    let tz = now_local.timezone();
    let now_utc = now_local.with_timezone(&Utc);

    match policy {
        DedupPolicy::Cooldown => {
            for &instant in prior {
                if now_utc.signed_duration_since(instant) < cooldown {
                    let last = instant.with_timezone(&tz);
                    return Admissibility::CooldownActive {
                        last,
                        retry_at: last + cooldown,
                    };
                }
            }
            Admissibility::Allowed
        }
        DedupPolicy::Daily => {
            let today = now_local.date_naive();
            for &instant in prior {
                let local = instant.with_timezone(&tz);
                if local.date_naive() == today {
                    return Admissibility::AlreadyToday { last: local };
                }
            }
            Admissibility::Allowed
        }
    }
}

/// Query prior check-ins for the user and run the guard. Read-only; the
/// caller inserts only after its own confirmation step.
pub fn check_admissible(
    db: &Database,
    config: &CheckinConfig,
    user_id: i64,
    now_local: DateTime<Tz>,
) -> anyhow::Result<Admissibility> {
    let mut prior = Vec::new();
    for record in db.latest_checkins_for_user(user_id, GUARD_HISTORY)? {
        match parse_timestamp(&record.created_at) {
            Some(instant) => prior.push(instant),
            None => warn!(
                checkin_id = record.id,
                created_at = %record.created_at,
                "unparseable check-in timestamp ignored by guard"
            ),
        }
    }
    Ok(evaluate(
        config.policy,
        Duration::minutes(config.cooldown_minutes as i64),
        now_local,
        &prior,
    ))
}

/// Failure kinds of a submission, surfaced to the status line.
#[derive(Debug, Error)]
pub enum CheckinError {
    #[error("{}", .0.describe())]
    NotAdmissible(Admissibility),

    #[error("could not query prior check-ins: {0}")]
    Guard(#[source] anyhow::Error),

    #[error("failed to prepare photo: {0}")]
    Photo(#[source] anyhow::Error),

    #[error("photo upload failed: {0}")]
    Upload(#[from] StoreError),

    /// Upload succeeded, insert failed: the object at `key` is orphaned
    /// until the maintenance sweep reclaims it. Nothing references it, so
    /// this is not data corruption.
    #[error("record insert failed ({source}); photo left at {key}")]
    Record {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Full submission: guard, encode, upload, insert — in that order.
pub fn submit_checkin(
    db: &Database,
    store: &PhotoStore,
    config: &CheckinConfig,
    user_id: i64,
    image: &DynamicImage,
    now_local: DateTime<Tz>,
) -> Result<CheckinRecord, CheckinError> {
    let decision =
        check_admissible(db, config, user_id, now_local).map_err(CheckinError::Guard)?;
    if !decision.is_allowed() {
        return Err(CheckinError::NotAdmissible(decision));
    }

    let bytes = photo::encode_jpeg(image).map_err(CheckinError::Photo)?;
    let key = object_key(user_id, &now_local);
    store.upload(&key, &bytes)?;

    match db.insert_checkin(user_id, &key) {
        Ok(record) => Ok(record),
        Err(source) => {
            warn!(%key, "check-in insert failed after upload; object orphaned");
            Err(CheckinError::Record { key, source })
        }
    }
}
