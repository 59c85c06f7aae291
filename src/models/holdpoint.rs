//! Hold point tracking and release token data models
//!
//! A HoldPoint is derived from a hold (or, for notification purposes,
//! witness) checklist item on a work instance. It is persisted
//! independently because its notify -> chase -> release lifecycle outlives
//! any single completion event, and it is created lazily the first time it
//! needs tracking.
//!
//! ReleaseTokens let an external party release a hold point without an
//! account: the token is the entire authorization boundary, so it is
//! high-entropy, time-boxed and strictly single-use. Only the SHA-256
//! digest of the secret is persisted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hold point lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldPointStatus {
    /// Tracked but nobody has been told yet
    Pending,
    /// Internal notification sent
    Notified,
    /// Inspection queued with a pre-set date
    Scheduled,
    /// Release asked for on demand
    Requested,
    /// Terminal for the normal flow
    Released,
}

impl HoldPointStatus {
    pub fn name(&self) -> &'static str {
        match self {
            HoldPointStatus::Pending => "pending",
            HoldPointStatus::Notified => "notified",
            HoldPointStatus::Scheduled => "scheduled",
            HoldPointStatus::Requested => "requested",
            HoldPointStatus::Released => "released",
        }
    }

    /// Statuses for which chase staleness is computed
    pub fn is_awaiting_release(&self) -> bool {
        matches!(self, HoldPointStatus::Scheduled | HoldPointStatus::Requested)
    }
}

/// Alert severity for a stale hold point, derived from how long the
/// scheduled (or requested) time has been in the past
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn name(&self) -> &'static str {
        match self {
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            AlertSeverity::Medium => "🟡",
            AlertSeverity::High => "🟠",
            AlertSeverity::Critical => "🔴",
        }
    }

    /// Severity for a point whose scheduled time passed `overdue` ago.
    /// Compares the full duration, so 48h01m already grades critical.
    pub fn from_overdue(overdue: Duration) -> Self {
        if overdue > Duration::hours(48) {
            AlertSeverity::Critical
        } else if overdue >= Duration::hours(24) {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        }
    }
}

/// Attribution captured from the releasing party's form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseForm {
    pub releaser_name: String,
    #[serde(default)]
    pub releaser_org: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// How a hold point was released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseChannel {
    /// Released by a logged-in user
    Internal,
    /// Released through the public token channel
    Token,
}

/// Tracking record for one hold/witness checklist item on one lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldPoint {
    /// Unique identifier (UUID v4)
    pub id: String,

    pub lot_id: String,

    /// Snapshot item id this point represents
    pub item_id: String,

    /// Item description, denormalized for messages and public summaries
    pub item_description: String,

    pub status: HoldPointStatus,

    /// Pre-set inspection date, when scheduled
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,

    #[serde(default)]
    pub notified_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,

    /// Who asked for the release (for confirmation messages)
    #[serde(default)]
    pub requested_by: Option<String>,

    /// Manual follow-up counter
    #[serde(default)]
    pub chase_count: u32,

    #[serde(default)]
    pub last_chased_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub released_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub release: Option<ReleaseForm>,

    #[serde(default)]
    pub release_channel: Option<ReleaseChannel>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HoldPoint {
    pub fn new(
        lot_id: impl Into<String>,
        item_id: impl Into<String>,
        item_description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            lot_id: lot_id.into(),
            item_id: item_id.into(),
            item_description: item_description.into(),
            status: HoldPointStatus::Pending,
            scheduled_for: None,
            notified_at: None,
            requested_at: None,
            requested_by: None,
            chase_count: 0,
            last_chased_at: None,
            released_at: None,
            release: None,
            release_channel: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a manual follow-up. `updated_at` is stamped by the store
    /// at write time.
    pub fn chase(&mut self) {
        self.chase_count += 1;
        self.last_chased_at = Some(Utc::now());
    }

    /// Transition to released with attribution
    pub fn release(&mut self, form: ReleaseForm, channel: ReleaseChannel) {
        self.status = HoldPointStatus::Released;
        self.released_at = Some(Utc::now());
        self.release = Some(form);
        self.release_channel = Some(channel);
    }

    /// The timestamp staleness is measured from: a pre-set schedule wins,
    /// otherwise the on-demand request time
    pub fn staleness_basis(&self) -> Option<DateTime<Utc>> {
        self.scheduled_for.or(self.requested_at)
    }

    /// Alert severity if this point is awaiting release and its scheduled
    /// (or requested) time has already passed
    pub fn alert_severity(&self, now: DateTime<Utc>) -> Option<AlertSeverity> {
        if !self.status.is_awaiting_release() {
            return None;
        }
        let basis = self.staleness_basis()?;
        let overdue = now - basis;
        if overdue <= Duration::zero() {
            return None;
        }
        Some(AlertSeverity::from_overdue(overdue))
    }
}

/// Persisted release token. The record carries no plaintext secret; it is
/// stored under the digest of the secret and looked up by digesting the
/// presented value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseTokenRecord {
    /// SHA-256 hex digest of the secret
    pub digest: String,

    pub hold_point_id: String,

    /// External recipient this token was issued to
    pub recipient: String,

    /// Who requested the release (gets the confirmation notification)
    pub requested_by: String,

    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    /// Set on first successful release; the token is permanently inert
    /// afterwards
    #[serde(default)]
    pub used_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub used_by: Option<ReleaseForm>,
}

impl ReleaseTokenRecord {
    /// Issue a fresh token. Returns the record and the plaintext secret;
    /// the secret exists only in this return value and the release link
    /// built from it.
    pub fn issue(
        hold_point_id: impl Into<String>,
        recipient: impl Into<String>,
        requested_by: impl Into<String>,
        ttl_hours: i64,
    ) -> (Self, String) {
        let secret = generate_secret();
        let now = Utc::now();
        let record = Self {
            digest: digest_secret(&secret),
            hold_point_id: hold_point_id.into(),
            recipient: recipient.into(),
            requested_by: requested_by.into(),
            issued_at: now,
            expires_at: now + Duration::hours(ttl_hours),
            used_at: None,
            used_by: None,
        };
        (record, secret)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Generate an unguessable 64-hex-char secret from two v4 UUIDs and a
/// timestamp run through SHA-256
pub fn generate_secret() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hex digest a presented secret for storage lookup
pub fn digest_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}
