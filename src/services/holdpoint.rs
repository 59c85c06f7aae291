//! Hold and witness point protocol
//!
//! Witness points get advance notice: after each completion the look-ahead
//! scans the next items in sequence and notifies the configured recipients
//! once per upcoming witness item. Hold points stop work until an
//! authorized party releases them, either internally or through a
//! single-use tokenized link that needs no account. The scan surfaces
//! points whose scheduled or requested time has gone stale, graded by how
//! long they have been overdue.
//!
//! Tracking records are created lazily: a hold point file appears the
//! first time a point needs notifying, scheduling or releasing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    digest_secret, AlertSeverity, ChecklistItem, HoldPoint, HoldPointStatus, Lot, LotStatus,
    Notification, NotificationType, PointType, ProjectConfig, ReleaseChannel, ReleaseForm,
    ReleaseTokenRecord,
};
use crate::state::{ProjectStore, TokenState};

use super::{
    advisory, resolve_items, NotificationSink, UserDirectory, WorkflowError, WorkflowResult,
};

// =============================================================================
// Witness look-ahead
// =============================================================================

/// After a completion, warn recipients about witness points coming up in
/// the next `window` incomplete items. Each witness item triggers at most
/// one live notification per recipient; the unconsumed-reference check on
/// the notification store is the dedup.
pub fn witness_look_ahead(
    store: &ProjectStore,
    sink: &dyn NotificationSink,
    config: &ProjectConfig,
    lot: &Lot,
    completed_item_id: &str,
) -> WorkflowResult<()> {
    let Some(instance) = &lot.instance else {
        return Ok(());
    };
    let items = resolve_items(instance, store)?;
    let Some(completed) = items.iter().find(|i| i.id == completed_item_id) else {
        return Ok(());
    };

    let upcoming: Vec<&ChecklistItem> = items
        .iter()
        .filter(|i| i.sequence > completed.sequence && !instance.item_is_complete(&i.id))
        .take(config.witness_look_ahead.window() as usize)
        .collect();

    for item in upcoming {
        if item.point_type != PointType::Witness {
            continue;
        }
        if store.has_unconsumed_reference(&item.id)? {
            continue;
        }

        let mut point = ensure_tracking(store, lot, item)?;
        if point.status == HoldPointStatus::Pending {
            point.status = HoldPointStatus::Notified;
            point.notified_at = Some(Utc::now());
            store.save_hold_point(&mut point)?;
        }

        for recipient in &config.witness_recipients {
            let notification = Notification::new(
                recipient,
                NotificationType::WitnessUpcoming,
                format!("Witness point coming up on {}", lot.number),
                format!(
                    "\"{}\" is next on {}. Arrange attendance before work reaches it.",
                    item.description, lot.number
                ),
            )
            .with_reference(&item.id);
            advisory("witness notification dispatch", sink.notify(&notification));
        }
    }
    Ok(())
}

/// Load or lazily create the tracking record for an item on a lot
fn ensure_tracking(
    store: &ProjectStore,
    lot: &Lot,
    item: &ChecklistItem,
) -> WorkflowResult<HoldPoint> {
    if let Some(existing) = store.find_hold_point(&lot.id, &item.id)? {
        return Ok(existing);
    }
    let mut point = HoldPoint::new(&lot.id, &item.id, &item.description);
    store.save_hold_point(&mut point)?;
    Ok(point)
}

fn resolve_point(
    store: &ProjectStore,
    lot_key: &str,
    item_id: &str,
) -> WorkflowResult<(Lot, ChecklistItem, HoldPoint)> {
    let lot = store.find_lot(lot_key)?;
    let instance = lot
        .instance
        .as_ref()
        .ok_or_else(|| WorkflowError::NoInstance(lot.number.clone()))?;
    let items = resolve_items(instance, store)?;
    let item = items
        .into_iter()
        .find(|i| i.id == item_id)
        .ok_or_else(|| WorkflowError::ItemNotInChecklist(item_id.to_string()))?;
    let point = ensure_tracking(store, &lot, &item)?;
    Ok((lot, item, point))
}

// =============================================================================
// Scheduling and chasing
// =============================================================================

/// Queue an inspection for a pre-set time. Returns the tracking record
/// and the working-hours adjustment applied to the reminder send time, so
/// the operator can confirm when the notice actually goes out.
pub fn schedule_inspection(
    store: &ProjectStore,
    sink: &dyn NotificationSink,
    config: &ProjectConfig,
    lot_key: &str,
    item_id: &str,
    inspection_at: DateTime<Utc>,
) -> WorkflowResult<(HoldPoint, super::ScheduleAdjustment)> {
    let (lot, item, mut point) = resolve_point(store, lot_key, item_id)?;
    if point.status == HoldPointStatus::Released {
        return Err(WorkflowError::AlreadyReleased);
    }

    point.status = HoldPointStatus::Scheduled;
    point.scheduled_for = Some(inspection_at);
    store.save_hold_point(&mut point)?;

    let adjustment = super::adjust_to_working_hours(Utc::now(), &config.working_hours);
    for recipient in &config.witness_recipients {
        let notification = Notification::new(
            recipient,
            NotificationType::WitnessUpcoming,
            format!("Inspection scheduled on {}", lot.number),
            format!(
                "\"{}\" on {} is scheduled for {}.",
                item.description,
                lot.number,
                inspection_at.format("%Y-%m-%d %H:%M UTC")
            ),
        )
        .with_reference(&point.id);
        advisory("schedule notification dispatch", sink.notify(&notification));
    }

    Ok((point, adjustment))
}

/// Record a manual follow-up against a point still awaiting release
pub fn chase(store: &ProjectStore, lot_key: &str, item_id: &str) -> WorkflowResult<HoldPoint> {
    let (_lot, _item, mut point) = resolve_point(store, lot_key, item_id)?;
    if point.status == HoldPointStatus::Released {
        return Err(WorkflowError::AlreadyReleased);
    }
    point.chase();
    store.save_hold_point(&mut point)?;
    Ok(point)
}

// =============================================================================
// Release request and token issue
// =============================================================================

/// A release link issued to one external recipient. The `link` embeds the
/// plaintext secret; it exists only in this return value.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedRelease {
    pub recipient: String,
    pub link: String,
    pub expires_at: DateTime<Utc>,
}

/// Ask for a hold point to be released: marks the point requested and
/// issues a single-use tokenized link per external recipient.
pub fn request_release(
    store: &ProjectStore,
    sink: &dyn NotificationSink,
    config: &ProjectConfig,
    lot_key: &str,
    item_id: &str,
    requested_by: &str,
    recipients: &[String],
) -> WorkflowResult<Vec<IssuedRelease>> {
    let (lot, item, mut point) = resolve_point(store, lot_key, item_id)?;
    if point.status == HoldPointStatus::Released {
        return Err(WorkflowError::AlreadyReleased);
    }

    point.status = HoldPointStatus::Requested;
    point.requested_at = Some(Utc::now());
    point.requested_by = Some(requested_by.to_string());
    store.save_hold_point(&mut point)?;

    let base = config.public_base_url.trim_end_matches('/');
    let mut issued = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let (record, secret) =
            ReleaseTokenRecord::issue(&point.id, recipient, requested_by, config.token_ttl_hours);
        store.save_pending_token(&record)?;

        let link = format!("{}/release/{}", base, secret);
        let notification = Notification::new(
            recipient,
            NotificationType::HoldReleaseRequested,
            format!("Hold point release requested on {}", lot.number),
            format!(
                "Release requested for \"{}\" on {}. Use your link before {}.",
                item.description,
                lot.number,
                record.expires_at.format("%Y-%m-%d %H:%M UTC")
            ),
        )
        .with_link(&link)
        .with_reference(&point.id);
        advisory("release request dispatch", sink.notify(&notification));

        issued.push(IssuedRelease {
            recipient: recipient.clone(),
            link,
            expires_at: record.expires_at,
        });
    }
    Ok(issued)
}

// =============================================================================
// Token viewing and release
// =============================================================================

/// One completed checklist item shown as evidence on the release page
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceEntry {
    pub sequence: u32,
    pub description: String,
    pub status: String,
    pub completed_by: String,
    pub completed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// What a token holder sees before deciding to release
#[derive(Debug, Clone, Serialize)]
pub struct TokenView {
    pub lot_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_description: Option<String>,
    pub item_description: String,
    pub requested_by: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub evidence: Vec<EvidenceEntry>,
}

/// The release form an external party submits with their token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRequest {
    pub releaser_name: String,
    #[serde(default)]
    pub releaser_org: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl ReleaseRequest {
    fn into_form(self) -> ReleaseForm {
        ReleaseForm {
            releaser_name: self.releaser_name,
            releaser_org: self.releaser_org,
            notes: self.notes,
            signature: self.signature,
        }
    }
}

/// Validate a presented secret and return the record it maps to.
/// Read-only; the pending file is untouched.
fn validate_token(store: &ProjectStore, secret: &str) -> WorkflowResult<ReleaseTokenRecord> {
    let digest = digest_secret(secret);
    let (record, state) = store
        .token_status(&digest)?
        .ok_or(WorkflowError::TokenUnknown)?;
    if state == TokenState::Used {
        return Err(WorkflowError::TokenUsed);
    }
    if record.is_expired(Utc::now()) {
        return Err(WorkflowError::TokenExpired);
    }
    Ok(record)
}

/// Build the release page for a presented token. Does not consume it.
pub fn view_by_token(store: &ProjectStore, secret: &str) -> WorkflowResult<TokenView> {
    let record = validate_token(store, secret)?;
    let point = store.load_hold_point(&record.hold_point_id)?;
    if point.status == HoldPointStatus::Released {
        return Err(WorkflowError::AlreadyReleased);
    }

    let lot = store.load_lot(&point.lot_id)?;
    let mut evidence = Vec::new();
    if let Some(instance) = &lot.instance {
        for item in resolve_items(instance, store)? {
            let Some(completion) = instance.completion_for_item(&item.id) else {
                continue;
            };
            evidence.push(EvidenceEntry {
                sequence: item.sequence,
                description: item.description.clone(),
                status: completion.status.name().to_string(),
                completed_by: completion.actor_id.clone(),
                completed_at: completion.updated_at,
                notes: completion.notes.clone(),
            });
        }
        evidence.sort_by_key(|e| e.sequence);
    }

    Ok(TokenView {
        lot_number: lot.number,
        lot_description: lot.description,
        item_description: point.item_description,
        requested_by: point.requested_by,
        expires_at: record.expires_at,
        evidence,
    })
}

/// Release a hold point with a presented token. The pending-to-used rename
/// inside [`ProjectStore::consume_token`] is the single-use guarantee; a
/// concurrent replay loses the rename and reports the token as used.
pub fn release_by_token(
    store: &ProjectStore,
    sink: &dyn NotificationSink,
    secret: &str,
    request: ReleaseRequest,
) -> WorkflowResult<HoldPoint> {
    if request.releaser_name.trim().is_empty() {
        return Err(WorkflowError::NameRequired);
    }

    let record = validate_token(store, secret)?;
    let mut point = store.load_hold_point(&record.hold_point_id)?;
    if point.status == HoldPointStatus::Released {
        return Err(WorkflowError::AlreadyReleased);
    }

    let mut record = store.consume_token(&record.digest).map_err(|e| match e {
        // The pending file vanished between validate and consume: a
        // concurrent release won the rename
        crate::state::StoreError::NotFound(_) => WorkflowError::TokenUsed,
        other => WorkflowError::Store(other),
    })?;

    let form = request.into_form();
    record.used_at = Some(Utc::now());
    record.used_by = Some(form.clone());
    store.save_used_token(&record)?;

    point.release(form, ReleaseChannel::Token);
    store.save_hold_point(&mut point)?;

    // Both sides get a confirmation: the requester learns the hold is
    // cleared, the releaser gets a record of what they signed off
    notify_released(store, sink, &point, &record.requested_by);
    if record.recipient != record.requested_by {
        notify_released(store, sink, &point, &record.recipient);
    }
    Ok(point)
}

/// Release a hold point from inside the project, attributed to a known user
pub fn release_internal(
    store: &ProjectStore,
    sink: &dyn NotificationSink,
    directory: &dyn UserDirectory,
    lot_key: &str,
    item_id: &str,
    actor_id: &str,
    notes: Option<String>,
) -> WorkflowResult<HoldPoint> {
    let (_lot, _item, mut point) = resolve_point(store, lot_key, item_id)?;
    if point.status == HoldPointStatus::Released {
        return Err(WorkflowError::AlreadyReleased);
    }

    let requester = point.requested_by.clone();
    let form = ReleaseForm {
        releaser_name: directory.display_name(actor_id),
        releaser_org: None,
        notes,
        signature: None,
    };
    point.release(form, ReleaseChannel::Internal);
    store.save_hold_point(&mut point)?;

    if let Some(requester) = requester {
        notify_released(store, sink, &point, &requester);
    }
    Ok(point)
}

/// Confirm the release to one interested party
fn notify_released(
    store: &ProjectStore,
    sink: &dyn NotificationSink,
    point: &HoldPoint,
    requester: &str,
) {
    let lot_number = store
        .load_lot(&point.lot_id)
        .map(|l| l.number)
        .unwrap_or_else(|_| point.lot_id.clone());
    let releaser = point
        .release
        .as_ref()
        .map(|f| f.releaser_name.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let notification = Notification::new(
        requester,
        NotificationType::HoldReleased,
        format!("Hold point released on {}", lot_number),
        format!("\"{}\" was released by {}.", point.item_description, releaser),
    )
    .with_reference(&point.id);
    advisory("release confirmation dispatch", sink.notify(&notification));
}

// =============================================================================
// Stale point scan
// =============================================================================

/// A hold point whose scheduled or requested time is in the past
#[derive(Debug, Clone, Serialize)]
pub struct StaleHoldPoint {
    pub point: HoldPoint,
    pub lot_number: String,
    pub severity: AlertSeverity,
    pub overdue_hours: i64,
}

/// What the periodic scan found
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub stale: Vec<StaleHoldPoint>,
    /// Lots parked waiting on outstanding test items
    pub awaiting_test: Vec<Lot>,
}

/// Sweep every hold point and lot for work that is waiting on somebody.
/// Stale points come back most-severe first.
pub fn scan(store: &ProjectStore, now: DateTime<Utc>) -> WorkflowResult<ScanReport> {
    let mut stale = Vec::new();
    for point in store.list_hold_points()? {
        let Some(severity) = point.alert_severity(now) else {
            continue;
        };
        let overdue_hours = point
            .staleness_basis()
            .map(|basis| (now - basis).num_hours())
            .unwrap_or(0);
        let lot_number = store
            .load_lot(&point.lot_id)
            .map(|l| l.number)
            .unwrap_or_else(|_| point.lot_id.clone());
        stale.push(StaleHoldPoint {
            point,
            lot_number,
            severity,
            overdue_hours,
        });
    }
    stale.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(b.overdue_hours.cmp(&a.overdue_hours))
    });

    let awaiting_test = store
        .list_lots()?
        .into_iter()
        .filter(|l| l.status == LotStatus::AwaitingTest)
        .collect();

    Ok(ScanReport {
        stale,
        awaiting_test,
    })
}
