use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use cvde_order::ExamOrder;

/// Target window between contacting the driver and the sample arriving.
pub const COLLECTION_SLA_MINUTES: i64 = 60;

/// Derived collection state for one order at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionStatus {
    #[serde(rename = "none")]
    NoneRequested,
    #[serde(rename = "requested")]
    Requested,
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "overdue")]
    Overdue,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "complete-late")]
    CompleteLate,
}

/// What the admin board shows for an order's collection leg. `is_overdue`
/// is raised only by the live Overdue state; completed-late stays false so
/// the reminder action disappears once the sample actually arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionTracking {
    pub status: CollectionStatus,
    pub is_overdue: bool,
    pub message: String,
}

pub fn collection_deadline(requested_at: DateTime<Utc>) -> DateTime<Utc> {
    requested_at + Duration::minutes(COLLECTION_SLA_MINUTES)
}

/// Pure derivation from the order's collection fields and the current time.
/// Callers re-run this at least once a minute for displayed orders, since
/// Pending rolls over to Overdue purely by the clock.
pub fn track_collection(order: &ExamOrder, now: DateTime<Utc>) -> CollectionTracking {
    if !order.request_collection {
        return CollectionTracking {
            status: CollectionStatus::NoneRequested,
            is_overdue: false,
            message: "No collection requested for this order.".to_string(),
        };
    }

    let requested_at = match (order.driver_collection_requested, order.driver_requested_at) {
        (true, Some(at)) => at,
        _ => {
            return CollectionTracking {
                status: CollectionStatus::Requested,
                is_overdue: false,
                message: "Collection requested by vet. Driver still needs to be contacted."
                    .to_string(),
            }
        }
    };
    let deadline = collection_deadline(requested_at);

    if let Some(received_at) = order.sample_received_at {
        let delta = ceil_minutes((received_at - deadline).num_milliseconds().abs());

        if received_at <= deadline {
            let message = if delta == 0 {
                "Sample received at clinic within the 1-hour target.".to_string()
            } else {
                format!(
                    "Sample received at clinic with {} remaining.",
                    minutes_label(delta)
                )
            };
            return CollectionTracking {
                status: CollectionStatus::Complete,
                is_overdue: false,
                message,
            };
        }

        return CollectionTracking {
            status: CollectionStatus::CompleteLate,
            is_overdue: false,
            message: format!(
                "Sample received late, {} after the 1-hour target.",
                minutes_label(delta.max(1))
            ),
        };
    }

    let remaining_ms = (deadline - now).num_milliseconds();
    if remaining_ms >= 0 {
        let minutes = ceil_minutes(remaining_ms).max(1);
        CollectionTracking {
            status: CollectionStatus::Pending,
            is_overdue: false,
            message: format!(
                "Driver contacted. {} remaining to receive the sample.",
                minutes_label(minutes)
            ),
        }
    } else {
        let minutes = ceil_minutes(remaining_ms.abs()).max(1);
        CollectionTracking {
            status: CollectionStatus::Overdue,
            is_overdue: true,
            message: format!(
                "Collection overdue by {}. Contact the driver again.",
                minutes_label(minutes)
            ),
        }
    }
}

/// Whole minutes rounded up from a non-negative millisecond span.
fn ceil_minutes(ms: i64) -> i64 {
    (ms + 59_999) / 60_000
}

fn minutes_label(minutes: i64) -> String {
    if minutes == 1 {
        format!("{} minute", minutes)
    } else {
        format!("{} minutes", minutes)
    }
}
