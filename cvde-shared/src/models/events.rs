#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderChangeKind {
    Created,
    Updated,
}

/// Published on every exam-order mutation; admin dashboards subscribe and
/// silently reload their order list when one arrives.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderChangedEvent {
    pub order_id: i64,
    pub change: OrderChangeKind,
    pub occurred_at: i64,
}
