//! Order model and the derived display views.
//!
//! Timestamps are stored as local ISO-8601 strings with seconds precision
//! (the queue file is hand-inspectable and other tools append to it), and
//! parsed leniently when ordering the views: an unparseable or missing
//! timestamp sorts as the epoch, with the insertion index as tie-break.

use serde::{Deserialize, Serialize};

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of an order.
///
/// The wire literals are fixed Japanese strings; every tool that reads or
/// writes the queue file matches on them verbatim. A literal this version
/// does not recognize is preserved in [`OrderStatus::Other`] so the snapshot
/// round-trips unchanged and the views simply exclude the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// 受付済み - registered, not yet started
    Received,
    /// 仕掛中 - preparation in progress
    InProgress,
    /// 完了 - ready for hand-off
    Done,
    /// Unrecognized status literal, preserved verbatim.
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Received => "受付済み",
            Self::InProgress => "仕掛中",
            Self::Done => "完了",
            Self::Other(raw) => raw,
        }
    }

    /// Belongs to the waiting panel.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Received | Self::InProgress)
    }

    /// Belongs to the calling panel.
    pub fn is_calling(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "受付済み" => Self::Received,
            "仕掛中" => Self::InProgress,
            "完了" => Self::Done,
            _ => Self::Other(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Order
// ============================================================================

/// One unit of the calling workflow.
///
/// All fields default when absent so a snapshot written by an older or
/// hand-edited file still loads; an order without a recognizable status is
/// carried through saves but shown on neither panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Caller-visible identifier, unique within the queue.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: OrderStatus,
    /// Set once at registration.
    #[serde(default)]
    pub queued_at: String,
    /// Set when transitioning to 仕掛中.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Set when transitioning to 完了.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl Order {
    /// A freshly registered order.
    pub fn received(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: OrderStatus::Received,
            queued_at: now_iso(),
            updated_at: None,
            completed_at: None,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// The persisted aggregate: the ordered order sequence plus the id counter.
///
/// Insertion order is significant - it is the tie-break for display ordering
/// and for oldest-match lookups. `counter` never decreases; `generation`
/// increments on every save and is checked back against the file so a lost
/// update between two racing control invocations becomes a detectable
/// conflict instead of a silent overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(rename = "count", default)]
    pub counter: u64,
    #[serde(default)]
    pub generation: u64,
}

impl QueueSnapshot {
    pub fn find(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Order> {
        self.orders.iter_mut().find(|order| order.id == id)
    }

    /// Next auto-generated id: counter incremented first, zero-padded to at
    /// least three digits.
    pub fn next_auto_id(&mut self) -> String {
        self.counter += 1;
        format!("{:03}", self.counter)
    }

    /// Advance the counter past an explicitly supplied numeric id, so later
    /// auto-generated ids never collide with it. Non-numeric ids are ignored.
    pub fn absorb_numeric_id(&mut self, id: &str) {
        if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(value) = id.parse::<u64>() {
                if value > self.counter {
                    self.counter = value;
                }
            }
        }
    }
}

// ============================================================================
// Display views
// ============================================================================

/// The two derived, display-facing projections of the current queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView {
    /// 受付済み / 仕掛中, ordered by queued_at then insertion index.
    pub waiting: Vec<Order>,
    /// 完了, ordered by completed_at (falling back to updated_at) then
    /// insertion index.
    pub calling: Vec<Order>,
}

impl BoardView {
    /// Partition a snapshot into the waiting and calling panels.
    ///
    /// The split is total and disjoint over recognized statuses; orders with
    /// an unrecognized status appear on neither panel.
    pub fn project(snapshot: &QueueSnapshot) -> Self {
        let mut waiting: Vec<(i64, usize, &Order)> = Vec::new();
        let mut calling: Vec<(i64, usize, &Order)> = Vec::new();

        for (index, order) in snapshot.orders.iter().enumerate() {
            if order.status.is_waiting() {
                waiting.push((parse_iso_lenient(Some(&order.queued_at)), index, order));
            } else if order.status.is_calling() {
                let called_at = nonblank(order.completed_at.as_deref())
                    .or_else(|| nonblank(order.updated_at.as_deref()));
                calling.push((parse_iso_lenient(called_at), index, order));
            }
        }

        waiting.sort_by_key(|(ts, index, _)| (*ts, *index));
        calling.sort_by_key(|(ts, index, _)| (*ts, *index));

        Self {
            waiting: waiting.into_iter().map(|(_, _, o)| o.clone()).collect(),
            calling: calling.into_iter().map(|(_, _, o)| o.clone()).collect(),
        }
    }
}

/// Current local time as ISO-8601 with seconds precision.
pub fn now_iso() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn nonblank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Lenient ISO-8601 parse for view ordering: missing, blank or unparseable
/// values sort first (epoch).
fn parse_iso_lenient(value: Option<&str>) -> i64 {
    let Some(text) = nonblank(value) else {
        return 0;
    };
    let text = text.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return dt.timestamp();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.and_utc().timestamp();
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, status: OrderStatus, queued_at: &str) -> Order {
        Order {
            id: id.to_owned(),
            status,
            queued_at: queued_at.to_owned(),
            updated_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_status_wire_literals_round_trip() {
        for (status, literal) in [
            (OrderStatus::Received, "受付済み"),
            (OrderStatus::InProgress, "仕掛中"),
            (OrderStatus::Done, "完了"),
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{literal}\""));
            let back: OrderStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_unknown_status_preserved_verbatim() {
        let status: OrderStatus = serde_json::from_str("\"お取り置き\"").unwrap();
        assert_eq!(status, OrderStatus::Other("お取り置き".to_owned()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"お取り置き\"");
        assert!(!status.is_waiting());
        assert!(!status.is_calling());
    }

    #[test]
    fn test_auto_id_zero_padded_and_increasing() {
        let mut snapshot = QueueSnapshot::default();
        assert_eq!(snapshot.next_auto_id(), "001");
        assert_eq!(snapshot.next_auto_id(), "002");
        snapshot.counter = 999;
        assert_eq!(snapshot.next_auto_id(), "1000");
    }

    #[test]
    fn test_absorb_numeric_id_never_regresses() {
        let mut snapshot = QueueSnapshot::default();
        snapshot.absorb_numeric_id("050");
        assert_eq!(snapshot.counter, 50);
        snapshot.absorb_numeric_id("007");
        assert_eq!(snapshot.counter, 50);
        snapshot.absorb_numeric_id("A12");
        assert_eq!(snapshot.counter, 50);
        snapshot.absorb_numeric_id("");
        assert_eq!(snapshot.counter, 50);
    }

    #[test]
    fn test_projection_is_disjoint_and_excludes_unknown() {
        let snapshot = QueueSnapshot {
            orders: vec![
                order("001", OrderStatus::Received, "2025-06-01T10:00:00"),
                order("002", OrderStatus::Done, "2025-06-01T10:01:00"),
                order("003", OrderStatus::Other("保留".into()), "2025-06-01T10:02:00"),
                order("004", OrderStatus::InProgress, "2025-06-01T10:03:00"),
            ],
            counter: 4,
            generation: 0,
        };

        let view = BoardView::project(&snapshot);
        let waiting: Vec<&str> = view.waiting.iter().map(|o| o.id.as_str()).collect();
        let calling: Vec<&str> = view.calling.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(waiting, ["001", "004"]);
        assert_eq!(calling, ["002"]);
    }

    #[test]
    fn test_waiting_sorted_by_queued_at_then_insertion() {
        let snapshot = QueueSnapshot {
            orders: vec![
                order("late", OrderStatus::Received, "2025-06-01T12:00:00"),
                order("early", OrderStatus::Received, "2025-06-01T09:00:00"),
                order("same-a", OrderStatus::Received, "2025-06-01T12:00:00"),
            ],
            counter: 0,
            generation: 0,
        };

        let view = BoardView::project(&snapshot);
        let ids: Vec<&str> = view.waiting.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["early", "late", "same-a"]);
    }

    #[test]
    fn test_calling_falls_back_to_updated_at() {
        let mut first = order("A", OrderStatus::Done, "2025-06-01T09:00:00");
        first.updated_at = Some("2025-06-01T09:30:00".into());
        first.completed_at = None;
        let mut second = order("B", OrderStatus::Done, "2025-06-01T08:00:00");
        second.completed_at = Some("2025-06-01T10:00:00".into());

        let snapshot = QueueSnapshot {
            orders: vec![second, first],
            counter: 0,
            generation: 0,
        };
        let view = BoardView::project(&snapshot);
        let ids: Vec<&str> = view.calling.iter().map(|o| o.id.as_str()).collect();
        // A called at 09:30 (updated_at fallback) before B at 10:00.
        assert_eq!(ids, ["A", "B"]);
    }

    #[test]
    fn test_unparseable_timestamps_sort_first_without_panicking() {
        let snapshot = QueueSnapshot {
            orders: vec![
                order("ok", OrderStatus::Received, "2025-06-01T09:00:00"),
                order("bad", OrderStatus::Received, "not a timestamp"),
                order("blank", OrderStatus::Received, ""),
            ],
            counter: 0,
            generation: 0,
        };
        let view = BoardView::project(&snapshot);
        let ids: Vec<&str> = view.waiting.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["bad", "blank", "ok"]);
    }

    #[test]
    fn test_parse_iso_accepts_offset_and_zulu() {
        assert!(parse_iso_lenient(Some("2025-06-01T09:00:00Z")) > 0);
        assert!(parse_iso_lenient(Some("2025-06-01T09:00:00+09:00")) > 0);
        assert!(parse_iso_lenient(Some("2025-06-01T09:00:00.123")) > 0);
        assert_eq!(parse_iso_lenient(Some("   ")), 0);
        assert_eq!(parse_iso_lenient(None), 0);
    }

    #[test]
    fn test_order_serializes_without_absent_timestamps() {
        let order = Order::received("001");
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("updated_at").is_none());
        assert!(json.get("completed_at").is_none());
        assert_eq!(json["status"], "受付済み");
    }
}
