//! Read-side polling: change detection, view projection, panel diffs.
//!
//! The display process owns a [`ChangeFeed`] and calls [`ChangeFeed::poll`]
//! on its own fixed interval. The feed compares the queue file's
//! modification time against the last observed value (the watermark) and
//! only reloads on change, so an idle queue costs one `stat` per tick.
//!
//! The watermark advances only after a successful strict reload. A poll
//! that lands while the writer is mid-rename, or on a corrupt file, reports
//! a degraded tick and leaves the watermark alone so the next tick retries.
//! There is no guarantee of observing every intermediate state the writer
//! produced - only the most recent complete write once the modification
//! time stabilizes - which is fine because each reload recomputes both
//! views from scratch.

use crate::error::QueueError;
use crate::model::{BoardView, Order};
use crate::store::QueueStore;
use std::collections::HashMap;
use std::time::SystemTime;

/// The two display panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Waiting,
    Calling,
}

impl Panel {
    /// Panel name as it appears in audit lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Waiting => "お待ちエリア",
            Self::Calling => "呼出エリア",
        }
    }
}

/// Direction of a panel membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelChange {
    Entered,
    Left,
}

/// One differential view-change event, for audit purposes only; view
/// correctness never depends on these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEvent {
    pub panel: Panel,
    pub change: PanelChange,
    pub id: String,
    /// Status at entry, or last observed status at departure.
    pub status: String,
}

/// Outcome of one poll tick.
#[derive(Debug)]
pub enum FeedTick {
    /// Modification time unchanged; nothing reloaded.
    Unchanged,
    /// Fresh snapshot loaded and projected.
    Changed {
        view: BoardView,
        events: Vec<ViewEvent>,
    },
    /// Queue unavailable this tick (missing or unreadable file). The caller
    /// should render a degraded placeholder and keep polling.
    Unavailable { error: QueueError },
}

/// Polling reader over a [`QueueStore`].
#[derive(Debug)]
pub struct ChangeFeed {
    store: QueueStore,
    watermark: Option<SystemTime>,
    waiting_seen: HashMap<String, String>,
    calling_seen: HashMap<String, String>,
}

impl ChangeFeed {
    pub fn new(store: QueueStore) -> Self {
        Self {
            store,
            watermark: None,
            waiting_seen: HashMap::new(),
            calling_seen: HashMap::new(),
        }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    /// One poll tick.
    pub fn poll(&mut self) -> FeedTick {
        let mtime = match self.store.last_modified() {
            Ok(mtime) => mtime,
            Err(error) => {
                // File gone (or unstattable): clear the watermark so a
                // reappearing file reloads even if its mtime matches the
                // last one we saw.
                self.watermark = None;
                return FeedTick::Unavailable { error };
            }
        };

        if self.watermark == Some(mtime) {
            return FeedTick::Unchanged;
        }

        let snapshot = match self.store.load_strict() {
            Ok(snapshot) => snapshot,
            // Watermark not advanced: the next tick retries the reload.
            Err(error) => return FeedTick::Unavailable { error },
        };

        let view = BoardView::project(&snapshot);
        let mut events = Vec::new();
        self.waiting_seen =
            diff_panel(Panel::Waiting, &self.waiting_seen, &view.waiting, &mut events);
        self.calling_seen =
            diff_panel(Panel::Calling, &self.calling_seen, &view.calling, &mut events);
        self.watermark = Some(mtime);

        FeedTick::Changed { view, events }
    }
}

/// Diff one panel's membership against the previous tick and return the new
/// id → status map. Entered ids are reported before left ids, each sorted
/// by id for stable audit output. Orders without an id are not tracked.
fn diff_panel(
    panel: Panel,
    previous: &HashMap<String, String>,
    orders: &[Order],
    events: &mut Vec<ViewEvent>,
) -> HashMap<String, String> {
    let current: HashMap<String, String> = orders
        .iter()
        .filter(|order| !order.id.is_empty())
        .map(|order| (order.id.clone(), order.status.as_str().to_owned()))
        .collect();

    let mut entered: Vec<&String> = current
        .keys()
        .filter(|id| !previous.contains_key(*id))
        .collect();
    entered.sort();
    for id in entered {
        events.push(ViewEvent {
            panel,
            change: PanelChange::Entered,
            id: id.clone(),
            status: current[id].clone(),
        });
    }

    let mut left: Vec<&String> = previous
        .keys()
        .filter(|id| !current.contains_key(*id))
        .collect();
    left.sort();
    for id in left {
        events.push(ViewEvent {
            panel,
            change: PanelChange::Left,
            id: id.clone(),
            status: previous[id].clone(),
        });
    }

    current
}
