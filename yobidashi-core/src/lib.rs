//! Shared core for the Yobidashi calling queue
//!
//! The control tool and the display board are independent processes that
//! coordinate exclusively through one persisted queue file. This crate owns
//! that file's format and access protocol:
//!
//! - [`store::QueueStore`]: load/save of the persisted snapshot with
//!   defensive recovery and optimistic concurrency
//! - [`registry::OrderRegistry`]: the mutation operations (register,
//!   advance, remove) and their identity invariants
//! - [`feed::ChangeFeed`]: read-side polling, change detection and the
//!   derived display views
//! - [`audit::AuditLog`]: the append-only per-day event trail both sides
//!   write

pub mod audit;
pub mod config;
pub mod error;
pub mod feed;
pub mod model;
pub mod registry;
pub mod store;

pub use error::{QueueError, QueueResult};
pub use model::{BoardView, Order, OrderStatus, QueueSnapshot};
