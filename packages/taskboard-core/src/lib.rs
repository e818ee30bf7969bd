//! Board projection, drag reordering and filtered views for a
//! collaborative task board.
//!
//! Data flow: store snapshots → [`board::build_board`] → drag gestures via
//! [`reorder::drag`] (optimistic model + [`writeback::WriteBackPlan`]) →
//! [`swimlane::visible_board`] on every render.

pub mod board;
pub mod config;
pub mod events;
pub mod filter;
pub mod patch;
pub mod progress;
pub mod reorder;
pub mod session;
pub mod snapshot;
pub mod stage;
pub mod storage;
pub mod swimlane;
pub mod types;
pub mod writeback;
