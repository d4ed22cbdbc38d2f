//! Client-side view state.
//!
//! - `live_list` — the subscriber's copy of the quote list, kept in sync by
//!   applying broadcast messages.
pub mod live_list;
