//! Controller layer: state, UI events, reducer transitions, and command orchestration.

pub mod events;
pub mod notification;
pub mod orchestration;
pub mod reducer;
pub mod router;
pub mod state;
