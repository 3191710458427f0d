//! Imperative marker widgets.
//! A [`ReadinessWaiter`] holds the wiring until a map gets published into a [`MapSlot`],
//! then one of the color behaviors of [`wiring`] is attached to every marker present at that moment.

pub mod readiness;
pub mod wiring;

pub use readiness::{map_slot, MapPublisher, MapSlot, ReadinessError, ReadinessStatus, ReadinessWaiter};
pub use wiring::{attach_single_shot, attach_toggle, wire_markers, ColorBehavior, WiringReport};
