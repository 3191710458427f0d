//! On demand "who owns this lot" lookups.
//! The panel renders one popup per lot and asks the ownership service only when the popup button is pressed.
//! Requests run on a background thread, their results are applied on the next `flush_all_messages`.

mod client;
mod panel;
mod record;

pub use client::{lookup_url, HttpOwnershipSource, OwnershipSource, DEFAULT_ORIGIN, OWNERSHIP_PATH};
pub use panel::{LotPopup, OwnershipLookupPanel, LOOKUP_BUTTON_LABEL};
pub use record::{LookupError, OwnershipRecord, UNKNOWN_CONTACT, UNKNOWN_OWNER};
