use std::collections::HashMap;

use parkmap_core::{task::BackgroundTaskGuard, LatLon};
use parkmap_marker_models::ParkingLot;
use tracing::{info, trace, warn};

use crate::client::OwnershipSource;
use crate::record::{LookupError, OwnershipRecord, UNKNOWN_CONTACT};

pub const LOOKUP_BUTTON_LABEL: &str = "Who Owns This?";

type LookupResult = (LatLon, Result<OwnershipRecord, LookupError>);

/// What one lot popup shows.
#[derive(Debug, Clone, PartialEq)]
pub struct LotPopup {
    pub key: String,
    pub name: String,
    pub button_label: &'static str,
    pub owner_line: Option<String>,
    pub contact_line: Option<String>,
}

impl std::fmt::Display for LotPopup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.button_label)?;
        if let Some(owner) = &self.owner_line {
            write!(f, "\n  {owner}")?;
        }
        if let Some(contact) = &self.contact_line {
            write!(f, "\n  {contact}")?;
        }
        Ok(())
    }
}

#[must_use]
pub struct OwnershipLookupPanel {
    lots: Vec<ParkingLot>,
    /// last known answer per `"{lat},{lon}"`
    ownership: HashMap<String, OwnershipRecord>,
    tasks: BackgroundTaskGuard<LatLon, LookupResult>,
}

impl OwnershipLookupPanel {
    pub fn new<S: OwnershipSource>(lots: Vec<ParkingLot>, source: S) -> Self {
        let tasks = BackgroundTaskGuard::new("ownership-lookup", move |position: LatLon| {
            (position, source.fetch(position))
        });
        Self {
            lots,
            ownership: Default::default(),
            tasks,
        }
    }

    pub fn lots(&self) -> &[ParkingLot] {
        &self.lots
    }

    /// Queues one request, the answer lands in the panel on a later [`Self::flush_all_messages`].
    /// Nothing is deduplicated, pressing twice sends twice.
    pub fn lookup_ownership(&self, lat: f64, lon: f64) {
        let position = LatLon::new(lat, lon);
        trace!(%position, "queueing ownership lookup");
        if self.tasks.send(position).is_err() {
            warn!(%position, error = %LookupError::WorkerGone, "ownership lookup dropped");
        }
    }

    /// Applies every answer received so far. Returns how many records were stored.
    pub fn flush_all_messages(&mut self) -> usize {
        let mut stored = 0;
        while let Some((position, result)) = self.tasks.try_recv() {
            match result {
                Ok(record) => {
                    info!(%position, owner = record.owner_or_unknown(), "ownership received");
                    self.ownership.insert(position.key(), record);
                    stored += 1;
                }
                Err(e) => {
                    // the popup keeps whatever it showed before
                    warn!(%position, ?e, "ownership lookup failed");
                }
            }
        }
        stored
    }

    /// Number of lookups not answered yet.
    pub fn pending(&self) -> i32 {
        self.tasks.count()
    }

    pub fn record(&self, position: LatLon) -> Option<&OwnershipRecord> {
        self.ownership.get(&position.key())
    }

    pub fn popup(&self, lot: &ParkingLot) -> LotPopup {
        let key = lot.position().key();
        let record = self.ownership.get(&key);
        LotPopup {
            name: lot.name.clone(),
            button_label: LOOKUP_BUTTON_LABEL,
            owner_line: record.map(|r| format!("Owner: {}", r.owner_or_unknown())),
            contact_line: record.and_then(|r| {
                r.contact.as_ref().map(|c| {
                    let contact = if c.is_empty() { UNKNOWN_CONTACT } else { c.as_str() };
                    format!("Contact: {contact}")
                })
            }),
            key,
        }
    }

    pub fn render(&self) -> Vec<LotPopup> {
        self.lots.iter().map(|lot| self.popup(lot)).collect()
    }

    /// Stops the lookup worker, answers still in flight are discarded.
    pub fn close(self) {
        self.tasks.shutdown();
    }
}
