use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use parkmap_marker_models::SharedMap;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, instrument, trace};

/// Cadence at which the map is looked for.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Error, Debug, Diagnostic)]
pub enum ReadinessError {
    #[error("map was not available after {attempts} attempts")]
    #[diagnostic(help("the map must be published into its slot before the widgets can be wired"))]
    Timeout { attempts: u64 },
    #[error("map was not published within {0:?}")]
    Deadline(Duration),
    #[error("map publisher dropped before publishing anything")]
    Closed,
}

/// Write side of a [`MapSlot`], owned by whoever builds the map.
pub struct MapPublisher {
    sender: watch::Sender<Option<SharedMap>>,
}

/// Read side: any number of widgets can hold a clone and wait for the map.
#[derive(Clone)]
pub struct MapSlot {
    receiver: watch::Receiver<Option<SharedMap>>,
}

pub fn map_slot() -> (MapPublisher, MapSlot) {
    let (sender, receiver) = watch::channel(None);
    (MapPublisher { sender }, MapSlot { receiver })
}

impl MapPublisher {
    pub fn publish(&self, map: SharedMap) {
        // send_replace never fails, even without any reader left
        self.sender.send_replace(Some(map));
        debug!("map published");
    }
}

impl MapSlot {
    pub fn get(&self) -> Option<SharedMap> {
        self.receiver.borrow().as_ref().map(Arc::clone)
    }

    /// Resolves as soon as a map is published, without polling.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<SharedMap, ReadinessError> {
        let mut receiver = self.receiver.clone();
        // the watch::Ref must be gone before `receiver` is dropped
        let result = tokio::time::timeout(timeout, receiver.wait_for(Option::is_some)).await;
        let map = match result {
            Ok(Ok(published)) => published.as_ref().map(Arc::clone),
            Ok(Err(_)) => return Err(ReadinessError::Closed),
            Err(_) => return Err(ReadinessError::Deadline(timeout)),
        };
        map.ok_or(ReadinessError::Closed)
    }
}

#[derive(Debug, PartialEq)]
pub enum ReadinessStatus<R> {
    /// No map yet.
    Pending,
    /// The map showed up during this tick, the next stage ran and produced this.
    Ready(R),
    /// The next stage already ran during an earlier tick.
    Done,
}

/// Holds the next stage until the map exists, then runs it exactly once.
pub struct ReadinessWaiter<F> {
    slot: MapSlot,
    next_stage: Option<F>,
    ticks: u64,
}

impl<F, R> ReadinessWaiter<F>
where
    F: FnOnce(SharedMap) -> R,
{
    pub fn new(slot: MapSlot, next_stage: F) -> Self {
        Self {
            slot,
            next_stage: Some(next_stage),
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_done(&self) -> bool {
        self.next_stage.is_none()
    }

    /// One check of the slot.
    pub fn tick(&mut self) -> ReadinessStatus<R> {
        if self.next_stage.is_none() {
            return ReadinessStatus::Done;
        }
        self.ticks += 1;
        let Some(map) = self.slot.get() else {
            trace!(ticks = self.ticks, "map not available yet");
            return ReadinessStatus::Pending;
        };
        match self.next_stage.take() {
            Some(stage) => {
                info!(ticks = self.ticks, "map detected");
                ReadinessStatus::Ready(stage(map))
            }
            None => ReadinessStatus::Done,
        }
    }

    /// Ticks every `interval` until the map shows up.
    /// With `max_attempts` set, gives up with [`ReadinessError::Timeout`] instead of waiting forever.
    #[instrument(skip_all, name = "readiness poll")]
    pub async fn poll(
        mut self,
        interval: Duration,
        max_attempts: Option<u64>,
    ) -> Result<R, ReadinessError> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.tick() {
                ReadinessStatus::Ready(result) => return Ok(result),
                ReadinessStatus::Done => return Err(ReadinessError::Closed),
                ReadinessStatus::Pending => {}
            }
            if let Some(max) = max_attempts {
                if self.ticks >= max {
                    return Err(ReadinessError::Timeout {
                        attempts: self.ticks,
                    });
                }
            }
        }
    }

    /// Event driven variant of [`Self::poll`]: waits for the publication instead of ticking.
    pub async fn wait(mut self, timeout: Duration) -> Result<R, ReadinessError> {
        let map = self.slot.wait_ready(timeout).await?;
        let stage = self.next_stage.take().ok_or(ReadinessError::Closed)?;
        info!("map detected");
        Ok(stage(map))
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use parkmap_core::LatLon;
    use parkmap_marker_models::map::{DEFAULT_CENTER, DEFAULT_ZOOM};
    use parkmap_marker_models::{IconDescriptor, LeafletMap, MarkerColor};

    use crate::wiring::attach_toggle;

    fn red_map(markers: usize) -> LeafletMap {
        let mut map = LeafletMap::new(DEFAULT_CENTER, DEFAULT_ZOOM);
        for i in 0..markers {
            map.add_marker(
                LatLon::new(i as f64, i as f64),
                Some(IconDescriptor::awesome(MarkerColor::Red)),
                "",
            );
        }
        map
    }

    #[test]
    fn test_no_map_never_wires() {
        let (_publisher, slot) = map_slot();
        let runs = AtomicUsize::new(0);
        let mut waiter = ReadinessWaiter::new(slot, |_map| {
            runs.fetch_add(1, Ordering::Relaxed);
        });
        for _ in 0..10_000 {
            assert_eq!(waiter.tick(), ReadinessStatus::Pending);
        }
        assert_eq!(runs.load(Ordering::Relaxed), 0);
        assert_eq!(waiter.ticks(), 10_000);
    }

    #[test]
    fn test_single_wiring_pass_at_publication() {
        let (publisher, slot) = map_slot();
        let map = red_map(3).into_shared();
        let mut waiter = ReadinessWaiter::new(slot, |map: SharedMap| {
            let mut map = map.lock().unwrap();
            attach_toggle(&mut *map).wired.len()
        });

        for _ in 0..4 {
            assert_eq!(waiter.tick(), ReadinessStatus::Pending);
        }
        publisher.publish(Arc::clone(&map));
        assert_eq!(waiter.tick(), ReadinessStatus::Ready(3));
        assert_eq!(waiter.ticks(), 5);

        let late = map.lock().unwrap().add_marker(
            LatLon::new(9.0, 9.0),
            Some(IconDescriptor::awesome(MarkerColor::Red)),
            "",
        );
        assert_eq!(waiter.tick(), ReadinessStatus::Done);
        assert!(waiter.is_done());

        let map = map.lock().unwrap();
        assert_eq!(map.marker(late).unwrap().handler_count(), 0);
        assert_eq!(
            map.markers().filter(|m| m.handler_count() == 1).count(),
            3
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_poll_times_out() {
        let (_publisher, slot) = map_slot();
        let waiter = ReadinessWaiter::new(slot, |_map| ());
        let result = waiter.poll(DEFAULT_POLL_INTERVAL, Some(20)).await;
        assert!(matches!(result, Err(ReadinessError::Timeout { attempts: 20 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_picks_up_late_publication() {
        let (publisher, slot) = map_slot();
        let waiter = ReadinessWaiter::new(slot, |map: SharedMap| {
            let mut map = map.lock().unwrap();
            attach_toggle(&mut *map).wired.len()
        });
        let handle = tokio::spawn(waiter.poll(DEFAULT_POLL_INTERVAL, Some(100)));
        tokio::time::sleep(Duration::from_millis(350)).await;
        publisher.publish(red_map(2).into_shared());
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_event_driven() {
        let (publisher, slot) = map_slot();
        let waiter = ReadinessWaiter::new(slot.clone(), |map: SharedMap| {
            map.lock().unwrap().markers().count()
        });
        let handle = tokio::spawn(waiter.wait(Duration::from_secs(5)));
        tokio::task::yield_now().await;
        publisher.publish(red_map(4).into_shared());
        assert_eq!(handle.await.unwrap().unwrap(), 4);
        assert!(slot.get().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_deadline_and_closed() {
        let (publisher, slot) = map_slot();
        let result = slot.wait_ready(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(ReadinessError::Deadline(_))));

        drop(publisher);
        let result = slot.wait_ready(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(ReadinessError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_ready_after_publication() {
        let (publisher, slot) = map_slot();
        let map = red_map(2).into_shared();
        publisher.publish(Arc::clone(&map));
        // already published, resolves without waiting and hands back the same map
        let ready = slot.wait_ready(Duration::from_millis(1)).await.unwrap();
        assert!(Arc::ptr_eq(&ready, &map));
        // the publisher going away afterwards does not hide the map
        drop(publisher);
        let ready = slot.clone().wait_ready(Duration::from_millis(1)).await.unwrap();
        assert_eq!(ready.lock().unwrap().markers().count(), 2);
    }
}
