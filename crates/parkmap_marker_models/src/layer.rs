use std::sync::Arc;

use parkmap_core::LatLon;
use smol_str::SmolStr;
use uuid::Uuid;

use crate::icon::IconDescriptor;

/// What a click handler is allowed to touch on a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerState {
    pub guid: Uuid,
    pub position: LatLon,
    pub icon: Option<IconDescriptor>,
}

impl MarkerState {
    pub fn set_icon(&mut self, icon: IconDescriptor) {
        self.icon = Some(icon);
    }
}

pub trait MarkerClickHandler: Send + Sync {
    /// Name used in logs and wiring reports.
    fn name(&self) -> &str;
    fn on_click(&self, marker: &mut MarkerState);
}

/// Returned when a marker already carries a color behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorHandlerTaken {
    pub existing: String,
}

pub struct MarkerLayer {
    state: MarkerState,
    popup: String,
    /// At most one handler is allowed to own the icon color.
    color_handler: Option<Arc<dyn MarkerClickHandler>>,
    listeners: Vec<Arc<dyn MarkerClickHandler>>,
}

impl MarkerLayer {
    pub fn new(position: LatLon, icon: Option<IconDescriptor>, popup: impl Into<String>) -> Self {
        Self {
            state: MarkerState {
                guid: Uuid::new_v4(),
                position,
                icon,
            },
            popup: popup.into(),
            color_handler: None,
            listeners: Vec::new(),
        }
    }

    pub fn guid(&self) -> Uuid {
        self.state.guid
    }
    pub fn position(&self) -> LatLon {
        self.state.position
    }
    pub fn icon(&self) -> Option<&IconDescriptor> {
        self.state.icon.as_ref()
    }
    pub fn popup(&self) -> &str {
        &self.popup
    }
    pub fn set_icon(&mut self, icon: IconDescriptor) {
        self.state.set_icon(icon);
    }

    pub fn set_color_handler(
        &mut self,
        handler: Arc<dyn MarkerClickHandler>,
    ) -> Result<(), ColorHandlerTaken> {
        if let Some(existing) = &self.color_handler {
            return Err(ColorHandlerTaken {
                existing: existing.name().to_owned(),
            });
        }
        self.color_handler = Some(handler);
        Ok(())
    }

    pub fn color_handler_name(&self) -> Option<&str> {
        self.color_handler.as_deref().map(|h| h.name())
    }

    /// Plain listeners stack, they fire in attachment order after the color handler.
    pub fn on_click(&mut self, listener: Arc<dyn MarkerClickHandler>) {
        self.listeners.push(listener);
    }

    pub fn handler_count(&self) -> usize {
        self.listeners.len() + usize::from(self.color_handler.is_some())
    }

    pub fn click(&mut self) {
        let Self {
            state,
            color_handler,
            listeners,
            ..
        } = self;
        tracing::trace!(guid = %state.guid, "marker clicked");
        for handler in color_handler.iter().chain(listeners.iter()) {
            handler.on_click(state);
        }
    }
}

impl std::fmt::Debug for MarkerLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerLayer")
            .field("state", &self.state)
            .field("popup", &self.popup)
            .field("color_handler", &self.color_handler_name())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

pub const OSM_TILE_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url_template: SmolStr,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: SmolStr::new(OSM_TILE_TEMPLATE),
        }
    }
}

/// A named group, used to show one toggleable layer per city.
/// Markers of the group are still layers of the map on their own, the group only references them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGroup {
    pub name: String,
    pub members: Vec<Uuid>,
}

/// Everything that can be added to a map.
#[derive(Debug)]
pub enum Layer {
    Tile(TileLayer),
    Marker(MarkerLayer),
    FeatureGroup(FeatureGroup),
}

impl Layer {
    pub fn as_marker(&self) -> Option<&MarkerLayer> {
        match self {
            Layer::Marker(marker) => Some(marker),
            _ => None,
        }
    }
    pub fn as_marker_mut(&mut self) -> Option<&mut MarkerLayer> {
        match self {
            Layer::Marker(marker) => Some(marker),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use super::*;
    use crate::color::MarkerColor;

    struct Recorder {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
    }
    impl MarkerClickHandler for Recorder {
        fn name(&self) -> &str {
            &self.name
        }
        fn on_click(&self, _marker: &mut MarkerState) {
            self.log.lock().unwrap().push(self.name.clone());
        }
    }

    struct Painter(AtomicUsize);
    impl MarkerClickHandler for Painter {
        fn name(&self) -> &str {
            "painter"
        }
        fn on_click(&self, marker: &mut MarkerState) {
            self.0.fetch_add(1, Ordering::Relaxed);
            marker.set_icon(IconDescriptor::awesome(MarkerColor::Green));
        }
    }

    #[test]
    fn test_color_handler_runs_first_then_listeners_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut marker = MarkerLayer::new(LatLon::new(1.0, 2.0), None, "lot");
        for name in ["first", "second"] {
            marker.on_click(Arc::new(Recorder {
                name: name.to_string(),
                log: Arc::clone(&log),
            }));
        }
        marker
            .set_color_handler(Arc::new(Recorder {
                name: "color".to_string(),
                log: Arc::clone(&log),
            }))
            .unwrap();
        marker.click();
        assert_eq!(*log.lock().unwrap(), vec!["color", "first", "second"]);
        assert_eq!(marker.handler_count(), 3);
    }

    #[test]
    fn test_second_color_handler_is_refused() {
        let painter = Arc::new(Painter(AtomicUsize::new(0)));
        let mut marker = MarkerLayer::new(LatLon::new(1.0, 2.0), None, "lot");
        marker.set_color_handler(painter.clone()).unwrap();
        let refused = marker.set_color_handler(painter.clone()).unwrap_err();
        assert_eq!(refused.existing, "painter");
        marker.click();
        assert_eq!(painter.0.load(Ordering::Relaxed), 1);
        assert_eq!(marker.icon().and_then(|i| i.marker_color()), Some(MarkerColor::Green));
    }

    #[test]
    fn test_layer_variants() {
        let tile = Layer::Tile(TileLayer::default());
        assert!(tile.as_marker().is_none());
        let marker = Layer::Marker(MarkerLayer::new(LatLon::default(), None, ""));
        assert!(marker.as_marker().is_some());
    }
}
