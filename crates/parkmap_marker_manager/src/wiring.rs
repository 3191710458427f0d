use std::sync::Arc;

use parkmap_marker_models::{
    IconDescriptor, Layer, MarkerClickHandler, MarkerColor, MarkerMap, MarkerState,
};
use tracing::{error, info, info_span, trace, warn};
use uuid::Uuid;

/// What a click does to the icon of a marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorBehavior {
    /// red <-> green, anything that is not red turns red.
    Toggle,
    /// One way: the icon is replaced by this one on every click.
    SetIcon(IconDescriptor),
}

impl ColorBehavior {
    pub fn toggle() -> Self {
        Self::Toggle
    }

    pub fn single_shot() -> Self {
        Self::SetIcon(IconDescriptor::green_dot())
    }
}

impl MarkerClickHandler for ColorBehavior {
    fn name(&self) -> &str {
        match self {
            Self::Toggle => "marker_color_toggler",
            Self::SetIcon(_) => "single_shot_colorer",
        }
    }

    fn on_click(&self, marker: &mut MarkerState) {
        match self {
            Self::Toggle => {
                let Some(current) = marker.icon.as_ref() else {
                    error!(guid = %marker.guid, "marker icon is undefined, click ignored");
                    return;
                };
                let new_color = MarkerColor::next_from(current.marker_color());
                marker.set_icon(IconDescriptor::awesome(new_color));
                info!(guid = %marker.guid, %new_color, "marker clicked, color changed");
            }
            Self::SetIcon(icon) => {
                marker.set_icon(icon.clone());
                trace!(guid = %marker.guid, "marker clicked, icon replaced");
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WiringReport {
    /// Markers that got the behavior, in layer order.
    pub wired: Vec<Uuid>,
    /// Markers already driven by another color behavior, with the name of that behavior.
    pub skipped: Vec<(Uuid, String)>,
    /// Tiles, groups, anything that is not a marker.
    pub other_layers: usize,
}

/// Attaches `behavior` to every marker currently on the map.
/// This is a one time pass: markers added afterwards are left alone.
pub fn wire_markers<M: MarkerMap + ?Sized>(map: &mut M, behavior: ColorBehavior) -> WiringReport {
    let handler: Arc<dyn MarkerClickHandler> = Arc::new(behavior);
    let _span_guard = info_span!("wiring markers", behavior = handler.name()).entered();
    let mut report = WiringReport::default();
    map.each_layer(&mut |layer: &mut Layer| match layer {
        Layer::Marker(marker) => {
            let guid = marker.guid();
            match marker.set_color_handler(Arc::clone(&handler)) {
                Ok(()) => {
                    trace!(%guid, "attaching click event to marker");
                    report.wired.push(guid);
                }
                Err(taken) => {
                    warn!(%guid, existing = %taken.existing, "marker already has a color behavior, skipped");
                    report.skipped.push((guid, taken.existing));
                }
            }
        }
        Layer::Tile(_) | Layer::FeatureGroup(_) => {
            report.other_layers += 1;
        }
    });
    info!(
        wired = report.wired.len(),
        skipped = report.skipped.len(),
        "wiring pass done"
    );
    report
}

pub fn attach_toggle<M: MarkerMap + ?Sized>(map: &mut M) -> WiringReport {
    wire_markers(map, ColorBehavior::toggle())
}

pub fn attach_single_shot<M: MarkerMap + ?Sized>(map: &mut M) -> WiringReport {
    wire_markers(map, ColorBehavior::single_shot())
}
