use airq_dashboard::data::StationMarker;
use eframe::egui::{Align2, Ui};
use egui_plot::{Plot, PlotPoint, Points, Text};

use crate::color::MARKER_COLOR;

// ---------------------------------------------------------------------------
// Station map (lon/lat plot, no tiles)
// ---------------------------------------------------------------------------

/// Minimum on-screen radius so tiny means stay clickable.
const MIN_RADIUS: f32 = 2.0;

/// Circle markers sized by mean PM2.5 at their station coordinates.
///
/// Only stations present in the selection have a marker; the caller has
/// already dropped registry entries without data.
pub fn station_map(ui: &mut Ui, markers: &[StationMarker], center: [f64; 2]) {
    if markers.is_empty() {
        ui.label("No registered station has PM2.5 data in the selection.");
    }
    let [center_lat, center_lon] = center;

    Plot::new("station_map")
        .height(420.0)
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .include_x(center_lon)
        .include_y(center_lat)
        .show(ui, |plot_ui| {
            for marker in markers {
                let loc = &marker.location;
                let radius = (marker.radius as f32).max(MIN_RADIUS);
                plot_ui.points(
                    Points::new(vec![[loc.lon, loc.lat]])
                        .name(&loc.name)
                        .radius(radius)
                        .filled(true)
                        .color(MARKER_COLOR.gamma_multiply(0.6)),
                );
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(loc.lon, loc.lat),
                        format!("{}: {:.2} µg/m³", loc.name, marker.value),
                    )
                    .anchor(Align2::LEFT_BOTTOM),
                );
            }
        });
}
