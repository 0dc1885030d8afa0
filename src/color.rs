use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Fixed series colours for the two scorecard pollutants.
pub const PM25_COLOR: Color32 = Color32::from_rgb(0x4a, 0x90, 0xe2);
pub const PM10_COLOR: Color32 = Color32::from_rgb(0x50, 0xe3, 0xc2);
pub const MARKER_COLOR: Color32 = Color32::from_rgb(0xe0, 0x3a, 0x3a);

// ---------------------------------------------------------------------------
// Color mapping: station → Color32
// ---------------------------------------------------------------------------

/// Maps every station of the loaded table to a distinct colour, so a station
/// keeps its colour across charts and selections.
#[derive(Debug, Clone)]
pub struct StationColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl StationColors {
    pub fn new(stations: &BTreeSet<String>) -> Self {
        let palette = generate_palette(stations.len());
        let mapping = stations.iter().cloned().zip(palette).collect();

        StationColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, station: &str) -> Color32 {
        self.mapping
            .get(station)
            .copied()
            .unwrap_or(self.default_color)
    }
}
