use airq_dashboard::data::{Field, Resolution, StationFilter};
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::state::AppState;

/// Fields offered for the trend and box-plot charts.
const DETAIL_FIELDS: [Field; 6] = [
    Field::Pm25,
    Field::Pm10,
    Field::No2,
    Field::O3,
    Field::Temp,
    Field::Wspm,
];

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(table) = &state.table else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state below.
    let stations: Vec<String> = table.stations().iter().cloned().collect();
    let coverage = table.coverage();
    let tracked: Vec<Field> = DETAIL_FIELDS
        .into_iter()
        .filter(|f| table.has_field(*f))
        .collect();

    // ---- Date range ----
    ui.strong("Start");
    ui.add(DatePickerButton::new(&mut state.criteria.start).id_salt("start_date"));
    ui.strong("End");
    ui.add(DatePickerButton::new(&mut state.criteria.end).id_salt("end_date"));
    if !state.criteria.is_valid_range() {
        ui.label(RichText::new("Start is after end: nothing selected").color(Color32::RED));
    }
    if let Some((first, last)) = coverage {
        ui.small(format!("Data covers {} – {}", first.date(), last.date()));
    }
    ui.separator();

    // ---- Station ----
    ui.strong("Station");
    let mut station = state.criteria.station.clone();
    egui::ComboBox::from_id_salt("station")
        .selected_text(station.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut station, StationFilter::All, "All");
            for name in &stations {
                ui.selectable_value(&mut station, StationFilter::only(name.as_str()), name.as_str());
            }
        });
    if station != state.criteria.station {
        state.set_station(station);
    }
    ui.separator();

    // ---- Detail charts ----
    ui.strong("Trend / distribution field");
    egui::ComboBox::from_id_salt("detail_field")
        .selected_text(state.options.detail_field.column())
        .show_ui(ui, |ui: &mut Ui| {
            for field in tracked {
                ui.selectable_value(&mut state.options.detail_field, field, field.column());
            }
        });
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.options.resolution, Resolution::Daily, "Daily");
        ui.selectable_value(&mut state.options.resolution, Resolution::Monthly, "Monthly");
    });

    // Recompute the report after any widget change.
    state.refilter();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} observations loaded, {} selected",
                table.len(),
                state.visible_count()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open air-quality observations")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match airq_dashboard::data::loader::load_file(&path) {
            Ok(table) => state.set_table(table),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
