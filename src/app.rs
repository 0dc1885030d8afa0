use airq_dashboard::data::Field;
use eframe::egui::{self, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{map, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AirQualityApp {
    pub state: AppState,
}

impl AirQualityApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for AirQualityApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: dashboard ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard(ui, &self.state);
        });
    }
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view observations  (File → Open…)");
        });
        return;
    };
    let colors = state.station_colors.as_ref();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Beijing air pollution");
            plot::scorecards(ui, &report.summary);
            ui.separator();

            ui.heading("Mean PM2.5 and PM10 by station");
            plot::pollutant_bars(ui, report);
            ui.separator();

            ui.heading("Weather and pollution");
            ui.strong("Wind speed (WSPM) vs PM2.5");
            plot::scatter_plot(
                ui,
                "wind_scatter",
                &report.wind_scatter,
                (Field::Wspm, Field::Pm25),
                colors,
            );
            ui.strong("Temperature (TEMP) vs PM2.5");
            plot::scatter_plot(
                ui,
                "temp_scatter",
                &report.temp_scatter,
                (Field::Temp, Field::Pm25),
                colors,
            );
            ui.separator();

            ui.heading(format!("{} trend", report.options.detail_field));
            plot::trend_plot(ui, report, colors);
            ui.heading(format!("{} distribution by station", report.options.detail_field));
            plot::box_plot(ui, report, colors);
            ui.separator();

            ui.heading("PM2.5 by station location");
            map::station_map(ui, &report.markers, state.map_center);
        });
}
