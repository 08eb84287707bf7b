use eframe::egui;

use crate::state::{AppState, Section};
use crate::ui::{metrics, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CreditPandaApp {
    pub state: AppState,
}

impl CreditPandaApp {
    /// Start with a dataset already loaded, if one was configured.
    pub fn with_initial_file(path: Option<std::path::PathBuf>) -> Self {
        let mut app = Self::default();
        if let Some(path) = path {
            app.state.load_path(&path);
        }
        app
    }
}

impl eframe::App for CreditPandaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar and section selector ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs of the active section ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(kpis) = &self.state.kpis else {
                ui.centered_and_justified(|ui| {
                    ui.label("Open an application file (File → Open…) to begin.");
                });
                return;
            };
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match self.state.section {
                    Section::Home => metrics::home(ui, &self.state),
                    Section::Overview => metrics::overview(ui, &kpis.overview),
                    Section::Risk => metrics::risk(ui, &kpis.risk),
                    Section::Demographics => metrics::demographics(ui, &kpis.demographics),
                    Section::Affordability => metrics::affordability(ui, &kpis.affordability),
                    Section::Drivers => metrics::drivers(ui, &kpis.drivers),
                });
        });
    }
}
