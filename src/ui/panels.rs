use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::data::filter::{FilterConstraints, NumericRange};
use crate::data::model::CategoricalField;
use crate::state::{AppState, Section};
use crate::ui::metrics::thousands;

/// Income slider step, in currency units.
const INCOME_STEP: f64 = 10_000.0;
/// Precision of the age slider labels, in years.
const AGE_RESOLUTION: f64 = 0.1;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(loaded) = &state.loaded else {
        ui.label("No dataset loaded.");
        return;
    };
    let Some(constraints) = state.constraints.clone() else {
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let categories = loaded.dataset.categories.clone();
    let bounds = loaded.bounds;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Categorical filters (collapsible) ----
            for field in CategoricalField::ALL {
                let Some(index) = categories.get(&field) else {
                    continue;
                };
                let selected = constraints.selection(field);
                let n_selected = selected.map_or(0, |s| s.len());
                let n_total = index.values.len();
                let header_text = format!("{}  ({n_selected}/{n_total})", field.label());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(field.column())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(field);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(field);
                            }
                        });

                        for value in &index.values {
                            let mut checked = selected.is_some_and(|s| s.contains(value));
                            if ui.checkbox(&mut checked, value.as_str()).changed() {
                                state.toggle_filter_value(field, value);
                            }
                        }

                        if index.missing > 0 {
                            ui.label(
                                RichText::new(format!(
                                    "{} applicants without a value are always hidden",
                                    index.missing
                                ))
                                .small()
                                .weak(),
                            );
                        }
                    });
            }

            // ---- Range filters ----
            ui.separator();
            match bounds {
                Some(bounds) => {
                    if let Some((lo, hi)) = range_sliders(
                        ui,
                        "Age (years)",
                        bounds.age,
                        constraints.age(),
                        None,
                        years,
                    ) {
                        state.set_age_range(lo, hi);
                    }
                    if let Some((lo, hi)) = range_sliders(
                        ui,
                        "Income",
                        bounds.income,
                        constraints.income(),
                        Some(INCOME_STEP),
                        thousands,
                    ) {
                        state.set_income_range(lo, hi);
                    }
                }
                None => {
                    ui.label("Age and income ranges unavailable: no values loaded.");
                }
            }

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }

            // ---- Readout of the active constraint set ----
            ui.separator();
            active_filters(ui, state, &constraints);
        });
}

/// Lower/upper slider pair. Returns the new range when either end moved.
///
/// Stepping and on-screen rounding can leave a handle just short of the
/// observed extreme; a handle within `resolution` of its end snaps onto it.
fn range_sliders(
    ui: &mut Ui,
    label: &str,
    full: NumericRange,
    current: NumericRange,
    step: Option<f64>,
    format: fn(f64) -> String,
) -> Option<(f64, f64)> {
    ui.strong(label);
    let (mut lo, mut hi) = (current.lower(), current.upper());

    let mut from = Slider::new(&mut lo, full.lower()..=current.upper())
        .text("from")
        .custom_formatter(move |v, _| format(v));
    let mut to = Slider::new(&mut hi, current.lower()..=full.upper())
        .text("to")
        .custom_formatter(move |v, _| format(v));
    if let Some(step) = step {
        from = from.step_by(step);
        to = to.step_by(step);
    }

    let changed = ui.add(from).changed() | ui.add(to).changed();
    let resolution = step.unwrap_or(AGE_RESOLUTION);
    let lo = snap_to(lo, full.lower(), resolution);
    let hi = snap_to(hi, full.upper(), resolution);
    changed.then_some((lo.min(hi), hi.max(lo)))
}

fn snap_to(value: f64, end: f64, resolution: f64) -> f64 {
    if (end - value).abs() < resolution {
        end
    } else {
        value
    }
}

fn years(v: f64) -> String {
    format!("{v:.1}")
}

fn active_filters(ui: &mut Ui, state: &mut AppState, constraints: &FilterConstraints) {
    ui.strong("Active filters");
    for field in CategoricalField::ALL {
        let values = constraints
            .selection(field)
            .map(|s| s.iter().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        ui.label(format!("{}: [{values}]", field.label()));
    }
    let (age, income) = (constraints.age(), constraints.income());
    ui.label(format!("Age: {:.1} to {:.1}", age.lower(), age.upper()));
    ui.label(format!(
        "Income: {} to {}",
        thousands(income.lower()),
        thousands(income.upper())
    ));

    if ui.small_button("Copy as JSON").clicked() {
        match serde_json::to_string_pretty(&constraints.snapshot()) {
            Ok(json) => ui.ctx().copy_text(json),
            Err(e) => {
                log::error!("Failed to serialize filters: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
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

        egui::ComboBox::from_id_salt("section")
            .selected_text(state.section.label())
            .show_ui(ui, |ui: &mut Ui| {
                for section in Section::ALL {
                    ui.selectable_value(&mut state.section, section, section.label());
                }
            });

        ui.separator();

        if let Some(loaded) = &state.loaded {
            let name = loaded
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{name}: {} applicants loaded, {} visible",
                thousands(loaded.dataset.len() as f64),
                thousands(state.visible_rows.len() as f64)
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open application data")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
