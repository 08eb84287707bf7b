use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::data::derive::derive;
use crate::data::filter::{apply, Bounds, FilterConstraints};
use crate::data::loader::load_file;
use crate::data::model::{CategoricalField, Dataset};
use crate::kpi::DashboardKpis;

// ---------------------------------------------------------------------------
// Dashboard sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Home,
    Overview,
    Risk,
    Demographics,
    Affordability,
    Drivers,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Home,
        Section::Overview,
        Section::Risk,
        Section::Demographics,
        Section::Affordability,
        Section::Drivers,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Overview => "Overview & Data Quality",
            Section::Risk => "Target & Risk Segmentation",
            Section::Demographics => "Demographics & Household",
            Section::Affordability => "Financial Health & Affordability",
            Section::Drivers => "Correlations & Drivers",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// A derived dataset together with the bounds computed for it at load time.
pub struct LoadedDataset {
    pub source: PathBuf,
    pub dataset: Dataset,
    pub bounds: Option<Bounds>,
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub loaded: Option<LoadedDataset>,

    /// Active filter constraints; present whenever `loaded` is.
    pub constraints: Option<FilterConstraints>,

    /// Source-row positions of applicants passing the current filters (cached).
    pub visible_rows: Vec<usize>,

    /// Statistics over the visible applicants (cached).
    pub kpis: Option<DashboardKpis>,

    pub section: Section,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

/// Read and derive a dataset; the whole pipeline that runs once per load.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let started = Instant::now();
    let raw = load_file(path).with_context(|| format!("loading {}", path.display()))?;
    log::debug!("Read {} raw rows with {} columns", raw.len(), raw.columns.len());
    let dataset = derive(raw).context("deriving applicant features")?;
    log::info!(
        "Loaded {} applicants with {} columns from {} in {:.2?}",
        dataset.len(),
        dataset.columns.len(),
        path.display(),
        started.elapsed()
    );
    if dataset.is_empty() {
        log::warn!("{} contains no applicants", path.display());
    }
    Ok(dataset)
}

impl AppState {
    /// Load a file, replacing the current dataset on success.
    pub fn load_path(&mut self, path: &Path) {
        match load_dataset(path) {
            Ok(dataset) => self.set_dataset(dataset, path.to_path_buf()),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly derived dataset: recompute bounds, reset filters.
    pub fn set_dataset(&mut self, dataset: Dataset, source: PathBuf) {
        let bounds = Bounds::of(&dataset.applicants);
        self.constraints = Some(FilterConstraints::full(&dataset));
        self.loaded = Some(LoadedDataset {
            source,
            dataset,
            bounds,
        });
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the visible rows and statistics after a filter change.
    pub fn refilter(&mut self) {
        let (Some(loaded), Some(constraints)) = (&self.loaded, &self.constraints) else {
            return;
        };
        let view = apply(&loaded.dataset.applicants, constraints);
        log::debug!(
            "{} of {} applicants pass the filters",
            view.len(),
            loaded.dataset.len()
        );
        self.visible_rows = view.iter().map(|a| a.row).collect();
        self.kpis = Some(DashboardKpis::compute(&loaded.dataset, &view));
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.loaded.as_ref().map(|l| &l.dataset)
    }

    /// Toggle a single category value in a field's filter.
    pub fn toggle_filter_value(&mut self, field: CategoricalField, value: &str) {
        if let Some(c) = &mut self.constraints {
            c.toggle(field, value);
            self.refilter();
        }
    }

    /// Select all values of a field.
    pub fn select_all(&mut self, field: CategoricalField) {
        let Some(all) = self.dataset().map(|ds| ds.category_values(field)) else {
            return;
        };
        if let Some(c) = &mut self.constraints {
            c.select(field, all);
            self.refilter();
        }
    }

    /// Deselect all values of a field.
    pub fn select_none(&mut self, field: CategoricalField) {
        if let Some(c) = &mut self.constraints {
            c.select(field, Default::default());
            self.refilter();
        }
    }

    pub fn set_age_range(&mut self, lower: f64, upper: f64) {
        self.update_range(|c| c.set_age(lower, upper));
    }

    pub fn set_income_range(&mut self, lower: f64, upper: f64) {
        self.update_range(|c| c.set_income(lower, upper));
    }

    /// Restore every filter to the full dataset extent.
    pub fn reset_filters(&mut self) {
        if let Some(loaded) = &self.loaded {
            self.constraints = Some(FilterConstraints::full(&loaded.dataset));
            self.refilter();
        }
    }

    fn update_range(
        &mut self,
        set: impl FnOnce(&mut FilterConstraints) -> Result<(), crate::data::error::DataError>,
    ) {
        let Some(c) = &mut self.constraints else {
            return;
        };
        match set(c) {
            Ok(()) => {
                self.status_message = None;
                self.refilter();
            }
            Err(e) => {
                log::warn!("Rejected filter range: {e}");
                self.status_message = Some(e.to_string());
            }
        }
    }
}
