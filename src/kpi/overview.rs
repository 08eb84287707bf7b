use std::collections::BTreeSet;

use super::stats::{mean, median, percent, value_counts};
use crate::data::model::{Applicant, CategoricalField, ColumnKind, Dataset};

/// Number of columns listed in the missing-values ranking.
pub const TOP_MISSING: usize = 20;

/// Headline figures and data-quality profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    /// Distinct applicant ids.
    pub applicants: usize,
    pub default_rate: Option<f64>,
    pub repaid_rate: Option<f64>,
    pub total_features: usize,
    pub numeric_features: usize,
    pub categorical_features: usize,
    /// Mean over all columns of each column's missing percentage.
    pub avg_missing_pct: Option<f64>,
    pub median_age: Option<f64>,
    pub median_income: Option<f64>,
    pub avg_credit: Option<f64>,
    /// Columns with the highest missing percentage, worst first.
    pub top_missing: Vec<(String, f64)>,
    pub repaid: usize,
    pub defaulted: usize,
    pub gender: Vec<(String, usize)>,
    pub family_status: Vec<(String, usize)>,
    pub education: Vec<(String, usize)>,
}

impl Overview {
    pub fn compute(dataset: &Dataset, view: &[&Applicant]) -> Self {
        let applicants = view.iter().map(|a| a.id).collect::<BTreeSet<_>>().len();
        let default_rate = percent(view, |a| a.defaulted);
        let defaulted = view.iter().filter(|a| a.defaulted).count();

        let numeric_features = dataset
            .columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .count();

        let missing: Vec<(String, f64)> = dataset
            .columns
            .iter()
            .filter_map(|c| Some((c.name.clone(), percent(view, |a| a.is_missing(c))?)))
            .collect();
        let avg_missing_pct = mean(missing.iter().map(|(_, pct)| *pct));
        let mut top_missing = missing;
        top_missing.sort_by(|a, b| b.1.total_cmp(&a.1));
        top_missing.truncate(TOP_MISSING);

        let counts =
            |field: CategoricalField| value_counts(view.iter().filter_map(|a| a.category(field)));

        Overview {
            applicants,
            default_rate,
            repaid_rate: default_rate.map(|r| 100.0 - r),
            total_features: dataset.columns.len(),
            numeric_features,
            categorical_features: dataset.columns.len() - numeric_features,
            avg_missing_pct,
            median_age: median(view.iter().filter_map(|a| a.derived.age_years)),
            median_income: median(view.iter().filter_map(|a| a.income)),
            avg_credit: mean(view.iter().filter_map(|a| a.credit)),
            top_missing,
            repaid: view.len() - defaulted,
            defaulted,
            gender: counts(CategoricalField::Gender),
            family_status: counts(CategoricalField::FamilyStatus),
            education: counts(CategoricalField::Education),
        }
    }
}
