/// Descriptive statistics behind each dashboard section.
///
/// Every figure is a function of the *filtered* view handed in by the
/// session state, never of the full dataset:
/// ```text
///   Dataset ──apply(constraints)──▶ &[&Applicant] ──▶ DashboardKpis
///                                                    ├─ overview
///                                                    ├─ risk
///                                                    ├─ demographics
///                                                    ├─ affordability
///                                                    └─ drivers
/// ```
/// An empty view yields `None` metrics and empty tables, never a panic.

pub mod affordability;
pub mod demographics;
pub mod drivers;
pub mod overview;
pub mod risk;
pub mod stats;

use crate::data::model::{Applicant, ColumnKind, ColumnProfile, Dataset};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardKpis {
    pub overview: overview::Overview,
    pub risk: risk::RiskSegmentation,
    pub demographics: demographics::Demographics,
    pub affordability: affordability::Affordability,
    pub drivers: drivers::Drivers,
}

impl DashboardKpis {
    pub fn compute(dataset: &Dataset, view: &[&Applicant]) -> Self {
        DashboardKpis {
            overview: overview::Overview::compute(dataset, view),
            risk: risk::RiskSegmentation::compute(view),
            demographics: demographics::Demographics::compute(dataset, view),
            affordability: affordability::Affordability::compute(dataset, view),
            drivers: drivers::Drivers::compute(dataset, view),
        }
    }
}

/// Look up numeric columns by name, skipping any the dataset lacks.
fn numeric_columns<'d>(dataset: &'d Dataset, names: &[&str]) -> Vec<&'d ColumnProfile> {
    names
        .iter()
        .filter_map(|n| dataset.column(n))
        .filter(|c| c.kind == ColumnKind::Numeric)
        .collect()
}

/// Split a view into (repaid, defaulted).
fn split_by_target<'a>(view: &[&'a Applicant]) -> (Vec<&'a Applicant>, Vec<&'a Applicant>) {
    view.iter().copied().partition(|a| !a.defaulted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply, FilterConstraints};
    use crate::data::fixtures::{dataset, RowSpec};
    use crate::data::model::CategoricalField;
    use std::collections::BTreeSet;

    #[test]
    fn metrics_follow_the_filtered_view() {
        let ds = dataset(&[
            RowSpec::new(1).gender(Some("F")).income(100_000.0),
            RowSpec::new(2).gender(Some("M")).income(300_000.0).defaulted(),
        ]);
        let mut c = FilterConstraints::full(&ds);
        c.select(CategoricalField::Gender, BTreeSet::from(["F".to_string()]));
        let view = apply(&ds.applicants, &c);
        let k = DashboardKpis::compute(&ds, &view);
        assert_eq!(k.overview.applicants, 1);
        assert_eq!(k.overview.default_rate, Some(0.0));
        assert_eq!(k.affordability.avg_income, Some(100_000.0));
    }

    #[test]
    fn empty_view_yields_no_metrics() {
        let ds = dataset(&[RowSpec::new(1)]);
        let k = DashboardKpis::compute(&ds, &[]);
        assert_eq!(k.overview.applicants, 0);
        assert_eq!(k.overview.default_rate, None);
        assert_eq!(k.overview.median_age, None);
        assert!(k.risk.by_gender.is_empty());
        assert_eq!(k.demographics.male_pct, None);
        assert_eq!(k.affordability.income_gap, None);
        assert!(k.drivers.target_correlations.is_empty());
    }

    #[test]
    fn split_keeps_order_within_each_side() {
        let ds = dataset(&[
            RowSpec::new(1),
            RowSpec::new(2).defaulted(),
            RowSpec::new(3),
        ]);
        let view: Vec<&Applicant> = ds.applicants.iter().collect();
        let (repaid, defaulted) = split_by_target(&view);
        assert_eq!(repaid.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(defaulted.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2]);
    }
}
