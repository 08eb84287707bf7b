use super::numeric_columns;
use super::stats::{column_correlation, CorrelationMatrix};
use crate::data::derive::{ANNUITY, CREDIT, FAMILY_MEMBERS, ID, INCOME, TARGET};
use crate::data::model::{Applicant, ColumnProfile, Dataset, DerivedField};

pub const TOP_N: usize = 5;
/// Absolute correlation above which a feature counts as strongly related.
pub const HIGH_CORRELATION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Drivers {
    /// Correlation of every numeric feature with TARGET, highest first.
    /// Undefined correlations (constant columns) are left out.
    pub target_correlations: Vec<(String, f64)>,
    pub top_positive: Vec<(String, f64)>,
    /// Most negative first.
    pub top_negative: Vec<(String, f64)>,
    /// Column with the largest absolute correlation, and that absolute value.
    pub most_correlated_with_income: Option<(String, f64)>,
    pub most_correlated_with_credit: Option<(String, f64)>,
    pub income_credit: Option<f64>,
    pub age_target: Option<f64>,
    pub employment_target: Option<f64>,
    pub family_size_target: Option<f64>,
    /// Sum of the top absolute target correlations.
    pub top_abs_sum: Option<f64>,
    pub high_correlation_count: usize,
    pub driver_correlation: CorrelationMatrix,
}

/// Correlations of `anchor` with every other numeric feature.
fn correlations_with(
    view: &[&Applicant],
    features: &[&ColumnProfile],
    anchor: &ColumnProfile,
) -> Vec<(String, f64)> {
    features
        .iter()
        .filter(|c| c.name != anchor.name)
        .filter_map(|c| Some((c.name.clone(), column_correlation(view, anchor, c)?)))
        .collect()
}

fn strongest(correlations: Vec<(String, f64)>) -> Option<(String, f64)> {
    correlations
        .into_iter()
        .map(|(name, r)| (name, r.abs()))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

impl Drivers {
    pub fn compute(dataset: &Dataset, view: &[&Applicant]) -> Self {
        // the identifier is numeric but meaningless as a driver
        let features: Vec<&ColumnProfile> = dataset
            .numeric_columns()
            .filter(|c| c.name != ID)
            .collect();
        let column = |name: &str| features.iter().copied().find(|c| c.name == name);
        let pair = |a: &str, b: &str| column_correlation(view, column(a)?, column(b)?);

        let mut target_correlations = column(TARGET)
            .map(|t| correlations_with(view, &features, t))
            .unwrap_or_default();
        target_correlations.sort_by(|a, b| b.1.total_cmp(&a.1));

        let top_positive: Vec<(String, f64)> =
            target_correlations.iter().take(TOP_N).cloned().collect();
        let top_negative: Vec<(String, f64)> =
            target_correlations.iter().rev().take(TOP_N).cloned().collect();

        let mut by_strength: Vec<f64> =
            target_correlations.iter().map(|(_, r)| r.abs()).collect();
        by_strength.sort_by(|a, b| b.total_cmp(a));
        let top_abs_sum: Option<f64> =
            (!by_strength.is_empty()).then(|| by_strength.iter().take(TOP_N).sum());
        let high_correlation_count = by_strength
            .iter()
            .filter(|r| **r > HIGH_CORRELATION)
            .count();

        let age = DerivedField::AgeYears.column();
        let employment = DerivedField::EmploymentYears.column();
        let matrix_columns = numeric_columns(
            dataset,
            &[INCOME, CREDIT, ANNUITY, age, employment, FAMILY_MEMBERS, TARGET],
        );

        Drivers {
            most_correlated_with_income: column(INCOME)
                .and_then(|c| strongest(correlations_with(view, &features, c))),
            most_correlated_with_credit: column(CREDIT)
                .and_then(|c| strongest(correlations_with(view, &features, c))),
            income_credit: pair(INCOME, CREDIT),
            age_target: pair(age, TARGET),
            employment_target: pair(employment, TARGET),
            family_size_target: pair(FAMILY_MEMBERS, TARGET),
            top_positive,
            top_negative,
            top_abs_sum,
            high_correlation_count,
            target_correlations,
            driver_correlation: CorrelationMatrix::compute(view, &matrix_columns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{dataset, RowSpec};

    fn drivers(rows: &[RowSpec]) -> Drivers {
        let ds = dataset(rows);
        let view: Vec<&Applicant> = ds.applicants.iter().collect();
        Drivers::compute(&ds, &view)
    }

    /// Younger, lower-income applicants default in this fixture.
    fn rows() -> Vec<RowSpec> {
        (0..8)
            .map(|i| {
                let spec = RowSpec::new(i)
                    .age(25.0 + 5.0 * i as f64)
                    .income(100_000.0 + 20_000.0 * i as f64)
                    .credit(300_000.0 + 60_000.0 * i as f64)
                    .annuity(15_000.0 + 1_000.0 * (i % 3) as f64)
                    .family_members(1.0 + (i % 4) as f64);
                if i < 3 {
                    spec.defaulted()
                } else {
                    spec
                }
            })
            .collect()
    }

    #[test]
    fn target_correlations_are_ranked() {
        let d = drivers(&rows());
        assert!(!d.target_correlations.is_empty());
        assert!(d
            .target_correlations
            .windows(2)
            .all(|w| w[0].1 >= w[1].1));
        assert!(d.target_correlations.iter().all(|(n, _)| n != ID && n != TARGET));
        assert_eq!(d.top_positive.len(), TOP_N);
        assert!(d.top_negative[0].1 <= d.top_negative[1].1);
        assert!(d.age_target.unwrap() < 0.0);
    }

    #[test]
    fn income_and_credit_move_together() {
        let d = drivers(&rows());
        assert!((d.income_credit.unwrap() - 1.0).abs() < 1e-9);
        // credit, age and birth offset are all exact linear functions of income here
        let (name, r) = d.most_correlated_with_income.unwrap();
        assert!((r - 1.0).abs() < 1e-9);
        assert!([CREDIT, "AGE_YEARS", "DAYS_BIRTH"].contains(&name.as_str()));
        assert!(d.high_correlation_count >= 1);
        assert!(d.top_abs_sum.unwrap() > 0.0);
    }

    #[test]
    fn constant_target_has_no_correlations() {
        let d = drivers(&[RowSpec::new(1), RowSpec::new(2).age(30.0)]);
        assert!(d.target_correlations.is_empty());
        assert_eq!(d.top_abs_sum, None);
        assert_eq!(d.age_target, None);
    }
}
