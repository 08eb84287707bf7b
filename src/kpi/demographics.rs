use std::collections::BTreeMap;

use super::stats::{mean, percent, value_counts, CorrelationMatrix};
use super::{numeric_columns, split_by_target};
use crate::data::derive::{CHILDREN, FAMILY_MEMBERS, TARGET};
use crate::data::model::{Applicant, Dataset, DerivedField};

/// Education levels counted as higher education.
pub const HIGHER_EDUCATION: [&str; 5] = [
    "Higher education",
    "Academic degree",
    "Bachelor",
    "Master",
    "PhD",
];

pub const TOP_OCCUPATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Demographics {
    pub male_pct: Option<f64>,
    pub female_pct: Option<f64>,
    pub avg_age_defaulters: Option<f64>,
    pub avg_age_repaid: Option<f64>,
    pub with_children_pct: Option<f64>,
    pub avg_family_size: Option<f64>,
    pub married_pct: Option<f64>,
    pub single_pct: Option<f64>,
    pub higher_education_pct: Option<f64>,
    pub with_parents_pct: Option<f64>,
    /// Applicants with a recorded occupation.
    pub working_pct: Option<f64>,
    pub avg_employment_years: Option<f64>,
    pub top_occupations: Vec<(String, usize)>,
    pub housing: Vec<(String, usize)>,
    /// Applicants per number of children, ascending.
    pub children: Vec<(i64, usize)>,
    pub household_correlation: CorrelationMatrix,
}

/// Case-insensitive match on a gender code, accepting `M`/`Male` style values.
fn gender_is(a: &Applicant, code: &str, word: &str) -> bool {
    a.gender
        .as_deref()
        .is_some_and(|g| g.eq_ignore_ascii_case(code) || g.eq_ignore_ascii_case(word))
}

fn family_status_starts_with(a: &Applicant, prefix: &str) -> bool {
    a.family_status
        .as_deref()
        .is_some_and(|s| s.to_ascii_lowercase().starts_with(prefix))
}

impl Demographics {
    pub fn compute(dataset: &Dataset, view: &[&Applicant]) -> Self {
        let (repaid, defaulters) = split_by_target(view);
        let age = |group: &[&Applicant]| mean(group.iter().filter_map(|a| a.derived.age_years));

        let mut children: BTreeMap<i64, usize> = BTreeMap::new();
        for n in view.iter().filter_map(|a| a.children) {
            *children.entry(n as i64).or_default() += 1;
        }

        let mut top_occupations = value_counts(view.iter().filter_map(|a| a.occupation.as_deref()));
        top_occupations.truncate(TOP_OCCUPATIONS);

        let matrix_columns = numeric_columns(
            dataset,
            &[DerivedField::AgeYears.column(), CHILDREN, FAMILY_MEMBERS, TARGET],
        );

        Demographics {
            male_pct: percent(view, |a| gender_is(a, "m", "male")),
            female_pct: percent(view, |a| gender_is(a, "f", "female")),
            avg_age_defaulters: age(&defaulters),
            avg_age_repaid: age(&repaid),
            with_children_pct: percent(view, |a| a.children.is_some_and(|n| n > 0.0)),
            avg_family_size: mean(view.iter().filter_map(|a| a.family_members)),
            married_pct: percent(view, |a| family_status_starts_with(a, "married")),
            single_pct: percent(view, |a| family_status_starts_with(a, "single")),
            higher_education_pct: percent(view, |a| {
                a.education
                    .as_deref()
                    .is_some_and(|e| HIGHER_EDUCATION.contains(&e))
            }),
            with_parents_pct: percent(view, |a| a.housing.as_deref() == Some("With parents")),
            working_pct: percent(view, |a| a.occupation.is_some()),
            avg_employment_years: mean(view.iter().filter_map(|a| a.derived.employment_years)),
            top_occupations,
            housing: value_counts(view.iter().filter_map(|a| a.housing.as_deref())),
            children: children.into_iter().collect(),
            household_correlation: CorrelationMatrix::compute(view, &matrix_columns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{dataset, RowSpec};

    fn demographics(rows: &[RowSpec]) -> Demographics {
        let ds = dataset(rows);
        let view: Vec<&Applicant> = ds.applicants.iter().collect();
        Demographics::compute(&ds, &view)
    }

    #[test]
    fn gender_shares_accept_codes_and_words() {
        let d = demographics(&[
            RowSpec::new(1).gender(Some("M")),
            RowSpec::new(2).gender(Some("female")),
            RowSpec::new(3).gender(Some("F")),
            RowSpec::new(4).gender(Some("XNA")),
        ]);
        assert_eq!(d.male_pct, Some(25.0));
        assert_eq!(d.female_pct, Some(50.0));
    }

    #[test]
    fn household_shares() {
        let d = demographics(&[
            RowSpec::new(1)
                .children(2)
                .family_members(4.0)
                .family_status("Married")
                .housing("With parents"),
            RowSpec::new(2)
                .children(0)
                .family_members(1.0)
                .family_status("Single / not married")
                .education("Secondary / secondary special")
                .occupation(None),
        ]);
        assert_eq!(d.with_children_pct, Some(50.0));
        assert_eq!(d.avg_family_size, Some(2.5));
        assert_eq!(d.married_pct, Some(50.0));
        assert_eq!(d.single_pct, Some(50.0));
        assert_eq!(d.higher_education_pct, Some(50.0));
        assert_eq!(d.with_parents_pct, Some(50.0));
        assert_eq!(d.working_pct, Some(50.0));
        assert_eq!(d.children, vec![(0, 1), (2, 1)]);
    }

    #[test]
    fn age_by_outcome() {
        let d = demographics(&[
            RowSpec::new(1).age(25.0).defaulted(),
            RowSpec::new(2).age(35.0).defaulted(),
            RowSpec::new(3).age(50.0),
        ]);
        assert_eq!(d.avg_age_defaulters, Some(30.0));
        assert_eq!(d.avg_age_repaid, Some(50.0));
        assert_eq!(
            d.household_correlation.labels,
            vec!["AGE_YEARS", "CNT_CHILDREN", "CNT_FAM_MEMBERS", "TARGET"]
        );
        let r = d.household_correlation.get("AGE_YEARS", "TARGET").unwrap();
        assert!(r < 0.0);
    }
}
