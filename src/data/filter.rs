use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::error::DataError;
use super::model::{Applicant, CategoricalField, Dataset};

// ---------------------------------------------------------------------------
// Inclusive numeric range
// ---------------------------------------------------------------------------

/// A closed interval `[lower, upper]`. Construction rejects unordered or
/// non-finite bounds, so `apply` never has to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    lower: f64,
    upper: f64,
}

impl NumericRange {
    const ZERO: NumericRange = NumericRange {
        lower: 0.0,
        upper: 0.0,
    };

    pub fn new(field: &'static str, lower: f64, upper: f64) -> Result<Self, DataError> {
        if !lower.is_finite() || !upper.is_finite() || lower > upper {
            return Err(DataError::InvalidRange {
                field,
                lower,
                upper,
            });
        }
        Ok(NumericRange { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Inclusive at both ends; a missing value is never contained.
    pub fn contains(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| v >= self.lower && v <= self.upper)
    }
}

// ---------------------------------------------------------------------------
// Bounds: full-dataset extents of the range filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub age: NumericRange,
    pub income: NumericRange,
}

impl Bounds {
    /// Min/max of derived age and raw income over every record given.
    /// `None` when either column has no value at all.
    pub fn of<'a>(records: impl IntoIterator<Item = &'a Applicant>) -> Option<Bounds> {
        let mut age = Extent::default();
        let mut income = Extent::default();
        for a in records {
            age.push(a.derived.age_years);
            income.push(a.income);
        }
        Some(Bounds {
            age: age.range(AGE)?,
            income: income.range(INCOME)?,
        })
    }
}

const AGE: &str = "age";
const INCOME: &str = "income";

#[derive(Default)]
struct Extent(Option<(f64, f64)>);

impl Extent {
    fn push(&mut self, value: Option<f64>) {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            return;
        };
        self.0 = Some(match self.0 {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        });
    }

    fn range(&self, field: &'static str) -> Option<NumericRange> {
        let (lo, hi) = self.0?;
        NumericRange::new(field, lo, hi).ok()
    }
}

// ---------------------------------------------------------------------------
// Constraint set
// ---------------------------------------------------------------------------

/// The active filter selection, owned by the caller and passed to [`apply`].
///
/// A categorical field with no entry in `selections` behaves exactly like an
/// empty selection: nothing matches.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConstraints {
    selections: BTreeMap<CategoricalField, BTreeSet<String>>,
    age: NumericRange,
    income: NumericRange,
}

impl FilterConstraints {
    pub fn new(age: NumericRange, income: NumericRange) -> Self {
        FilterConstraints {
            selections: BTreeMap::new(),
            age,
            income,
        }
    }

    /// Every distinct value selected and the full observed ranges.
    ///
    /// An empty dataset has no bounds; it gets degenerate `[0, 0]` ranges,
    /// which is harmless since there is nothing to match.
    pub fn full(dataset: &Dataset) -> Self {
        let (age, income) = match Bounds::of(&dataset.applicants) {
            Some(b) => (b.age, b.income),
            None => (NumericRange::ZERO, NumericRange::ZERO),
        };
        let mut constraints = FilterConstraints::new(age, income);
        for field in CategoricalField::ALL {
            constraints.select(field, dataset.category_values(field));
        }
        constraints
    }

    pub fn select(&mut self, field: CategoricalField, values: BTreeSet<String>) {
        self.selections.insert(field, values);
    }

    pub fn selection(&self, field: CategoricalField) -> Option<&BTreeSet<String>> {
        self.selections.get(&field)
    }

    /// Add or remove a single value from a field's selection.
    pub fn toggle(&mut self, field: CategoricalField, value: &str) {
        let selected = self.selections.entry(field).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    pub fn set_age(&mut self, lower: f64, upper: f64) -> Result<(), DataError> {
        self.age = NumericRange::new(AGE, lower, upper)?;
        Ok(())
    }

    pub fn set_income(&mut self, lower: f64, upper: f64) -> Result<(), DataError> {
        self.income = NumericRange::new(INCOME, lower, upper)?;
        Ok(())
    }

    pub fn age(&self) -> NumericRange {
        self.age
    }

    pub fn income(&self) -> NumericRange {
        self.income
    }

    /// Whether one applicant satisfies every constraint (logical AND).
    pub fn matches(&self, applicant: &Applicant) -> bool {
        CategoricalField::ALL.iter().all(|field| {
            match (self.selections.get(field), applicant.category(*field)) {
                (Some(selected), Some(value)) => selected.contains(value),
                _ => false,
            }
        }) && self.age.contains(applicant.derived.age_years)
            && self.income.contains(applicant.income)
    }

    /// Serializable readout of the current constraint values.
    pub fn snapshot(&self) -> FilterSnapshot {
        let selected = |field: CategoricalField| -> Vec<String> {
            self.selections
                .get(&field)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default()
        };
        FilterSnapshot {
            gender: selected(CategoricalField::Gender),
            education: selected(CategoricalField::Education),
            family_status: selected(CategoricalField::FamilyStatus),
            housing: selected(CategoricalField::Housing),
            age_range: (self.age.lower, self.age.upper),
            income_range: (self.income.lower, self.income.upper),
        }
    }
}

/// Plain view of a [`FilterConstraints`] for display and JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSnapshot {
    pub gender: Vec<String>,
    pub education: Vec<String>,
    pub family_status: Vec<String>,
    pub housing: Vec<String>,
    pub age_range: (f64, f64),
    pub income_range: (f64, f64),
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Return the applicants that pass all constraints, in input order.
///
/// Accepts any iterator of references so the result can itself be filtered
/// again. The input is never modified.
pub fn apply<'a>(
    records: impl IntoIterator<Item = &'a Applicant>,
    constraints: &FilterConstraints,
) -> Vec<&'a Applicant> {
    records
        .into_iter()
        .filter(|a| constraints.matches(a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{dataset, RowSpec};
    use proptest::prelude::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn two_applicants() -> Dataset {
        dataset(&[
            RowSpec::new(1)
                .gender(Some("F"))
                .age(35.0)
                .income(50_000.0)
                .education("Higher"),
            RowSpec::new(2)
                .gender(Some("M"))
                .age(50.0)
                .income(120_000.0)
                .education("Secondary"),
        ])
    }

    fn ids(view: &[&Applicant]) -> Vec<i64> {
        view.iter().map(|a| a.id).collect()
    }

    #[test]
    fn bounds_cover_the_full_dataset() {
        let ds = two_applicants();
        let b = Bounds::of(&ds.applicants).unwrap();
        assert_eq!((b.age.lower(), b.age.upper()), (35.0, 50.0));
        assert_eq!((b.income.lower(), b.income.upper()), (50_000.0, 120_000.0));
    }

    #[test]
    fn bounds_of_empty_records_is_none() {
        let none: Vec<Applicant> = Vec::new();
        assert!(Bounds::of(&none).is_none());
    }

    #[test]
    fn invalid_range_is_rejected_at_construction() {
        assert!(matches!(
            NumericRange::new("age", 60.0, 18.0),
            Err(DataError::InvalidRange { field: "age", .. })
        ));
        assert!(NumericRange::new("income", f64::NAN, 1.0).is_err());

        let ds = two_applicants();
        let mut c = FilterConstraints::full(&ds);
        let before = c.clone();
        assert!(c.set_income(10.0, 5.0).is_err());
        assert_eq!(c, before);
    }

    #[test]
    fn selects_matching_record_only() {
        let ds = two_applicants();
        let mut c = FilterConstraints::full(&ds);
        c.select(CategoricalField::Gender, set(&["F"]));
        c.select(CategoricalField::Education, set(&["Higher", "Secondary"]));
        c.set_age(18.0, 60.0).unwrap();
        c.set_income(0.0, 100_000.0).unwrap();
        assert_eq!(ids(&apply(&ds.applicants, &c)), vec![1]);
    }

    #[test]
    fn empty_selection_matches_nothing() {
        let ds = two_applicants();
        let mut c = FilterConstraints::full(&ds);
        c.select(CategoricalField::Gender, BTreeSet::new());
        assert!(apply(&ds.applicants, &c).is_empty());
    }

    #[test]
    fn absent_selection_matches_nothing() {
        let ds = two_applicants();
        let b = Bounds::of(&ds.applicants).unwrap();
        let c = FilterConstraints::new(b.age, b.income);
        assert!(apply(&ds.applicants, &c).is_empty());
    }

    #[test]
    fn income_range_is_inclusive_at_bounds_only() {
        let ds = dataset(&[RowSpec::new(1).income(50_000.0)]);
        let mut c = FilterConstraints::full(&ds);
        c.set_income(0.0, 0.0).unwrap();
        assert!(apply(&ds.applicants, &c).is_empty());

        c.set_income(50_000.0, 50_000.0).unwrap();
        assert_eq!(apply(&ds.applicants, &c).len(), 1);
    }

    #[test]
    fn null_category_never_matches() {
        let ds = dataset(&[RowSpec::new(1), RowSpec::new(2).gender(None)]);
        let c = FilterConstraints::full(&ds);
        assert_eq!(ids(&apply(&ds.applicants, &c)), vec![1]);
    }

    #[test]
    fn missing_age_never_matches() {
        let mut spec = RowSpec::new(2);
        spec.days_birth = None;
        let ds = dataset(&[RowSpec::new(1), spec]);
        let c = FilterConstraints::full(&ds);
        assert_eq!(ids(&apply(&ds.applicants, &c)), vec![1]);
    }

    #[test]
    fn toggle_adds_and_removes() {
        let ds = two_applicants();
        let mut c = FilterConstraints::full(&ds);
        c.toggle(CategoricalField::Gender, "M");
        assert_eq!(c.selection(CategoricalField::Gender), Some(&set(&["F"])));
        c.toggle(CategoricalField::Gender, "M");
        assert_eq!(c.selection(CategoricalField::Gender), Some(&set(&["F", "M"])));
    }

    #[test]
    fn snapshot_serializes_current_values() {
        let ds = two_applicants();
        let c = FilterConstraints::full(&ds);
        let json = serde_json::to_value(c.snapshot()).unwrap();
        assert_eq!(json["gender"], serde_json::json!(["F", "M"]));
        assert_eq!(json["age_range"], serde_json::json!([35.0, 50.0]));
        assert_eq!(json["income_range"], serde_json::json!([50_000.0, 120_000.0]));
    }

    // -- property tests ---------------------------------------------------

    const GENDERS: [&str; 2] = ["F", "M"];
    const EDUCATION: [&str; 3] = ["Higher education", "Secondary", "Incomplete higher"];
    const HOUSING: [&str; 2] = ["House / apartment", "With parents"];

    fn arb_dataset() -> impl Strategy<Value = Dataset> {
        prop::collection::vec(
            (0usize..2, 0usize..3, 0usize..2, 20.0f64..70.0, 0.0f64..500_000.0),
            1..60,
        )
        .prop_map(|rows| {
            let specs: Vec<RowSpec> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (g, e, h, age, income))| {
                    RowSpec::new(i as i64)
                        .gender(Some(GENDERS[g]))
                        .education(EDUCATION[e])
                        .housing(HOUSING[h])
                        .age(age)
                        .income(income)
                })
                .collect();
            dataset(&specs)
        })
    }

    /// Narrowed constraints: drop one education value, clip both ranges.
    fn narrowed(ds: &Dataset, drop_edu: usize, age_cut: f64, income_cut: f64) -> FilterConstraints {
        let mut c = FilterConstraints::full(ds);
        c.toggle(CategoricalField::Education, EDUCATION[drop_edu]);
        let (a, i) = (c.age(), c.income());
        c.set_age(a.lower() + (a.upper() - a.lower()) * age_cut, a.upper())
            .unwrap();
        c.set_income(i.lower(), i.upper() - (i.upper() - i.lower()) * income_cut)
            .unwrap();
        c
    }

    proptest! {
        #[test]
        fn full_bounds_is_identity(ds in arb_dataset()) {
            let c = FilterConstraints::full(&ds);
            let view = apply(&ds.applicants, &c);
            prop_assert_eq!(view.len(), ds.len());
            prop_assert!(view.iter().zip(&ds.applicants).all(|(a, b)| std::ptr::eq(*a, b)));
        }

        #[test]
        fn apply_is_idempotent(
            ds in arb_dataset(),
            drop_edu in 0usize..3,
            age_cut in 0.0f64..1.0,
            income_cut in 0.0f64..1.0,
        ) {
            let c = narrowed(&ds, drop_edu, age_cut, income_cut);
            let once = apply(&ds.applicants, &c);
            let twice = apply(once.iter().copied(), &c);
            prop_assert_eq!(ids(&once), ids(&twice));
        }

        #[test]
        fn narrowing_never_grows_the_result(
            ds in arb_dataset(),
            drop_edu in 0usize..3,
            age_cut in 0.0f64..1.0,
            income_cut in 0.0f64..1.0,
        ) {
            let wide = apply(&ds.applicants, &FilterConstraints::full(&ds));
            let narrow = apply(&ds.applicants, &narrowed(&ds, drop_edu, age_cut, income_cut));
            prop_assert!(narrow.len() <= wide.len());
            prop_assert!(narrow.iter().all(|a| wide.iter().any(|w| w.id == a.id)));
        }

        #[test]
        fn empty_gender_selection_is_always_empty(ds in arb_dataset()) {
            let mut c = FilterConstraints::full(&ds);
            c.select(CategoricalField::Gender, BTreeSet::new());
            prop_assert!(apply(&ds.applicants, &c).is_empty());
        }
    }
}
