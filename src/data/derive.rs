use super::error::DataError;
use super::model::{
    Applicant, CellValue, ColumnKind, ColumnProfile, ColumnSource, Dataset, DerivedFeatures,
    DerivedField, RawTable,
};

/// `DAYS_EMPLOYED` placeholder for applicants who are not currently employed.
pub const EMPLOYMENT_SENTINEL_DAYS: f64 = 365243.0;

const DAYS_PER_YEAR: f64 = 365.0;

pub const ID: &str = "SK_ID_CURR";
pub const TARGET: &str = "TARGET";
pub const DAYS_BIRTH: &str = "DAYS_BIRTH";
pub const DAYS_EMPLOYED: &str = "DAYS_EMPLOYED";
pub const GENDER: &str = "CODE_GENDER";
pub const EDUCATION: &str = "NAME_EDUCATION_TYPE";
pub const FAMILY_STATUS: &str = "NAME_FAMILY_STATUS";
pub const HOUSING: &str = "NAME_HOUSING_TYPE";
pub const OCCUPATION: &str = "OCCUPATION_TYPE";
pub const CONTRACT_TYPE: &str = "NAME_CONTRACT_TYPE";
pub const INCOME: &str = "AMT_INCOME_TOTAL";
pub const CREDIT: &str = "AMT_CREDIT";
pub const ANNUITY: &str = "AMT_ANNUITY";
pub const GOODS_PRICE: &str = "AMT_GOODS_PRICE";
pub const CHILDREN: &str = "CNT_CHILDREN";
pub const FAMILY_MEMBERS: &str = "CNT_FAM_MEMBERS";

/// Columns every input must carry.
pub const REQUIRED_COLUMNS: [&str; 15] = [
    ID,
    TARGET,
    DAYS_BIRTH,
    DAYS_EMPLOYED,
    GENDER,
    EDUCATION,
    FAMILY_STATUS,
    HOUSING,
    OCCUPATION,
    INCOME,
    CREDIT,
    ANNUITY,
    GOODS_PRICE,
    CHILDREN,
    FAMILY_MEMBERS,
];

// ---------------------------------------------------------------------------
// Column lookup
// ---------------------------------------------------------------------------

/// Resolved positions of the columns the deriver reads.
struct Layout {
    id: usize,
    target: usize,
    days_birth: usize,
    days_employed: usize,
    gender: usize,
    education: usize,
    family_status: usize,
    housing: usize,
    occupation: usize,
    contract_type: Option<usize>,
    income: usize,
    credit: usize,
    annuity: usize,
    goods_price: usize,
    children: usize,
    family_members: usize,
}

impl Layout {
    fn resolve(table: &RawTable) -> Result<Self, DataError> {
        let req = |name: &str| {
            table.column_index(name).ok_or_else(|| DataError::MissingField {
                column: name.to_string(),
            })
        };
        Ok(Layout {
            id: req(ID)?,
            target: req(TARGET)?,
            days_birth: req(DAYS_BIRTH)?,
            days_employed: req(DAYS_EMPLOYED)?,
            gender: req(GENDER)?,
            education: req(EDUCATION)?,
            family_status: req(FAMILY_STATUS)?,
            housing: req(HOUSING)?,
            occupation: req(OCCUPATION)?,
            contract_type: table.column_index(CONTRACT_TYPE),
            income: req(INCOME)?,
            credit: req(CREDIT)?,
            annuity: req(ANNUITY)?,
            goods_price: req(GOODS_PRICE)?,
            children: req(CHILDREN)?,
            family_members: req(FAMILY_MEMBERS)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Turn a raw table into the augmented [`Dataset`].
///
/// Fails fast on the first absent required column or malformed required cell;
/// no partial dataset is ever returned. The table is consumed: each row's
/// cells move into its applicant rather than being copied.
pub fn derive(table: RawTable) -> Result<Dataset, DataError> {
    let layout = Layout::resolve(&table)?;
    let profiles = profile_columns(&table);

    let RawTable { columns, rows } = table;
    let applicants = rows
        .into_iter()
        .enumerate()
        .map(|(row, cells)| derive_row(&columns, &layout, row, cells))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Dataset::new(applicants, profiles))
}

fn derive_row(
    columns: &[String],
    layout: &Layout,
    row: usize,
    cells: Vec<CellValue>,
) -> Result<Applicant, DataError> {
    let cell = |idx: usize| cells.get(idx).unwrap_or(&CellValue::Null);
    let number = |idx: usize| numeric_cell(&columns[idx], row, cell(idx));

    let days_birth = number(layout.days_birth)?;
    let days_employed = number(layout.days_employed)?;
    let income = number(layout.income)?;
    let credit = number(layout.credit)?;
    let annuity = number(layout.annuity)?;
    let goods_price = number(layout.goods_price)?;
    let children = number(layout.children)?;
    let family_members = number(layout.family_members)?;
    let id = id_cell(&columns[layout.id], row, cell(layout.id))?;
    let defaulted = target_cell(&columns[layout.target], row, cell(layout.target))?;

    let derived = DerivedFeatures {
        age_years: days_birth.map(days_to_years),
        employment_years: employment_years(days_employed),
        debt_to_income: ratio(annuity, income),
        loan_to_income: ratio(credit, income),
    };

    let gender = text_cell(cell(layout.gender));
    let education = text_cell(cell(layout.education));
    let family_status = text_cell(cell(layout.family_status));
    let housing = text_cell(cell(layout.housing));
    let occupation = text_cell(cell(layout.occupation));
    let contract_type = layout.contract_type.and_then(|idx| text_cell(cell(idx)));

    Ok(Applicant {
        row,
        id,
        defaulted,
        gender,
        education,
        family_status,
        housing,
        occupation,
        contract_type,
        income,
        credit,
        annuity,
        goods_price,
        children,
        family_members,
        derived,
        cells,
    })
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// Day offsets are negative for the past, so the sign flips.
fn days_to_years(days: f64) -> f64 {
    -days / DAYS_PER_YEAR
}

fn employment_years(days_employed: Option<f64>) -> Option<f64> {
    days_employed
        .filter(|d| *d != EMPLOYMENT_SENTINEL_DAYS)
        .map(days_to_years)
}

/// `None` when either side is missing or the denominator is zero.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d).filter(|r| r.is_finite()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

fn invalid(column: &str, row: usize, value: &CellValue) -> DataError {
    DataError::InvalidValue {
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}

fn numeric_cell(column: &str, row: usize, value: &CellValue) -> Result<Option<f64>, DataError> {
    match value {
        CellValue::Null => Ok(None),
        CellValue::Integer(_) | CellValue::Float(_) => Ok(value.as_f64()),
        other => Err(invalid(column, row, other)),
    }
}

fn id_cell(column: &str, row: usize, value: &CellValue) -> Result<i64, DataError> {
    match value {
        CellValue::Integer(i) => Ok(*i),
        CellValue::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
        other => Err(invalid(column, row, other)),
    }
}

fn target_cell(column: &str, row: usize, value: &CellValue) -> Result<bool, DataError> {
    match value.as_f64() {
        Some(v) if v == 0.0 => Ok(false),
        Some(v) if v == 1.0 => Ok(true),
        _ => Err(invalid(column, row, value)),
    }
}

/// Categorical cells: numbers are kept as their text form, blanks are missing.
fn text_cell(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Null => None,
        CellValue::String(s) if s.trim().is_empty() => None,
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Column profiling
// ---------------------------------------------------------------------------

/// A raw column is numeric when every non-null cell is a number.
fn profile_columns(table: &RawTable) -> Vec<ColumnProfile> {
    let raw = table.columns.iter().enumerate().map(|(idx, name)| {
        let numeric = table.rows.iter().all(|cells| {
            matches!(
                cells.get(idx),
                None | Some(CellValue::Null | CellValue::Integer(_) | CellValue::Float(_))
            )
        });
        ColumnProfile {
            name: name.clone(),
            kind: if numeric {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            },
            source: ColumnSource::Raw(idx),
        }
    });

    let derived = DerivedField::ALL.iter().map(|field| ColumnProfile {
        name: field.column().to_string(),
        kind: ColumnKind::Numeric,
        source: ColumnSource::Derived(*field),
    });

    raw.chain(derived).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{column, dataset, table, RowSpec};
    use crate::data::model::CategoricalField;
    use proptest::prelude::*;

    #[test]
    fn derives_age_employment_and_ratios() {
        let ds = dataset(&[RowSpec::new(1)
            .age(40.0)
            .employed_days(-730.0)
            .income(200_000.0)
            .credit(500_000.0)
            .annuity(25_000.0)]);
        let d = ds.applicants[0].derived;
        assert_eq!(d.age_years, Some(40.0));
        assert_eq!(d.employment_years, Some(2.0));
        assert_eq!(d.debt_to_income, Some(0.125));
        assert_eq!(d.loan_to_income, Some(2.5));
    }

    #[test]
    fn age_is_not_rounded() {
        let mut spec = RowSpec::new(1);
        spec.days_birth = Some(-12_000.0);
        let ds = dataset(&[spec]);
        let age = ds.applicants[0].derived.age_years.unwrap();
        assert!((age - 12_000.0 / 365.0).abs() < 1e-12);
        assert!(age.fract() != 0.0);
    }

    #[test]
    fn employment_sentinel_is_missing() {
        let ds = dataset(&[RowSpec::new(1).employed_days(EMPLOYMENT_SENTINEL_DAYS)]);
        assert_eq!(ds.applicants[0].derived.employment_years, None);
    }

    #[test]
    fn zero_income_makes_ratios_missing() {
        let ds = dataset(&[RowSpec::new(1).defaulted().income(0.0)]);
        let d = ds.applicants[0].derived;
        assert_eq!(d.debt_to_income, None);
        assert_eq!(d.loan_to_income, None);
        assert!(ds.applicants[0].defaulted);
    }

    #[test]
    fn missing_birth_offset_leaves_age_missing() {
        let mut spec = RowSpec::new(1);
        spec.days_birth = None;
        let ds = dataset(&[spec]);
        assert_eq!(ds.applicants[0].derived.age_years, None);
    }

    #[test]
    fn missing_column_fails_fast() {
        let mut t = table(&[RowSpec::new(1)]);
        let idx = column(ANNUITY);
        t.columns.remove(idx);
        for r in &mut t.rows {
            r.remove(idx);
        }
        assert_eq!(
            derive(t),
            Err(DataError::MissingField {
                column: ANNUITY.to_string()
            })
        );
    }

    #[test]
    fn contract_type_is_optional() {
        let mut t = table(&[RowSpec::new(1)]);
        assert!(derive(t.clone()).unwrap().applicants[0].contract_type.is_none());

        t.columns.push(CONTRACT_TYPE.to_string());
        t.rows[0].push(CellValue::String("Cash loans".into()));
        let ds = derive(t).unwrap();
        assert_eq!(ds.applicants[0].contract_type.as_deref(), Some("Cash loans"));
        assert_eq!(ds.column(CONTRACT_TYPE).unwrap().kind, ColumnKind::Categorical);
    }

    #[test]
    fn malformed_numeric_cell_aborts_derivation() {
        let mut t = table(&[RowSpec::new(1), RowSpec::new(2)]);
        t.rows[1][column(INCOME)] = CellValue::String("lots".into());
        match derive(t) {
            Err(DataError::InvalidValue { column, row, .. }) => {
                assert_eq!(column, INCOME);
                assert_eq!(row, 1);
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn target_must_be_binary() {
        let mut t = table(&[RowSpec::new(1)]);
        t.rows[0][column(TARGET)] = CellValue::Integer(2);
        assert!(matches!(derive(t), Err(DataError::InvalidValue { .. })));
    }

    #[test]
    fn null_categories_are_indexed_as_missing() {
        let ds = dataset(&[RowSpec::new(1), RowSpec::new(2).gender(None)]);
        let idx = &ds.categories[&CategoricalField::Gender];
        assert_eq!(idx.missing, 1);
        assert_eq!(idx.values.len(), 1);
        assert_eq!(ds.applicants[1].gender, None);
    }

    #[test]
    fn derived_columns_are_profiled_as_numeric() {
        let ds = dataset(&[RowSpec::new(1)]);
        assert_eq!(ds.columns.len(), REQUIRED_COLUMNS.len() + 4);
        assert_eq!(ds.column("DTI").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(ds.column(GENDER).unwrap().kind, ColumnKind::Categorical);
        assert_eq!(ds.column(INCOME).unwrap().kind, ColumnKind::Numeric);
    }

    proptest! {
        #[test]
        fn derive_is_deterministic(
            rows in prop::collection::vec(
                (
                    -30_000.0f64..-6_000.0,
                    prop_oneof![Just(EMPLOYMENT_SENTINEL_DAYS), -15_000.0f64..0.0],
                    prop_oneof![Just(0.0f64), 25_000.0f64..1_000_000.0],
                    0.0f64..2_000_000.0,
                ),
                0..40,
            )
        ) {
            let specs: Vec<RowSpec> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (birth, employed, income, credit))| {
                    let mut spec = RowSpec::new(i as i64)
                        .employed_days(employed)
                        .income(income)
                        .credit(credit)
                        .annuity(credit / 20.0);
                    spec.days_birth = Some(birth);
                    spec
                })
                .collect();
            let t = table(&specs);
            let first = derive(t.clone()).unwrap();
            let second = derive(t.clone()).unwrap();
            prop_assert_eq!(&first, &second);
            // each applicant carries its source row unchanged
            for (a, raw) in first.applicants.iter().zip(&t.rows) {
                prop_assert_eq!(&a.cells, raw);
            }
            for a in &first.applicants {
                if let Some(years) = a.derived.employment_years {
                    prop_assert!(years >= 0.0);
                }
                if a.income == Some(0.0) {
                    prop_assert!(a.derived.debt_to_income.is_none());
                    prop_assert!(a.derived.loan_to_income.is_none());
                }
            }
        }
    }
}
