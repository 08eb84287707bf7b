use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV sniffer produces.
/// NaN never survives loading; it is stored as `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a number, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// RawTable – what a loader hands to the feature deriver
// ---------------------------------------------------------------------------

/// Column-ordered raw records. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

// ---------------------------------------------------------------------------
// Categorical filter dimensions
// ---------------------------------------------------------------------------

/// The categorical columns exposed as sidebar filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoricalField {
    Gender,
    Education,
    FamilyStatus,
    Housing,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 4] = [
        CategoricalField::Gender,
        CategoricalField::Education,
        CategoricalField::FamilyStatus,
        CategoricalField::Housing,
    ];

    /// Source column backing this field.
    pub fn column(self) -> &'static str {
        match self {
            CategoricalField::Gender => "CODE_GENDER",
            CategoricalField::Education => "NAME_EDUCATION_TYPE",
            CategoricalField::FamilyStatus => "NAME_FAMILY_STATUS",
            CategoricalField::Housing => "NAME_HOUSING_TYPE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoricalField::Gender => "Gender",
            CategoricalField::Education => "Education",
            CategoricalField::FamilyStatus => "Family Status",
            CategoricalField::Housing => "Housing Type",
        }
    }
}

// ---------------------------------------------------------------------------
// Derived columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedField {
    AgeYears,
    EmploymentYears,
    DebtToIncome,
    LoanToIncome,
}

impl DerivedField {
    pub const ALL: [DerivedField; 4] = [
        DerivedField::AgeYears,
        DerivedField::EmploymentYears,
        DerivedField::DebtToIncome,
        DerivedField::LoanToIncome,
    ];

    pub fn column(self) -> &'static str {
        match self {
            DerivedField::AgeYears => "AGE_YEARS",
            DerivedField::EmploymentYears => "EMPLOYMENT_YEARS",
            DerivedField::DebtToIncome => "DTI",
            DerivedField::LoanToIncome => "LTI",
        }
    }
}

/// Fields computed once from the raw columns. `None` means missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedFeatures {
    pub age_years: Option<f64>,
    pub employment_years: Option<f64>,
    pub debt_to_income: Option<f64>,
    pub loan_to_income: Option<f64>,
}

impl DerivedFeatures {
    pub fn get(&self, field: DerivedField) -> Option<f64> {
        match field {
            DerivedField::AgeYears => self.age_years,
            DerivedField::EmploymentYears => self.employment_years,
            DerivedField::DebtToIncome => self.debt_to_income,
            DerivedField::LoanToIncome => self.loan_to_income,
        }
    }
}

// ---------------------------------------------------------------------------
// Applicant – one row of the augmented dataset
// ---------------------------------------------------------------------------

/// A single loan applicant with its typed core fields, derived features and
/// the untouched raw cells (for per-column statistics).
#[derive(Debug, Clone, PartialEq)]
pub struct Applicant {
    /// Position in the source file (0-based, header excluded).
    pub row: usize,
    pub id: i64,
    /// `true` when the loan defaulted (TARGET = 1).
    pub defaulted: bool,
    pub gender: Option<String>,
    pub education: Option<String>,
    pub family_status: Option<String>,
    pub housing: Option<String>,
    pub occupation: Option<String>,
    pub contract_type: Option<String>,
    pub income: Option<f64>,
    pub credit: Option<f64>,
    pub annuity: Option<f64>,
    pub goods_price: Option<f64>,
    pub children: Option<f64>,
    pub family_members: Option<f64>,
    pub derived: DerivedFeatures,
    pub cells: Vec<CellValue>,
}

impl Applicant {
    pub fn category(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::Gender => self.gender.as_deref(),
            CategoricalField::Education => self.education.as_deref(),
            CategoricalField::FamilyStatus => self.family_status.as_deref(),
            CategoricalField::Housing => self.housing.as_deref(),
        }
    }

    pub fn numeric(&self, column: &ColumnProfile) -> Option<f64> {
        match column.source {
            ColumnSource::Raw(idx) => self.cells.get(idx).and_then(CellValue::as_f64),
            ColumnSource::Derived(field) => self.derived.get(field),
        }
    }

    pub fn is_missing(&self, column: &ColumnProfile) -> bool {
        match column.source {
            ColumnSource::Raw(idx) => self.cells.get(idx).map_or(true, CellValue::is_null),
            ColumnSource::Derived(field) => self.derived.get(field).is_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// Index into [`Applicant::cells`].
    Raw(usize),
    Derived(DerivedField),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub source: ColumnSource,
}

// ---------------------------------------------------------------------------
// Dataset – the complete augmented dataset
// ---------------------------------------------------------------------------

/// Distinct non-null values of one categorical field, plus how many rows
/// carry no value at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryIndex {
    pub values: BTreeSet<String>,
    pub missing: usize,
}

/// The full derived dataset with pre-computed column and category indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub applicants: Vec<Applicant>,
    /// Raw columns in file order followed by the derived columns.
    pub columns: Vec<ColumnProfile>,
    pub categories: BTreeMap<CategoricalField, CategoryIndex>,
}

impl Dataset {
    /// Assemble the dataset and build its category index.
    pub fn new(applicants: Vec<Applicant>, columns: Vec<ColumnProfile>) -> Self {
        let mut categories: BTreeMap<CategoricalField, CategoryIndex> = CategoricalField::ALL
            .iter()
            .map(|f| (*f, CategoryIndex::default()))
            .collect();

        for applicant in &applicants {
            for field in CategoricalField::ALL {
                let index = categories.entry(field).or_default();
                match applicant.category(field) {
                    Some(v) => {
                        index.values.insert(v.to_string());
                    }
                    None => index.missing += 1,
                }
            }
        }

        Dataset {
            applicants,
            columns,
            categories,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
    }

    /// Distinct non-null values of a categorical field.
    pub fn category_values(&self, field: CategoricalField) -> BTreeSet<String> {
        self.categories
            .get(&field)
            .map(|idx| idx.values.clone())
            .unwrap_or_default()
    }

    /// Number of applicants.
    pub fn len(&self) -> usize {
        self.applicants.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.applicants.is_empty()
    }
}
