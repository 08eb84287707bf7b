//! Hand-built application rows for unit tests.

use super::derive::{self, REQUIRED_COLUMNS};
use super::model::{CellValue, Dataset, RawTable};

/// One raw row in `REQUIRED_COLUMNS` order, with a fluent builder.
#[derive(Debug, Clone)]
pub struct RowSpec {
    pub id: i64,
    pub target: i64,
    pub days_birth: Option<f64>,
    pub days_employed: Option<f64>,
    pub gender: Option<&'static str>,
    pub education: Option<&'static str>,
    pub family_status: Option<&'static str>,
    pub housing: Option<&'static str>,
    pub occupation: Option<&'static str>,
    pub income: Option<f64>,
    pub credit: Option<f64>,
    pub annuity: Option<f64>,
    pub goods_price: Option<f64>,
    pub children: i64,
    pub family_members: f64,
}

impl Default for RowSpec {
    fn default() -> Self {
        RowSpec {
            id: 100_001,
            target: 0,
            days_birth: Some(-365.0 * 40.0),
            days_employed: Some(-365.0 * 5.0),
            gender: Some("F"),
            education: Some("Higher education"),
            family_status: Some("Married"),
            housing: Some("House / apartment"),
            occupation: Some("Laborers"),
            income: Some(150_000.0),
            credit: Some(450_000.0),
            annuity: Some(22_500.0),
            goods_price: Some(400_000.0),
            children: 0,
            family_members: 2.0,
        }
    }
}

fn num(v: Option<f64>) -> CellValue {
    v.map_or(CellValue::Null, CellValue::Float)
}

fn text(v: Option<&str>) -> CellValue {
    v.map_or(CellValue::Null, |s| CellValue::String(s.to_string()))
}

impl RowSpec {
    pub fn new(id: i64) -> Self {
        RowSpec {
            id,
            ..RowSpec::default()
        }
    }

    pub fn defaulted(mut self) -> Self {
        self.target = 1;
        self
    }

    /// Age in whole years; stored as the equivalent negative day offset.
    pub fn age(mut self, years: f64) -> Self {
        self.days_birth = Some(-years * 365.0);
        self
    }

    pub fn employed_days(mut self, days: f64) -> Self {
        self.days_employed = Some(days);
        self
    }

    pub fn gender(mut self, v: Option<&'static str>) -> Self {
        self.gender = v;
        self
    }

    pub fn education(mut self, v: &'static str) -> Self {
        self.education = Some(v);
        self
    }

    pub fn family_status(mut self, v: &'static str) -> Self {
        self.family_status = Some(v);
        self
    }

    pub fn housing(mut self, v: &'static str) -> Self {
        self.housing = Some(v);
        self
    }

    pub fn occupation(mut self, v: Option<&'static str>) -> Self {
        self.occupation = v;
        self
    }

    pub fn income(mut self, v: f64) -> Self {
        self.income = Some(v);
        self
    }

    pub fn credit(mut self, v: f64) -> Self {
        self.credit = Some(v);
        self
    }

    pub fn annuity(mut self, v: f64) -> Self {
        self.annuity = Some(v);
        self
    }

    pub fn children(mut self, n: i64) -> Self {
        self.children = n;
        self
    }

    pub fn family_members(mut self, n: f64) -> Self {
        self.family_members = n;
        self
    }

    pub fn cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::Integer(self.id),
            CellValue::Integer(self.target),
            num(self.days_birth),
            num(self.days_employed),
            text(self.gender),
            text(self.education),
            text(self.family_status),
            text(self.housing),
            text(self.occupation),
            num(self.income),
            num(self.credit),
            num(self.annuity),
            num(self.goods_price),
            CellValue::Integer(self.children),
            CellValue::Float(self.family_members),
        ]
    }
}

pub fn table(rows: &[RowSpec]) -> RawTable {
    RawTable {
        columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: rows.iter().map(RowSpec::cells).collect(),
    }
}

pub fn dataset(rows: &[RowSpec]) -> Dataset {
    derive::derive(table(rows)).expect("fixture rows derive cleanly")
}

/// Position of a required column in fixture tables.
pub fn column(name: &str) -> usize {
    REQUIRED_COLUMNS
        .iter()
        .position(|c| *c == name)
        .expect("fixture column exists")
}
