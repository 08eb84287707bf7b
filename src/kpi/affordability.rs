use super::stats::{mean, median, percent, CorrelationMatrix};
use super::{numeric_columns, split_by_target};
use crate::data::derive::{ANNUITY, CREDIT, INCOME, TARGET};
use crate::data::model::{Applicant, Dataset, DerivedField};

/// Credit amount above which a loan counts as high credit.
pub const HIGH_CREDIT: f64 = 1_000_000.0;

/// Right-closed income brackets `(lower, upper]`; the last is unbounded.
pub const INCOME_BRACKETS: [(&str, f64, f64); 6] = [
    ("<100K", 0.0, 100_000.0),
    ("100K-200K", 100_000.0, 200_000.0),
    ("200K-400K", 200_000.0, 400_000.0),
    ("400K-600K", 400_000.0, 600_000.0),
    ("600K-1M", 600_000.0, 1_000_000.0),
    (">1M", 1_000_000.0, f64::INFINITY),
];

#[derive(Debug, Clone, PartialEq)]
pub struct BracketRate {
    pub label: &'static str,
    pub count: usize,
    /// `None` for an empty bracket.
    pub default_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Affordability {
    pub avg_income: Option<f64>,
    pub median_income: Option<f64>,
    pub avg_credit: Option<f64>,
    pub avg_annuity: Option<f64>,
    pub avg_goods_price: Option<f64>,
    pub avg_dti: Option<f64>,
    pub avg_lti: Option<f64>,
    /// Repaid minus defaulted average income.
    pub income_gap: Option<f64>,
    /// Repaid minus defaulted average credit.
    pub credit_gap: Option<f64>,
    pub high_credit_pct: Option<f64>,
    pub brackets: Vec<BracketRate>,
    pub financial_correlation: CorrelationMatrix,
}

fn gap(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

fn avg(group: &[&Applicant], f: impl Fn(&Applicant) -> Option<f64>) -> Option<f64> {
    mean(group.iter().filter_map(|a| f(*a)))
}

impl Affordability {
    pub fn compute(dataset: &Dataset, view: &[&Applicant]) -> Self {
        let (repaid, defaulters) = split_by_target(view);
        let income = |a: &Applicant| a.income;
        let credit = |a: &Applicant| a.credit;

        let brackets: Vec<BracketRate> = INCOME_BRACKETS
            .iter()
            .map(|&(label, lower, upper)| {
                let members: Vec<&Applicant> = view
                    .iter()
                    .copied()
                    .filter(|a| a.income.is_some_and(|v| v > lower && v <= upper))
                    .collect();
                BracketRate {
                    label,
                    count: members.len(),
                    default_rate: percent(&members, |a| a.defaulted),
                }
            })
            .collect();

        let matrix_columns = numeric_columns(
            dataset,
            &[
                INCOME,
                CREDIT,
                ANNUITY,
                DerivedField::DebtToIncome.column(),
                DerivedField::LoanToIncome.column(),
                TARGET,
            ],
        );

        Affordability {
            avg_income: avg(view, income),
            median_income: median(view.iter().filter_map(|a| a.income)),
            avg_credit: avg(view, credit),
            avg_annuity: avg(view, |a| a.annuity),
            avg_goods_price: avg(view, |a| a.goods_price),
            avg_dti: avg(view, |a| a.derived.debt_to_income),
            avg_lti: avg(view, |a| a.derived.loan_to_income),
            income_gap: gap(avg(&repaid, income), avg(&defaulters, income)),
            credit_gap: gap(avg(&repaid, credit), avg(&defaulters, credit)),
            high_credit_pct: percent(view, |a| a.credit.is_some_and(|c| c > HIGH_CREDIT)),
            brackets,
            financial_correlation: CorrelationMatrix::compute(view, &matrix_columns),
        }
    }
}
