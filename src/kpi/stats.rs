//! Small descriptive-statistics helpers over `f64` samples.
//!
//! Callers pass only present values; missing data never reaches these
//! functions.

use std::collections::BTreeMap;

use crate::data::model::{Applicant, ColumnProfile};

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut s: Vec<f64> = values.into_iter().collect();
    if s.is_empty() {
        return None;
    }
    s.sort_by(f64::total_cmp);
    let mid = s.len() / 2;
    if s.len() % 2 == 0 {
        Some((s[mid - 1] + s[mid]) / 2.0)
    } else {
        Some(s[mid])
    }
}

/// Percentage of `items` satisfying `pred`; `None` for an empty slice.
pub fn percent<T>(items: &[T], pred: impl Fn(&T) -> bool) -> Option<f64> {
    if items.is_empty() {
        return None;
    }
    let hits = items.iter().filter(|i| pred(*i)).count();
    Some(hits as f64 / items.len() as f64 * 100.0)
}

/// Pearson correlation. `None` with fewer than two pairs or zero variance.
pub fn pearson(pairs: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = pairs.into_iter().collect();
    if pairs.len() < 2 {
        return None;
    }
    let mx = mean(pairs.iter().map(|p| p.0))?;
    let my = mean(pairs.iter().map(|p| p.1))?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

/// Correlation of two columns over rows where both are present.
pub fn column_correlation(
    view: &[&Applicant],
    a: &ColumnProfile,
    b: &ColumnProfile,
) -> Option<f64> {
    pearson(
        view.iter()
            .filter_map(|r| Some((r.numeric(a)?, r.numeric(b)?))),
    )
}

/// Frequency table, most frequent first; ties break alphabetically.
pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

// ---------------------------------------------------------------------------
// Grouped default rates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRate {
    pub group: String,
    pub count: usize,
    /// Share of defaulted applicants in the group, in percent.
    pub default_rate: f64,
}

/// Default rate per group, sorted by group label. Rows without a key are
/// dropped.
pub fn default_rate_by<'a>(
    view: &[&'a Applicant],
    key: impl Fn(&'a Applicant) -> Option<&'a str>,
) -> Vec<GroupRate> {
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for a in view {
        if let Some(k) = key(*a) {
            let entry = groups.entry(k).or_default();
            entry.0 += 1;
            entry.1 += usize::from(a.defaulted);
        }
    }
    groups
        .into_iter()
        .map(|(group, (count, defaults))| GroupRate {
            group: group.to_string(),
            count,
            default_rate: defaults as f64 / count as f64 * 100.0,
        })
        .collect()
}

/// Unweighted mean of the group rates.
pub fn mean_group_rate(groups: &[GroupRate]) -> Option<f64> {
    mean(groups.iter().map(|g| g.default_rate))
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, `labels.len()` squared; `None` where undefined.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn compute(view: &[&Applicant], columns: &[&ColumnProfile]) -> Self {
        let cells: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|a| {
                columns
                    .iter()
                    .map(|b| column_correlation(view, a, b))
                    .collect()
            })
            .collect();
        CorrelationMatrix {
            labels: columns.iter().map(|c| c.name.clone()).collect(),
            cells,
        }
    }

    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.labels.iter().position(|l| l == row)?;
        let c = self.labels.iter().position(|l| l == col)?;
        self.cells[r][c]
    }
}
