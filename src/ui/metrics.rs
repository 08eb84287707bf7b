use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{Applicant, ColumnSource, Dataset};
use crate::kpi::affordability::Affordability;
use crate::kpi::demographics::Demographics;
use crate::kpi::drivers::Drivers;
use crate::kpi::overview::Overview;
use crate::kpi::risk::RiskSegmentation;
use crate::kpi::stats::{mean_group_rate, CorrelationMatrix, GroupRate};
use crate::state::AppState;

/// Rows shown in the data preview.
pub const PREVIEW_ROWS: usize = 10;

const MISSING: &str = "n/a";

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Round to an integer and group digits with commas: `1234567.8` → `1,234,568`.
pub fn thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

pub fn count(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), thousands)
}

pub fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.2}%"))
}

pub fn decimal(value: Option<f64>, places: usize) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.places$}"))
}

/// Completed years: truncated, never rounded up. The stored value stays a float.
pub fn whole_years(value: Option<f64>) -> String {
    decimal(value.map(f64::trunc), 0)
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// A grid of labelled headline figures, `per_row` to a row.
fn metric_grid(ui: &mut Ui, id: &str, per_row: usize, metrics: &[(&str, String)]) {
    egui::Grid::new(id)
        .num_columns(per_row)
        .spacing([32.0, 12.0])
        .show(ui, |ui| {
            for (i, (label, value)) in metrics.iter().enumerate() {
                ui.vertical(|ui| {
                    ui.label(RichText::new(*label).small());
                    ui.label(RichText::new(value).strong().size(18.0));
                });
                if (i + 1) % per_row == 0 {
                    ui.end_row();
                }
            }
        });
}

/// A striped table with one header row. Each table needs its own `id`.
fn table(ui: &mut Ui, id: &str, headers: &[&str], rows: &[Vec<String>]) {
    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(80.0), headers.len())
            .header(20.0, |mut header| {
                for h in headers {
                    header.col(|ui| {
                        ui.strong(*h);
                    });
                }
            })
            .body(|mut body| {
                for cells in rows {
                    body.row(18.0, |mut row| {
                        for cell in cells {
                            row.col(|ui| {
                                ui.label(cell);
                            });
                        }
                    });
                }
            });
    });
}

fn section(ui: &mut Ui, title: &str) {
    ui.add_space(12.0);
    ui.heading(title);
    ui.separator();
}

fn counts_table(ui: &mut Ui, id: &str, header: &str, counts: &[(String, usize)]) {
    let rows: Vec<Vec<String>> = counts
        .iter()
        .map(|(value, n)| vec![value.clone(), thousands(*n as f64)])
        .collect();
    table(ui, id, &[header, "Count"], &rows);
}

fn rates_table(ui: &mut Ui, id: &str, header: &str, groups: &[GroupRate]) {
    let rows: Vec<Vec<String>> = groups
        .iter()
        .map(|g| {
            vec![
                g.group.clone(),
                thousands(g.count as f64),
                pct(Some(g.default_rate)),
            ]
        })
        .collect();
    table(ui, id, &[header, "Applicants", "Default rate"], &rows);
}

fn correlation_table(ui: &mut Ui, id: &str, matrix: &CorrelationMatrix) {
    let mut headers = vec![""];
    headers.extend(matrix.labels.iter().map(String::as_str));
    let rows: Vec<Vec<String>> = matrix
        .labels
        .iter()
        .zip(&matrix.cells)
        .map(|(label, cells)| {
            std::iter::once(label.clone())
                .chain(cells.iter().map(|r| decimal(*r, 2)))
                .collect()
        })
        .collect();
    egui::ScrollArea::horizontal().id_salt(id).show(ui, |ui| {
        table(ui, id, &headers, &rows);
    });
}

fn named_values(values: &[(String, f64)], places: usize) -> Vec<Vec<String>> {
    values
        .iter()
        .map(|(name, v)| vec![name.clone(), decimal(Some(*v), places)])
        .collect()
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Landing page: headline figures and a preview of the visible rows.
pub fn home(ui: &mut Ui, state: &AppState) {
    let (Some(dataset), Some(kpis)) = (state.dataset(), &state.kpis) else {
        return;
    };
    let o = &kpis.overview;
    section(ui, "Credit Risk Overview");
    metric_grid(
        ui,
        "home_metrics",
        4,
        &[
            ("Applicants", thousands(o.applicants as f64)),
            ("Default rate", pct(o.default_rate)),
            ("Median age", whole_years(o.median_age)),
            ("Median income", count(o.median_income)),
        ],
    );

    section(ui, "Data preview");
    let preview: Vec<&Applicant> = state
        .visible_rows
        .iter()
        .take(PREVIEW_ROWS)
        .filter_map(|row| dataset.applicants.get(*row))
        .collect();
    if preview.is_empty() {
        ui.label("No applicants match the current filters.");
        return;
    }
    preview_table(ui, dataset, &preview);
}

fn preview_table(ui: &mut Ui, dataset: &Dataset, preview: &[&Applicant]) {
    let headers: Vec<&str> = dataset.columns.iter().map(|c| c.name.as_str()).collect();
    let rows: Vec<Vec<String>> = preview
        .iter()
        .map(|a| {
            dataset
                .columns
                .iter()
                .map(|c| match c.source {
                    ColumnSource::Raw(idx) => {
                        a.cells.get(idx).map(ToString::to_string).unwrap_or_default()
                    }
                    ColumnSource::Derived(field) => decimal(a.derived.get(field), 2),
                })
                .collect()
        })
        .collect();
    egui::ScrollArea::horizontal()
        .id_salt("preview_scroll")
        .show(ui, |ui| table(ui, "preview", &headers, &rows));
}

pub fn overview(ui: &mut Ui, o: &Overview) {
    section(ui, "Overview & Data Quality");
    metric_grid(
        ui,
        "overview_metrics",
        5,
        &[
            ("Applicants", thousands(o.applicants as f64)),
            ("Default rate", pct(o.default_rate)),
            ("Repaid rate", pct(o.repaid_rate)),
            ("Total features", o.total_features.to_string()),
            ("Avg missing per feature", pct(o.avg_missing_pct)),
            ("Numeric features", o.numeric_features.to_string()),
            ("Categorical features", o.categorical_features.to_string()),
            ("Median age (years)", whole_years(o.median_age)),
            ("Median income", count(o.median_income)),
            ("Average credit", count(o.avg_credit)),
        ],
    );

    section(ui, "Target distribution");
    let target = [
        ("Repaid (0)".to_string(), o.repaid),
        ("Defaulted (1)".to_string(), o.defaulted),
    ];
    counts_table(ui, "target_counts", "Outcome", &target);

    section(ui, "Most missing columns");
    let rows: Vec<Vec<String>> = o
        .top_missing
        .iter()
        .map(|(name, p)| vec![name.clone(), pct(Some(*p))])
        .collect();
    table(ui, "top_missing", &["Column", "Missing"], &rows);

    section(ui, "Distributions");
    ui.horizontal_top(|ui| {
        counts_table(ui, "gender_counts", "Gender", &o.gender);
        counts_table(ui, "family_counts", "Family status", &o.family_status);
        counts_table(ui, "education_counts", "Education", &o.education);
    });
}

pub fn risk(ui: &mut Ui, r: &RiskSegmentation) {
    section(ui, "Target & Risk Segmentation");
    metric_grid(
        ui,
        "risk_metrics",
        5,
        &[
            ("Total defaults", thousands(r.total_defaults as f64)),
            ("Default rate", pct(r.default_rate)),
            ("Default rate by gender (avg)", pct(mean_group_rate(&r.by_gender))),
            ("Default rate by education (avg)", pct(mean_group_rate(&r.by_education))),
            ("Default rate by family (avg)", pct(mean_group_rate(&r.by_family_status))),
            ("Default rate by housing (avg)", pct(mean_group_rate(&r.by_housing))),
            ("Avg income of defaulters", count(r.defaulter_avg_income)),
            ("Avg credit of defaulters", count(r.defaulter_avg_credit)),
            ("Avg annuity of defaulters", count(r.defaulter_avg_annuity)),
            (
                "Avg employment of defaulters (years)",
                decimal(r.defaulter_avg_employment_years, 1),
            ),
        ],
    );

    section(ui, "Default rate by segment");
    rates_table(ui, "rate_gender", "Gender", &r.by_gender);
    rates_table(ui, "rate_education", "Education", &r.by_education);
    rates_table(ui, "rate_family", "Family status", &r.by_family_status);
    rates_table(ui, "rate_housing", "Housing", &r.by_housing);

    if !r.by_contract.is_empty() {
        section(ui, "Contract type");
        let rows: Vec<Vec<String>> = r
            .by_contract
            .iter()
            .map(|c| {
                vec![
                    c.contract_type.clone(),
                    thousands(c.repaid as f64),
                    thousands(c.defaulted as f64),
                ]
            })
            .collect();
        table(ui, "contract_split", &["Contract", "Repaid", "Defaulted"], &rows);
    }
}

pub fn demographics(ui: &mut Ui, d: &Demographics) {
    section(ui, "Demographics & Household");
    metric_grid(
        ui,
        "demographic_metrics",
        5,
        &[
            ("Male", pct(d.male_pct)),
            ("Female", pct(d.female_pct)),
            ("Avg age, defaulters", decimal(d.avg_age_defaulters, 1)),
            ("Avg age, repaid", decimal(d.avg_age_repaid, 1)),
            ("With children", pct(d.with_children_pct)),
            ("Avg family size", decimal(d.avg_family_size, 2)),
            ("Married", pct(d.married_pct)),
            ("Single", pct(d.single_pct)),
            ("Higher education", pct(d.higher_education_pct)),
            ("Living with parents", pct(d.with_parents_pct)),
            ("Currently working", pct(d.working_pct)),
            ("Avg employment (years)", decimal(d.avg_employment_years, 1)),
        ],
    );

    section(ui, "Occupations and housing");
    ui.horizontal_top(|ui| {
        counts_table(ui, "occupations", "Occupation", &d.top_occupations);
        counts_table(ui, "housing", "Housing", &d.housing);
    });

    section(ui, "Number of children");
    let children: Vec<(String, usize)> = d
        .children
        .iter()
        .map(|(n, c)| (n.to_string(), *c))
        .collect();
    counts_table(ui, "children", "Children", &children);

    section(ui, "Household correlations");
    correlation_table(ui, "household_corr", &d.household_correlation);
}

pub fn affordability(ui: &mut Ui, a: &Affordability) {
    section(ui, "Financial Health & Affordability");
    metric_grid(
        ui,
        "affordability_metrics",
        5,
        &[
            ("Avg income", count(a.avg_income)),
            ("Median income", count(a.median_income)),
            ("Avg credit", count(a.avg_credit)),
            ("Avg annuity", count(a.avg_annuity)),
            ("Avg goods price", count(a.avg_goods_price)),
            ("Avg debt-to-income", decimal(a.avg_dti, 2)),
            ("Avg loan-to-income", decimal(a.avg_lti, 2)),
            ("Income gap (repaid - default)", count(a.income_gap)),
            ("Credit gap (repaid - default)", count(a.credit_gap)),
            ("High credit (> 1M)", pct(a.high_credit_pct)),
        ],
    );

    section(ui, "Default rate by income bracket");
    let rows: Vec<Vec<String>> = a
        .brackets
        .iter()
        .map(|b| {
            vec![
                b.label.to_string(),
                thousands(b.count as f64),
                pct(b.default_rate),
            ]
        })
        .collect();
    table(ui, "brackets", &["Income", "Applicants", "Default rate"], &rows);

    section(ui, "Financial correlations");
    correlation_table(ui, "financial_corr", &a.financial_correlation);
}

pub fn drivers(ui: &mut Ui, d: &Drivers) {
    section(ui, "Correlations & Drivers");
    let strongest = |v: &Option<(String, f64)>| {
        v.as_ref()
            .map_or_else(|| MISSING.to_string(), |(n, r)| format!("{n} ({r:.2})"))
    };
    let top = |v: &[(String, f64)]| {
        v.first()
            .map_or_else(|| MISSING.to_string(), |(n, r)| format!("{n} ({r:.3})"))
    };
    metric_grid(
        ui,
        "driver_metrics",
        5,
        &[
            ("Top positive", top(&d.top_positive)),
            ("Top negative", top(&d.top_negative)),
            ("Most tied to income", strongest(&d.most_correlated_with_income)),
            ("Most tied to credit", strongest(&d.most_correlated_with_credit)),
            ("Income vs credit", decimal(d.income_credit, 3)),
            ("Age vs target", decimal(d.age_target, 3)),
            ("Employment vs target", decimal(d.employment_target, 3)),
            ("Family size vs target", decimal(d.family_size_target, 3)),
            ("Sum of top |r|", decimal(d.top_abs_sum, 3)),
            ("Features with |r| > 0.5", d.high_correlation_count.to_string()),
        ],
    );

    section(ui, "Correlation with TARGET");
    ui.horizontal_top(|ui| {
        table(ui, "top_positive", &["Positive", "r"], &named_values(&d.top_positive, 3));
        table(ui, "top_negative", &["Negative", "r"], &named_values(&d.top_negative, 3));
    });
    egui::CollapsingHeader::new("All numeric features")
        .id_salt("all_target_corr")
        .default_open(false)
        .show(ui, |ui| {
            let rows = named_values(&d.target_correlations, 4);
            table(ui, "target_corr", &["Feature", "r"], &rows);
        });

    section(ui, "Driver correlations");
    correlation_table(ui, "driver_corr", &d.driver_correlation);
}
