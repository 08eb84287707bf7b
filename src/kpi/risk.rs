use std::collections::BTreeMap;

use super::split_by_target;
use super::stats::{default_rate_by, mean, percent, GroupRate};
use crate::data::model::{Applicant, CategoricalField};

/// Repaid/defaulted counts for one contract type.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractSplit {
    pub contract_type: String,
    pub repaid: usize,
    pub defaulted: usize,
}

/// Target distribution and default rates across segments.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskSegmentation {
    pub total_defaults: usize,
    pub default_rate: Option<f64>,
    pub by_gender: Vec<GroupRate>,
    pub by_education: Vec<GroupRate>,
    pub by_family_status: Vec<GroupRate>,
    pub by_housing: Vec<GroupRate>,
    pub defaulter_avg_income: Option<f64>,
    pub defaulter_avg_credit: Option<f64>,
    pub defaulter_avg_annuity: Option<f64>,
    pub defaulter_avg_employment_years: Option<f64>,
    /// Empty when the dataset has no contract-type column.
    pub by_contract: Vec<ContractSplit>,
}

impl RiskSegmentation {
    pub fn compute(view: &[&Applicant]) -> Self {
        let (_, defaulters) = split_by_target(view);
        let by = |field: CategoricalField| default_rate_by(view, |a| a.category(field));

        let mut contracts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for a in view {
            if let Some(kind) = a.contract_type.as_deref() {
                let entry = contracts.entry(kind).or_default();
                if a.defaulted {
                    entry.1 += 1;
                } else {
                    entry.0 += 1;
                }
            }
        }

        RiskSegmentation {
            total_defaults: defaulters.len(),
            default_rate: percent(view, |a| a.defaulted),
            by_gender: by(CategoricalField::Gender),
            by_education: by(CategoricalField::Education),
            by_family_status: by(CategoricalField::FamilyStatus),
            by_housing: by(CategoricalField::Housing),
            defaulter_avg_income: mean(defaulters.iter().filter_map(|a| a.income)),
            defaulter_avg_credit: mean(defaulters.iter().filter_map(|a| a.credit)),
            defaulter_avg_annuity: mean(defaulters.iter().filter_map(|a| a.annuity)),
            defaulter_avg_employment_years: mean(
                defaulters.iter().filter_map(|a| a.derived.employment_years),
            ),
            by_contract: contracts
                .into_iter()
                .map(|(kind, (repaid, defaulted))| ContractSplit {
                    contract_type: kind.to_string(),
                    repaid,
                    defaulted,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::{derive, CONTRACT_TYPE, EMPLOYMENT_SENTINEL_DAYS};
    use crate::data::fixtures::{dataset, table, RowSpec};
    use crate::data::model::CellValue;
    use crate::kpi::stats::mean_group_rate;

    #[test]
    fn default_rates_by_segment() {
        let ds = dataset(&[
            RowSpec::new(1).gender(Some("F")),
            RowSpec::new(2).gender(Some("F")).defaulted(),
            RowSpec::new(3).gender(Some("M")),
            RowSpec::new(4).gender(Some("M")),
            RowSpec::new(5).gender(None).defaulted(),
        ]);
        let view: Vec<&Applicant> = ds.applicants.iter().collect();
        let r = RiskSegmentation::compute(&view);
        assert_eq!(r.total_defaults, 2);
        assert_eq!(r.default_rate, Some(40.0));
        assert_eq!(r.by_gender.len(), 2);
        assert_eq!(r.by_gender[0].group, "F");
        assert_eq!(r.by_gender[0].default_rate, 50.0);
        assert_eq!(r.by_gender[1].default_rate, 0.0);
        assert_eq!(mean_group_rate(&r.by_gender), Some(25.0));
    }

    #[test]
    fn defaulter_averages_skip_unemployed() {
        let ds = dataset(&[
            RowSpec::new(1).defaulted().employed_days(-730.0).income(100_000.0),
            RowSpec::new(2)
                .defaulted()
                .employed_days(EMPLOYMENT_SENTINEL_DAYS)
                .income(300_000.0),
            RowSpec::new(3).employed_days(-3650.0).income(1_000_000.0),
        ]);
        let view: Vec<&Applicant> = ds.applicants.iter().collect();
        let r = RiskSegmentation::compute(&view);
        assert_eq!(r.defaulter_avg_employment_years, Some(2.0));
        assert_eq!(r.defaulter_avg_income, Some(200_000.0));
    }

    #[test]
    fn contract_type_split() {
        let mut t = table(&[RowSpec::new(1), RowSpec::new(2).defaulted(), RowSpec::new(3)]);
        t.columns.push(CONTRACT_TYPE.to_string());
        t.rows[0].push(CellValue::String("Cash loans".into()));
        t.rows[1].push(CellValue::String("Cash loans".into()));
        t.rows[2].push(CellValue::String("Revolving loans".into()));
        let ds = derive(t).unwrap();
        let view: Vec<&Applicant> = ds.applicants.iter().collect();
        let r = RiskSegmentation::compute(&view);
        assert_eq!(
            r.by_contract,
            vec![
                ContractSplit {
                    contract_type: "Cash loans".into(),
                    repaid: 1,
                    defaulted: 1
                },
                ContractSplit {
                    contract_type: "Revolving loans".into(),
                    repaid: 1,
                    defaulted: 0
                },
            ]
        );
    }
}
