//! Writes a deterministic synthetic `application_train`-shaped dataset.
//!
//! ```text
//! generate-sample [OUTPUT]      # .csv (default) or .parquet / .pq
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const DEFAULT_OUTPUT: &str = "data/application_train.csv";
const ROWS: usize = 5_000;
const FIRST_ID: i64 = 100_002;
const EMPLOYMENT_SENTINEL: i64 = 365_243;

const CONTRACT_TYPES: &[(&str, f64)] = &[("Cash loans", 0.9), ("Revolving loans", 0.1)];
const GENDERS: &[(&str, f64)] = &[("F", 0.65), ("M", 0.35)];
const EDUCATION: &[(&str, f64)] = &[
    ("Secondary / secondary special", 0.71),
    ("Higher education", 0.24),
    ("Incomplete higher", 0.03),
    ("Lower secondary", 0.015),
    ("Academic degree", 0.005),
];
const FAMILY_STATUS: &[(&str, f64)] = &[
    ("Married", 0.64),
    ("Single / not married", 0.15),
    ("Civil marriage", 0.10),
    ("Separated", 0.06),
    ("Widow", 0.05),
];
const HOUSING: &[(&str, f64)] = &[
    ("House / apartment", 0.89),
    ("With parents", 0.05),
    ("Municipal apartment", 0.035),
    ("Rented apartment", 0.015),
    ("Office apartment", 0.01),
];
const OCCUPATIONS: &[(&str, f64)] = &[
    ("Laborers", 0.26),
    ("Sales staff", 0.15),
    ("Core staff", 0.13),
    ("Managers", 0.10),
    ("Drivers", 0.09),
    ("High skill tech staff", 0.05),
    ("Accountants", 0.05),
    ("Medicine staff", 0.04),
    ("Security staff", 0.03),
    ("Cooking staff", 0.03),
    ("Cleaning staff", 0.02),
    ("Private service staff", 0.02),
    ("Low-skill Laborers", 0.01),
    ("Secretaries", 0.01),
    ("Waiters/barmen staff", 0.01),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = self.state[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Weighted choice; weights need not sum to one.
    fn pick<'a>(&mut self, choices: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = choices.iter().map(|(_, w)| w).sum();
        let mut roll = self.next_f64() * total;
        for (value, weight) in choices {
            if roll < *weight {
                return *value;
            }
            roll -= weight;
        }
        choices.last().map_or("", |(value, _)| *value)
    }
}

/// One synthetic application. Field names are the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct Application {
    sk_id_curr: i64,
    target: i64,
    name_contract_type: String,
    code_gender: String,
    flag_own_car: String,
    cnt_children: i64,
    amt_income_total: f64,
    amt_credit: f64,
    amt_annuity: Option<f64>,
    amt_goods_price: Option<f64>,
    name_education_type: String,
    name_family_status: String,
    name_housing_type: String,
    days_birth: i64,
    days_employed: i64,
    occupation_type: Option<String>,
    cnt_fam_members: Option<f64>,
    ext_source_1: Option<f64>,
}

fn round_to(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}

fn generate(rows: usize, seed: u64) -> Vec<Application> {
    let mut rng = SimpleRng::new(seed);
    (0..rows)
        .map(|i| {
            let age = rng.uniform(21.0, 69.0);
            let pensioner = age > 55.0 && rng.chance(0.7);
            let days_employed = if pensioner {
                EMPLOYMENT_SENTINEL
            } else {
                let max_years = (age - 18.0).min(40.0);
                -(rng.uniform(0.1, max_years) * 365.0) as i64
            };

            let income = if rng.chance(0.005) {
                0.0
            } else {
                round_to(rng.gauss(11.9, 0.5).exp(), 2_250.0).max(25_650.0)
            };
            let credit = round_to(income.max(50_000.0) * rng.uniform(1.0, 8.0), 500.0);
            let annuity =
                (!rng.chance(0.002)).then(|| round_to(credit * rng.uniform(0.03, 0.08), 1.5));
            let goods_price = (!rng.chance(0.001)).then(|| round_to(credit * 0.9, 4_500.0));

            let children = match rng.next_f64() {
                r if r < 0.70 => 0,
                r if r < 0.90 => 1,
                r if r < 0.98 => 2,
                _ => 3,
            };
            let family_status = rng.pick(FAMILY_STATUS);
            let partnered = matches!(family_status, "Married" | "Civil marriage");
            let family_members = (!rng.chance(0.0005))
                .then_some((children + if partnered { 2 } else { 1 }) as f64);

            let occupation = if pensioner || rng.chance(0.2) {
                None
            } else {
                Some(rng.pick(OCCUPATIONS).to_string())
            };
            let ext_source = (!rng.chance(0.56)).then(|| rng.uniform(0.01, 0.95));

            // younger, lower-score and more leveraged applicants default more often
            let leverage = if income > 0.0 { credit / income } else { 8.0 };
            let logit = -2.6 - 0.03 * (age - 40.0)
                + 0.12 * (leverage - 4.0)
                + ext_source.map_or(0.0, |s| -2.0 * (s - 0.5));
            let defaulted = rng.chance(1.0 / (1.0 + (-logit).exp()));

            Application {
                sk_id_curr: FIRST_ID + i as i64,
                target: i64::from(defaulted),
                name_contract_type: rng.pick(CONTRACT_TYPES).to_string(),
                code_gender: rng.pick(GENDERS).to_string(),
                flag_own_car: (if rng.chance(0.34) { "Y" } else { "N" }).to_string(),
                cnt_children: children,
                amt_income_total: income,
                amt_credit: credit,
                amt_annuity: annuity,
                amt_goods_price: goods_price,
                name_education_type: rng.pick(EDUCATION).to_string(),
                name_family_status: family_status.to_string(),
                name_housing_type: rng.pick(HOUSING).to_string(),
                days_birth: -(age * 365.25) as i64,
                days_employed,
                occupation_type: occupation,
                cnt_fam_members: family_members,
                ext_source_1: ext_source,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_csv(path: &Path, rows: &[Application]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row).context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Application]) -> Result<()> {
    fn ints(rows: &[Application], f: impl Fn(&Application) -> i64) -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    }
    fn floats(rows: &[Application], f: impl Fn(&Application) -> Option<f64>) -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    }
    fn strings(rows: &[Application], f: impl Fn(&Application) -> Option<&str>) -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    }

    let columns: Vec<(&str, DataType, ArrayRef)> = vec![
        ("SK_ID_CURR", DataType::Int64, ints(rows, |r| r.sk_id_curr)),
        ("TARGET", DataType::Int64, ints(rows, |r| r.target)),
        (
            "NAME_CONTRACT_TYPE",
            DataType::Utf8,
            strings(rows, |r| Some(r.name_contract_type.as_str())),
        ),
        ("CODE_GENDER", DataType::Utf8, strings(rows, |r| Some(r.code_gender.as_str()))),
        ("FLAG_OWN_CAR", DataType::Utf8, strings(rows, |r| Some(r.flag_own_car.as_str()))),
        ("CNT_CHILDREN", DataType::Int64, ints(rows, |r| r.cnt_children)),
        (
            "AMT_INCOME_TOTAL",
            DataType::Float64,
            floats(rows, |r| Some(r.amt_income_total)),
        ),
        ("AMT_CREDIT", DataType::Float64, floats(rows, |r| Some(r.amt_credit))),
        ("AMT_ANNUITY", DataType::Float64, floats(rows, |r| r.amt_annuity)),
        ("AMT_GOODS_PRICE", DataType::Float64, floats(rows, |r| r.amt_goods_price)),
        (
            "NAME_EDUCATION_TYPE",
            DataType::Utf8,
            strings(rows, |r| Some(r.name_education_type.as_str())),
        ),
        (
            "NAME_FAMILY_STATUS",
            DataType::Utf8,
            strings(rows, |r| Some(r.name_family_status.as_str())),
        ),
        (
            "NAME_HOUSING_TYPE",
            DataType::Utf8,
            strings(rows, |r| Some(r.name_housing_type.as_str())),
        ),
        ("DAYS_BIRTH", DataType::Int64, ints(rows, |r| r.days_birth)),
        ("DAYS_EMPLOYED", DataType::Int64, ints(rows, |r| r.days_employed)),
        (
            "OCCUPATION_TYPE",
            DataType::Utf8,
            strings(rows, |r| r.occupation_type.as_deref()),
        ),
        ("CNT_FAM_MEMBERS", DataType::Float64, floats(rows, |r| r.cnt_fam_members)),
        ("EXT_SOURCE_1", DataType::Float64, floats(rows, |r| r.ext_source_1)),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, ty, _)| Field::new(*name, ty.clone(), true))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, _, array)| array).collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays)
        .context("Failed to create RecordBatch")?;

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn write(path: &Path, rows: &[Application]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "csv" => write_csv(path, rows),
        "parquet" | "pq" => write_parquet(path, rows),
        other => bail!("Unsupported output extension: .{other}"),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let rows = generate(ROWS, 42);
    write(&output, &rows)?;

    let defaults = rows.iter().filter(|r| r.target == 1).count();
    log::info!("{defaults} of {} synthetic applicants defaulted", rows.len());
    println!("Wrote {} applications to {}", rows.len(), output.display());
    Ok(())
}
