/// Data layer: loading, feature derivation, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  typed core fields + AGE_YEARS, EMPLOYMENT_YEARS, DTI, LTI
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Applicant>, column profiles, category index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterConstraints → Vec<&Applicant>
///   └──────────┘
/// ```

pub mod derive;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;

#[cfg(test)]
pub(crate) mod fixtures;
