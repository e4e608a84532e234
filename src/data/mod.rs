/// Data layer: core types, loading, derivation, filtering, and aggregation.
///
/// Pipeline:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → records, detect profile, derive columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Record>, column index, distinct-value domains
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  per-column selections → filtered row indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────────────────┐
///   │ aggregate / correlate  │  KPIs, grouped series, Pearson matrix
///   └───────────────────────┘
/// ```
pub mod aggregate;
pub mod correlate;
pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
pub mod profile;
