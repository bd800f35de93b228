/// Data layer: core types, loading, and significance filtering.
///
/// Architecture:
/// ```text
///  .t / .dat / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → LabeledTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ DataContainer  │  Table(LabeledTable) | Matrix(PositionalMatrix)
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  variance > threshold → reduced copy + SignificanceMask
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
