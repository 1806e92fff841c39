/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → TransactionSet (dates parsed, sales coerced)
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ TransactionSet │  Vec<Transaction>, distinct values per dimension
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  region / product / payment selections → new TransactionSet
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
