/// Data layer: tract records, loading, filtering and statistics.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────────┐
///   │ loader/cache  │  parse file once per path → Arc<Dataset>
///   └──────────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │    Dataset    │  Vec<TractRecord>, state → counties, income bounds
///   └──────────────┘
///        │  Selection (state, county, income range)
///        ▼
///   ┌──────────────┐
///   │    filter     │  matching indices + aggregates, or Empty
///   └──────────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │    stats      │  describe() table handed to the assistant
///   └──────────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
