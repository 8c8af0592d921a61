/// Data layer: parsing, per-segment analysis, and export.
///
/// Architecture:
/// ```text
///      .par
///       │
///       ▼
///   ┌──────────┐
///   │  parser   │  tag blocks → filtered records → per-segment samples
///   └──────────┘
///       │
///       ▼
///   ┌───────────────────┐
///   │ analysis / peaks   │  half-cycle split, peak detection,
///   └───────────────────┘  log transform, Tafel branch split
///       │
///       ▼
///   ┌──────────┐
///   │  ParFile  │  all raw + derived arrays, per segment
///   └──────────┘
///       │
///       ▼
///   ┌──────────┐
///   │  export   │  cross-file CSV / JSON aggregation
///   └──────────┘
/// ```
pub mod analysis;
pub mod export;
pub mod model;
pub mod parser;
pub mod peaks;
