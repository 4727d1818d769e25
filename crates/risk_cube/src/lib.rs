//! # risk_cube (L2: Storage)
//!
//! Storage and decoding of simulated trade values.
//!
//! This crate provides:
//! - The `ScenarioCube` contract: values indexed by (id, date, sample, depth)
//!   plus a time-zero store
//! - Dense in-memory cubes in single and double precision
//! - A sensitivity cube that only keeps values moving off base
//! - `JointCube`, a borrowed union of several cubes (summing or exclusive)
//! - Aggregation scenario data recorded along the paths
//! - `CubeInterpretation`: default, close-out and MPOR flow reads under a
//!   regular or an MPOR date grid
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             risk_cube (L2)              │
//! ├─────────────────────────────────────────┤
//! │  cube           - ScenarioCube trait    │
//! │  in_memory      - f32 / f64 cubes       │
//! │  sensitivity    - sparse scenario cube  │
//! │  joint          - JointCube             │
//! │  interpretation - regular / MPOR grid   │
//! │  date_grid      - valuation/close-out   │
//! │  scenario_data  - FX, numeraire, ...    │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │             risk_core (L1)              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! Cubes are populated by parallel workers. Cells are atomics, so `set`
//! takes `&self` and writers to disjoint cells never block each other.
//! Each cell must have a single writer; that is the caller's contract.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use risk_cube::{
//!     CubeInterpretation, DoublePrecisionCube, RegularCubeInterpretation, ScenarioCube,
//! };
//!
//! let asof = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let dates = vec![
//!     NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
//! ];
//! let cube = DoublePrecisionCube::new(asof, ["SWAP1"], dates, 2, 2).unwrap();
//! cube.set(5.0, 0, 0, 0, 0).unwrap();
//! cube.set(7.0, 0, 1, 0, 0).unwrap();
//!
//! let interp = RegularCubeInterpretation::new(true);
//! assert_eq!(interp.default_npv(&cube, 0, 0, 0).unwrap(), -5.0);
//! assert_eq!(interp.close_out_npv(&cube, 0, 0, 0).unwrap(), -7.0);
//! assert_eq!(interp.mpor_calendar_days(&cube, 0).unwrap(), 91);
//! ```

#![warn(missing_docs)]

pub mod cube;
pub mod date_grid;
pub mod error;
pub mod in_memory;
pub mod interpretation;
pub mod joint;
pub mod scenario_data;
pub mod sensitivity;

pub use cube::ScenarioCube;
pub use date_grid::DateGrid;
pub use error::{Axis, CubeError};
pub use in_memory::{CubeValue, DoublePrecisionCube, InMemoryCube, SinglePrecisionCube};
pub use interpretation::{
    CubeInterpretation, MporGridCubeInterpretation, RegularCubeInterpretation,
};
pub use joint::{JointCube, JointMode};
pub use scenario_data::{
    AggregationScenarioData, AggregationScenarioDataType, InMemoryAggregationScenarioData,
};
pub use sensitivity::SensitivityCube;
