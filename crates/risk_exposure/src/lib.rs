//! # risk_exposure (L3: Aggregation)
//!
//! Exposure profiles computed from populated NPV cubes.
//!
//! This crate provides:
//! - Portfolio, netting set and CSA definitions (`portfolio`)
//! - Variation margin collateral paths keyed by `CalculationType`
//!   (`collateral`)
//! - Trade EPE/ENE/PFE and Basel EE profiles plus netting set value
//!   matrices (`exposure::ExposureCalculator`)
//! - Collateralised netting set exposure, expected collateral and marginal
//!   allocation back to trades (`exposure::NettedExposureCalculator`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           risk_exposure (L3)            │
//! ├─────────────────────────────────────────┤
//! │  portfolio  - trades, netting sets, CSA │
//! │  collateral - accounts, VM model        │
//! │  exposure   - trade / netted profiles   │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │  risk_cube (L2)     risk_core (L1)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Flow
//!
//! 1. Populate a trade NPV cube (ids = trade ids).
//! 2. `ExposureCalculator::build` reduces it to trade profiles and sums
//!    trades into netting set default / close-out matrices.
//! 3. `NettedExposureCalculator::build` subtracts collateral balances,
//!    reduces netting set exposure and optionally writes allocated exposure
//!    into the trade exposure cube.
//!
//! Netting sets are independent and processed in parallel with rayon.

#![warn(missing_docs)]

pub mod collateral;
pub mod error;
pub mod exposure;
pub mod portfolio;

pub use collateral::{CollateralAccount, CollateralModel, VariationMarginModel};
pub use error::ExposureError;
pub use exposure::{
    cube_interpretation, mean_exposure, ExposureCalculator, ExposureIndex, ExposureProfile,
    ExposureSettings, NettedExposureCalculator, NettedExposureResults, TradeExposureResults,
    EXPOSURE_CUBE_DEPTH,
};
pub use portfolio::{CsaDetails, NettingSetDefinition, Portfolio, PortfolioBuilder, Trade};
