//! Collateral modelling for netting sets under a CSA.
//!
//! [`VariationMarginModel`] steps each scenario path through the margining
//! schedule and returns one [`CollateralAccount`] per sample. Balances are in
//! CSA currency; the netted calculator converts them with scenario FX.

mod account;
mod model;

pub use account::CollateralAccount;
pub use model::{
    credit_support_amount, margin_requirement, CollateralInput, CollateralModel,
    VariationMarginModel,
};
