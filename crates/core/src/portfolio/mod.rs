//! Portfolio module - lots, positions, valuation, range metrics, real-asset
//! analytics and the net-worth timeline.

pub mod lots;
pub mod net_worth;
pub mod positions;
pub mod range;
pub mod real_estate;
pub mod valuation;

pub use lots::*;
pub use net_worth::*;
pub use positions::*;
pub use range::*;
pub use real_estate::*;
pub use valuation::*;
