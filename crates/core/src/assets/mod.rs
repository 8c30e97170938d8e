//! Assets module - category model and synonym normalization.

mod assets_model;

#[cfg(test)]
mod assets_model_tests;

pub use assets_model::{AssetCategory, AssetGroup};
