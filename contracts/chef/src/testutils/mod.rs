//! In-process stand-ins for the chef's external collaborators.
//!
//! Enabled for this crate's tests and for downstream crates through the
//! `testutils` feature.

mod amm;
mod multi_asset;
mod reentrant_token;

pub use amm::{MockAmm, MockAmmClient};
pub use multi_asset::{MockMultiAsset, MockMultiAssetClient};
pub use reentrant_token::{MockReentrantToken, MockReentrantTokenClient};
