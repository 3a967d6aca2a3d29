//! spotctl library
//!
//! Spot price analysis and a small EC2 console. The `pricing` module is pure
//! and has no AWS dependency; everything that talks to EC2 goes through the
//! `provider::SpotProvider` trait, implemented by `aws::Ec2Provider`.

pub mod aws;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod instances;
pub mod output;
pub mod prices;
pub mod pricing;
pub mod provider;
pub mod requests;
pub mod retry;
pub mod utils;
pub mod validation;
pub mod volumes;
pub mod zones;

pub use error::{Result, SpotctlError};
pub use pricing::{recommend, InvalidInputError, PriceHistory, Recommendation};
pub use provider::SpotProvider;
