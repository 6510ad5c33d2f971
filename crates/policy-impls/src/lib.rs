//! This crate contains selection policies beyond plain k-redundancy: a
//! risk-stratified tier balance and a multi-vendor diversity gate.

#![warn(unreachable_pub, missing_debug_implementations, missing_docs)]

pub mod risk;
pub mod vendor;

pub use risk::RiskSplit;
pub use vendor::VendorDiversity;
