//! Selection policies: the plain k-redundancy default lives in
//! [`crate::core::select`]; the risk-stratified and multi-vendor variants
//! live here.

pub use policy_impls::*;
