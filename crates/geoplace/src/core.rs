//! Core geoplace data structures, traits, and routines. The most common entry
//! point is [run::optimize()], which turns a [specification](Spec) into a
//! [selection of sites](select::Selection) with running coverage metrics.

pub use geoplace_core::*;
