//! `Geoplace` is a redundant geographic coverage optimizer. Given a
//! population distribution over demand points and a catalog of candidate
//! hosting sites, it selects sites that maximize population served under a
//! latency-radius coverage rule, a k-redundancy requirement, and a
//! cost-efficiency score, then allocates finite per-site throughput against
//! the reached users.

#![warn(unreachable_pub, missing_docs)]

pub mod core;

pub mod policy;
