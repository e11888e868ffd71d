//! Types for the Prometheus operator resources created alongside the operator.
//! These mirror the upstream `monitoring.coreos.com/v1` CRDs, restricted to the
//! fields we populate.

pub mod prometheusrules;
pub mod servicemonitors;
