//! Docker container utilization alerting and synthetic load injection.
//!
//! The monitor turns raw cumulative counters into CPU and memory
//! percentages and alerts when either crosses its threshold. The load
//! injector probes each container for `stress-ng` and falls back to a
//! python workload when it is missing.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod interface;
pub mod ports;
