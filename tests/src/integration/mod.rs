//! Integration scenarios.

pub mod dispatch_flows;
pub mod wait_scenarios;
