//! Scenario-based tests for the install pipeline

mod helpers;

mod provisioning;
mod recovery_behavior;
