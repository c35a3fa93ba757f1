//! Compiler tests: whole documents in, process graphs and diagnostics out.

pub mod tests_activities;
pub mod tests_event_subprocesses;
pub mod tests_extensions;
pub mod tests_flows;
pub mod tests_gateways;
pub mod tests_multi_instance;
