//! Terminal presentation of configuration and run results

pub mod display;
