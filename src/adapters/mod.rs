//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod datalink_reader;
pub mod datalink_source;
pub mod file_config_adapter;
pub mod paper_broker;
pub mod plot_csv_adapter;
#[cfg(feature = "remote")]
pub mod remote_adapter;
