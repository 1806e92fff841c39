//! Sales transaction aggregation engine.
//!
//! Load a transaction file with [`data::loader::load_file`], narrow it with
//! [`data::filter::apply_filters`], and reduce it with the functions in
//! [`metrics`] or all at once through [`report::build_report`].

pub mod data;
pub mod error;
pub mod metrics;
pub mod report;
pub mod state;

pub use data::model::{Dimension, Measure, OrderStatus, Transaction, TransactionSet};
pub use error::{LoadError, MetricsError};
pub use report::{DashboardReport, ReportOptions, build_report};
pub use state::DashboardState;
