//! # brbm-observers
//!
//! Metric collection for brbm training runs.
//!
//! ```rust
//! use brbm_observers::{History, MetricValue, MetricsSink};
//!
//! let mut history = History::new();
//! history.record(0, "recon accuracy", MetricValue::Scalar(0.875));
//! assert_eq!(history.render(0, None).unwrap(), "step: 0 - recon accuracy: 0.87500");
//! ```

pub mod history;
pub mod observer;

pub use history::*;
pub use observer::*;
