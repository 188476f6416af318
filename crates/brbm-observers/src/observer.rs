use crate::history::MetricValue;
use brbm_core::error::Result;

/// Interface for objects that collect diagnostics while training is running.
///
/// The training loop records a handful of named values at each logging step;
/// a sink stores them and can later render one step as a single line.
pub trait MetricsSink {
    /// Record `value` under `key` for training step `step`.
    ///
    /// Recording the same key twice at one step overwrites the earlier value.
    fn record(&mut self, step: usize, key: &str, value: MetricValue);

    /// Render one step as a human-readable line.
    ///
    /// # Arguments
    ///
    /// * `step` - The training step to render
    /// * `keys` - Subset and order of metrics to show. `None` shows every metric
    ///   recorded at `step` in insertion order.
    ///
    /// # Errors
    ///
    /// Fails when a requested key was never recorded at `step`.
    fn render(&self, step: usize, keys: Option<&[&str]>) -> Result<String>;
}
