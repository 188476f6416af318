//! Append-only training history keyed by step.

use crate::observer::MetricsSink;
use brbm_core::error::{BrbmError, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;

/// A recorded metric: either a scalar or a pre-formatted string.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Scalar(f64),
    Text(String),
}

impl MetricValue {
    /// Reduce a single-element tensor to [`MetricValue::Scalar`].
    ///
    /// Tensors holding more (or fewer) than one element are rejected rather
    /// than silently averaged or truncated.
    pub fn from_tensor<B: Backend, const D: usize>(key: &str, tensor: Tensor<B, D>) -> Result<Self> {
        let n: usize = tensor.dims().iter().product();
        if n != 1 {
            return Err(BrbmError::UnsupportedMetric {
                key: key.to_string(),
                reason: format!("expected a scalar tensor, got shape {:?}", tensor.dims()),
            });
        }
        let value: f64 = tensor.into_scalar().elem();
        Ok(MetricValue::Scalar(value))
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Scalar(v)
    }
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Scalar(f64::from(v))
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Scalar(v) => write!(f, "{v:.5}"),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

/// In-memory [`MetricsSink`].
///
/// Steps are kept in ascending order; metrics within a step keep the order
/// they were first recorded in.
#[derive(Debug, Clone, Default)]
pub struct History {
    logs: BTreeMap<usize, IndexMap<String, MetricValue>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up one recorded value.
    pub fn get(&self, step: usize, key: &str) -> Option<&MetricValue> {
        self.logs.get(&step).and_then(|m| m.get(key))
    }

    /// All metrics recorded at `step`, in insertion order.
    pub fn step(&self, step: usize) -> Option<&IndexMap<String, MetricValue>> {
        self.logs.get(&step)
    }

    /// Steps that have at least one metric, ascending.
    pub fn steps(&self) -> impl Iterator<Item = usize> + '_ {
        self.logs.keys().copied()
    }

    pub fn latest_step(&self) -> Option<usize> {
        self.logs.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

impl MetricsSink for History {
    fn record(&mut self, step: usize, key: &str, value: MetricValue) {
        self.logs
            .entry(step)
            .or_default()
            .insert(key.to_string(), value);
    }

    fn render(&self, step: usize, keys: Option<&[&str]>) -> Result<String> {
        let empty = IndexMap::new();
        let entries = self.logs.get(&step).unwrap_or(&empty);

        let mut aspects = vec![format!("step: {step}")];
        match keys {
            Some(keys) => {
                for &key in keys {
                    let value = entries.get(key).ok_or_else(|| BrbmError::MissingMetric {
                        step,
                        key: key.to_string(),
                    })?;
                    aspects.push(format!("{key}: {value}"));
                }
            }
            None => {
                for (key, value) in entries {
                    aspects.push(format!("{key}: {value}"));
                }
            }
        }
        Ok(aspects.join(" - "))
    }
}
