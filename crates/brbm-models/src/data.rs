//! In-memory binary dataset and its batch stream.

use brbm_core::backend::to_host;
use brbm_core::error::{BrbmError, Result};
use brbm_core::stats::column_means;
use brbm_samplers::RngKey;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Rows of 0/1 values, stored row-major on the host.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryDataset {
    width: usize,
    data: Vec<f32>,
}

impl BinaryDataset {
    /// Wrap row-major `data` of rows `width` wide.
    ///
    /// Every value must be exactly 0.0 or 1.0.
    pub fn new(data: Vec<f32>, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(BrbmError::InvalidArgument("dataset width must be positive".into()));
        }
        if data.len() % width != 0 {
            return Err(BrbmError::InvalidArgument(format!(
                "{} values do not split into rows of width {width}",
                data.len()
            )));
        }
        if let Some(pos) = data.iter().position(|&x| x != 0.0 && x != 1.0) {
            return Err(BrbmError::InvalidArgument(format!(
                "dataset value {} at row {} is not binary",
                data[pos],
                pos / width
            )));
        }
        Ok(BinaryDataset { width, data })
    }

    pub fn from_tensor<B: Backend>(tensor: Tensor<B, 2>) -> Result<Self> {
        let [_, width] = tensor.dims();
        Self::new(to_host(tensor)?, width)
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.width)?;
        self.data.get(start..start + self.width)
    }

    /// Per-column fraction of ones.
    pub fn mean_activation(&self) -> Vec<f64> {
        column_means(&self.data, self.len(), self.width)
    }

    /// The first `n` rows (or all of them if there are fewer).
    pub fn head(&self, n: usize) -> BinaryDataset {
        let rows = n.min(self.len());
        BinaryDataset {
            width: self.width,
            data: self.data[..rows * self.width].to_vec(),
        }
    }

    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data(
            TensorData::new(self.data.clone(), [self.len(), self.width]),
            device,
        )
    }

    /// Number of whole batches [`batches`](Self::batches) will yield.
    pub fn num_batches(&self, batch_size: usize, epochs: usize) -> usize {
        if batch_size == 0 {
            return 0;
        }
        self.len() * epochs / batch_size
    }

    /// Stream `epochs` passes over the rows in batches of `batch_size`.
    ///
    /// Each pass is shuffled through a buffer of `shuffle_buffer` rows: the
    /// buffer starts with the first rows, each draw takes a uniformly chosen
    /// buffered row and refills its slot with the next unread row. A buffer at
    /// least as large as the dataset gives a uniform permutation per pass; a
    /// buffer of one keeps the stored order.
    ///
    /// Passes are concatenated before batching, so a batch may straddle two
    /// passes. A trailing partial batch is dropped, unlike streaming batchers
    /// that emit a final short batch, so `len * epochs` rows yield
    /// [`num_batches`](Self::num_batches) batches rounded down and up to
    /// `batch_size - 1` rows of the last pass go unused.
    pub fn batches<B: Backend>(
        &self,
        batch_size: usize,
        epochs: usize,
        shuffle_buffer: usize,
        key: RngKey,
        device: &B::Device,
    ) -> Result<Batches<'_, B>> {
        if batch_size == 0 || shuffle_buffer == 0 {
            return Err(BrbmError::InvalidArgument(format!(
                "batch_size and shuffle_buffer must be positive, got {batch_size} and {shuffle_buffer}"
            )));
        }
        if self.is_empty() {
            return Err(BrbmError::InvalidArgument("cannot batch an empty dataset".into()));
        }
        Ok(Batches {
            dataset: self,
            device: device.clone(),
            batch_size,
            remaining: self.num_batches(batch_size, epochs),
            order: ShuffleOrder::new(self.len(), shuffle_buffer, key.split(epochs)),
        })
    }
}

/// Index stream for a sequence of buffered-shuffle passes.
#[derive(Debug)]
struct ShuffleOrder {
    len: usize,
    capacity: usize,
    epoch_keys: std::vec::IntoIter<RngKey>,
    rng: Option<ChaCha8Rng>,
    buffer: Vec<usize>,
    next_unread: usize,
}

impl ShuffleOrder {
    fn new(len: usize, capacity: usize, epoch_keys: Vec<RngKey>) -> Self {
        ShuffleOrder {
            len,
            capacity,
            epoch_keys: epoch_keys.into_iter(),
            rng: None,
            buffer: Vec::new(),
            next_unread: 0,
        }
    }

    fn start_epoch(&mut self) -> bool {
        let Some(key) = self.epoch_keys.next() else {
            return false;
        };
        let fill = self.capacity.min(self.len);
        self.rng = Some(key.rng());
        self.buffer = (0..fill).collect();
        self.next_unread = fill;
        true
    }
}

impl Iterator for ShuffleOrder {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.buffer.is_empty() && !self.start_epoch() {
            return None;
        }
        let rng = self.rng.as_mut()?;
        let slot = rng.gen_range(0..self.buffer.len());
        if self.next_unread < self.len {
            let picked = std::mem::replace(&mut self.buffer[slot], self.next_unread);
            self.next_unread += 1;
            Some(picked)
        } else {
            Some(self.buffer.swap_remove(slot))
        }
    }
}

/// Iterator over `[batch_size, width]` tensors. See [`BinaryDataset::batches`].
pub struct Batches<'a, B: Backend> {
    dataset: &'a BinaryDataset,
    device: B::Device,
    batch_size: usize,
    remaining: usize,
    order: ShuffleOrder,
}

impl<B: Backend> Iterator for Batches<'_, B> {
    type Item = Tensor<B, 2>;

    fn next(&mut self) -> Option<Tensor<B, 2>> {
        if self.remaining == 0 {
            return None;
        }
        let width = self.dataset.width;
        let mut values = Vec::with_capacity(self.batch_size * width);
        for _ in 0..self.batch_size {
            let index = self.order.next()?;
            values.extend_from_slice(self.dataset.row(index)?);
        }
        self.remaining -= 1;
        Some(Tensor::from_data(
            TensorData::new(values, [self.batch_size, width]),
            &self.device,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<B: Backend> ExactSizeIterator for Batches<'_, B> {}
