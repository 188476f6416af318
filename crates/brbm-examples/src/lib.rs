//! # brbm-examples utilities
//!
//! Data loading and small helpers shared by the brbm examples.
//!
//! MNIST can be supplied either as the raw IDX file
//! (`train-images-idx3-ubyte`, uncompressed) or as a 2D `.npy` array
//! (`mnist_train.npy`, one flattened image per row). IDX images are
//! box-downsampled to `image_side x image_side` before binarizing.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use brbm_core::error::{BrbmError, Result};
use brbm_models::BinaryDataset;
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;

/// File name of the MNIST training images in IDX format.
pub const MNIST_IDX_FILE: &str = "train-images-idx3-ubyte";
/// File name of a pre-flattened MNIST array.
pub const MNIST_NPY_FILE: &str = "mnist_train.npy";

const IDX_IMAGES_MAGIC: u32 = 2051;

/// Pixels at or above this intensity (in `[0, 1]`) become 1.
pub const BINARIZE_THRESHOLD: f32 = 0.5;

fn data_error(path: &Path, reason: impl Into<String>) -> BrbmError {
    BrbmError::Data {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Load whichever MNIST file `data_dir` contains, IDX first.
pub fn load_mnist(data_dir: &Path, image_side: usize) -> Result<BinaryDataset> {
    let idx = data_dir.join(MNIST_IDX_FILE);
    if idx.exists() {
        return load_mnist_idx(&idx, image_side);
    }
    let npy = data_dir.join(MNIST_NPY_FILE);
    if npy.exists() {
        return load_npy(&npy);
    }
    Err(data_error(
        data_dir,
        format!("neither {MNIST_IDX_FILE} nor {MNIST_NPY_FILE} found"),
    ))
}

/// Read an IDX3 image file, downsample each image to `image_side` squared
/// pixels and binarize.
pub fn load_mnist_idx(path: &Path, image_side: usize) -> Result<BinaryDataset> {
    let bytes = fs::read(path)?;
    if bytes.len() < 16 {
        return Err(data_error(path, "truncated IDX header"));
    }
    let header = |i: usize| u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    let magic = header(0);
    if magic != IDX_IMAGES_MAGIC {
        return Err(data_error(
            path,
            format!("bad IDX magic {magic}, expected {IDX_IMAGES_MAGIC}"),
        ));
    }
    let (count, rows, cols) = (header(4) as usize, header(8) as usize, header(12) as usize);
    if image_side == 0 || image_side > rows || image_side > cols {
        return Err(data_error(
            path,
            format!("cannot downsample {rows}x{cols} images to {image_side}x{image_side}"),
        ));
    }
    let pixels = &bytes[16..];
    let expected = count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(cols))
        .ok_or_else(|| data_error(path, format!("{count} images of {rows}x{cols} overflow usize")))?;
    if pixels.len() != expected {
        return Err(data_error(
            path,
            format!(
                "expected {expected} pixel bytes for {count} images, found {}",
                pixels.len()
            ),
        ));
    }

    let mut data = Vec::with_capacity(count * image_side * image_side);
    for image in pixels.chunks_exact(rows * cols) {
        data.extend(downsample(image, rows, cols, image_side));
    }
    tracing::info!(images = count, rows, cols, image_side, "Loaded MNIST IDX");
    BinaryDataset::new(data, image_side * image_side)
}

/// Average `rows x cols` byte pixels over `side x side` boxes and binarize.
fn downsample(image: &[u8], rows: usize, cols: usize, side: usize) -> impl Iterator<Item = f32> + '_ {
    (0..side * side).map(move |cell| {
        let (ty, tx) = (cell / side, cell % side);
        let (r0, r1) = (ty * rows / side, (ty + 1) * rows / side);
        let (c0, c1) = (tx * cols / side, (tx + 1) * cols / side);

        let mut sum = 0u32;
        for r in r0..r1 {
            for c in c0..c1 {
                sum += u32::from(image[r * cols + c]);
            }
        }
        let mean = sum as f32 / ((r1 - r0) * (c1 - c0)) as f32 / 255.0;
        binarize(mean)
    })
}

fn binarize(x: f32) -> f32 {
    if x >= BINARIZE_THRESHOLD {
        1.0
    } else {
        0.0
    }
}

/// Load a 2D `.npy` array of pixel intensities in `[0, 1]` and binarize.
///
/// Accepts f32, f64, u8 (scaled by 1/255) and bool arrays.
pub fn load_npy(path: &Path) -> Result<BinaryDataset> {
    let array = read_npy_f32(path)?;
    let (rows, width) = array.dim();
    let data: Vec<f32> = array.iter().map(|&x| binarize(x)).collect();
    tracing::info!(rows, width, path = %path.display(), "Loaded npy dataset");
    BinaryDataset::new(data, width)
}

fn read_npy_f32(path: &Path) -> Result<Array2<f32>> {
    if let Ok(arr) = Array2::<f32>::read_npy(File::open(path)?) {
        return Ok(arr);
    }
    if let Ok(arr) = Array2::<f64>::read_npy(File::open(path)?) {
        return Ok(arr.mapv(|x| x as f32));
    }
    if let Ok(arr) = Array2::<u8>::read_npy(File::open(path)?) {
        return Ok(arr.mapv(|x| f32::from(x) / 255.0));
    }
    if let Ok(arr) = Array2::<bool>::read_npy(File::open(path)?) {
        return Ok(arr.mapv(|x| if x { 1.0 } else { 0.0 }));
    }
    Err(data_error(path, "not a 2D f32, f64, u8 or bool array"))
}

/// `copies` rows of `pattern`.
pub fn repeated_pattern(pattern: &[f32], copies: usize) -> Result<BinaryDataset> {
    let data = pattern.iter().copied().cycle().take(pattern.len() * copies).collect();
    BinaryDataset::new(data, pattern.len())
}

/// Render a flattened square binary image with `#` for on pixels.
pub fn render_ascii(pixels: &[f32], side: usize) -> String {
    pixels
        .chunks(side.max(1))
        .map(|row| row.iter().map(|&p| if p >= 0.5 { '#' } else { '.' }).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Candidate MNIST directories: the configured one, then `./data/mnist`.
pub fn mnist_search_paths(configured: &Path) -> Vec<PathBuf> {
    vec![configured.to_path_buf(), PathBuf::from("data").join("mnist")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_npy::WriteNpyExt;

    fn write_idx(path: &Path, images: &[Vec<u8>], rows: u32, cols: u32) {
        let mut bytes = Vec::new();
        for v in [IDX_IMAGES_MAGIC, images.len() as u32, rows, cols] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        for image in images {
            bytes.extend_from_slice(image);
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_idx_downsample_and_binarize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MNIST_IDX_FILE);

        // 4x4 image: bright top-left 2x2 block, half-lit top-right block
        #[rustfmt::skip]
        let image = vec![
            255, 255, 255, 0,
            255, 255, 0,   0,
            0,   0,   0,   0,
            0,   0,   0,   255,
        ];
        write_idx(&path, &[image], 4, 4);

        let ds = load_mnist_idx(&path, 2).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.width(), 4);
        // top-left 1.0, top-right 0.25, bottom-left 0.0, bottom-right 0.25
        assert_eq!(ds.row(0).unwrap(), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_idx_rejects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad");
        fs::write(&path, [0u8; 16]).unwrap();
        assert!(matches!(load_mnist_idx(&path, 2), Err(BrbmError::Data { .. })));
    }

    #[test]
    fn test_idx_rejects_truncated_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MNIST_IDX_FILE);
        write_idx(&path, &[vec![0; 10]], 4, 4);
        assert!(load_mnist_idx(&path, 2).is_err());
    }

    #[test]
    fn test_idx_rejects_oversized_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MNIST_IDX_FILE);
        let mut bytes = Vec::new();
        for v in [IDX_IMAGES_MAGIC, u32::MAX, u32::MAX, u32::MAX] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        fs::write(&path, bytes).unwrap();
        assert!(matches!(load_mnist_idx(&path, 2), Err(BrbmError::Data { .. })));
    }

    #[test]
    fn test_npy_u8_is_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MNIST_NPY_FILE);
        let arr = Array2::<u8>::from_shape_vec((2, 3), vec![0, 128, 255, 200, 10, 127]).unwrap();
        arr.write_npy(File::create(&path).unwrap()).unwrap();

        let ds = load_mnist(dir.path(), 16).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.row(0).unwrap(), &[0.0, 1.0, 1.0]);
        assert_eq!(ds.row(1).unwrap(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_mnist(dir.path(), 16), Err(BrbmError::Data { .. })));
    }

    #[test]
    fn test_repeated_pattern_and_render() {
        let ds = repeated_pattern(&[1.0, 0.0, 0.0, 1.0], 3).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(render_ascii(ds.row(2).unwrap(), 2), "#.\n.#");
    }
}
