//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four pixel operations the
//! normalize/fit pipeline needs: decode, resize, quantize and encode.
//! Geometry decisions and the degradation ladder live in
//! [`operations`](super::operations) and only talk to this trait, so the
//! ladder can be exercised against a recording mock.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and built on
//! the `image` crate.

use image::{DynamicImage, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Invalid image geometry: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },
    #[error("Crop rectangle does not overlap the {width}x{height} image")]
    EmptyCrop { width: u32, height: u32 },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// Implementations must be pure: the same input always yields the same
/// output, and nothing is shared between calls. `Sync` so a single backend
/// can serve a rayon batch.
pub trait ImageBackend: Sync {
    /// Decode raw bytes, detecting the format from content. Animated formats
    /// yield their first frame.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resample to exactly `width × height`, ignoring aspect ratio.
    fn resize(&self, image: &RgbImage, width: u32, height: u32)
    -> Result<RgbImage, BackendError>;

    /// Reduce to at most `colors` distinct colors, keeping RGB layout.
    fn quantize(&self, image: &RgbImage, colors: u16) -> Result<RgbImage, BackendError>;

    /// Encode losslessly (PNG) with maximum compression effort.
    fn encode(&self, image: &RgbImage) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations and fakes encoded sizes.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// `encode` pops the next scripted size; when the script is empty it
    /// returns `width * height * 3` bytes, so smaller images encode smaller.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_results: Mutex<Vec<Result<DynamicImage, String>>>,
        pub encode_sizes: Mutex<Vec<usize>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Resize { width: u32, height: u32 },
        Quantize(u16),
        Encode { width: u32, height: u32 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script encoded sizes, consumed in order.
        pub fn with_encode_sizes(sizes: Vec<usize>) -> Self {
            let mut reversed = sizes;
            reversed.reverse();
            Self {
                encode_sizes: Mutex::new(reversed),
                ..Self::default()
            }
        }

        /// Script decode results, consumed in order.
        pub fn with_decoded(results: Vec<Result<DynamicImage, String>>) -> Self {
            let mut reversed = results;
            reversed.reverse();
            Self {
                decode_results: Mutex::new(reversed),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
            self.record(RecordedOp::Decode(bytes.len()));
            match self.decode_results.lock().unwrap().pop() {
                Some(Ok(img)) => Ok(img),
                Some(Err(msg)) => Err(BackendError::Decode(msg)),
                None => Err(BackendError::Decode("No mock image".to_string())),
            }
        }

        fn resize(
            &self,
            _image: &RgbImage,
            width: u32,
            height: u32,
        ) -> Result<RgbImage, BackendError> {
            self.record(RecordedOp::Resize { width, height });
            Ok(RgbImage::new(width, height))
        }

        fn quantize(&self, image: &RgbImage, colors: u16) -> Result<RgbImage, BackendError> {
            self.record(RecordedOp::Quantize(colors));
            Ok(image.clone())
        }

        fn encode(&self, image: &RgbImage) -> Result<Vec<u8>, BackendError> {
            let (width, height) = image.dimensions();
            self.record(RecordedOp::Encode { width, height });
            let size = self
                .encode_sizes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or((width * height * 3) as usize);
            Ok(vec![0u8; size])
        }
    }

    #[test]
    fn mock_records_encode_with_scripted_size() {
        let backend = MockBackend::with_encode_sizes(vec![10, 20]);
        let img = RgbImage::new(4, 4);

        assert_eq!(backend.encode(&img).unwrap().len(), 10);
        assert_eq!(backend.encode(&img).unwrap().len(), 20);
        // Script exhausted: falls back to raw size
        assert_eq!(backend.encode(&img).unwrap().len(), 48);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(
            &ops[0],
            RecordedOp::Encode {
                width: 4,
                height: 4
            }
        ));
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();
        let out = backend.resize(&RgbImage::new(10, 10), 6, 3).unwrap();
        assert_eq!(out.dimensions(), (6, 3));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Resize {
                width: 6,
                height: 3
            }]
        );
    }

    #[test]
    fn mock_decode_errors_when_unscripted() {
        let backend = MockBackend::new();
        let result = backend.decode(b"abc");
        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode(3)]);
    }

    #[test]
    fn error_messages_name_the_geometry() {
        let err = BackendError::InvalidGeometry {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "Invalid image geometry: 0x12");
    }
}
