//! QR decoding.

use tracing::trace;

use crate::frame::Frame;

/// Extracts a QR payload from a frame.
pub trait QrDecoder: Send + Sync {
    /// Decode the first readable QR code in `frame`.
    ///
    /// Failure to find or read a code is not an error; it returns `None`.
    fn decode(&self, frame: &Frame) -> Option<String>;
}

/// Decoder backed by the `rqrr` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl QrDecoder for RqrrDecoder {
    fn decode(&self, frame: &Frame) -> Option<String> {
        if frame.width() == 0 || frame.height() == 0 {
            return None;
        }

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(frame.width(), frame.height(), |x, y| {
                frame.luma(x, y)
            });

        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), "Detected QR grids");

        grids.iter().find_map(|grid| match grid.decode() {
            Ok((_, content)) => Some(content),
            Err(e) => {
                trace!(error = ?e, "Grid failed to decode");
                None
            }
        })
    }
}
