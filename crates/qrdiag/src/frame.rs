//! Video frames and the sources that produce them.
//!
//! The scan loop only needs a luma plane per tick. Where the frames come
//! from is behind the [`FrameSource`] trait; [`ImageSequenceSource`] replays
//! still images from disk in place of a live camera.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// File extensions treated as images when expanding directories.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// A single 8-bit greyscale frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame from a row-major luma buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrame`] if `pixels.len() != width * height`,
    /// or if `width * height` overflows (reported as `usize::MAX`).
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        let expected = width.checked_mul(height).unwrap_or(usize::MAX);
        if pixels.len() != expected {
            return Err(Error::InvalidFrame {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A uniformly filled frame.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    #[must_use]
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        let len = width
            .checked_mul(height)
            .expect("frame dimensions overflow usize");
        Self {
            width,
            height,
            pixels: vec![value; len],
        }
    }

    /// Load an image file and convert it to luma.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageLoad`] if the file can't be opened or decoded.
    pub fn from_image_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let luma = image::open(path)
            .map_err(|source| Error::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_luma8();
        let (width, height) = luma.dimensions();
        Self::new(width as usize, height as usize, luma.into_raw())
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luma value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[must_use]
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// The raw luma plane.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Outcome of asking a source for the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePoll {
    /// A frame is available.
    Ready(Frame),
    /// No frame yet; try again next tick.
    Pending,
    /// The source will never produce another frame.
    Exhausted,
}

/// A producer of video frames.
#[async_trait]
pub trait FrameSource: Send {
    /// The name of this source (for logging).
    fn name(&self) -> &'static str;

    /// Acquire the source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraUnavailable`] if the source can't be acquired.
    async fn open(&mut self) -> Result<()>;

    /// Sample the current frame.
    async fn poll_frame(&mut self) -> FramePoll;
}

/// Replays image files as frames, one per poll.
#[derive(Debug)]
pub struct ImageSequenceSource {
    inputs: Vec<PathBuf>,
    paths: Vec<PathBuf>,
    position: usize,
    looping: bool,
}

impl ImageSequenceSource {
    /// Create a source over files and/or directories.
    ///
    /// Directories are expanded to the image files they contain, sorted by
    /// name, when the source is opened.
    #[must_use]
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            paths: Vec::new(),
            position: 0,
            looping: false,
        }
    }

    /// Start over from the first image after the last one.
    #[must_use]
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// The resolved image paths (empty until opened).
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn expand(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for input in inputs {
            if input.is_dir() {
                let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                    .filter_map(std::result::Result::ok)
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file() && is_image(path))
                    .collect();
                entries.sort();
                paths.extend(entries);
            } else if input.is_file() {
                paths.push(input.clone());
            } else {
                return Err(Error::camera_unavailable(
                    "images",
                    format!("{} does not exist", input.display()),
                ));
            }
        }
        Ok(paths)
    }
}

#[async_trait]
impl FrameSource for ImageSequenceSource {
    fn name(&self) -> &'static str {
        "images"
    }

    async fn open(&mut self) -> Result<()> {
        let inputs = self.inputs.clone();
        let paths = tokio::task::spawn_blocking(move || Self::expand(&inputs))
            .await
            .map_err(|e| Error::internal(e.to_string()))??;

        if paths.is_empty() {
            return Err(Error::camera_unavailable("images", "no image files found"));
        }

        debug!(count = paths.len(), looping = self.looping, "Opened image sequence");
        self.paths = paths;
        self.position = 0;
        Ok(())
    }

    async fn poll_frame(&mut self) -> FramePoll {
        if self.position >= self.paths.len() {
            if self.looping && !self.paths.is_empty() {
                self.position = 0;
            } else {
                return FramePoll::Exhausted;
            }
        }

        let path = self.paths[self.position].clone();
        self.position += 1;

        match tokio::task::spawn_blocking(move || Frame::from_image_file(path)).await {
            Ok(Ok(frame)) => FramePoll::Ready(frame),
            Ok(Err(e)) => {
                warn!(error = %e, "Skipping unreadable frame");
                FramePoll::Pending
            }
            Err(e) => {
                warn!(error = %e, "Frame loader task failed");
                FramePoll::Pending
            }
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}
