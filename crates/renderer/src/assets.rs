use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use image::imageops::flip_vertical_in_place;
use image::{ImageReader, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to open image {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {} is {width}x{height}; the GPU accepts at most {limit} per side", path.display())]
    TooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        limit: u32,
    },
    #[error("image loader thread exited without a result")]
    WorkerLost,
}

/// Background image ready for upload, rows already flipped to bottom-up order.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub path: PathBuf,
    pub pixels: RgbaImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Reads and decodes an image in its natural top-down row order.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, AssetLoadError> {
    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| AssetLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let image = reader.decode().map_err(|source| AssetLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// Decodes an image and flips it so texture row 0 is the bottom edge.
pub fn decode_for_upload(path: &Path) -> Result<DecodedImage, AssetLoadError> {
    let mut pixels = load_rgba(path)?;
    flip_vertical_in_place(&mut pixels);
    Ok(DecodedImage {
        path: path.to_path_buf(),
        pixels,
    })
}

/// Single-shot background decode of the lens texture.
///
/// The worker sends exactly one result and then calls `wake`, which the window
/// loop wires to an `EventLoopProxy` so the result is picked up on the event
/// thread.
pub struct AssetBootstrap {
    receiver: Receiver<Result<DecodedImage, AssetLoadError>>,
    handle: Option<JoinHandle<()>>,
    delivered: bool,
}

impl AssetBootstrap {
    pub fn spawn<F>(path: PathBuf, wake: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (sender, receiver) = bounded(1);
        let handle = thread::Builder::new()
            .name("lensfx-assets".into())
            .spawn(move || {
                tracing::debug!(path = %path.display(), "decoding background image");
                let result = decode_for_upload(&path);
                if sender.send(result).is_err() {
                    tracing::debug!("asset receiver dropped before decode finished");
                    return;
                }
                wake();
            })
            .map_err(|err| anyhow!("failed to spawn image loader thread: {err}"))?;

        Ok(Self {
            receiver,
            handle: Some(handle),
            delivered: false,
        })
    }

    /// Returns the decode result the first time it is available, then `None`.
    pub fn poll(&mut self) -> Option<Result<DecodedImage, AssetLoadError>> {
        if self.delivered {
            return None;
        }
        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(AssetLoadError::WorkerLost),
        };
        self.delivered = true;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Some(result)
    }

    pub fn is_pending(&self) -> bool {
        !self.delivered
    }
}
