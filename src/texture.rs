//! Asynchronous 2D texture loading.
//!
//! [`TextureLoader::load`] hands back a texture immediately and decodes the
//! file on a worker thread. The rendering context is only touched from
//! [`TextureLoader::upload_ready`], which the host calls on its render thread.
//! Until then the texture exists but has no contents.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, warn};
use parking_lot::Mutex;
use thiserror::Error;

use crate::render::{ContextError, RenderContext};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode texture {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn open(path: &Path) -> Result<Self, TextureError> {
        let image = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

type Finished = Vec<(u64, Result<DecodedImage, TextureError>)>;

pub struct TextureLoader<T> {
    next_ticket: u64,
    waiting: HashMap<u64, T>,
    finished: Arc<Mutex<Finished>>,
    workers: Vec<(u64, JoinHandle<()>)>,
}

impl<T: Copy + fmt::Debug> TextureLoader<T> {
    pub fn new() -> Self {
        Self {
            next_ticket: 0,
            waiting: HashMap::new(),
            finished: Arc::new(Mutex::new(Vec::new())),
            workers: Vec::new(),
        }
    }

    /// Creates a texture and starts decoding `path` in the background.
    pub fn load<C>(&mut self, ctx: &C, path: impl AsRef<Path>) -> Result<T, ContextError>
    where
        C: RenderContext<Texture = T>,
    {
        let path = path.as_ref().to_path_buf();
        debug!("decoding texture {}", path.display());
        self.start(ctx, move || DecodedImage::open(&path))
    }

    fn start<C, F>(&mut self, ctx: &C, decode: F) -> Result<T, ContextError>
    where
        C: RenderContext<Texture = T>,
        F: FnOnce() -> Result<DecodedImage, TextureError> + Send + 'static,
    {
        let texture = ctx.create_texture()?;
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.waiting.insert(ticket, texture);

        let finished = Arc::clone(&self.finished);
        let handle = thread::spawn(move || {
            let decoded = decode();
            finished.lock().push((ticket, decoded));
        });
        self.workers.push((ticket, handle));
        Ok(texture)
    }

    /// Uploads every decode that has finished since the last call. Returns
    /// the number of textures that received pixels.
    pub fn upload_ready<C>(&mut self, ctx: &C) -> usize
    where
        C: RenderContext<Texture = T>,
    {
        let finished = std::mem::take(&mut *self.finished.lock());
        let mut uploaded = 0;
        for (ticket, decoded) in finished {
            let Some(texture) = self.waiting.remove(&ticket) else {
                warn!("decoded texture for unknown ticket {ticket}");
                continue;
            };
            match decoded {
                Ok(image) => {
                    ctx.upload_texture_rgba8(texture, image.width, image.height, &image.pixels);
                    debug!(
                        "uploaded texture {texture:?} ({}x{})",
                        image.width, image.height
                    );
                    uploaded += 1;
                }
                Err(TextureError::Decode { path, source }) => {
                    error!("failed to decode texture {}: {source}", path.display())
                }
            }
        }
        let (done, running) = std::mem::take(&mut self.workers)
            .into_iter()
            .partition::<Vec<_>, _>(|(_, worker)| worker.is_finished());
        self.workers = running;
        for (ticket, worker) in done {
            self.join(ticket, worker);
        }
        uploaded
    }

    /// Textures whose decode has not been uploaded yet.
    pub fn pending(&self) -> usize {
        self.waiting.len()
    }

    /// Blocks until every started decode has finished. Does not upload.
    pub fn wait(&mut self) {
        for (ticket, worker) in std::mem::take(&mut self.workers) {
            self.join(ticket, worker);
        }
    }

    /// A worker that panicked never reports a result, so its texture stops
    /// being pending here.
    fn join(&mut self, ticket: u64, worker: JoinHandle<()>) {
        if worker.join().is_err() {
            match self.waiting.remove(&ticket) {
                Some(texture) => error!("texture decode thread for {texture:?} panicked"),
                None => error!("texture decode thread panicked"),
            }
        }
    }
}

impl<T: Copy + fmt::Debug> Default for TextureLoader<T> {
    fn default() -> Self {
        Self::new()
    }
}
