//! Fetching of candidate photos.
//!
//! The renderer works synchronously, so [`PhotoFetcher`] is a blocking interface. The HTTP
//! implementation drives an async `reqwest` client on a tokio runtime handle from a short-lived
//! helper thread, so it is safe to call from any thread, including async tasks. The caller is
//! still blocked for the duration of the download; async callers should render inside
//! `tokio::task::spawn_blocking`.

use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;

use crate::error::PhotoError;

/// Photos larger than this are rejected without decoding.
pub const MAX_PHOTO_BYTES: usize = 16 * 1024 * 1024;

/// Loads the raw bytes of a candidate photo.
pub trait PhotoFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PhotoError>;
}

/// A fetcher that never returns a photo.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPhotos;

impl PhotoFetcher for NoPhotos {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PhotoError> {
        Err(PhotoError::Download {
            url: url.to_owned(),
            reason: "photo fetching is disabled".to_owned(),
        })
    }
}

/// Downloads photos over HTTP(S) with a fixed timeout and no retries.
#[derive(Clone, Debug)]
pub struct HttpPhotoFetcher {
    client: reqwest::Client,
    runtime: Handle,
    timeout: Duration,
}

impl HttpPhotoFetcher {
    /// Creates a fetcher whose requests run on `runtime` and give up after `timeout`.
    ///
    /// `runtime` must be able to drive IO while the caller blocks: a multi-threaded runtime, or a
    /// current-thread runtime that some other thread is running.
    pub fn new(runtime: Handle, timeout: Duration) -> Result<Self, PhotoError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PhotoError::Client(err.to_string()))?;

        Ok(Self {
            client,
            runtime,
            timeout,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, PhotoError> {
        let classify = |err: reqwest::Error| {
            if err.is_timeout() {
                PhotoError::Timeout {
                    url: url.to_owned(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                PhotoError::Download {
                    url: url.to_owned(),
                    reason: err.to_string(),
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(classify)?;

        if !response.status().is_success() {
            return Err(PhotoError::Download {
                url: url.to_owned(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        if let Some(length) = response.content_length() {
            if length > MAX_PHOTO_BYTES as u64 {
                return Err(too_large(url, length as usize));
            }
        }

        let bytes = response.bytes().await.map_err(classify)?;
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(too_large(url, bytes.len()));
        }

        debug!("Fetched {} bytes of photo data from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

impl PhotoFetcher for HttpPhotoFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PhotoError> {
        let url = url.trim();
        check_scheme(url)?;

        // `Handle::block_on` panics on a thread that is already inside a runtime.
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.runtime.block_on(self.download(url)))
                .join()
                .map_err(|_| PhotoError::Client("photo download thread panicked".to_owned()))?
        })
    }
}

fn too_large(url: &str, size: usize) -> PhotoError {
    PhotoError::Download {
        url: url.to_owned(),
        reason: format!(
            "photo is {} bytes, more than the {} byte limit",
            size, MAX_PHOTO_BYTES
        ),
    }
}

/// Accepts only absolute `http` and `https` URLs.
pub fn check_scheme(url: &str) -> Result<(), PhotoError> {
    match reqwest::Url::parse(url.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(PhotoError::UnsupportedScheme(url.to_owned())),
    }
}
