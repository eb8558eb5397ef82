//! services/api/src/adapters/capture.rs
//!
//! This module contains the illustration-capture adapter. It implements the
//! `ImageCapture` port from the `core` crate by downloading the story's
//! `image_url` and decoding it into the raw RGB buffer the composer and the
//! PDF writer work with.

use std::time::Duration;

use async_trait::async_trait;
use storytime_core::domain::CapturedImage;
use storytime_core::error::CaptureError;
use storytime_core::ports::ImageCapture;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ImageCapture` port over HTTP.
#[derive(Clone)]
pub struct HttpImageCapture {
    http: reqwest::Client,
}

impl HttpImageCapture {
    /// Creates a new `HttpImageCapture`. An unresponsive image host is
    /// treated as a capture failure once `timeout` elapses.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

//=========================================================================================
// `ImageCapture` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageCapture for HttpImageCapture {
    async fn capture(&self, url: &str) -> Result<CapturedImage, CaptureError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CaptureError::Fetch(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CaptureError::Fetch(e.to_string()))?;

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| CaptureError::Decode(e.to_string()))?
            .to_rgb8();

        Ok(CapturedImage {
            width: decoded.width(),
            height: decoded.height(),
            pixels: decoded.into_raw(),
        })
    }
}
