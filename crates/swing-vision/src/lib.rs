//! Vision model clients for swing detection.
//!
//! This crate wraps the cloud vision APIs the detection service submits
//! frame sequences to. Both providers sit behind the [`VisionClient`] trait
//! so the detection loop never depends on a concrete vendor.

pub mod client;
pub mod error;
pub mod gemini;
pub mod image;
pub mod openai;
pub mod parse;

pub use client::{build_client, VisionClient, VisionClientConfig, VisionProvider};
pub use error::{VisionError, VisionResult};
pub use gemini::GeminiVisionClient;
pub use image::EncodedImage;
pub use openai::OpenAiVisionClient;
