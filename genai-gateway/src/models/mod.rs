//! Domain models for the GenAI gateway.

pub mod history;
pub mod image;
pub mod params;
pub mod request;

pub use history::{History, HistoryEntry};
pub use image::UploadedImage;
pub use params::{AspectRatio, GenerationParams};
pub use request::GenerationRequest;
