use super::{GenerationParams, UploadedImage};

/// A validated generation request, ready for the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Trimmed, non-empty prompt.
    pub prompt: String,
    pub image: Option<UploadedImage>,
    pub params: GenerationParams,
    /// Primary language tag of the caller, only set when locale awareness is on.
    pub locale: Option<String>,
}
