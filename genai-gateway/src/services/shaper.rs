//! Flattens provider output into what the HTTP response carries.

use crate::services::providers::{CandidateContent, InlineImage, ProviderOutput};

/// Text and images extracted from a provider reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedResponse {
    /// Text fragments of all candidates, newline-joined in order.
    pub text: String,
    pub images: Vec<InlineImage>,
    pub finish_reasons: Vec<String>,
    pub block_reason: Option<String>,
    pub candidate_count: usize,
}

impl ShapedResponse {
    /// First image, i.e. the one surfaced in the response's `image` field.
    pub fn first_image(&self) -> Option<&InlineImage> {
        self.images.first()
    }
}

/// Candidates are walked in order; an image-only candidate contributes no
/// text and a text-only one contributes no image. Nothing here fails.
pub fn shape(output: &ProviderOutput) -> ShapedResponse {
    match output {
        ProviderOutput::NoCandidates { block_reason } => ShapedResponse {
            block_reason: block_reason.clone(),
            ..ShapedResponse::default()
        },
        ProviderOutput::Candidates(candidates) => {
            let mut texts: Vec<&str> = Vec::new();
            let mut images = Vec::new();
            let mut finish_reasons = Vec::new();

            for candidate in candidates {
                match &candidate.content {
                    CandidateContent::Empty => {}
                    CandidateContent::TextOnly(t) => texts.extend(t.iter().map(String::as_str)),
                    CandidateContent::ImageOnly(i) => images.extend(i.iter().cloned()),
                    CandidateContent::Mixed { texts: t, images: i } => {
                        texts.extend(t.iter().map(String::as_str));
                        images.extend(i.iter().cloned());
                    }
                }
                if let Some(reason) = &candidate.finish_reason {
                    finish_reasons.push(reason.clone());
                }
            }

            ShapedResponse {
                text: texts.join("\n"),
                images,
                finish_reasons,
                block_reason: None,
                candidate_count: candidates.len(),
            }
        }
    }
}
