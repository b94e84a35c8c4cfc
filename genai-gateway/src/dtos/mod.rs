pub mod generate;

pub use generate::{
    GenerateRequest, GenerateResponse, ImagePayload, RawGenerateRequest, ResponseMetadata,
    TokenUsage,
};
