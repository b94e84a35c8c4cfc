use axum::http::{Method, Uri};
use service_core::error::AppError;

pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {} {}", method, uri.path()))
}

/// Known path, unsupported method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!("{} is not supported on {}", method, uri.path()))
}
