pub mod backend;

pub use backend::{ApiError, ApiRequest, ApiResponse, HttpTransport, Transport};
