//! The remote colorization service seen from the client side.

mod http;

pub use http::HttpColorizer;

use crate::error::SubmissionError;
use crate::model::SourceFile;
use bytes::Bytes;
use futures::future::BoxFuture;

/// Binary payload returned by a successful colorization.
#[derive(Debug, Clone)]
pub struct ColorizedPayload {
    pub bytes: Bytes,
    pub media_type: String,
}

pub type ColorizeFuture = BoxFuture<'static, Result<ColorizedPayload, SubmissionError>>;

/// One call per selected file; implementations must not retry.
pub trait Colorizer: Send + Sync + 'static {
    fn colorize(&self, file: &SourceFile) -> ColorizeFuture;
}
