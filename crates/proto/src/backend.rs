use std::error::Error;

use crate::error::ErrorKind;
use crate::types::QueryResponse;

/// The error type for a chat backend.
pub trait BackendError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that answers questions, usually by forwarding them to a remote
/// retrieval-augmented generation service.
///
/// Implementations should behave like stateless objects from the caller's
/// point of view. Internal caches are fine, but callers must not rely on
/// them.
pub trait ChatBackend: Send + Sync {
    /// The error type that may be returned by the backend.
    type Error: BackendError;

    /// Asks a question.
    ///
    /// When `top_k` is `None`, the backend picks a default. The returned
    /// future must be independent of `self`.
    fn query(
        &self,
        question: &str,
        top_k: Option<u32>,
    ) -> impl Future<Output = Result<QueryResponse, Self::Error>> + Send + 'static;
}
