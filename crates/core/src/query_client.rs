use std::pin::Pin;
use std::sync::Arc;

use ragchat_proto::{BackendError, ChatBackend, QueryResponse};
use tracing::Instrument;

pub(crate) type QueryResult = Result<QueryResponse, Box<dyn BackendError>>;
type BoxedQueryFuture = Pin<Box<dyn Future<Output = QueryResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(String, Option<u32>) -> BoxedQueryFuture + Send + Sync>;

/// A wrapper around a chat backend that provides a type-erased interface
/// for the controller.
#[derive(Clone)]
pub(crate) struct QueryClient {
    handler_fn: HandlerFn,
}

impl QueryClient {
    #[inline]
    pub fn new<B: ChatBackend + 'static>(backend: B) -> Self {
        // Erase `B` so the controller doesn't need a generic parameter.
        let handler_fn: HandlerFn = Arc::new(move |question, top_k| {
            let fut = backend.query(&question, top_k);
            Box::pin(
                async move {
                    trace!("sending question: {question:?}");
                    let result: QueryResult = match fut.await {
                        Ok(resp) => {
                            trace!("got {} context items", resp.context.len());
                            Ok(resp)
                        }
                        Err(err) => {
                            error!("query failed: {err:?}");
                            Err(Box::new(err))
                        }
                    };
                    result
                }
                .instrument(trace_span!("query", top_k = ?top_k)),
            )
        });
        Self { handler_fn }
    }

    /// Sends a question to the backend.
    #[inline]
    pub async fn query(
        &self,
        question: String,
        top_k: Option<u32>,
    ) -> QueryResult {
        (self.handler_fn)(question, top_k).await
    }
}

#[cfg(test)]
mod tests {
    use ragchat_proto::ErrorKind;
    use ragchat_test_backend::{TestBackend, context_item};

    use super::*;

    #[tokio::test]
    async fn test_query() {
        let backend = TestBackend::default();
        backend.add_answer("Hi!", vec![context_item("Q1", "A1", 0.9)]);
        let client = QueryClient::new(backend.clone());

        let resp = client.query("Hello".to_owned(), Some(2)).await.unwrap();
        assert_eq!(resp.answer, "Hi!");
        assert_eq!(backend.received(), vec![("Hello".to_owned(), Some(2))]);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let backend = TestBackend::default();
        backend.add_failure("model unavailable", ErrorKind::Status(500));
        let client = QueryClient::new(backend);

        let err = client.query("Hello".to_owned(), None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Status(500));
        assert_eq!(err.to_string(), "model unavailable");
    }
}
