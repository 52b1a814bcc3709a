//! Generic action endpoint: read params, run the action, present the result.

use crate::presenter::{JsonPresenter, Presenter};
use crate::reader::RequestReader;
use axum::{
    extract::Request,
    response::Response,
    routing::{MethodRouter, get},
};
use pipeline_core::{Action, ErrorClassifier, Payload};
use pipeline_runtime::ActionRunner;
use std::sync::Arc;

/// One action exposed over HTTP.
///
/// Cloning is cheap; clones share the action and presenter.
#[derive(Clone)]
pub struct ActionEndpoint {
    action: Arc<dyn Action>,
    runner: ActionRunner,
    reader: RequestReader,
    presenter: Arc<dyn Presenter>,
    classifier: Option<Arc<dyn ErrorClassifier>>,
}

impl ActionEndpoint {
    /// Endpoint presenting JSON.
    #[must_use]
    pub fn new(action: Arc<dyn Action>, runner: ActionRunner, reader: RequestReader) -> Self {
        Self {
            action,
            runner,
            reader,
            presenter: Arc::new(JsonPresenter),
            classifier: None,
        }
    }

    /// Present results with `presenter`.
    #[must_use]
    pub fn with_presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Classify this endpoint's errors with `classifier` instead of the
    /// runner's.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Name of the exposed action.
    #[must_use]
    pub fn action_name(&self) -> &str {
        self.action.name()
    }

    /// Handle one request.
    ///
    /// Never fails: unreadable requests are classified like any other
    /// action error.
    pub async fn handle(&self, req: Request) -> Response {
        let params = self.reader.read(req).await;
        let result = self
            .runner
            .run_with(
                self.action.as_ref(),
                move || params.map(Payload::from),
                self.classifier.as_deref(),
            )
            .await;
        self.presenter.present(result, None).await
    }

    /// Route answering both `GET` and `POST`.
    #[must_use]
    pub fn into_route<S>(self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handler = move |req: Request| {
            let endpoint = self.clone();
            async move { endpoint.handle(req).await }
        };
        get(handler.clone()).post(handler)
    }
}

impl std::fmt::Debug for ActionEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionEndpoint")
            .field("action", &self.action.name())
            .field("reader", &self.reader)
            .finish_non_exhaustive()
    }
}
