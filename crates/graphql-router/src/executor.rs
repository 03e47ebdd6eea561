// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use async_trait::async_trait;
use graphql_engine::{Engine, EngineError, Request};
use serde_json::Value;
use tracing::instrument;

use crate::{
    classifier::ErrorClassifier,
    config::QueryDepthLimit,
    operation_payload::Query,
    outcome::{FatalError, Outcome},
};

/// The engine that validates and executes operations.
#[async_trait]
pub trait ExecutionEngine<C>: Send + Sync
where
    C: Send + Sync,
{
    async fn execute(&self, request: Request<'_>, context: &C) -> Result<Value, EngineError>;
}

#[async_trait]
impl<C> ExecutionEngine<C> for Engine<C>
where
    C: Send + Sync,
{
    async fn execute(&self, request: Request<'_>, context: &C) -> Result<Value, EngineError> {
        Engine::execute(self, request, context).await
    }
}

/// Process-wide settings shared (read-only) by all requests.
pub struct ExecutorConfig<C>
where
    C: Send + Sync,
{
    pub engine: Arc<dyn ExecutionEngine<C>>,
    pub root_context: Arc<C>,
    pub max_query_depth: QueryDepthLimit,
    pub allow_mutations: bool,
}

pub struct QueryExecutor<C>
where
    C: Send + Sync,
{
    config: ExecutorConfig<C>,
    classifier: ErrorClassifier,
}

impl<C> QueryExecutor<C>
where
    C: Send + Sync,
{
    pub fn new(config: ExecutorConfig<C>, classifier: ErrorClassifier) -> Self {
        Self { config, classifier }
    }

    /// Execute the query once. Mutations run only if the configuration allows them.
    ///
    /// Recognized failures are returned as [`Outcome::Rejected`]; any other engine failure is
    /// returned as a [`FatalError`].
    pub async fn execute(&self, query: &Query) -> Result<Outcome, FatalError> {
        self.run(query, self.config.allow_mutations).await
    }

    /// Like [`Self::execute`], but rejects mutations regardless of the configuration.
    pub async fn execute_read_only(&self, query: &Query) -> Result<Outcome, FatalError> {
        self.run(query, false).await
    }

    #[instrument(
        name = "QueryExecutor::execute"
        skip(self, query)
        fields(operation_name = ?query.operation_name())
        )]
    async fn run(&self, query: &Query, allow_mutations: bool) -> Result<Outcome, FatalError> {
        let request = Request {
            query: query.text(),
            operation_name: query.operation_name(),
            variables: query.variables(),
            max_depth: self.config.max_query_depth.get(),
            allow_mutations,
        };

        match self
            .config
            .engine
            .execute(request, self.config.root_context.as_ref())
            .await
        {
            Ok(value) => Ok(Outcome::Success(value)),
            Err(failure) => self.classifier.classify(failure).map(Outcome::Rejected),
        }
    }
}

#[cfg(test)]
mod tests {
    use graphql_engine::{EngineFault, ExecutionError};
    use serde_json::{Map, json};
    use test_log::test;

    use super::*;
    use crate::outcome::ErrorCategory;

    /// Fails every request with the error produced by the closure.
    struct FailingEngine(fn() -> EngineError);

    #[async_trait]
    impl ExecutionEngine<()> for FailingEngine {
        async fn execute(
            &self,
            _request: Request<'_>,
            _context: &(),
        ) -> Result<Value, EngineError> {
            Err((self.0)())
        }
    }

    /// Echoes the request settings back as data.
    struct EchoEngine;

    #[async_trait]
    impl ExecutionEngine<()> for EchoEngine {
        async fn execute(&self, request: Request<'_>, _context: &()) -> Result<Value, EngineError> {
            Ok(json!({
                "data": {
                    "maxDepth": request.max_depth,
                    "allowMutations": request.allow_mutations,
                    "operationName": request.operation_name,
                }
            }))
        }
    }

    fn executor(
        engine: impl ExecutionEngine<()> + 'static,
        allow_mutations: bool,
    ) -> QueryExecutor<()> {
        QueryExecutor::new(
            ExecutorConfig {
                engine: Arc::new(engine),
                root_context: Arc::new(()),
                max_query_depth: QueryDepthLimit::new(7).unwrap(),
                allow_mutations,
            },
            ErrorClassifier::default(),
        )
    }

    fn echoed(allow_mutations: bool) -> Outcome {
        Outcome::Success(json!({
            "data": {"maxDepth": 7, "allowMutations": allow_mutations, "operationName": "Q"}
        }))
    }

    fn query() -> Query {
        Query::new("query Q { hello }", Some("Q".to_string()), Map::new()).unwrap()
    }

    #[test(tokio::test)]
    async fn passes_configuration_to_engine() {
        let outcome = executor(EchoEngine, true).execute(&query()).await.unwrap();
        assert_eq!(outcome, echoed(true));

        let outcome = executor(EchoEngine, true)
            .execute_read_only(&query())
            .await
            .unwrap();
        assert_eq!(outcome, echoed(false));

        let outcome = executor(EchoEngine, false).execute(&query()).await.unwrap();
        assert_eq!(outcome, echoed(false));
    }

    #[test(tokio::test)]
    async fn recognized_failures_are_rejected() {
        let outcome = executor(
            FailingEngine(|| {
                Box::new(ExecutionError::NullForNonNullField {
                    path: "hello".to_string(),
                })
            }),
            true,
        )
        .execute(&query())
        .await
        .unwrap();

        match outcome {
            Outcome::Rejected(error) => assert_eq!(error.category, ErrorCategory::ExecutionError),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test(tokio::test)]
    async fn unrecognized_failures_are_fatal() {
        let fatal = executor(
            FailingEngine(|| Box::new(EngineFault::ResolverPanicked("boom".to_string()))),
            true,
        )
        .execute(&query())
        .await
        .unwrap_err();

        assert!(fatal.cause.downcast_ref::<EngineFault>().is_some());
    }
}
