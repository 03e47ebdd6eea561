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
use common::env_const::get_graphql_http_path;
use common::http::{RequestHead, RequestPayload, ResponsePayload};
use common::router::Router;
use exo_env::Environment;
use http::StatusCode;
use serde_json::json;
use tracing::{debug, error, instrument};

use crate::{
    classifier::ErrorClassifier,
    config::{ConfigError, ErrorVerbosity, QueryDepthLimit, mutations_allowed},
    executor::{ExecutionEngine, ExecutorConfig, QueryExecutor},
    operation_payload::QueryDecoder,
    outcome::Outcome,
    result_mapper::to_transport_result,
};

const FATAL_ERROR_MESSAGE: &str = "Internal server error";

/// Serves GraphQL over `GET` and `POST` on the configured path.
pub struct GraphQLRouter<C>
where
    C: Send + Sync,
{
    executor: QueryExecutor<C>,
    env: Arc<dyn Environment>,
}

impl<C> GraphQLRouter<C>
where
    C: Send + Sync,
{
    pub fn new(executor: QueryExecutor<C>, env: Arc<dyn Environment>) -> Self {
        Self { executor, env }
    }

    /// Build a router, reading the depth limit, error verbosity, and mutation policy from `env`.
    pub fn from_env(
        engine: Arc<dyn ExecutionEngine<C>>,
        root_context: Arc<C>,
        env: Arc<dyn Environment>,
    ) -> Result<Self, ConfigError> {
        let config = ExecutorConfig {
            engine,
            root_context,
            max_query_depth: QueryDepthLimit::from_env(env.as_ref())?,
            allow_mutations: mutations_allowed(env.as_ref())?,
        };
        let classifier = ErrorClassifier::new(ErrorVerbosity::from_env(env.as_ref())?);

        Ok(Self::new(QueryExecutor::new(config, classifier), env))
    }

    fn suitable(&self, request_head: &(dyn RequestHead + Sync)) -> bool {
        let method = request_head.get_method();

        request_head.get_path() == get_graphql_http_path(self.env.as_ref())
            && (method == http::Method::GET || method == http::Method::POST)
    }
}

#[async_trait]
impl<C> Router for GraphQLRouter<C>
where
    C: Send + Sync,
{
    /// Decode, execute, and map the request to a JSON response.
    ///
    /// Fatal failures are logged and answered with a generic 500 response.
    #[instrument(
        name = "GraphQLRouter::route"
        skip(self, request)
    )]
    async fn route(&self, request: &mut (dyn RequestPayload + Send)) -> Option<ResponsePayload> {
        if !self.suitable(request.get_head()) {
            return None;
        }

        let is_get = request.get_head().get_method() == http::Method::GET;

        let decoded = if is_get {
            QueryDecoder::decode_params(request.get_head().get_query())
        } else {
            QueryDecoder::decode_body(&request.take_body())
        };

        let query = match decoded {
            Ok(query) => query,
            Err(error) => {
                debug!(%error, "Failed to decode request");
                let (status_code, body) = to_transport_result(Outcome::Rejected(error.into()));
                return Some(ResponsePayload::json(status_code, &body));
            }
        };

        let outcome = if is_get {
            self.executor.execute_read_only(&query).await
        } else {
            self.executor.execute(&query).await
        };

        let (status_code, body) = match outcome {
            Ok(outcome) => to_transport_result(outcome),
            Err(fatal) => {
                error!(error = %fatal, "Fatal error while executing the operation");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": FATAL_ERROR_MESSAGE }),
                )
            }
        };

        Some(ResponsePayload::json(status_code, &body))
    }
}
