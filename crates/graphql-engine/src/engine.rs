// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{any::Any, panic::AssertUnwindSafe};

use async_graphql_parser::{Pos, types::ExecutableDocument};
use futures::FutureExt;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::{
    execution::OperationExecutor,
    resolver::ResolverRegistry,
    schema::{Schema, SchemaError},
    validation::{
        document_validator::DocumentValidator, operation::ValidatedOperation,
        validation_error::ValidationError,
    },
};

/// Error returned by [`Engine::execute`].
///
/// Either a [`ValidationError`], an [`crate::ExecutionError`], or an [`EngineFault`]; callers
/// distinguish them by downcasting.
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of the engine itself (as opposed to problems with the request or with resolving a
/// field).
#[derive(Error, Debug)]
pub enum EngineFault {
    #[error("Resolver panicked: {0}")]
    ResolverPanicked(String),
}

/// A single GraphQL request to execute.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub query: &'a str,
    pub operation_name: Option<&'a str>,
    pub variables: &'a Map<String, Value>,
    /// Maximum depth of a selected field (top-level fields are at depth 1).
    pub max_depth: usize,
    pub allow_mutations: bool,
}

/// A schema together with the resolvers for its fields.
pub struct Engine<C>
where
    C: Send + Sync,
{
    schema: Schema,
    resolvers: ResolverRegistry<C>,
}

impl<C> Engine<C>
where
    C: Send + Sync,
{
    /// Fails if a resolver is registered for a field the schema doesn't define.
    pub fn new(schema: Schema, resolvers: ResolverRegistry<C>) -> Result<Self, SchemaError> {
        if let Some((type_name, field_name)) = resolvers
            .targets()
            .find(|(type_name, field_name)| schema.get_field(type_name, field_name).is_none())
        {
            return Err(SchemaError::UnknownResolverTarget {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
            });
        }

        Ok(Self { schema, resolvers })
    }

    /// Parse and validate the request without invoking any resolver.
    pub fn validate(&self, request: &Request<'_>) -> Result<ValidatedOperation, ValidationError> {
        let document = parse_query(request.query)?;

        let document_validator = DocumentValidator::new(
            &self.schema,
            request.operation_name.map(|name| name.to_string()),
            request.variables,
            request.max_depth,
            request.allow_mutations,
        );

        document_validator.validate(document)
    }

    /// Validate and execute the request, producing the `{"data": ...}` document.
    ///
    /// Resolvers are invoked only if validation succeeds. A panicking resolver is reported as
    /// [`EngineFault::ResolverPanicked`].
    #[instrument(
        name = "Engine::execute"
        skip_all
        fields(operation_name = ?request.operation_name)
        )]
    pub async fn execute(&self, request: Request<'_>, context: &C) -> Result<Value, EngineError> {
        let operation = self.validate(&request)?;
        debug!(fields = operation.fields.len(), "Validated operation");

        let executor = OperationExecutor::new(&self.schema, &self.resolvers, context);

        match AssertUnwindSafe(executor.execute(&operation))
            .catch_unwind()
            .await
        {
            Ok(result) => Ok(result?),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "Resolver panicked");
                Err(EngineFault::ResolverPanicked(message).into())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[instrument(name = "engine::parse_query")]
fn parse_query(query: &str) -> Result<ExecutableDocument, ValidationError> {
    async_graphql_parser::parse_query(query).map_err(|error| {
        debug!(%error, "Failed to parse query");
        let (message, pos1, pos2) = match error {
            async_graphql_parser::Error::Syntax {
                message,
                start,
                end,
            } => {
                // The syntax message is a multi-line source excerpt; keep the `= expected ...` line
                let detail = message
                    .lines()
                    .map(str::trim)
                    .find_map(|line| line.strip_prefix("= "))
                    .unwrap_or("unexpected input")
                    .to_string();
                (format!("Syntax error: {detail}"), start, end)
            }
            async_graphql_parser::Error::MultipleOperations {
                anonymous,
                operation,
            } => (
                "Multiple operations".to_string(),
                anonymous,
                Some(operation),
            ),
            async_graphql_parser::Error::OperationDuplicated {
                operation,
                first,
                second,
            } => (
                format!("Operation {operation} duplicated"),
                first,
                Some(second),
            ),
            async_graphql_parser::Error::FragmentDuplicated {
                fragment,
                first,
                second,
            } => (
                format!("Fragment {fragment} duplicated"),
                first,
                Some(second),
            ),
            async_graphql_parser::Error::MissingOperation => {
                ("Missing operation".to_string(), Pos::default(), None)
            }
            _ => ("Unknown error".to_string(), Pos::default(), None),
        };

        ValidationError::QueryParsingFailed(message, pos1, pos2)
    })
}
