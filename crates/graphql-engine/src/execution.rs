// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::types::{BaseType, OperationType, Type, TypeKind};
use futures::{FutureExt, future::BoxFuture};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;

use crate::{
    resolver::{ResolverError, ResolverRegistry},
    schema::Schema,
    validation::{
        field::{TYPENAME_FIELD, ValidatedField},
        operation::ValidatedOperation,
    },
};

/// Failure while producing the data of an already validated operation.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Error while resolving '{path}': {source}")]
    Resolver {
        path: String,
        #[source]
        source: ResolverError,
    },

    #[error("Non-null field '{path}' resolved to null")]
    NullForNonNullField { path: String },

    #[error("Field '{path}' resolved to {actual}, but {expected} was expected")]
    InvalidValue {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl ExecutionError {
    /// The response path (such as `concerts.0.venue`) of the field that failed.
    pub fn path(&self) -> &str {
        match self {
            ExecutionError::Resolver { path, .. }
            | ExecutionError::NullForNonNullField { path }
            | ExecutionError::InvalidValue { path, .. } => path,
        }
    }
}

/// Executes a validated operation against the resolvers.
///
/// Fields of a selection set are resolved concurrently, except for the top-level fields of a
/// mutation, which are resolved one after the other in document order.
pub(crate) struct OperationExecutor<'a, C>
where
    C: Send + Sync,
{
    schema: &'a Schema,
    resolvers: &'a ResolverRegistry<C>,
    context: &'a C,
}

impl<'a, C> OperationExecutor<'a, C>
where
    C: Send + Sync,
{
    pub(crate) fn new(
        schema: &'a Schema,
        resolvers: &'a ResolverRegistry<C>,
        context: &'a C,
    ) -> Self {
        Self {
            schema,
            resolvers,
            context,
        }
    }

    /// Produce the `{"data": ...}` document for the operation.
    #[instrument(
        name = "OperationExecutor::execute"
        skip_all
        fields(operation_name = ?operation.name)
        )]
    pub(crate) async fn execute(
        &self,
        operation: &ValidatedOperation,
    ) -> Result<Value, ExecutionError> {
        let root = Value::Null;
        let data = match operation.typ {
            OperationType::Mutation => {
                self.resolve_serially(&operation.root_type_name, &root, &operation.fields)
                    .await?
            }
            _ => {
                self.resolve_concurrently(&operation.root_type_name, &root, &operation.fields, "")
                    .await?
            }
        };

        let mut response = Map::new();
        response.insert("data".to_string(), data);
        Ok(Value::Object(response))
    }

    async fn resolve_serially(
        &self,
        type_name: &str,
        parent: &Value,
        fields: &[ValidatedField],
    ) -> Result<Value, ExecutionError> {
        let mut data = Map::new();
        for field in fields {
            let value = self.resolve_field(type_name, parent, field, "").await?;
            data.insert(field.output_name(), value);
        }
        Ok(Value::Object(data))
    }

    async fn resolve_concurrently(
        &self,
        type_name: &str,
        parent: &Value,
        fields: &[ValidatedField],
        path: &str,
    ) -> Result<Value, ExecutionError> {
        let values = futures::future::try_join_all(fields.iter().map(|field| async move {
            self.resolve_field(type_name, parent, field, path)
                .await
                .map(|value| (field.output_name(), value))
        }))
        .await?;

        Ok(Value::Object(values.into_iter().collect()))
    }

    async fn resolve_field(
        &self,
        type_name: &str,
        parent: &Value,
        field: &ValidatedField,
        parent_path: &str,
    ) -> Result<Value, ExecutionError> {
        let path = if parent_path.is_empty() {
            field.output_name()
        } else {
            format!("{parent_path}.{}", field.output_name())
        };

        if field.name.as_str() == TYPENAME_FIELD {
            return Ok(Value::String(type_name.to_string()));
        }

        let value = match self.resolvers.get(type_name, field.name.as_str()) {
            Some(resolver) => resolver
                .resolve_field(parent, field, self.context)
                .await
                .map_err(|source| ExecutionError::Resolver {
                    path: path.clone(),
                    source,
                })?,
            // Default resolver: the same-named property of the parent
            None => parent
                .get(field.name.as_str())
                .cloned()
                .unwrap_or(Value::Null),
        };

        self.complete_value(&field.field_type, value, field, path)
            .await
    }

    /// Shape the resolved value according to the field's type: enforce non-null, complete each
    /// element of a list, and resolve the selected subfields of an object.
    fn complete_value<'s>(
        &'s self,
        typ: &'s Type,
        value: Value,
        field: &'s ValidatedField,
        path: String,
    ) -> BoxFuture<'s, Result<Value, ExecutionError>> {
        async move {
            if value.is_null() {
                return if typ.nullable {
                    Ok(Value::Null)
                } else {
                    Err(ExecutionError::NullForNonNullField { path })
                };
            }

            match &typ.base {
                BaseType::List(element_type) => match value {
                    Value::Array(elements) => {
                        let completed = futures::future::try_join_all(
                            elements.into_iter().enumerate().map(|(index, element)| {
                                self.complete_value(
                                    element_type,
                                    element,
                                    field,
                                    format!("{path}.{index}"),
                                )
                            }),
                        )
                        .await?;
                        Ok(Value::Array(completed))
                    }
                    other => Err(ExecutionError::InvalidValue {
                        path,
                        expected: "a list",
                        actual: kind(&other),
                    }),
                },
                BaseType::Named(type_name) => {
                    let is_object = matches!(
                        self.schema
                            .get_type_definition(type_name)
                            .map(|definition| &definition.kind),
                        Some(TypeKind::Object(_))
                    );

                    match value {
                        Value::Object(_) if is_object => {
                            self.resolve_concurrently(type_name, &value, &field.subfields, &path)
                                .await
                        }
                        other if is_object => Err(ExecutionError::InvalidValue {
                            path,
                            expected: "an object",
                            actual: kind(&other),
                        }),
                        Value::Object(_) | Value::Array(_) => Err(ExecutionError::InvalidValue {
                            path,
                            expected: "a scalar",
                            actual: kind(&value),
                        }),
                        leaf => Ok(leaf),
                    }
                }
            }
        }
        .boxed()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        resolver::{FieldResolver, ValueResolver},
        test_schema::create_test_schema,
        validation::document_validator::DocumentValidator,
    };

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<String>>,
    }

    /// Records the call, then returns a concert with the given title.
    struct CreateConcert;

    #[async_trait]
    impl FieldResolver<Journal> for CreateConcert {
        async fn resolve_field(
            &self,
            _parent: &Value,
            field: &ValidatedField,
            context: &Journal,
        ) -> Result<Value, ResolverError> {
            let title = field.arguments["title"].clone();
            context
                .entries
                .lock()
                .unwrap()
                .push(title.as_str().unwrap_or_default().to_string());
            Ok(json!({"id": 1, "title": title}))
        }
    }

    struct VenueConcerts;

    #[async_trait]
    impl FieldResolver<Journal> for VenueConcerts {
        async fn resolve_field(
            &self,
            parent: &Value,
            _field: &ValidatedField,
            _context: &Journal,
        ) -> Result<Value, ResolverError> {
            let venue_id = parent["id"].as_i64().unwrap_or_default();
            Ok(json!([
                {"id": venue_id * 10, "title": "Opening night", "genre": "JAZZ"},
                {"id": venue_id * 10 + 1, "title": "Closing night", "genre": null},
            ]))
        }
    }

    struct Failing;

    #[async_trait]
    impl FieldResolver<Journal> for Failing {
        async fn resolve_field(
            &self,
            _parent: &Value,
            _field: &ValidatedField,
            _context: &Journal,
        ) -> Result<Value, ResolverError> {
            Err("venue database unavailable".into())
        }
    }

    async fn execute(
        resolvers: &ResolverRegistry<Journal>,
        context: &Journal,
        query: &str,
    ) -> Result<Value, ExecutionError> {
        let schema = create_test_schema();
        let variables = Map::new();
        let operation = DocumentValidator::new(&schema, None, &variables, 10, true)
            .validate(async_graphql_parser::parse_query(query).unwrap())
            .unwrap();

        OperationExecutor::new(&schema, resolvers, context)
            .execute(&operation)
            .await
    }

    #[tokio::test]
    async fn nested_resolution() {
        let resolvers = ResolverRegistry::new()
            .with(
                "Query",
                "venue",
                ValueResolver(json!({"id": 4, "name": "Town Hall", "published": true})),
            )
            .with("Venue", "concerts", VenueConcerts);

        let response = execute(
            &resolvers,
            &Journal::default(),
            r#"{
                venue(id: 4) {
                    __typename
                    name
                    shows: concerts { id title genre }
                }
            }"#,
        )
        .await
        .unwrap();

        assert_eq!(
            response,
            json!({
                "data": {
                    "venue": {
                        "__typename": "Venue",
                        "name": "Town Hall",
                        "shows": [
                            {"id": 40, "title": "Opening night", "genre": "JAZZ"},
                            {"id": 41, "title": "Closing night", "genre": null},
                        ]
                    }
                }
            })
        );
    }

    #[tokio::test]
    async fn missing_nullable_value() {
        let response = execute(
            &ResolverRegistry::new(),
            &Journal::default(),
            "{ concert(id: 1) { id } }",
        )
        .await
        .unwrap();

        assert_eq!(response, json!({"data": {"concert": null}}));
    }

    #[tokio::test]
    async fn null_for_non_null_field() {
        let error = execute(&ResolverRegistry::new(), &Journal::default(), "{ hello }")
            .await
            .unwrap_err();

        insta::assert_snapshot!(error, @"Non-null field 'hello' resolved to null");
    }

    #[tokio::test]
    async fn invalid_value_shape() {
        let resolvers = ResolverRegistry::new().with(
            "Query",
            "concerts",
            ValueResolver(json!([{"id": 1, "venue": "Town Hall"}])),
        );

        let error = execute(
            &resolvers,
            &Journal::default(),
            "{ concerts { venue { name } } }",
        )
        .await
        .unwrap_err();

        assert_eq!(error.path(), "concerts.0.venue");
        insta::assert_snapshot!(error, @"Field 'concerts.0.venue' resolved to a string, but an object was expected");
    }

    #[tokio::test]
    async fn resolver_error_carries_path() {
        let resolvers = ResolverRegistry::new()
            .with("Query", "venue", ValueResolver(json!({"id": 4, "name": "Town Hall"})))
            .with("Venue", "concerts", Failing);

        let error = execute(
            &resolvers,
            &Journal::default(),
            "{ v: venue(id: 4) { concerts { id } } }",
        )
        .await
        .unwrap_err();

        assert!(matches!(error, ExecutionError::Resolver { .. }));
        insta::assert_snapshot!(error, @"Error while resolving 'v.concerts': venue database unavailable");
    }

    #[tokio::test]
    async fn mutations_run_in_document_order() {
        let resolvers = ResolverRegistry::new().with("Mutation", "createConcert", CreateConcert);
        let journal = Journal::default();

        let response = execute(
            &resolvers,
            &journal,
            r#"mutation {
                first: createConcert(title: "First") { title }
                second: createConcert(title: "Second") { title }
                third: createConcert(title: "Third") { id }
            }"#,
        )
        .await
        .unwrap();

        assert_eq!(
            response,
            json!({
                "data": {
                    "first": {"title": "First"},
                    "second": {"title": "Second"},
                    "third": {"id": 1},
                }
            })
        );
        assert_eq!(
            *journal.entries.lock().unwrap(),
            vec!["First", "Second", "Third"]
        );
    }
}
