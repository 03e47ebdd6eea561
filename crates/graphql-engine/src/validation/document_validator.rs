// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::validation::validation_error::ValidationError;
use async_graphql_parser::types::{DocumentOperations, ExecutableDocument};
use async_graphql_value::Name;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::schema::Schema;

use super::{operation::ValidatedOperation, operation_validator::OperationValidator};

/// Context for validating a document.
pub struct DocumentValidator<'a> {
    schema: &'a Schema,
    operation_name: Option<String>,
    variables: &'a Map<String, Value>,
    max_depth: usize,
    allow_mutations: bool,
}

impl<'a> DocumentValidator<'a> {
    pub fn new(
        schema: &'a Schema,
        operation_name: Option<String>,
        variables: &'a Map<String, Value>,
        max_depth: usize,
        allow_mutations: bool,
    ) -> Self {
        Self {
            schema,
            operation_name,
            variables,
            max_depth,
            allow_mutations,
        }
    }

    /// Validate the query payload.
    ///
    /// Validations performed:
    /// - Validate that the operation name, if specified, matches an operation in the document
    /// - Validate that either there is only one operation or an operation name is specified
    /// - Validate that there is at least one operation
    /// - Other validations are delegated to the operation validator
    #[instrument(
        name = "DocumentValidator::validate"
        skip(self, document)
        )]
    pub fn validate(
        self,
        document: ExecutableDocument,
    ) -> Result<ValidatedOperation, ValidationError> {
        let (operation_name, raw_operation) = match document.operations {
            // An anonymous operation can't match a requested operation name
            DocumentOperations::Single(operation) => match self.operation_name {
                None => Ok((None, operation)),
                Some(operation_name) => {
                    Err(ValidationError::UnmatchedOperationName(operation_name))
                }
            },
            DocumentOperations::Multiple(mut operations) => {
                if operations.is_empty() {
                    Err(ValidationError::NoOperationFound)
                } else {
                    match self.operation_name {
                        None if operations.len() == 1 => {
                            // async-graphql parses a named operation (`query Foo { ... }`) to
                            // `DocumentOperations::Multiple` even if there is only one operation,
                            // so the name is required only for truly multiple operations.
                            let (operation_name, operation) = operations
                                .drain()
                                .next()
                                .ok_or(ValidationError::NoOperationFound)?;
                            Ok((Some(operation_name.to_string()), operation))
                        }
                        None => Err(ValidationError::MultipleOperationsNoOperationName),
                        Some(operation_name) => {
                            match operations.remove(&Name::new(&operation_name)) {
                                None => {
                                    Err(ValidationError::UnmatchedOperationName(operation_name))
                                }
                                Some(operation) => Ok((Some(operation_name), operation)),
                            }
                        }
                    }
                }
            }
        }?;

        let operation_validator = OperationValidator::new(
            self.schema,
            operation_name,
            self.variables,
            document.fragments,
            self.max_depth,
            self.allow_mutations,
        );

        operation_validator.validate(raw_operation)
    }
}
