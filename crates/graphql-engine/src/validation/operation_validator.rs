// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::{
    Positioned,
    types::{FragmentDefinition, OperationDefinition, OperationType, VariableDefinition},
};
use async_graphql_value::{ConstValue, Name};
use serde_json::{Map, Value};

use crate::{schema::Schema, validation::validation_error::ValidationError};

use super::{
    arguments_validator::coerce_value, operation::ValidatedOperation,
    selection_set_validator::SelectionSetValidator,
};

/// Context for validating an operation.
pub struct OperationValidator<'a> {
    schema: &'a Schema,
    operation_name: Option<String>,
    variables: &'a Map<String, Value>,
    fragment_definitions: HashMap<Name, Positioned<FragmentDefinition>>,
    max_depth: usize,
    allow_mutations: bool,
}

impl<'a> OperationValidator<'a> {
    #[must_use]
    pub fn new(
        schema: &'a Schema,
        operation_name: Option<String>,
        variables: &'a Map<String, Value>,
        fragment_definitions: HashMap<Name, Positioned<FragmentDefinition>>,
        max_depth: usize,
        allow_mutations: bool,
    ) -> Self {
        Self {
            schema,
            operation_name,
            variables,
            fragment_definitions,
            max_depth,
            allow_mutations,
        }
    }

    /// Validate operation. Operation defines a GraphQL top-level operation such
    /// as
    /// ```graphql
    ///    mutation create($name: String!) {
    ///       createName(name: $name) {
    ///          id
    ///       }
    ///    }
    /// ```
    ///
    /// Validations performed:
    /// - The operation type is supported by the schema (and, for mutations, allowed)
    /// - Each variables in [OperationDefinition.variable_definitions] is
    ///   available (see [`Self::validate_variables`] for details)
    /// - The selected fields are valid (see [SelectionSetValidator] for details)
    ///
    /// # Returns
    ///   A validated operation with all variables and fields resolved and normalized.
    pub(super) fn validate(
        self,
        operation: Positioned<OperationDefinition>,
    ) -> Result<ValidatedOperation, ValidationError> {
        let root_type_name = match operation.node.ty {
            OperationType::Subscription => {
                return Err(ValidationError::SubscriptionNotSupported(operation.pos));
            }
            OperationType::Mutation if !self.allow_mutations => {
                return Err(ValidationError::MutationNotAllowed(operation.pos));
            }
            operation_type => self.schema.root_type_name(operation_type).ok_or_else(|| {
                ValidationError::OperationNotFound(operation_type.to_string(), operation.pos)
            })?,
        };

        let container_type = self
            .schema
            .get_type_definition(root_type_name)
            .ok_or_else(|| {
                ValidationError::OperationNotFound(root_type_name.to_string(), operation.pos)
            })?;

        let variables = self.validate_variables(&operation.node.variable_definitions)?;
        let selection_set_validator = SelectionSetValidator::new(
            self.schema,
            &variables,
            &self.fragment_definitions,
            self.max_depth,
        );

        let fields =
            selection_set_validator.validate(container_type, &operation.node.selection_set, 1)?;

        Ok(ValidatedOperation {
            name: self.operation_name,
            typ: operation.node.ty,
            root_type_name: root_type_name.to_string(),
            fields,
        })
    }

    /// Validate variables.
    ///
    /// Each declared variable takes the value supplied in the request, else its default value,
    /// else `null` if its type is nullable. Supplied values are coerced to the declared type.
    ///
    /// # Returns
    ///   Resolved variables (note the output type uses `ConstValue` instead of
    ///   `Value` to indicate that the value has been resolved)
    fn validate_variables(
        &self,
        variable_definitions: &[Positioned<VariableDefinition>],
    ) -> Result<HashMap<Name, ConstValue>, ValidationError> {
        variable_definitions
            .iter()
            .map(|variable_definition| {
                let variable_name = &variable_definition.node.name;
                let variable_value = self.var_value(variable_definition)?;
                Ok((variable_name.node.clone(), variable_value))
            })
            .collect()
    }

    fn var_value(
        &self,
        variable_definition: &Positioned<VariableDefinition>,
    ) -> Result<ConstValue, ValidationError> {
        let name = &variable_definition.node.name;
        let var_type = &variable_definition.node.var_type.node;

        match self.variables.get(name.node.as_str()) {
            Some(supplied) => {
                let value = ConstValue::from_json(supplied.to_owned()).map_err(|e| {
                    ValidationError::MalformedVariable(name.node.to_string(), name.pos, e)
                })?;

                coerce_value(self.schema, var_type, value).map_err(|message| {
                    ValidationError::InvalidVariableType {
                        name: name.node.to_string(),
                        message,
                        pos: name.pos,
                    }
                })
            }
            None => match &variable_definition.node.default_value {
                Some(default_value) => Ok(default_value.node.clone()),
                None if var_type.nullable => Ok(ConstValue::Null),
                None => Err(ValidationError::VariableNotFound(
                    name.node.to_string(),
                    name.pos,
                )),
            },
        }
    }
}
