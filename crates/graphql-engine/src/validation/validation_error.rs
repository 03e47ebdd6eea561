// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Pos;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0}")]
    QueryParsingFailed(String, Pos, Option<Pos>),

    #[error("Variable '{0}' not found")]
    VariableNotFound(String, Pos),

    #[error("Variable '{0}' could not be deserialized: {2}")]
    MalformedVariable(String, Pos, serde_json::Error),

    #[error("Variable '{name}' is not of a valid type: {message}")]
    InvalidVariableType {
        name: String,
        message: String,
        pos: Pos,
    },

    #[error("Fragment definition '{0}' not found")]
    FragmentDefinitionNotFound(String, Pos),

    #[error("Fragment '{0}' spreads itself")]
    FragmentCycle(String, Pos),

    #[error("Fragment on '{0}' cannot be spread within '{1}'")]
    FragmentTypeMismatch(String, String, Pos),

    #[error("No such operation '{0}'")]
    OperationNotFound(String, Pos),

    #[error("Subscriptions are not supported")]
    SubscriptionNotSupported(Pos),

    #[error("Mutations are not allowed for this request")]
    MutationNotAllowed(Pos),

    #[error("Field '{0}' is not valid for type '{1}'")]
    InvalidField(String, String, Pos),

    #[error("Field '{0}' is of a scalar type, which should not specify fields")]
    ScalarWithField(String, Pos),

    #[error("Field '{0}' of type '{1}' must select subfields")]
    ObjectWithoutFields(String, String, Pos),

    #[error("Field type '{0}' is not valid")]
    InvalidFieldType(String, Pos),

    #[error("Fields with the response name '{0}' select different fields or arguments")]
    FieldConflict(String, Pos),

    #[error("Required argument '{0}' not found")]
    RequiredArgumentNotFound(String, Pos),

    #[error("Argument(s) '{0:?}' invalid for '{1}'")]
    StrayArguments(Vec<String>, String, Pos),

    #[error("Argument '{argument_name}' is not of a valid type: {message}")]
    InvalidArgumentType {
        argument_name: String,
        message: String,
        pos: Pos,
    },

    #[error("Unknown directive '@{0}'")]
    UnknownDirective(String, Pos),

    #[error("Selection set too deep (maximum depth is {max_depth})")]
    SelectionSetTooDeep { max_depth: usize, pos: Pos },

    #[error("No operation found")]
    NoOperationFound,

    #[error("Must provide operation name if query contains multiple operations")]
    MultipleOperationsNoOperationName,

    #[error("operationName '{0}' doesn't match any operation")]
    UnmatchedOperationName(String),
}

impl ValidationError {
    /// The position in the query document this error refers to (`None` for errors that concern
    /// the document as a whole).
    pub fn position(&self) -> Option<Pos> {
        match self {
            ValidationError::QueryParsingFailed(_, pos, _) => Some(*pos),
            ValidationError::VariableNotFound(_, pos) => Some(*pos),
            ValidationError::MalformedVariable(_, pos, _) => Some(*pos),
            ValidationError::InvalidVariableType { pos, .. } => Some(*pos),
            ValidationError::FragmentDefinitionNotFound(_, pos) => Some(*pos),
            ValidationError::FragmentCycle(_, pos) => Some(*pos),
            ValidationError::FragmentTypeMismatch(_, _, pos) => Some(*pos),
            ValidationError::OperationNotFound(_, pos) => Some(*pos),
            ValidationError::SubscriptionNotSupported(pos) => Some(*pos),
            ValidationError::MutationNotAllowed(pos) => Some(*pos),
            ValidationError::InvalidField(_, _, pos) => Some(*pos),
            ValidationError::ScalarWithField(_, pos) => Some(*pos),
            ValidationError::ObjectWithoutFields(_, _, pos) => Some(*pos),
            ValidationError::InvalidFieldType(_, pos) => Some(*pos),
            ValidationError::FieldConflict(_, pos) => Some(*pos),
            ValidationError::RequiredArgumentNotFound(_, pos) => Some(*pos),
            ValidationError::StrayArguments(_, _, pos) => Some(*pos),
            ValidationError::InvalidArgumentType { pos, .. } => Some(*pos),
            ValidationError::UnknownDirective(_, pos) => Some(*pos),
            ValidationError::SelectionSetTooDeep { pos, .. } => Some(*pos),
            ValidationError::NoOperationFound => None,
            ValidationError::MultipleOperationsNoOperationName => None,
            ValidationError::UnmatchedOperationName(_) => None,
        }
    }

    pub fn is_depth_violation(&self) -> bool {
        matches!(self, ValidationError::SelectionSetTooDeep { .. })
    }
}
