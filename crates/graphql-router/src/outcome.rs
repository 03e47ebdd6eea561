// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use graphql_engine::EngineError;
use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::operation_payload::DecodeError;

/// The result of handling one request, as a value.
///
/// Failures the classifier doesn't recognize are not an `Outcome`: they travel as [`FatalError`]
/// in the error channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Rejected(ClassifiedError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    DecodeError,
    ValidationError,
    DepthExceeded,
    ExecutionError,
}

impl ErrorCategory {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorCategory::DecodeError
            | ErrorCategory::ValidationError
            | ErrorCategory::DepthExceeded => StatusCode::BAD_REQUEST,
            ErrorCategory::ExecutionError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A failure that is reported to the client as `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.category.status_code()
    }
}

impl From<DecodeError> for ClassifiedError {
    fn from(error: DecodeError) -> Self {
        ClassifiedError::new(ErrorCategory::DecodeError, error.to_string())
    }
}

/// An engine failure of an unrecognized shape.
#[derive(Error, Debug)]
#[error("Unclassified engine failure: {cause}")]
pub struct FatalError {
    #[source]
    pub cause: EngineError,
}
