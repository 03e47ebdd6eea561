// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use graphql_engine::{EngineError, ExecutionError, ValidationError};
use tracing::{debug, warn};

use crate::{
    config::ErrorVerbosity,
    outcome::{ClassifiedError, ErrorCategory, FatalError},
};

const EXECUTION_ERROR_MESSAGE: &str = "Error while executing the operation";

/// Assigns every engine failure a category, or declares it fatal.
///
/// Only validation errors (including depth violations) and execution errors are recognized;
/// anything else is returned as a [`FatalError`] rather than guessed at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier {
    verbosity: ErrorVerbosity,
}

impl ErrorClassifier {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        Self { verbosity }
    }

    pub fn classify(&self, failure: EngineError) -> Result<ClassifiedError, FatalError> {
        if let Some(error) = failure.downcast_ref::<ValidationError>() {
            debug!(%error, "Operation failed validation");

            let category = if error.is_depth_violation() {
                ErrorCategory::DepthExceeded
            } else {
                ErrorCategory::ValidationError
            };
            return Ok(ClassifiedError::new(category, with_position(error)));
        }

        if let Some(error) = failure.downcast_ref::<ExecutionError>() {
            warn!(%error, path = error.path(), "Error while executing the operation");

            let message = match self.verbosity {
                ErrorVerbosity::Concise => EXECUTION_ERROR_MESSAGE.to_string(),
                ErrorVerbosity::Detailed => error.to_string(),
            };
            return Ok(ClassifiedError::new(ErrorCategory::ExecutionError, message));
        }

        Err(FatalError { cause: failure })
    }
}

fn with_position(error: &ValidationError) -> String {
    match error.position() {
        // Line 0 marks an unknown position
        Some(pos) if pos.line > 0 => {
            format!("{error} (line {}, column {})", pos.line, pos.column)
        }
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use graphql_engine::EngineFault;

    use super::*;

    fn validation_error(query: &str, max_depth: usize) -> EngineError {
        let schema = graphql_engine::Schema::from_sdl(
            "type Query { hello: String, nested: Nested } type Nested { inner: Nested, leaf: Int }",
        )
        .unwrap();
        let engine =
            graphql_engine::Engine::<()>::new(schema, graphql_engine::ResolverRegistry::new())
                .unwrap();
        let variables = serde_json::Map::new();

        let request = graphql_engine::Request {
            query,
            operation_name: None,
            variables: &variables,
            max_depth,
            allow_mutations: true,
        };

        Box::new(engine.validate(&request).unwrap_err())
    }

    fn execution_error() -> EngineError {
        Box::new(ExecutionError::Resolver {
            path: "hello".to_string(),
            source: "connection refused (10.0.0.7:5432)".into(),
        })
    }

    #[test]
    fn validation_errors() {
        let classified = ErrorClassifier::default()
            .classify(validation_error("{ goodbye }", 5))
            .unwrap();

        assert_eq!(classified.category, ErrorCategory::ValidationError);
        insta::assert_snapshot!(classified.message, @"Field 'goodbye' is not valid for type 'Query' (line 1, column 3)");
    }

    #[test]
    fn depth_violations() {
        let classified = ErrorClassifier::default()
            .classify(validation_error("{ nested { inner { leaf } } }", 2))
            .unwrap();

        assert_eq!(classified.category, ErrorCategory::DepthExceeded);
        insta::assert_snapshot!(classified.message, @"Selection set too deep (maximum depth is 2) (line 1, column 20)");
    }

    #[test]
    fn execution_errors_hide_details_by_default() {
        let classified = ErrorClassifier::default()
            .classify(execution_error())
            .unwrap();

        assert_eq!(classified.category, ErrorCategory::ExecutionError);
        assert!(!classified.message.contains("connection refused"));
        insta::assert_snapshot!(classified.message, @"Error while executing the operation");

        let detailed = ErrorClassifier::new(ErrorVerbosity::Detailed)
            .classify(execution_error())
            .unwrap();
        insta::assert_snapshot!(detailed.message, @"Error while resolving 'hello': connection refused (10.0.0.7:5432)");
    }

    #[test]
    fn unrecognized_failures_are_fatal() {
        #[derive(Debug, thiserror::Error)]
        #[error("out of file descriptors")]
        struct Exhausted;

        for failure in [
            Box::new(EngineFault::ResolverPanicked("boom".to_string())) as EngineError,
            Box::new(Exhausted),
            "opaque failure".into(),
        ] {
            let fatal = ErrorClassifier::new(ErrorVerbosity::Detailed)
                .classify(failure)
                .unwrap_err();
            assert!(fatal.to_string().starts_with("Unclassified engine failure: "));
        }
    }
}
