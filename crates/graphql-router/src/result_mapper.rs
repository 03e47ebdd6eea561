// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use http::StatusCode;
use serde_json::{Value, json};

use crate::outcome::Outcome;

/// The status code and JSON body for an outcome.
///
/// Success passes the engine's document through unchanged; a rejection becomes
/// `{"error": message}` with the category's status code.
pub fn to_transport_result(outcome: Outcome) -> (StatusCode, Value) {
    match outcome {
        Outcome::Success(value) => (StatusCode::OK, value),
        Outcome::Rejected(error) => (error.status_code(), json!({ "error": error.message })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{ClassifiedError, ErrorCategory};

    #[test]
    fn success() {
        let document = json!({"data": {"hello": "world"}});

        assert_eq!(
            to_transport_result(Outcome::Success(document.clone())),
            (StatusCode::OK, document)
        );
    }

    #[test]
    fn rejections() {
        for (category, status_code) in [
            (ErrorCategory::DecodeError, StatusCode::BAD_REQUEST),
            (ErrorCategory::ValidationError, StatusCode::BAD_REQUEST),
            (ErrorCategory::DepthExceeded, StatusCode::BAD_REQUEST),
            (ErrorCategory::ExecutionError, StatusCode::INTERNAL_SERVER_ERROR),
        ] {
            assert_eq!(
                to_transport_result(Outcome::Rejected(ClassifiedError::new(category, "nope"))),
                (status_code, json!({"error": "nope"}))
            );
        }
    }
}
