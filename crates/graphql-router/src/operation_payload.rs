// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// A request that could not be turned into a [`Query`].
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Request body is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    #[error("Request payload must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("Invalid request payload: {0}")]
    InvalidShape(#[source] serde_json::Error),

    #[error("Missing 'query' in the request")]
    MissingQuery,

    #[error("'query' must not be empty")]
    EmptyQuery,

    #[error("'variables' must be a JSON object or a string containing one, found {0}")]
    InvalidVariables(&'static str),

    #[error("'variables' string is not valid JSON: {0}")]
    MalformedVariables(#[source] serde_json::Error),
}

/// A decoded GraphQL request.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    text: String,
    operation_name: Option<String>,
    variables: Map<String, Value>,
}

impl Query {
    /// Fails if `text` is empty or only whitespace.
    pub fn new(
        text: impl Into<String>,
        operation_name: Option<String>,
        variables: Map<String, Value>,
    ) -> Result<Self, DecodeError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DecodeError::EmptyQuery);
        }

        Ok(Self {
            text,
            operation_name,
            variables,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }
}

/// Normalizes the `variables` entry of a request.
///
/// GraphiQL-style clients send variables as a JSON-encoded string in GET requests, so both an
/// object and a string containing an object are accepted.
pub struct VariablesParser;

impl VariablesParser {
    /// `raw` is `None` if the request has no `variables` entry.
    pub fn parse(raw: Option<Value>) -> Result<Map<String, Value>, DecodeError> {
        match raw {
            None => Ok(Map::new()),
            Some(Value::Object(variables)) => Ok(variables),
            Some(Value::String(encoded)) => {
                let decoded = serde_json::from_str::<Value>(&encoded)
                    .map_err(DecodeError::MalformedVariables)?;

                match decoded {
                    Value::Object(variables) => Ok(variables),
                    other => Err(DecodeError::InvalidVariables(describe(&other))),
                }
            }
            Some(other) => Err(DecodeError::InvalidVariables(describe(&other))),
        }
    }
}

/// Builds a [`Query`] from the body of a POST request or the parameters of a GET request.
pub struct QueryDecoder;

impl QueryDecoder {
    pub fn decode_body(body: &[u8]) -> Result<Query, DecodeError> {
        let json = serde_json::from_slice::<Value>(body).map_err(DecodeError::NotJson)?;
        Self::decode_params(json)
    }

    /// Decode an already parsed payload (for GET, the query-string parameters as a JSON object).
    pub fn decode_params(json: Value) -> Result<Query, DecodeError> {
        #[derive(Debug, Deserialize)]
        struct RawOperationPayload {
            #[serde(rename = "operationName")]
            operation_name: Option<String>,
            query: Option<String>,
            #[serde(default, deserialize_with = "present")]
            variables: Option<Value>,
        }

        if !json.is_object() {
            return Err(DecodeError::NotAnObject(describe(&json)));
        }

        let raw_payload = serde_json::from_value::<RawOperationPayload>(json)
            .map_err(DecodeError::InvalidShape)?;

        let text = raw_payload.query.ok_or(DecodeError::MissingQuery)?;
        let operation_name = raw_payload
            .operation_name
            .filter(|operation_name| !operation_name.is_empty());
        let variables = VariablesParser::parse(raw_payload.variables)?;

        Query::new(text, operation_name, variables)
    }
}

/// Keep an explicit `null` as `Some(Value::Null)`, so that only a missing entry counts as absent.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
