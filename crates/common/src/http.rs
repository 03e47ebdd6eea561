// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;

pub trait RequestPayload {
    fn get_head(&self) -> &(dyn RequestHead + Send + Sync);
    /// Take the raw body. Subsequent calls return an empty body.
    fn take_body(&mut self) -> Bytes;
}

#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self { inner: vec![] }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let key = key.to_lowercase();
        self.inner
            .iter()
            .find(|(k, _)| k == &key)
            .map(|(_, v)| v.clone())
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.inner.push((key.to_lowercase(), value.to_string()));
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

pub struct ResponsePayload {
    pub body: ResponseBody,
    pub headers: Headers,
    pub status_code: StatusCode,
}

impl ResponsePayload {
    /// A response with a JSON body and the matching content type.
    pub fn json(status_code: StatusCode, body: &Value) -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type", "application/json");

        Self {
            body: ResponseBody::Bytes(body.to_string().into_bytes()),
            headers,
            status_code,
        }
    }
}

pub enum ResponseBody {
    Bytes(Vec<u8>),
    None,
}

impl ResponseBody {
    /// Parse the body as JSON (`None` if the body is empty or not JSON).
    pub fn to_json(&self) -> Option<Value> {
        match self {
            ResponseBody::Bytes(bytes) => serde_json::from_slice(bytes).ok(),
            ResponseBody::None => None,
        }
    }
}

/// Represents a HTTP request from which information can be extracted
pub trait RequestHead {
    fn get_method(&self) -> http::Method;

    fn get_path(&self) -> String;

    /// Query-string parameters as a JSON object (each value is a string)
    fn get_query(&self) -> Value;
}
