// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The schema served by the binary.

use std::time::Instant;

use async_trait::async_trait;
use graphql_engine::{
    Engine, FieldResolver, ResolverError, ResolverRegistry, Schema, SchemaError, ValidatedField,
    ValueResolver,
};
use serde_json::{Value, json};

const DEMO_SDL: &str = r#"
    type Server {
        version: String!
        uptime: Float!
    }

    type Query {
        hello: String!
        greet(name: String = "world"): String!
        server: Server!
    }
"#;

/// The root context shared by all requests.
pub struct DemoContext {
    started_at: Instant,
}

impl DemoContext {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }
}

impl Default for DemoContext {
    fn default() -> Self {
        Self::new()
    }
}

struct GreetResolver;

#[async_trait]
impl FieldResolver<DemoContext> for GreetResolver {
    async fn resolve_field(
        &self,
        _parent: &Value,
        field: &ValidatedField,
        _context: &DemoContext,
    ) -> Result<Value, ResolverError> {
        let name = field
            .arguments
            .get("name")
            .and_then(Value::as_str)
            .ok_or("missing 'name' argument")?;

        Ok(json!(format!("Hello, {name}!")))
    }
}

struct ServerResolver;

#[async_trait]
impl FieldResolver<DemoContext> for ServerResolver {
    async fn resolve_field(
        &self,
        _parent: &Value,
        _field: &ValidatedField,
        context: &DemoContext,
    ) -> Result<Value, ResolverError> {
        Ok(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "uptime": context.started_at.elapsed().as_secs_f64(),
        }))
    }
}

pub fn demo_engine() -> Result<Engine<DemoContext>, SchemaError> {
    let resolvers = ResolverRegistry::new()
        .with("Query", "hello", ValueResolver(json!("Hello, world!")))
        .with("Query", "greet", GreetResolver)
        .with("Query", "server", ServerResolver);

    Engine::new(Schema::from_sdl(DEMO_SDL)?, resolvers)
}

#[cfg(test)]
mod tests {
    use graphql_engine::Request;
    use serde_json::Map;

    use super::*;

    async fn execute(query: &str) -> Value {
        let engine = demo_engine().unwrap();
        let variables = Map::new();
        let request = Request {
            query,
            operation_name: None,
            variables: &variables,
            max_depth: 5,
            allow_mutations: true,
        };

        engine.execute(request, &DemoContext::new()).await.unwrap()
    }

    #[tokio::test]
    async fn greetings() {
        assert_eq!(
            execute(r#"{ hello greet greetAda: greet(name: "Ada") }"#).await,
            json!({
                "data": {"hello": "Hello, world!", "greet": "Hello, world!", "greetAda": "Hello, Ada!"}
            })
        );
    }

    #[tokio::test]
    async fn server_info() {
        let response = execute("{ server { version uptime } }").await;

        assert_eq!(
            response["data"]["server"]["version"],
            json!(env!("CARGO_PKG_VERSION"))
        );
        assert!(response["data"]["server"]["uptime"].is_f64());
    }
}
