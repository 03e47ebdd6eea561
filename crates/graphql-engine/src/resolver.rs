// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

use crate::validation::field::ValidatedField;

/// Error produced by application code while resolving a field.
///
/// Kept opaque so that resolvers can surface any error type; the engine reports it along with the
/// path of the failing field.
pub type ResolverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Produces the value of a field.
///
/// For a top-level field, `parent` is `null`. For nested fields, it is the value produced for the
/// enclosing field (so a resolver for `Venue.concerts` receives the venue object).
#[async_trait]
pub trait FieldResolver<C>: Send + Sync
where
    C: Send + Sync,
{
    async fn resolve_field(
        &self,
        parent: &Value,
        field: &ValidatedField,
        context: &C,
    ) -> Result<Value, ResolverError>;
}

/// A resolver that always returns the same value.
#[derive(Debug, Clone)]
pub struct ValueResolver(pub Value);

#[async_trait]
impl<C> FieldResolver<C> for ValueResolver
where
    C: Send + Sync,
{
    async fn resolve_field(
        &self,
        _parent: &Value,
        _field: &ValidatedField,
        _context: &C,
    ) -> Result<Value, ResolverError> {
        Ok(self.0.clone())
    }
}

/// Resolvers keyed by type name and field name.
///
/// Fields without a registered resolver take the same-named property of the parent value.
pub struct ResolverRegistry<C>
where
    C: Send + Sync,
{
    resolvers: HashMap<String, HashMap<String, Arc<dyn FieldResolver<C>>>>,
}

impl<C> Default for ResolverRegistry<C>
where
    C: Send + Sync,
{
    fn default() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }
}

impl<C> ResolverRegistry<C>
where
    C: Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(
        mut self,
        type_name: &str,
        field_name: &str,
        resolver: impl FieldResolver<C> + 'static,
    ) -> Self {
        self.register(type_name, field_name, resolver);
        self
    }

    pub fn register(
        &mut self,
        type_name: &str,
        field_name: &str,
        resolver: impl FieldResolver<C> + 'static,
    ) {
        self.resolvers
            .entry(type_name.to_string())
            .or_default()
            .insert(field_name.to_string(), Arc::new(resolver));
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&Arc<dyn FieldResolver<C>>> {
        self.resolvers.get(type_name)?.get(field_name)
    }

    /// The `(type name, field name)` pairs with a registered resolver.
    pub fn targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolvers.iter().flat_map(|(type_name, fields)| {
            fields
                .keys()
                .map(move |field_name| (type_name.as_str(), field_name.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        let registry: ResolverRegistry<()> = ResolverRegistry::new()
            .with("Query", "hello", ValueResolver(Value::from("world")))
            .with("Query", "answer", ValueResolver(Value::from(42)));

        assert!(registry.get("Query", "hello").is_some());
        assert!(registry.get("Query", "goodbye").is_none());
        assert!(registry.get("Mutation", "hello").is_none());

        let mut targets = registry.targets().collect::<Vec<_>>();
        targets.sort();
        assert_eq!(targets, vec![("Query", "answer"), ("Query", "hello")]);
    }
}
