// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A small GraphQL execution engine.
//!
//! The engine loads a schema from SDL, validates incoming documents against it (including a
//! selection depth limit), and executes them by calling registered [`FieldResolver`]s. All
//! validation happens before any resolver is invoked.

mod engine;
mod execution;
mod resolver;
pub mod schema;
pub mod validation;

pub use engine::{Engine, EngineError, EngineFault, Request};
pub use execution::ExecutionError;
pub use resolver::{FieldResolver, ResolverError, ResolverRegistry, ValueResolver};
pub use schema::{Schema, SchemaError};
pub use validation::field::ValidatedField;
pub use validation::validation_error::ValidationError;

#[cfg(test)]
pub(crate) mod test_schema;
