// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Serves GraphQL over HTTP without depending on any specific web framework.
//!
//! A request flows through [`QueryDecoder`] (and [`VariablesParser`]), [`QueryExecutor`],
//! [`ErrorClassifier`], and finally [`to_transport_result`], which produces the status code and
//! JSON body. [`GraphQLRouter`] applies the pipeline to an incoming HTTP request.
mod classifier;
mod config;
mod executor;
mod graphql_router;
mod operation_payload;
mod outcome;
mod result_mapper;

pub use classifier::ErrorClassifier;
pub use config::{ConfigError, ErrorVerbosity, QueryDepthLimit, mutations_allowed};
pub use executor::{ExecutionEngine, ExecutorConfig, QueryExecutor};
pub use graphql_router::GraphQLRouter;
pub use operation_payload::{DecodeError, Query, QueryDecoder, VariablesParser};
pub use outcome::{ClassifiedError, ErrorCategory, FatalError, Outcome};
pub use result_mapper::to_transport_result;
