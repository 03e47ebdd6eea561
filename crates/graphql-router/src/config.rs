// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::num::NonZeroUsize;

use common::env_const::{
    EXO_EXPOSE_ERROR_DETAILS, EXO_GRAPHQL_ALLOW_MUTATIONS, EXO_MAX_SELECTION_DEPTH, is_production,
};
use exo_env::{EnvError, Environment};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{EXO_MAX_SELECTION_DEPTH} must be set to a positive integer")]
    InvalidQueryDepth,

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Maximum depth of a selected field (top-level fields are at depth 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDepthLimit(NonZeroUsize);

impl QueryDepthLimit {
    const DEFAULT: usize = 5;

    pub fn new(limit: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(limit)
            .map(Self)
            .ok_or(ConfigError::InvalidQueryDepth)
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    pub fn from_env(env: &dyn Environment) -> Result<Self, ConfigError> {
        match env
            .get_parsed::<usize>(EXO_MAX_SELECTION_DEPTH)
            .map_err(|_| ConfigError::InvalidQueryDepth)?
        {
            Some(limit) => Self::new(limit),
            None => Self::new(Self::DEFAULT),
        }
    }
}

/// How much of an execution failure is revealed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorVerbosity {
    /// A generic message
    #[default]
    Concise,
    /// The underlying error message (meant only for trusted environments)
    Detailed,
}

impl ErrorVerbosity {
    /// Details are exposed only in development mode with `EXO_EXPOSE_ERROR_DETAILS` enabled.
    pub fn from_env(env: &dyn Environment) -> Result<Self, ConfigError> {
        if is_production(env) {
            return Ok(ErrorVerbosity::Concise);
        }

        Ok(if env.enabled(EXO_EXPOSE_ERROR_DETAILS, false)? {
            ErrorVerbosity::Detailed
        } else {
            ErrorVerbosity::Concise
        })
    }
}

/// Whether POST requests may run mutations (GET requests never do).
pub fn mutations_allowed(env: &dyn Environment) -> Result<bool, ConfigError> {
    Ok(env.enabled(EXO_GRAPHQL_ALLOW_MUTATIONS, true)?)
}

#[cfg(test)]
mod tests {
    use common::env_const::_EXO_DEPLOYMENT_MODE;
    use exo_env::MapEnvironment;

    use super::*;

    #[test]
    fn query_depth_limit() {
        assert_eq!(QueryDepthLimit::from_env(&MapEnvironment::new()).unwrap().get(), 5);
        assert_eq!(
            QueryDepthLimit::from_env(&MapEnvironment::from([(EXO_MAX_SELECTION_DEPTH, "12")]))
                .unwrap()
                .get(),
            12
        );

        for invalid in ["0", "-1", "deep"] {
            let env = MapEnvironment::from([(EXO_MAX_SELECTION_DEPTH, invalid)]);
            assert!(matches!(
                QueryDepthLimit::from_env(&env),
                Err(ConfigError::InvalidQueryDepth)
            ));
        }

        let env = MapEnvironment::from([(EXO_MAX_SELECTION_DEPTH, "0")]);
        let error = QueryDepthLimit::from_env(&env).unwrap_err();
        insta::assert_snapshot!(error, @"EXO_MAX_SELECTION_DEPTH must be set to a positive integer");
    }

    #[test]
    fn verbosity() {
        let dev_with_details = MapEnvironment::from([
            (_EXO_DEPLOYMENT_MODE, "dev"),
            (EXO_EXPOSE_ERROR_DETAILS, "true"),
        ]);
        assert_eq!(
            ErrorVerbosity::from_env(&dev_with_details).unwrap(),
            ErrorVerbosity::Detailed
        );

        let prod_with_details = MapEnvironment::from([(EXO_EXPOSE_ERROR_DETAILS, "true")]);
        assert_eq!(
            ErrorVerbosity::from_env(&prod_with_details).unwrap(),
            ErrorVerbosity::Concise
        );

        let dev = MapEnvironment::from([(_EXO_DEPLOYMENT_MODE, "dev")]);
        assert_eq!(ErrorVerbosity::from_env(&dev).unwrap(), ErrorVerbosity::Concise);

        let invalid = MapEnvironment::from([
            (_EXO_DEPLOYMENT_MODE, "dev"),
            (EXO_EXPOSE_ERROR_DETAILS, "maybe"),
        ]);
        assert!(matches!(
            ErrorVerbosity::from_env(&invalid),
            Err(ConfigError::Env(EnvError::InvalidBoolean { .. }))
        ));
    }

    #[test]
    fn mutations() {
        assert!(mutations_allowed(&MapEnvironment::new()).unwrap());
        assert!(
            !mutations_allowed(&MapEnvironment::from([(EXO_GRAPHQL_ALLOW_MUTATIONS, "false")]))
                .unwrap()
        );
    }
}
