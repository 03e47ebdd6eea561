// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use exo_env::{EnvError, Environment};

pub const EXO_GRAPHQL_HTTP_PATH: &str = "EXO_GRAPHQL_HTTP_PATH";
pub const EXO_MAX_SELECTION_DEPTH: &str = "EXO_MAX_SELECTION_DEPTH";
pub const EXO_GRAPHQL_ALLOW_MUTATIONS: &str = "EXO_GRAPHQL_ALLOW_MUTATIONS";
pub const EXO_EXPOSE_ERROR_DETAILS: &str = "EXO_EXPOSE_ERROR_DETAILS";

pub const EXO_SERVER_PORT: &str = "EXO_SERVER_PORT";
pub const EXO_SERVER_HOST: &str = "EXO_SERVER_HOST";

pub const _EXO_DEPLOYMENT_MODE: &str = "_EXO_DEPLOYMENT_MODE"; // "dev" or "prod" (default)

#[derive(Debug, PartialEq, Eq)]
pub enum DeploymentMode {
    Dev,
    Prod,
}

pub fn get_deployment_mode(env: &dyn Environment) -> Result<DeploymentMode, EnvError> {
    match env.get(_EXO_DEPLOYMENT_MODE).as_deref() {
        Some("dev") => Ok(DeploymentMode::Dev),
        Some("prod") | None => Ok(DeploymentMode::Prod),
        Some(other) => Err(EnvError::InvalidEnum {
            env_key: _EXO_DEPLOYMENT_MODE,
            env_value: other.to_string(),
            message: "Must be one of 'dev' or 'prod'".to_string(),
        }),
    }
}

/// An invalid deployment mode is treated as production
pub fn is_production(env: &dyn Environment) -> bool {
    matches!(get_deployment_mode(env), Ok(DeploymentMode::Prod) | Err(_))
}

pub fn get_graphql_http_path(env: &dyn Environment) -> String {
    env.get(EXO_GRAPHQL_HTTP_PATH)
        .unwrap_or_else(|| "/graphql".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_env::MapEnvironment;

    #[test]
    fn deployment_mode() {
        assert!(is_production(&MapEnvironment::new()));
        assert!(is_production(&MapEnvironment::from([(
            _EXO_DEPLOYMENT_MODE,
            "prod"
        )])));
        assert!(is_production(&MapEnvironment::from([(
            _EXO_DEPLOYMENT_MODE,
            "yolo"
        )])));
        assert!(!is_production(&MapEnvironment::from([(
            _EXO_DEPLOYMENT_MODE,
            "dev"
        )])));
    }

    #[test]
    fn graphql_path() {
        assert_eq!(get_graphql_http_path(&MapEnvironment::new()), "/graphql");
        assert_eq!(
            get_graphql_http_path(&MapEnvironment::from([(EXO_GRAPHQL_HTTP_PATH, "/api/gql")])),
            "/api/gql"
        );
    }
}
