// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use actix_web::{App, HttpServer, middleware, web};

use graphql_engine::SchemaError;
use graphql_router::{ConfigError, GraphQLRouter};
use server_actix::{
    configure_router,
    demo_schema::{DemoContext, demo_engine},
};
use thiserror::Error;
use tracing_actix_web::TracingLogger;

use std::net::SocketAddr;
use std::time::Instant;
use std::{io::ErrorKind, sync::Arc};

use common::env_const::{
    DeploymentMode, EXO_SERVER_HOST, EXO_SERVER_PORT, get_deployment_mode, get_graphql_http_path,
};

use exo_env::{Environment, SystemEnvironment};

const DEFAULT_SERVER_PORT: u16 = 9876;

#[derive(Error)]
enum ServerError {
    #[error("Port {0} is already in use. Check if there is another process running at that port.")]
    PortInUse(u16),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    EnvError(#[from] exo_env::EnvError),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Schema(#[from] SchemaError),
}

// A custom `Debug` implementation for `ServerError` (that delegate to the `Display` impl), so that
// we don't print the default `Debug` implementation's message when the server exits.
impl std::fmt::Debug for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

/// Serve the demo schema over GraphQL
#[actix_web::main]
async fn main() -> Result<(), ServerError> {
    let start_time = Instant::now();

    common::logging_tracing::init();

    let env: Arc<dyn Environment> = Arc::new(SystemEnvironment);

    let router = web::Data::new(GraphQLRouter::from_env(
        Arc::new(demo_engine()?),
        Arc::new(DemoContext::new()),
        env.clone(),
    )?);

    let server_port = env
        .as_ref()
        .get_parsed::<u16>(EXO_SERVER_PORT)?
        .unwrap_or(DEFAULT_SERVER_PORT);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::new(
                middleware::TrailingSlash::Trim,
            ))
            .configure(configure_router(router.clone()))
    });

    let server = match env.get(EXO_SERVER_HOST) {
        Some(host) => server.bind((host, server_port)),
        None => match get_deployment_mode(env.as_ref()) {
            // Binding to "localhost" covers both the IPv4 and IPv6 loopback addresses
            Ok(DeploymentMode::Dev) => server.bind(("localhost", server_port)),
            // All interfaces, so that the server is reachable from outside the host (or container).
            // An invalid mode counts as production.
            Ok(DeploymentMode::Prod) | Err(_) => server.bind(("0.0.0.0", server_port)),
        },
    };

    match server {
        Ok(server) => {
            let pretty_addr = pretty_addr(&server.addrs());

            println!(
                "Started server on {} in {:.2} ms",
                pretty_addr,
                start_time.elapsed().as_micros() as f64 / 1000.0
            );
            println!("- GraphQL endpoint hosted at:");
            println!(
                "\thttp://{pretty_addr}{}",
                get_graphql_http_path(env.as_ref())
            );

            Ok(server.run().await?)
        }
        Err(e) => Err(if e.kind() == ErrorKind::AddrInUse {
            ServerError::PortInUse(server_port)
        } else {
            ServerError::Io(e)
        }),
    }
}

fn pretty_addr(addrs: &[SocketAddr]) -> String {
    let loopback_addr = addrs.iter().find(|addr| addr.ip().is_loopback());

    match loopback_addr {
        Some(addr) => format!("localhost:{}", addr.port()),
        None => match addrs {
            // Print single address without square brackets
            [addr] => format!("{addr}"),
            _ => {
                format!("{addrs:?}")
            }
        },
    }
}
