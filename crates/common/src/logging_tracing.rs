// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Logging setup.
//!
//! Set `EXO_LOG` to control the log level, using the same syntax as `RUST_LOG` (for example
//! `EXO_LOG=graphql_router=debug,info`). Defaults to `warn`.

use tracing_subscriber::{EnvFilter, filter::LevelFilter, prelude::*};

const EXO_LOG: &str = "EXO_LOG";

/// Initialize the tracing subscriber with a compact `fmt` layer.
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer().compact();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(EXO_LOG)
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
