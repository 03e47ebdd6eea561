// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

pub mod demo_schema;
mod request;

use actix_web::{
    HttpRequest, HttpResponse,
    web::{self, ServiceConfig},
};
use http::StatusCode;
use serde_json::Value;

use common::http::{ResponseBody, ResponsePayload};
use common::router::Router;
use graphql_router::GraphQLRouter;
use request::{ActixRequestHead, ActixRequestPayload};

macro_rules! error_msg {
    ($msg:literal) => {
        concat!("{\"error\":\"", $msg, "\"}").as_bytes()
    };
}

pub fn configure_router<C>(router: web::Data<GraphQLRouter<C>>) -> impl FnOnce(&mut ServiceConfig)
where
    C: Send + Sync + 'static,
{
    move |app| {
        app.app_data(router).default_service(web::to(resolve::<C>));
    }
}

/// Resolve a GraphQL request (GET with query-string parameters or POST with a JSON body)
async fn resolve<C>(
    http_request: HttpRequest,
    body: web::Bytes,
    query: web::Query<Value>,
    router: web::Data<GraphQLRouter<C>>,
) -> HttpResponse
where
    C: Send + Sync + 'static,
{
    let mut request = ActixRequestPayload::new(
        ActixRequestHead::from_request(&http_request, query.into_inner()),
        body,
    );

    match router.route(&mut request).await {
        Some(ResponsePayload {
            body,
            headers,
            status_code,
        }) => {
            let actix_status_code = match to_actix_status_code(status_code) {
                Ok(status_code) => status_code,
                Err(err) => {
                    tracing::error!("Invalid status code: {}", err);
                    return HttpResponse::build(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
                        .content_type("application/json")
                        .body(error_msg!("Invalid status code"));
                }
            };

            let mut builder = HttpResponse::build(actix_status_code);

            for header in headers.into_iter() {
                builder.append_header(header);
            }

            match body {
                ResponseBody::Bytes(bytes) => builder.body(bytes),
                ResponseBody::None => builder.finish(),
            }
        }
        None => HttpResponse::NotFound().finish(),
    }
}

fn to_actix_status_code(status_code: StatusCode) -> Result<actix_web::http::StatusCode, String> {
    actix_web::http::StatusCode::from_u16(status_code.as_u16())
        .map_err(|_| "Invalid status code".to_string())
}
