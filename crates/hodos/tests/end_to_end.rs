//! Configuration to response: load routes, route a request, run its middleware.

use bytes::Bytes;
use hodos::middleware::{BoxFuture, Request, Response};
use hodos::prelude::*;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use std::sync::Arc;

const CONFIG: &str = r#"
[logging]
enabled = false

[routing]
extensions = ["json"]

[[routing.routes]]
template = "/articles/:id"
name = "article"
defaults = { controller = "Articles", action = "view" }
patterns = { id = "[0-9]+" }
pass = ["id"]

[[routing.routes]]
template = "/admin/:controller/:action/*"
defaults = { prefix = "admin" }

[[routing.routes]]
template = "/:controller/:action/*"

[[routing.middleware]]
name = "trace"
handler = "trace_header"

[[routing.middleware]]
name = "auth"
handler = "token_auth"

[[routing.scopes]]
path = "/"
middleware = ["trace"]

[[routing.scopes]]
path = "/admin"
middleware = ["auth", "trace"]
"#;

#[derive(Debug, Default, Clone)]
struct Trail(Vec<String>);

fn record(ctx: &mut MiddlewareContext, entry: &str) {
    let mut trail = ctx.remove_extension::<Trail>().unwrap_or_default();
    trail.0.push(entry.to_string());
    ctx.set_extension(trail);
}

fn catalog() -> MiddlewareCatalog {
    let trace: BoxedMiddleware = Arc::new(FnMiddleware::new("trace_header", |ctx, req, next| {
        Box::pin(async move {
            record(ctx, "trace");
            let request_id = ctx.request_id().to_string();
            let mut response = next.run(ctx, req).await;
            response
                .headers_mut()
                .insert("x-request-id", request_id.parse().unwrap());
            response
        })
    }));
    let auth: BoxedMiddleware = Arc::new(FnMiddleware::new("token_auth", |ctx, req, next| {
        Box::pin(async move {
            record(ctx, "auth");
            if req.headers().contains_key(http::header::AUTHORIZATION) {
                next.run(ctx, req).await
            } else {
                Response::error(StatusCode::UNAUTHORIZED, "missing credentials")
            }
        })
    }));
    MiddlewareCatalog::new()
        .with("trace_header", trace)
        .with("token_auth", auth)
}

fn load_routes() -> SharedRoutes {
    let config = ConfigLoader::new()
        .with_string(CONFIG, "toml")
        .unwrap()
        .load()
        .unwrap();
    init_logging(&config.logging.to_log_config()).unwrap();
    SharedRoutes::new(build_routes(&config.routing, &catalog()).unwrap())
}

fn request(method: Method, uri: &str, authorized: bool) -> Request {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if authorized {
        builder = builder.header(http::header::AUTHORIZATION, "Bearer token");
    }
    builder.body(Full::new(Bytes::new())).unwrap()
}

/// Routes one request the way a dispatcher would.
async fn handle(routes: &SharedRoutes, request: Request) -> (Response, MiddlewareContext) {
    let routes = routes.snapshot();
    let mut ctx = MiddlewareContext::new();

    let params = match routes.parse_request(&request) {
        Ok(params) => params,
        Err(err) => return (Response::error(err.status_code(), &err.to_string()), ctx),
    };
    if let Some(template) = params.get_str(keys::MATCHED_ROUTE) {
        ctx.set_matched_route(template);
    }

    let queue = MiddlewareQueue::new(routes.matching_middleware(request.uri().path()));
    let endpoint = move |_ctx: &mut MiddlewareContext, _req: Request| -> BoxFuture<'static, Response> {
        let body = params.to_string();
        Box::pin(async move { http::Response::new(Full::new(Bytes::from(body))) })
    };
    let response = queue.run(&mut ctx, request, endpoint).await;
    (response, ctx)
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_public_route_runs_root_scope_only() {
    let routes = load_routes();

    let (response, ctx) = handle(&routes, request(Method::GET, "/articles/42.json?ref=feed", false)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(ctx.matched_route(), Some("/articles/:id"));
    assert_eq!(ctx.get_extension::<Trail>().unwrap().0, vec!["trace"]);

    let body = body_text(response).await;
    assert!(body.contains("controller: \"Articles\""));
    assert!(body.contains("pass: [\"42\"]"));
    assert!(body.contains("_ext: \"json\""));
    assert!(body.contains("ref: \"feed\""));
}

#[tokio::test]
async fn test_admin_scope_short_circuits_without_credentials() {
    let routes = load_routes();

    let (response, ctx) = handle(&routes, request(Method::GET, "/admin/users/index", false)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.get_extension::<Trail>().unwrap().0, vec!["trace", "auth"]);

    let (response, _) = handle(&routes, request(Method::GET, "/admin/users/index", true)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("prefix: \"admin\""));
    assert!(body.contains("controller: \"users\""));
}

#[tokio::test]
async fn test_unknown_url_is_not_found() {
    let routes = load_routes();

    let (response, ctx) = handle(&routes, request(Method::DELETE, "/nowhere", false)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(ctx.get_extension::<Trail>().is_none());
    assert_eq!(
        body_text(response).await,
        "A \"DELETE\" route matching \"/nowhere\" could not be found."
    );
}

#[tokio::test]
async fn test_reverse_routing_after_hot_swap() {
    let routes = load_routes();
    let ctx = UrlContext::new().with_base("/blog");
    let article: Params = [("_name", "article"), ("id", "7")].into_iter().collect();

    assert_eq!(
        routes.snapshot().match_params(&article, &ctx).unwrap(),
        "/blog/articles/7"
    );

    let in_flight = routes.snapshot();
    routes
        .update(|collection| {
            collection.add(
                TemplateRoute::builder("/posts/:id")
                    .default("controller", "Articles")
                    .default("action", "view")
                    .build()?,
                RouteOptions::named("post"),
            )
        })
        .unwrap();

    let post: Params = [("_name", "post"), ("id", "7")].into_iter().collect();
    assert!(in_flight.match_params(&post, &ctx).is_err());
    assert_eq!(
        routes.snapshot().match_params(&post, &ctx).unwrap(),
        "/blog/posts/7"
    );
}
