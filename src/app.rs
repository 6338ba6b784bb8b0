//! Sample application served by the `switchyard` binary.
//!
//! Exercises every kind of route: static, named, regex, chained handlers,
//! path-scoped middleware, request bodies and query strings.

use axum::http::header::{self, HeaderValue};
use axum::http::StatusCode;
use serde_json::json;

use crate::dispatch::handler::{handler, Handler};
use crate::dispatch::{reply, Context};
use crate::routing::{RegistrationError, Router};

pub const USER_AGENT: &str = "Switchyard Server (v0.1)";

const HTML: &str = "text/html";
const TEXT: &str = "text/plain";
const JSON: &str = "application/json";

const ABOUT_PAGE: &str = "<h1>About Switchyard</h1>\nThis is the about page.\n";

fn write_head(ctx: &mut Context, content_type: &'static str) {
    ctx.set_status(StatusCode::OK);
    ctx.set_response_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    ctx.set_response_header(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
}

/// Fixed page.
fn page(content_type: &'static str, body: &'static str) -> Handler {
    handler(move |ctx, _next| {
        Box::pin(async move {
            write_head(ctx, content_type);
            ctx.end_with(body);
            reply::done()
        })
    })
}

fn request_logger() -> Handler {
    handler(|ctx, next| {
        Box::pin(async move {
            tracing::debug!(
                method = %ctx.method(),
                path = %ctx.path(),
                request_id = ctx.request_id().unwrap_or("-"),
                "Handling request"
            );
            next.run(ctx).await?;
            reply::done()
        })
    })
}

fn about_user() -> Handler {
    handler(|ctx, _next| {
        Box::pin(async move {
            write_head(ctx, HTML);
            let body = format!(
                "<h1>About User Page!</h1>\nUser page for: {}\n",
                ctx.param("user_id").unwrap_or_default()
            );
            ctx.end_with(body);
            reply::done()
        })
    })
}

fn user_photo() -> Handler {
    handler(|ctx, _next| {
        Box::pin(async move {
            write_head(ctx, HTML);
            let body = format!(
                "<h1>User Photo Page!</h1>\nUser {} photo {}\n",
                ctx.param("user_id").unwrap_or_default(),
                ctx.param("photo_id").unwrap_or_default()
            );
            ctx.end_with(body);
            reply::done()
        })
    })
}

fn toronto() -> Handler {
    handler(|ctx, _next| {
        Box::pin(async move {
            write_head(ctx, HTML);
            let body = format!(
                "<h1>Toronto Canada</h1>\nCode is {}\n",
                ctx.param("code").unwrap_or_default()
            );
            ctx.end_with(body);
            reply::done()
        })
    })
}

fn chain_first(halt: bool) -> Handler {
    handler(move |ctx, next| {
        Box::pin(async move {
            write_head(ctx, HTML);
            ctx.send("<h1>Chained Handlers</h1>\n<p>This paragraph is from handler 1</p>\n");
            if halt {
                ctx.end();
            }
            next.run(ctx).await?;
            reply::done()
        })
    })
}

fn chain_second() -> Handler {
    handler(|ctx, _next| {
        Box::pin(async move {
            ctx.end_with("<p>This paragraph is from handler 2</p>\n");
            reply::done()
        })
    })
}

/// JSON echo of the request body for `/comment/:id`.
fn comment_echo(verb: &'static str) -> Handler {
    handler(move |ctx, _next| {
        Box::pin(async move {
            write_head(ctx, JSON);
            let text = String::from_utf8_lossy(ctx.body()).into_owned();
            let id = ctx.param("id").unwrap_or_default().to_string();
            reply::json(json!({
                "message": format!("{} comment with id", verb),
                "id": id,
                "text": text,
            }))
        })
    })
}

fn comment_named(verb: &'static str) -> Handler {
    handler(move |ctx, _next| {
        Box::pin(async move {
            write_head(ctx, TEXT);
            let body = format!("{} comment with id: {}", verb, ctx.param("id").unwrap_or_default());
            reply::text(body)
        })
    })
}

fn middleware_step(line: &'static str, finish: bool) -> Handler {
    handler(move |ctx, next| {
        Box::pin(async move {
            write_head(ctx, TEXT);
            if finish {
                ctx.end_with(line);
            } else {
                ctx.send(line);
                next.run(ctx).await?;
            }
            reply::done()
        })
    })
}

fn query_check() -> Handler {
    handler(|ctx, _next| {
        Box::pin(async move {
            write_head(ctx, JSON);
            reply::json(ctx.query_map(true))
        })
    })
}

/// Method, verb label, `/comment` body, `/comment/how-to` body, `/comment/:id` handler.
type CommentRoute = (&'static str, &'static str, &'static str, &'static str, fn(&'static str) -> Handler);

const COMMENT_ROUTES: [CommentRoute; 4] = [
    ("patch", "PATCH", "PATCH a fresh comment.", "PATCH How to post a comment page.", comment_echo),
    ("post", "POST", "POST a fresh comment.", "POST How to post a comment page.", comment_echo),
    ("put", "PUT", "PUT a fresh comment.", "PUT How to post a comment page.", comment_named),
    ("delete", "DELETE", "DELETE a comment.", "DELETE How to post a comment page.", comment_named),
];

/// Build the sample application.
pub fn demo_router() -> Result<Router, RegistrationError> {
    let mut router = Router::new();

    router.middleware(vec![request_logger()])?;

    router
        .get(
            "/",
            vec![handler(|ctx, _next| {
                Box::pin(async move {
                    write_head(ctx, HTML);
                    ctx.send("<h1>Switchyard</h1>\n");
                    ctx.send("<p>Welcome to Switchyard, the fast request router!</p>\n");
                    ctx.end();
                    reply::done()
                })
            })],
        )?
        .get("/about", vec![page(HTML, ABOUT_PAGE)])?
        .get("/about/:user_id", vec![about_user()])?
        .get("/user/:user_id/photo/:photo_id", vec![user_photo()])?
        .get(r"/tor+onto/:code/ca\d*n$", vec![toronto()])?
        .get("/chain", vec![chain_first(false), chain_second()])?
        .get("/chainhalt", vec![chain_first(true), chain_second()])?;

    for (method, verb, fresh, how_to, by_id) in COMMENT_ROUTES {
        router
            .route(method, "/comment", vec![page(TEXT, fresh)])?
            .route(method, "/comment/how-to", vec![page(TEXT, how_to)])?
            .route(method, "/comment/:id", vec![by_id(verb)])?;
    }

    router
        .middleware_at("/middleware", vec![middleware_step("About page Middleware 1\n", false)])?
        .middleware_at("/middleware", vec![middleware_step("About page Middleware 2\n", true)])?
        .get("/middleware", vec![page(HTML, ABOUT_PAGE)])?
        .get("/query-check", vec![query_check()])?;

    tracing::debug!(routes = router.len(), "Demo routes registered");
    Ok(router)
}
