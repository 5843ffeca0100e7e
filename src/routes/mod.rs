use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    AppState,
    middleware::{RateLimiter, auth_middleware, handle_panic, log_errors, rate_limit},
};

pub mod blog;
pub mod health;
pub mod user;

/// 创建完整路由：公开路由、受保护路由以及全局中间件
pub fn create_router(state: AppState) -> Router {
    create_router_with(state, Router::new())
}

/// 在内置路由之外合并额外路由，额外路由同样经过全局中间件
pub fn create_router_with(state: AppState, extra: Router<AppState>) -> Router {
    let rate_limiter = Arc::new(RateLimiter::new(state.cache.clone(), &state.config));

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/users/register", post(user::register))
        .route("/users/login", post(user::login))
        .route("/blogs", get(blog::list_blogs))
        .route("/blogs/{id}", get(blog::get_blog));

    let protected_routes = Router::new()
        .route("/users", get(user::list_users))
        .route("/users/profile", get(user::profile))
        .route("/users/logout", post(user::logout))
        .route("/blogs", post(blog::create_blog))
        .route("/blogs/{id}", delete(blog::delete_blog))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(extra);
    let router = if state.config.api_base_uri.is_empty() {
        routes
    } else {
        Router::new().nest(&state.config.api_base_uri, routes)
    };

    // 限流在认证之前执行，超出配额的请求不会进入认证流程
    let router = router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(log_errors))
        .layer(from_fn_with_state(rate_limiter, rate_limit))
        .layer(TraceLayer::new_for_http());

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}
