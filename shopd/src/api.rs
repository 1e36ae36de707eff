//! HTTP API for the shop daemon.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Orders (place, get, list, delete)
//! - Products (CRUD)
//! - Users (CRUD)
//!
//! Every error body is `{"error": "<message>"}`. Status codes follow the
//! workflow error class: 400 for bad input, 404 for missing entities,
//! 500 for storage and transaction failures.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use uuid::Uuid;

use shop_domain::{
    NewOrder, NewProduct, NewUser, Order, Product, ProductUpdate, User, UserUpdate,
};
use shop_store::UnitOfWork;
use shop_workflow::{OrderError, OrderService, ProductService, UserService};

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState<U: UnitOfWork + 'static> {
    pub orders: OrderService<U>,
    pub products: ProductService<U>,
    pub users: UserService<U>,
}

impl<U: UnitOfWork + 'static> ApiState<U> {
    /// Build all services over one store.
    pub fn new(store: Arc<U>) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            products: ProductService::new(store.clone()),
            users: UserService::new(store),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router<U>(state: Arc<ApiState<U>>) -> Router
where
    U: UnitOfWork + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/orders", get(list_orders_handler::<U>).post(create_order_handler::<U>))
        .route("/api/orders/:id", get(get_order_handler::<U>).delete(delete_order_handler::<U>))
        .route(
            "/api/products",
            get(list_products_handler::<U>).post(create_product_handler::<U>),
        )
        .route(
            "/api/products/:id",
            get(get_product_handler::<U>)
                .put(update_product_handler::<U>)
                .delete(delete_product_handler::<U>),
        )
        .route("/api/users", get(list_users_handler::<U>).post(create_user_handler::<U>))
        .route(
            "/api/users/:id",
            get(get_user_handler::<U>)
                .put(update_user_handler::<U>)
                .delete(delete_user_handler::<U>),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// Orders

async fn create_order_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let request = parse_body(body)?;
    let order = state.orders.create_order(request).await.map_err(to_error_response)?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Order>> {
    let id = parse_id(id)?;
    let order = state.orders.get_order(id).await.map_err(to_error_response)?;
    Ok(Json(order))
}

async fn list_orders_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
) -> ApiResult<Json<Vec<Order>>> {
    let orders = state.orders.list_orders().await.map_err(to_error_response)?;
    Ok(Json(orders))
}

async fn delete_order_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = parse_id(id)?;
    state.orders.delete_order(id).await.map_err(to_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// Products

async fn create_product_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let params = parse_body(body)?;
    let product = state.products.create(params).await.map_err(to_error_response)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Product>> {
    let id = parse_id(id)?;
    let product = state.products.get(id).await.map_err(to_error_response)?;
    Ok(Json(product))
}

async fn list_products_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.products.list().await.map_err(to_error_response)?;
    Ok(Json(products))
}

async fn update_product_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ProductUpdate>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let id = parse_id(id)?;
    let update = parse_body(body)?;
    let product = state.products.update(id, update).await.map_err(to_error_response)?;
    Ok(Json(product))
}

async fn delete_product_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = parse_id(id)?;
    state.products.delete(id).await.map_err(to_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// Users

async fn create_user_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let params = parse_body(body)?;
    let user = state.users.create(params).await.map_err(to_error_response)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<User>> {
    let id = parse_id(id)?;
    let user = state.users.get(id).await.map_err(to_error_response)?;
    Ok(Json(user))
}

async fn list_users_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state.users.list().await.map_err(to_error_response)?;
    Ok(Json(users))
}

async fn update_user_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let id = parse_id(id)?;
    let update = parse_body(body)?;
    let user = state.users.update(id, update).await.map_err(to_error_response)?;
    Ok(Json(user))
}

async fn delete_user_handler<U: UnitOfWork + 'static>(
    State(state): State<Arc<ApiState<U>>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = parse_id(id)?;
    state.users.delete(id).await.map_err(to_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

fn parse_id(id: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    id.map(|Path(id)| id)
        .map_err(|rejection| bad_request(format!("Invalid id: {}", rejection.body_text())))
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value).map_err(|rejection| bad_request(rejection.body_text()))
}

fn to_error_response(error: OrderError) -> ApiError {
    let status = if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// =============================================================================
// Tests
// =============================================================================
