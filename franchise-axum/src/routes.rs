use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, patch, post},
};
use franchise::{
    AccountId, Admission, BranchId, Error, Franchise, InventoryId, LoginRequest, NewBranch,
    NewInventoryItem, NewProduct, ProductId, SaleRequest, SignupRequest,
};
use franchise_core::repositories::RepositoryProvider;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{ApiError, Result},
    extractors::{AuthAccount, ClientInfo},
    middleware::{AppState, require_auth},
    types::{
        AccountResponse, AssignBranchRequest, BranchStatusRequest, DataResponse, HealthResponse,
        InventoryQuery, InvitationCodeCheck, InvitationCodeQuery, ProductActiveRequest,
        SalesQuery, UpdateInventoryRequest,
    },
};

type JsonPayload<T> = std::result::Result<Json<T>, JsonRejection>;

/// Build the API router with every route mounted under `/api`.
///
/// When `cors_origin` is set, browsers from that origin may call the API
/// with credentials.
pub fn create_router<R>(franchise: Arc<Franchise<R>>, cors_origin: Option<HeaderValue>) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = AppState { franchise };

    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler))
        .route(
            "/branches",
            get(list_branches_handler::<R>).post(create_branch_handler::<R>),
        )
        .route("/branches/{id}", get(branch_handler::<R>))
        .route("/branches/{id}/status", patch(branch_status_handler::<R>))
        .route(
            "/products",
            get(list_products_handler::<R>).post(create_product_handler::<R>),
        )
        .route("/products/{id}", patch(product_active_handler::<R>))
        .route(
            "/inventory",
            get(list_inventory_handler::<R>).post(add_inventory_handler::<R>),
        )
        .route("/inventory/{id}", patch(update_inventory_handler::<R>))
        .route(
            "/sales",
            get(list_sales_handler::<R>).post(record_sale_handler::<R>),
        )
        .route("/users/{id}/branch", patch(assign_branch_handler::<R>))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth::<R>,
        ));

    let api = Router::new()
        .route("/health", get(health_handler::<R>))
        .route("/auth/signup", post(signup_handler::<R>))
        .route("/auth/login", post(login_handler::<R>))
        .route(
            "/auth/invitation-code/validate",
            get(validate_invitation_code_handler::<R>),
        )
        .merge(protected_routes)
        .with_state(state);

    let router = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http());

    match cors_origin {
        Some(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::PATCH])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        ),
        None => router,
    }
}

async fn health_handler<R>(State(state): State<AppState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.franchise.health_check().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn signup_handler<R>(
    State(state): State<AppState<R>>,
    client: ClientInfo,
    payload: JsonPayload<SignupRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    // Counted before the body is parsed, so malformed requests use up attempts too.
    if let Admission::Denied { retry_after_secs } = state.franchise.admit_signup(&client.key) {
        return Err(ApiError::RateLimited { retry_after_secs });
    }

    let Json(request) = payload?;
    let response = state.franchise.signup(request, &client.context()).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn login_handler<R>(
    State(state): State<AppState<R>>,
    client: ClientInfo,
    payload: JsonPayload<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(request) = payload?;
    let response = state.franchise.login(request, &client.context()).await?;

    Ok(Json(response))
}

async fn validate_invitation_code_handler<R>(
    State(state): State<AppState<R>>,
    Query(query): Query<InvitationCodeQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    // Matched exactly as submitted, the same way signup matches it.
    let Some(code) = query.code.as_deref().filter(|code| !code.is_empty()) else {
        return Ok(Json(InvitationCodeCheck::missing()));
    };

    let check = match state.franchise.validate_invitation_code(code).await {
        Ok(_) => InvitationCodeCheck::valid(),
        Err(Error::Invitation(reason)) => InvitationCodeCheck::invalid(reason.to_string()),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(check))
}

async fn me_handler(AuthAccount(account): AuthAccount) -> impl IntoResponse {
    Json(AccountResponse::new(account.view()))
}

async fn list_branches_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let branches = state.franchise.list_branches(&actor).await?;
    Ok(Json(DataResponse::new(branches)))
}

async fn create_branch_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    payload: JsonPayload<NewBranch>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(branch) = payload?;
    let created = state.franchise.create_branch(&actor, branch).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

async fn branch_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    Path(id): Path<BranchId>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let branch = state.franchise.branch(&actor, &id).await?;
    Ok(Json(DataResponse::new(branch)))
}

async fn branch_status_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    Path(id): Path<BranchId>,
    payload: JsonPayload<BranchStatusRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(request) = payload?;
    let branch = state
        .franchise
        .set_branch_status(&actor, &id, request.status)
        .await?;
    Ok(Json(DataResponse::new(branch)))
}

async fn list_products_handler<R>(State(state): State<AppState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let products = state.franchise.list_products().await?;
    Ok(Json(DataResponse::new(products)))
}

async fn create_product_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    payload: JsonPayload<NewProduct>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(product) = payload?;
    let created = state.franchise.create_product(&actor, product).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

async fn product_active_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    Path(id): Path<ProductId>,
    payload: JsonPayload<ProductActiveRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(request) = payload?;
    state
        .franchise
        .set_product_active(&actor, &id, request.is_active)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_inventory_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    Query(query): Query<InventoryQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    // Defaults to the caller's own branch.
    let branch_id = query
        .branch_id
        .or_else(|| actor.branch_id.clone())
        .ok_or_else(|| ApiError::BadRequest("branchId is required".to_string()))?;

    let items = state.franchise.list_inventory(&actor, &branch_id).await?;
    Ok(Json(DataResponse::new(items)))
}

async fn add_inventory_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    payload: JsonPayload<NewInventoryItem>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(item) = payload?;
    let created = state.franchise.add_inventory(&actor, item).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

async fn update_inventory_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    Path(id): Path<InventoryId>,
    payload: JsonPayload<UpdateInventoryRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(request) = payload?;
    let item = state
        .franchise
        .update_inventory_quantity(&actor, &id, request.quantity)
        .await?;
    Ok(Json(DataResponse::new(item)))
}

async fn list_sales_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    Query(query): Query<SalesQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let sales = state
        .franchise
        .list_sales(&actor, query.into_filter()?)
        .await?;
    Ok(Json(DataResponse::new(sales)))
}

async fn record_sale_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    payload: JsonPayload<SaleRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(request) = payload?;
    let sale = state.franchise.record_sale(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(sale))))
}

async fn assign_branch_handler<R>(
    State(state): State<AppState<R>>,
    AuthAccount(actor): AuthAccount,
    Path(id): Path<AccountId>,
    payload: JsonPayload<AssignBranchRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(request) = payload?;
    let account = state
        .franchise
        .assign_branch(&actor, &id, request.branch_id)
        .await?;
    Ok(Json(AccountResponse::new(account.view())))
}
