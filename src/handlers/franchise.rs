use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{Franchise, Store};
use crate::AppState;

use super::auth::{AuthUser, MessageResponse};
use super::AppError;

// ─── Request types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdminRef {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFranchiseRequest {
    pub name: String,
    #[serde(default)]
    pub admins: Vec<AdminRef>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
}

fn require_admin(auth: &AuthUser, action: &str) -> Result<(), AppError> {
    if auth.user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("unable to {action}")))
    }
}

fn require_franchise_access(
    state: &AppState,
    auth: &AuthUser,
    franchise_id: u64,
    action: &str,
) -> Result<(), AppError> {
    if auth.user.is_admin() || state.db.is_franchise_admin(franchise_id, auth.user.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("unable to {action}")))
    }
}

// ─── GET /api/franchise ──────────────────────────────────────────

pub async fn list_franchises(State(state): State<Arc<AppState>>) -> Json<Vec<Franchise>> {
    Json(state.db.franchises())
}

// ─── GET /api/franchise/:userId ──────────────────────────────────

pub async fn user_franchises(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
    auth: AuthUser,
) -> Json<Vec<Franchise>> {
    // Other users' franchises are hidden rather than refused.
    if auth.user.id == user_id || auth.user.is_admin() {
        Json(state.db.user_franchises(user_id))
    } else {
        Json(Vec::new())
    }
}

// ─── POST /api/franchise ─────────────────────────────────────────

pub async fn create_franchise(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateFranchiseRequest>,
) -> Result<Json<Franchise>, AppError> {
    require_admin(&auth, "create a franchise")?;
    let emails: Vec<String> = req.admins.into_iter().map(|a| a.email).collect();
    Ok(Json(state.db.create_franchise(&req.name, &emails)?))
}

// ─── DELETE /api/franchise/:franchiseId ──────────────────────────

pub async fn delete_franchise(
    State(state): State<Arc<AppState>>,
    Path(franchise_id): Path<u64>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    require_admin(&auth, "delete a franchise")?;
    state.db.delete_franchise(franchise_id)?;
    Ok(Json(MessageResponse {
        message: "franchise deleted".into(),
    }))
}

// ─── POST /api/franchise/:franchiseId/store ──────────────────────

pub async fn create_store(
    State(state): State<Arc<AppState>>,
    Path(franchise_id): Path<u64>,
    auth: AuthUser,
    Json(req): Json<CreateStoreRequest>,
) -> Result<Json<Store>, AppError> {
    require_franchise_access(&state, &auth, franchise_id, "create a store")?;
    Ok(Json(state.db.create_store(franchise_id, &req.name)?))
}

// ─── DELETE /api/franchise/:franchiseId/store/:storeId ───────────

pub async fn delete_store(
    State(state): State<Arc<AppState>>,
    Path((franchise_id, store_id)): Path<(u64, u64)>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    require_franchise_access(&state, &auth, franchise_id, "delete a store")?;
    state.db.delete_store(franchise_id, store_id)?;
    Ok(Json(MessageResponse {
        message: "store deleted".into(),
    }))
}
