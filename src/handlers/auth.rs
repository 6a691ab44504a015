use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{Role, User};
use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ─── Bearer-token extractor ──────────────────────────────────────

/// The caller behind an open session.
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let user = state.db.session_user(token).ok_or(AppError::Unauthorized)?;
        Ok(Self {
            user,
            token: token.to_owned(),
        })
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

// ─── POST /api/auth ──────────────────────────────────────────────

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (Some(name), Some(email), Some(password)) = (
        non_empty(req.name),
        non_empty(req.email),
        non_empty(req.password),
    ) else {
        return Err(AppError::BadRequest(
            "name, email, and password are required".into(),
        ));
    };

    let user = state.db.add_user(&name, &email, &password, vec![Role::Diner])?;
    let token = state.db.open_session(user.id);
    state.metrics.increment_active_users();

    Ok(Json(AuthResponse { user, token }))
}

// ─── PUT /api/auth ───────────────────────────────────────────────

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    state.metrics.increment_auth_attempt();

    let outcome = match (non_empty(req.email), non_empty(req.password)) {
        (Some(email), Some(password)) => state
            .db
            .authenticate(&email, &password)
            .map_err(AppError::from),
        _ => Err(AppError::BadRequest("email and password are required".into())),
    };

    match outcome {
        Ok(user) => {
            state.metrics.increment_auth_success();
            state.metrics.increment_active_users();
            let token = state.db.open_session(user.id);
            Ok(Json(AuthResponse { user, token }))
        }
        Err(err) => {
            state.metrics.increment_auth_failure();
            tracing::debug!(error = %err, "login rejected");
            Err(err)
        }
    }
}

// ─── DELETE /api/auth ────────────────────────────────────────────

pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.db.close_session(&auth.token) {
        return Err(AppError::Unauthorized);
    }
    state.metrics.decrement_active_users();

    Ok(Json(MessageResponse {
        message: "logout successful".into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::handlers::test_support::{call, register, test_app, ADMIN_EMAIL};

    #[tokio::test]
    async fn register_login_logout_updates_session_gauge() {
        let (app, state) = test_app();
        let token = register(&app, "pat").await;
        assert_eq!(state.metrics.active_users(), 1);

        let (status, body) = call(
            &app,
            "PUT",
            "/api/auth",
            None,
            Some(json!({ "email": "pat@test.com", "password": "a" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "pat@test.com");
        assert_eq!(body["user"]["roles"], json!(["diner"]));
        assert!(body["user"].get("password").is_none());
        assert_eq!(state.metrics.active_users(), 2);

        let (status, body) = call(&app, "DELETE", "/api/auth", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "logout successful");
        assert_eq!(state.metrics.active_users(), 1);
    }

    #[tokio::test]
    async fn login_outcomes_are_counted() {
        let (app, state) = test_app();
        register(&app, "sam").await;

        let attempts = [
            json!({ "email": "sam@test.com", "password": "a" }),
            json!({ "email": "sam@test.com", "password": "wrong" }),
            json!({ "email": "nobody@test.com", "password": "a" }),
            json!({ "email": ADMIN_EMAIL }),
        ];
        let mut statuses = Vec::new();
        for body in attempts {
            statuses.push(call(&app, "PUT", "/api/auth", None, Some(body)).await.0);
        }

        assert_eq!(
            statuses,
            vec![
                StatusCode::OK,
                StatusCode::UNAUTHORIZED,
                StatusCode::NOT_FOUND,
                StatusCode::BAD_REQUEST,
            ]
        );
        let auth = state.metrics.auth_counts();
        assert_eq!(auth.total, 4);
        assert_eq!(auth.successful, 1);
        assert_eq!(auth.failed, 3);
    }

    #[tokio::test]
    async fn register_without_email_is_rejected() {
        let (app, state) = test_app();
        let (status, _) = call(
            &app,
            "POST",
            "/api/auth",
            None,
            Some(json!({ "name": "name", "password": "a" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.metrics.active_users(), 0);
    }

    #[tokio::test]
    async fn logout_with_unknown_token_is_unauthorized() {
        let (app, state) = test_app();
        let (status, _) = call(&app, "DELETE", "/api/auth", Some("tok_missing"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.metrics.active_users(), 0);
    }

    #[tokio::test]
    async fn requests_are_counted_by_method() {
        let (app, state) = test_app();
        register(&app, "kim").await;
        call(&app, "GET", "/api/order/menu", None, None).await;
        call(&app, "GET", "/api/franchise", None, None).await;
        call(&app, "PATCH", "/api/franchise", None, None).await;

        let http = state.metrics.http_counts();
        assert_eq!(http.post, 1);
        assert_eq!(http.get, 2);
        assert_eq!(http.all, 3);
    }
}
