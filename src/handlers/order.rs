use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::db::{MenuItem, Order, OrderItem};
use crate::AppState;

use super::auth::AuthUser;
use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub franchise_id: u64,
    pub store_id: u64,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: Order,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistory {
    pub diner_id: u64,
    pub orders: Vec<Order>,
}

// ─── GET /api/order/menu ─────────────────────────────────────────

pub async fn get_menu(State(state): State<Arc<AppState>>) -> Json<Vec<MenuItem>> {
    Json(state.db.menu())
}

// ─── PUT /api/order/menu ─────────────────────────────────────────

pub async fn add_menu_item(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(item): Json<MenuItem>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    if !auth.user.is_admin() {
        return Err(AppError::Forbidden("unable to add menu item".into()));
    }
    Ok(Json(state.db.add_menu_item(item)))
}

// ─── GET /api/order ──────────────────────────────────────────────

pub async fn get_orders(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Json<OrderHistory> {
    Json(OrderHistory {
        diner_id: auth.user.id,
        orders: state.db.orders_for(auth.user.id),
    })
}

// ─── POST /api/order ─────────────────────────────────────────────

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let t0 = Instant::now();
    let items = req.items.len() as u64;

    let result = state
        .db
        .add_order(auth.user.id, req.franchise_id, req.store_id, req.items);
    let latency_secs = t0.elapsed().as_secs_f64();

    match result {
        Ok(order) => {
            state
                .metrics
                .track_purchase(items, order.total(), latency_secs, true);
            Ok(Json(OrderResponse { order }))
        }
        Err(err) => {
            state.metrics.track_purchase(0, 0.0, latency_secs, false);
            tracing::warn!(
                error = %err,
                franchise_id = req.franchise_id,
                store_id = req.store_id,
                "order creation failed"
            );
            Err(AppError::BadRequest(format!("failed to fulfill order: {err}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::handlers::test_support::{admin_token, call, register, test_app};

    #[tokio::test]
    async fn menu_is_public_and_admin_managed() {
        let (app, _state) = test_app();
        let admin = admin_token(&app).await;
        let diner = register(&app, "menu").await;
        let item = json!({
            "title": "Veggie",
            "description": "A garden of delight",
            "image": "pizza1.png",
            "price": 0.0038,
        });

        let (status, _) = call(&app, "PUT", "/api/order/menu", Some(&diner), Some(item.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, menu) = call(&app, "PUT", "/api/order/menu", Some(&admin), Some(item)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(menu.as_array().unwrap().len(), 1);

        let (status, menu) = call(&app, "GET", "/api/order/menu", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(menu[0]["title"], "Veggie");
    }

    #[tokio::test]
    async fn orders_feed_purchase_metrics() {
        let (app, state) = test_app();
        let admin = admin_token(&app).await;
        let (_, franchise) = call(
            &app,
            "POST",
            "/api/franchise",
            Some(&admin),
            Some(json!({ "name": "slicey", "admins": [] })),
        )
        .await;
        let franchise_id = franchise["id"].as_u64().unwrap();
        let (_, store) = call(
            &app,
            "POST",
            &format!("/api/franchise/{franchise_id}/store"),
            Some(&admin),
            Some(json!({ "name": "Provo" })),
        )
        .await;
        let store_id = store["id"].as_u64().unwrap();

        let diner = register(&app, "hungry").await;
        let order = json!({
            "franchiseId": franchise_id,
            "storeId": store_id,
            "items": [
                { "menuId": 1, "description": "Veggie", "price": 0.5 },
                { "menuId": 2, "description": "Pepperoni", "price": 0.25 },
            ],
        });
        let (status, body) = call(&app, "POST", "/api/order", Some(&diner), Some(order)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["items"].as_array().unwrap().len(), 2);

        let bad = json!({ "franchiseId": franchise_id, "storeId": 424242, "items": [] });
        let (status, _) = call(&app, "POST", "/api/order", Some(&diner), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let purchases = state.metrics.purchase_counts();
        assert_eq!(purchases.sold, 2);
        assert_eq!(purchases.revenue, 0.75);
        assert_eq!(purchases.creation_failures, 1);

        let (status, history) = call(&app, "GET", "/api/order", Some(&diner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["orders"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ordering_requires_login() {
        let (app, state) = test_app();
        let order = json!({ "franchiseId": 1, "storeId": 1, "items": [] });
        let (status, _) = call(&app, "POST", "/api/order", None, Some(order)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.metrics.purchase_counts().sold, 0);
    }
}
