//! Order handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::json;
use shared::message::KitchenEvent;
use shared::models::{
    Order, OrderCreate, OrderDetail, OrderEdit, OrderItemsAppend, OrderQuery, OrderStatus,
    OrderStatusUpdate, OrderWithItems,
};

use crate::api::{ApiJson, ApiQuery};
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::{ClientIp, CurrentUser, Operator};
use crate::core::ServerState;
use crate::db::repository::order::OrderFilter;
use crate::utils::time::{day_range, parse_date};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = "order";

/// POST /api/orders
///
/// Without `user_id` and `user_name` the order is attributed to the caller's token.
pub async fn create(
    State(state): State<ServerState>,
    operator: Operator,
    ClientIp(ip): ClientIp,
    ApiJson(mut payload): ApiJson<OrderCreate>,
) -> AppResult<Json<OrderWithItems>> {
    if payload.user_id.is_none()
        && payload.user_name.is_none()
        && let Some(user) = operator.user()
    {
        payload.user_id = Some(user.id);
        payload.user_name = Some(user.name.clone());
    }

    let created = state.orders.create(payload).await?;
    let order_id = created.order.id;

    state.broadcast(KitchenEvent::NewOrder {
        order_id,
        order: Box::new(created.clone()),
    });
    state.audit(
        AuditLogRequest::new(AuditAction::OrderCreated, RESOURCE, Some(order_id))
            .details(json!({
                "table_id": created.order.table_id,
                "staff_name": created.order.staff_name,
                "items": created.items.len(),
                "total": created.order.total,
            }))
            .operator(operator.user())
            .ip(Some(ip)),
    );
    Ok(Json(created))
}

/// GET /api/orders?status=&cancelled=&date=
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    let range = match query.date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => {
            Some(day_range(parse_date(date)?, state.config.timezone))
        }
        _ => None,
    };
    let filter = OrderFilter {
        status: query.status,
        cancelled: query.cancelled.unwrap_or(false),
        range,
    };
    let orders = state.orders.list(&filter).await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.orders.detail(id).await?;
    Ok(Json(detail))
}

/// POST /api/orders/{id}/items
pub async fn add_items(
    State(state): State<ServerState>,
    operator: Operator,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<OrderItemsAppend>,
) -> AppResult<Json<OrderWithItems>> {
    let updated = state.orders.append_items(id, &payload.items).await?;

    state.broadcast(KitchenEvent::OrderUpdated {
        order_id: id,
        total: updated.order.total,
        status: updated.order.status,
    });
    state.audit(
        AuditLogRequest::new(AuditAction::OrderItemsAdded, RESOURCE, Some(id))
            .details(json!({ "added": payload.items.len(), "total": updated.order.total }))
            .operator(operator.user())
            .ip(Some(ip)),
    );
    Ok(Json(updated))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    operator: Operator,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    let status = OrderStatus::parse(&payload.status).ok_or_else(|| {
        AppError::new(ErrorCode::OrderInvalidStatus).with_detail("status", payload.status.clone())
    })?;
    let order = state.orders.set_status(id, status).await?;

    state.broadcast(KitchenEvent::OrderUpdated {
        order_id: id,
        total: order.total,
        status,
    });
    state.audit(
        AuditLogRequest::new(AuditAction::OrderStatusChanged, RESOURCE, Some(id))
            .details(json!({ "status": status }))
            .operator(operator.user())
            .ip(Some(ip)),
    );
    Ok(Json(order))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    operator: Operator,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = state.orders.set_cancelled(id, true).await?;

    state.broadcast(KitchenEvent::OrderCancelled { order_id: id });
    state.audit(
        AuditLogRequest::new(AuditAction::OrderCancelled, RESOURCE, Some(id))
            .operator(operator.user())
            .ip(Some(ip)),
    );
    Ok(Json(order))
}

/// POST /api/orders/{id}/restore
pub async fn restore(
    State(state): State<ServerState>,
    operator: Operator,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = state.orders.set_cancelled(id, false).await?;

    state.broadcast(KitchenEvent::OrderRestored { order_id: id });
    state.audit(
        AuditLogRequest::new(AuditAction::OrderRestored, RESOURCE, Some(id))
            .operator(operator.user())
            .ip(Some(ip)),
    );
    Ok(Json(order))
}

/// PUT /api/orders/{id} (admin)
pub async fn edit(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<OrderEdit>,
) -> AppResult<Json<OrderWithItems>> {
    let details = json!({
        "table_id": payload.table_id,
        "staff_name": payload.staff_name,
        "items": payload.items,
    });
    let updated = state.orders.edit(id, payload).await?;

    state.broadcast(KitchenEvent::OrderUpdated {
        order_id: id,
        total: updated.order.total,
        status: updated.order.status,
    });
    state.audit(
        AuditLogRequest::new(AuditAction::OrderEdited, RESOURCE, Some(id))
            .details(details)
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{TestApp, received};
    use crate::audit::AuditAction;
    use http::StatusCode;
    use serde_json::json;

    const EXTRA_QUESO: i64 = 6;

    #[tokio::test]
    async fn create_snapshots_prices_and_notifies_kitchen() {
        let mut app = TestApp::new().await;
        let table = app.create_table("Mesa 4").await;
        let burger = app.create_product("Hamburguesa", 10.0).await;
        let mut kitchen = app.listen();
        let waiter = app.waiter_token();

        let (status, order) = app
            .send(
                "POST",
                "/api/orders",
                Some(&waiter),
                Some(json!({
                    "table_id": table,
                    "items": [{ "product_id": burger, "quantity": 2, "modifier_ids": [EXTRA_QUESO], "notes": "bien cocida" }]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{order}");
        // (10 + 300) * 2
        assert_eq!(order["subtotal"], 620.0);
        assert_eq!(order["total"], 620.0);
        assert_eq!(order["status"], "pendiente");
        assert_eq!(order["staff_name"], "Lucia");
        assert_eq!(order["table_name"], "Mesa 4");
        assert_eq!(order["items"][0]["modifiers"][0]["modifier_name"], "Extra queso");

        let events = received(&mut kitchen);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "new_order");
        assert_eq!(events[0]["order_id"], order["id"]);
        assert_eq!(events[0]["order"]["items"][0]["product_name"], "Hamburguesa");

        let audited = app.audited();
        assert_eq!(audited.last().unwrap().action, AuditAction::OrderCreated);
        assert_eq!(audited.last().unwrap().user_name.as_deref(), Some("Lucia"));
    }

    #[tokio::test]
    async fn create_validates_input() {
        let app = TestApp::new().await;
        let table = app.create_table("Mesa 1").await;

        let (status, body) = app
            .send("POST", "/api/orders", None, Some(json!({ "table_id": table, "items": [] })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 4007);

        let (status, body) = app
            .send("POST", "/api/orders", None, Some(json!({ "table_id": 999, "items": [{ "product_id": null }] })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 7001);

        let (status, body) = app
            .send(
                "POST",
                "/api/orders",
                None,
                Some(json!({ "table_id": table, "items": [{ "quantity": 0 }] })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 2);

        let (status, body) = app
            .send(
                "POST",
                "/api/orders",
                None,
                Some(json!({ "table_id": table, "items": [{ "modifier_ids": [404] }] })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 6901);
    }

    #[tokio::test]
    async fn explicit_user_name_wins_over_token() {
        let app = TestApp::new().await;
        let table = app.create_table("Barra").await;
        let waiter = app.waiter_token();
        let (_, order) = app
            .send(
                "POST",
                "/api/orders",
                Some(&waiter),
                Some(json!({ "table_id": table, "user_name": "Marcos", "items": [{}] })),
            )
            .await;
        assert_eq!(order["staff_name"], "Marcos");
        assert!(order["user_id"].is_null());
        assert_eq!(order["items"][0]["product_name"], "Pedido libre");
    }

    #[tokio::test]
    async fn append_items_recalculates() {
        let app = TestApp::new().await;
        let table = app.create_table("Mesa 2").await;
        let coffee = app.create_product("Café", 1500.0).await;
        let (_, order) = app
            .send("POST", "/api/orders", None, Some(json!({ "table_id": table, "items": [{ "product_id": coffee }] })))
            .await;
        let id = order["id"].as_i64().unwrap();
        let mut kitchen = app.listen();

        let (status, updated) = app
            .send(
                "POST",
                &format!("/api/orders/{id}/items"),
                None,
                Some(json!({ "items": [{ "product_id": coffee, "quantity": 2 }] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["total"], 4500.0);
        assert_eq!(updated["items"].as_array().unwrap().len(), 2);

        let events = received(&mut kitchen);
        assert_eq!(events[0], json!({ "type": "order_updated", "order_id": id, "total": 4500.0, "status": "pendiente" }));

        let (status, body) = app
            .send("POST", "/api/orders/999/items", None, Some(json!({ "items": [{}] })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 4001);
    }

    #[tokio::test]
    async fn status_accepts_aliases_and_rejects_unknown() {
        let app = TestApp::new().await;
        let table = app.create_table("Mesa 3").await;
        let (_, order) = app
            .send("POST", "/api/orders", None, Some(json!({ "table_id": table, "items": [{}] })))
            .await;
        let id = order["id"].as_i64().unwrap();
        let mut kitchen = app.listen();

        let (status, body) = app
            .send("PUT", &format!("/api/orders/{id}/status"), None, Some(json!({ "status": "ready" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "listo");

        // any state may follow any other
        let (status, body) = app
            .send("PUT", &format!("/api/orders/{id}/status"), None, Some(json!({ "status": "pendiente" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pendiente");

        let (status, body) = app
            .send("PUT", &format!("/api/orders/{id}/status"), None, Some(json!({ "status": "servido" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 4008);
        assert_eq!(body["details"]["status"], "servido");

        let events = received(&mut kitchen);
        let kinds: Vec<_> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["order_updated", "order_updated"]);
        let statuses: Vec<_> = events.iter().map(|e| e["status"].clone()).collect();
        assert_eq!(statuses, vec![json!("listo"), json!("pendiente")]);
        assert_eq!(events[0]["order_id"], id);
    }

    #[tokio::test]
    async fn cancel_hides_order_until_restored() {
        let app = TestApp::new().await;
        let table = app.create_table("Mesa 5").await;
        let (_, order) = app
            .send("POST", "/api/orders", None, Some(json!({ "table_id": table, "items": [{}] })))
            .await;
        let id = order["id"].as_i64().unwrap();
        app.send("PUT", &format!("/api/orders/{id}/status"), None, Some(json!({ "status": "listo" })))
            .await;

        let (status, cancelled) = app.send("POST", &format!("/api/orders/{id}/cancel"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["is_cancelled"], true);
        assert_eq!(cancelled["status"], "listo");

        let (_, visible) = app.send("GET", "/api/orders", None, None).await;
        assert!(visible.as_array().unwrap().is_empty());
        let (_, hidden) = app.send("GET", "/api/orders?cancelled=true", None, None).await;
        assert_eq!(hidden.as_array().unwrap().len(), 1);

        let (status, restored) = app.send("POST", &format!("/api/orders/{id}/restore"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(restored["is_cancelled"], false);

        let (_, visible) = app.send("GET", "/api/orders?status=listo", None, None).await;
        assert_eq!(visible.as_array().unwrap().len(), 1);
        let (_, visible) = app.send("GET", "/api/orders?status=cobrado", None, None).await;
        assert!(visible.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_by_date_and_bad_query() {
        let app = TestApp::new().await;
        let table = app.create_table("Mesa 6").await;
        app.send("POST", "/api/orders", None, Some(json!({ "table_id": table, "items": [{}] })))
            .await;

        let (_, old) = app.send("GET", "/api/orders?date=2001-01-01", None, None).await;
        assert!(old.as_array().unwrap().is_empty());

        let (status, _) = app.send("GET", "/api/orders?date=ayer", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = app.send("GET", "/api/orders?status=servido", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 2);
    }

    #[tokio::test]
    async fn detail_includes_discounts_and_payments() {
        let app = TestApp::new().await;
        let table = app.create_table("Mesa 7").await;
        let steak = app.create_product("Bife", 100.0).await;
        let (_, order) = app
            .send("POST", "/api/orders", None, Some(json!({ "table_id": table, "items": [{ "product_id": steak }] })))
            .await;
        let id = order["id"].as_i64().unwrap();

        let (status, detail) = app.send("GET", &format!("/api/orders/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["paid_amount"], 0.0);
        assert!(detail["discounts"].as_array().unwrap().is_empty());
        assert!(detail["payments"].as_array().unwrap().is_empty());

        let (status, body) = app.send("GET", "/api/orders/999", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 4001);
    }

    #[tokio::test]
    async fn admin_edit_changes_and_removes_lines() {
        let mut app = TestApp::new().await;
        let token = app.admin_token();
        let table = app.create_table("Mesa 8").await;
        let other_table = app.create_table("Mesa 9").await;
        let pizza = app.create_product("Pizza", 50.0).await;
        let beer = app.create_product("Cerveza", 20.0).await;
        let (_, order) = app
            .send(
                "POST",
                "/api/orders",
                None,
                Some(json!({ "table_id": table, "items": [{ "product_id": pizza }, { "product_id": beer }] })),
            )
            .await;
        let id = order["id"].as_i64().unwrap();
        let pizza_line = order["items"][0]["id"].as_i64().unwrap();
        let beer_line = order["items"][1]["id"].as_i64().unwrap();

        let waiter = app.waiter_token();
        let (status, _) = app
            .send("PUT", &format!("/api/orders/{id}"), Some(&waiter), Some(json!({ "staff_name": "X" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut kitchen = app.listen();
        let (status, edited) = app
            .send(
                "PUT",
                &format!("/api/orders/{id}"),
                Some(&token),
                Some(json!({
                    "table_id": other_table,
                    "staff_name": "Ana",
                    "items": [
                        { "id": pizza_line, "quantity": 3, "notes": "sin aceitunas" },
                        { "id": beer_line, "quantity": 0 }
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{edited}");
        assert_eq!(edited["table_id"], other_table);
        assert_eq!(edited["staff_name"], "Ana");
        assert_eq!(edited["total"], 150.0);
        assert_eq!(edited["items"].as_array().unwrap().len(), 1);
        assert_eq!(edited["items"][0]["notes"], "sin aceitunas");
        assert_eq!(received(&mut kitchen)[0]["type"], "order_updated");

        let (status, body) = app
            .send(
                "PUT",
                &format!("/api/orders/{id}"),
                Some(&token),
                Some(json!({ "items": [{ "id": beer_line, "delete": true }] })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 4006);

        assert!(app.audited().iter().any(|e| e.action == AuditAction::OrderEdited));
    }
}
