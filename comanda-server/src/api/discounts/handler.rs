//! Discount handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use serde_json::json;
use shared::message::KitchenEvent;
use shared::models::{Discount, DiscountCreate, Order};

use crate::api::ApiJson;
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::{ClientIp, CurrentUser};
use crate::core::ServerState;
use crate::utils::AppResult;

const RESOURCE: &str = "discount";

/// Discount together with the order totals it produced
#[derive(Debug, Serialize)]
pub struct DiscountChange {
    pub discount: Discount,
    pub order: Order,
}

/// GET /api/orders/{id}/discounts
pub async fn list(
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
) -> AppResult<Json<Vec<Discount>>> {
    let discounts = state.orders.discounts(order_id).await?;
    Ok(Json(discounts))
}

/// POST /api/orders/{id}/discounts
pub async fn apply(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(order_id): Path<i64>,
    ApiJson(payload): ApiJson<DiscountCreate>,
) -> AppResult<Json<DiscountChange>> {
    let (discount, order) = state
        .orders
        .apply_discount(order_id, payload, Some(&current_user.name))
        .await?;

    state.broadcast(KitchenEvent::DiscountApplied {
        order_id,
        discount_id: discount.id,
        total: order.total,
    });
    state.audit(
        AuditLogRequest::new(AuditAction::DiscountApplied, RESOURCE, Some(discount.id))
            .details(json!({
                "order_id": order_id,
                "type": discount.kind.as_str(),
                "value": discount.value,
                "reason": discount.reason,
                "total": order.total,
            }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(DiscountChange { discount, order }))
}

/// DELETE /api/discounts/{id}
pub async fn remove(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<DiscountChange>> {
    let (discount, order) = state.orders.remove_discount(id).await?;

    state.broadcast(KitchenEvent::DiscountRemoved {
        order_id: order.id,
        discount_id: id,
        total: order.total,
    });
    state.audit(
        AuditLogRequest::new(AuditAction::DiscountRemoved, RESOURCE, Some(id))
            .details(json!({ "order_id": order.id, "total": order.total }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(DiscountChange { discount, order }))
}
