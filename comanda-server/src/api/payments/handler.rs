//! Payment handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::json;
use shared::message::KitchenEvent;
use shared::models::{Payment, PaymentCreate, PaymentReceipt};

use crate::api::ApiJson;
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::{ClientIp, Operator};
use crate::core::ServerState;
use crate::utils::AppResult;

const RESOURCE: &str = "payment";

/// GET /api/orders/{id}/payments
pub async fn list(
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
) -> AppResult<Json<Vec<Payment>>> {
    let payments = state.orders.payments(order_id).await?;
    Ok(Json(payments))
}

/// POST /api/orders/{id}/payments
pub async fn create(
    State(state): State<ServerState>,
    operator: Operator,
    ClientIp(ip): ClientIp,
    Path(order_id): Path<i64>,
    ApiJson(payload): ApiJson<PaymentCreate>,
) -> AppResult<Json<PaymentReceipt>> {
    let receipt = state.orders.add_payment(order_id, payload).await?;
    let payment = &receipt.payment;

    state.broadcast(KitchenEvent::PaymentAdded {
        order_id,
        payment_id: payment.id,
        amount: payment.amount,
        is_paid: receipt.is_paid,
    });
    state.audit(
        AuditLogRequest::new(AuditAction::PaymentAdded, RESOURCE, Some(payment.id))
            .details(json!({
                "order_id": order_id,
                "method": payment.method.as_str(),
                "amount": payment.amount,
                "paid_amount": receipt.paid_amount,
                "is_paid": receipt.is_paid,
            }))
            .operator(operator.user())
            .ip(Some(ip)),
    );
    Ok(Json(receipt))
}
