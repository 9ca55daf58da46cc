//! Report handlers
//!
//! Both reports cover one business day in the configured timezone,
//! `[local midnight, next local midnight)`.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use shared::models::{DailyStats, DateQuery};

use crate::api::ApiQuery;
use crate::core::ServerState;
use crate::db::repository::report;
use crate::utils::AppResult;
use crate::utils::csv::CsvWriter;
use crate::utils::time::{date_or_today, day_range, format_millis};

const CSV_HEADER: [&str; 6] = ["ID", "Fecha/Hora", "Mesa", "Mozo", "Total", "Anulada"];

/// GET /api/reports/daily?date=
pub async fn daily(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> AppResult<Json<DailyStats>> {
    let date = date_or_today(query.date.as_deref(), state.config.timezone)?;
    let (start, end) = day_range(date, state.config.timezone);
    let pool = &state.db;

    let totals = report::day_totals(pool, start, end).await?;
    let stats = DailyStats {
        date: date.format("%Y-%m-%d").to_string(),
        total_revenue: totals.revenue,
        order_count: totals.orders,
        cancelled_count: totals.cancelled,
        by_table: report::by_table(pool, start, end).await?,
        by_staff: report::by_staff(pool, start, end).await?,
        top_products: report::top_products(pool, start, end).await?,
        by_status: report::by_status(pool, start, end).await?,
    };
    Ok(Json(stats))
}

/// GET /api/reports/orders.csv?date=
pub async fn orders_csv(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> AppResult<Response> {
    let tz = state.config.timezone;
    let date = date_or_today(query.date.as_deref(), tz)?;
    let (start, end) = day_range(date, tz);
    let rows = report::export_rows(&state.db, start, end).await?;

    let mut csv = CsvWriter::new();
    csv.write_row(CSV_HEADER);
    for row in &rows {
        csv.write_row([
            row.id.to_string(),
            format_millis(row.created_at, tz),
            row.table_name.clone().unwrap_or_default(),
            row.staff_name.clone().unwrap_or_default(),
            format!("{:.2}", row.total),
            if row.is_cancelled { "SI" } else { "NO" }.to_string(),
        ]);
    }

    let filename = format!("attachment; filename=\"comandas_{}.csv\"", date.format("%Y-%m-%d"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv.finish(),
    )
        .into_response())
}
