use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::auth::AdminUser;
use crate::errors::AppResult;
use crate::models::{BookingDetail, BookingView};
use crate::services::lifecycle;
use crate::services::parse_id;
use crate::state::AppState;

// GET /api/admin/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<BookingDetail>> {
    let booking_id = parse_id("booking", &id)?;
    let conn = state.conn()?;
    Ok(Json(lifecycle::get_booking_detail(&conn, &booking_id)?))
}

// PUT /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<BookingView>> {
    let booking_id = parse_id("booking", &id)?;

    let view = {
        let mut conn = state.conn()?;
        lifecycle::cancel_booking(&mut conn, &booking_id, Utc::now().naive_utc())?
    };

    tracing::info!(admin_id = %admin.id, booking_id = %view.id, "admin cancelled booking");
    Ok(Json(view))
}

// POST /api/admin/bookings/expire
#[derive(Serialize)]
pub struct ExpireResponse {
    expired: usize,
}

pub async fn expire_bookings(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> AppResult<Json<ExpireResponse>> {
    let conn = state.conn()?;
    let expired = lifecycle::expire_stale_pending(&conn, &state.policy, Utc::now().naive_utc())?;
    Ok(Json(ExpireResponse { expired }))
}
