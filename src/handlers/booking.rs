use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::CurrentUser;
use crate::errors::{AppError, AppResult};
use crate::models::{BookingView, PageRequest, Paginated, PaymentMethod, PaymentView};
use crate::services::availability::{self, ScheduleSeats};
use crate::services::booking::{self, CreateBookingRequest};
use crate::services::parse_id;
use crate::services::payment::{self, PaymentRequest};
use crate::state::AppState;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(e.body_text()))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| AppError::Validation(e.body_text()))
}

// GET /api/payment-methods
pub async fn list_payment_methods(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<PaymentMethod>>> {
    let conn = state.conn()?;
    Ok(Json(payment::payment_methods(&conn)?))
}

// GET /api/schedules/:id/seats
pub async fn get_schedule_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ScheduleSeats>> {
    let schedule_id = parse_id("schedule", &id)?;
    let conn = state.conn()?;
    Ok(Json(availability::schedule_seats(&conn, &schedule_id)?))
}

// POST /api/booking
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<BookingView>)> {
    let body = json_body(payload)?;

    let view = {
        let mut conn = state.conn()?;
        booking::create_booking(&mut conn, &state.policy, &user.id, &body)?
    };

    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/user/bookings
pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> AppResult<Json<Paginated<BookingView>>> {
    let page = query_params(query)?;
    let conn = state.conn()?;
    Ok(Json(booking::list_user_bookings(&conn, &user.id, &page)?))
}

// POST /api/pay
pub async fn pay(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> AppResult<Json<PaymentView>> {
    let body = json_body(payload)?;

    let view = {
        let mut conn = state.conn()?;
        payment::process_payment(&mut conn, &user.id, &body)?
    };

    Ok(Json(view))
}
