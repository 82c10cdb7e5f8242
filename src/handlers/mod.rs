pub mod admin;
pub mod booking;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/payment-methods", get(booking::list_payment_methods))
        .route("/api/schedules/:id/seats", get(booking::get_schedule_seats))
        .route("/api/booking", post(booking::create_booking))
        .route("/api/user/bookings", get(booking::list_my_bookings))
        .route("/api/pay", post(booking::pay))
        .route("/api/admin/bookings/expire", post(admin::expire_bookings))
        .route("/api/admin/bookings/:id", get(admin::get_booking))
        .route("/api/admin/bookings/:id/cancel", put(admin::cancel_booking))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
