use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{catalog, queries};
use crate::errors::{AppError, AppResult};
use crate::models::{BookingStatus, Payment, PaymentMethod, PaymentStatus, PaymentView};
use crate::services::{in_immediate_tx, parse_id};

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub booking_id: String,
    pub payment_method_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Settles a pending booking. The payment row and the `pending -> confirmed`
/// transition commit together or not at all.
pub fn process_payment(
    conn: &mut Connection,
    user_id: &Uuid,
    request: &PaymentRequest,
) -> AppResult<PaymentView> {
    let booking_id = parse_id("booking", &request.booking_id)?;
    let payment_method_id = parse_id("payment method", &request.payment_method_id)?;

    let view = in_immediate_tx(conn, "payment", |tx| {
        let booking = queries::get_booking_by_id(tx, &booking_id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        if booking.user_id != *user_id {
            return Err(AppError::Unauthorized(
                "not allowed to pay for this booking".into(),
            ));
        }

        if booking.status != BookingStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "booking status is {}, cannot process payment",
                booking.status
            )));
        }

        if request.amount != booking.total_price {
            return Err(AppError::Validation(format!(
                "payment amount {} does not match booking total {}",
                request.amount, booking.total_price
            )));
        }

        let method = catalog::get_payment_method(tx, &payment_method_id)?.ok_or_else(|| {
            AppError::NotFound(format!("payment method {payment_method_id} not found"))
        })?;
        if !method.is_active {
            return Err(AppError::InvalidState(format!(
                "payment method {} is not active",
                method.name
            )));
        }

        // Settlement is simulated: the gateway always accepts.
        let now = Utc::now().naive_utc();
        let payment = Payment {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            payment_method_id: method.id,
            amount: booking.total_price,
            status: PaymentStatus::Completed,
            transaction_id: request.transaction_id.clone(),
            created_at: now,
            updated_at: now,
        };
        queries::insert_payment(tx, &payment)?;

        let confirmed = queries::update_booking_status_if(
            tx,
            &booking.id,
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            now,
        )?;
        if !confirmed {
            tracing::warn!(
                booking_id = %booking.id,
                payment_id = %payment.id,
                "booking left pending while payment was processed"
            );
            return Err(AppError::InvalidState(
                "booking is no longer pending".into(),
            ));
        }

        Ok(PaymentView::new(payment, method))
    })?;

    tracing::info!(
        booking_id = %view.booking_id,
        payment_id = %view.id,
        amount = %view.amount,
        method = %view.payment_method.name,
        "payment completed"
    );
    Ok(view)
}

/// Active payment methods, ordered by name.
pub fn payment_methods(conn: &Connection) -> AppResult<Vec<PaymentMethod>> {
    Ok(catalog::get_active_payment_methods(conn)?)
}
