use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payment::PaymentView;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub schedule_id: Uuid,
    pub total_seats: i64,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "expired" => Some(BookingStatus::Expired),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Pending, BookingStatus::Expired)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSeat {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub schedule_id: Uuid,
    pub seat_id: Uuid,
    pub created_at: NaiveDateTime,
}

/// Human-readable order code: `BOOK-YYYYMMDD-HHMMSS-NNNN`.
pub fn generate_order_id(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("BOOK-{}-{suffix:04}", now.format("%Y%m%d-%H%M%S"))
}

/// Display fields resolved from the catalog for a booking's schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ShowInfo {
    pub movie_title: String,
    pub cinema_name: String,
    pub hall_number: i64,
    pub show_date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub show_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub schedule_id: Uuid,
    #[serde(flatten)]
    pub show: ShowInfo,
    pub total_seats: i64,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub seat_numbers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentView>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDetails {
    #[serde(flatten)]
    pub show: ShowInfo,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: BookingView,
    pub schedule_details: ScheduleDetails,
}

mod hh_mm {
    use chrono::NaiveTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format("%H:%M"))
    }
}
