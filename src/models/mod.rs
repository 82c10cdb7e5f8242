pub mod booking;
pub mod catalog;
pub mod pagination;
pub mod payment;
pub mod user;

pub use booking::{
    Booking, BookingDetail, BookingSeat, BookingStatus, BookingView, ScheduleDetails, ShowInfo,
};
pub use catalog::{Cinema, Hall, Movie, Schedule, Seat};
pub use pagination::{PageRequest, Paginated, PaginationMeta};
pub use payment::{Payment, PaymentMethod, PaymentStatus, PaymentView};
pub use user::{Role, User};
