pub mod seat;
pub mod bus;
pub mod payment;
mod lenient;

pub use seat::{CanonicalSeat, SeatId, SeatType};
pub use bus::{AvailabilitySummary, BusAvailability, BusDetails};
pub use payment::PaymentHandoff;
