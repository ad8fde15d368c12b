pub mod appointment;
pub mod availability;
pub mod blocked_slot;
pub mod calendar;
pub mod commands;
pub mod conflict_guard;
pub mod errors;
pub mod events;
pub mod promotion;
pub mod schedule;
pub mod value_objects;

pub use appointment::{Appointment, AppointmentStatus, BookingFacts, NewAppointment, ProductLine};
pub use availability::{SlotState, SlotStatus};
pub use blocked_slot::{BlockedSlot, NewBlockedSlot};
pub use errors::*;
pub use events::*;
pub use promotion::{NewPromotion, PriceQuote, Promotion, PromotionChanges};
pub use schedule::Schedule;
pub use value_objects::*;
