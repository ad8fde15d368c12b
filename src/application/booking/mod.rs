mod booking_service;
mod errors;
mod ledger;
mod pricing;
mod queries;

pub use booking_service::{
    BookingConfirmation, ServiceDependencies, block_slot, cancel_appointment,
    change_appointment_status, reserve_slot, unblock_slot,
};
pub use errors::{BookingApplicationError, Result};
pub use ledger::AppointmentLedger;
pub use pricing::{
    delete_promotion, find_applicable_promotion, get_promotion, list_promotions, quote_price,
    register_promotion, update_promotion,
};
pub use queries::{
    SlotAvailability, WeeklyAvailability, appointments_for_barber, appointments_for_customer,
    blocks_for_barber, get_appointment, weekly_availability,
};
