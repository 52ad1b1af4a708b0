pub mod booking;
pub mod conversation;
pub mod doctor;
pub mod intent;
pub mod patient;
pub mod response;
pub mod user;

pub use booking::{Appointment, AppointmentStatus, BookingRequest};
pub use conversation::{BookingSlots, ConversationContext, FlowStep};
pub use doctor::Doctor;
pub use intent::Intent;
pub use patient::{BillingRecord, Prescription, Report, Visit};
pub use response::{ActionId, Response};
pub use user::User;
