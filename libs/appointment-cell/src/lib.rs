pub mod handlers;
pub mod router;
pub mod models;
pub mod services;
pub mod store;

pub use models::{Action, Appointment, AppointmentError, AppointmentStatus, ClinicalRecord, TransitionRequest};
pub use router::{appointment_routes, AppointmentState};
