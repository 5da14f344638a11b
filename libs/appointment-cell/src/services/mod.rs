pub mod booking;
pub mod clinical_record;
pub mod lifecycle;
pub mod slots;

pub use booking::{AppointmentBookingService, BookingRules};
pub use clinical_record::ClinicalRecordService;
pub use lifecycle::AppointmentLifecycleService;
pub use slots::SlotResolverService;
