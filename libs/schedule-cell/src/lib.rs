pub mod handlers;
pub mod router;
pub mod models;
pub mod services;
pub mod store;

pub use models::{
    base_schedule, parse_calendar_date, AvailabilityError, DayOfWeek, SlotTime,
    SpecialtyAvailability, WeeklyAvailability,
};
pub use router::{schedule_routes, ScheduleState};
pub use services::{AvailabilityService, SpecialtyService};
