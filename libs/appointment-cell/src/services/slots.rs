// libs/appointment-cell/src/services/slots.rs
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use schedule_cell::models::{base_schedule, DayOfWeek, SlotTime, WeeklyAvailability};
use schedule_cell::services::AvailabilityService;

use crate::models::AppointmentError;
use crate::store::AppointmentStore;

/// Derives bookable times from a specialist's template (or the clinic base
/// schedule) minus the times held by active appointments.
pub struct SlotResolverService {
    availability: Arc<AvailabilityService>,
    store: Arc<dyn AppointmentStore>,
    max_window_days: i64,
}

impl SlotResolverService {
    pub fn new(
        availability: Arc<AvailabilityService>,
        store: Arc<dyn AppointmentStore>,
        max_window_days: i64,
    ) -> Self {
        Self { availability, store, max_window_days }
    }

    fn candidates(template: Option<&WeeklyAvailability>, date: NaiveDate) -> Vec<SlotTime> {
        match template {
            Some(week) => week.times(DayOfWeek::from_date(date)).iter().copied().collect(),
            None => base_schedule(),
        }
    }

    fn check_window(&self, from: NaiveDate, to: NaiveDate) -> Result<(), AppointmentError> {
        if to < from {
            return Err(AppointmentError::Validation(format!(
                "Window end {} is before its start {}", to, from
            )));
        }

        let days = (to - from).num_days() + 1;
        if days > self.max_window_days {
            return Err(AppointmentError::Validation(format!(
                "Window of {} days exceeds the maximum of {}", days, self.max_window_days
            )));
        }

        Ok(())
    }

    /// Template times for one date, ignoring bookings.
    pub async fn candidate_times(
        &self,
        specialist_id: Uuid,
        specialty: &str,
        date: NaiveDate,
    ) -> Result<Vec<SlotTime>, AppointmentError> {
        let template = self.availability.template_for(specialist_id, specialty).await?;
        Ok(Self::candidates(template.as_ref(), date))
    }

    /// Free times for every date of `from..=to`. Dates with nothing free are
    /// present with an empty list.
    pub async fn resolve(
        &self,
        specialist_id: Uuid,
        specialty: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Vec<SlotTime>>, AppointmentError> {
        let specialty = specialty.trim();
        if specialty.is_empty() {
            return Err(AppointmentError::Validation("Specialty is required".to_string()));
        }
        self.check_window(from, to)?;

        debug!("Resolving slots for specialist {} ({}) from {} to {}", specialist_id, specialty, from, to);

        let template = self.availability.template_for(specialist_id, specialty).await?;

        let mut held: HashMap<NaiveDate, BTreeSet<SlotTime>> = HashMap::new();
        for (date, time) in self.store.active_slots(specialist_id, from, to).await? {
            held.entry(date).or_default().insert(time);
        }

        let resolved = from
            .iter_days()
            .take_while(|date| *date <= to)
            .map(|date| {
                let taken = held.get(&date);
                let free = Self::candidates(template.as_ref(), date)
                    .into_iter()
                    .filter(|time| taken.map_or(true, |t| !t.contains(time)))
                    .collect();
                (date, free)
            })
            .collect();

        Ok(resolved)
    }

    /// Dates of the window that still have at least one free time.
    pub async fn available_days(
        &self,
        specialist_id: Uuid,
        specialty: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, AppointmentError> {
        Ok(self
            .resolve(specialist_id, specialty, from, to)
            .await?
            .into_iter()
            .filter(|(_, times)| !times.is_empty())
            .map(|(date, _)| date)
            .collect())
    }
}
