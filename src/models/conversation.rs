use serde::{Deserialize, Serialize};

use super::{Appointment, Doctor};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    #[default]
    Idle,
    AwaitingDoctor,
    AwaitingDate,
    AwaitingTime,
    AwaitingConfirmation,
    AwaitingRescheduleSelection,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Idle => "idle",
            FlowStep::AwaitingDoctor => "awaiting_doctor",
            FlowStep::AwaitingDate => "awaiting_date",
            FlowStep::AwaitingTime => "awaiting_time",
            FlowStep::AwaitingConfirmation => "awaiting_confirmation",
            FlowStep::AwaitingRescheduleSelection => "awaiting_reschedule_selection",
        }
    }
}

/// Data collected across the turns of one booking or reschedule flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingSlots {
    pub doctor: Option<Doctor>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// `HH:mm:ss`
    pub time: Option<String>,
    pub old_appointment_id: Option<i64>,
}

impl BookingSlots {
    pub fn is_reschedule(&self) -> bool {
        self.old_appointment_id.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    pub step: FlowStep,
    pub slots: BookingSlots,
    pub doctor_cache: Vec<Doctor>,
    pub appointment_cache: Vec<Appointment>,
}

impl ConversationContext {
    pub fn is_idle(&self) -> bool {
        self.step == FlowStep::Idle
    }

    /// Whether this equals a freshly constructed context.
    pub fn is_pristine(&self) -> bool {
        self.is_idle()
            && self.slots == BookingSlots::default()
            && self.doctor_cache.is_empty()
            && self.appointment_cache.is_empty()
    }
}
