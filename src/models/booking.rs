use serde::{Deserialize, Serialize};

use super::Doctor;

/// One of the user's appointments from `/api/appointments/my-schedule`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    #[serde(default)]
    pub doctor: Option<Doctor>,
    #[serde(default)]
    pub appointment_date: String,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Appointment {
    /// Suggested-reply label, e.g. "Dr. Arjun (2026-06-01)".
    pub fn option_label(&self) -> String {
        let doctor = self
            .doctor
            .as_ref()
            .filter(|d| !d.name.trim().is_empty())
            .map(|d| d.titled_name())
            .unwrap_or_else(|| "Dr. Unknown".to_string());
        format!("{doctor} ({})", self.appointment_date)
    }

    fn is_on_date_in(&self, text: &str) -> bool {
        !self.appointment_date.is_empty() && text.contains(&self.appointment_date.to_lowercase())
    }

    fn is_with_doctor_in(&self, text: &str) -> bool {
        self.doctor
            .as_ref()
            .map(|d| d.name.trim().to_lowercase())
            .is_some_and(|name| !name.is_empty() && text.contains(&name))
    }

    /// The appointment free text picks out of `appointments`.
    ///
    /// A date in the text decides, with the doctor name breaking ties on the
    /// same day. A doctor name alone only selects when exactly one
    /// appointment is with that doctor.
    pub fn select<'a>(appointments: &'a [Appointment], text: &str) -> Option<&'a Appointment> {
        let text = text.to_lowercase();

        let on_date: Vec<&Appointment> = appointments
            .iter()
            .filter(|a| a.is_on_date_in(&text))
            .collect();
        if !on_date.is_empty() {
            return on_date
                .iter()
                .find(|a| a.is_with_doctor_in(&text))
                .or_else(|| on_date.first())
                .copied();
        }

        let mut with_doctor = appointments.iter().filter(|a| a.is_with_doctor_in(&text));
        match (with_doctor.next(), with_doctor.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
}

/// Body of `POST /api/appointments/book`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub doctor_id: i64,
    pub appointment_date: String,
    pub appointment_time: String,
    pub status: AppointmentStatus,
}

impl BookingRequest {
    pub fn scheduled(doctor_id: i64, date: &str, time: &str) -> Self {
        Self {
            doctor_id,
            appointment_date: date.to_string(),
            appointment_time: time.to_string(),
            status: AppointmentStatus::Scheduled,
        }
    }
}
