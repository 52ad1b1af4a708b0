//! Backend-facing half of the assistant: every call to the hospital API and
//! the translation of its outcome into a [`Response`].

use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::errors::ApiError;
use crate::models::{Appointment, BillingRecord, BookingRequest, Doctor, Report, Response, User, Visit};
use crate::services::api::ApiClient;
use crate::services::knowledge::{self, capitalize};

const DOCTORS_PATH: &str = "/api/doctors";
const MY_SCHEDULE_PATH: &str = "/api/appointments/my-schedule";
const BOOK_PATH: &str = "/api/appointments/book";
const VISITS_PATH: &str = "/api/patient/visits";
const REPORTS_PATH: &str = "/api/patient/reports";
const BILLING_PATH: &str = "/api/patient/billing";

const GENERIC_BOOKING_ERROR: &str = "The slot might be taken or there was a system error.";

pub struct BookingOrchestrator {
    api: Arc<dyn ApiClient>,
}

impl BookingOrchestrator {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self { api }
    }

    /// GET a JSON array, treating an empty body as an empty list.
    async fn fetch_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let data = self.api.get(path).await?;
        if data.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(data)?)
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, ApiError> {
        self.fetch_list(DOCTORS_PATH).await
    }

    pub async fn list_doctors_by_department(&self, department: &str) -> Result<Vec<Doctor>, ApiError> {
        self.fetch_list(&format!("{DOCTORS_PATH}/by-department/{department}"))
            .await
    }

    pub async fn my_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.fetch_list(MY_SCHEDULE_PATH).await
    }

    // ── Doctor lookups ──

    /// Availability of a named doctor, or a short sample of the directory.
    pub async fn doctor_availability(&self, name: Option<&str>) -> Response {
        let doctors = match self.list_doctors().await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "doctor directory unavailable");
                return Response::text("System error: unable to connect to the doctor database.");
            }
        };

        match name {
            Some(name) => match doctors.iter().find(|d| d.is_named_in(name)) {
                Some(doc) => {
                    let shift = match (&doc.shift_start_time, &doc.shift_end_time) {
                        (Some(start), Some(end)) => format!(" Expected shift: {start} - {end}."),
                        _ => String::new(),
                    };
                    Response::text(format!(
                        "{} ({}) is available.{shift} Would you like to book?",
                        doc.titled_name(),
                        doc.specialization
                    ))
                    .with_options([format!("Book {}", doc.titled_name())])
                }
                None => Response::text(format!("I couldn't find a doctor named {name}.")),
            },
            None if doctors.is_empty() => {
                Response::text("I don't see any doctors in the directory right now.")
            }
            None => Response::text("Here are some of our available specialists:").with_options(
                doctors
                    .iter()
                    .take(3)
                    .map(|d| format!("{} ({})", d.titled_name(), d.specialization)),
            ),
        }
    }

    pub async fn department_availability(&self, department: &str) -> Response {
        let label = capitalize(department);
        match self.list_doctors_by_department(department).await {
            Ok(doctors) if doctors.is_empty() => Response::text(format!(
                "I don't see any doctors listed under {label} right now."
            )),
            Ok(doctors) => Response::text(format!("Doctors in {label}:"))
                .with_options(doctors.iter().map(|d| format!("Book {}", d.titled_name()))),
            Err(e) => {
                tracing::warn!(department, error = %e, "department directory unavailable");
                Response::text("System error: unable to connect to the doctor database.")
            }
        }
    }

    /// Suggests specialists for the first symptom keyword found in `text`.
    pub async fn symptom_check(&self, text: &str) -> Response {
        let Some(found) = knowledge::specialization_for_symptom(text) else {
            return Response::text(
                "I'm not sure which specialist you need. Try describing your symptom like 'headache', 'chest pain', or 'fever'.",
            );
        };

        let doctors = match self.list_doctors().await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "doctor directory unavailable for symptom check");
                return Response::text("I'm having trouble fetching the doctor list.");
            }
        };

        let wanted = found.specialization.to_lowercase();
        let specialists: Vec<&Doctor> = doctors
            .iter()
            .filter(|d| {
                let spec = d.specialization.to_lowercase();
                spec == wanted || (found.specialization == "Orthology" && spec.contains("ortho"))
            })
            .collect();

        if specialists.is_empty() {
            return Response::text(format!(
                "I recommend a {} for {}, but I don't see any available right now.",
                found.specialization, found.symptom
            ));
        }

        Response::text(format!(
            "For {}, I recommend a {}. Here are the available doctors:",
            found.symptom, found.specialization
        ))
        .with_options(specialists.iter().map(|d| format!("Book {}", d.titled_name())))
    }

    // ── Patient records ──

    pub async fn check_prescriptions(&self, user: &User) -> Response {
        match self.fetch_list::<Visit>(VISITS_PATH).await {
            Ok(visits) => {
                let prescriptions: Vec<String> = visits
                    .iter()
                    .flat_map(|v| v.prescriptions.iter())
                    .map(|p| format!("{} ({})", p.medicine_name, p.dosage))
                    .collect();

                if prescriptions.is_empty() {
                    return Response::text("You don't have any active prescriptions on file.");
                }
                Response::text("Here are your recent prescriptions:")
                    .with_options(prescriptions.into_iter().take(4))
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "failed to fetch visits");
                Response::text(
                    "I couldn't fetch your prescriptions. Please check the 'Prescriptions' tab.",
                )
            }
        }
    }

    pub async fn check_reports(&self, user: &User) -> Response {
        match self.fetch_list::<Report>(REPORTS_PATH).await {
            Ok(reports) if reports.is_empty() => Response::text(
                "I checked your records and didn't find any uploaded medical reports.",
            ),
            Ok(reports) => Response::text("Here are your latest reports:")
                .with_options(reports.into_iter().take(3).map(|r| r.file_name)),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "failed to fetch reports");
                Response::text("I couldn't fetch your reports right now.")
            }
        }
    }

    pub async fn check_billing(&self, user: &User) -> Response {
        match self.fetch_list::<BillingRecord>(BILLING_PATH).await {
            Ok(bills) => {
                let pending: f64 = bills.iter().map(BillingRecord::outstanding).sum();
                if pending > 0.0 {
                    return Response::text(format!(
                        "You have a total pending balance of ${pending:.2}. Please visit the Billing Counter (5th Floor) to clear your dues."
                    ))
                    .with_options(["Where is Billing?", "Download Invoice"]);
                }
                Response::text("You have no pending bills. All clear! ✅")
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "failed to fetch billing");
                Response::text("I couldn't access your billing info.")
            }
        }
    }

    /// Earliest follow-up on or after `today`.
    pub async fn check_next_visit(&self, user: &User, today: NaiveDate) -> Response {
        let visits = match self.fetch_list::<Visit>(VISITS_PATH).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "failed to fetch visits");
                return Response::text("I couldn't check your visit history right now.");
            }
        };

        let mut upcoming: Vec<(NaiveDate, &Visit)> = visits
            .iter()
            .filter_map(|v| v.follow_up().map(|d| (d, v)))
            .filter(|(d, _)| *d >= today)
            .collect();
        upcoming.sort_by_key(|(d, _)| *d);

        match upcoming.first() {
            Some((date, visit)) => {
                let with = visit
                    .doctor_name()
                    .map(|n| format!("Dr. {n}"))
                    .unwrap_or_else(|| "your doctor".to_string());
                Response::text(format!(
                    "Your next scheduled visit is on {} with {with}.",
                    date.format("%Y-%m-%d")
                ))
                .with_options(["Book Appointment", "My Prescriptions"])
            }
            None => Response::text("I don't see any scheduled follow-up visits in your history.")
                .with_options(["Book Appointment", "Check Availability"]),
        }
    }

    pub async fn view_appointments(&self, user: &User) -> Response {
        match self.my_appointments().await {
            Ok(appointments) if appointments.is_empty() => {
                Response::text("You don't have any upcoming appointments.")
                    .with_options(["Book Appointment"])
            }
            Ok(appointments) => {
                let lines: Vec<String> = appointments
                    .iter()
                    .map(|a| match &a.appointment_time {
                        Some(time) => format!("{} at {time}", a.option_label()),
                        None => a.option_label(),
                    })
                    .collect();
                Response::text(format!("Your upcoming appointments:\n{}", lines.join("\n")))
                    .with_options(["Reschedule", "Book Appointment"])
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "failed to fetch schedule");
                Response::text(
                    "I couldn't load your appointments. Please check the 'My Appointments' tab.",
                )
            }
        }
    }

    // ── Writes ──

    async fn book(&self, request: &BookingRequest) -> Result<(), ApiError> {
        let body = serde_json::to_value(request)?;
        self.api.post(BOOK_PATH, &body).await?;
        Ok(())
    }

    pub async fn finalize_booking(&self, request: &BookingRequest) -> Response {
        match self.book(request).await {
            Ok(()) => {
                tracing::info!(
                    doctor_id = request.doctor_id,
                    date = %request.appointment_date,
                    time = %request.appointment_time,
                    "appointment booked"
                );
                Response::text(
                    "Appointment booked successfully! You can view it in the 'My Appointments' tab.",
                )
                .with_options(["View Appointments"])
            }
            Err(e) => {
                tracing::error!(error = %e, "booking failed");
                let reason = e.backend_message().unwrap_or(GENERIC_BOOKING_ERROR);
                Response::text(format!("Sorry, unable to book. ({reason})"))
                    .with_options(["Try Again", "Check Availability"])
            }
        }
    }

    /// Books the new slot first and only then removes the old appointment, so
    /// a failed booking never leaves the user without an appointment.
    pub async fn finalize_reschedule(
        &self,
        request: &BookingRequest,
        old_appointment_id: i64,
    ) -> Response {
        if let Err(e) = self.book(request).await {
            tracing::error!(old_appointment_id, error = %e, "reschedule booking failed");
            let reason = e.backend_message().unwrap_or(GENERIC_BOOKING_ERROR);
            return Response::text(format!(
                "Failed to reschedule. ({reason}) Your original appointment has not been changed."
            ))
            .with_options(["Try Again", "Check Availability"]);
        }

        // The new appointment exists either way; a failed removal is only logged.
        if let Err(e) = self
            .api
            .delete(&format!("/api/appointments/{old_appointment_id}"))
            .await
        {
            tracing::warn!(
                old_appointment_id,
                error = %e,
                "new appointment booked but the old one could not be removed"
            );
        }

        Response::text("Appointment successfully moved to the new time!")
            .with_options(["View Appointments"])
    }
}
