use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::models::{Appointment, BookingRequest, ConversationContext, FlowStep, Intent, Response, User};
use crate::services::api::ApiClient;
use crate::services::booking::BookingOrchestrator;
use crate::services::intent::classify;
use crate::services::{info, knowledge, slots};

const CANCEL_WORDS: &[&str] = &["cancel", "stop", "abort", "exit"];

/// Extra ways to back out of a flow once there is something to answer no to.
const DECLINE_WORDS: &[&str] = &["no", "make a new booking"];

const TIME_SUGGESTIONS: [&str; 5] = ["09:00", "10:00", "11:00", "14:00", "16:00"];

fn is_cancel_command(lower: &str) -> bool {
    CANCEL_WORDS.contains(&lower)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn today_option() -> [String; 1] {
    [today().format("%Y-%m-%d").to_string()]
}

enum StepOutcome {
    Reply(Response),
    /// The input belongs to a different request; drop the flow and start over.
    Switch,
}

/// Dialogue engine for a single chat session.
///
/// Owns the conversation context outright: the only ways to change it are
/// [`ChatEngine::process`] and [`ChatEngine::reset`]. Taking `&mut self`
/// keeps turns strictly sequential.
pub struct ChatEngine {
    orchestrator: BookingOrchestrator,
    context: ConversationContext,
    assistant_name: String,
}

impl ChatEngine {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self {
            orchestrator: BookingOrchestrator::new(api),
            context: ConversationContext::default(),
            assistant_name: "Kiwi".to_string(),
        }
    }

    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = name.into();
        self
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn step(&self) -> FlowStep {
        self.context.step
    }

    pub fn reset(&mut self) {
        self.context = ConversationContext::default();
    }

    pub async fn process(&mut self, input: &str, user: &User) -> Response {
        let lower = input.trim().to_lowercase();

        tracing::info!(
            user_id = %user.id,
            step = self.context.step.as_str(),
            "processing message"
        );

        if is_cancel_command(&lower) {
            let was_active = !self.context.is_idle();
            self.reset();
            let text = if was_active {
                "Operation cancelled."
            } else {
                "Booking cancelled."
            };
            return Response::text(text).with_options(["Book Appointment", "Hospital Map"]);
        }

        if !self.context.is_idle() {
            match self.handle_flow(input, &lower).await {
                StepOutcome::Reply(reply) => return reply,
                StepOutcome::Switch => {
                    tracing::info!(
                        abandoned = self.context.step.as_str(),
                        "context switch, restarting turn"
                    );
                    self.reset();
                }
            }
        }

        self.dispatch(input, &lower, user).await
    }

    // ── Idle turns ──

    async fn dispatch(&mut self, input: &str, lower: &str, user: &User) -> Response {
        let intent = classify(input);
        tracing::info!(user_id = %user.id, intent = intent.as_str(), "classified message");

        match intent {
            Intent::Greeting => info::greeting(user, &self.assistant_name),
            Intent::HospitalInfo | Intent::DepartmentLocation => info::hospital_info(lower),
            Intent::DoctorLocation => info::doctor_location(lower),
            Intent::HospitalMap => info::hospital_map(),
            Intent::Emergency => info::emergency(),
            Intent::InsuranceInfo => info::insurance(),
            Intent::QueueStatus => info::queue_status(lower),
            Intent::CheckAvailability => self.check_availability(lower).await,
            Intent::SymptomCheck => self.orchestrator.symptom_check(lower).await,
            Intent::BookAppointment => self.initiate_booking(lower).await,
            Intent::Reschedule => self.initiate_reschedule().await,
            Intent::PrescriptionCheck => self.orchestrator.check_prescriptions(user).await,
            Intent::ReportCheck => self.orchestrator.check_reports(user).await,
            Intent::BillingCheck => self.orchestrator.check_billing(user).await,
            Intent::NextVisit => self.orchestrator.check_next_visit(user, today()).await,
            Intent::ViewAppointments => self.orchestrator.view_appointments(user).await,
            Intent::CancelBooking => {
                self.reset();
                Response::text("Booking cancelled.").with_options(["Book Appointment", "Hospital Map"])
            }
            Intent::ConfirmBooking => Response::text(
                "There's no booking waiting for confirmation. Would you like to start one?",
            )
            .with_options(["Book Appointment"]),
            Intent::Unknown => info::unknown(),
        }
    }

    async fn check_availability(&self, lower: &str) -> Response {
        if let Some(name) = slots::extract_doctor_name(lower) {
            return self.orchestrator.doctor_availability(Some(&name)).await;
        }
        if let Some((department, _)) = knowledge::find_department(lower) {
            return self.orchestrator.department_availability(department).await;
        }
        self.orchestrator.doctor_availability(None).await
    }

    async fn initiate_booking(&mut self, lower: &str) -> Response {
        let doctors = match self.orchestrator.list_doctors().await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "could not start booking");
                self.reset();
                return Response::text("Sorry, I can't fetch the doctor list right now.");
            }
        };
        self.context.doctor_cache = doctors;

        let named = slots::extract_booking_name(lower).and_then(|name| {
            self.context
                .doctor_cache
                .iter()
                .find(|d| d.is_named_in(&name))
                .cloned()
        });

        if let Some(doctor) = named {
            let reply = Response::text(format!(
                "Starting booking for {}. What date would you like? (YYYY-MM-DD)",
                doctor.titled_name()
            ))
            .with_options(today_option());
            self.context.slots.doctor = Some(doctor);
            self.context.step = FlowStep::AwaitingDate;
            return reply;
        }

        self.context.step = FlowStep::AwaitingDoctor;
        Response::text("Who would you like to see? You can type the doctor's name or choose from the list.")
            .with_options(self.doctor_choices())
    }

    async fn initiate_reschedule(&mut self) -> Response {
        let appointments = match self.orchestrator.my_appointments().await {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(error = %e, "could not load appointments for reschedule");
                self.reset();
                return Response::text(
                    "I couldn't retrieve your appointments. Please try again later.",
                );
            }
        };

        if appointments.is_empty() {
            return Response::text("You don't have any upcoming appointments to reschedule.")
                .with_options(["Book Appointment"]);
        }

        self.context.appointment_cache = appointments;
        self.context.step = FlowStep::AwaitingRescheduleSelection;
        Response::text("Here are your upcoming appointments. Which one would you like to move?")
            .with_options(self.appointment_choices())
    }

    fn doctor_choices(&self) -> Vec<String> {
        self.context
            .doctor_cache
            .iter()
            .take(5)
            .map(|d| d.name.clone())
            .collect()
    }

    fn appointment_choices(&self) -> Vec<String> {
        self.context
            .appointment_cache
            .iter()
            .map(Appointment::option_label)
            .collect()
    }

    // ── Active flow ──

    /// Re-prompt, unless the input is recognisably a different request.
    fn reprompt_or_switch(input: &str, reprompt: Response) -> StepOutcome {
        if classify(input).switches_context() {
            StepOutcome::Switch
        } else {
            StepOutcome::Reply(reprompt)
        }
    }

    async fn handle_flow(&mut self, input: &str, lower: &str) -> StepOutcome {
        let step = self.context.step;

        if matches!(
            step,
            FlowStep::AwaitingConfirmation | FlowStep::AwaitingRescheduleSelection
        ) && DECLINE_WORDS.contains(&lower)
        {
            self.reset();
            return StepOutcome::Reply(Response::text("Process cancelled."));
        }

        match step {
            FlowStep::Idle => StepOutcome::Switch,
            FlowStep::AwaitingDoctor => self.on_doctor(input, lower),
            FlowStep::AwaitingDate => self.on_date(input, lower),
            FlowStep::AwaitingTime => self.on_time(input, lower),
            FlowStep::AwaitingConfirmation => self.on_confirmation(input, lower).await,
            FlowStep::AwaitingRescheduleSelection => self.on_reschedule_selection(input, lower).await,
        }
    }

    fn on_doctor(&mut self, input: &str, lower: &str) -> StepOutcome {
        let selected = self
            .context
            .doctor_cache
            .iter()
            .find(|d| d.is_named_in(lower))
            .cloned();

        match selected {
            Some(doctor) => {
                let reply = Response::text(format!(
                    "Great, {}. What date would you like? (YYYY-MM-DD)",
                    doctor.titled_name()
                ))
                .with_options(today_option());
                self.context.slots.doctor = Some(doctor);
                self.context.step = FlowStep::AwaitingDate;
                StepOutcome::Reply(reply)
            }
            None => Self::reprompt_or_switch(
                input,
                Response::text("I couldn't find that doctor. Please try selecting one from the list.")
                    .with_options(self.doctor_choices()),
            ),
        }
    }

    fn on_date(&mut self, input: &str, lower: &str) -> StepOutcome {
        match slots::parse_date(lower) {
            Some(date) => {
                self.context.slots.date = Some(date);
                self.context.step = FlowStep::AwaitingTime;
                StepOutcome::Reply(
                    Response::text("And what time? (e.g., 10:00 or 14:30)")
                        .with_options(TIME_SUGGESTIONS),
                )
            }
            None => Self::reprompt_or_switch(
                input,
                Response::text("Please use the format YYYY-MM-DD (e.g., 2026-05-20)."),
            ),
        }
    }

    fn on_time(&mut self, input: &str, lower: &str) -> StepOutcome {
        let Some(time) = slots::normalize_time(lower) else {
            return Self::reprompt_or_switch(
                input,
                Response::text("Please enter a valid time in HH:mm format (24-hour)."),
            );
        };

        let doctor = self
            .context
            .slots
            .doctor
            .as_ref()
            .map(|d| d.titled_name())
            .unwrap_or_default();
        let date = self.context.slots.date.clone().unwrap_or_default();

        let prompt = if self.context.slots.is_reschedule() {
            format!("Confirm moving your appointment with {doctor} to {date} at {time}?")
        } else {
            format!("Please confirm: Appointment with {doctor} on {date} at {time}?")
        };

        self.context.slots.time = Some(time);
        self.context.step = FlowStep::AwaitingConfirmation;
        StepOutcome::Reply(Response::text(prompt).with_options(["Yes, confirm", "Cancel"]))
    }

    async fn on_confirmation(&mut self, input: &str, lower: &str) -> StepOutcome {
        let confirmed = ["yes", "confirm", "book"].iter().any(|w| lower.contains(w));
        if !confirmed {
            return Self::reprompt_or_switch(
                input,
                Response::text("Please say 'Yes' to confirm or 'Cancel' to stop.")
                    .with_options(["Yes, confirm", "Cancel"]),
            );
        }

        let slots = &self.context.slots;
        let old_appointment_id = slots.old_appointment_id;
        let request = match (&slots.doctor, &slots.date, &slots.time) {
            (Some(doctor), Some(date), Some(time)) => {
                Some(BookingRequest::scheduled(doctor.id, date, time))
            }
            _ => None,
        };

        let Some(request) = request else {
            tracing::error!(slots = ?self.context.slots, "confirmation reached with incomplete slots");
            self.reset();
            return StepOutcome::Reply(
                Response::text("I'm sorry, something went wrong. Could you start over?")
                    .with_options(["Book Appointment"]),
            );
        };

        let reply = match old_appointment_id {
            Some(old_id) => self.orchestrator.finalize_reschedule(&request, old_id).await,
            None => self.orchestrator.finalize_booking(&request).await,
        };

        // Terminal either way: a failed booking is not resumable.
        self.reset();
        StepOutcome::Reply(reply)
    }

    async fn on_reschedule_selection(&mut self, input: &str, lower: &str) -> StepOutcome {
        let Some(appointment) = Appointment::select(&self.context.appointment_cache, lower).cloned()
        else {
            return Self::reprompt_or_switch(
                input,
                Response::text(
                    "I didn't catch which appointment. Please select from the options provided.",
                )
                .with_options(self.appointment_choices()),
            );
        };

        if self.context.doctor_cache.is_empty() {
            match self.orchestrator.list_doctors().await {
                Ok(doctors) => self.context.doctor_cache = doctors,
                Err(e) => {
                    tracing::warn!(error = %e, "doctor directory unavailable, using appointment's doctor");
                }
            }
        }

        let doctor = appointment.doctor.as_ref().and_then(|embedded| {
            self.context
                .doctor_cache
                .iter()
                .find(|d| d.id == embedded.id)
                .cloned()
                .or_else(|| Some(embedded.clone()))
        });

        let Some(doctor) = doctor else {
            tracing::warn!(appointment_id = appointment.id, "appointment has no doctor");
            self.reset();
            return StepOutcome::Reply(
                Response::text(
                    "I couldn't find the doctor for that appointment, so it can't be moved here. Please use the 'My Appointments' tab.",
                )
                .with_options(["View Appointments"]),
            );
        };

        let reply = Response::text(format!(
            "Okay, rescheduling {}. What is the NEW date you would like?",
            doctor.titled_name()
        ))
        .with_options(today_option());

        self.context.slots.old_appointment_id = Some(appointment.id);
        self.context.slots.doctor = Some(doctor);
        self.context.step = FlowStep::AwaitingDate;
        StepOutcome::Reply(reply)
    }
}
