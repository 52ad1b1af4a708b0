//! Replies answered from the knowledge base alone, without a backend call.

use rand::Rng;

use crate::models::{ActionId, Response, User};
use crate::services::knowledge::{self, capitalize};
use crate::services::slots;

pub fn greeting(user: &User, assistant_name: &str) -> Response {
    Response::text(format!(
        "Hello {}! I'm {assistant_name}. I can help with appointments, reports, billing, and more.",
        user.display_name()
    ))
    .with_options(["Book Appointment", "Check Symptoms", "My Prescriptions", "My Bills"])
}

pub fn hospital_info(text: &str) -> Response {
    if let Some((dept, location)) = knowledge::find_department(text) {
        return Response::text(format!("{} is located on {location}.", capitalize(dept)));
    }

    let text = text.to_lowercase();
    if text.contains("hour") || text.contains("open") || text.contains("close") {
        let hours = knowledge::hospital_hours();
        return Response::text(format!(
            "The hospital is open from {} to {} every day. Emergency services are 24/7.",
            hours.open, hours.close
        ));
    }

    Response::text(
        "I can help you find departments like Cardiology, Billing, or Pharmacy. Which one are you looking for?",
    )
    .with_options(["Where is Billing?", "Where is Pharmacy?", "Where is CT Scan?"])
}

pub fn doctor_location(text: &str) -> Response {
    let lower = text.to_lowercase();
    match knowledge::find_doctor_room(&lower) {
        Some((name, details)) if lower.contains(name) => Response::text(format!(
            "Dr. {} ({}) is in {}.",
            capitalize(name),
            details.specialization,
            details.room
        )),
        Some((name, details)) => Response::text(format!(
            "Dr. {} is the {} in {}.",
            capitalize(name),
            details.specialization,
            details.room
        )),
        None => Response::text(
            "I couldn't find the room for that doctor. Please check the name or specialization.",
        ),
    }
}

pub fn hospital_map() -> Response {
    Response::text("Opening hospital location in Google Maps...")
        .with_link(knowledge::map_link(), "Click to open Map")
        .with_options(["Where is Pharmacy?", "Find a Doctor"])
}

pub fn emergency() -> Response {
    Response::text("EMERGENCY: Please call for an ambulance immediately!")
        .with_action(ActionId::CallAmbulance, "🚑 Call Ambulance (108)")
        .urgent()
        .with_options(["Hospital Map"])
}

pub fn insurance() -> Response {
    Response::text(
        "We accept most major insurance providers including LIC, Star Health, and HDFC ERGO. Please visit the Admission Desk (Ground Floor) for pre-authorization assistance.",
    )
    .with_options(["Where is Admission Desk?", "My Bills"])
}

/// Minutes of waiting per patient ahead in the queue.
const MINUTES_PER_PATIENT: u32 = 15;

pub fn queue_status(text: &str) -> Response {
    let doctor = slots::extract_doctor_name(text)
        .and_then(|n| n.split_whitespace().next().map(capitalize));

    match doctor {
        Some(name) => {
            let waiting: u32 = rand::thread_rng().gen_range(1..=4);
            Response::text(format!(
                "Live Estimate: Dr. {name} has approx. {waiting} patients in waiting. Estimated wait time: {} mins.",
                waiting * MINUTES_PER_PATIENT
            ))
        }
        None => Response::text(
            "Average wait time is currently 15-30 minutes across departments. Checking specific doctor queues...",
        ),
    }
}

pub fn unknown() -> Response {
    Response::text(
        "I'm not sure I understood that. You can ask me about appointments, reports, billing, or finding a doctor.",
    )
    .with_options(["My Prescriptions", "My Reports", "Find a Doctor", "Check Symptoms"])
}
