//! Rule-based intent classification.
//!
//! Rules are evaluated top to bottom and the first match wins. Precedence is
//! part of the contract: option labels are never reinterpreted, emergencies
//! preempt everything, and symptom detection runs before the generic
//! booking phrasing.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Intent;
use crate::services::knowledge;

/// Labels of suggested-reply buttons, matched against the untouched input.
const OPTION_LABELS: &[(&str, Intent)] = &[
    ("Book Appointment", Intent::BookAppointment),
    ("Check Symptoms", Intent::SymptomCheck),
    ("Reschedule", Intent::Reschedule),
    ("View Appointments", Intent::ViewAppointments),
    ("My Appointments", Intent::ViewAppointments),
    ("My Prescriptions", Intent::PrescriptionCheck),
    ("My Medicines", Intent::PrescriptionCheck),
    ("My Bills", Intent::BillingCheck),
    ("My Reports", Intent::ReportCheck),
    ("Hospital Map", Intent::HospitalMap),
    ("Check Availability", Intent::CheckAvailability),
    ("Find a Doctor", Intent::CheckAvailability),
    ("Where is Billing?", Intent::DepartmentLocation),
    ("Where is Pharmacy?", Intent::DepartmentLocation),
    ("Where is CT Scan?", Intent::DepartmentLocation),
    ("Where is Admission Desk?", Intent::DepartmentLocation),
];

enum Predicate {
    Matches(Regex),
    /// Every pattern must match somewhere in the input.
    MatchesAll(Vec<Regex>),
    /// Pattern must match and the input must name a known department.
    MatchesWithDepartment(Regex),
    /// Any symptom keyword from the knowledge base.
    Symptom,
}

impl Predicate {
    fn test(&self, lower: &str) -> bool {
        match self {
            Predicate::Matches(re) => re.is_match(lower),
            Predicate::MatchesAll(res) => res.iter().all(|re| re.is_match(lower)),
            Predicate::MatchesWithDepartment(re) => {
                re.is_match(lower) && knowledge::has_department(lower)
            }
            Predicate::Symptom => knowledge::mentions_symptom(lower),
        }
    }
}

struct Rule {
    intent: Intent,
    predicate: Predicate,
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let re = |p: &str| Regex::new(p).expect("Invalid intent regex");
    let rule = |intent, predicate| Rule { intent, predicate };

    vec![
        rule(Intent::Emergency, Predicate::Matches(re(r"emergency|ambulance|help|urgent"))),
        rule(
            Intent::HospitalMap,
            Predicate::Matches(re(r"where.*hospital|location.*hospital|show.*map|google.*map")),
        ),
        rule(
            Intent::Reschedule,
            Predicate::Matches(re(r"reschedule|move.*appointment|appointment.*move")),
        ),
        // Patient support
        rule(
            Intent::PrescriptionCheck,
            Predicate::Matches(re(r"prescription|medicine|meds|drug|pill")),
        ),
        rule(Intent::ReportCheck, Predicate::Matches(re(r"report|result|lab"))),
        rule(Intent::BillingCheck, Predicate::Matches(re(r"bill|invoice|payment|cost|owe"))),
        rule(Intent::InsuranceInfo, Predicate::Matches(re(r"insurance|coverage|policy|claim"))),
        rule(Intent::QueueStatus, Predicate::Matches(re(r"queue|wait"))),
        rule(
            Intent::NextVisit,
            Predicate::Matches(re(r"next.*visit|follow.*up|when.*come.*back")),
        ),
        // Symptoms
        rule(Intent::SymptomCheck, Predicate::Matches(re(r"symptom"))),
        rule(Intent::SymptomCheck, Predicate::Symptom),
        // Locations
        rule(
            Intent::DoctorLocation,
            Predicate::Matches(re(
                r"where.*dr|which.*room.*dr|find.*dr|which.*room.*(cardiologist|orthology)",
            )),
        ),
        rule(
            Intent::DepartmentLocation,
            Predicate::MatchesWithDepartment(re(r"where is|location|floor|find")),
        ),
        rule(
            Intent::HospitalInfo,
            Predicate::MatchesAll(vec![re(r"open|close|hours|time"), re(r"hospital|clinic")]),
        ),
        // Availability and booking
        rule(Intent::CheckAvailability, Predicate::Matches(re(r"available|free|when.*doctor"))),
        rule(Intent::BookAppointment, Predicate::Matches(re(r"book|schedule|appointment"))),
        rule(Intent::CancelBooking, Predicate::Matches(re(r"cancel|stop"))),
        rule(Intent::Greeting, Predicate::Matches(re(r"hello|hi|hey|greetings"))),
    ]
});

pub fn classify(raw_input: &str) -> Intent {
    let trimmed = raw_input.trim();

    if let Some((_, intent)) = OPTION_LABELS.iter().find(|(label, _)| *label == trimmed) {
        return *intent;
    }

    let lower = trimmed.to_lowercase();
    if lower == "book" {
        return Intent::BookAppointment;
    }

    RULES
        .iter()
        .find(|rule| rule.predicate.test(&lower))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Unknown)
}
