use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    CheckAvailability,
    BookAppointment,
    HospitalInfo,
    DepartmentLocation,
    DoctorLocation,
    HospitalMap,
    Emergency,
    Unknown,
    ConfirmBooking,
    CancelBooking,
    SymptomCheck,
    Reschedule,
    PrescriptionCheck,
    ReportCheck,
    BillingCheck,
    InsuranceInfo,
    QueueStatus,
    NextVisit,
    ViewAppointments,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::CheckAvailability => "check_availability",
            Intent::BookAppointment => "book_appointment",
            Intent::HospitalInfo => "hospital_info",
            Intent::DepartmentLocation => "department_location",
            Intent::DoctorLocation => "doctor_location",
            Intent::HospitalMap => "hospital_map",
            Intent::Emergency => "emergency",
            Intent::Unknown => "unknown",
            Intent::ConfirmBooking => "confirm_booking",
            Intent::CancelBooking => "cancel_booking",
            Intent::SymptomCheck => "symptom_check",
            Intent::Reschedule => "reschedule",
            Intent::PrescriptionCheck => "prescription_check",
            Intent::ReportCheck => "report_check",
            Intent::BillingCheck => "billing_check",
            Intent::InsuranceInfo => "insurance_info",
            Intent::QueueStatus => "queue_status",
            Intent::NextVisit => "next_visit",
            Intent::ViewAppointments => "view_appointments",
        }
    }

    /// Intents that may interrupt an in-progress flow.
    pub fn switches_context(&self) -> bool {
        !matches!(self, Intent::Unknown | Intent::Greeting)
    }
}
