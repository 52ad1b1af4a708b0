use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(default)]
    pub medicine_name: String,
    #[serde(default)]
    pub dosage: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitDoctorUser {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitDoctor {
    #[serde(default)]
    pub user: Option<VisitDoctorUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
    #[serde(default)]
    pub follow_up_date: Option<String>,
    #[serde(default)]
    pub doctor: Option<VisitDoctor>,
}

impl Visit {
    /// Follow-up day, accepting either a plain date or a full timestamp.
    pub fn follow_up(&self) -> Option<NaiveDate> {
        let raw = self.follow_up_date.as_deref()?.trim();
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    pub fn doctor_name(&self) -> Option<&str> {
        self.doctor
            .as_ref()?
            .user
            .as_ref()?
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub file_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub paid_amount: Option<f64>,
}

impl BillingRecord {
    pub fn outstanding(&self) -> f64 {
        self.total_amount.unwrap_or(0.0) - self.paid_amount.unwrap_or(0.0)
    }
}
