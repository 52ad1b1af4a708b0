use serde::{Deserialize, Serialize};

/// A doctor as returned by the directory endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub shift_start_time: Option<String>,
    #[serde(default)]
    pub shift_end_time: Option<String>,
}

impl Doctor {
    /// Name with a single "Dr." prefix, whether or not the directory already stores one.
    pub fn titled_name(&self) -> String {
        if self.name.to_lowercase().starts_with("dr.") {
            self.name.clone()
        } else {
            format!("Dr. {}", self.name)
        }
    }

    /// Whether free text refers to this doctor: the text names the doctor,
    /// or is itself a fragment (three or more characters) of the doctor's name.
    pub fn is_named_in(&self, text: &str) -> bool {
        let name = self.name.trim().to_lowercase();
        let text = text.trim().to_lowercase();
        if name.is_empty() || text.is_empty() {
            return false;
        }
        text.contains(&name) || (text.chars().count() >= 3 && name.contains(&text))
    }
}
