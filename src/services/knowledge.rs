//! Static hospital facts: where things are, who sits where, and which
//! specialist a symptom keyword points to.
//!
//! Every lookup that scans a table walks it in declaration order and returns
//! the first hit, so reordering entries changes answers.

const DEPARTMENTS: &[(&str, &str)] = &[
    ("ct scan", "3rd Floor, Room 309"),
    ("billing", "5th Floor, Room 502"),
    ("admission", "Ground Floor"),
    ("pharmacy", "Ground Floor"),
    ("cardiology", "Floor 3"),
    ("orthology", "Floor 2"),
    ("neurology", "Floor 4"),
    ("emergency", "Ground Floor (24/7)"),
    ("pathology", "Floor 2"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoctorRoom {
    pub specialization: &'static str,
    pub room: &'static str,
}

const DOCTOR_ROOMS: &[(&str, DoctorRoom)] = &[
    ("raja", DoctorRoom { specialization: "Cardiologist", room: "Room 301" }),
    ("kumar", DoctorRoom { specialization: "Orthology", room: "Room 203" }),
    ("meena", DoctorRoom { specialization: "Neurology", room: "Room 401" }),
    ("arjun", DoctorRoom { specialization: "General Medicine", room: "Room 102" }),
];

const SYMPTOMS: &[(&str, &str)] = &[
    ("chest", "Cardiologist"),
    ("heart", "Cardiologist"),
    ("breath", "Cardiologist"),
    ("bone", "Orthology"),
    ("fracture", "Orthology"),
    ("joint", "Orthology"),
    ("knee", "Orthology"),
    ("back", "Orthology"),
    ("head", "Neurology"),
    ("brain", "Neurology"),
    ("nerve", "Neurology"),
    ("dizzy", "Neurology"),
    ("fever", "General Medicine"),
    ("cold", "General Medicine"),
    ("flu", "General Medicine"),
    ("stomach", "General Medicine"),
    ("vomit", "General Medicine"),
    ("cough", "General Medicine"),
];

const MAP_LINK: &str = "https://maps.app.goo.gl/psbHeHnc9qeu3Sr28";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HospitalHours {
    pub open: &'static str,
    pub close: &'static str,
}

const HOURS: HospitalHours = HospitalHours {
    open: "08:00",
    close: "21:00",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymptomMatch {
    pub symptom: &'static str,
    pub specialization: &'static str,
}

pub fn department_location(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    DEPARTMENTS
        .iter()
        .find(|(dept, _)| *dept == name)
        .map(|(_, loc)| *loc)
}

/// First department whose name appears in `text`.
pub fn find_department(text: &str) -> Option<(&'static str, &'static str)> {
    let text = text.to_lowercase();
    DEPARTMENTS
        .iter()
        .find(|(dept, _)| text.contains(dept))
        .copied()
}

pub fn has_department(text: &str) -> bool {
    find_department(text).is_some()
}

pub fn doctor_room(name: &str) -> Option<DoctorRoom> {
    let name = name.trim().to_lowercase();
    DOCTOR_ROOMS
        .iter()
        .find(|(doc, _)| *doc == name)
        .map(|(_, room)| *room)
}

/// Room lookup from free text: a named doctor wins over a named specialization.
pub fn find_doctor_room(text: &str) -> Option<(&'static str, DoctorRoom)> {
    let text = text.to_lowercase();
    DOCTOR_ROOMS
        .iter()
        .find(|(doc, _)| text.contains(doc))
        .or_else(|| {
            DOCTOR_ROOMS
                .iter()
                .find(|(_, room)| text.contains(&room.specialization.to_lowercase()))
        })
        .copied()
}

pub fn specialization_for_symptom(text: &str) -> Option<SymptomMatch> {
    let text = text.to_lowercase();
    SYMPTOMS
        .iter()
        .find(|(symptom, _)| text.contains(symptom))
        .map(|&(symptom, specialization)| SymptomMatch {
            symptom,
            specialization,
        })
}

pub fn mentions_symptom(text: &str) -> bool {
    specialization_for_symptom(text).is_some()
}

pub fn hospital_hours() -> HospitalHours {
    HOURS
}

pub fn map_link() -> &'static str {
    MAP_LINK
}

/// "ct scan" -> "Ct scan"
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
