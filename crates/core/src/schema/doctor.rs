use super::{Category, EntityKind, FieldDefinition, FieldKind, FieldSchema};

const PERSONAL: &str = "personal";
const PROFESSIONAL: &str = "professional";
const CONTACT: &str = "contact";
const AVAILABILITY: &str = "availability";

const GENDERS: &[&str] = &["Male", "Female", "Other"];
const SPECIALIZATIONS: &[&str] = &[
    "General Practice",
    "Cardiology",
    "Dermatology",
    "Gynecology",
    "Neurology",
    "Orthopedics",
    "Pediatrics",
    "Psychiatry",
    "Radiology",
    "Surgery",
];
const CONSULTATION_MINUTES: &[&str] = &["15", "20", "30", "45", "60"];

const FIELDS: &[FieldDefinition] = &[
    FieldDefinition::new("first_name", "First Name", FieldKind::Text, PERSONAL).required(),
    FieldDefinition::new("last_name", "Last Name", FieldKind::Text, PERSONAL).required(),
    FieldDefinition::new(
        "gender",
        "Gender",
        FieldKind::Select { options: GENDERS },
        PERSONAL,
    ),
    FieldDefinition::new("date_of_birth", "Date of Birth", FieldKind::Date, PERSONAL),
    FieldDefinition::new(
        "specialization",
        "Specialization",
        FieldKind::Select {
            options: SPECIALIZATIONS,
        },
        PROFESSIONAL,
    )
    .required(),
    FieldDefinition::new(
        "license_number",
        "License Number",
        FieldKind::Text,
        PROFESSIONAL,
    )
    .required(),
    FieldDefinition::new(
        "qualification",
        "Qualification",
        FieldKind::Text,
        PROFESSIONAL,
    ),
    FieldDefinition::new(
        "years_of_experience",
        "Years of Experience",
        FieldKind::Number,
        PROFESSIONAL,
    ),
    FieldDefinition::new("department", "Department", FieldKind::Text, PROFESSIONAL),
    FieldDefinition::new(
        "consultation_fee",
        "Consultation Fee",
        FieldKind::Number,
        PROFESSIONAL,
    ),
    FieldDefinition::new("phone", "Phone Number", FieldKind::Tel, CONTACT).required(),
    FieldDefinition::new("email", "Email Address", FieldKind::Email, CONTACT).required(),
    FieldDefinition::new("address", "Address", FieldKind::Textarea, CONTACT),
    FieldDefinition::new(
        "consultation_duration",
        "Consultation Length (minutes)",
        FieldKind::Select {
            options: CONSULTATION_MINUTES,
        },
        AVAILABILITY,
    ),
    FieldDefinition::new(
        "max_daily_appointments",
        "Max Appointments per Day",
        FieldKind::Number,
        AVAILABILITY,
    ),
    FieldDefinition::new(
        "availability_notes",
        "Availability Notes",
        FieldKind::Textarea,
        AVAILABILITY,
    ),
];

pub static DOCTOR_SCHEMA: FieldSchema = FieldSchema {
    kind: EntityKind::Doctor,
    fields: FIELDS,
    categories: &[
        Category {
            id: PERSONAL,
            title: "Personal Information",
        },
        Category {
            id: PROFESSIONAL,
            title: "Professional Details",
        },
        Category {
            id: CONTACT,
            title: "Contact Details",
        },
        Category {
            id: AVAILABILITY,
            title: "Availability",
        },
    ],
    essentials: &["qualification", "consultation_fee", "address"],
    schedule_category: Some(AVAILABILITY),
};
