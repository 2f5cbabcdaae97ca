use super::{Category, EntityKind, FieldDefinition, FieldKind, FieldSchema};

const PERSONAL: &str = "personal";
const CONTACT: &str = "contact";
const MEDICAL: &str = "medical";
const INSURANCE: &str = "insurance";
const EMERGENCY: &str = "emergency";

const GENDERS: &[&str] = &["Male", "Female", "Other"];
const BLOOD_GROUPS: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
const MARITAL_STATUSES: &[&str] = &["Single", "Married", "Divorced", "Widowed"];
const RELATIONS: &[&str] = &["Spouse", "Parent", "Child", "Sibling", "Friend", "Other"];

const FIELDS: &[FieldDefinition] = &[
    FieldDefinition::new("first_name", "First Name", FieldKind::Text, PERSONAL).required(),
    FieldDefinition::new("last_name", "Last Name", FieldKind::Text, PERSONAL).required(),
    FieldDefinition::new("date_of_birth", "Date of Birth", FieldKind::Date, PERSONAL).required(),
    FieldDefinition::new(
        "gender",
        "Gender",
        FieldKind::Select { options: GENDERS },
        PERSONAL,
    )
    .required(),
    FieldDefinition::new(
        "blood_group",
        "Blood Group",
        FieldKind::Select {
            options: BLOOD_GROUPS,
        },
        PERSONAL,
    ),
    FieldDefinition::new(
        "marital_status",
        "Marital Status",
        FieldKind::Select {
            options: MARITAL_STATUSES,
        },
        PERSONAL,
    ),
    FieldDefinition::new("occupation", "Occupation", FieldKind::Text, PERSONAL),
    FieldDefinition::new("phone", "Phone Number", FieldKind::Tel, CONTACT).required(),
    FieldDefinition::new("email", "Email Address", FieldKind::Email, CONTACT),
    FieldDefinition::new("address", "Address", FieldKind::Textarea, CONTACT),
    FieldDefinition::new("city", "City", FieldKind::Text, CONTACT),
    FieldDefinition::new("postal_code", "Postal Code", FieldKind::Text, CONTACT),
    FieldDefinition::new("allergies", "Allergies", FieldKind::Textarea, MEDICAL),
    FieldDefinition::new(
        "chronic_conditions",
        "Chronic Conditions",
        FieldKind::Textarea,
        MEDICAL,
    ),
    FieldDefinition::new(
        "current_medications",
        "Current Medications",
        FieldKind::Textarea,
        MEDICAL,
    ),
    FieldDefinition::new("height_cm", "Height (cm)", FieldKind::Number, MEDICAL),
    FieldDefinition::new("weight_kg", "Weight (kg)", FieldKind::Number, MEDICAL),
    FieldDefinition::new(
        "insurance_provider",
        "Insurance Provider",
        FieldKind::Text,
        INSURANCE,
    ),
    FieldDefinition::new(
        "insurance_policy_number",
        "Policy Number",
        FieldKind::Text,
        INSURANCE,
    ),
    FieldDefinition::new(
        "emergency_contact_name",
        "Emergency Contact Name",
        FieldKind::Text,
        EMERGENCY,
    ),
    FieldDefinition::new(
        "emergency_contact_phone",
        "Emergency Contact Phone",
        FieldKind::Tel,
        EMERGENCY,
    ),
    FieldDefinition::new(
        "emergency_contact_relation",
        "Relationship",
        FieldKind::Select { options: RELATIONS },
        EMERGENCY,
    ),
];

pub static PATIENT_SCHEMA: FieldSchema = FieldSchema {
    kind: EntityKind::Patient,
    fields: FIELDS,
    categories: &[
        Category {
            id: PERSONAL,
            title: "Personal Information",
        },
        Category {
            id: CONTACT,
            title: "Contact Details",
        },
        Category {
            id: MEDICAL,
            title: "Medical Information",
        },
        Category {
            id: INSURANCE,
            title: "Insurance",
        },
        Category {
            id: EMERGENCY,
            title: "Emergency Contact",
        },
    ],
    essentials: &[
        "email",
        "address",
        "emergency_contact_name",
        "emergency_contact_phone",
    ],
    schedule_category: None,
};
