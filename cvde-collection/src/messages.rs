use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use cvde_order::ExamOrder;
use cvde_shared::format::{digits_only, format_driver_phone, format_local_phone};

/// Failures around the driver notification flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("Driver phone must have 13 digits in the format +00 (00) 00000-0000.")]
    InvalidDriverPhone,

    #[error("Save the driver phone to enable this.")]
    MissingDriverPhone,

    #[error("No collection requested for this order.")]
    NoCollectionRequested,
}

/// Checks the 13-digit rule and returns the canonical formatted value that
/// gets stored, `+00 (00) 00000-0000`.
pub fn validate_driver_phone(input: &str) -> Result<String, CollectionError> {
    if digits_only(input).len() != 13 {
        return Err(CollectionError::InvalidDriverPhone);
    }
    Ok(format_driver_phone(input))
}

/// The message an operator sends when dispatching the driver: clinic header,
/// the people involved, a patient summary and the exam list.
pub fn build_driver_request_message(order: &ExamOrder) -> String {
    let clinic_name = order.clinic_display_name();
    let clinic_address = order
        .vet_affiliation
        .as_ref()
        .and_then(|affiliation| affiliation.clinic_address());

    let mut lines = vec![
        format!("CVDE Collection Request - Order #{}", order.id),
        format!("*{}*", clinic_name.to_uppercase()),
    ];
    if let Some(address) = clinic_address {
        lines.push(format!("Address: {}", address));
    }
    lines.push(String::new());
    lines.push(format!(
        "Vet: {}",
        order.vet_name_snapshot.as_deref().unwrap_or("Not informed")
    ));
    lines.push(format!(
        "Vet email: {}",
        order.vet_email_snapshot.as_deref().unwrap_or("Not informed")
    ));
    lines.push(format!("Owner: {}", order.owner_name));
    lines.push(format!(
        "Owner phone: {}",
        format_local_phone(order.owner_phone.as_str())
    ));
    lines.push(format!("Patient: {}", patient_summary(order)));

    let exams = order.exam_names();
    lines.push(format!(
        "Exams: {}",
        if exams.is_empty() { "Not informed" } else { exams.as_str() }
    ));
    lines.push(String::new());
    lines.push("Please collect the sample at the requesting clinic.".to_string());

    lines.join("\n")
}

/// Short nudge sent once the collection shows as overdue.
pub fn build_reminder_message(order: &ExamOrder) -> String {
    [
        format!("CVDE Reminder - Order #{}", order.id),
        "This collection is overdue.".to_string(),
        format!("Patient: {}", order.patient_name),
        format!("Owner: {}", order.owner_name),
        "Please send an update and prioritize delivery to the clinic.".to_string(),
    ]
    .join("\n")
}

fn patient_summary(order: &ExamOrder) -> String {
    let mut parts = vec![order.patient_name.clone()];
    if let Some(species) = &order.species {
        parts.push(format!("Species: {}", species));
    }
    if let Some(breed) = &order.breed {
        parts.push(format!("Breed: {}", breed));
    }
    if let Some(age) = order.age_years {
        parts.push(format!("Age: {}", age));
    }
    parts.join(" | ")
}

// The set encodeURIComponent leaves literal: alphanumerics plus -_.!~*'()
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Deep link that opens the messaging app with the text prefilled. Pure
/// string construction; actually sending it is the operator clicking through.
pub fn whatsapp_link(driver_phone: &str, message: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        digits_only(driver_phone),
        utf8_percent_encode(message, URI_COMPONENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cvde_order::{OrderStatus, SelectedExam};
    use cvde_shared::{Masked, ProfessionalAffiliation};
    use uuid::Uuid;

    fn clinic_order() -> ExamOrder {
        let now = Utc::now();
        ExamOrder {
            id: 42,
            vet_id: Uuid::new_v4(),
            vet_name_snapshot: Some("Alice Souza".to_string()),
            vet_email_snapshot: Some("alice@clinic.example".to_string()),
            vet_crmv_snapshot: Some("CRMV-12345".to_string()),
            vet_affiliation: Some(ProfessionalAffiliation::Clinic {
                name: "Happy Paws".to_string(),
                address: Some("12 Main St".to_string()),
            }),
            owner_name: "Bruna Lima".to_string(),
            owner_government_id: Masked::new("12345678909".to_string()),
            owner_phone: Masked::new("11988887777".to_string()),
            owner_address: None,
            owner_email: None,
            patient_name: "Rex".to_string(),
            species: Some("Dog".to_string()),
            breed: Some("Beagle".to_string()),
            age_years: Some(4),
            weight_kg: Some(12.5),
            neuter_status: None,
            reactive_status: None,
            clinical_notes: None,
            selected_exams: vec![
                SelectedExam {
                    exam_id: 1,
                    exam_name: "Blood Panel".to_string(),
                    unit_price_cents: 5000,
                },
                SelectedExam {
                    exam_id: 2,
                    exam_name: "X-Ray".to_string(),
                    unit_price_cents: 3000,
                },
            ],
            total_cents: 8000,
            status: OrderStatus::Requested,
            scheduled_for: None,
            admin_notes: None,
            request_collection: true,
            driver_collection_requested: true,
            driver_requested_at: Some(now),
            sample_received_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    #[test]
    fn test_request_message_layout() {
        let message = build_driver_request_message(&clinic_order());
        let expected = "CVDE Collection Request - Order #42\n\
                        *HAPPY PAWS*\n\
                        Address: 12 Main St\n\
                        \n\
                        Vet: Alice Souza\n\
                        Vet email: alice@clinic.example\n\
                        Owner: Bruna Lima\n\
                        Owner phone: (11) 98888-7777\n\
                        Patient: Rex | Species: Dog | Breed: Beagle | Age: 4\n\
                        Exams: Blood Panel, X-Ray\n\
                        \n\
                        Please collect the sample at the requesting clinic.";
        assert_eq!(message, expected);
    }

    #[test]
    fn test_request_message_fallbacks() {
        let mut order = clinic_order();
        order.vet_affiliation = Some(ProfessionalAffiliation::Independent);
        order.vet_name_snapshot = None;
        order.vet_email_snapshot = None;
        order.species = None;
        order.breed = None;
        order.age_years = None;
        order.selected_exams.clear();

        let message = build_driver_request_message(&order);
        assert!(message.contains("*INDEPENDENT PROFESSIONAL*"));
        assert!(!message.contains("Address:"));
        assert!(message.contains("Vet: Not informed"));
        assert!(message.contains("Vet email: Not informed"));
        assert!(message.contains("Patient: Rex\n"));
        assert!(message.contains("Exams: Not informed"));
    }

    #[test]
    fn test_missing_affiliation_header() {
        let mut order = clinic_order();
        order.vet_affiliation = None;
        let message = build_driver_request_message(&order);
        assert!(message.contains("*CLINIC NOT INFORMED*"));
    }

    #[test]
    fn test_reminder_message_layout() {
        let message = build_reminder_message(&clinic_order());
        let expected = "CVDE Reminder - Order #42\n\
                        This collection is overdue.\n\
                        Patient: Rex\n\
                        Owner: Bruna Lima\n\
                        Please send an update and prioritize delivery to the clinic.";
        assert_eq!(message, expected);
    }

    #[test]
    fn test_driver_phone_validation() {
        assert_eq!(
            validate_driver_phone("+55 (11) 98888-7777").unwrap(),
            "+55 (11) 98888-7777"
        );
        assert_eq!(
            validate_driver_phone("5511988887777").unwrap(),
            "+55 (11) 98888-7777"
        );
        let err = validate_driver_phone("11 98888-7777").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Driver phone must have 13 digits in the format +00 (00) 00000-0000."
        );
    }

    #[test]
    fn test_whatsapp_link_encoding() {
        let url = whatsapp_link("+55 (11) 98888-7777", "Hello world\n*TEST* (now)!");
        assert_eq!(
            url,
            "https://wa.me/5511988887777?text=Hello%20world%0A*TEST*%20(now)!"
        );
    }
}
