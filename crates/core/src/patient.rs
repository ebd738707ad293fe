//! Patient intake questionnaire.
//!
//! Four pages after the intro: screening, family dynamics, expectations and
//! medical background, then commitment with consent and signature.

use serde::{Deserialize, Serialize};

use crate::choices::{
    Gender, GenderPreference, MaritalStatus, MilitaryService, SocialNetwork, TherapyType, YesNo,
};
use crate::consent::ConsentItem;
use crate::error::ValidationFailure;
use crate::questionnaire::{Questionnaire, RecordContext, StepDefinition, StepKind};
use crate::signature::SignatureSurface;
use crate::types::{FormKind, Timestamp};
use crate::validation::{require_email, require_min_chars, require_selected};

/// Upper bound of the sibling counter.
pub const MAX_SIBLINGS: u8 = 10;

pub const STEP_SCREENING: usize = 1;
pub const STEP_FAMILY: usize = 2;
pub const STEP_EXPECTATIONS: usize = 3;
pub const STEP_COMMITMENT: usize = 4;

pub const CONSENT_TERMS: &str = "terms";
pub const CONSENT_AGE: &str = "age";
pub const CONSENT_MARKETING: &str = "marketing";

const STEPS: &[StepDefinition] = &[
    StepDefinition {
        index: 0,
        label: "Introduction",
        kind: StepKind::Intro,
        fields: &[],
    },
    StepDefinition {
        index: STEP_SCREENING,
        label: "Screening & introduction",
        kind: StepKind::Questions,
        fields: &[
            "full_name",
            "phone",
            "email",
            "birth_date",
            "gender",
            "city",
            "marital_status",
            "occupation",
            "military_service",
            "military_role",
            "social_network",
            "social_username",
            "main_reason",
        ],
    },
    StepDefinition {
        index: STEP_FAMILY,
        label: "Family dynamics",
        kind: StepKind::Questions,
        fields: &[
            "mother_name",
            "mother_relationship",
            "father_name",
            "father_relationship",
            "siblings_count",
            "siblings_details",
            "early_memory",
            "open_space",
        ],
    },
    StepDefinition {
        index: STEP_EXPECTATIONS,
        label: "Expectations & medical",
        kind: StepKind::Questions,
        fields: &[
            "previous_therapy_history",
            "why_now",
            "fears",
            "expectations",
            "chronic_issues",
            "medications",
            "other_treatment",
            "other_treatment_details",
            "therapy_type",
            "therapist_gender_preference",
        ],
    },
    StepDefinition {
        index: STEP_COMMITMENT,
        label: "Commitment",
        kind: StepKind::Final,
        fields: &[],
    },
];

const CONSENT_ITEMS: &[ConsentItem] = &[
    ConsentItem {
        id: CONSENT_TERMS,
        label: "I have read the commitment text and confirm the details I gave are true",
        required: true,
        gated: true,
    },
    ConsentItem {
        id: CONSENT_AGE,
        label: "I confirm I am 18 or older",
        required: true,
        gated: true,
    },
    ConsentItem {
        id: CONSENT_MARKETING,
        label: "I agree to receive updates and content",
        required: false,
        gated: false,
    },
];

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiblingDetail {
    pub name: String,
    pub relationship: String,
}

/// In-progress patient answers. Every field has an empty default, so a
/// partially saved draft always loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientDraft {
    // Screening
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub birth_date: String,
    pub gender: Option<Gender>,
    pub city: String,
    pub marital_status: Option<MaritalStatus>,
    pub occupation: String,
    pub military_service: Option<MilitaryService>,
    pub military_role: String,
    pub social_network: Option<SocialNetwork>,
    pub social_username: String,
    pub main_reason: String,

    // Family
    pub mother_name: String,
    pub mother_relationship: String,
    pub father_name: String,
    pub father_relationship: String,
    pub siblings_count: u8,
    pub siblings_details: Vec<SiblingDetail>,
    pub early_memory: String,
    pub open_space: String,

    // Expectations and medical
    pub previous_therapy_history: String,
    pub why_now: String,
    pub fears: String,
    pub expectations: String,
    pub chronic_issues: String,
    pub medications: String,
    pub other_treatment: Option<YesNo>,
    pub other_treatment_details: String,
    pub therapy_type: Option<TherapyType>,
    pub therapist_gender_preference: GenderPreference,
}

/// Edit of one sibling slot. Absent parts are left as they are.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiblingEdit {
    pub index: usize,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}

/// One field update, `{ "field": "<name>", "value": ... }` on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum PatientField {
    FullName(String),
    Phone(String),
    Email(String),
    BirthDate(String),
    Gender(Option<Gender>),
    City(String),
    MaritalStatus(Option<MaritalStatus>),
    Occupation(String),
    MilitaryService(Option<MilitaryService>),
    MilitaryRole(String),
    SocialNetwork(Option<SocialNetwork>),
    SocialUsername(String),
    MainReason(String),
    MotherName(String),
    MotherRelationship(String),
    FatherName(String),
    FatherRelationship(String),
    /// Clamped into `0..=MAX_SIBLINGS`.
    SiblingsCount(i64),
    Sibling(SiblingEdit),
    EarlyMemory(String),
    OpenSpace(String),
    PreviousTherapyHistory(String),
    WhyNow(String),
    Fears(String),
    Expectations(String),
    ChronicIssues(String),
    Medications(String),
    OtherTreatment(Option<YesNo>),
    OtherTreatmentDetails(String),
    TherapyType(Option<TherapyType>),
    TherapistGenderPreference(GenderPreference),
}

impl PatientDraft {
    /// Set the sibling count and resize the detail list to match. Slots
    /// re-added after a decrease start empty.
    pub fn set_siblings_count(&mut self, requested: i64) {
        let count = requested.clamp(0, i64::from(MAX_SIBLINGS)) as u8;
        self.siblings_count = count;
        self.siblings_details
            .resize_with(usize::from(count), SiblingDetail::default);
    }

    /// Edit one sibling, padding the list with empty records up to `index`.
    pub fn edit_sibling(&mut self, edit: SiblingEdit) {
        if edit.index >= usize::from(MAX_SIBLINGS) {
            tracing::debug!(index = edit.index, "Ignoring sibling edit beyond limit");
            return;
        }
        if self.siblings_details.len() <= edit.index {
            self.siblings_details
                .resize_with(edit.index + 1, SiblingDetail::default);
        }
        let slot = &mut self.siblings_details[edit.index];
        if let Some(name) = edit.name {
            slot.name = name;
        }
        if let Some(relationship) = edit.relationship {
            slot.relationship = relationship;
        }
    }

    /// `"{network}:{username}"` when a username was given.
    pub fn social_link(&self) -> Option<String> {
        let username = self.social_username.trim();
        if username.is_empty() {
            return None;
        }
        let network = self
            .social_network
            .map(|n| n.as_str())
            .unwrap_or_default();
        Some(format!("{network}:{username}"))
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicalBackground {
    pub chronic_issues: String,
    pub medications: String,
    pub other_treatment: bool,
    pub other_treatment_details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyDynamics {
    pub mother_name: String,
    pub mother_relationship: String,
    pub father_name: String,
    pub father_relationship: String,
    pub siblings_count: u8,
    pub siblings_details: Vec<SiblingDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InnerWorld {
    pub early_memory: String,
    pub open_space: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientQuestionnaire {
    pub main_reason: String,
    pub previous_therapy_history: String,
    pub expectations: String,
    pub why_now: String,
    pub fears: String,
    pub medical_background: MedicalBackground,
    pub family_dynamics: FamilyDynamics,
    pub inner_world: InnerWorld,
}

/// Row inserted into `patients`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub city: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<Gender>,
    pub marital_status: Option<MaritalStatus>,
    pub occupation: Option<String>,
    pub military_service: Option<MilitaryService>,
    pub social_link: Option<String>,
    pub therapy_type: Option<TherapyType>,
    pub therapist_gender_preference: GenderPreference,
    pub questionnaire: PatientQuestionnaire,
    pub signature_data: String,
    pub legal_consent_date: Timestamp,
    pub status: &'static str,
    pub marketing_consent: bool,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Questionnaire
// ---------------------------------------------------------------------------

pub struct PatientIntake;

impl Questionnaire for PatientIntake {
    type Draft = PatientDraft;
    type Field = PatientField;
    type Record = PatientRecord;

    const FORM: FormKind = FormKind::Patient;

    fn steps() -> &'static [StepDefinition] {
        STEPS
    }

    fn validate_step(
        draft: &PatientDraft,
        step: usize,
        _now: Timestamp,
    ) -> Result<(), ValidationFailure> {
        match step {
            STEP_SCREENING => {
                require_min_chars(
                    &draft.full_name,
                    2,
                    step,
                    "full_name",
                    "Please enter your full name",
                )?;
                require_min_chars(
                    &draft.phone,
                    9,
                    step,
                    "phone",
                    "Please enter a valid phone number",
                )?;
                require_email(
                    &draft.email,
                    step,
                    "email",
                    "Please enter a valid email address",
                )?;
                require_min_chars(
                    &draft.main_reason,
                    10,
                    step,
                    "main_reason",
                    "Please describe the reason for reaching out (at least 10 characters)",
                )
            }
            STEP_FAMILY => {
                require_min_chars(
                    &draft.mother_relationship,
                    5,
                    step,
                    "mother_relationship",
                    "Please describe your relationship with your mother",
                )?;
                require_min_chars(
                    &draft.father_relationship,
                    5,
                    step,
                    "father_relationship",
                    "Please describe your relationship with your father",
                )
            }
            STEP_EXPECTATIONS => require_selected(
                &draft.therapy_type,
                step,
                "therapy_type",
                "Please choose a preferred type of therapy",
            ),
            _ => Ok(()),
        }
    }

    fn apply(draft: &mut PatientDraft, field: PatientField) {
        use PatientField as F;
        match field {
            F::FullName(v) => draft.full_name = v,
            F::Phone(v) => draft.phone = v,
            F::Email(v) => draft.email = v,
            F::BirthDate(v) => draft.birth_date = v,
            F::Gender(v) => draft.gender = v,
            F::City(v) => draft.city = v,
            F::MaritalStatus(v) => draft.marital_status = v,
            F::Occupation(v) => draft.occupation = v,
            F::MilitaryService(v) => draft.military_service = v,
            F::MilitaryRole(v) => draft.military_role = v,
            F::SocialNetwork(v) => draft.social_network = v,
            F::SocialUsername(v) => draft.social_username = v,
            F::MainReason(v) => draft.main_reason = v,
            F::MotherName(v) => draft.mother_name = v,
            F::MotherRelationship(v) => draft.mother_relationship = v,
            F::FatherName(v) => draft.father_name = v,
            F::FatherRelationship(v) => draft.father_relationship = v,
            F::SiblingsCount(n) => draft.set_siblings_count(n),
            F::Sibling(edit) => draft.edit_sibling(edit),
            F::EarlyMemory(v) => draft.early_memory = v,
            F::OpenSpace(v) => draft.open_space = v,
            F::PreviousTherapyHistory(v) => draft.previous_therapy_history = v,
            F::WhyNow(v) => draft.why_now = v,
            F::Fears(v) => draft.fears = v,
            F::Expectations(v) => draft.expectations = v,
            F::ChronicIssues(v) => draft.chronic_issues = v,
            F::Medications(v) => draft.medications = v,
            F::OtherTreatment(v) => {
                draft.other_treatment = v;
                if v == Some(YesNo::No) {
                    draft.other_treatment_details.clear();
                }
            }
            F::OtherTreatmentDetails(v) => draft.other_treatment_details = v,
            F::TherapyType(v) => draft.therapy_type = v,
            F::TherapistGenderPreference(v) => draft.therapist_gender_preference = v,
        }
    }

    fn consent_items() -> &'static [ConsentItem] {
        CONSENT_ITEMS
    }

    fn scroll_threshold_px() -> f64 {
        10.0
    }

    fn signature_surface() -> SignatureSurface {
        SignatureSurface::new(150, [0x1a, 0x1a, 0x2e, 0xff])
    }

    fn build_record(draft: &PatientDraft, ctx: RecordContext<'_>) -> PatientRecord {
        let marketing_consent = ctx.consent.is_checked(CONSENT_MARKETING).unwrap_or(false);

        PatientRecord {
            full_name: draft.full_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            city: non_empty(&draft.city),
            birth_date: non_empty(&draft.birth_date),
            gender: draft.gender,
            marital_status: draft.marital_status,
            occupation: non_empty(&draft.occupation),
            military_service: draft.military_service,
            social_link: draft.social_link(),
            therapy_type: draft.therapy_type,
            therapist_gender_preference: draft.therapist_gender_preference,
            questionnaire: PatientQuestionnaire {
                main_reason: draft.main_reason.clone(),
                previous_therapy_history: draft.previous_therapy_history.clone(),
                expectations: draft.expectations.clone(),
                why_now: draft.why_now.clone(),
                fears: draft.fears.clone(),
                medical_background: MedicalBackground {
                    chronic_issues: draft.chronic_issues.clone(),
                    medications: draft.medications.clone(),
                    other_treatment: draft.other_treatment.is_some_and(YesNo::is_yes),
                    other_treatment_details: draft.other_treatment_details.clone(),
                },
                family_dynamics: FamilyDynamics {
                    mother_name: draft.mother_name.clone(),
                    mother_relationship: draft.mother_relationship.clone(),
                    father_name: draft.father_name.clone(),
                    father_relationship: draft.father_relationship.clone(),
                    siblings_count: draft.siblings_count,
                    siblings_details: draft.siblings_details.clone(),
                },
                inner_world: InnerWorld {
                    early_memory: draft.early_memory.clone(),
                    open_space: draft.open_space.clone(),
                },
            },
            signature_data: ctx.signature_data.to_string(),
            legal_consent_date: ctx.now,
            status: FormKind::Patient.initial_status(),
            marketing_consent,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;
    use crate::consent::ConsentGate;

    pub(crate) fn filled_draft() -> PatientDraft {
        PatientDraft {
            full_name: "Dana Cohen".into(),
            phone: "0501234567".into(),
            email: "dana@example.com".into(),
            main_reason: "I have been feeling persistent anxiety for months".into(),
            mother_relationship: "Warm but distant".into(),
            father_relationship: "Complicated".into(),
            therapy_type: Some(TherapyType::Online),
            ..Default::default()
        }
    }

    pub(crate) fn sample_record() -> PatientRecord {
        let consent = ConsentGate::new(CONSENT_ITEMS, 10.0);
        PatientIntake::build_record(
            &filled_draft(),
            RecordContext {
                signature_data: "data:image/png;base64,AAAA",
                consent: &consent,
                now: chrono::Utc::now(),
            },
        )
    }

    fn now() -> Timestamp {
        chrono::Utc::now()
    }

    #[test]
    fn filled_draft_passes_every_step() {
        let draft = filled_draft();
        for step in 0..PatientIntake::steps().len() {
            assert!(PatientIntake::validate_step(&draft, step, now()).is_ok());
        }
    }

    #[test]
    fn empty_phone_fails_with_phone_message() {
        let draft = PatientDraft {
            phone: String::new(),
            ..filled_draft()
        };
        let err = PatientIntake::validate_step(&draft, STEP_SCREENING, now()).unwrap_err();
        assert_eq!(err.field, "phone");
        assert!(err.message.contains("phone"));
    }

    #[test]
    fn short_main_reason_fails() {
        let draft = PatientDraft {
            main_reason: "  anxious  ".into(),
            ..filled_draft()
        };
        let err = PatientIntake::validate_step(&draft, STEP_SCREENING, now()).unwrap_err();
        assert_eq!(err.field, "main_reason");
    }

    #[test]
    fn family_step_needs_both_relationships() {
        let draft = PatientDraft {
            father_relationship: "ok".into(),
            ..filled_draft()
        };
        let err = PatientIntake::validate_step(&draft, STEP_FAMILY, now()).unwrap_err();
        assert_eq!(err.field, "father_relationship");
    }

    #[test]
    fn therapy_type_required_on_step_three() {
        let draft = PatientDraft {
            therapy_type: None,
            ..filled_draft()
        };
        let err = PatientIntake::validate_step(&draft, STEP_EXPECTATIONS, now()).unwrap_err();
        assert_eq!(err.field, "therapy_type");
    }

    #[test]
    fn validation_does_not_mutate() {
        let draft = filled_draft();
        let before = draft.clone();
        let _ = PatientIntake::validate_step(&draft, STEP_SCREENING, now());
        assert_eq!(draft, before);
    }

    #[test]
    fn siblings_count_resizes_details() {
        let mut draft = PatientDraft::default();
        PatientIntake::apply(&mut draft, PatientField::SiblingsCount(3));
        assert_eq!(draft.siblings_details.len(), 3);
        assert!(draft.siblings_details.iter().all(|s| *s == SiblingDetail::default()));

        PatientIntake::apply(
            &mut draft,
            PatientField::Sibling(SiblingEdit {
                index: 2,
                name: Some("Noa".into()),
                relationship: Some("close".into()),
            }),
        );
        PatientIntake::apply(&mut draft, PatientField::SiblingsCount(1));
        assert_eq!(draft.siblings_details.len(), 1);

        PatientIntake::apply(&mut draft, PatientField::SiblingsCount(3));
        assert_eq!(draft.siblings_details[2], SiblingDetail::default());
    }

    #[test]
    fn siblings_count_is_clamped() {
        let mut draft = PatientDraft::default();
        PatientIntake::apply(&mut draft, PatientField::SiblingsCount(42));
        assert_eq!(draft.siblings_count, MAX_SIBLINGS);
        assert_eq!(draft.siblings_details.len(), usize::from(MAX_SIBLINGS));
        PatientIntake::apply(&mut draft, PatientField::SiblingsCount(-4));
        assert_eq!(draft.siblings_count, 0);
        assert!(draft.siblings_details.is_empty());
    }

    #[test]
    fn sibling_edit_pads_up_to_index() {
        let mut draft = PatientDraft::default();
        draft.edit_sibling(SiblingEdit {
            index: 2,
            name: Some("Yoav".into()),
            relationship: None,
        });
        assert_eq!(draft.siblings_details.len(), 3);
        assert_eq!(draft.siblings_details[2].name, "Yoav");
        assert_eq!(draft.siblings_details[2].relationship, "");
    }

    #[test]
    fn other_treatment_no_clears_details() {
        let mut draft = PatientDraft::default();
        PatientIntake::apply(&mut draft, PatientField::OtherTreatment(Some(YesNo::Yes)));
        PatientIntake::apply(
            &mut draft,
            PatientField::OtherTreatmentDetails("Acupuncture".into()),
        );
        PatientIntake::apply(&mut draft, PatientField::OtherTreatment(Some(YesNo::No)));
        assert!(draft.other_treatment_details.is_empty());
    }

    #[test]
    fn field_update_wire_format() {
        let field: PatientField =
            serde_json::from_value(json!({ "field": "full_name", "value": "Dana" })).unwrap();
        assert_eq!(field, PatientField::FullName("Dana".into()));

        let field: PatientField =
            serde_json::from_value(json!({ "field": "therapy_type", "value": "in_person" }))
                .unwrap();
        assert_eq!(field, PatientField::TherapyType(Some(TherapyType::InPerson)));

        let field: PatientField = serde_json::from_value(
            json!({ "field": "sibling", "value": { "index": 0, "name": "Tal" } }),
        )
        .unwrap();
        assert_matches::assert_matches!(field, PatientField::Sibling(SiblingEdit { index: 0, .. }));
    }

    #[test]
    fn record_nulls_empty_optionals() {
        let record = sample_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["city"], serde_json::Value::Null);
        assert_eq!(json["social_link"], serde_json::Value::Null);
        assert_eq!(json["therapist_gender_preference"], "any");
        assert_eq!(json["status"], "new");
        assert_eq!(json["marketing_consent"], false);
        assert_eq!(
            json["questionnaire"]["medical_background"]["other_treatment"],
            false
        );
    }

    #[test]
    fn social_link_joins_network_and_username() {
        let draft = PatientDraft {
            social_network: Some(SocialNetwork::Instagram),
            social_username: " dana.c ".into(),
            ..Default::default()
        };
        assert_eq!(draft.social_link().as_deref(), Some("instagram:dana.c"));
    }

    #[test]
    fn marketing_consent_is_copied_from_gate() {
        let mut consent = ConsentGate::new(CONSENT_ITEMS, 10.0);
        consent.set_checked(CONSENT_MARKETING, true).unwrap();
        let record = PatientIntake::build_record(
            &filled_draft(),
            RecordContext {
                signature_data: "",
                consent: &consent,
                now: now(),
            },
        );
        assert!(record.marketing_consent);
    }
}
