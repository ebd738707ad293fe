//! Therapist volunteer application.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::choices::{
    AcademicDegree, CommitmentDuration, Gender, MonthlyHours, NlpLevel, Specialization,
    TargetPopulation, TherapyMethod, TherapyMode, YesNo,
};
use crate::consent::ConsentItem;
use crate::error::ValidationFailure;
use crate::questionnaire::{Questionnaire, RecordContext, StepDefinition, StepKind};
use crate::signature::SignatureSurface;
use crate::types::{FormKind, Timestamp};
use crate::validation::{require_any, require_non_blank, require_selected, require_year};

pub const STEP_PROFILE: usize = 1;
pub const STEP_MOTIVE: usize = 2;
pub const STEP_COMMITMENT: usize = 3;
pub const STEP_AGREEMENT: usize = 4;

pub const CONSENT_INSURANCE: &str = "has_insurance";
pub const CONSENT_RESPONSIBILITY: &str = "accepts_responsibility";
pub const CONSENT_WAIVER: &str = "waiver_confirmed";

const STEPS: &[StepDefinition] = &[
    StepDefinition {
        index: 0,
        label: "Introduction",
        kind: StepKind::Intro,
        fields: &[],
    },
    StepDefinition {
        index: STEP_PROFILE,
        label: "Professional profile",
        kind: StepKind::Questions,
        fields: &[
            "full_name",
            "phone",
            "email",
            "birth_date",
            "gender",
            "city",
            "target_population",
            "specialization",
            "academic_degree",
            "license_number",
            "practice_start_year",
            "therapy_methods",
            "nlp_level",
            "education_details",
            "total_patients",
            "active_patients",
            "social_link",
        ],
    },
    StepDefinition {
        index: STEP_MOTIVE,
        label: "Depth & motive",
        kind: StepKind::Questions,
        fields: &["q_why", "q_join", "q_experience", "q_case_study", "q_challenges"],
    },
    StepDefinition {
        index: STEP_COMMITMENT,
        label: "Health & commitment",
        kind: StepKind::Questions,
        fields: &[
            "has_medical",
            "medical_details",
            "takes_meds",
            "in_therapy",
            "monthly_hours",
            "commitment_duration",
            "therapy_mode",
        ],
    },
    StepDefinition {
        index: STEP_AGREEMENT,
        label: "Agreement & signature",
        kind: StepKind::Final,
        fields: &[],
    },
];

const CONSENT_ITEMS: &[ConsentItem] = &[
    ConsentItem {
        id: CONSENT_INSURANCE,
        label: "I hold valid professional liability insurance",
        required: true,
        gated: true,
    },
    ConsentItem {
        id: CONSENT_RESPONSIBILITY,
        label: "I take full professional responsibility for the therapy I provide",
        required: true,
        gated: true,
    },
    ConsentItem {
        id: CONSENT_WAIVER,
        label: "I have read the ethics code and waiver and accept them",
        required: true,
        gated: true,
    },
];

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TherapistDraft {
    // Professional profile
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub birth_date: String,
    pub gender: Option<Gender>,
    pub city: String,
    pub target_population: Vec<TargetPopulation>,
    pub specialization: Vec<Specialization>,
    pub academic_degree: Vec<AcademicDegree>,
    pub license_number: String,
    pub practice_start_year: Option<i32>,
    pub therapy_methods: Vec<TherapyMethod>,
    pub nlp_level: Option<NlpLevel>,
    pub education_details: String,
    pub total_patients: Option<u32>,
    pub active_patients: Option<u32>,
    pub social_link: String,

    // Depth and motive
    pub q_why: String,
    pub q_join: String,
    pub q_experience: String,
    pub q_case_study: String,
    pub q_challenges: String,

    // Health and commitment
    pub has_medical: YesNo,
    pub medical_details: String,
    pub takes_meds: YesNo,
    pub in_therapy: YesNo,
    pub monthly_hours: Option<MonthlyHours>,
    pub commitment_duration: Option<CommitmentDuration>,
    pub therapy_mode: Option<TherapyMode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TherapistField {
    FullName(String),
    Phone(String),
    Email(String),
    BirthDate(String),
    Gender(Option<Gender>),
    City(String),
    TargetPopulation(Vec<TargetPopulation>),
    Specialization(Vec<Specialization>),
    AcademicDegree(Vec<AcademicDegree>),
    LicenseNumber(String),
    PracticeStartYear(Option<i32>),
    TherapyMethods(Vec<TherapyMethod>),
    NlpLevel(Option<NlpLevel>),
    EducationDetails(String),
    TotalPatients(Option<u32>),
    ActivePatients(Option<u32>),
    SocialLink(String),
    QWhy(String),
    QJoin(String),
    QExperience(String),
    QCaseStudy(String),
    QChallenges(String),
    HasMedical(YesNo),
    MedicalDetails(String),
    TakesMeds(YesNo),
    InTherapy(YesNo),
    MonthlyHours(Option<MonthlyHours>),
    CommitmentDuration(Option<CommitmentDuration>),
    TherapyMode(Option<TherapyMode>),
}

/// Multi-select answers keep first-chosen order without repeats.
fn dedup<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

impl TherapistDraft {
    /// Whole years since the practice start year, never negative.
    pub fn experience_years(&self, now: Timestamp) -> i32 {
        self.practice_start_year
            .map(|start| (now.year() - start).max(0))
            .unwrap_or(0)
    }

    pub fn uses_nlp(&self) -> bool {
        self.therapy_methods.contains(&TherapyMethod::Nlp)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapistHealth {
    pub has_medical_issues: bool,
    pub medical_issues_details: String,
    pub takes_psychiatric_meds: bool,
    pub in_personal_therapy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapistCommitment {
    pub monthly_hours: Option<MonthlyHours>,
    pub duration: Option<CommitmentDuration>,
    pub therapy_mode: Option<TherapyMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapistLegal {
    pub has_insurance: bool,
    pub accepts_responsibility: bool,
    pub waiver_confirmed: bool,
    pub scrolled_terms: bool,
    pub signed_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapistQuestionnaire {
    pub target_population: Vec<TargetPopulation>,
    pub specializations: Vec<Specialization>,
    pub academic_degrees: Vec<AcademicDegree>,
    pub therapy_methods: Vec<TherapyMethod>,
    pub nlp_level: Option<NlpLevel>,
    pub practice_start_year: Option<i32>,
    pub total_patients_estimate: Option<u32>,
    pub current_active_patients: Option<u32>,
    pub why_profession: String,
    pub why_join: String,
    pub experience: String,
    pub case_study: String,
    pub challenges: String,
    pub health: TherapistHealth,
    pub commitment: TherapistCommitment,
    pub legal: TherapistLegal,
}

/// Row inserted into `therapists`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapistRecord {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub birth_date: Option<String>,
    pub gender: Option<Gender>,
    /// Comma-joined specialization values.
    pub specialization: String,
    pub experience_years: i32,
    pub license_number: Option<String>,
    pub education_details: Option<String>,
    pub social_link: Option<String>,
    pub works_online: bool,
    pub works_in_person: bool,
    pub available_hours_per_week: Option<u32>,
    pub signature_data: String,
    pub status: &'static str,
    pub terms_confirmed: bool,
    pub documents_verified: bool,
    pub questionnaire: TherapistQuestionnaire,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Questionnaire
// ---------------------------------------------------------------------------

pub struct TherapistIntake;

impl Questionnaire for TherapistIntake {
    type Draft = TherapistDraft;
    type Field = TherapistField;
    type Record = TherapistRecord;

    const FORM: FormKind = FormKind::Therapist;

    fn steps() -> &'static [StepDefinition] {
        STEPS
    }

    fn validate_step(
        draft: &TherapistDraft,
        step: usize,
        now: Timestamp,
    ) -> Result<(), ValidationFailure> {
        match step {
            STEP_PROFILE => {
                require_non_blank(&draft.full_name, step, "full_name", "Please enter your full name")?;
                require_non_blank(&draft.phone, step, "phone", "Please enter a phone number")?;
                require_non_blank(&draft.email, step, "email", "Please enter an email address")?;
                require_year(
                    draft.practice_start_year,
                    now.year(),
                    step,
                    "practice_start_year",
                    "Please enter the year you started practicing",
                    "Please enter a valid practice start year",
                )?;
                require_any(
                    &draft.target_population,
                    step,
                    "target_population",
                    "Please choose at least one target population",
                )?;
                require_any(
                    &draft.specialization,
                    step,
                    "specialization",
                    "Please choose at least one area of specialization",
                )
            }
            STEP_MOTIVE => {
                require_non_blank(
                    &draft.q_why,
                    step,
                    "q_why",
                    "Please tell us why you chose this profession",
                )?;
                require_non_blank(
                    &draft.q_join,
                    step,
                    "q_join",
                    "Please tell us why you are joining the project",
                )
            }
            STEP_COMMITMENT => {
                require_selected(
                    &draft.monthly_hours,
                    step,
                    "monthly_hours",
                    "Please choose your monthly hours",
                )?;
                require_selected(
                    &draft.commitment_duration,
                    step,
                    "commitment_duration",
                    "Please choose a commitment period",
                )?;
                require_selected(
                    &draft.therapy_mode,
                    step,
                    "therapy_mode",
                    "Please choose how you work with patients",
                )
            }
            _ => Ok(()),
        }
    }

    fn apply(draft: &mut TherapistDraft, field: TherapistField) {
        use TherapistField as F;
        match field {
            F::FullName(v) => draft.full_name = v,
            F::Phone(v) => draft.phone = v,
            F::Email(v) => draft.email = v,
            F::BirthDate(v) => draft.birth_date = v,
            F::Gender(v) => draft.gender = v,
            F::City(v) => draft.city = v,
            F::TargetPopulation(v) => draft.target_population = dedup(v),
            F::Specialization(v) => draft.specialization = dedup(v),
            F::AcademicDegree(v) => draft.academic_degree = dedup(v),
            F::LicenseNumber(v) => draft.license_number = v,
            F::PracticeStartYear(v) => draft.practice_start_year = v,
            F::TherapyMethods(v) => draft.therapy_methods = dedup(v),
            F::NlpLevel(v) => draft.nlp_level = v,
            F::EducationDetails(v) => draft.education_details = v,
            F::TotalPatients(v) => draft.total_patients = v,
            F::ActivePatients(v) => draft.active_patients = v,
            F::SocialLink(v) => draft.social_link = v,
            F::QWhy(v) => draft.q_why = v,
            F::QJoin(v) => draft.q_join = v,
            F::QExperience(v) => draft.q_experience = v,
            F::QCaseStudy(v) => draft.q_case_study = v,
            F::QChallenges(v) => draft.q_challenges = v,
            F::HasMedical(v) => draft.has_medical = v,
            F::MedicalDetails(v) => draft.medical_details = v,
            F::TakesMeds(v) => draft.takes_meds = v,
            F::InTherapy(v) => draft.in_therapy = v,
            F::MonthlyHours(v) => draft.monthly_hours = v,
            F::CommitmentDuration(v) => draft.commitment_duration = v,
            F::TherapyMode(v) => draft.therapy_mode = v,
        }
    }

    fn consent_items() -> &'static [ConsentItem] {
        CONSENT_ITEMS
    }

    fn scroll_threshold_px() -> f64 {
        20.0
    }

    fn signature_surface() -> SignatureSurface {
        SignatureSurface::new(150, [0xe8, 0xf1, 0xf2, 0xff])
    }

    fn build_record(draft: &TherapistDraft, ctx: RecordContext<'_>) -> TherapistRecord {
        let checked = |id: &str| ctx.consent.is_checked(id).unwrap_or(false);
        let mode = draft.therapy_mode;

        TherapistRecord {
            full_name: draft.full_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            city: draft.city.trim().to_string(),
            birth_date: non_empty(&draft.birth_date),
            gender: draft.gender,
            specialization: draft
                .specialization
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            experience_years: draft.experience_years(ctx.now),
            license_number: non_empty(&draft.license_number),
            education_details: non_empty(&draft.education_details),
            social_link: non_empty(&draft.social_link),
            works_online: mode.is_some_and(TherapyMode::works_online),
            works_in_person: mode.is_some_and(TherapyMode::works_in_person),
            available_hours_per_week: draft.monthly_hours.map(MonthlyHours::weekly_hours),
            signature_data: ctx.signature_data.to_string(),
            status: FormKind::Therapist.initial_status(),
            terms_confirmed: ctx.consent.ensure_satisfied().is_ok(),
            documents_verified: false,
            questionnaire: TherapistQuestionnaire {
                target_population: draft.target_population.clone(),
                specializations: draft.specialization.clone(),
                academic_degrees: draft.academic_degree.clone(),
                therapy_methods: draft.therapy_methods.clone(),
                nlp_level: draft.nlp_level.filter(|_| draft.uses_nlp()),
                practice_start_year: draft.practice_start_year,
                total_patients_estimate: draft.total_patients,
                current_active_patients: draft.active_patients,
                why_profession: draft.q_why.clone(),
                why_join: draft.q_join.clone(),
                experience: draft.q_experience.clone(),
                case_study: draft.q_case_study.clone(),
                challenges: draft.q_challenges.clone(),
                health: TherapistHealth {
                    has_medical_issues: draft.has_medical.is_yes(),
                    medical_issues_details: draft.medical_details.clone(),
                    takes_psychiatric_meds: draft.takes_meds.is_yes(),
                    in_personal_therapy: draft.in_therapy.is_yes(),
                },
                commitment: TherapistCommitment {
                    monthly_hours: draft.monthly_hours,
                    duration: draft.commitment_duration,
                    therapy_mode: draft.therapy_mode,
                },
                legal: TherapistLegal {
                    has_insurance: checked(CONSENT_INSURANCE),
                    accepts_responsibility: checked(CONSENT_RESPONSIBILITY),
                    waiver_confirmed: checked(CONSENT_WAIVER),
                    scrolled_terms: ctx.consent.has_reached_bottom(),
                    signed_at: ctx.now,
                },
            },
        }
    }
}
