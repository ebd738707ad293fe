//! Closed option sets for single and multi-select questions.
//!
//! Wire values match the option values the front end submits, so drafts and
//! records serialize to the same strings the hosted backend already stores.

use serde::{Deserialize, Serialize};

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

choice_enum!(
    #[derive(Default)]
    YesNo {
        Yes => "yes",
        #[default]
        No => "no",
    }
);

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

// ---------------------------------------------------------------------------
// Patient intake
// ---------------------------------------------------------------------------

choice_enum!(MaritalStatus {
    Single => "single",
    Married => "married",
    Divorced => "divorced",
    Widowed => "widowed",
    Relationship => "relationship",
});

choice_enum!(MilitaryService {
    Idf => "idf",
    National => "national",
    Exempt => "exempt",
    None => "none",
});

choice_enum!(SocialNetwork {
    Instagram => "instagram",
    Facebook => "facebook",
    Linkedin => "linkedin",
    Tiktok => "tiktok",
    Other => "other",
});

choice_enum!(
    /// How the patient wants to meet.
    TherapyType {
        Online => "online",
        InPerson => "in_person",
        Both => "both",
    }
);

choice_enum!(
    #[derive(Default)]
    GenderPreference {
        #[default]
        Any => "any",
        Female => "female",
        Male => "male",
    }
);

// ---------------------------------------------------------------------------
// Therapist intake
// ---------------------------------------------------------------------------

choice_enum!(TargetPopulation {
    Soldiers => "soldiers",
    Reservists => "reservists",
    Families => "families",
    Bereaved => "bereaved",
    Youth => "youth",
    General => "general",
});

choice_enum!(Specialization {
    Trauma => "trauma",
    Anxiety => "anxiety",
    Depression => "depression",
    Relationships => "relationships",
    Grief => "grief",
    Stress => "stress",
    SelfEsteem => "self_esteem",
    LifeTransitions => "life_transitions",
});

choice_enum!(AcademicDegree {
    PsychologyBa => "psychology_ba",
    PsychologyMa => "psychology_ma",
    SocialWorkBa => "social_work_ba",
    SocialWorkMa => "social_work_ma",
    ClinicalPsychologist => "clinical_psychologist",
    Psychiatrist => "psychiatrist",
    OtherAcademic => "other_academic",
    NoAcademic => "no_academic",
});

choice_enum!(
    /// Classic, coaching and holistic methods share one set.
    TherapyMethod {
        Cbt => "cbt",
        Psychodynamic => "psychodynamic",
        Emdr => "emdr",
        Dbt => "dbt",
        Gestalt => "gestalt",
        Existential => "existential",
        FamilyTherapy => "family_therapy",
        ArtTherapy => "art_therapy",
        Psychodrama => "psychodrama",
        TraumaFocused => "trauma_focused",
        Coaching => "coaching",
        Nlp => "nlp",
        Mindfulness => "mindfulness",
        Rebirthing => "rebirthing",
        SoundHealing => "sound_healing",
        Somatic => "somatic",
        YogaTherapy => "yoga_therapy",
        OtherHolistic => "other_holistic",
    }
);

choice_enum!(NlpLevel {
    Practitioner => "practitioner",
    Master => "master",
    Trainer => "trainer",
});

choice_enum!(MonthlyHours {
    Ten => "10",
    Fifteen => "15",
    Twenty => "20",
});

impl MonthlyHours {
    pub fn hours(self) -> u32 {
        match self {
            MonthlyHours::Ten => 10,
            MonthlyHours::Fifteen => 15,
            MonthlyHours::Twenty => 20,
        }
    }

    /// Weekly availability derived from the monthly commitment.
    pub fn weekly_hours(self) -> u32 {
        (f64::from(self.hours()) / 4.0).round() as u32
    }
}

choice_enum!(CommitmentDuration {
    SixMonths => "6",
    OneYear => "12",
    TwoYears => "24",
    Unlimited => "unlimited",
});

choice_enum!(TherapyMode {
    Zoom => "zoom",
    Clinic => "clinic",
    Hybrid => "hybrid",
});

impl TherapyMode {
    pub fn works_online(self) -> bool {
        matches!(self, TherapyMode::Zoom | TherapyMode::Hybrid)
    }

    pub fn works_in_person(self) -> bool {
        matches!(self, TherapyMode::Clinic | TherapyMode::Hybrid)
    }
}
