//! Filter fields and their closed option lists.
//!
//! Option values are the exact strings recorded in the registry dataset; labels are the short
//! forms shown to users.

use crate::section::Section;
use crate::{RegistryError, RegistryResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire key of the lower age bound.
pub const AGE_MIN_KEY: &str = "minAge";
/// Wire key of the upper age bound.
pub const AGE_MAX_KEY: &str = "maxAge";

/// An enumerated value a choice field accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Value sent to the backend.
    pub value: &'static str,
    /// Short display label.
    pub label: &'static str,
}

const fn opt(value: &'static str, label: &'static str) -> ChoiceOption {
    ChoiceOption { value, label }
}

/// Shape of the value a field holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Two free numeric bounds (`minAge`/`maxAge` on the wire).
    Range,
    /// A value drawn from [`FilterField::options`].
    Choice,
}

/// A filterable registry field.
///
/// `Age` is a single logical field carried as two wire keys; every other field maps to exactly
/// one wire key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterField {
    Age,
    Sex,
    PatientType,
    UsualResidence,
    Walk,
    Cognition,
    Frailty,
    AdlDeliriumRisk,
    FractureType,
    AtypicalFracture,
    Asa,
    EdAdmit,
    PainAssessment,
    PainManagement,
    NerveBlock,
    Surgery,
    SurgicalDelay,
    Anaesthesia,
    WeightBearing,
    Ward,
    GeriatricAssessment,
    DeliriumAssessment,
    FallsAssessment,
    PressureUlcers,
    MobilisedDayOne,
    BoneMedAdmission,
    BoneMedDischarge,
    Malnutrition,
    OralSupplements,
    DischargeDestination,
    DischargeWalk,
    FollowUpResidence,
    FollowUpBoneMed,
    Reoperation,
}

impl FilterField {
    /// Every field, in the order the form presents them.
    pub const ALL: [FilterField; 34] = [
        FilterField::Age,
        FilterField::Sex,
        FilterField::PatientType,
        FilterField::UsualResidence,
        FilterField::Walk,
        FilterField::Cognition,
        FilterField::Frailty,
        FilterField::AdlDeliriumRisk,
        FilterField::FractureType,
        FilterField::AtypicalFracture,
        FilterField::Asa,
        FilterField::EdAdmit,
        FilterField::PainAssessment,
        FilterField::PainManagement,
        FilterField::NerveBlock,
        FilterField::Surgery,
        FilterField::SurgicalDelay,
        FilterField::Anaesthesia,
        FilterField::WeightBearing,
        FilterField::Ward,
        FilterField::GeriatricAssessment,
        FilterField::DeliriumAssessment,
        FilterField::FallsAssessment,
        FilterField::PressureUlcers,
        FilterField::MobilisedDayOne,
        FilterField::BoneMedAdmission,
        FilterField::BoneMedDischarge,
        FilterField::Malnutrition,
        FilterField::OralSupplements,
        FilterField::DischargeDestination,
        FilterField::DischargeWalk,
        FilterField::FollowUpResidence,
        FilterField::FollowUpBoneMed,
        FilterField::Reoperation,
    ];

    /// Enumerated fields only (everything except `Age`).
    pub fn choices() -> impl Iterator<Item = FilterField> {
        Self::ALL
            .into_iter()
            .filter(|field| field.kind() == FieldKind::Choice)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FilterField::Age => FieldKind::Range,
            _ => FieldKind::Choice,
        }
    }

    /// Wire key of the field. For `Age` this is a logical name; the wire uses
    /// [`AGE_MIN_KEY`] and [`AGE_MAX_KEY`].
    pub fn wire_name(self) -> &'static str {
        match self {
            FilterField::Age => "age",
            FilterField::Sex => "sex",
            FilterField::PatientType => "ptype",
            FilterField::UsualResidence => "uresidence",
            FilterField::Walk => "walk",
            FilterField::Cognition => "cogstat",
            FilterField::Frailty => "frailty",
            FilterField::AdlDeliriumRisk => "addelassess",
            FilterField::FractureType => "ftype",
            FilterField::AtypicalFracture => "afracture",
            FilterField::Asa => "asa",
            FilterField::EdAdmit => "e_dadmit",
            FilterField::PainAssessment => "painassess",
            FilterField::PainManagement => "painmanage",
            FilterField::NerveBlock => "analges",
            FilterField::Surgery => "surg",
            FilterField::SurgicalDelay => "delay",
            FilterField::Anaesthesia => "anaesth",
            FilterField::WeightBearing => "wbear",
            FilterField::Ward => "ward",
            FilterField::GeriatricAssessment => "gerimed",
            FilterField::DeliriumAssessment => "delassess",
            FilterField::FallsAssessment => "fassess",
            FilterField::PressureUlcers => "pulcers",
            FilterField::MobilisedDayOne => "mobil",
            FilterField::BoneMedAdmission => "bonemed",
            FilterField::BoneMedDischarge => "dbonemed1",
            FilterField::Malnutrition => "malnutrition",
            FilterField::OralSupplements => "ons",
            FilterField::DischargeDestination => "wdest",
            FilterField::DischargeWalk => "fwalk2",
            FilterField::FollowUpResidence => "dresidence",
            FilterField::FollowUpBoneMed => "fbonemed2",
            FilterField::Reoperation => "fop2",
        }
    }

    /// Look a field up by wire key. `minAge`, `maxAge` and `age` all resolve to `Age`.
    pub fn from_wire(name: &str) -> RegistryResult<Self> {
        if name == AGE_MIN_KEY || name == AGE_MAX_KEY {
            return Ok(FilterField::Age);
        }
        Self::ALL
            .into_iter()
            .find(|field| field.wire_name() == name)
            .ok_or_else(|| RegistryError::UnknownField(name.to_owned()))
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterField::Age => "Age Range",
            FilterField::Sex => "Sex",
            FilterField::PatientType => "Patient Type",
            FilterField::UsualResidence => "Usual Residence",
            FilterField::Walk => "Mobility Ability",
            FilterField::Cognition => "Cognition",
            FilterField::Frailty => "Frailty",
            FilterField::AdlDeliriumRisk => "ADL Risk/Delirium Risk",
            FilterField::FractureType => "Fracture Type",
            FilterField::AtypicalFracture => "Atypical/Pathological",
            FilterField::Asa => "ASA Score",
            FilterField::EdAdmit => "Arrived via ED",
            FilterField::PainAssessment => "Pain Assessment",
            FilterField::PainManagement => "Analgesia Management",
            FilterField::NerveBlock => "Nerve Block",
            FilterField::Surgery => "Surgery Performed",
            FilterField::SurgicalDelay => "Surgical Delay",
            FilterField::Anaesthesia => "Anaesthesia Type",
            FilterField::WeightBearing => "Weight-bearing Post-op",
            FilterField::Ward => "Ward Type",
            FilterField::GeriatricAssessment => "Geriatric Assessment",
            FilterField::DeliriumAssessment => "Delirium Assessment",
            FilterField::FallsAssessment => "Falls Assessment",
            FilterField::PressureUlcers => "Pressure Ulcers",
            FilterField::MobilisedDayOne => "Mobilised Day 1",
            FilterField::BoneMedAdmission => "Bone Protection on Admission",
            FilterField::BoneMedDischarge => "Bone Protection at Discharge",
            FilterField::Malnutrition => "Malnutrition Assessment",
            FilterField::OralSupplements => "Oral Nutritional Supplements",
            FilterField::DischargeDestination => "Discharge Destination",
            FilterField::DischargeWalk => "Discharge Mobility",
            FilterField::FollowUpResidence => "Residence at Follow-up",
            FilterField::FollowUpBoneMed => "Bone Medication at Follow-up",
            FilterField::Reoperation => "Reoperation",
        }
    }

    pub fn section(self) -> Section {
        use FilterField::*;
        match self {
            Age | Sex | PatientType | UsualResidence => Section::Demographics,
            EdAdmit | PainAssessment | PainManagement | NerveBlock => Section::EdPresentation,
            Walk | Cognition | Frailty | AdlDeliriumRisk => Section::PreFractureStatus,
            FractureType | AtypicalFracture | Asa => Section::FractureCharacteristics,
            Surgery | SurgicalDelay | Anaesthesia | WeightBearing => Section::SurgicalPathway,
            Ward | GeriatricAssessment | DeliriumAssessment | FallsAssessment | PressureUlcers
            | MobilisedDayOne => Section::PostOperativeCare,
            BoneMedAdmission | BoneMedDischarge => Section::BoneHealth,
            Malnutrition | OralSupplements => Section::Nutrition,
            DischargeDestination | DischargeWalk => Section::DischargeOutcomes,
            FollowUpResidence | FollowUpBoneMed | Reoperation => Section::FollowUpOutcomes,
        }
    }

    /// Accepted values, in display order. Empty for `Age`.
    pub fn options(self) -> &'static [ChoiceOption] {
        match self {
            FilterField::Age => &[],
            FilterField::Sex => SEX,
            FilterField::PatientType => PATIENT_TYPE,
            FilterField::UsualResidence => USUAL_RESIDENCE,
            FilterField::Walk => WALK,
            FilterField::Cognition => COGNITION,
            FilterField::Frailty => FRAILTY,
            FilterField::AdlDeliriumRisk => ASSESSED,
            FilterField::FractureType => FRACTURE_TYPE,
            FilterField::AtypicalFracture => ATYPICAL_FRACTURE,
            FilterField::Asa => ASA,
            FilterField::EdAdmit => ED_ADMIT,
            FilterField::PainAssessment => PAIN_ASSESSMENT,
            FilterField::PainManagement => PAIN_MANAGEMENT,
            FilterField::NerveBlock => NERVE_BLOCK,
            FilterField::Surgery => SURGERY,
            FilterField::SurgicalDelay => SURGICAL_DELAY,
            FilterField::Anaesthesia => ANAESTHESIA,
            FilterField::WeightBearing => WEIGHT_BEARING,
            FilterField::Ward => WARD,
            FilterField::GeriatricAssessment => GERIATRIC_ASSESSMENT,
            FilterField::DeliriumAssessment => ASSESSED,
            FilterField::FallsAssessment => FALLS_ASSESSMENT,
            FilterField::PressureUlcers => NO_YES,
            FilterField::MobilisedDayOne => MOBILISED,
            FilterField::BoneMedAdmission => BONE_MED,
            FilterField::BoneMedDischarge => BONE_MED_DISCHARGE,
            FilterField::Malnutrition => MALNUTRITION,
            FilterField::OralSupplements => NO_YES,
            FilterField::DischargeDestination => DISCHARGE_DESTINATION,
            FilterField::DischargeWalk => DISCHARGE_WALK,
            FilterField::FollowUpResidence => FOLLOW_UP_RESIDENCE,
            FilterField::FollowUpBoneMed => BONE_MED_FOLLOW_UP,
            FilterField::Reoperation => REOPERATION,
        }
    }

    /// Resolve `value` against the option list, returning the canonical option.
    ///
    /// Matching is exact on the option value, then case-insensitive on the label.
    pub fn option(self, value: &str) -> RegistryResult<&'static ChoiceOption> {
        let options = self.options();
        options
            .iter()
            .find(|o| o.value == value)
            .or_else(|| options.iter().find(|o| o.label.eq_ignore_ascii_case(value)))
            .ok_or_else(|| RegistryError::UnknownOption {
                field: self.wire_name(),
                option: value.to_owned(),
            })
    }
}

impl std::fmt::Display for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for FilterField {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s)
    }
}

impl Serialize for FilterField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for FilterField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_wire(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// OPTION LISTS
// ============================================================================

const NO_YES: &[ChoiceOption] = &[opt("No", "No"), opt("Yes", "Yes")];

const ASSESSED: &[ChoiceOption] = &[
    opt("Not assessed", "Not assessed"),
    opt("Assessed and not identified", "Assessed & not identified"),
    opt("Assessed and identified", "Assessed & identified"),
];

const SEX: &[ChoiceOption] = &[
    opt("Male", "Male"),
    opt("Female", "Female"),
    opt("Intersex or indeterminate", "Intersex or indeterminate"),
];

const PATIENT_TYPE: &[ChoiceOption] = &[
    opt("Public", "Public"),
    opt("Private", "Private"),
    opt("Overseas", "Overseas"),
];

const USUAL_RESIDENCE: &[ChoiceOption] = &[
    opt("Private residence", "Private residence"),
    opt("Residential aged care facility", "RACF"),
    opt("Other", "Other"),
];

const WALK: &[ChoiceOption] = &[
    opt("Walks without walking aids", "Walks unaided"),
    opt("Walks with either a stick or crutch", "Walks with 1 aid"),
    opt("Walks with two aids or frame", "Walks with 2 aids/frame"),
    opt("Uses a wheelchair / bed bound", "Wheelchair/bedbound"),
];

const COGNITION: &[ChoiceOption] = &[
    opt("Normal cognition", "Normal cognition"),
    opt("Impaired cognition or known dementia", "Impaired/dementia"),
];

const FRAILTY: &[ChoiceOption] = &[
    opt("Very Fit", "Very Fit"),
    opt("Well", "Well"),
    opt(
        "Well, with treated comorbid disease",
        "Well, with treated comorbid disease",
    ),
    opt("Vulnerable", "Vulnerable"),
    opt("Mildly frail", "Mildly frail"),
    opt("Moderately frail", "Moderately frail"),
    opt("Severely frail", "Severely frail"),
    opt("Very severely frail", "Very severely frail"),
    opt("Terminally ill", "Terminally ill"),
    opt(
        "Frailty assessment using other validated tool",
        "Other tool",
    ),
];

const FRACTURE_TYPE: &[ChoiceOption] = &[
    opt(
        "Intracapsular undisplaced/impacted displaced",
        "Intracapsular undisplaced",
    ),
    opt("Intracapsular displaced", "Intracapsular displaced"),
    opt("Per/intertrochanteric", "Inter/pertrochanteric"),
    opt("Subtrochanteric", "Subtrochanteric"),
];

const ATYPICAL_FRACTURE: &[ChoiceOption] = &[
    opt("Not pathological or atypical fracture", "Neither"),
    opt("Pathological fracture", "Pathological"),
    opt("Atypical fracture", "Atypical"),
];

const ASA: &[ChoiceOption] = &[
    opt("Healthy individual with no systemic disease", "ASA 1"),
    opt("Mild systemic disease not limiting activity", "ASA 2"),
    opt(
        "Severe systemic disease that limits activity but is not incapacitating",
        "ASA 3",
    ),
    opt(
        "Incapacitating systemic disease constantly life threatening",
        "ASA 4",
    ),
    opt("Moribund not expected to survive 24 hours", "ASA 5"),
];

const ED_ADMIT: &[ChoiceOption] = &[
    opt("Yes", "Yes"),
    opt(
        "No - transferred from another hospital (via ED)",
        "No - transferred (via ED)",
    ),
    opt("No - in-patient fall", "No - in-patient fall"),
    opt(
        "No - transferred from another hospital (direct to ward)",
        "No - direct to ward",
    ),
];

const PAIN_ASSESSMENT: &[ChoiceOption] = &[
    opt("Within 30 minutes of ED presentation", "Within 30 min"),
    opt("Greater than 30 minutes of ED presentation", ">30 min"),
    opt(
        "Pain assessment not documented or not done",
        "Not done/documented",
    ),
];

const PAIN_MANAGEMENT: &[ChoiceOption] = &[
    opt("Given within 30 minutes of ED presentation", "Within 30 min"),
    opt("Given more than 30 minutes after ED presentation", ">30 min"),
    opt(
        "Not required \u{2013} already provided by paramedics",
        "Pre-hospital",
    ),
    opt(
        "Not required \u{2013} no pain documented on assessment",
        "Not required",
    ),
];

const NERVE_BLOCK: &[ChoiceOption] = &[
    opt("Nerve block before OT", "Before OT"),
    opt("Nerve block in OT", "In OT"),
    opt("Both", "Both"),
    opt("Neither", "Neither"),
];

const SURGERY: &[ChoiceOption] = &[
    opt("Yes", "Yes"),
    opt("No", "No"),
    opt(
        "No \u{2013} surgical fixation not clinically indicated",
        "Not indicated",
    ),
    opt("No \u{2013} patient for palliation", "Palliation"),
    opt("No \u{2013} other reason", "Other reason"),
];

const SURGICAL_DELAY: &[ChoiceOption] = &[
    opt("No delay, surgery completed <48 hours", "<48h (No delay)"),
    opt("Delay: patient medically unfit", "Medically unfit"),
    opt("Delay: anticoagulation issues", "Anticoagulation"),
    opt("Delay: theatre availability", "Theatre unavailable"),
    opt("Delay: surgeon availability", "Surgeon unavailable"),
    opt("Delay: delayed diagnosis of hip fracture", "Late diagnosis"),
    opt("Other (state reason)", "Other"),
];

const ANAESTHESIA: &[ChoiceOption] = &[
    opt("General anaesthesia", "General"),
    opt("Spinal anaesthesia", "Spinal"),
    opt("General and spinal anaesthesia", "General + Spinal"),
    opt("Spinal / regional anaesthesia", "Spinal/regional"),
    opt(
        "General and spinal/regional anaesthesia",
        "General + Spinal/regional",
    ),
    opt("Other", "Other"),
];

const WEIGHT_BEARING: &[ChoiceOption] = &[
    opt("Unrestricted weight bearing", "Unrestricted"),
    opt(
        "Restricted / non weight bearing",
        "Restricted/non-weight bearing",
    ),
];

const WARD: &[ChoiceOption] = &[
    opt(
        "Hip fracture unit/Orthopaedic ward/preferred ward",
        "Preferred ortho ward",
    ),
    opt("Outlying ward", "Outlier ward"),
    opt("HDU / ICU / CCU", "HDU/ICU/CCU"),
];

const GERIATRIC_ASSESSMENT: &[ChoiceOption] = &[
    opt("Yes", "Yes"),
    opt("No", "No"),
    opt(
        "No geriatric medicine service available",
        "No service available",
    ),
    opt("Not known", "Unknown"),
];

const FALLS_ASSESSMENT: &[ChoiceOption] = &[
    opt("Performed during admission", "Performed"),
    opt("No", "Not performed"),
    opt("Awaits falls clinic assessment", "Awaiting clinic"),
    opt("Not relevant", "Not relevant"),
    opt("Further intervention not appropriate", "Not appropriate"),
];

const MOBILISED: &[ChoiceOption] = &[
    opt(
        "Mobilised day 1 (opportunity given)",
        "Yes (opportunity given)",
    ),
    opt("Not mobilised day 1", "Not mobilised"),
];

const BONE_MED: &[ChoiceOption] = &[
    opt("No bone protection medication", "No"),
    opt("Calcium and/or vitamin D only", "Calcium/Vitamin D"),
    opt(
        "Bisphosphonates/denosumab/romosozumab/teriparitide/raloxifene/HRT",
        "Anti-resorptives/anabolics",
    ),
];

const BONE_MED_FOLLOW_UP: &[ChoiceOption] = &[
    opt("No bone protection medication", "No"),
    opt("Calcium and/or vitamin D only", "Calcium/Vit D"),
    opt(
        "Bisphosphonates/denosumab/romosozumab/teriparitide/raloxifene/HRT",
        "Anti-resorptives/anabolics",
    ),
];

const BONE_MED_DISCHARGE: &[ChoiceOption] = &[
    opt("No bone protection medication", "No"),
    opt(
        "Yes - Calcium and/or vitamin D only",
        "Yes - Calcium/Vit D",
    ),
    opt(
        "Yes - Bisphosphonates/denosumab/romosozumab/teriparitide/raloxifene/HRT",
        "Yes - Anti-resorptives",
    ),
    opt(
        "No but received prescription at separation from hospital",
        "Prescribed at discharge",
    ),
];

const MALNUTRITION: &[ChoiceOption] = &[
    opt("Not done", "Not done"),
    opt("Malnourished", "Malnourished"),
    opt("Not malnourished", "Not malnourished"),
];

const DISCHARGE_DESTINATION: &[ChoiceOption] = &[
    opt("Private residence", "Private residence"),
    opt("Residential aged care facility", "RACF"),
    opt("Rehabilitation unit public", "Public rehab"),
    opt("Rehabilitation unit private", "Private rehab"),
    opt("Other hospital / ward / specialty", "Other hospital"),
    opt("Deceased", "Deceased"),
    opt(
        "Short term care in residential care facility (NZ only)",
        "Short-term care",
    ),
    opt("Other", "Other"),
];

const DISCHARGE_WALK: &[ChoiceOption] = &[
    opt("Walks without walking aids", "Walks unaided"),
    opt("Walks with either a stick or crutch", "1 aid"),
    opt("Walks with two aids or frame", "2 aids/frame"),
    opt("Uses a wheelchair / bed bound", "Wheelchair/bedbound"),
    opt("Not relevant", "Not relevant"),
];

const FOLLOW_UP_RESIDENCE: &[ChoiceOption] = &[
    opt("Private residence", "Home"),
    opt("Residential aged care facility", "RACF"),
    opt("Deceased", "Deceased"),
    opt("Other", "Other"),
];

const REOPERATION: &[ChoiceOption] = &[
    opt("No reoperation", "No reoperation"),
    opt("Reduction of dislocated prosthesis", "Dislocation"),
    opt("Washout or debridement", "Washout"),
    opt("Implant removal", "Implant removal"),
    opt("Revision of internal fixation", "Revision"),
    opt("Conversion to hemiarthroplasty", "Conversion to hemi"),
    opt("Conversion to total hip replacement", "Conversion to THR"),
    opt("Excision arthroplasty", "Excision arthroplasty"),
    opt("Periprosthetic fracture", "Periprosthetic fracture"),
    opt("Revision arthroplasty", "Revision arthroplasty"),
    opt("Not relevant", "Not relevant"),
];
