//! Clinical sections used to group filter fields.

use crate::field::FilterField;

/// Clinical section of the filter form.
///
/// Declaration order is the numbering order of the registry dataset, which differs from the
/// order the cohort builder form shows them in; [`FilterField::ALL`] keeps the form order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Demographics,
    EdPresentation,
    PreFractureStatus,
    FractureCharacteristics,
    SurgicalPathway,
    PostOperativeCare,
    BoneHealth,
    Nutrition,
    DischargeOutcomes,
    FollowUpOutcomes,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::Demographics,
        Section::EdPresentation,
        Section::PreFractureStatus,
        Section::FractureCharacteristics,
        Section::SurgicalPathway,
        Section::PostOperativeCare,
        Section::BoneHealth,
        Section::Nutrition,
        Section::DischargeOutcomes,
        Section::FollowUpOutcomes,
    ];

    /// Registry section number (1-based).
    pub fn number(self) -> u8 {
        match self {
            Section::Demographics => 1,
            Section::EdPresentation => 2,
            Section::PreFractureStatus => 3,
            Section::FractureCharacteristics => 4,
            Section::SurgicalPathway => 5,
            Section::PostOperativeCare => 6,
            Section::BoneHealth => 7,
            Section::Nutrition => 8,
            Section::DischargeOutcomes => 9,
            Section::FollowUpOutcomes => 10,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Demographics => "Demographics",
            Section::EdPresentation => "Presentation to ED",
            Section::PreFractureStatus => "Pre-fracture Functional Status",
            Section::FractureCharacteristics => "Fracture Characteristics",
            Section::SurgicalPathway => "Surgical Pathway",
            Section::PostOperativeCare => "Post-operative Care",
            Section::BoneHealth => "Bone Health & Medications",
            Section::Nutrition => "Nutrition",
            Section::DischargeOutcomes => "Discharge Outcomes",
            Section::FollowUpOutcomes => "120-Day Follow-Up",
        }
    }

    /// Fields belonging to this section, in form order.
    pub fn fields(self) -> impl Iterator<Item = FilterField> {
        FilterField::ALL
            .into_iter()
            .filter(move |field| field.section() == self)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {}", self.number(), self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_section_has_fields() {
        for section in Section::ALL {
            assert!(
                section.fields().next().is_some(),
                "section {section} should contain at least one field"
            );
        }
    }

    #[test]
    fn sections_partition_the_vocabulary() {
        let total: usize = Section::ALL.iter().map(|s| s.fields().count()).sum();
        assert_eq!(total, FilterField::ALL.len());
    }

    #[test]
    fn display_includes_number() {
        assert_eq!(Section::FollowUpOutcomes.to_string(), "10. 120-Day Follow-Up");
    }
}
