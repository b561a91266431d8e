//! Filter set: the complete set of registry filter values for one cohort query.
//!
//! A [`FilterSet`] always carries a value for every field of the registry vocabulary. Unset
//! fields are empty, never missing, so the serialised object always has all 35 wire keys:
//!
//! ```text
//! { "minAge": "", "maxAge": "", "sex": "", "ptype": "", ... }   single-select mode
//! { "minAge": "", "maxAge": "", "sex": [], "ptype": [], ... }   multi-select mode
//! ```
//!
//! The backend treats an empty value as "no constraint".

use crate::{CohortError, CohortResult};
use registry::{FieldKind, FilterField, AGE_MAX_KEY, AGE_MIN_KEY};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Whether enumerated fields hold one value or a set of values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    Single,
    Multi,
}

/// Age bounds as typed by the user. Either bound may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgeRange {
    pub min: String,
    pub max: String,
}

impl AgeRange {
    pub fn new(min: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty() && self.max.is_empty()
    }
}

/// Value held by one filter field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Range(AgeRange),
    SingleChoice(Option<String>),
    MultiChoice(BTreeSet<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Range(range) => range.is_empty(),
            FieldValue::SingleChoice(value) => value.as_deref().map_or(true, str::is_empty),
            FieldValue::MultiChoice(values) => values.is_empty(),
        }
    }

    /// Selected option values, in a stable order. Empty for ranges.
    pub fn selected(&self) -> Vec<&str> {
        match self {
            FieldValue::Range(_) => Vec::new(),
            FieldValue::SingleChoice(value) => value.as_deref().into_iter().collect(),
            FieldValue::MultiChoice(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Range(_) => "a range",
            FieldValue::SingleChoice(_) => "a single choice",
            FieldValue::MultiChoice(_) => "a multi choice",
        }
    }
}

static EMPTY_RANGE: FieldValue = FieldValue::Range(AgeRange {
    min: String::new(),
    max: String::new(),
});
static EMPTY_SINGLE: FieldValue = FieldValue::SingleChoice(None);
static EMPTY_MULTI: FieldValue = FieldValue::MultiChoice(BTreeSet::new());

/// The full set of filter values submitted to compute or save a cohort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSet {
    mode: SelectionMode,
    values: BTreeMap<FilterField, FieldValue>,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::new(SelectionMode::Single)
    }
}

impl FilterSet {
    /// Creates a filter set with every field present and empty.
    pub fn new(mode: SelectionMode) -> Self {
        let values = FilterField::ALL
            .into_iter()
            .map(|field| (field, Self::empty_value(mode, field).clone()))
            .collect();
        Self { mode, values }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    fn empty_value(mode: SelectionMode, field: FilterField) -> &'static FieldValue {
        match (field.kind(), mode) {
            (FieldKind::Range, _) => &EMPTY_RANGE,
            (FieldKind::Choice, SelectionMode::Single) => &EMPTY_SINGLE,
            (FieldKind::Choice, SelectionMode::Multi) => &EMPTY_MULTI,
        }
    }

    /// Current value of `field`.
    pub fn value(&self, field: FilterField) -> &FieldValue {
        self.values
            .get(&field)
            .unwrap_or_else(|| Self::empty_value(self.mode, field))
    }

    pub fn age(&self) -> &AgeRange {
        static NO_AGE: AgeRange = AgeRange {
            min: String::new(),
            max: String::new(),
        };
        match self.value(FilterField::Age) {
            FieldValue::Range(range) => range,
            _ => &NO_AGE,
        }
    }

    /// True when no field constrains the cohort.
    pub fn is_empty(&self) -> bool {
        FilterField::ALL
            .into_iter()
            .all(|field| self.value(field).is_empty())
    }

    /// Replaces the value of one field.
    ///
    /// The value must match the field's kind and this set's selection mode. Enumerated values
    /// must belong to the field's vocabulary; labels are accepted and stored as the canonical
    /// option value. An empty single choice clears the field.
    ///
    /// # Errors
    ///
    /// - `CohortError::InvalidInput` if the value kind does not fit the field
    /// - `CohortError::Registry` if an option is not in the field's vocabulary
    pub fn set_field(&mut self, field: FilterField, value: FieldValue) -> CohortResult<()> {
        let value = match (field.kind(), self.mode, value) {
            (FieldKind::Range, _, FieldValue::Range(range)) => FieldValue::Range(range),
            (FieldKind::Choice, SelectionMode::Single, FieldValue::SingleChoice(choice)) => {
                let choice = match choice.filter(|c| !c.is_empty()) {
                    Some(c) => Some(field.option(&c)?.value.to_owned()),
                    None => None,
                };
                FieldValue::SingleChoice(choice)
            }
            (FieldKind::Choice, SelectionMode::Multi, FieldValue::MultiChoice(choices)) => {
                let canonical = choices
                    .iter()
                    .map(|c| field.option(c).map(|o| o.value.to_owned()))
                    .collect::<Result<BTreeSet<_>, _>>()?;
                FieldValue::MultiChoice(canonical)
            }
            (_, _, other) => {
                return Err(CohortError::InvalidInput(format!(
                    "filter field '{field}' does not accept {}",
                    other.kind_name()
                )))
            }
        };

        self.values.insert(field, value);
        Ok(())
    }

    /// Adds `option` to a multi-select field, or removes it if already selected.
    ///
    /// Returns `true` if the option is selected afterwards.
    pub fn toggle_option(&mut self, field: FilterField, option: &str) -> CohortResult<bool> {
        if self.mode != SelectionMode::Multi {
            return Err(CohortError::InvalidInput(
                "toggling options requires multi-select mode".into(),
            ));
        }
        if field.kind() != FieldKind::Choice {
            return Err(CohortError::InvalidInput(format!(
                "filter field '{field}' has no options"
            )));
        }

        let canonical = field.option(option)?.value.to_owned();
        let entry = self
            .values
            .entry(field)
            .or_insert_with(|| FieldValue::MultiChoice(BTreeSet::new()));

        match entry {
            FieldValue::MultiChoice(set) => {
                if set.remove(&canonical) {
                    Ok(false)
                } else {
                    set.insert(canonical);
                    Ok(true)
                }
            }
            other => Err(CohortError::InvalidInput(format!(
                "filter field '{field}' holds {}",
                other.kind_name()
            ))),
        }
    }

    /// Selects `option` without ever deselecting: replaces in single mode, adds in multi mode.
    pub fn select(&mut self, field: FilterField, option: &str) -> CohortResult<()> {
        match self.mode {
            SelectionMode::Single => {
                self.set_field(field, FieldValue::SingleChoice(Some(option.to_owned())))
            }
            SelectionMode::Multi => {
                let canonical = field.option(option)?.value;
                if !self.value(field).selected().contains(&canonical) {
                    self.toggle_option(field, canonical)?;
                }
                Ok(())
            }
        }
    }

    /// Resets one field to its empty value.
    pub fn clear(&mut self, field: FilterField) {
        self.values
            .insert(field, Self::empty_value(self.mode, field).clone());
    }

    pub fn set_age(&mut self, min: impl Into<String>, max: impl Into<String>) {
        self.values
            .insert(FilterField::Age, FieldValue::Range(AgeRange::new(min, max)));
    }

    /// Applies one `key=value` pair using wire names.
    ///
    /// `minAge` and `maxAge` set one bound; `age` takes `MIN-MAX` with either side optional;
    /// any other key selects an option (see [`FilterSet::select`]), or clears the field when the
    /// value is empty.
    pub fn apply(&mut self, key: &str, value: &str) -> CohortResult<()> {
        let value = value.trim();
        let age = self.age().clone();
        match key {
            AGE_MIN_KEY => self.set_age(value, age.max),
            AGE_MAX_KEY => self.set_age(age.min, value),
            _ => {
                let field: FilterField = key.parse()?;
                match field.kind() {
                    FieldKind::Range => {
                        let (min, max) = value.split_once('-').ok_or_else(|| {
                            CohortError::InvalidInput(format!(
                                "age expects MIN-MAX (either side may be empty), got '{value}'"
                            ))
                        })?;
                        self.set_age(min.trim(), max.trim());
                    }
                    FieldKind::Choice if value.is_empty() => self.clear(field),
                    FieldKind::Choice => self.select(field, value)?,
                }
            }
        }
        Ok(())
    }

    /// Builds a filter set from a stored wire object without vocabulary checks.
    ///
    /// Saved cohorts may come from any client revision: values can be strings, arrays, numbers
    /// or null, and keys may be missing or unknown. The mode is multi-select if any enumerated
    /// field holds an array.
    pub fn from_wire_map(map: &serde_json::Map<String, Value>) -> Self {
        let multi = map.iter().any(|(key, value)| {
            value.is_array() && key != AGE_MIN_KEY && key != AGE_MAX_KEY
        });
        let mode = if multi {
            SelectionMode::Multi
        } else {
            SelectionMode::Single
        };

        let mut set = Self::new(mode);
        let mut age = AgeRange::default();

        for (key, value) in map {
            match key.as_str() {
                AGE_MIN_KEY => age.min = scalar_text(value),
                AGE_MAX_KEY => age.max = scalar_text(value),
                _ => match FilterField::from_wire(key) {
                    Ok(field) if field.kind() == FieldKind::Choice => {
                        let texts = value_texts(value);
                        let stored = match mode {
                            SelectionMode::Single => {
                                FieldValue::SingleChoice(texts.into_iter().next())
                            }
                            SelectionMode::Multi => {
                                FieldValue::MultiChoice(texts.into_iter().collect())
                            }
                        };
                        set.values.insert(field, stored);
                    }
                    _ => tracing::debug!("ignoring unknown filter key '{}'", key),
                },
            }
        }

        set.values.insert(FilterField::Age, FieldValue::Range(age));
        set
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn value_texts(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect(),
        other => Some(scalar_text(other))
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect(),
    }
}

impl Serialize for FilterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FilterField::ALL.len() + 1))?;
        let age = self.age();
        map.serialize_entry(AGE_MIN_KEY, &age.min)?;
        map.serialize_entry(AGE_MAX_KEY, &age.max)?;

        for field in FilterField::choices() {
            match self.value(field) {
                FieldValue::SingleChoice(value) => {
                    map.serialize_entry(field.wire_name(), value.as_deref().unwrap_or(""))?
                }
                FieldValue::MultiChoice(values) => {
                    map.serialize_entry(field.wire_name(), values)?
                }
                FieldValue::Range(_) => map.serialize_entry(field.wire_name(), "")?,
            }
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_wire_map(&map))
    }
}

/// Number of fields that constrain the cohort. The age range counts once however many bounds
/// are set.
pub fn active_filter_count(filters: &FilterSet) -> usize {
    FilterField::ALL
        .into_iter()
        .filter(|field| !filters.value(*field).is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry::RegistryError;
    use serde_json::json;

    #[test]
    fn default_single_serialises_every_key_as_empty_string() {
        let value = serde_json::to_value(FilterSet::default()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 35);
        assert_eq!(object.get("minAge"), Some(&json!("")));
        assert_eq!(object.get("maxAge"), Some(&json!("")));
        for field in FilterField::choices() {
            assert_eq!(
                object.get(field.wire_name()),
                Some(&json!("")),
                "{field} should serialise as an empty string"
            );
        }
    }

    #[test]
    fn default_multi_serialises_choices_as_empty_arrays() {
        let value = serde_json::to_value(FilterSet::new(SelectionMode::Multi)).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 35);
        assert_eq!(object.get("minAge"), Some(&json!("")));
        for field in FilterField::choices() {
            assert_eq!(object.get(field.wire_name()), Some(&json!([])));
        }
    }

    #[test]
    fn serialised_keys_follow_form_order() {
        let value = serde_json::to_value(FilterSet::default()).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(&keys[..4], &["minAge", "maxAge", "sex", "ptype"]);
        assert_eq!(keys.last(), Some(&"fop2"));
    }

    #[test]
    fn set_field_canonicalises_labels() {
        let mut filters = FilterSet::default();
        filters
            .set_field(
                FilterField::UsualResidence,
                FieldValue::SingleChoice(Some("RACF".into())),
            )
            .unwrap();

        assert_eq!(
            filters.value(FilterField::UsualResidence),
            &FieldValue::SingleChoice(Some("Residential aged care facility".into()))
        );
    }

    #[test]
    fn set_field_rejects_wrong_kind() {
        let mut filters = FilterSet::default();
        let err = filters
            .set_field(FilterField::Sex, FieldValue::MultiChoice(BTreeSet::new()))
            .unwrap_err();
        assert!(matches!(err, CohortError::InvalidInput(_)));

        let err = filters
            .set_field(FilterField::Age, FieldValue::SingleChoice(Some("65".into())))
            .unwrap_err();
        assert!(matches!(err, CohortError::InvalidInput(_)));
    }

    #[test]
    fn set_field_rejects_unknown_option() {
        let mut filters = FilterSet::default();
        let err = filters
            .set_field(FilterField::Sex, FieldValue::SingleChoice(Some("Robot".into())))
            .unwrap_err();
        assert!(matches!(
            err,
            CohortError::Registry(RegistryError::UnknownOption { .. })
        ));
        assert!(filters.value(FilterField::Sex).is_empty());
    }

    #[test]
    fn empty_single_choice_clears_field() {
        let mut filters = FilterSet::default();
        filters.select(FilterField::Sex, "Female").unwrap();
        filters
            .set_field(FilterField::Sex, FieldValue::SingleChoice(Some(String::new())))
            .unwrap();
        assert!(filters.value(FilterField::Sex).is_empty());
    }

    #[test]
    fn toggle_option_adds_then_removes() {
        let mut filters = FilterSet::new(SelectionMode::Multi);

        assert!(filters.toggle_option(FilterField::Sex, "Male").unwrap());
        assert!(filters.toggle_option(FilterField::Sex, "Female").unwrap());
        assert_eq!(
            filters.value(FilterField::Sex).selected(),
            vec!["Female", "Male"]
        );

        assert!(!filters.toggle_option(FilterField::Sex, "Male").unwrap());
        assert_eq!(filters.value(FilterField::Sex).selected(), vec!["Female"]);

        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["sex"], json!(["Female"]));
    }

    #[test]
    fn toggle_option_requires_multi_mode() {
        let mut filters = FilterSet::default();
        let err = filters.toggle_option(FilterField::Sex, "Male").unwrap_err();
        assert!(matches!(err, CohortError::InvalidInput(_)));
    }

    #[test]
    fn select_in_multi_mode_never_deselects() {
        let mut filters = FilterSet::new(SelectionMode::Multi);
        filters.select(FilterField::Ward, "Outlying ward").unwrap();
        filters.select(FilterField::Ward, "Outlier ward").unwrap();
        assert_eq!(
            filters.value(FilterField::Ward).selected(),
            vec!["Outlying ward"]
        );
    }

    #[test]
    fn apply_handles_age_keys() {
        let mut filters = FilterSet::default();
        filters.apply("minAge", "65").unwrap();
        assert_eq!(filters.age(), &AgeRange::new("65", ""));

        filters.apply("maxAge", "90").unwrap();
        assert_eq!(filters.age(), &AgeRange::new("65", "90"));

        filters.apply("age", "-85").unwrap();
        assert_eq!(filters.age(), &AgeRange::new("", "85"));

        assert!(filters.apply("age", "85").is_err());
    }

    #[test]
    fn apply_with_empty_value_clears_field() {
        let mut filters = FilterSet::new(SelectionMode::Multi);
        filters.apply("sex", "Male").unwrap();
        filters.apply("sex", "Female").unwrap();
        assert_eq!(filters.value(FilterField::Sex).selected().len(), 2);

        filters.apply("sex", " ").unwrap();

        assert_eq!(
            filters.value(FilterField::Sex),
            &FieldValue::MultiChoice(BTreeSet::new())
        );
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut filters = FilterSet::default();
        let err = filters.apply("bloodtype", "O").unwrap_err();
        assert!(matches!(
            err,
            CohortError::Registry(RegistryError::UnknownField(_))
        ));
    }

    #[test]
    fn active_filter_count_counts_age_once() {
        let mut filters = FilterSet::default();
        assert_eq!(active_filter_count(&filters), 0);

        filters.set_age("65", "");
        assert_eq!(active_filter_count(&filters), 1);

        filters.set_age("65", "90");
        assert_eq!(active_filter_count(&filters), 1);

        filters.select(FilterField::Sex, "Female").unwrap();
        filters.select(FilterField::Frailty, "Mildly frail").unwrap();
        assert_eq!(active_filter_count(&filters), 3);
    }

    #[test]
    fn active_filter_count_ignores_empty_sets() {
        let mut filters = FilterSet::new(SelectionMode::Multi);
        filters.toggle_option(FilterField::Asa, "ASA 2").unwrap();
        filters.toggle_option(FilterField::Asa, "ASA 3").unwrap();
        filters.toggle_option(FilterField::Sex, "Male").unwrap();
        filters.toggle_option(FilterField::Sex, "Male").unwrap();

        assert_eq!(active_filter_count(&filters), 1);
    }

    #[test]
    fn deserialise_stored_single_select_filters() {
        let filters: FilterSet = serde_json::from_value(json!({
            "minAge": 70,
            "maxAge": "",
            "sex": "Female",
            "walk": "",
            "legacy_field": "x"
        }))
        .unwrap();

        assert_eq!(filters.mode(), SelectionMode::Single);
        assert_eq!(filters.age(), &AgeRange::new("70", ""));
        assert_eq!(filters.value(FilterField::Sex).selected(), vec!["Female"]);
        assert!(filters.value(FilterField::Walk).is_empty());
        assert!(filters.value(FilterField::Reoperation).is_empty());
        assert_eq!(active_filter_count(&filters), 2);
    }

    #[test]
    fn deserialise_stored_multi_select_filters() {
        let filters: FilterSet = serde_json::from_value(json!({
            "minAge": "",
            "maxAge": "",
            "sex": ["Male", "Female"],
            "ward": "Outlying ward",
            "asa": null
        }))
        .unwrap();

        assert_eq!(filters.mode(), SelectionMode::Multi);
        assert_eq!(
            filters.value(FilterField::Sex).selected(),
            vec!["Female", "Male"]
        );
        assert_eq!(
            filters.value(FilterField::Ward).selected(),
            vec!["Outlying ward"]
        );
        assert!(filters.value(FilterField::Asa).is_empty());
        assert_eq!(active_filter_count(&filters), 2);
    }
}
