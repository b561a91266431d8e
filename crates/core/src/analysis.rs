//! Cohort analysis results.
//!
//! The backend renders every chart itself and returns them as image data URIs. This module
//! holds the response model, the chart catalogue and the local "which charts are visible"
//! selection. Nothing here computes statistics.

use crate::{CohortError, CohortResult};
use base64::{engine::general_purpose, Engine as _};
use cohort_types::CohortId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ============================================================================
// CHART CATALOGUE
// ============================================================================

/// A chart the analyse endpoint can return, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartKind {
    Mortality,
    Walking,
    Fracture,
    Residence,
    Transition,
    Timelines,
    Surgery,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::Mortality,
        ChartKind::Walking,
        ChartKind::Fracture,
        ChartKind::Residence,
        ChartKind::Transition,
        ChartKind::Timelines,
        ChartKind::Surgery,
    ];

    /// Selector id used by front ends.
    pub fn id(self) -> &'static str {
        match self {
            ChartKind::Mortality => "mortality",
            ChartKind::Walking => "walking",
            ChartKind::Fracture => "fracture",
            ChartKind::Residence => "residence",
            ChartKind::Transition => "transition",
            ChartKind::Timelines => "timelines",
            ChartKind::Surgery => "surgery",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Mortality => "Mortality Status Across Time Frames",
            ChartKind::Walking => "Walking Ability After 120 Days",
            ChartKind::Fracture => "Fracture Classification",
            ChartKind::Residence => "Pre-Admission Residence Status",
            ChartKind::Transition => "Residence Transitions: Admissions to Discharge",
            ChartKind::Timelines => "Average Length of Stay",
            ChartKind::Surgery => "Time to Surgery Distribution",
        }
    }

    /// Key of the chart in the analyse response.
    pub fn response_key(self) -> &'static str {
        match self {
            ChartKind::Mortality => "mortality_chart",
            ChartKind::Walking => "fwalk2_chart",
            ChartKind::Fracture => "afracture_chart",
            ChartKind::Residence => "residence_chart",
            ChartKind::Transition => "residence_transition_chart",
            ChartKind::Timelines => "timelines_chart",
            ChartKind::Surgery => "time_to_surgery_chart",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Which charts of the current analysis are shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChartSelection {
    #[default]
    All,
    Only(ChartKind),
}

impl ChartSelection {
    pub fn shows(self, kind: ChartKind) -> bool {
        match self {
            ChartSelection::All => true,
            ChartSelection::Only(only) => only == kind,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChartSelection::All => "Show All Charts",
            ChartSelection::Only(kind) => kind.title(),
        }
    }
}

impl std::str::FromStr for ChartSelection {
    type Err = CohortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(ChartSelection::All);
        }
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(s))
            .map(ChartSelection::Only)
            .ok_or_else(|| CohortError::InvalidInput(format!("unknown chart '{s}'")))
    }
}

// ============================================================================
// CHART IMAGES
// ============================================================================

/// A rendered chart as sent by the backend (`data:<mime>;base64,<payload>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartImage(String);

impl ChartImage {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The raw URI, usable directly as an image source.
    pub fn as_uri(&self) -> &str {
        &self.0
    }

    fn split(&self) -> CohortResult<(&str, &str)> {
        let rest = self
            .0
            .strip_prefix("data:")
            .ok_or_else(|| CohortError::InvalidChart(self.preview()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CohortError::InvalidChart(self.preview()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| CohortError::InvalidChart(self.preview()))?;
        Ok((mime, payload))
    }

    fn preview(&self) -> String {
        self.0.chars().take(32).collect()
    }

    pub fn mime_type(&self) -> CohortResult<&str> {
        self.split().map(|(mime, _)| mime)
    }

    /// File extension matching the image MIME type.
    pub fn extension(&self) -> CohortResult<&'static str> {
        Ok(match self.mime_type()? {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/svg+xml" => "svg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        })
    }

    /// Decoded image bytes.
    pub fn decode(&self) -> CohortResult<Vec<u8>> {
        let (_, payload) = self.split()?;
        general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(CohortError::ChartDecode)
    }
}

// ============================================================================
// RESPONSE MODEL
// ============================================================================

/// Deceased count and rate for one follow-up timeframe.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct MortalityRate {
    pub count: u64,
    /// Percentage of the cohort, 0-100.
    pub rate: f64,
}

/// Mortality summary returned alongside the mortality chart.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MortalitySummary {
    #[serde(default)]
    pub total_patients: Option<u64>,
    #[serde(default, rename = "30_day")]
    pub day_30: Option<MortalityRate>,
    #[serde(default, rename = "90_day")]
    pub day_90: Option<MortalityRate>,
    #[serde(default, rename = "120_day")]
    pub day_120: Option<MortalityRate>,
    #[serde(default, rename = "365_day")]
    pub day_365: Option<MortalityRate>,
}

impl MortalitySummary {
    /// Timeframes that have data, labelled.
    pub fn timeframes(&self) -> Vec<(&'static str, MortalityRate)> {
        [
            ("30-day", self.day_30),
            ("90-day", self.day_90),
            ("120-day", self.day_120),
            ("365-day", self.day_365),
        ]
        .into_iter()
        .filter_map(|(label, rate)| rate.map(|r| (label, r)))
        .collect()
    }
}

/// Period covered by the cohort's records. The backend has sent both a preformatted string
/// and a `{start, end}` object.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DateRange {
    Text(String),
    Span {
        #[serde(default)]
        start: Option<String>,
        #[serde(default)]
        end: Option<String>,
    },
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateRange::Text(text) => f.write_str(text),
            DateRange::Span { start, end } => write!(
                f,
                "{} to {}",
                start.as_deref().unwrap_or("?"),
                end.as_deref().unwrap_or("?")
            ),
        }
    }
}

/// How many patients had one field imputed.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ImputationStat {
    pub count: u64,
    pub percent: f64,
}

/// Summary metrics some backend revisions attach to an analysis.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct EnhancedMetrics {
    #[serde(default)]
    pub n_hospitals: Option<u64>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub imputation_rate: Option<f64>,
    #[serde(default)]
    pub patients_with_imputation: Option<u64>,
    #[serde(default)]
    pub avg_imputed_fields: Option<f64>,
    #[serde(default)]
    pub imputation_by_field: BTreeMap<String, ImputationStat>,
}

impl EnhancedMetrics {
    /// Imputed fields, most affected first.
    pub fn imputation_ranked(&self) -> Vec<(&str, ImputationStat)> {
        let mut ranked: Vec<_> = self
            .imputation_by_field
            .iter()
            .map(|(field, stat)| (field.as_str(), *stat))
            .collect();
        ranked.sort_by(|a, b| b.1.percent.total_cmp(&a.1.percent).then(a.0.cmp(b.0)));
        ranked
    }
}

/// Body of the `POST /api/cohorts/:id/analyse` response. Chart fields hold data URIs.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnalyseResponse {
    #[serde(default)]
    mortality_chart: Option<String>,
    #[serde(default)]
    fwalk2_chart: Option<String>,
    #[serde(default)]
    afracture_chart: Option<String>,
    #[serde(default)]
    residence_chart: Option<String>,
    #[serde(default)]
    residence_transition_chart: Option<String>,
    #[serde(default)]
    timelines_chart: Option<String>,
    #[serde(default)]
    time_to_surgery_chart: Option<String>,
    #[serde(default)]
    enhanced_metrics: Option<EnhancedMetrics>,
    #[serde(default)]
    total_patients: Option<u64>,
    #[serde(default)]
    mortality: Option<MortalitySummary>,
}

impl AnalyseResponse {
    fn chart(&self, kind: ChartKind) -> Option<&str> {
        let raw = match kind {
            ChartKind::Mortality => &self.mortality_chart,
            ChartKind::Walking => &self.fwalk2_chart,
            ChartKind::Fracture => &self.afracture_chart,
            ChartKind::Residence => &self.residence_chart,
            ChartKind::Transition => &self.residence_transition_chart,
            ChartKind::Timelines => &self.timelines_chart,
            ChartKind::Surgery => &self.time_to_surgery_chart,
        };
        raw.as_deref().filter(|uri| !uri.trim().is_empty())
    }
}

// ============================================================================
// ANALYSIS RESULT
// ============================================================================

/// Charts and metrics for one analysed cohort. Replaced wholesale on every analyse.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisResult {
    pub cohort_id: CohortId,
    pub cohort_name: String,
    pub charts: BTreeMap<ChartKind, ChartImage>,
    pub metrics: Option<EnhancedMetrics>,
    pub total_patients: Option<u64>,
    pub mortality: Option<MortalitySummary>,
}

impl AnalysisResult {
    pub(crate) fn from_response(
        cohort_id: CohortId,
        cohort_name: String,
        response: AnalyseResponse,
    ) -> Self {
        let charts = ChartKind::ALL
            .into_iter()
            .filter_map(|kind| response.chart(kind).map(|uri| (kind, ChartImage::new(uri))))
            .collect();

        Self {
            cohort_id,
            cohort_name,
            charts,
            metrics: response.enhanced_metrics,
            total_patients: response.total_patients,
            mortality: response.mortality,
        }
    }

    /// Charts to render for `selection`, in display order. Absent charts are skipped.
    pub fn visible(&self, selection: ChartSelection) -> Vec<(ChartKind, &ChartImage)> {
        self.charts
            .iter()
            .filter(|(kind, _)| selection.shows(**kind))
            .map(|(kind, image)| (*kind, image))
            .collect()
    }

    /// Writes the visible charts into `dir` as `<chart-id>.<ext>`, returning the paths written.
    pub fn export(&self, dir: &Path, selection: ChartSelection) -> CohortResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir).map_err(CohortError::FileWrite)?;

        let mut written = Vec::new();
        for (kind, image) in self.visible(selection) {
            let path = dir.join(format!("{}.{}", kind.id(), image.extension()?));
            std::fs::write(&path, image.decode()?).map_err(CohortError::FileWrite)?;
            tracing::debug!("wrote {} chart to {}", kind, path.display());
            written.push(path);
        }
        Ok(written)
    }
}
