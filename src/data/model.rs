use serde::Serialize;

use super::analysis;

// ---------------------------------------------------------------------------
// FileKind – classification of a measurement file by its name
// ---------------------------------------------------------------------------

/// How a measurement file's stem is named, which determines its sort key
/// when merging results across a series of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Stem contains "PBS" (blank/reference runs, e.g. `PBS0001`).
    Pbs,
    /// Stem carries a trailing unit letter, e.g. `500V`.
    Voltage,
    /// Stem is a bare number – a glucose concentration series.
    Glucose,
    /// Anything else; sorts after the recognised kinds.
    Unnamed,
}

impl FileKind {
    /// Classify a filename stem (no directory, no extension).
    pub fn classify(stem: &str) -> Self {
        if stem.contains("PBS") {
            FileKind::Pbs
        } else if stem.contains('V') {
            FileKind::Voltage
        } else if stem.parse::<i64>().is_ok() {
            FileKind::Glucose
        } else {
            FileKind::Unnamed
        }
    }

    /// Numeric sort key for merging a file series in measurement order.
    ///
    /// PBS files sort ahead of everything via a large negative offset,
    /// voltage files by the digits before the unit letter, glucose files by
    /// their concentration. `None` when the stem carries no number.
    pub fn sort_key(&self, stem: &str) -> Option<i64> {
        match self {
            FileKind::Pbs => stem.get(3..)?.parse::<i64>().ok().map(|v| v - 200_000),
            FileKind::Voltage => stem.get(..stem.len().saturating_sub(1))?.parse::<i64>().ok(),
            FileKind::Glucose => stem.parse::<i64>().ok(),
            FileKind::Unnamed => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw per-segment samples
// ---------------------------------------------------------------------------

/// One segment's retained samples, index-aligned, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentData {
    pub voltages: Vec<f64>,
    pub currents: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Derived series
// ---------------------------------------------------------------------------

/// One monotonic traversal direction of a segment's voltage sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HalfCycle {
    pub voltages: Vec<f64>,
    pub currents: Vec<f64>,
}

impl HalfCycle {
    pub fn len(&self) -> usize {
        self.currents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currents.is_empty()
    }
}

/// The first local current extremum of a half-cycle that satisfies the
/// minimum-width constraint. Absence of a peak is `None`, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    /// Sample index within the half-cycle.
    pub index: usize,
    pub voltage: f64,
    pub current: f64,
}

/// A contiguous voltage / log-current sub-range of the second half-cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Branch {
    pub voltages: Vec<f64>,
    pub log_currents: Vec<f64>,
}

/// Everything derived from one segment's raw samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentAnalysis {
    pub first_half: HalfCycle,
    pub second_half: HalfCycle,
    /// Current minimum on the first half-cycle (cathodic dip).
    pub cathodic_peak: Option<Peak>,
    /// Current maximum on the second half-cycle (anodic peak).
    pub anodic_peak: Option<Peak>,
    /// log10(|current · 1000|) per second-half sample; empty when the
    /// second half is empty. A zero current contributes `-inf`.
    pub log_currents: Vec<f64>,
    pub cathodic: Branch,
    pub anodic: Branch,
}

// ---------------------------------------------------------------------------
// ParFile – the complete analysis result for one file
// ---------------------------------------------------------------------------

/// A fully parsed and analysed `.par` file.
///
/// Built in one synchronous pass by [`ParFile::from_segments`]; immutable
/// afterwards except for `selected_segment`, which the UI sets and the
/// export layer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ParFile {
    /// Filename stem (no directory, no extension).
    pub filename: String,
    pub kind: FileKind,
    /// 1 + the maximum retained segment index (always ≥ 1).
    pub max_segment: usize,
    /// Raw voltages per segment, file order preserved.
    pub voltages: Vec<Vec<f64>>,
    /// Raw currents per segment, index-aligned with `voltages`.
    pub currents: Vec<Vec<f64>>,
    /// Derived series per segment, same indexing.
    pub analyses: Vec<SegmentAnalysis>,
    /// The segment shown in the UI and used by the cross-file export.
    /// Always within `[0, max_segment)`.
    pub selected_segment: usize,
}

impl ParFile {
    /// Run the segment analyzer over every segment, in increasing segment
    /// order, and clamp the configured default selection to a valid index.
    pub fn from_segments(
        filename: String,
        segments: Vec<SegmentData>,
        default_segment: usize,
    ) -> Self {
        let max_segment = segments.len();
        let analyses: Vec<SegmentAnalysis> = segments
            .iter()
            .map(|s| analysis::analyze_segment(&s.voltages, &s.currents))
            .collect();

        let (voltages, currents): (Vec<_>, Vec<_>) =
            segments.into_iter().map(|s| (s.voltages, s.currents)).unzip();

        let kind = FileKind::classify(&filename);
        let selected_segment = default_segment.min(max_segment.saturating_sub(1));

        ParFile {
            filename,
            kind,
            max_segment,
            voltages,
            currents,
            analyses,
            selected_segment,
        }
    }

    /// Derived series for one segment, `None` when out of range.
    pub fn analysis(&self, segment: usize) -> Option<&SegmentAnalysis> {
        self.analyses.get(segment)
    }

    /// (cathodic, anodic) peaks for one segment.
    pub fn peaks(&self, segment: usize) -> (Option<Peak>, Option<Peak>) {
        match self.analyses.get(segment) {
            Some(a) => (a.cathodic_peak, a.anodic_peak),
            None => (None, None),
        }
    }

    /// Set the selected segment, clamped to `[0, max_segment)`.
    pub fn select_segment(&mut self, segment: usize) {
        self.selected_segment = segment.min(self.max_segment.saturating_sub(1));
    }
}
