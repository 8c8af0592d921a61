//! Per-segment derived series: half-cycle split, peak extraction,
//! log-magnitude transform, and the cathodic/anodic (Tafel) branch split.

use super::model::{Branch, HalfCycle, Peak, SegmentAnalysis};
use super::peaks;

/// Minimum feature width (in samples, at half prominence) for a current
/// extremum to count as a peak.
pub const PEAK_MIN_WIDTH: f64 = 10.0;

/// Index of the first occurrence of the maximum value.
pub fn index_of_max(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        let better = match best {
            None => true,
            Some(b) => v > values[b],
        };
        if better {
            best = Some(i);
        }
    }
    best
}

/// Index of the first occurrence of the minimum value.
pub fn index_of_min(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        let better = match best {
            None => true,
            Some(b) => v < values[b],
        };
        if better {
            best = Some(i);
        }
    }
    best
}

/// Analyse one segment's index-aligned (voltages, currents) arrays.
///
/// Pure: the same input always yields the same derived arrays. An empty
/// segment yields the all-empty analysis.
pub fn analyze_segment(voltages: &[f64], currents: &[f64]) -> SegmentAnalysis {
    let mut out = SegmentAnalysis::default();

    let (Some(v_max_idx), Some(v_min_idx)) = (index_of_max(voltages), index_of_min(voltages))
    else {
        return out;
    };

    // Split at the voltage extrema. The second half always starts at the
    // voltage minimum; the max index only moves the outer boundaries.
    if v_max_idx < v_min_idx {
        out.first_half = HalfCycle {
            voltages: voltages[v_max_idx..v_min_idx].to_vec(),
            currents: currents[v_max_idx..v_min_idx].to_vec(),
        };
        out.second_half = HalfCycle {
            voltages: voltages[v_min_idx..].to_vec(),
            currents: currents[v_min_idx..].to_vec(),
        };
    } else {
        out.first_half = HalfCycle {
            voltages: voltages[..v_min_idx].to_vec(),
            currents: currents[..v_min_idx].to_vec(),
        };
        out.second_half = HalfCycle {
            voltages: voltages[v_min_idx..v_max_idx].to_vec(),
            currents: currents[v_min_idx..v_max_idx].to_vec(),
        };
    }

    // Cathodic dip: a current minimum, found as a maximum of the negated
    // series. Anodic peak: a current maximum on the raw series.
    out.cathodic_peak = if out.first_half.is_empty() {
        None
    } else {
        let negated: Vec<f64> = out.first_half.currents.iter().map(|c| -c).collect();
        first_peak(&negated, &out.first_half)
    };

    out.anodic_peak = if out.second_half.is_empty() {
        None
    } else {
        first_peak(&out.second_half.currents, &out.second_half)
    };

    if out.second_half.is_empty() {
        return out;
    }

    // Currents expressed in milliamps, absolute value, base-10 log.
    // A zero current yields -inf, which is propagated and participates in
    // the minimum search like any other sample.
    out.log_currents = out
        .second_half
        .currents
        .iter()
        .map(|&c| (c * 1e3).abs().log10())
        .collect();
    debug_assert_eq!(out.log_currents.len(), out.second_half.len());

    let (Some(tafel_min), Some(tafel_max)) =
        (index_of_min(&out.log_currents), index_of_max(&out.log_currents))
    else {
        return out;
    };

    out.cathodic = Branch {
        voltages: out.second_half.voltages[..tafel_min].to_vec(),
        log_currents: out.log_currents[..tafel_min].to_vec(),
    };
    // A log maximum at or before the minimum leaves no anodic range.
    out.anodic = if tafel_max > tafel_min {
        Branch {
            voltages: out.second_half.voltages[tafel_min..tafel_max].to_vec(),
            log_currents: out.log_currents[tafel_min..tafel_max].to_vec(),
        }
    } else {
        Branch::default()
    };

    out
}

/// First width-qualified peak of `values`, reported with the voltage and
/// current of the owning half-cycle at that index.
fn first_peak(values: &[f64], half: &HalfCycle) -> Option<Peak> {
    let found = peaks::find_peaks(values, PEAK_MIN_WIDTH);
    found.first().map(|&index| Peak {
        index,
        voltage: half.voltages[index],
        current: half.currents[index],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_wins_under_duplicate_extrema() {
        let values = [1.0, 3.0, 1.0, 3.0, 1.0];
        assert_eq!(index_of_max(&values), Some(1));
        assert_eq!(index_of_min(&values), Some(0));
        assert_eq!(index_of_max(&[]), None);
    }

    #[test]
    fn split_with_max_index_at_or_after_min_index() {
        // Max at index 3, min at index 0: first half = [0, min) is empty,
        // second half = [min, max).
        let voltages = [1.0, 5.0, 2.0, 8.0, 3.0];
        let currents = [10.0, 20.0, 30.0, 40.0, 50.0];
        let a = analyze_segment(&voltages, &currents);

        assert!(a.first_half.is_empty());
        assert_eq!(a.second_half.voltages, vec![1.0, 5.0, 2.0]);
        assert_eq!(a.second_half.currents, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn split_with_max_index_before_min_index() {
        // Max at index 1, min at index 3: first half = [max, min),
        // second half = [min, end].
        let voltages = [3.0, 9.0, 5.0, 1.0, 7.0];
        let currents = [10.0, 20.0, 30.0, 40.0, 50.0];
        let a = analyze_segment(&voltages, &currents);

        assert_eq!(a.first_half.voltages, vec![9.0, 5.0]);
        assert_eq!(a.first_half.currents, vec![20.0, 30.0]);
        assert_eq!(a.second_half.voltages, vec![1.0, 7.0]);
        assert_eq!(a.second_half.currents, vec![40.0, 50.0]);
    }

    #[test]
    fn empty_segment_yields_the_all_empty_analysis() {
        let a = analyze_segment(&[], &[]);
        assert_eq!(a, SegmentAnalysis::default());
    }

    #[test]
    fn short_half_cycles_yield_no_peaks() {
        // Both halves far below the width-10 requirement.
        let voltages = [3.0, 9.0, 5.0, 1.0, 7.0];
        let currents = [10.0, 20.0, 30.0, 40.0, 50.0];
        let a = analyze_segment(&voltages, &currents);
        assert_eq!(a.cathodic_peak, None);
        assert_eq!(a.anodic_peak, None);
    }

    #[test]
    fn wide_anodic_feature_is_detected_on_the_second_half() {
        // Strictly increasing voltages: first half empty, second half is
        // everything but the final (maximum-voltage) sample.
        let voltages: Vec<f64> = (0..31).map(f64::from).collect();
        let currents: Vec<f64> = (0..31).map(|i: i32| (15 - (i - 15).abs()) as f64).collect();
        let a = analyze_segment(&voltages, &currents);

        assert!(a.first_half.is_empty());
        assert_eq!(a.second_half.len(), 30);
        let peak = a.anodic_peak.expect("wide triangular bump");
        assert_eq!(peak.index, 15);
        assert_eq!(peak.voltage, 15.0);
        assert_eq!(peak.current, 15.0);
        assert_eq!(a.cathodic_peak, None);
    }

    #[test]
    fn wide_cathodic_dip_is_detected_on_the_first_half() {
        // Strictly decreasing voltages: max at 0, min at the end, so the
        // first half covers everything but the final sample.
        let voltages: Vec<f64> = (0..31).map(|i| f64::from(30 - i)).collect();
        let currents: Vec<f64> = (0..31).map(|i: i32| (i - 15).abs() as f64).collect();
        let a = analyze_segment(&voltages, &currents);

        assert_eq!(a.first_half.len(), 30);
        assert_eq!(a.second_half.len(), 1);
        let dip = a.cathodic_peak.expect("wide dip");
        assert_eq!(dip.index, 15);
        assert_eq!(dip.voltage, 15.0);
        assert_eq!(dip.current, 0.0);
        // A single-sample second half cannot host a peak.
        assert_eq!(a.anodic_peak, None);
    }

    #[test]
    fn log_transform_is_elementwise_milliamp_magnitude() {
        // Increasing voltages over 4 samples: second half = first 3 samples.
        let voltages = [0.0, 1.0, 2.0, 3.0];
        let currents = [0.001, -0.01, 1.0, 99.0];
        let a = analyze_segment(&voltages, &currents);

        assert_eq!(a.second_half.len(), 3);
        assert_eq!(a.log_currents.len(), a.second_half.len());
        assert_eq!(a.log_currents[0], 0.0); // log10(|0.001 * 1000|)
        assert_eq!(a.log_currents[1], 1.0); // sign is dropped
        assert_eq!(a.log_currents[2], 3.0);
    }

    #[test]
    fn zero_current_propagates_negative_infinity() {
        let voltages = [0.0, 1.0, 2.0, 3.0];
        let currents = [1.0, 0.0, 10.0, 99.0];
        let a = analyze_segment(&voltages, &currents);

        assert_eq!(a.log_currents[1], f64::NEG_INFINITY);
        // -inf is the Tafel minimum: cathodic covers everything before it.
        assert_eq!(a.cathodic.voltages, vec![0.0]);
        assert_eq!(a.anodic.voltages, vec![1.0]);
    }

    #[test]
    fn tafel_split_uses_first_occurrences() {
        // log currents [3, 4, 3, 4]: min first at 0, max first at 1.
        let voltages = [0.0, 1.0, 2.0, 3.0, 4.0];
        let currents = [1.0, 10.0, 1.0, 10.0, 99.0];
        let a = analyze_segment(&voltages, &currents);

        assert_eq!(a.log_currents, vec![3.0, 4.0, 3.0, 4.0]);
        assert!(a.cathodic.voltages.is_empty());
        assert_eq!(a.anodic.voltages, vec![0.0]);
        assert_eq!(a.anodic.log_currents, vec![3.0]);
    }

    #[test]
    fn reversed_tafel_range_yields_an_empty_anodic_branch() {
        // log currents [4, 3, -1]: max at 0 before min at 2.
        let voltages = [0.0, 1.0, 2.0, 3.0];
        let currents = [10.0, 1.0, 0.0001, 99.0];
        let a = analyze_segment(&voltages, &currents);

        assert_eq!(a.cathodic.voltages, vec![0.0, 1.0]);
        assert_eq!(a.cathodic.log_currents, vec![4.0, 3.0]);
        assert!(a.anodic.voltages.is_empty());
        assert!(a.anodic.log_currents.is_empty());
    }

    #[test]
    fn single_sample_segment_yields_empty_halves_and_no_log() {
        // Max and min coincide at index 0: both halves are empty slices.
        let a = analyze_segment(&[1.0], &[5.0]);
        assert!(a.first_half.is_empty());
        assert!(a.second_half.is_empty());
        assert!(a.log_currents.is_empty());
        assert_eq!(a.cathodic, Branch::default());
        assert_eq!(a.anodic, Branch::default());
    }

    #[test]
    fn analysis_is_idempotent() {
        let voltages: Vec<f64> = (0..40).map(|i| ((i * 7) % 13) as f64).collect();
        let currents: Vec<f64> = (0..40).map(|i| ((i * 5) % 11) as f64 - 5.0).collect();
        let a = analyze_segment(&voltages, &currents);
        let b = analyze_segment(&voltages, &currents);
        assert_eq!(a, b);
    }
}
