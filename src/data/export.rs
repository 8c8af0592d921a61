use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::model::{ParFile, Peak};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write the cross-file exports into `dir`.
///
/// Always produces the selected-segment curve CSV, the selected-segment
/// peak CSV and the JSON summary. With `detail` set, additionally writes
/// the same pair of CSVs for every segment index shared by all files.
pub fn export_all(files: &[&ParFile], dir: &Path, detail: bool) -> Result<()> {
    if files.is_empty() {
        anyhow::bail!("no parsed files to export");
    }

    write_curves_csv(files, &dir.join("Segment_User_Option_data.csv"), |f| {
        f.selected_segment
    })?;
    write_peaks_csv(files, &dir.join("Segment_User_Option_Peak.csv"), |f| {
        f.selected_segment
    })?;
    write_summary_json(files, &dir.join("analysis_summary.json"))?;

    if detail {
        let min_segment = files.iter().map(|f| f.max_segment).min().unwrap_or(0);
        for segment in 0..min_segment {
            write_curves_csv(files, &dir.join(format!("Segment{segment}_data.csv")), |_| {
                segment
            })?;
            write_peaks_csv(files, &dir.join(format!("Segment{segment}_Peak.csv")), |_| {
                segment
            })?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Curve CSV – one voltage and one current column per file
// ---------------------------------------------------------------------------

/// Column pair per file: `{stem}` (voltages) and `{stem}_segment#{k}`
/// (currents). Columns are ragged; shorter ones are padded with empty
/// cells.
fn write_curves_csv(
    files: &[&ParFile],
    path: &Path,
    segment_for: impl Fn(&ParFile) -> usize,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut header = Vec::with_capacity(files.len() * 2);
    for &file in files {
        let segment = segment_for(file);
        header.push(file.filename.clone());
        header.push(format!("{}_segment#{segment}", file.filename));
    }
    writer.write_record(&header)?;

    let n_rows = files
        .iter()
        .map(|&f| f.voltages[segment_for(f)].len())
        .max()
        .unwrap_or(0);

    for row in 0..n_rows {
        let mut record = Vec::with_capacity(files.len() * 2);
        for &file in files {
            let segment = segment_for(file);
            record.push(cell(file.voltages[segment].get(row)));
            record.push(cell(file.currents[segment].get(row)));
        }
        writer.write_record(&record)?;
    }

    writer.flush().context("flushing curve CSV")?;
    Ok(())
}

fn cell(value: Option<&f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Peak CSV – one row per file
// ---------------------------------------------------------------------------

fn write_peaks_csv(
    files: &[&ParFile],
    path: &Path,
    segment_for: impl Fn(&ParFile) -> usize,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record([
        "Filename",
        "Segment#",
        "cathodic_peak_voltage",
        "cathodic_peak_current",
        "anodic_peak_voltage",
        "anodic_peak_current",
    ])?;

    for &file in files {
        let segment = segment_for(file);
        let (cathodic, anodic) = file.peaks(segment);
        writer.write_record([
            file.filename.clone(),
            segment.to_string(),
            peak_cell(cathodic, |p| p.voltage),
            peak_cell(cathodic, |p| p.current),
            peak_cell(anodic, |p| p.voltage),
            peak_cell(anodic, |p| p.current),
        ])?;
    }

    writer.flush().context("flushing peak CSV")?;
    Ok(())
}

fn peak_cell(peak: Option<Peak>, field: impl Fn(&Peak) -> f64) -> String {
    peak.map(|p| field(&p).to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// JSON summary
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct FileSummary<'a> {
    filename: &'a str,
    selected_segment: usize,
    max_segment: usize,
    cathodic_peak: Option<Peak>,
    anodic_peak: Option<Peak>,
}

fn write_summary_json(files: &[&ParFile], path: &Path) -> Result<()> {
    let summaries: Vec<FileSummary> = files
        .iter()
        .map(|file| {
            let (cathodic_peak, anodic_peak) = file.peaks(file.selected_segment);
            FileSummary {
                filename: &file.filename,
                selected_segment: file.selected_segment,
                max_segment: file.max_segment,
                cathodic_peak,
                anodic_peak,
            }
        })
        .collect();

    let out = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(out, &summaries).context("writing JSON summary")?;
    Ok(())
}
