use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use super::model::{ParFile, SegmentData};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Per-file parse failures. Each file fails independently; an error here
/// never affects any other file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Not a `.par` file at all – callers skip these silently.
    #[error("not a .par file")]
    NotApplicable,

    /// The file could not be read.
    #[error("reading file: {0}")]
    Io(#[from] std::io::Error),

    /// No `<TAG>...</TAG>` blocks were found.
    #[error("no tag blocks found")]
    Format,

    /// The `Segment1` block is missing or holds no data lines.
    #[error("Segment1 block has no data")]
    DataEmpty,

    /// A data line has too few fields or a field failed conversion.
    #[error("Segment1 line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Fixed header lines at the top of the `Segment1` block.
const HEADER_LINES: usize = 4;

/// Parse and analyse one `.par` file.
///
/// `default_segment` is the configured initial segment selection; it is
/// clamped to the file's valid range.
pub fn load_file(path: &Path, default_segment: usize) -> Result<ParFile, ParseError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !ext.eq_ignore_ascii_case("par") {
        return Err(ParseError::NotApplicable);
    }

    let text = std::fs::read_to_string(path)?;

    let blocks = extract_blocks(&text);
    if blocks.is_empty() {
        return Err(ParseError::Format);
    }

    // A missing Segment1 block behaves like an empty one.
    let segment_block = blocks.get("Segment1").map(String::as_str).unwrap_or("");
    let segments = decode_segment_block(segment_block)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();

    Ok(ParFile::from_segments(stem, segments, default_segment))
}

// ---------------------------------------------------------------------------
// Tagged-block extraction
// ---------------------------------------------------------------------------

/// Extract every `<NAME>...</NAME>` block into tag → trimmed content.
///
/// Tag names are single alphanumeric/underscore tokens, matched
/// case-sensitively against the first corresponding close tag (non-greedy).
/// Content may span lines. A later duplicate tag replaces an earlier one.
pub fn extract_blocks(text: &str) -> BTreeMap<String, String> {
    let mut blocks = BTreeMap::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('<') {
        let open = pos + offset;
        let name_start = open + 1;
        let name_len = text[name_start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(text.len() - name_start);
        let name_end = name_start + name_len;

        if name_len > 0 && text[name_end..].starts_with('>') {
            let name = &text[name_start..name_end];
            let close = format!("</{name}>");
            let content_start = name_end + 1;
            if let Some(close_offset) = text[content_start..].find(&close) {
                let content = &text[content_start..content_start + close_offset];
                blocks.insert(name.to_string(), content.trim().to_string());
                pos = content_start + close_offset + close.len();
                continue;
            }
        }
        pos = open + 1;
    }

    blocks
}

// ---------------------------------------------------------------------------
// Segment record decoding
// ---------------------------------------------------------------------------

/// Bits that mark an instrument-flagged bad sample.
const BAD_SAMPLE_BITS: u32 =
    (1 << 8) | (1 << 9) | (1 << 10) | (1 << 16) | (1 << 17) | (1 << 18);

/// Whether a record's status bitfield excludes it from analysis.
///
/// A record is discarded iff any of bits 8–10 or 16–18 is set, or the low
/// four bits are all set.
pub fn is_excluded(status: u32) -> bool {
    status & BAD_SAMPLE_BITS != 0 || status & 0xF == 0xF
}

/// Decode the `Segment1` block into per-segment sample groups.
///
/// The first four lines are a fixed header. Each remaining line is a
/// comma-separated record of at least 8 fields:
/// `segment, _, voltage, current, _, _, _, status, ...`
/// Records failing the status check are dropped whole. The retained records
/// are partitioned by segment index into `1 + max(segment)` groups,
/// preserving file order within each group (a stable partition, not a
/// sort). No retained records still yield one empty segment.
fn decode_segment_block(content: &str) -> Result<Vec<SegmentData>, ParseError> {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.len() < HEADER_LINES {
        return Err(ParseError::DataEmpty);
    }

    let mut records: Vec<(usize, f64, f64)> = Vec::new();

    for (idx, raw) in lines.iter().enumerate().skip(HEADER_LINES) {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 8 {
            return Err(ParseError::MalformedRecord {
                line: line_no,
                reason: format!("expected at least 8 fields, got {}", fields.len()),
            });
        }

        let status: u32 = parse_field(fields[7], line_no, "status")?;
        if is_excluded(status) {
            continue;
        }

        let segment: usize = parse_field(fields[0], line_no, "segment")?;
        let voltage: f64 = parse_field(fields[2], line_no, "voltage")?;
        let current: f64 = parse_field(fields[3], line_no, "current")?;
        records.push((segment, voltage, current));
    }

    let max_segment = records.iter().map(|r| r.0).max().map_or(1, |m| m + 1);

    let mut segments: Vec<SegmentData> = (0..max_segment).map(|_| SegmentData::default()).collect();
    for (segment, voltage, current) in records {
        segments[segment].voltages.push(voltage);
        segments[segment].currents.push(current);
    }

    Ok(segments)
}

fn parse_field<T: FromStr>(field: &str, line: usize, name: &str) -> Result<T, ParseError> {
    field.trim().parse().map_err(|_| ParseError::MalformedRecord {
        line,
        reason: format!("invalid {name} field '{}'", field.trim()),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_par(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".par")
            .tempfile()
            .expect("create temp file");
        file.write_all(content.as_bytes()).expect("write temp file");
        file
    }

    /// A Segment1 block: 4 header lines plus the given records.
    fn par_text(records: &[&str]) -> String {
        let mut text = String::from("<Segment1>\nDefinition\nSegment #\n64\nheader4\n");
        for r in records {
            text.push_str(r);
            text.push('\n');
        }
        text.push_str("</Segment1>\n");
        text
    }

    // -- exclusion predicate --

    #[test]
    fn exclusion_rule_boundary_values() {
        assert!(!is_excluded(0x00));
        assert!(!is_excluded(0x07));
        assert!(!is_excluded(0x10));
        assert!(is_excluded(0x0F)); // low four bits all set
        assert!(is_excluded(0x100)); // bit 8
        assert!(is_excluded(1 << 9));
        assert!(is_excluded(1 << 10));
        assert!(is_excluded(0x10000)); // bit 16
        assert!(is_excluded(1 << 17));
        assert!(is_excluded(1 << 18));
        assert!(is_excluded(0xFFFF_FFFF));
        // Neighbouring bits are not exclusion bits.
        assert!(!is_excluded(1 << 7));
        assert!(!is_excluded(1 << 11));
        assert!(!is_excluded(1 << 15));
        assert!(!is_excluded(1 << 19));
    }

    // -- block extraction --

    #[test]
    fn extracts_multiple_blocks_with_trimmed_content() {
        let text = "<Application>\n  VersaStudio  \n</Application><Instrument>X</Instrument>";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks["Application"], "VersaStudio");
        assert_eq!(blocks["Instrument"], "X");
    }

    #[test]
    fn unclosed_tags_are_ignored() {
        let blocks = extract_blocks("<Open>no close here <Other>x</Other>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks["Other"], "x");
    }

    #[test]
    fn duplicate_tag_last_wins() {
        let blocks = extract_blocks("<A>first</A><A>second</A>");
        assert_eq!(blocks["A"], "second");
    }

    #[test]
    fn non_token_angle_brackets_are_not_blocks() {
        assert!(extract_blocks("x < y and y > z").is_empty());
    }

    // -- load_file --

    #[test]
    fn wrong_extension_is_not_applicable() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"<A>x</A>").unwrap();
        match load_file(file.path(), 0) {
            Err(ParseError::NotApplicable) => {}
            other => panic!("expected NotApplicable, got {other:?}"),
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let mut file = tempfile::Builder::new().suffix(".PAR").tempfile().unwrap();
        file.write_all(par_text(&["0,0,0.1,0.001,0,0,0,0"]).as_bytes()).unwrap();
        assert!(load_file(file.path(), 0).is_ok());
    }

    #[test]
    fn no_tag_blocks_is_a_format_error() {
        let file = write_par("just some text, no tags\n");
        match load_file(file.path(), 0) {
            Err(ParseError::Format) => {}
            other => panic!("expected Format, got {other:?}"),
        }
    }

    #[test]
    fn missing_segment_block_is_data_empty() {
        let file = write_par("<Application>VersaStudio</Application>");
        match load_file(file.path(), 0) {
            Err(ParseError::DataEmpty) => {}
            other => panic!("expected DataEmpty, got {other:?}"),
        }
    }

    #[test]
    fn short_segment_block_is_data_empty() {
        let file = write_par("<Segment1>\nonly\ntwo lines\n</Segment1>");
        match load_file(file.path(), 0) {
            Err(ParseError::DataEmpty) => {}
            other => panic!("expected DataEmpty, got {other:?}"),
        }
    }

    #[test]
    fn too_few_fields_is_malformed() {
        let file = write_par(&par_text(&["0,0,0.1,0.001,0,0,0"]));
        match load_file(file.path(), 0) {
            Err(ParseError::MalformedRecord { line: 5, .. }) => {}
            other => panic!("expected MalformedRecord at line 5, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let file = write_par(&par_text(&["0,0,abc,0.001,0,0,0,0"]));
        assert!(matches!(
            load_file(file.path(), 0),
            Err(ParseError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn round_trip_two_segments_three_records_each() {
        let records = [
            "0,0,0.10,0.001,0,0,0,0",
            "0,1,0.20,0.002,0,0,0,0",
            "0,2,0.30,0.003,0,0,0,0",
            "1,3,0.30,0.004,0,0,0,0",
            "1,4,0.20,0.005,0,0,0,0",
            "1,5,0.10,0.006,0,0,0,0",
        ];
        let file = write_par(&par_text(&records));
        let par = load_file(file.path(), 2).expect("parses");

        assert_eq!(par.max_segment, 2);
        assert_eq!(par.voltages[0], vec![0.10, 0.20, 0.30]);
        assert_eq!(par.currents[1], vec![0.004, 0.005, 0.006]);
        // Three-sample half-cycles cannot satisfy the width constraint.
        assert_eq!(par.peaks(0), (None, None));
        assert_eq!(par.peaks(1), (None, None));
        // Default selection 2 clamps to the last valid segment.
        assert_eq!(par.selected_segment, 1);
    }

    #[test]
    fn flagged_records_are_dropped_whole() {
        let records = [
            "0,0,0.10,0.001,0,0,0,0",
            "0,1,0.20,0.002,0,0,0,256",   // bit 8
            "0,2,0.30,0.003,0,0,0,15",    // low nibble
            "1,3,0.40,0.004,0,0,0,65536", // bit 16
            "1,4,0.50,0.005,0,0,0,3",
        ];
        let file = write_par(&par_text(&records));
        let par = load_file(file.path(), 0).expect("parses");

        assert_eq!(par.max_segment, 2);
        assert_eq!(par.voltages[0], vec![0.10]);
        assert_eq!(par.voltages[1], vec![0.50]);
    }

    #[test]
    fn header_only_block_yields_one_empty_segment() {
        let file = write_par("<Segment1>\nDefinition\nSegment #\n64\nheader4\n</Segment1>");
        let par = load_file(file.path(), 2).expect("degenerate but not an error");
        assert_eq!(par.max_segment, 1);
        assert!(par.voltages[0].is_empty());
        assert_eq!(par.selected_segment, 0);
    }

    #[test]
    fn all_records_excluded_yields_one_empty_segment() {
        let file = write_par(&par_text(&["0,0,0.1,0.001,0,0,0,256"]));
        let par = load_file(file.path(), 0).expect("parses");
        assert_eq!(par.max_segment, 1);
        assert!(par.voltages[0].is_empty());
        assert!(par.currents[0].is_empty());
    }

    #[test]
    fn out_of_order_segment_indices_partition_stably() {
        let records = [
            "1,0,0.10,0.001,0,0,0,0",
            "0,1,0.20,0.002,0,0,0,0",
            "1,2,0.30,0.003,0,0,0,0",
            "0,3,0.40,0.004,0,0,0,0",
        ];
        let file = write_par(&par_text(&records));
        let par = load_file(file.path(), 0).expect("parses");

        assert_eq!(par.max_segment, 2);
        // File order is preserved within each group.
        assert_eq!(par.voltages[0], vec![0.20, 0.40]);
        assert_eq!(par.voltages[1], vec![0.10, 0.30]);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let text = "<Segment1>\r\nh1\r\nh2\r\nh3\r\nh4\r\n0,0,0.1,0.001,0,0,0,0\r\n</Segment1>";
        let file = write_par(text);
        let par = load_file(file.path(), 0).expect("parses");
        assert_eq!(par.voltages[0], vec![0.1]);
    }
}
