/// Report writer: serialize the ordered run records to a CSV file.
///
/// Uses atomic write pattern: write to temp file then rename, so a failed
/// write never leaves a partial report at the destination path.
use crate::extract::RunRecord;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// One spreadsheet row. Field declaration order is the column order, and
/// the serde renames are the exact column headers the research sheets use.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    #[serde(rename = "Instance")]
    instance: &'a str,
    #[serde(rename = "Final Cost")]
    final_cost: Option<i64>,
    #[serde(rename = "Final Time")]
    final_time: Option<String>,
    #[serde(rename = "Enumerated Nodes")]
    enumerated_nodes: Option<i64>,
    #[serde(rename = "LKH Find Time")]
    lkh_find_time: Option<String>,
    #[serde(rename = "LKH final cost")]
    lkh_final_cost: Option<f64>,
    #[serde(rename = "Global Pool Size")]
    global_pool_size: Option<i64>,
    #[serde(rename = "Remaining in Global Pool")]
    gp_remaining: Option<i64>,
    #[serde(rename = "Percentage work Done")]
    percent_work_done: Option<String>,
}

impl<'a> ReportRow<'a> {
    /// Render a record for the sheet: times gain a " sec" suffix and the
    /// work percentage a "%" suffix; absent values become empty cells.
    fn from_record(record: &'a RunRecord) -> Self {
        Self {
            instance: &record.instance,
            final_cost: record.final_cost,
            final_time: record.final_time.map(seconds_cell),
            enumerated_nodes: record.enumerated_nodes,
            lkh_find_time: record.lkh_find_time.map(seconds_cell),
            lkh_final_cost: record.lkh_final_cost,
            global_pool_size: record.global_pool_size,
            gp_remaining: record.gp_remaining,
            percent_work_done: record.percent_work_done.map(|p| format!("{p}%")),
        }
    }
}

/// Render a seconds value as a float cell. Whole-number times keep their
/// decimal point ("33.0 sec", not "33 sec"), consistent with how the bare
/// f64 cells serialize.
fn seconds_cell(seconds: f64) -> String {
    if seconds.fract() == 0.0 && seconds.is_finite() {
        format!("{seconds:.1} sec")
    } else {
        format!("{seconds} sec")
    }
}

/// Write all records to `path` as CSV, header row first.
///
/// Writes to a temporary file in the destination directory, then renames
/// into place. On any failure the temp file is removed and the destination
/// is untouched.
pub fn write_report(records: &[RunRecord], path: &Path) -> Result<(), ReportError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.csv".to_string());
    let tmp_path = dir.join(format!(".{}.tmp.{}", file_name, std::process::id()));

    if let Err(e) = write_rows(records, &tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, path).map_err(|e| ReportError::Rename {
        from: tmp_path,
        to: path.to_path_buf(),
        source: e,
    })
}

fn write_rows(records: &[RunRecord], tmp_path: &Path) -> Result<(), ReportError> {
    let file = File::create(tmp_path).map_err(|e| ReportError::Create {
        path: tmp_path.to_path_buf(),
        source: e,
    })?;

    // The csv writer emits the header row from the serde renames on the
    // first serialize call. Headers must still appear for an empty table,
    // hence the explicit fallback.
    let mut writer = csv::Writer::from_writer(file);
    if records.is_empty() {
        writer
            .write_record(COLUMNS)
            .map_err(|e| ReportError::Serialize { source: e })?;
    }
    for record in records {
        writer
            .serialize(ReportRow::from_record(record))
            .map_err(|e| ReportError::Serialize { source: e })?;
    }
    writer.flush().map_err(|e| ReportError::Flush {
        path: tmp_path.to_path_buf(),
        source: e,
    })
}

/// Column headers in schema order, used when there are no rows to infer
/// them from.
const COLUMNS: &[&str] = &[
    "Instance",
    "Final Cost",
    "Final Time",
    "Enumerated Nodes",
    "LKH Find Time",
    "LKH final cost",
    "Global Pool Size",
    "Remaining in Global Pool",
    "Percentage work Done",
];

#[derive(Debug)]
pub enum ReportError {
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize {
        source: csv::Error,
    },
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Create { path, source } => {
                write!(f, "failed to create report file {}: {source}", path.display())
            }
            ReportError::Serialize { source } => {
                write!(f, "failed to serialize report row: {source}")
            }
            ReportError::Flush { path, source } => {
                write!(f, "failed to flush report file {}: {source}", path.display())
            }
            ReportError::Rename { from, to, source } => {
                write!(
                    f,
                    "failed to rename {} -> {}: {source}",
                    from.display(),
                    to.display()
                )
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Create { source, .. } => Some(source),
            ReportError::Serialize { source } => Some(source),
            ReportError::Flush { source, .. } => Some(source),
            ReportError::Rename { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_run;
    use crate::segment::split_runs;
    use tempfile::tempdir;

    fn sample_record() -> RunRecord {
        RunRecord {
            instance: "a.sop".to_string(),
            final_cost: Some(1200),
            final_time: Some(33.8),
            enumerated_nodes: Some(77),
            lkh_find_time: Some(30.75),
            lkh_final_cost: Some(1250.0),
            global_pool_size: Some(42),
            gp_remaining: Some(17),
            percent_work_done: Some(85),
        }
    }

    fn absent_record() -> RunRecord {
        RunRecord {
            instance: "Unknown".to_string(),
            final_cost: None,
            final_time: None,
            enumerated_nodes: None,
            lkh_find_time: None,
            lkh_final_cost: None,
            global_pool_size: None,
            gp_remaining: None,
            percent_work_done: None,
        }
    }

    #[test]
    fn writes_header_in_schema_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&[sample_record()], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(
            header,
            "Instance,Final Cost,Final Time,Enumerated Nodes,LKH Find Time,\
             LKH final cost,Global Pool Size,Remaining in Global Pool,Percentage work Done"
        );
    }

    #[test]
    fn formats_time_and_percentage_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&[sample_record()], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(row, "a.sop,1200,33.8 sec,77,30.75 sec,1250.0,42,17,85%");
    }

    #[test]
    fn whole_number_times_keep_decimal_point() {
        let block = "cost setting last updated at time 4.0\nactive time: 5.2\n1200, 33.0";
        let record = extract_run(block);
        assert_eq!(record.final_time, Some(33.0));

        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&[record], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(row, "Unknown,1200,33.0 sec,,4.0 sec,,,,");
    }

    #[test]
    fn absent_fields_become_empty_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&[absent_record()], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(row, "Unknown,,,,,,,,");
    }

    #[test]
    fn empty_table_still_gets_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&[], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("Instance,"));
    }

    #[test]
    fn unwritable_destination_fails_without_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-subdir").join("report.csv");
        let result = write_report(&[sample_record()], &path);
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-subdir").join("report.csv");
        let _ = write_report(&[sample_record()], &path);
        // Parent of the destination never existed, so nothing to check
        // there; the tempdir itself must stay clean.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn overwrites_existing_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "stale contents").unwrap();
        write_report(&[sample_record()], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Instance,"));
        assert!(!contents.contains("stale"));
    }

    #[test]
    fn two_run_log_end_to_end() {
        let log = "\
solver build 2024-03
Total RAM: 64 GB
Input file is /data/runs/ESC25.sop
Best Cost temp = 1700 updated by LKH
cost setting last updated at time 4.5
gp const: 128
gp remaining: 12
Percentage of work done: 90%
Total enumerated nodes:  5021
active time: 60.1
1700, 61.5
Total RAM: 64 GB
Input file is /data/runs/ESC47.sop
Best Cost temp = 2330 updated by LKH
cost setting last updated at time 9.25
gp const: 128
gp remaining: 0
Percentage of work done: 100%
Total enumerated nodes:  88410
active time: 300.0
2290, 301.2
";
        let blocks = split_runs(log);
        assert_eq!(blocks.len(), 3);
        let records: Vec<RunRecord> = blocks.iter().skip(1).map(|b| extract_run(b)).collect();
        assert_eq!(records.len(), 2);

        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&records, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = contents.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], "ESC25.sop,1700,61.5 sec,5021,4.5 sec,1700.0,128,12,90%");
        assert_eq!(rows[2], "ESC47.sop,2290,301.2 sec,88410,9.25 sec,2330.0,128,0,100%");
    }
}
