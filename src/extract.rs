/// Per-run field extraction: scan one run's log text for the metric values
/// the research spreadsheet tracks.
///
/// Every rule is independent and tolerant of absence — the solver's log
/// format drifts between research iterations, and a missing field must
/// never block extraction of the others. Malformed numeric text is logged
/// and the field left empty.
use regex::Regex;
use std::sync::LazyLock;

/// "Input file is /path/to/instance.sop" — instance name from the full path.
static INSTANCE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Input file is .*/(.+?\.sop)").unwrap());

/// Fallback: a line that is itself a bare .sop filename.
static INSTANCE_BARE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(.*\.sop)").unwrap());

/// "Best Cost temp = N updated by LKH" — logged once per improvement.
static LKH_COST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Best Cost temp\s*=\s*(\d+)\s+updated by LKH").unwrap());

/// "... setting last updated at <seconds>" — also once per improvement.
static LKH_FIND_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"setting last updated at.*?([\d.]+)").unwrap());

static ENUMERATED_NODES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total enumerated nodes:\s+(\d+)").unwrap());

static GP_CONST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)gp const:\s*(\d+)").unwrap());

static GP_REMAINING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)gp remaining:\s*(\d+)").unwrap());

static PERCENT_DONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Percentage of work done:\s*(\d+)%").unwrap());

/// The final cost/time pair is the comma-separated line immediately after
/// the "active time: <seconds>" marker.
static ACTIVE_TIME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"active time:\s*[\d.]+\s*\n([^\n]+)").unwrap());

/// Metrics extracted from one run's log block.
///
/// Every field that can be absent is an `Option`; a record always carries
/// the full schema, with `None` standing in for anything the block did not
/// contain. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub instance: String,
    pub final_cost: Option<i64>,
    pub final_time: Option<f64>,
    pub enumerated_nodes: Option<i64>,
    pub lkh_find_time: Option<f64>,
    pub lkh_final_cost: Option<f64>,
    pub global_pool_size: Option<i64>,
    pub gp_remaining: Option<i64>,
    pub percent_work_done: Option<i64>,
}

/// Extract all schema fields from one run block.
///
/// Never fails: each rule degrades to `None` on absence or malformed text,
/// so the record is always fully populated.
pub fn extract_run(block: &str) -> RunRecord {
    let instance = INSTANCE_PATH
        .captures(block)
        .or_else(|| INSTANCE_BARE.captures(block))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    // Values logged once per improvement: only the last one is the run's
    // true outcome.
    let lkh_final_cost =
        last_capture(&LKH_COST, block).and_then(|v| parse_f64(v, "LKH final cost"));
    let lkh_find_time =
        last_capture(&LKH_FIND_TIME, block).and_then(|v| parse_f64(v, "LKH Find Time"));

    let enumerated_nodes = first_capture(&ENUMERATED_NODES, block)
        .and_then(|v| parse_i64(v, "Enumerated Nodes"));
    let global_pool_size =
        first_capture(&GP_CONST, block).and_then(|v| parse_i64(v, "Global Pool Size"));
    let gp_remaining =
        first_capture(&GP_REMAINING, block).and_then(|v| parse_i64(v, "Remaining in Global Pool"));
    let percent_work_done =
        first_capture(&PERCENT_DONE, block).and_then(|v| parse_i64(v, "Percentage work Done"));

    let (final_cost, final_time) = active_time_pair(block);

    RunRecord {
        instance,
        final_cost,
        final_time,
        enumerated_nodes,
        lkh_find_time,
        lkh_final_cost,
        global_pool_size,
        gp_remaining,
        percent_work_done,
    }
}

/// Final Cost / Final Time from the line following the active-time marker.
///
/// The line is comma-separated; the first value is the cost (truncated to
/// an integer), the second the wall time in seconds. Extra trailing values
/// are ignored. Fewer than two values, or no marker at all, leaves both
/// fields empty.
fn active_time_pair(block: &str) -> (Option<i64>, Option<f64>) {
    let line = match ACTIVE_TIME_LINE.captures(block).and_then(|caps| caps.get(1)) {
        Some(m) => m.as_str(),
        None => return (None, None),
    };

    let values: Vec<&str> = line
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if values.len() < 2 {
        tracing::warn!(line, "active-time line has fewer than two values");
        return (None, None);
    }

    let final_cost = parse_f64(values[0], "Final Cost").map(|v| v as i64);
    let final_time = parse_f64(values[1], "Final Time");
    (final_cost, final_time)
}

/// First capture group of the first match, if any.
fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// First capture group of the LAST match, if any.
fn last_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_i64(value: &str, field: &'static str) -> Option<i64> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(field, value, error = %e, "malformed integer, leaving field empty");
            None
        }
    }
}

fn parse_f64(value: &str, field: &'static str) -> Option<f64> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(field, value, error = %e, "malformed number, leaving field empty");
            None
        }
    }
}
