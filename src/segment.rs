/// Run segmentation: split a concatenated solver log into per-run blocks.
///
/// The solver prints a resource-usage report once per run, and the phrase
/// "Total RAM" appears exactly once inside it, so that substring serves as
/// the run boundary. Known fragility: if a run's narrative text ever
/// contains the same substring, the block is split in two.

/// Literal boundary marker between runs.
pub const RUN_DELIMITER: &str = "Total RAM";

/// Split a log document into trimmed, non-empty fragments.
///
/// The first fragment is whatever the solver printed before its first
/// resource report — preamble, not a run. Callers are responsible for
/// skipping it; this function cannot tell preamble apart from run text.
pub fn split_runs(document: &str) -> Vec<&str> {
    document
        .split(RUN_DELIMITER)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}
