/// Aggregated view of an attempt's progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub flagged: usize,
    pub remaining_seconds: u32,
    pub is_finished: bool,
}
