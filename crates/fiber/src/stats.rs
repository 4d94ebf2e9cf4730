/// Engine instrumentation counters, cumulative over the renderer's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub renders_requested: u64,
    pub ticks: u64,
    pub units_performed: u64,
    pub yields: u64,
    pub commits: u64,
    pub restarts: u64,
    pub queued: u64,
    pub failed_renders: u64,
    pub handles_created: u64,
    pub placements: u64,
    pub updates: u64,
    pub deletions: u64,
}
