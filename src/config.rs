/// Database configuration
///
/// Tuning knobs for the in-memory core; all commands started from one `Db`
/// share the same configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// How many documents a scan may process between checks of its kill
    /// flag. Lower values observe a kill sooner at the cost of more atomic
    /// loads; the latency to notice a kill is bounded by this many documents
    /// (or one `$where` step, whichever comes first).
    pub kill_check_every: usize,
}

impl DbConfig {
    pub fn new() -> Self {
        Self {
            kill_check_every: 64,
        }
    }

    /// Set the cancellation poll interval, in documents. Clamped to at
    /// least 1.
    pub fn kill_check_every(mut self, every: usize) -> Self {
        self.kill_check_every = every.max(1);
        self
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new()
    }
}
