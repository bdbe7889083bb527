//! Configuration and constants for trace import.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// The model keeps every timestamp in milliseconds.
// Systrace headers carry decimal seconds, JSON trace events carry microseconds.
pub const SECONDS_TO_MS: f64 = 1_000.0;
pub const MICROSECONDS_TO_MS: f64 = 0.001;

/// Kernel event name used by userland marker writes
pub const MARKER_EVENT_NAME: &str = "tracing_mark_write";

/// Kernel scheduler events understood by the systrace importer
pub const SCHED_SWITCH_EVENT_NAME: &str = "sched_switch";
pub const CPU_FREQUENCY_EVENT_NAME: &str = "cpu_frequency";

/// Name of the per-CPU counter fed by cpu_frequency events
pub const CPU_FREQUENCY_COUNTER_NAME: &str = "Clock Frequency";

/// Series name used when a counter sample carries a single unnamed value
pub const DEFAULT_SERIES_NAME: &str = "value";

/// Number of distinct series colors handed out to counters
pub const COUNTER_COLOR_PALETTE_SIZE: u32 = 32;

// Synthetic thread ids for colliding sub-traces live above the 32-bit tid space:
// candidate = tid + stride * (sub_trace_index + 1), bumped by one stride until free.
pub const SYNTHETIC_TID_STRIDE: i64 = 1 << 32;

/// Options applied to a whole import pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Shift every timestamp so the model's bounds start at zero
    pub shift_world_to_zero: bool,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift_world_to_zero(mut self, shift: bool) -> Self {
        self.shift_world_to_zero = shift;
        self
    }
}
