use std::fmt;

/// The fixed set of report kinds a device can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Telemetry,
    TaskList,
    MemoryStats,
    OutputSet,
    RebootMarker,
}

impl StatusKind {
    /// Lower-cased name used as the snapshot document id.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Telemetry => "telemetry",
            StatusKind::TaskList => "tasks",
            StatusKind::MemoryStats => "memory",
            StatusKind::OutputSet => "outputs",
            StatusKind::RebootMarker => "reboot",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor readings as reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetryReading {
    pub temp_indoor: f32,
    pub temp_probe: f32,
    pub humidity: f32,
    pub pressure: f32,
    pub ec_a: f32,
    pub ec_b: f32,
    pub ph_a: f32,
    pub ph_b: f32,
    pub tank_a: f32,
    pub tank_b: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    Running,
    Ready,
    Blocked,
    Suspended,
    Deleted,
    /// A state newer firmware reports that this build has no name for.
    Unknown(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub name: String,
    pub state: TaskRunState,
    pub priority: u32,
    pub runtime: u64,
    pub stats: u32,
    pub highwater: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    pub tasks: Vec<TaskState>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub min_free: u32,
    pub free: u32,
}

/// A group of outputs switched to the same state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputGroup {
    pub outputs: Vec<i32>,
    pub state: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSet {
    pub groups: Vec<OutputGroup>,
}

/// One tagged report. The variant decides where the report is persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusRecord {
    Telemetry(TelemetryReading),
    TaskList(TaskList),
    MemoryStats(MemoryStats),
    OutputSet(OutputSet),
    RebootMarker,
}

impl StatusRecord {
    pub fn kind(&self) -> StatusKind {
        match self {
            StatusRecord::Telemetry(_) => StatusKind::Telemetry,
            StatusRecord::TaskList(_) => StatusKind::TaskList,
            StatusRecord::MemoryStats(_) => StatusKind::MemoryStats,
            StatusRecord::OutputSet(_) => StatusKind::OutputSet,
            StatusRecord::RebootMarker => StatusKind::RebootMarker,
        }
    }
}

/// A decoded record together with its own wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub record: StatusRecord,
    /// Device clock at report time. Diagnostics only, never persisted.
    pub device_timestamp: u64,
    pub raw: Vec<u8>,
}

/// Records in delivery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBatch {
    pub entries: Vec<BatchEntry>,
}

impl StatusBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
