use crate::domain::{
    MemoryStats, OutputGroup, OutputSet, StatusRecord, TaskList, TaskRunState, TaskState,
    TelemetryReading,
};
use crate::proto::hydroponics::{state, state_task, State, StateTask};
use anyhow::{anyhow, Result};

/// Convert one protobuf State into a domain StatusRecord
pub fn status_record_proto_to_domain(proto: &State) -> Result<StatusRecord> {
    let report = proto
        .state
        .as_ref()
        .ok_or_else(|| anyhow!("state has no report set"))?;

    let record = match report {
        state::State::Telemetry(t) => StatusRecord::Telemetry(TelemetryReading {
            temp_indoor: t.temp_indoor,
            temp_probe: t.temp_probe,
            humidity: t.humidity,
            pressure: t.pressure,
            ec_a: t.ec_a,
            ec_b: t.ec_b,
            ph_a: t.ph_a,
            ph_b: t.ph_b,
            tank_a: t.tank_a,
            tank_b: t.tank_b,
        }),
        state::State::Tasks(tasks) => StatusRecord::TaskList(TaskList {
            tasks: tasks.task.iter().map(task_proto_to_domain).collect(),
        }),
        state::State::Memory(m) => StatusRecord::MemoryStats(MemoryStats {
            min_free: m.min_free,
            free: m.free,
        }),
        state::State::Outputs(outputs) => StatusRecord::OutputSet(OutputSet {
            groups: outputs
                .output
                .iter()
                .map(|o| OutputGroup {
                    outputs: o.output.clone(),
                    state: o.state,
                })
                .collect(),
        }),
        state::State::Reboot(_) => StatusRecord::RebootMarker,
    };

    Ok(record)
}

fn task_proto_to_domain(task: &StateTask) -> TaskState {
    // open enum on the wire: values past Deleted are kept, not rejected
    let state = match state_task::State::try_from(task.state) {
        Ok(state_task::State::Running) => TaskRunState::Running,
        Ok(state_task::State::Ready) => TaskRunState::Ready,
        Ok(state_task::State::Blocked) => TaskRunState::Blocked,
        Ok(state_task::State::Suspended) => TaskRunState::Suspended,
        Ok(state_task::State::Deleted) => TaskRunState::Deleted,
        Err(_) => TaskRunState::Unknown(task.state),
    };

    TaskState {
        name: task.name.clone(),
        state,
        priority: task.priority,
        runtime: task.runtime,
        stats: task.stats,
        highwater: task.highwater,
    }
}
