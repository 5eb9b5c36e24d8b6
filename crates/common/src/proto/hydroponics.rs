//! Device status messages (`hydroponics` protobuf package).

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StateTask {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(enumeration = "state_task::State", tag = "2")]
    pub state: i32,
    #[prost(uint32, tag = "3")]
    pub priority: u32,
    #[prost(uint64, tag = "4")]
    pub runtime: u64,
    #[prost(uint32, tag = "5")]
    pub stats: u32,
    #[prost(uint32, tag = "6")]
    pub highwater: u32,
}

pub mod state_task {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum State {
        Running = 0,
        Ready = 1,
        Blocked = 2,
        Suspended = 3,
        Deleted = 4,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StateTasks {
    #[prost(message, repeated, tag = "1")]
    pub task: ::prost::alloc::vec::Vec<StateTask>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct StateMemory {
    #[prost(uint32, tag = "1")]
    pub min_free: u32,
    #[prost(uint32, tag = "2")]
    pub free: u32,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct StateTelemetry {
    #[prost(float, tag = "1")]
    pub temp_indoor: f32,
    #[prost(float, tag = "2")]
    pub temp_probe: f32,
    #[prost(float, tag = "3")]
    pub humidity: f32,
    #[prost(float, tag = "4")]
    pub pressure: f32,
    #[prost(float, tag = "5")]
    pub ec_a: f32,
    #[prost(float, tag = "6")]
    pub ec_b: f32,
    #[prost(float, tag = "7")]
    pub ph_a: f32,
    #[prost(float, tag = "8")]
    pub ph_b: f32,
    #[prost(float, tag = "9")]
    pub tank_a: f32,
    #[prost(float, tag = "10")]
    pub tank_b: f32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StateOutput {
    #[prost(int32, repeated, tag = "1")]
    pub output: ::prost::alloc::vec::Vec<i32>,
    #[prost(int32, tag = "2")]
    pub state: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StateOutputs {
    #[prost(message, repeated, tag = "1")]
    pub output: ::prost::alloc::vec::Vec<StateOutput>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct StateReboot {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct State {
    #[prost(uint64, tag = "1")]
    pub timestamp: u64,
    #[prost(oneof = "state::State", tags = "2, 3, 4, 5, 6")]
    pub state: ::core::option::Option<state::State>,
}

pub mod state {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum State {
        #[prost(message, tag = "2")]
        Telemetry(super::StateTelemetry),
        #[prost(message, tag = "3")]
        Tasks(super::StateTasks),
        #[prost(message, tag = "4")]
        Memory(super::StateMemory),
        #[prost(message, tag = "5")]
        Outputs(super::StateOutputs),
        #[prost(message, tag = "6")]
        Reboot(super::StateReboot),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct States {
    #[prost(message, repeated, tag = "1")]
    pub state: ::prost::alloc::vec::Vec<State>,
}

/// Same wire layout as `States`, with every entry left in its delivered encoding.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EncodedStates {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub state: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}
