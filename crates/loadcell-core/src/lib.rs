#![forbid(unsafe_code)]

mod compute;
mod counter;
mod ops;
mod runtime_info;
mod uptime;

pub use compute::accumulate;
pub use counter::RequestCounter;
pub use ops::{
    Computed, Echoed, Greeting, Interrupted, SlowDone, StatsSnapshot, Workload, GREETING,
};
pub use runtime_info::{collect_runtime_info, RuntimeInfo};
pub use uptime::format_iso8601;
