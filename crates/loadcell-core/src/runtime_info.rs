use crate::counter::RequestCounter;
use crate::uptime::format_iso8601;
use std::time::Duration;
use sysinfo::System;

/// Snapshot of host and process facts served by the runtime info
/// operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub hostname: String,
    pub service_version: String,
    pub runtime_version: String,
    pub runtime_vendor: String,
    pub os_name: String,
    pub os_arch: String,
    pub available_processors: usize,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    /// Elapsed time since the OS started this process, ISO-8601.
    pub uptime: String,
    pub request_count: u64,
    /// Elapsed time since the workload state was constructed, ISO-8601.
    pub app_uptime: String,
}

/// Gathers a [`RuntimeInfo`] snapshot. Memory figures come from the
/// OS, so they vary call to call; everything else is stable for the
/// process lifetime.
#[must_use]
pub fn collect_runtime_info(counter: &RequestCounter) -> RuntimeInfo {
    let mut sys = System::new();
    sys.refresh_memory();

    let mut memory_used_bytes = 0;
    let mut process_uptime = Duration::ZERO;
    if let Ok(pid) = sysinfo::get_current_pid() {
        sys.refresh_process(pid);
        if let Some(process) = sys.process(pid) {
            memory_used_bytes = process.memory();
            process_uptime = Duration::from_secs(process.run_time());
        }
    }

    RuntimeInfo {
        hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        service_version: env!("CARGO_PKG_VERSION").to_string(),
        runtime_version: option_env!("LOADCELL_RUSTC_VERSION")
            .unwrap_or("unknown")
            .to_string(),
        runtime_vendor: "rust-lang".to_string(),
        os_name: System::long_os_version()
            .or_else(System::name)
            .unwrap_or_else(|| std::env::consts::OS.to_string()),
        os_arch: std::env::consts::ARCH.to_string(),
        available_processors: num_cpus::get(),
        memory_used_bytes,
        memory_total_bytes: sys.total_memory(),
        uptime: format_iso8601(process_uptime),
        request_count: counter.total(),
        app_uptime: format_iso8601(counter.uptime()),
    }
}
