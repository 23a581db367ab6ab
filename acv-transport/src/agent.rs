//! HTTP User-Agent assembly.
//!
//! Fingerprint format:
//! `acvpclient/<ver>;<os>/<osver>;<arch>;<cpu>;rustc/<ver>`.
//! Each field is harvested from the platform when possible and from an
//! `ACV_USER_AGENT_*` environment variable otherwise; a field that is
//! missing or over its cap is dropped with a warning rather than
//! truncated.

use acv_prelude::{
    USER_AGENT_ARCH_MAX, USER_AGENT_COMP_MAX, USER_AGENT_OSNAME_MAX, USER_AGENT_OSVER_MAX,
    USER_AGENT_PROC_MAX, USER_AGENT_STR_MAX,
};
use tracing::warn;

/// Environment fallback for the OS name field.
pub const ENV_OSNAME: &str = "ACV_USER_AGENT_OSNAME";
/// Environment fallback for the OS version field.
pub const ENV_OSVER: &str = "ACV_USER_AGENT_OSVER";
/// Environment fallback for the architecture field.
pub const ENV_ARCH: &str = "ACV_USER_AGENT_ARCH";
/// Environment fallback for the processor-model field.
pub const ENV_PROC: &str = "ACV_USER_AGENT_PROC";
/// Environment fallback for the compiler field.
pub const ENV_COMP: &str = "ACV_USER_AGENT_COMP";

/// Assemble the User-Agent string for this build and host.
#[must_use]
pub fn user_agent_string() -> String {
    let mut agent = format!("acvpclient/{}", env!("CARGO_PKG_VERSION"));

    push_field(&mut agent, os_field());
    push_field(&mut agent, arch_field());
    push_field(&mut agent, cpu_field());
    push_field(&mut agent, compiler_field());

    if agent.len() > USER_AGENT_STR_MAX {
        agent.truncate(USER_AGENT_STR_MAX);
    }
    tracing::info!("HTTP User-Agent: {agent}");
    agent
}

fn push_field(agent: &mut String, field: Option<String>) {
    agent.push(';');
    if let Some(value) = field {
        agent.push_str(&value);
    }
}

fn os_field() -> Option<String> {
    let name = clamp(std::env::consts::OS, USER_AGENT_OSNAME_MAX, "OS name")
        .or_else(|| env_field(ENV_OSNAME, USER_AGENT_OSNAME_MAX))?;
    match os_version() {
        Some(version) => Some(format!("{name}/{version}")),
        None => Some(name),
    }
}

fn os_version() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(release) = std::fs::read_to_string("/proc/sys/kernel/osrelease") {
            if let Some(version) = clamp(release.trim(), USER_AGENT_OSVER_MAX, "OS version") {
                return Some(version);
            }
        }
    }
    env_field(ENV_OSVER, USER_AGENT_OSVER_MAX)
}

fn arch_field() -> Option<String> {
    clamp(std::env::consts::ARCH, USER_AGENT_ARCH_MAX, "architecture")
        .or_else(|| env_field(ENV_ARCH, USER_AGENT_ARCH_MAX))
}

fn cpu_field() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        if let Some(model) = cpu_model_from_proc() {
            if let Some(model) = clamp(&model, USER_AGENT_PROC_MAX, "CPU model") {
                return Some(model);
            }
        }
    }
    env_field(ENV_PROC, USER_AGENT_PROC_MAX)
}

/// The CPU brand string as the kernel reports it; the same text the
/// CPUID brand leaves carry on x86.
#[cfg(target_os = "linux")]
fn cpu_model_from_proc() -> Option<String> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    cpuinfo
        .lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, model)| model.trim().to_string())
}

fn compiler_field() -> Option<String> {
    let compiler = format!("rustc/{}", env!("CARGO_PKG_RUST_VERSION"));
    clamp(&compiler, USER_AGENT_COMP_MAX, "compiler").or_else(|| env_field(ENV_COMP, USER_AGENT_COMP_MAX))
}

fn env_field(var: &str, cap: usize) -> Option<String> {
    match std::env::var(var) {
        Ok(value) => clamp_env(&value, cap, var),
        Err(_) => {
            warn!("unable to collect info for HTTP user-agent - please define {var} ({cap} char max)");
            None
        }
    }
}

fn clamp(value: &str, cap: usize, what: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if value.len() > cap {
        warn!("{what} string too long ({} chars, {cap} max), omitting", value.len());
        return None;
    }
    Some(value.to_string())
}

fn clamp_env(value: &str, cap: usize, var: &str) -> Option<String> {
    if value.len() > cap {
        warn!("environment-provided {var} string too long ({cap} char max), omitting");
        return None;
    }
    Some(value.to_string())
}
