//! Structured launch specification and its platform translation.
//!
//! The spec carries the enforcement parameters as typed fields; the
//! translation to concrete wrapper argv happens in one place so the
//! manager's public contract stays platform-agnostic.

use snowball_protocol::ResourceGrant;

/// Niceness applied when a grant asks for less than the full CPU share.
const THROTTLED_NICENESS: i32 = 10;

/// A process launch with optional resource-enforcement parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Lowered scheduling priority (`nice -n <n>`), if any.
    pub niceness: Option<i32>,
    /// Memory ceiling in MiB for a transient run scope, if any.
    pub memory_max_mb: Option<u64>,
}

impl LaunchSpec {
    /// Derive the spec for `command` under `grant`.
    ///
    /// `cpu_percent < 100` lowers scheduling priority; `ram_mb > 0` adds a
    /// memory ceiling. A full-CPU, unmetered grant launches the command
    /// unwrapped. An empty command has no spec.
    pub fn from_grant(command: &[String], grant: &ResourceGrant) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            niceness: (grant.cpu_percent < 100).then_some(THROTTLED_NICENESS),
            memory_max_mb: (grant.ram_mb > 0).then_some(grant.ram_mb),
        })
    }

    /// Translate to the concrete argv for the Linux enforcement primitives.
    ///
    /// Wrapper order matches the enforcement chain: niceness first, then
    /// the transient scope carrying the memory ceiling, then the command.
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::new();
        if let Some(niceness) = self.niceness {
            argv.extend(["nice".to_string(), "-n".to_string(), niceness.to_string()]);
        }
        if let Some(mb) = self.memory_max_mb {
            argv.extend([
                "systemd-run".to_string(),
                "--scope".to_string(),
                format!("-pMemoryMax={mb}M"),
            ]);
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowball_protocol::ResourceRequest;

    fn grant(cpu: u16, ram_mb: u64) -> ResourceGrant {
        ResourceGrant::mirroring(&ResourceRequest::new(cpu, ram_mb, None).unwrap())
    }

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_command_has_no_spec() {
        assert_eq!(LaunchSpec::from_grant(&[], &grant(50, 2048)), None);
    }

    #[test]
    fn full_grant_launches_unwrapped() {
        let spec = LaunchSpec::from_grant(&cmd(&["echo", "hi"]), &grant(100, 0)).unwrap();
        assert_eq!(spec.niceness, None);
        assert_eq!(spec.memory_max_mb, None);
        assert_eq!(spec.to_argv(), cmd(&["echo", "hi"]));
    }

    #[test]
    fn throttled_cpu_adds_niceness() {
        let spec = LaunchSpec::from_grant(&cmd(&["worker"]), &grant(50, 0)).unwrap();
        assert_eq!(spec.niceness, Some(10));
        assert_eq!(spec.to_argv(), cmd(&["nice", "-n", "10", "worker"]));
    }

    #[test]
    fn ram_ceiling_adds_transient_scope() {
        let spec = LaunchSpec::from_grant(&cmd(&["worker"]), &grant(100, 2048)).unwrap();
        assert_eq!(spec.memory_max_mb, Some(2048));
        assert_eq!(
            spec.to_argv(),
            cmd(&["systemd-run", "--scope", "-pMemoryMax=2048M", "worker"])
        );
    }

    #[test]
    fn both_ceilings_compose_in_order() {
        let spec = LaunchSpec::from_grant(&cmd(&["worker", "--fast"]), &grant(50, 512)).unwrap();
        assert_eq!(
            spec.to_argv(),
            cmd(&[
                "nice",
                "-n",
                "10",
                "systemd-run",
                "--scope",
                "-pMemoryMax=512M",
                "worker",
                "--fast",
            ])
        );
    }
}
