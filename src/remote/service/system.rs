//! Host fact operations.

use tracing::debug;

use super::{SessionRunner, run_stdout};
use crate::remote::command::system::{self as command, PackageManager};
use crate::remote::error::CoreError;
use crate::remote::parse::system as parse;
use crate::remote::session::RemoteSession;
use crate::remote::types::{CpuInfo, DiskUsage, PackageInfo, ProcessInfo, ServerDetails};

const PROBE_FOUND: &str = "found";

#[derive(Clone)]
pub struct SystemService {
    runner: SessionRunner,
}

impl SystemService {
    pub fn new(runner: SessionRunner) -> Self {
        Self { runner }
    }

    /// Hostname, OS, kernel and uptime, queried concurrently.
    pub async fn server_details(&self, session_id: &str) -> Result<ServerDetails, CoreError> {
        let session = self.runner.session(session_id)?;
        let (hostname, uname, kernel, uptime) = futures::try_join!(
            run_stdout(&session, command::HOSTNAME),
            run_stdout(&session, command::UNAME_ALL),
            run_stdout(&session, command::UNAME_RELEASE),
            run_stdout(&session, command::UPTIME),
        )?;
        Ok(parse::server_details(&hostname, &uname, &kernel, &uptime))
    }

    pub async fn cpu_info(&self, session_id: &str) -> Result<Vec<CpuInfo>, CoreError> {
        let session = self.runner.session(session_id)?;
        let output = run_stdout(&session, command::CPU_INFO).await?;
        Ok(parse::cpu_info(&output))
    }

    pub async fn disk_usage(&self, session_id: &str) -> Result<Vec<DiskUsage>, CoreError> {
        let session = self.runner.session(session_id)?;
        let output = run_stdout(&session, command::DISK_USAGE).await?;
        Ok(parse::disk_usage(&output))
    }

    pub async fn processes(&self, session_id: &str) -> Result<Vec<ProcessInfo>, CoreError> {
        let session = self.runner.session(session_id)?;
        let output = run_stdout(&session, command::PROCESSES).await?;
        Ok(parse::processes(&output))
    }

    /// Installed packages from the host's package manager.
    pub async fn packages(&self, session_id: &str) -> Result<Vec<PackageInfo>, CoreError> {
        let session = self.runner.session(session_id)?;
        let manager = detect_package_manager(&session)
            .await?
            .ok_or_else(|| CoreError::not_found("supported package manager"))?;

        debug!(session_id, "Listing packages with {}", manager.binary());
        let output = run_stdout(&session, manager.list_installed()).await?;
        Ok(parse::packages(&output))
    }
}

/// Pick a package manager from `/etc/os-release`, probing for one when the
/// distribution is unknown or its manager is missing.
async fn detect_package_manager(session: &RemoteSession) -> Result<Option<PackageManager>, CoreError> {
    let distribution = run_stdout(session, command::DETECT_DISTRIBUTION)
        .await
        .unwrap_or_default();

    let preferred = PackageManager::for_distribution(&distribution);
    let candidates = preferred
        .into_iter()
        .chain(PackageManager::PROBE_ORDER.into_iter().filter(|m| Some(*m) != preferred));

    for manager in candidates {
        let probe = run_stdout(session, &manager.probe()).await?;
        if probe.trim() == PROBE_FOUND {
            return Ok(Some(manager));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::remote::executor::testing::ScriptedShell;
    use crate::remote::service::testing::{SESSION_ID, runner_with};

    fn service(shell: &Arc<ScriptedShell>) -> SystemService {
        SystemService::new(runner_with(shell.clone()))
    }

    #[tokio::test]
    async fn test_server_details() {
        let shell = Arc::new(
            ScriptedShell::new()
                .on("hostname", "web-01\n")
                .on("uname -a", "Linux web-01 6.1.0 x86_64 GNU/Linux\n")
                .on("uname -r", "6.1.0\n")
                .on("uptime", " 10:00:00 up 3 days\n"),
        );
        let details = service(&shell).server_details(SESSION_ID).await.unwrap();
        assert_eq!(details.hostname, "web-01");
        assert_eq!(details.kernel_version, "6.1.0");
        assert_eq!(details.uptime, "10:00:00 up 3 days");
        assert_eq!(shell.received().len(), 4);
    }

    #[tokio::test]
    async fn test_server_details_fails_as_a_whole() {
        let shell = Arc::new(
            ScriptedShell::new()
                .on("hostname", "web-01\n")
                .on("uname", "Linux\n")
                .on_transport_error("uptime", "channel open failed"),
        );
        let err = service(&shell).server_details(SESSION_ID).await.unwrap_err();
        assert!(matches!(err, CoreError::Execution { command, .. } if command == "uptime"));
    }

    #[tokio::test]
    async fn test_cpu_info() {
        let shell = Arc::new(
            ScriptedShell::new().on("cpuinfo", "processor : 0\n\nprocessor : 1\nmodel name : Xeon"),
        );
        let cpus = service(&shell).cpu_info(SESSION_ID).await.unwrap();
        assert_eq!(cpus.len(), 2);
    }

    #[tokio::test]
    async fn test_disk_usage_and_processes() {
        let shell = Arc::new(
            ScriptedShell::new()
                .on("df -hP", "Filesystem Size Used Avail Use% Mounted on\n/dev/sda1 50G 21G 27G 44% /\n")
                .on(
                    "ps aux",
                    "USER PID %CPU %MEM VSZ RSS TTY STAT START TIME COMMAND\n\
                     root 1 0.0 0.1 1 1 ? Ss Mar01 0:09 /sbin/init\n",
                ),
        );
        let svc = service(&shell);
        assert_eq!(svc.disk_usage(SESSION_ID).await.unwrap().len(), 1);
        assert_eq!(svc.processes(SESSION_ID).await.unwrap()[0].command, "/sbin/init");
    }

    mod packages {
        use super::*;

        #[tokio::test]
        async fn test_known_distribution() {
            let shell = Arc::new(
                ScriptedShell::new()
                    .on("os-release", "debian\n")
                    .on("command -v dpkg-query", "found\n")
                    .on("dpkg-query -W", "openssl 3.0.11-1 install ok installed amd64\n"),
            );
            let pkgs = service(&shell).packages(SESSION_ID).await.unwrap();
            assert_eq!(pkgs.len(), 1);
            assert_eq!(pkgs[0].architecture, "amd64");
        }

        #[tokio::test]
        async fn test_unknown_distribution_probes_in_order() {
            let shell = Arc::new(
                ScriptedShell::new()
                    .on("os-release", "alpine\n")
                    .on("command -v dpkg-query", "missing\n")
                    .on("command -v rpm", "found\n")
                    .on("rpm -qa", "bash 5.2.26 installed x86_64\n"),
            );
            let pkgs = service(&shell).packages(SESSION_ID).await.unwrap();
            assert_eq!(pkgs[0].name, "bash");

            let received = shell.received();
            assert!(received[1].contains("dpkg-query"));
            assert!(received[2].contains("rpm"));
            assert!(!received.iter().any(|c| c.contains("pacman")));
        }

        #[tokio::test]
        async fn test_missing_os_release_still_probes() {
            let shell = Arc::new(
                ScriptedShell::new()
                    .on_failure("os-release", "grep: /etc/os-release: No such file or directory")
                    .on("command -v", "missing\n"),
            );
            let err = service(&shell).packages(SESSION_ID).await.unwrap_err();
            assert!(matches!(err, CoreError::NotFound(_)));
            assert_eq!(shell.received().len(), 4);
        }

        #[tokio::test]
        async fn test_preferred_manager_missing_falls_back() {
            let shell = Arc::new(
                ScriptedShell::new()
                    .on("os-release", "fedora\n")
                    .on("command -v rpm", "missing\n")
                    .on("command -v dpkg-query", "missing\n")
                    .on("command -v pacman", "found\n")
                    .on("pacman -Q", "bash 5.2.026-2 installed x86_64\n"),
            );
            let pkgs = service(&shell).packages(SESSION_ID).await.unwrap();
            assert_eq!(pkgs[0].version, "5.2.026-2");
            let received = shell.received();
            assert!(received[1].contains("rpm"));
            assert_eq!(received.iter().filter(|c| c.contains("command -v rpm")).count(), 1);
        }
    }
}
