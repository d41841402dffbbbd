//! Host information commands.
//!
//! All host commands are fixed strings; only the package manager choice
//! varies, and it comes from a closed set.

pub const HOSTNAME: &str = "hostname";
pub const UNAME_ALL: &str = "uname -a";
pub const UNAME_RELEASE: &str = "uname -r";
pub const UPTIME: &str = "uptime";
pub const CPU_INFO: &str = "cat /proc/cpuinfo";
/// POSIX output format keeps each filesystem on a single line.
pub const DISK_USAGE: &str = "df -hP";
pub const PROCESSES: &str = "ps aux";

/// Print the `ID` of `/etc/os-release` without quotes.
pub const DETECT_DISTRIBUTION: &str =
    "grep -E '^ID=' /etc/os-release | cut -d= -f2 | tr -d '\"'";

/// Package managers that can list installed packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Dpkg,
    Rpm,
    Pacman,
}

impl PackageManager {
    /// Probe order used when the distribution is not recognized.
    pub const PROBE_ORDER: [PackageManager; 3] =
        [PackageManager::Dpkg, PackageManager::Rpm, PackageManager::Pacman];

    /// Select the package manager of a distribution `ID`.
    pub fn for_distribution(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "ubuntu" | "debian" | "pop" | "linuxmint" | "mint" | "elementary" | "kali"
            | "zorin" | "raspbian" => Some(PackageManager::Dpkg),
            "fedora" | "rhel" | "centos" | "rocky" | "almalinux" | "alma" | "ol" | "amzn" => {
                Some(PackageManager::Rpm)
            }
            "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" | "sles" | "suse" => {
                Some(PackageManager::Rpm)
            }
            "arch" | "manjaro" | "endeavouros" => Some(PackageManager::Pacman),
            _ => None,
        }
    }

    pub fn binary(self) -> &'static str {
        match self {
            PackageManager::Dpkg => "dpkg-query",
            PackageManager::Rpm => "rpm",
            PackageManager::Pacman => "pacman",
        }
    }

    /// Prints `found` when the package manager is installed, `missing` otherwise.
    pub fn probe(self) -> String {
        format!(
            "command -v {} >/dev/null 2>&1 && echo found || echo missing",
            self.binary()
        )
    }

    /// List installed packages as `name version status... architecture` lines.
    pub fn list_installed(self) -> &'static str {
        match self {
            PackageManager::Dpkg => {
                r"dpkg-query -W -f='${Package} ${Version} ${Status} ${Architecture}\n'"
            }
            PackageManager::Rpm => r"rpm -qa --queryformat '%{NAME} %{VERSION} installed %{ARCH}\n'",
            PackageManager::Pacman => {
                r#"pacman -Q | awk -v arch="$(uname -m)" '{print $1 " " $2 " installed " arch}'"#
            }
        }
    }
}
