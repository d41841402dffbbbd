//! Parsers for host fact commands.

use std::collections::BTreeMap;

use crate::remote::types::{CpuInfo, DiskUsage, PackageInfo, ProcessInfo, ServerDetails};

const PS_COMMAND_COLUMN: usize = 10;
const UNKNOWN: &str = "unknown";

/// Assemble host facts from the raw outputs of `hostname`, `uname -a`,
/// `uname -r` and `uptime`.
pub fn server_details(hostname: &str, uname: &str, kernel: &str, uptime: &str) -> ServerDetails {
    ServerDetails {
        hostname: hostname.trim().to_string(),
        os: uname.trim().to_string(),
        kernel_version: kernel.trim().to_string(),
        uptime: uptime.trim().to_string(),
    }
}

/// Parse `/proc/cpuinfo` into one record per processor block.
///
/// Blocks are separated by blank lines and only kept when they carry a
/// `processor` key. A final block without a trailing blank line is kept.
pub fn cpu_info(output: &str) -> Vec<CpuInfo> {
    let mut records = Vec::new();
    let mut block = BTreeMap::new();

    let mut flush = |block: &mut BTreeMap<String, String>| {
        let fields = std::mem::take(block);
        if fields.contains_key("processor") {
            records.push(CpuInfo { fields });
        }
    };

    for line in output.lines() {
        if line.trim().is_empty() {
            flush(&mut block);
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            block.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    flush(&mut block);

    records
}

/// Parse `df -hP` rows after the header line.
pub fn disk_usage(output: &str) -> Vec<DiskUsage> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 6 {
                return None;
            }
            Some(DiskUsage {
                filesystem: fields[0].to_string(),
                size: fields[1].to_string(),
                used: fields[2].to_string(),
                available: fields[3].to_string(),
                use_percentage: fields[4].to_string(),
                // Mount points may contain spaces
                mounted_on: fields[5..].join(" "),
            })
        })
        .collect()
}

/// Parse `ps aux` rows after the header line; the command is every token from the eleventh on.
pub fn processes(output: &str) -> Vec<ProcessInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() <= PS_COMMAND_COLUMN {
                return None;
            }
            Some(ProcessInfo {
                user: fields[0].to_string(),
                pid: fields[1].to_string(),
                cpu: fields[2].to_string(),
                mem: fields[3].to_string(),
                vsz: fields[4].to_string(),
                rss: fields[5].to_string(),
                tty: fields[6].to_string(),
                stat: fields[7].to_string(),
                start: fields[8].to_string(),
                time: fields[9].to_string(),
                command: fields[PS_COMMAND_COLUMN..].join(" "),
            })
        })
        .collect()
}

/// Parse `name version status... architecture` package lines.
///
/// Three-token lines carry either a status or an architecture in the last
/// column; the other field is reported as `unknown`.
pub fn packages(output: &str) -> Vec<PackageInfo> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let (status, architecture) = match fields.as_slice() {
                [_, _, third] if third.contains("install") => (third.to_string(), UNKNOWN.into()),
                [_, _, third] => (UNKNOWN.into(), third.to_string()),
                [_, _, middle @ .., last] if !middle.is_empty() => {
                    (middle.join(" "), last.to_string())
                }
                _ => return None,
            };
            Some(PackageInfo {
                name: fields[0].to_string(),
                version: fields[1].to_string(),
                status,
                architecture,
            })
        })
        .collect()
}
