//! Host information collection
//!
//! A [`ClientInfo`] is a point-in-time snapshot of the hostname and virtual
//! memory statistics. It is recomputed for every dashboard request and never
//! cached. Read failures are returned as [`AgentError::InfoCollection`] so the
//! caller can render a degraded page.

use crate::error::{AgentError, Result};
use sysinfo::System;
use tracing::debug;

/// Virtual memory statistics in bytes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryStats {
    /// Total physical memory
    pub total_bytes: u64,
    /// Memory available for new allocations without swapping
    pub available_bytes: u64,
    /// Percentage of memory in use, `(total - available) / total * 100`
    pub used_percent: f64,
}

impl MemoryStats {
    /// Build statistics from total/available byte counts
    pub fn from_totals(total_bytes: u64, available_bytes: u64) -> Result<Self> {
        if total_bytes == 0 {
            return Err(AgentError::InfoCollection(
                "OS reported zero total memory".to_string(),
            ));
        }

        let available_bytes = available_bytes.min(total_bytes);
        let used = total_bytes - available_bytes;
        Ok(Self {
            total_bytes,
            available_bytes,
            used_percent: used as f64 / total_bytes as f64 * 100.0,
        })
    }
}

/// Snapshot of host facts shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInfo {
    /// Host name as reported by the OS
    pub hostname: String,
    /// Memory statistics
    pub memory: MemoryStats,
}

impl ClientInfo {
    /// Available/total memory, e.g. `512MB/16GB`
    pub fn format_human(&self) -> String {
        format!(
            "{}/{}",
            format_bytes(self.memory.available_bytes),
            format_bytes(self.memory.total_bytes)
        )
    }

    /// Multi-line summary rendered on the dashboard
    pub fn summary(&self) -> String {
        format!(
            "Host: {}\nMemory used: {:.1}%\nMemory: {}\n",
            self.hostname,
            self.memory.used_percent,
            self.format_human()
        )
    }
}

/// Source of host facts
pub trait InfoCollector: Send + Sync {
    /// Read a fresh snapshot
    fn collect(&self) -> Result<ClientInfo>;
}

/// Collector backed by the OS (`hostname` + `sysinfo`)
#[derive(Debug, Default)]
pub struct SystemInfoCollector;

impl SystemInfoCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self
    }

    fn read_hostname() -> Result<String> {
        let name = hostname::get()
            .map_err(|e| AgentError::InfoCollection(format!("Failed to read hostname: {}", e)))?;

        Ok(name.to_string_lossy().into_owned())
    }

    fn read_memory() -> Result<MemoryStats> {
        let mut system = System::new();
        system.refresh_memory();
        MemoryStats::from_totals(system.total_memory(), system.available_memory())
    }
}

impl InfoCollector for SystemInfoCollector {
    fn collect(&self) -> Result<ClientInfo> {
        let hostname = Self::read_hostname()?;
        let memory = Self::read_memory()?;
        debug!(
            "Collected host info for {}: {:.1}% memory used",
            hostname, memory.used_percent
        );

        Ok(ClientInfo { hostname, memory })
    }
}

/// Format bytes as an SI quantity, e.g. `83MB` or `8.3GB`
///
/// Values below ten units keep one decimal; everything else is rounded to a
/// whole number.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 10 {
        return format!("{}B", bytes);
    }

    let mut unit_idx = 0;
    let mut scale: u128 = 1;
    while unit_idx < UNITS.len() - 1 && (bytes as u128) >= scale * 1000 {
        scale *= 1000;
        unit_idx += 1;
    }

    let value = ((bytes as f64 / scale as f64) * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{:.1}{}", value, UNITS[unit_idx])
    } else {
        format!("{:.0}{}", value, UNITS[unit_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_info() -> ClientInfo {
        ClientInfo {
            hostname: "workstation-7".to_string(),
            memory: MemoryStats::from_totals(16_000_000_000, 512_000_000).unwrap(),
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(9), "9B");
        assert_eq!(format_bytes(10), "10B");
        assert_eq!(format_bytes(999), "999B");
        assert_eq!(format_bytes(1_500), "1.5kB");
        assert_eq!(format_bytes(82_854_982), "83MB");
        assert_eq!(format_bytes(512_000_000), "512MB");
        assert_eq!(format_bytes(8_300_000_000), "8.3GB");
        assert_eq!(format_bytes(16_000_000_000), "16GB");
        assert_eq!(format_bytes(u64::MAX), "18EB");
    }

    #[test]
    fn test_format_human() {
        assert_eq!(sample_info().format_human(), "512MB/16GB");
    }

    #[test]
    fn test_summary() {
        let summary = sample_info().summary();
        assert!(summary.contains("Host: workstation-7"));
        assert!(summary.contains("Memory used: 96.8%"));
        assert!(summary.contains("Memory: 512MB/16GB"));
    }

    #[test]
    fn test_memory_stats_rejects_zero_total() {
        assert!(matches!(
            MemoryStats::from_totals(0, 0),
            Err(AgentError::InfoCollection(_))
        ));
    }

    #[test]
    fn test_memory_stats_clamps_available() {
        let stats = MemoryStats::from_totals(1_000, 2_000).unwrap();
        assert_eq!(stats.available_bytes, 1_000);
        assert_eq!(stats.used_percent, 0.0);
    }

    #[test]
    fn test_system_collector_reads_host() {
        let info = SystemInfoCollector::new()
            .collect()
            .expect("hostname and memory should be readable");
        assert!(!info.hostname.is_empty());
        assert!(info.memory.total_bytes > 0);
        assert!((0.0..=100.0).contains(&info.memory.used_percent));
    }

    proptest! {
        #[test]
        fn prop_format_bytes_has_si_unit(bytes in any::<u64>()) {
            let formatted = format_bytes(bytes);
            let digits_end = formatted
                .find(|c: char| c.is_ascii_alphabetic())
                .expect("unit suffix");
            let (number, unit) = formatted.split_at(digits_end);
            prop_assert!(["B", "kB", "MB", "GB", "TB", "PB", "EB"].contains(&unit));
            prop_assert!(number.parse::<f64>().is_ok());
        }

        #[test]
        fn prop_used_percent_in_range(total in 1u64.., available in any::<u64>()) {
            let stats = MemoryStats::from_totals(total, available).unwrap();
            prop_assert!((0.0..=100.0).contains(&stats.used_percent));
        }
    }
}
