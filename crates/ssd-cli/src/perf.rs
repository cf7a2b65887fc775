//! Section timing for classification runs.
//!
//! Sections are bracketed with `begin`/`end`; each closed bracket adds its
//! wall time to the section and bumps its count. The report expresses every
//! section as a share of [`Section::Total`].

use std::fmt;
use std::time::{Duration, Instant};

/// Timed region of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// All handshakes of a hardware pass
    Hardware,
    /// The software reference pass
    Software,
    /// Everything, reporting included
    Total,
}

impl Section {
    /// Every section, in report order.
    pub const ALL: [Self; 3] = [Self::Hardware, Self::Software, Self::Total];

    const fn slot(self) -> usize {
        match self {
            Self::Hardware => 0,
            Self::Software => 1,
            Self::Total => 2,
        }
    }

    /// Name used in the report.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hardware => "Hardware",
            Self::Software => "Software",
            Self::Total => "Total",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    started: Option<Instant>,
    elapsed: Duration,
    count: u64,
}

/// Accumulating per-section timer.
#[derive(Debug, Default)]
pub struct PerfMonitor {
    slots: [Slot; 3],
}

impl PerfMonitor {
    /// All sections zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a bracket. Reopening an open section restarts it.
    pub fn begin(&mut self, section: Section) {
        let slot = &mut self.slots[section.slot()];
        if slot.started.is_some() {
            tracing::warn!("{} section reopened before end", section.name());
        }
        slot.started = Some(Instant::now());
    }

    /// Close a bracket, returning the time it covered.
    ///
    /// Ending a section that was never begun is ignored.
    pub fn end(&mut self, section: Section) -> Option<Duration> {
        let slot = &mut self.slots[section.slot()];
        let Some(started) = slot.started.take() else {
            tracing::warn!("{} section ended without begin", section.name());
            return None;
        };
        let dt = started.elapsed();
        slot.elapsed += dt;
        slot.count += 1;
        Some(dt)
    }

    /// Accumulated time in closed brackets.
    pub fn elapsed(&self, section: Section) -> Duration {
        self.slots[section.slot()].elapsed
    }

    /// Number of closed brackets.
    pub fn count(&self, section: Section) -> u64 {
        self.slots[section.slot()].count
    }

    /// Share of Total, in percent. Zero while Total is empty.
    pub fn percent_of_total(&self, section: Section) -> f64 {
        let total = self.elapsed(Section::Total).as_secs_f64();
        if total == 0.0 {
            return 0.0;
        }
        self.elapsed(section).as_secs_f64() / total * 100.0
    }
}

impl fmt::Display for PerfMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance report")?;
        writeln!(f, "--------------------------------------------------")?;
        writeln!(
            f,
            "{:<10} {:>14} {:>12} {:>10}",
            "Section", "Time (µs)", "% of Total", "Count"
        )?;
        for section in Section::ALL {
            writeln!(
                f,
                "{:<10} {:>14.1} {:>12.2} {:>10}",
                section.name(),
                self.elapsed(section).as_secs_f64() * 1e6,
                self.percent_of_total(section),
                self.count(section)
            )?;
        }
        Ok(())
    }
}

/// Latency summary over repeated runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    /// Arithmetic mean
    pub mean: Duration,
    /// Fastest run
    pub min: Duration,
    /// Median
    pub p50: Duration,
    /// 99th percentile
    pub p99: Duration,
}

impl LatencyStats {
    /// Summarise `samples`. `None` when empty.
    pub fn from_samples(mut samples: Vec<Duration>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_unstable();
        let n = samples.len();
        let total: Duration = samples.iter().sum();
        let mean = total / u32::try_from(n).unwrap_or(u32::MAX);
        Some(Self {
            mean,
            min: samples[0],
            p50: samples[n / 2],
            p99: samples[(n * 99 / 100).min(n - 1)],
        })
    }
}

impl fmt::Display for LatencyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let us = |d: Duration| d.as_secs_f64() * 1e6;
        write!(
            f,
            "mean {:>9.2} µs  min {:>9.2} µs  p50 {:>9.2} µs  p99 {:>9.2} µs",
            us(self.mean),
            us(self.min),
            us(self.p50),
            us(self.p99)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_accumulate_and_count() {
        let mut perf = PerfMonitor::new();
        for _ in 0..3 {
            perf.begin(Section::Hardware);
            assert!(perf.end(Section::Hardware).is_some());
        }
        assert_eq!(perf.count(Section::Hardware), 3);
        assert_eq!(perf.count(Section::Software), 0);
        assert_eq!(perf.elapsed(Section::Software), Duration::ZERO);
    }

    #[test]
    fn end_without_begin_is_ignored() {
        let mut perf = PerfMonitor::new();
        assert!(perf.end(Section::Total).is_none());
        assert_eq!(perf.count(Section::Total), 0);
    }

    #[test]
    fn percent_is_zero_without_total() {
        let mut perf = PerfMonitor::new();
        perf.begin(Section::Software);
        perf.end(Section::Software);
        assert!(perf.percent_of_total(Section::Software).abs() < f64::EPSILON);
    }

    #[test]
    fn nested_section_is_a_share_of_total() {
        let mut perf = PerfMonitor::new();
        perf.begin(Section::Total);
        perf.begin(Section::Hardware);
        std::thread::sleep(Duration::from_millis(2));
        perf.end(Section::Hardware);
        perf.end(Section::Total);

        let pct = perf.percent_of_total(Section::Hardware);
        assert!(pct > 0.0 && pct <= 100.0, "{pct}");
        assert!((perf.percent_of_total(Section::Total) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn report_lists_every_section() {
        let report = PerfMonitor::new().to_string();
        for section in Section::ALL {
            assert!(report.contains(section.name()));
        }
        assert!(report.contains("% of Total"));
    }

    #[test]
    fn latency_percentiles() {
        let samples: Vec<Duration> = (1..=100).rev().map(Duration::from_micros).collect();
        let stats = LatencyStats::from_samples(samples).unwrap();
        assert_eq!(stats.min, Duration::from_micros(1));
        assert_eq!(stats.p50, Duration::from_micros(51));
        assert_eq!(stats.p99, Duration::from_micros(100));
        assert_eq!(stats.mean, Duration::from_nanos(50_500));
        assert!(LatencyStats::from_samples(Vec::new()).is_none());
    }
}
