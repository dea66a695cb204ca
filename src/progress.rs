//! Simulated progress estimation.
//!
//! The oracle exposes no real progress signal, so these state machines
//! fabricate one: a monotonic percentage that climbs quickly at first and
//! asymptotically slows toward a cap below 100, never stalling visibly
//! and never reaching 100 before the real operation resolves. They are
//! pure and tick-driven: whoever renders them owns the timer and cancels
//! it deterministically when the operation settles.

/// Pacing schedule for a document-analysis estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// Full oracle round trip expected.
    Fresh,
    /// A cache hit is anticipated; the bar sprints.
    Cached,
}

/// Ceiling for simulated progress; only the real result reaches 100.
const SIMULATED_CAP: f32 = 98.0;

/// Monotonic simulated progress for one document-type analysis.
#[derive(Debug)]
pub struct ProgressEstimator {
    percent: f32,
    pace: Pace,
    stage: &'static str,
    settled: bool,
}

impl ProgressEstimator {
    pub fn new(pace: Pace) -> Self {
        Self {
            percent: 0.0,
            pace,
            stage: "Waiting",
            settled: false,
        }
    }

    /// Advance one synthetic tick. Returns the new percentage.
    pub fn tick(&mut self) -> f32 {
        if self.settled {
            return self.percent;
        }
        let (increment, stage) = match self.pace {
            Pace::Cached => (20.0, "Restoring memoized analysis..."),
            Pace::Fresh => match self.percent {
                p if p < 20.0 => (5.0, "Preprocessing documents..."),
                p if p < 50.0 => (1.5, "Submitting to the analysis model..."),
                p if p < 80.0 => (0.4, "Model working through the data..."),
                p if p < 90.0 => (0.1, "Structuring output..."),
                p if p < SIMULATED_CAP => (0.02, "Finalizing and validating..."),
                _ => (0.0, "Waiting for the service..."),
            },
        };
        self.stage = stage;
        self.percent = (self.percent + increment).min(SIMULATED_CAP);
        self.percent
    }

    /// Terminal transition, driven by the real operation resolving.
    /// Overrides the simulated value: 100 on success, back to 0 on
    /// failure.
    pub fn finish(&mut self, success: bool) {
        self.settled = true;
        if success {
            self.percent = 100.0;
            self.stage = "Completed";
        } else {
            self.percent = 0.0;
            self.stage = "Failed";
        }
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

/// Ceiling for the whole-audit simulation.
const AUDIT_CAP: f32 = 99.0;

/// Slow steady climb; a full round table takes a while.
const AUDIT_INCREMENT: f32 = 0.3;

/// Named milestones, fired exactly once as cumulative progress crosses
/// each threshold.
const MILESTONES: [(f32, &str); 7] = [
    (10.0, "🗣️ Auditor 1: independent review"),
    (25.0, "🗣️ Auditor 2: independent review"),
    (40.0, "🗣️ Auditor 3: independent review"),
    (55.0, "🗣️ Auditor 4: independent review"),
    (70.0, "🗣️ Auditor 5: independent review"),
    (85.0, "⚖️ Judge: consolidating the round table"),
    (95.0, "📝 Drafting the final verdict..."),
];

/// Advisory view of an in-flight audit's progress.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub percent: f32,
    pub stage: String,
    pub milestones: Vec<String>,
}

/// Simulated progress for a whole multi-round audit, with an append-only
/// milestone log readable at the consumer's own cadence.
#[derive(Debug, Default)]
pub struct AuditProgress {
    percent: f32,
    next_milestone: usize,
    log: Vec<String>,
    settled: bool,
}

impl AuditProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one synthetic tick, firing any newly crossed milestones
    /// into the event log.
    pub fn tick(&mut self) -> f32 {
        if self.settled {
            return self.percent;
        }
        self.percent = (self.percent + AUDIT_INCREMENT).min(AUDIT_CAP);
        while self.next_milestone < MILESTONES.len()
            && self.percent >= MILESTONES[self.next_milestone].0
        {
            self.log
                .push(MILESTONES[self.next_milestone].1.to_string());
            self.next_milestone += 1;
        }
        self.percent
    }

    /// Terminal transition, driven by the real audit resolving.
    pub fn finish(&mut self, success: bool) {
        self.settled = true;
        if success {
            self.percent = 100.0;
            self.log.push("🏁 Round table complete.".to_string());
        } else {
            self.log.push("❌ Deliberation failed.".to_string());
        }
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    /// Latest milestone label, or the convening banner before any fires.
    pub fn stage(&self) -> &str {
        self.log
            .last()
            .map(String::as_str)
            .unwrap_or("🚀 Convening the audit round table...")
    }

    /// The full append-only event log.
    pub fn events(&self) -> &[String] {
        &self.log
    }

    /// Events appended since `cursor`, plus the new cursor. Lets a
    /// consumer poll at its own cadence without missing or re-reading
    /// milestones.
    pub fn events_since(&self, cursor: usize) -> (&[String], usize) {
        let start = cursor.min(self.log.len());
        (&self.log[start..], self.log.len())
    }

    /// Advisory `{percent, stage, milestone log}` view.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            percent: self.percent,
            stage: self.stage().to_string(),
            milestones: self.log.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================
    // ProgressEstimator
    // =========================================

    #[test]
    fn estimator_is_monotonic_and_capped() {
        let mut est = ProgressEstimator::new(Pace::Fresh);
        let mut last = 0.0;
        for _ in 0..10_000 {
            let now = est.tick();
            assert!(now >= last);
            assert!(now <= SIMULATED_CAP);
            last = now;
        }
    }

    #[test]
    fn cached_pace_outruns_fresh_pace() {
        let mut fresh = ProgressEstimator::new(Pace::Fresh);
        let mut cached = ProgressEstimator::new(Pace::Cached);
        for _ in 0..4 {
            fresh.tick();
            cached.tick();
        }
        assert!(cached.percent() > fresh.percent());
    }

    #[test]
    fn finish_overrides_the_simulation() {
        let mut est = ProgressEstimator::new(Pace::Fresh);
        est.tick();
        est.finish(true);
        assert_eq!(est.percent(), 100.0);
        assert_eq!(est.stage(), "Completed");
        // Ticks after settling are no-ops.
        assert_eq!(est.tick(), 100.0);

        let mut failed = ProgressEstimator::new(Pace::Fresh);
        failed.tick();
        failed.finish(false);
        assert_eq!(failed.percent(), 0.0);
        assert_eq!(failed.stage(), "Failed");
    }

    #[test]
    fn stages_progress_through_the_schedule() {
        let mut est = ProgressEstimator::new(Pace::Fresh);
        est.tick();
        assert_eq!(est.stage(), "Preprocessing documents...");
        for _ in 0..200 {
            est.tick();
        }
        assert_ne!(est.stage(), "Preprocessing documents...");
    }

    // =========================================
    // AuditProgress
    // =========================================

    fn run_ticks(progress: &mut AuditProgress, n: usize) {
        for _ in 0..n {
            progress.tick();
        }
    }

    #[test]
    fn milestones_fire_exactly_once_each() {
        let mut progress = AuditProgress::new();
        run_ticks(&mut progress, 2_000);
        assert_eq!(progress.events().len(), MILESTONES.len());
        for (_, label) in MILESTONES {
            let count = progress.events().iter().filter(|e| *e == label).count();
            assert_eq!(count, 1, "milestone fired more than once: {label}");
        }
    }

    #[test]
    fn milestones_fire_in_threshold_order() {
        let mut progress = AuditProgress::new();
        run_ticks(&mut progress, 2_000);
        let labels: Vec<&str> = progress.events().iter().map(String::as_str).collect();
        let expected: Vec<&str> = MILESTONES.iter().map(|(_, l)| *l).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn audit_simulation_never_reaches_100_on_its_own() {
        let mut progress = AuditProgress::new();
        run_ticks(&mut progress, 10_000);
        assert!(progress.percent() <= AUDIT_CAP);
        progress.finish(true);
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn events_since_is_cursor_stable() {
        let mut progress = AuditProgress::new();
        run_ticks(&mut progress, 40); // crosses the 10% threshold
        let (events, cursor) = progress.events_since(0);
        assert_eq!(events.len(), 1);

        let (none_yet, cursor) = progress.events_since(cursor);
        assert!(none_yet.is_empty());

        run_ticks(&mut progress, 60); // crosses the 25% threshold
        let (fresh, _) = progress.events_since(cursor);
        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].contains("Auditor 2"));
    }

    #[test]
    fn snapshot_reports_stage_and_log() {
        let mut progress = AuditProgress::new();
        let snap = progress.snapshot();
        assert!(snap.stage.contains("Convening"));

        run_ticks(&mut progress, 40);
        progress.finish(false);
        let snap = progress.snapshot();
        assert!(snap.stage.contains("failed"));
        assert!(snap.milestones.len() >= 2);
    }
}
