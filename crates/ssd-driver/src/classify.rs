//! Minimum-distance reduction
//!
//! Distances arrive one at a time, in template ID order. The reduction keeps
//! the first template to reach the smallest distance: replacement requires a
//! strictly smaller value, so ties resolve to the lowest ID.

use crate::distance::Distance;
use crate::template::TemplateId;

/// Label reported when no template has been accepted.
pub const NO_MATCH: &str = "no match";

/// One comparison result, as emitted to the reporting collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceReport {
    /// Template compared against
    pub template_id: TemplateId,
    /// Template label
    pub label: String,
    /// Reported SSD
    pub distance: Distance,
}

/// Template holding the current minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMatch {
    /// Template ID
    pub template_id: TemplateId,
    /// Template label
    pub label: String,
}

/// Running minimum over one classification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    best: Option<BestMatch>,
    distance: Distance,
}

impl Classification {
    /// Empty result: no match, distance `u32::MAX`.
    pub const fn new() -> Self {
        Self {
            best: None,
            distance: Distance::MAX,
        }
    }

    /// Fold one comparison in. Returns true if it became the new best.
    pub fn observe(&mut self, template_id: TemplateId, label: &str, distance: Distance) -> bool {
        if distance < self.distance {
            self.best = Some(BestMatch {
                template_id,
                label: label.to_string(),
            });
            self.distance = distance;
            true
        } else {
            false
        }
    }

    /// Fold a report in.
    pub fn observe_report(&mut self, report: &DistanceReport) -> bool {
        self.observe(report.template_id, &report.label, report.distance)
    }

    /// Winning template, if any distance was below the sentinel.
    pub const fn best(&self) -> Option<&BestMatch> {
        self.best.as_ref()
    }

    /// Winning label, or [`NO_MATCH`].
    pub fn label(&self) -> &str {
        self.best.as_ref().map_or(NO_MATCH, |b| b.label.as_str())
    }

    /// Minimum distance seen (`u32::MAX` if none).
    pub const fn distance(&self) -> Distance {
        self.distance
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u8) -> TemplateId {
        TemplateId::new(raw)
    }

    #[test]
    fn starts_with_sentinel() {
        let c = Classification::new();
        assert!(c.best().is_none());
        assert_eq!(c.label(), NO_MATCH);
        assert_eq!(c.distance(), Distance::MAX);
    }

    #[test]
    fn keeps_strict_minimum() {
        let mut c = Classification::new();
        assert!(c.observe(id(0), "A", Distance::new(50)));
        assert!(!c.observe(id(1), "B", Distance::new(70)));
        assert!(c.observe(id(2), "C", Distance::new(10)));
        assert_eq!(c.label(), "C");
        assert_eq!(c.distance(), Distance::new(10));
    }

    #[test]
    fn tie_keeps_first_seen() {
        let mut c = Classification::new();
        c.observe(id(3), "first", Distance::new(7));
        assert!(!c.observe(id(4), "second", Distance::new(7)));
        assert_eq!(c.best().unwrap().template_id, id(3));
    }

    #[test]
    fn max_distance_never_matches() {
        let mut c = Classification::new();
        assert!(!c.observe(id(0), "A", Distance::MAX));
        assert_eq!(c.label(), NO_MATCH);
    }
}
