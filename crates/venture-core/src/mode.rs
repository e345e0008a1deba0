//! UI density mode detection.
//!
//! Maps project progress to one of three layout modes, deciding how much
//! structural chrome (navigation rail, side panel) the shell shows. The
//! function is pure and total; callers recompute it on every render.

use serde::{Deserialize, Serialize};

use crate::project::{Phase, ProjectSnapshot};

/// How much structural chrome the shell should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    Chat,
    Hybrid,
    Dashboard,
}

/// Phases whose projects tend to accumulate a large artifact backlog.
const DASHBOARD_PHASES: [Phase; 3] = [Phase::Development, Phase::Marketing, Phase::Fundraising];

/// Mid-journey phases that always warrant the split layout.
const HYBRID_PHASES: [Phase; 2] = [Phase::Branding, Phase::Validation];

/// Picks the UI mode for a project. First matching rule wins.
pub fn detect_mode(project: &ProjectSnapshot) -> UiMode {
    let count = project.artifact_count;

    // 20+ artifacts always triggers dashboard
    if count >= 20 {
        return UiMode::Dashboard;
    }

    // Late phases with a full backlog. The threshold matches the rule
    // above, which already returned; kept as shipped until product decides
    // whether late phases should force dashboard at lower counts.
    if DASHBOARD_PHASES.contains(&project.phase) && count >= 20 {
        return UiMode::Dashboard;
    }

    // Hybrid for mid-phases or 5-19 artifacts
    if HYBRID_PHASES.contains(&project.phase) || count >= 5 {
        return UiMode::Hybrid;
    }

    UiMode::Chat
}

/// Mode for an optional project: no loaded project means a bare chat view.
pub fn adaptive_mode(project: Option<&ProjectSnapshot>) -> UiMode {
    match project {
        Some(snapshot) => detect_mode(snapshot),
        None => UiMode::Chat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(phase: Phase, artifact_count: u32) -> ProjectSnapshot {
        ProjectSnapshot::new(phase, artifact_count)
    }

    #[test]
    fn test_chat_for_discovery_with_few_artifacts() {
        assert_eq!(detect_mode(&snapshot(Phase::Discovery, 0)), UiMode::Chat);
        assert_eq!(detect_mode(&snapshot(Phase::Discovery, 4)), UiMode::Chat);
    }

    #[test]
    fn test_hybrid_for_branding_and_validation_regardless_of_count() {
        assert_eq!(detect_mode(&snapshot(Phase::Branding, 0)), UiMode::Hybrid);
        assert_eq!(detect_mode(&snapshot(Phase::Validation, 0)), UiMode::Hybrid);
        assert_eq!(detect_mode(&snapshot(Phase::Branding, 5)), UiMode::Hybrid);
        assert_eq!(detect_mode(&snapshot(Phase::Validation, 6)), UiMode::Hybrid);
    }

    #[test]
    fn test_hybrid_between_five_and_nineteen_artifacts() {
        assert_eq!(detect_mode(&snapshot(Phase::Discovery, 5)), UiMode::Hybrid);
        assert_eq!(detect_mode(&snapshot(Phase::Discovery, 10)), UiMode::Hybrid);
        assert_eq!(detect_mode(&snapshot(Phase::Discovery, 19)), UiMode::Hybrid);
    }

    #[test]
    fn test_late_phase_below_twenty_stays_hybrid() {
        // A "dashboard phase" alone is not enough; the count rule catches
        // it at 5..=19 first.
        assert_eq!(
            detect_mode(&snapshot(Phase::Development, 19)),
            UiMode::Hybrid
        );
    }

    #[test]
    fn test_dashboard_at_twenty_for_every_phase() {
        for phase in [
            Phase::Discovery,
            Phase::Branding,
            Phase::Validation,
            Phase::Development,
            Phase::Marketing,
            Phase::Fundraising,
        ] {
            assert_eq!(detect_mode(&snapshot(phase, 20)), UiMode::Dashboard);
            assert_eq!(detect_mode(&snapshot(phase, 25)), UiMode::Dashboard);
        }
    }

    #[test]
    fn test_detection_is_deterministic() {
        let project = snapshot(Phase::Marketing, 12);
        let first = detect_mode(&project);
        for _ in 0..100 {
            assert_eq!(detect_mode(&project), first);
        }
    }

    #[test]
    fn test_adaptive_mode_defaults_to_chat_without_project() {
        assert_eq!(adaptive_mode(None), UiMode::Chat);
        assert_eq!(
            adaptive_mode(Some(&snapshot(Phase::Fundraising, 30))),
            UiMode::Dashboard
        );
    }
}
