use crate::config::HoverConfig;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    Collapsed,
    Expanded,
}

/// Governs the collapsed/expanded transition of the island.
///
/// Entering while collapsed expands immediately; leaving never collapses
/// immediately. Instead a recheck is scheduled, and the caller reports
/// whether the pointer is still inside the expanded frame padded by the
/// dwell buffer. Inside the buffer the recheck keeps rescheduling, so a
/// pointer grazing the window edge does not flicker the panel closed.
pub struct HoverExpansion {
    state: ExpansionState,
    recheck_at: Option<Instant>,
    exit_recheck: Duration,
    buffer_recheck: Duration,
}

impl HoverExpansion {
    pub fn new(config: &HoverConfig) -> Self {
        Self {
            state: ExpansionState::Collapsed,
            recheck_at: None,
            exit_recheck: config.exit_recheck,
            buffer_recheck: config.buffer_recheck,
        }
    }

    pub fn state(&self) -> ExpansionState {
        self.state
    }

    pub fn is_expanded(&self) -> bool {
        self.state == ExpansionState::Expanded
    }

    /// Pointer is inside the island. Returns true when this call performed
    /// the Collapsed -> Expanded transition; re-entering while already
    /// expanded only cancels a pending close check.
    pub fn pointer_entered(&mut self, _now: Instant) -> bool {
        self.recheck_at = None;
        if self.state == ExpansionState::Expanded {
            return false;
        }
        self.state = ExpansionState::Expanded;
        true
    }

    /// Pointer left the island. Schedules the first close check; a no-op
    /// while collapsed.
    pub fn pointer_exited(&mut self, now: Instant) {
        if self.state == ExpansionState::Expanded && self.recheck_at.is_none() {
            self.recheck_at = Some(now + self.exit_recheck);
        }
    }

    /// Whether a scheduled close check has come due.
    pub fn recheck_due(&self, now: Instant) -> bool {
        matches!(self.recheck_at, Some(at) if now >= at)
    }

    /// Resolve a due close check. `inside_padded` is the caller's verdict on
    /// whether the pointer sits within the expanded frame plus the dwell
    /// buffer. Returns true when the island collapsed.
    pub fn confirm_exit(&mut self, now: Instant, inside_padded: bool) -> bool {
        if self.state != ExpansionState::Expanded || self.recheck_at.is_none() {
            return false;
        }
        if inside_padded {
            // Hovering the border: keep checking until the pointer commits.
            self.recheck_at = Some(now + self.buffer_recheck);
            return false;
        }
        self.state = ExpansionState::Collapsed;
        self.recheck_at = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> HoverExpansion {
        HoverExpansion::new(&HoverConfig::default())
    }

    #[test]
    fn enter_expands_and_is_idempotent() {
        let mut hover = machine();
        let now = Instant::now();

        assert_eq!(hover.state(), ExpansionState::Collapsed);
        assert!(hover.pointer_entered(now));
        assert_eq!(hover.state(), ExpansionState::Expanded);
        assert!(!hover.pointer_entered(now + Duration::from_millis(10)));
        assert_eq!(hover.state(), ExpansionState::Expanded);
    }

    #[test]
    fn exit_then_outside_collapses_after_one_recheck() {
        let mut hover = machine();
        let start = Instant::now();

        hover.pointer_entered(start);
        hover.pointer_exited(start + Duration::from_secs(1));

        let recheck = start + Duration::from_secs(1) + Duration::from_millis(100);
        assert!(!hover.recheck_due(start + Duration::from_secs(1)));
        assert!(hover.recheck_due(recheck));
        assert!(hover.confirm_exit(recheck, false));
        assert_eq!(hover.state(), ExpansionState::Collapsed);
        assert!(!hover.recheck_due(recheck + Duration::from_secs(10)));
    }

    #[test]
    fn pointer_in_buffer_keeps_rescheduling() {
        let mut hover = machine();
        let start = Instant::now();

        hover.pointer_entered(start);
        hover.pointer_exited(start);

        let first = start + Duration::from_millis(100);
        assert!(!hover.confirm_exit(first, true));
        assert_eq!(hover.state(), ExpansionState::Expanded);

        // Rescheduled half a second out, still expanded until confirmed out.
        assert!(!hover.recheck_due(first + Duration::from_millis(400)));
        let second = first + Duration::from_millis(500);
        assert!(hover.recheck_due(second));
        assert!(!hover.confirm_exit(second, true));

        let third = second + Duration::from_millis(500);
        assert!(hover.confirm_exit(third, false));
        assert_eq!(hover.state(), ExpansionState::Collapsed);
    }

    #[test]
    fn reentry_cancels_pending_close() {
        let mut hover = machine();
        let start = Instant::now();

        hover.pointer_entered(start);
        hover.pointer_exited(start);
        hover.pointer_entered(start + Duration::from_millis(50));

        assert!(!hover.recheck_due(start + Duration::from_secs(1)));
        assert_eq!(hover.state(), ExpansionState::Expanded);
    }

    #[test]
    fn exit_while_collapsed_schedules_nothing() {
        let mut hover = machine();
        let now = Instant::now();

        hover.pointer_exited(now);
        assert!(!hover.recheck_due(now + Duration::from_secs(1)));
        assert!(!hover.confirm_exit(now + Duration::from_secs(1), false));
    }

    #[test]
    fn repeated_exit_does_not_push_recheck_out() {
        let mut hover = machine();
        let start = Instant::now();

        hover.pointer_entered(start);
        hover.pointer_exited(start);
        // A second exit event (e.g. from a child view) must not reset the
        // already-scheduled check.
        hover.pointer_exited(start + Duration::from_millis(90));
        assert!(hover.recheck_due(start + Duration::from_millis(100)));
    }
}
