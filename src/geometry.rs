use crate::hover::ExpansionState;
use eframe::egui;

pub const COLLAPSED_SIZE: egui::Vec2 = egui::Vec2::new(200.0, 45.0);
pub const EXPANDED_SIZE: egui::Vec2 = egui::Vec2::new(700.0, 130.0);

// The island tucks slightly past the top edge so the rounded corners read as
// part of the screen bezel.
pub const TOP_OVERLAP: f32 = 12.0;

pub fn size_for(state: ExpansionState) -> egui::Vec2 {
    match state {
        ExpansionState::Collapsed => COLLAPSED_SIZE,
        ExpansionState::Expanded => EXPANDED_SIZE,
    }
}

/// The frame the island window is supposed to occupy: centered horizontally
/// at the top of the screen, in global top-left coordinates.
pub fn expected_frame(monitor_size: egui::Vec2, state: ExpansionState) -> egui::Rect {
    let size = size_for(state);
    let origin = egui::pos2((monitor_size.x - size.x) / 2.0, -TOP_OVERLAP);
    egui::Rect::from_min_size(origin, size)
}

/// Drift check used by the position monitor: either axis off by more than
/// `tolerance` counts as drifted.
pub fn drifted(actual: egui::Pos2, expected: egui::Pos2, tolerance: f32) -> bool {
    (actual.x - expected.x).abs() > tolerance || (actual.y - expected.y).abs() > tolerance
}

/// Dwell-buffer containment test for the hover close check.
pub fn within_padded(frame: egui::Rect, pointer: egui::Pos2, padding: f32) -> bool {
    frame.expand(padding).contains(pointer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanded_frame_is_centered_on_screen() {
        let monitor = egui::vec2(1440.0, 900.0);
        let frame = expected_frame(monitor, ExpansionState::Expanded);
        assert_eq!(frame.min, egui::pos2(370.0, -12.0));
        assert_eq!(frame.size(), EXPANDED_SIZE);

        let collapsed = expected_frame(monitor, ExpansionState::Collapsed);
        assert_eq!(collapsed.min, egui::pos2(620.0, -12.0));
    }

    #[test]
    fn drift_requires_more_than_tolerance_on_one_axis() {
        let expected = egui::pos2(620.0, -12.0);
        assert!(!drifted(egui::pos2(623.0, -10.0), expected, 5.0));
        assert!(!drifted(egui::pos2(625.0, -12.0), expected, 5.0));
        assert!(drifted(egui::pos2(626.0, -12.0), expected, 5.0));
        assert!(drifted(egui::pos2(620.0, -20.0), expected, 5.0));
    }

    #[test]
    fn padded_frame_admits_border_grazing() {
        let frame = egui::Rect::from_min_size(egui::pos2(370.0, 0.0), EXPANDED_SIZE);
        let just_outside = egui::pos2(365.0, 50.0);
        let well_outside = egui::pos2(340.0, 50.0);

        assert!(!frame.contains(just_outside));
        assert!(within_padded(frame, just_outside, 10.0));
        assert!(!within_padded(frame, well_outside, 10.0));
    }
}
