//! Thin AppKit shims. Everything here degrades to a no-op off macOS so the
//! logic crates and tests build anywhere.

/// Haptic feedback on the expand transition. Pattern choice mirrors the
/// "alignment" pulse AppKit uses for snapping interactions.
#[cfg(target_os = "macos")]
pub fn haptic_pulse() {
    use objc2_app_kit::{
        NSHapticFeedbackManager, NSHapticFeedbackPattern, NSHapticFeedbackPerformanceTime,
        NSHapticFeedbackPerformer,
    };

    #[allow(unused_unsafe)]
    unsafe {
        let performer = NSHapticFeedbackManager::defaultPerformer();
        performer.performFeedbackPattern_performanceTime(
            NSHapticFeedbackPattern::Alignment,
            NSHapticFeedbackPerformanceTime::Now,
        );
    }
}

#[cfg(not(target_os = "macos"))]
pub fn haptic_pulse() {}

/// Global pointer position in screen points, bottom-left origin (AppKit
/// convention). The hover close check needs the pointer even when it is
/// outside our window, which the UI toolkit cannot report.
#[cfg(target_os = "macos")]
pub fn global_pointer_position() -> Option<(f64, f64)> {
    use objc2_app_kit::NSEvent;

    #[allow(unused_unsafe)]
    let location = unsafe { NSEvent::mouseLocation() };
    Some((location.x, location.y))
}

#[cfg(not(target_os = "macos"))]
pub fn global_pointer_position() -> Option<(f64, f64)> {
    None
}
