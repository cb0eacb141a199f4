//! Window lookup for capture.

use tracing::debug;

/// A window reported by the host capture subsystem.
#[derive(Debug, Clone)]
pub struct WindowInfo {
    /// Opaque host window identifier.
    pub id: String,

    /// Window title.
    pub title: String,

    /// Window dimensions.
    pub width: u32,
    pub height: u32,

    /// Whether the window is currently on screen.
    pub on_screen: bool,
}

/// Select the first on-screen window whose title contains `target`
/// (case-sensitive substring match).
pub fn find_target_window<'a>(windows: &'a [WindowInfo], target: &str) -> Option<&'a WindowInfo> {
    let found = windows
        .iter()
        .find(|w| w.on_screen && w.title.contains(target));

    debug!(
        target,
        matched = found.map(|w| w.title.as_str()),
        candidates = windows.len(),
        "window lookup"
    );

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(title: &str, on_screen: bool) -> WindowInfo {
        WindowInfo {
            id: format!("window:{title}"),
            title: title.to_string(),
            width: 1080,
            height: 2400,
            on_screen,
        }
    }

    #[test]
    fn matches_by_substring() {
        let windows = vec![window("Terminal", true), window("Pixel 7 — scrcpy", true)];
        let found = find_target_window(&windows, "Pixel 7").unwrap();
        assert_eq!(found.title, "Pixel 7 — scrcpy");
    }

    #[test]
    fn match_is_case_sensitive() {
        let windows = vec![window("pixel 7 — scrcpy", true)];
        assert!(find_target_window(&windows, "Pixel 7").is_none());
    }

    #[test]
    fn first_match_wins() {
        let windows = vec![
            window("Pixel 7 — scrcpy", true),
            window("Pixel 7 Pro — scrcpy", true),
        ];
        let found = find_target_window(&windows, "Pixel 7").unwrap();
        assert_eq!(found.title, "Pixel 7 — scrcpy");
    }

    #[test]
    fn off_screen_windows_are_skipped() {
        let windows = vec![
            window("Pixel 7 — scrcpy", false),
            window("Pixel 7 Pro — scrcpy", true),
        ];
        let found = find_target_window(&windows, "Pixel 7").unwrap();
        assert_eq!(found.title, "Pixel 7 Pro — scrcpy");
    }
}
