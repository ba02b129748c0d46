//! Selection presenter: turns selector output and device mode into
//! tooltip/sheet commands for the chart renderer.
//!
//! The state machine is Idle -> Tooltip/Sheet -> Idle. Hides are
//! debounced against the logical clock so moving across adjacent hover
//! regions does not flicker; the renderer polls deadlines, no
//! background timers exist.

use crate::output;
use crate::selector;
use crate::types::{DeviceMode, LocationSeries};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Debounce before a scheduled hide takes effect.
const HIDE_DELAY_MS: i64 = 100;
/// Drag distance (px) past which releasing the sheet handle dismisses it.
const SHEET_DISMISS_DISTANCE: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Events forwarded by the chart renderer, already resolved from pixel
/// space to a date through the renderer's scale.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    PointerMove { date: NaiveDate, anchor: Point },
    PointerLeave,
    TouchStart { date: NaiveDate, anchor: Point },
    TouchMove { date: NaiveDate },
    Close,
    ModeChange(DeviceMode),
    /// Underlying series set changed (resize, location add/remove).
    SeriesChanged,
}

/// Commands issued back to the renderer. The engine never touches
/// drawing state directly.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCommand {
    ShowTooltip { text: String, anchor: Point },
    ShowSheet { text: String },
    DrawMarkers { date: NaiveDate },
    ClearMarkers,
    HideTooltip,
    HideSheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveMode {
    None,
    Tooltip,
    Sheet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub active_date: Option<NaiveDate>,
    pub active_mode: ActiveMode,
    pub pending_hide_at: Option<DateTime<Utc>>,
}

impl SelectionState {
    fn idle() -> Self {
        Self {
            active_date: None,
            active_mode: ActiveMode::None,
            pending_hide_at: None,
        }
    }
}

pub struct SelectionPresenter {
    mode: DeviceMode,
    state: SelectionState,
}

impl SelectionPresenter {
    pub fn new(mode: DeviceMode) -> Self {
        Self {
            mode,
            state: SelectionState::idle(),
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// Feed one renderer event. Returns the commands to apply, in order.
    pub fn handle_event(
        &mut self,
        event: SelectionEvent,
        datasets: &[LocationSeries],
        now: DateTime<Utc>,
    ) -> Vec<PresenterCommand> {
        match event {
            SelectionEvent::PointerMove { date, anchor } => {
                if self.mode != DeviceMode::Desktop {
                    return Vec::new();
                }
                self.show_tooltip(date, anchor, datasets)
            }
            SelectionEvent::PointerLeave => {
                if self.state.active_mode == ActiveMode::Tooltip {
                    // Cancel-and-replace: only the latest leave counts.
                    self.state.pending_hide_at = Some(now + Duration::milliseconds(HIDE_DELAY_MS));
                }
                Vec::new()
            }
            SelectionEvent::TouchStart { date, .. } => {
                if self.mode != DeviceMode::Mobile {
                    return Vec::new();
                }
                self.show_sheet(date, datasets)
            }
            // A dragging finger must not scrub the selection; a new
            // discrete tap is required.
            SelectionEvent::TouchMove { .. } => Vec::new(),
            SelectionEvent::Close => self.reset(),
            SelectionEvent::ModeChange(mode) => {
                let commands = if self.mode != mode { self.reset() } else { Vec::new() };
                self.mode = mode;
                commands
            }
            SelectionEvent::SeriesChanged => self.reset(),
        }
    }

    /// Fire any elapsed hide deadline. Renderer calls this from its
    /// timer tick.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<PresenterCommand> {
        match self.state.pending_hide_at {
            Some(deadline) if deadline <= now => self.reset(),
            _ => Vec::new(),
        }
    }

    /// Whether releasing the sheet handle after dragging `distance`
    /// pixels should dismiss it.
    pub fn sheet_drag_dismisses(distance: f64) -> bool {
        distance > SHEET_DISMISS_DISTANCE
    }

    fn show_tooltip(
        &mut self,
        date: NaiveDate,
        anchor: Point,
        datasets: &[LocationSeries],
    ) -> Vec<PresenterCommand> {
        let Some(primary) = primary_dataset(datasets) else {
            return Vec::new();
        };
        let Some(sample) = selector::nearest(&primary.series, date) else {
            return Vec::new();
        };
        let selected = sample.date;

        // Re-entering the same sample only cancels a pending hide.
        self.state.pending_hide_at = None;
        if self.state.active_mode == ActiveMode::Tooltip
            && self.state.active_date == Some(selected)
        {
            return Vec::new();
        }

        let Some(text) = output::tooltip_text(datasets, selected) else {
            return Vec::new();
        };
        self.state.active_date = Some(selected);
        self.state.active_mode = ActiveMode::Tooltip;
        vec![
            PresenterCommand::ClearMarkers,
            PresenterCommand::DrawMarkers { date: selected },
            PresenterCommand::ShowTooltip { text, anchor },
        ]
    }

    fn show_sheet(&mut self, date: NaiveDate, datasets: &[LocationSeries]) -> Vec<PresenterCommand> {
        let Some(primary) = primary_dataset(datasets) else {
            return Vec::new();
        };
        let Some(sample) = selector::nearest(&primary.series, date) else {
            return Vec::new();
        };
        let selected = sample.date;

        if self.state.active_mode == ActiveMode::Sheet && self.state.active_date == Some(selected) {
            return Vec::new();
        }

        // The sheet mirrors the stats card: primary location only.
        let Some(text) = output::sheet_text(primary, selected) else {
            return Vec::new();
        };
        self.state.active_date = Some(selected);
        self.state.active_mode = ActiveMode::Sheet;
        self.state.pending_hide_at = None;
        vec![
            PresenterCommand::ClearMarkers,
            PresenterCommand::DrawMarkers { date: selected },
            PresenterCommand::ShowSheet { text },
        ]
    }

    fn reset(&mut self) -> Vec<PresenterCommand> {
        let was = self.state.active_mode;
        self.state = SelectionState::idle();
        match was {
            ActiveMode::None => Vec::new(),
            ActiveMode::Tooltip => {
                vec![PresenterCommand::HideTooltip, PresenterCommand::ClearMarkers]
            }
            ActiveMode::Sheet => {
                vec![PresenterCommand::HideSheet, PresenterCommand::ClearMarkers]
            }
        }
    }
}

/// The primary dataset, falling back to the first one, as the chart
/// renderer does.
pub fn primary_dataset(datasets: &[LocationSeries]) -> Option<&LocationSeries> {
    datasets
        .iter()
        .find(|d| d.location.is_primary)
        .or_else(|| datasets.first())
}

/// Positions floating content next to its anchor while keeping it fully
/// on-screen: desktop content prefers the right of the anchor and flips
/// left near the edge; mobile content prefers above and flips below.
/// Clamping to the viewport margin is the last resort.
pub fn place_content(viewport: Size, content: Size, anchor: Point, mode: DeviceMode) -> Point {
    const MARGIN: f64 = 20.0;
    const OFFSET: f64 = 40.0;
    const MOBILE_GAP: f64 = 16.0;

    let (mut x, mut y) = match mode {
        DeviceMode::Desktop => {
            let mut x = anchor.x + OFFSET;
            if x + content.width > viewport.width - MARGIN {
                x = anchor.x - content.width - OFFSET;
            }
            (x, anchor.y - content.height / 2.0)
        }
        DeviceMode::Mobile => {
            let mut y = anchor.y - content.height - MOBILE_GAP;
            if y < MARGIN {
                y = anchor.y + MOBILE_GAP;
            }
            (anchor.x - content.width / 2.0, y)
        }
    };

    x = x.clamp(MARGIN, (viewport.width - content.width - MARGIN).max(MARGIN));
    y = y.clamp(MARGIN, (viewport.height - content.height - MARGIN).max(MARGIN));
    Point { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DailySample, Location, YearSeries};
    use chrono::TimeZone;

    fn sample(date: NaiveDate, daylight: f64) -> DailySample {
        DailySample {
            date,
            sunrise: Some(date.and_hms_opt(6, 0, 0).unwrap().and_utc()),
            sunset: Some(date.and_hms_opt(18, 0, 0).unwrap().and_utc()),
            solar_noon: date.and_hms_opt(12, 0, 0).unwrap().and_utc(),
            max_altitude: 45.0,
            altitude_9am: 25.0,
            altitude_3pm: 30.0,
            daylight_hours: daylight,
            is_polar_extreme: false,
            is_today: false,
            change_minutes: 1.5,
        }
    }

    fn datasets() -> Vec<LocationSeries> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let samples: Vec<_> = (0..60)
            .map(|i| sample(start + Duration::days(i), 10.0 + i as f64 * 0.03))
            .collect();
        let mut location = Location::new("New York, NY", 40.7128, -74.006);
        location.is_primary = true;
        location.timezone_offset = Some(-5);
        vec![LocationSeries {
            location,
            series: YearSeries::new(40.7128, -74.006, samples),
        }]
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn anchor() -> Point {
        Point { x: 300.0, y: 150.0 }
    }

    #[test]
    fn test_pointer_move_shows_tooltip_once() {
        let data = datasets();
        let mut presenter = SelectionPresenter::new(DeviceMode::Desktop);

        let commands = presenter.handle_event(
            SelectionEvent::PointerMove { date: day(5), anchor: anchor() },
            &data,
            t0(),
        );
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[2], PresenterCommand::ShowTooltip { .. }));
        assert_eq!(presenter.state().active_mode, ActiveMode::Tooltip);

        // Same sample again: suppressed.
        let commands = presenter.handle_event(
            SelectionEvent::PointerMove { date: day(5), anchor: anchor() },
            &data,
            t0(),
        );
        assert!(commands.is_empty());
    }

    #[test]
    fn test_leave_then_reenter_cancels_hide() {
        let data = datasets();
        let mut presenter = SelectionPresenter::new(DeviceMode::Desktop);
        presenter.handle_event(
            SelectionEvent::PointerMove { date: day(5), anchor: anchor() },
            &data,
            t0(),
        );
        presenter.handle_event(SelectionEvent::PointerLeave, &data, t0());
        assert!(presenter.state().pending_hide_at.is_some());

        // Re-enter within the debounce window.
        presenter.handle_event(
            SelectionEvent::PointerMove { date: day(5), anchor: anchor() },
            &data,
            t0() + Duration::milliseconds(50),
        );
        assert!(presenter.state().pending_hide_at.is_none());
        assert!(presenter.poll(t0() + Duration::milliseconds(200)).is_empty());
        assert_eq!(presenter.state().active_mode, ActiveMode::Tooltip);
    }

    #[test]
    fn test_hide_fires_after_debounce() {
        let data = datasets();
        let mut presenter = SelectionPresenter::new(DeviceMode::Desktop);
        presenter.handle_event(
            SelectionEvent::PointerMove { date: day(5), anchor: anchor() },
            &data,
            t0(),
        );
        presenter.handle_event(SelectionEvent::PointerLeave, &data, t0());

        assert!(presenter.poll(t0() + Duration::milliseconds(99)).is_empty());
        let commands = presenter.poll(t0() + Duration::milliseconds(100));
        assert_eq!(
            commands,
            vec![PresenterCommand::HideTooltip, PresenterCommand::ClearMarkers]
        );
        assert_eq!(presenter.state().active_mode, ActiveMode::None);
    }

    #[test]
    fn test_touch_start_shows_sheet_immediately() {
        let data = datasets();
        let mut presenter = SelectionPresenter::new(DeviceMode::Mobile);
        let commands = presenter.handle_event(
            SelectionEvent::TouchStart { date: day(7), anchor: anchor() },
            &data,
            t0(),
        );
        assert!(matches!(commands[2], PresenterCommand::ShowSheet { .. }));
        assert_eq!(presenter.state().active_mode, ActiveMode::Sheet);
    }

    #[test]
    fn test_touch_move_is_ignored() {
        let data = datasets();
        let mut presenter = SelectionPresenter::new(DeviceMode::Mobile);
        presenter.handle_event(
            SelectionEvent::TouchStart { date: day(7), anchor: anchor() },
            &data,
            t0(),
        );
        let commands =
            presenter.handle_event(SelectionEvent::TouchMove { date: day(20) }, &data, t0());
        assert!(commands.is_empty());
        assert_eq!(presenter.state().active_date, Some(day(7)));
    }

    #[test]
    fn test_mode_flip_forces_idle() {
        let data = datasets();
        let mut presenter = SelectionPresenter::new(DeviceMode::Desktop);
        presenter.handle_event(
            SelectionEvent::PointerMove { date: day(5), anchor: anchor() },
            &data,
            t0(),
        );
        presenter.handle_event(SelectionEvent::PointerLeave, &data, t0());

        let commands = presenter.handle_event(
            SelectionEvent::ModeChange(DeviceMode::Mobile),
            &data,
            t0(),
        );
        assert_eq!(
            commands,
            vec![PresenterCommand::HideTooltip, PresenterCommand::ClearMarkers]
        );
        assert!(presenter.state().pending_hide_at.is_none());
        assert_eq!(presenter.mode(), DeviceMode::Mobile);
    }

    #[test]
    fn test_empty_series_is_a_noop() {
        let mut presenter = SelectionPresenter::new(DeviceMode::Desktop);
        let commands = presenter.handle_event(
            SelectionEvent::PointerMove { date: day(5), anchor: anchor() },
            &[],
            t0(),
        );
        assert!(commands.is_empty());
        assert_eq!(presenter.state().active_mode, ActiveMode::None);
    }

    #[test]
    fn test_sheet_dismiss_threshold() {
        assert!(!SelectionPresenter::sheet_drag_dismisses(40.0));
        assert!(SelectionPresenter::sheet_drag_dismisses(120.0));
    }

    #[test]
    fn test_place_content_desktop_flips_left_near_edge() {
        let viewport = Size { width: 1000.0, height: 600.0 };
        let content = Size { width: 200.0, height: 100.0 };

        let right = place_content(viewport, content, Point { x: 100.0, y: 300.0 }, DeviceMode::Desktop);
        assert_eq!(right.x, 140.0);
        assert_eq!(right.y, 250.0);

        let left = place_content(viewport, content, Point { x: 900.0, y: 300.0 }, DeviceMode::Desktop);
        assert_eq!(left.x, 660.0);
    }

    #[test]
    fn test_place_content_clamps_vertically() {
        let viewport = Size { width: 1000.0, height: 600.0 };
        let content = Size { width: 200.0, height: 100.0 };
        let top = place_content(viewport, content, Point { x: 500.0, y: 10.0 }, DeviceMode::Desktop);
        assert_eq!(top.y, 20.0);
        let bottom =
            place_content(viewport, content, Point { x: 500.0, y: 590.0 }, DeviceMode::Desktop);
        assert_eq!(bottom.y, 480.0);
    }

    #[test]
    fn test_place_content_mobile_above_then_below() {
        let viewport = Size { width: 400.0, height: 800.0 };
        let content = Size { width: 300.0, height: 150.0 };

        let above = place_content(viewport, content, Point { x: 200.0, y: 500.0 }, DeviceMode::Mobile);
        assert_eq!(above.y, 334.0);

        let below = place_content(viewport, content, Point { x: 200.0, y: 100.0 }, DeviceMode::Mobile);
        assert_eq!(below.y, 116.0);
    }
}
