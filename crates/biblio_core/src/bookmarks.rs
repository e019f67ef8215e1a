//! crates/biblio_core/src/bookmarks.rs
//!
//! Per-title reading positions ("pins") and the reading screen's bookmark
//! state machine.
//!
//! A pin is the vertical scroll offset the reader last bookmarked for a book,
//! stored under `pin_<title>` in the device key-value store so it survives
//! restarts. The state machine cycles between `Pin`, `Aiming` and `Goto`:
//!
//! ```text
//!   mount: Goto if a pin exists, else Pin
//!   Pin    --press-->     Aiming
//!   Aiming --tap text-->  Goto    (commits the sampled scroll offset)
//!   Goto   --press-->     Pin     (jumps to the pin and flashes a highlight)
//!   any    --long press-> Pin     (clears the pin)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::BookmarkRecord;
use crate::ports::{KeyValueStore, PortError, PortResult};

/// Minimum spacing between two accepted scroll samples.
pub const SCROLL_SAMPLE_INTERVAL: Duration = Duration::from_millis(16);

//=========================================================================================
// ReadingPositionStore
//=========================================================================================

/// Durable per-title scroll offsets backed by a `KeyValueStore`.
#[derive(Clone)]
pub struct ReadingPositionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ReadingPositionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Returns the stored offset for `title`.
    ///
    /// Never fails: a storage error or a corrupt entry is logged and reported
    /// as "no pin".
    pub async fn get_pin(&self, title: &str) -> Option<f64> {
        let key = BookmarkRecord::key_for(title);
        match self.kv.get(&key).await {
            Ok(Some(raw)) => match parse_offset(&raw) {
                Some(offset) => Some(offset),
                None => {
                    warn!(%key, value = %raw, "Ignoring corrupt reading position");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%key, "Failed to load reading position: {}", e);
                None
            }
        }
    }

    /// Stores `offset` for `title`, overwriting any previous pin.
    pub async fn set_pin(&self, title: &str, offset: f64) -> PortResult<()> {
        if !offset.is_finite() || offset < 0.0 {
            return Err(PortError::InvalidInput(format!(
                "scroll offset must be a non-negative number, got {}",
                offset
            )));
        }
        let key = BookmarkRecord::key_for(title);
        self.kv.set(&key, &offset.to_string()).await?;
        debug!(%key, offset, "Reading position saved");
        Ok(())
    }

    /// Removes the pin for `title`. Clearing an absent pin is a no-op.
    pub async fn clear_pin(&self, title: &str) -> PortResult<()> {
        self.kv.remove(&BookmarkRecord::key_for(title)).await
    }

    /// Every stored pin on this device. Corrupt entries are skipped.
    pub async fn bookmarks(&self) -> PortResult<Vec<BookmarkRecord>> {
        let mut records = Vec::new();
        for key in self.kv.list_keys().await? {
            let Some(title) = BookmarkRecord::title_from_key(&key) else {
                continue;
            };
            if let Some(offset) = self.get_pin(title).await {
                records.push(BookmarkRecord {
                    book_title: title.to_string(),
                    scroll_offset: offset,
                });
            }
        }
        records.sort_by(|a, b| a.book_title.cmp(&b.book_title));
        Ok(records)
    }
}

fn parse_offset(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

//=========================================================================================
// Reader themes
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReaderTheme {
    Light,
    #[default]
    Vintage,
    Midnight,
}

/// Colors used by the reading surface, as `#rrggbb` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub background: &'static str,
    pub text: &'static str,
    pub title: &'static str,
    pub highlight: &'static str,
}

impl ReaderTheme {
    pub const ALL: [ReaderTheme; 3] = [ReaderTheme::Light, ReaderTheme::Vintage, ReaderTheme::Midnight];

    pub fn palette(self) -> ThemePalette {
        match self {
            ReaderTheme::Light => ThemePalette {
                background: "#FFFFFF",
                text: "#2c3e50",
                title: "#0072ff",
                highlight: "#FFD700",
            },
            ReaderTheme::Vintage => ThemePalette {
                background: "#f4ecd8",
                text: "#5b4636",
                title: "#8b4513",
                highlight: "#d4a373",
            },
            ReaderTheme::Midnight => ThemePalette {
                background: "#1a1a2e",
                text: "#e0e0e0",
                title: "#4cc9f0",
                highlight: "#4834d4",
            },
        }
    }
}

//=========================================================================================
// ReadingSession (state machine for one reading screen)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// No bookmark to jump to, or the last one was just consumed.
    Pin,
    /// A bookmark exists and the control offers to jump to it.
    Goto,
    /// The next tap on the text commits the current scroll offset.
    Aiming,
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinMode::Pin => write!(f, "PIN"),
            PinMode::Goto => write!(f, "GOTO"),
            PinMode::Aiming => write!(f, "AIMING"),
        }
    }
}

/// Timing of the line flash shown after jumping to a bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub fade_in: Duration,
    pub hold: Duration,
    pub fade_out: Duration,
}

impl Highlight {
    pub const STANDARD: Highlight = Highlight {
        fade_in: Duration::from_millis(400),
        hold: Duration::from_millis(3000),
        fade_out: Duration::from_millis(800),
    };

    /// Time until the highlight starts fading out.
    pub fn visible_for(&self) -> Duration {
        self.fade_in + self.hold
    }

    pub fn total(&self) -> Duration {
        self.fade_in + self.hold + self.fade_out
    }
}

/// What the UI should do after the bookmark control was pressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Prompt the reader to scroll to their line and tap the text.
    StartAiming,
    /// Animate the scroll view to `offset` and flash the highlight.
    Jump { offset: f64, highlight: Highlight },
}

/// Bookmark state of one open reading screen.
pub struct ReadingSession {
    title: String,
    store: ReadingPositionStore,
    mode: PinMode,
    bookmarked: Option<f64>,
    current_scroll: f64,
    last_sample: Option<Instant>,
    theme: ReaderTheme,
}

impl ReadingSession {
    /// Opens the reading screen for `title`, starting in `Goto` when a pin is stored.
    pub async fn mount(store: ReadingPositionStore, title: impl Into<String>) -> Self {
        let title = title.into();
        let bookmarked = store.get_pin(&title).await;
        let mode = if bookmarked.is_some() {
            PinMode::Goto
        } else {
            PinMode::Pin
        };
        Self {
            title,
            store,
            mode,
            bookmarked,
            current_scroll: 0.0,
            last_sample: None,
            theme: ReaderTheme::default(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mode(&self) -> PinMode {
        self.mode
    }

    pub fn bookmarked(&self) -> Option<f64> {
        self.bookmarked
    }

    pub fn current_scroll(&self) -> f64 {
        self.current_scroll
    }

    pub fn theme(&self) -> ReaderTheme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: ReaderTheme) {
        self.theme = theme;
    }

    /// Text shown on the bookmark control.
    pub fn control_label(&self) -> String {
        match self.mode {
            PinMode::Aiming => "TAP TEXT".to_string(),
            mode => mode.to_string(),
        }
    }

    /// Records a scroll event. The latest offset is always tracked so a tap
    /// commits where the view came to rest; returns `true` only for events at
    /// least `SCROLL_SAMPLE_INTERVAL` after the previous reported sample.
    pub fn on_scroll(&mut self, offset: f64, at: Instant) -> bool {
        self.current_scroll = offset.max(0.0);
        if let Some(last) = self.last_sample {
            if at.saturating_duration_since(last) < SCROLL_SAMPLE_INTERVAL {
                return false;
            }
        }
        self.last_sample = Some(at);
        true
    }

    /// Handles a press on the bookmark control.
    pub fn press_control(&mut self) -> ControlAction {
        match (self.mode, self.bookmarked) {
            (PinMode::Goto, Some(offset)) => {
                self.mode = PinMode::Pin;
                ControlAction::Jump {
                    offset,
                    highlight: Highlight::STANDARD,
                }
            }
            _ => {
                self.mode = PinMode::Aiming;
                ControlAction::StartAiming
            }
        }
    }

    /// Handles a tap on the reading surface.
    ///
    /// Only commits while aiming; returns the saved offset in that case. If the
    /// store rejects the write the session stays in `Aiming`.
    pub async fn tap_text(&mut self) -> PortResult<Option<f64>> {
        if self.mode != PinMode::Aiming {
            return Ok(None);
        }
        let offset = self.current_scroll;
        self.store.set_pin(&self.title, offset).await?;
        self.bookmarked = Some(offset);
        self.mode = PinMode::Goto;
        Ok(Some(offset))
    }

    /// Handles a long press on the bookmark control: clears the pin.
    pub async fn long_press(&mut self) -> PortResult<()> {
        self.bookmarked = None;
        self.mode = PinMode::Pin;
        self.store.clear_pin(&self.title).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingStore, MemoryKv};

    fn store() -> (Arc<MemoryKv>, ReadingPositionStore) {
        let kv = Arc::new(MemoryKv::default());
        (kv.clone(), ReadingPositionStore::new(kv))
    }

    #[tokio::test]
    async fn set_then_get_returns_offset() {
        let (_, pins) = store();
        for (title, offset) in [("Dune", 0.0), ("Emma", 12.5), ("Ulysses", 98765.25)] {
            pins.set_pin(title, offset).await.unwrap();
            assert_eq!(pins.get_pin(title).await, Some(offset));
        }
    }

    #[tokio::test]
    async fn set_overwrites_previous_pin() {
        let (_, pins) = store();
        pins.set_pin("Dune", 10.0).await.unwrap();
        pins.set_pin("Dune", 20.0).await.unwrap();
        assert_eq!(pins.get_pin("Dune").await, Some(20.0));
    }

    #[tokio::test]
    async fn clear_removes_pin_and_is_idempotent() {
        let (_, pins) = store();
        pins.clear_pin("Dune").await.unwrap();
        assert_eq!(pins.get_pin("Dune").await, None);

        pins.set_pin("Dune", 33.0).await.unwrap();
        pins.clear_pin("Dune").await.unwrap();
        pins.clear_pin("Dune").await.unwrap();
        assert_eq!(pins.get_pin("Dune").await, None);
    }

    #[tokio::test]
    async fn pins_are_independent_per_title() {
        let (_, pins) = store();
        pins.set_pin("Dune", 5.0).await.unwrap();
        pins.set_pin("Emma", 7.0).await.unwrap();
        pins.set_pin("Dune", 9.0).await.unwrap();
        pins.clear_pin("Dune").await.unwrap();
        assert_eq!(pins.get_pin("Emma").await, Some(7.0));
    }

    #[tokio::test]
    async fn negative_or_nan_offsets_are_rejected() {
        let (_, pins) = store();
        assert!(matches!(
            pins.set_pin("Dune", -1.0).await,
            Err(PortError::InvalidInput(_))
        ));
        assert!(pins.set_pin("Dune", f64::NAN).await.is_err());
        assert_eq!(pins.get_pin("Dune").await, None);
    }

    #[tokio::test]
    async fn corrupt_entry_reads_as_absent() {
        let (kv, pins) = store();
        kv.set("pin_Dune", "not-a-number").await.unwrap();
        assert_eq!(pins.get_pin("Dune").await, None);
    }

    #[tokio::test]
    async fn storage_failure_reads_as_absent() {
        let pins = ReadingPositionStore::new(Arc::new(FailingStore));
        assert_eq!(pins.get_pin("Dune").await, None);
        assert!(matches!(
            pins.set_pin("Dune", 1.0).await,
            Err(PortError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn bookmarks_lists_only_valid_pins() {
        let (kv, pins) = store();
        pins.set_pin("Emma", 7.0).await.unwrap();
        pins.set_pin("Dune", 5.0).await.unwrap();
        kv.set("pin_Broken", "??").await.unwrap();
        kv.set("theme", "midnight").await.unwrap();

        let records = pins.bookmarks().await.unwrap();
        let titles: Vec<_> = records.iter().map(|r| r.book_title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Emma"]);
    }

    #[tokio::test]
    async fn pinned_book_mounts_in_goto_after_restart() {
        let kv = Arc::new(MemoryKv::default());
        {
            let mut screen = ReadingSession::mount(ReadingPositionStore::new(kv.clone()), "Moby Dick").await;
            assert_eq!(screen.mode(), PinMode::Pin);
            assert_eq!(screen.press_control(), ControlAction::StartAiming);
            screen.on_scroll(420.0, Instant::now());
            assert_eq!(screen.tap_text().await.unwrap(), Some(420.0));
            assert_eq!(screen.mode(), PinMode::Goto);
        }

        // Same backing store, fresh store handle and screen.
        let pins = ReadingPositionStore::new(kv);
        assert_eq!(pins.get_pin("Moby Dick").await, Some(420.0));
        let screen = ReadingSession::mount(pins, "Moby Dick").await;
        assert_eq!(screen.mode(), PinMode::Goto);
        assert_eq!(screen.bookmarked(), Some(420.0));
    }

    #[tokio::test]
    async fn jump_consumes_goto_and_returns_highlight() {
        let (_, pins) = store();
        pins.set_pin("Dune", 250.0).await.unwrap();
        let mut screen = ReadingSession::mount(pins, "Dune").await;

        match screen.press_control() {
            ControlAction::Jump { offset, highlight } => {
                assert_eq!(offset, 250.0);
                assert_eq!(highlight.visible_for(), Duration::from_millis(3400));
            }
            other => panic!("expected jump, got {:?}", other),
        }
        assert_eq!(screen.mode(), PinMode::Pin);
        // The pin itself survives the jump.
        assert_eq!(screen.bookmarked(), Some(250.0));
    }

    #[tokio::test]
    async fn tap_outside_aiming_commits_nothing() {
        let (_, pins) = store();
        let mut screen = ReadingSession::mount(pins.clone(), "Dune").await;
        screen.on_scroll(80.0, Instant::now());
        assert_eq!(screen.tap_text().await.unwrap(), None);
        assert_eq!(pins.get_pin("Dune").await, None);
        assert_eq!(screen.mode(), PinMode::Pin);
    }

    #[tokio::test]
    async fn scrolling_alone_never_writes_the_store() {
        let (kv, pins) = store();
        let mut screen = ReadingSession::mount(pins, "Dune").await;
        screen.press_control();
        let start = Instant::now();
        for i in 0..10u64 {
            screen.on_scroll(i as f64 * 10.0, start + Duration::from_millis(i * 20));
        }
        assert!(kv.list_keys().await.unwrap().is_empty());
        assert_eq!(screen.current_scroll(), 90.0);
    }

    #[tokio::test]
    async fn scroll_samples_are_throttled() {
        let (_, pins) = store();
        let mut screen = ReadingSession::mount(pins, "Dune").await;
        let start = Instant::now();
        assert!(screen.on_scroll(10.0, start));
        assert!(!screen.on_scroll(20.0, start + Duration::from_millis(5)));
        assert!(!screen.on_scroll(25.0, start + Duration::from_millis(12)));
        assert!(screen.on_scroll(30.0, start + Duration::from_millis(16)));
        assert_eq!(screen.current_scroll(), 30.0);
    }

    #[tokio::test]
    async fn tap_commits_offset_where_scrolling_stopped() {
        let (_, pins) = store();
        let mut screen = ReadingSession::mount(pins.clone(), "Dune").await;
        let start = Instant::now();
        screen.on_scroll(100.0, start);
        screen.on_scroll(180.0, start + Duration::from_millis(8));
        assert_eq!(screen.current_scroll(), 180.0);

        screen.press_control();
        assert_eq!(screen.tap_text().await.unwrap(), Some(180.0));
        assert_eq!(pins.get_pin("Dune").await, Some(180.0));
    }

    #[tokio::test]
    async fn long_press_clears_from_any_state() {
        let (_, pins) = store();
        pins.set_pin("Dune", 40.0).await.unwrap();
        let mut screen = ReadingSession::mount(pins.clone(), "Dune").await;
        assert_eq!(screen.mode(), PinMode::Goto);

        screen.long_press().await.unwrap();
        assert_eq!(screen.mode(), PinMode::Pin);
        assert_eq!(screen.bookmarked(), None);
        assert_eq!(pins.get_pin("Dune").await, None);

        screen.press_control();
        assert_eq!(screen.control_label(), "TAP TEXT");
        screen.long_press().await.unwrap();
        assert_eq!(screen.mode(), PinMode::Pin);
        assert_eq!(screen.control_label(), "PIN");
    }

    #[tokio::test]
    async fn failed_commit_keeps_aiming() {
        let pins = ReadingPositionStore::new(Arc::new(FailingStore));
        let mut screen = ReadingSession::mount(pins, "Dune").await;
        screen.press_control();
        screen.on_scroll(12.0, Instant::now());
        assert!(screen.tap_text().await.is_err());
        assert_eq!(screen.mode(), PinMode::Aiming);
        assert_eq!(screen.bookmarked(), None);
    }

    #[tokio::test]
    async fn theme_switch_changes_palette() {
        let (_, pins) = store();
        let mut screen = ReadingSession::mount(pins, "Dune").await;
        assert_eq!(screen.theme(), ReaderTheme::Vintage);
        screen.set_theme(ReaderTheme::Midnight);
        assert_eq!(screen.theme().palette().background, "#1a1a2e");
        assert_eq!(ReaderTheme::ALL.len(), 3);
    }
}
