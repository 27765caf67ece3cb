//! Shared fixtures: a recording panel and scripted collaborators
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use marquee_controller::screens::Ui;
use marquee_controller::{EventLoop, EventQueue, Shutdown};
use marquee_core::config::{AnimationConfig, UiConfig};
use marquee_core::input::{Button, ButtonEvent};
use marquee_core::traits::{
    CharacterPanel, CollaboratorError, Endpoint, GlyphBitmap, MediaService, NetworkReport,
    NetworkStatus, PanelError, TrackInfo, TransportState,
};
use marquee_display::{lock_frame, AnimationEngine, FrameBuffer, SharedFrame};

pub const ROWS: usize = 4;
pub const COLS: usize = 20;

/// What the recording panel currently shows
#[derive(Debug)]
pub struct PanelState {
    pub cells: Vec<Vec<u8>>,
    pub enabled: bool,
    pub lit: bool,
    pub glyphs: Vec<u8>,
    pub shut_down: bool,
}

/// Panel that keeps its cells in shared memory
pub struct RecordingPanel {
    state: Arc<Mutex<PanelState>>,
    rows: usize,
    cols: usize,
    cursor: (usize, usize),
}

impl RecordingPanel {
    pub fn new(rows: usize, cols: usize) -> (Self, Arc<Mutex<PanelState>>) {
        let state = Arc::new(Mutex::new(PanelState {
            cells: vec![vec![b' '; cols]; rows],
            enabled: true,
            lit: false,
            glyphs: Vec::new(),
            shut_down: false,
        }));
        (
            Self {
                state: state.clone(),
                rows,
                cols,
                cursor: (0, 0),
            },
            state,
        )
    }
}

impl CharacterPanel for RecordingPanel {
    fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn move_to(&mut self, row: usize, col: usize) -> Result<(), PanelError> {
        if row >= self.rows || col >= self.cols {
            return Err(PanelError::InvalidAddress { row, col });
        }
        self.cursor = (row, col);
        Ok(())
    }

    fn write_data(&mut self, code: u8) -> Result<(), PanelError> {
        let (row, col) = self.cursor;
        if col < self.cols {
            self.state.lock().unwrap().cells[row][col] = code;
        }
        self.cursor.1 += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PanelError> {
        for row in self.state.lock().unwrap().cells.iter_mut() {
            row.fill(b' ');
        }
        self.cursor = (0, 0);
        Ok(())
    }

    fn load_glyph(&mut self, index: u8, _bitmap: &GlyphBitmap) -> Result<(), PanelError> {
        if index > 7 {
            return Err(PanelError::InvalidGlyph(index));
        }
        self.state.lock().unwrap().glyphs.push(index);
        Ok(())
    }

    fn set_enabled(&mut self, on: bool) -> Result<(), PanelError> {
        let mut state = self.state.lock().unwrap();
        state.enabled = on;
        if !on {
            state.lit = false;
        }
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.state.lock().unwrap().enabled
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), PanelError> {
        let mut state = self.state.lock().unwrap();
        if on {
            state.enabled = true;
        }
        state.lit = on;
        Ok(())
    }

    fn is_lit(&self) -> bool {
        self.state.lock().unwrap().lit
    }

    fn shutdown(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.enabled = false;
        state.lit = false;
        state.shut_down = true;
    }
}

/// UI timing short enough for tests
pub fn fast_ui() -> UiConfig {
    UiConfig {
        loop_interval_ms: 1,
        poll_interval_ms: 0,
        volume_overlay_ms: 50,
        backlight_off_ms: 20,
        retry_backoff_ms: 0,
        volume_step: 5,
        discovery_attempts: 2,
    }
}

pub fn fast_animation() -> AnimationConfig {
    AnimationConfig {
        period_ms: 3,
        handshake_periods: 200,
    }
}

/// Panel, frame buffer, engine and UI handle wired together
pub struct Rig {
    pub panel: Arc<Mutex<PanelState>>,
    pub frame: SharedFrame,
    pub engine: Arc<AnimationEngine>,
    pub shutdown: Arc<Shutdown>,
    pub ui: Ui,
}

impl Rig {
    pub fn new(config: UiConfig) -> Self {
        Self::with_rows(config, ROWS)
    }

    /// Rig over a `rows`-high panel
    pub fn with_rows(config: UiConfig, rows: usize) -> Self {
        let (panel, state) = RecordingPanel::new(rows, COLS);
        let frame = FrameBuffer::new(Box::new(panel)).unwrap().into_shared();
        let engine = Arc::new(AnimationEngine::start(frame.clone(), &fast_animation()));
        let shutdown = Arc::new(Shutdown::new());
        let ui = Ui::new(engine.clone(), config, Duration::from_millis(4), shutdown.clone());
        Self {
            panel: state,
            frame,
            engine,
            shutdown,
            ui,
        }
    }

    /// Frame buffer text of a row, trailing blanks removed
    pub fn row(&self, row: usize) -> String {
        lock_frame(&self.frame)
            .row_text(row)
            .unwrap()
            .trim_end()
            .to_owned()
    }

    /// Full-width frame buffer text of a row
    pub fn raw_row(&self, row: usize) -> String {
        lock_frame(&self.frame).row_text(row).unwrap()
    }

    /// What the panel hardware shows on a row
    pub fn shown(&self, row: usize) -> String {
        self.panel.lock().unwrap().cells[row]
            .iter()
            .map(|&c| char::from(c))
            .collect()
    }

    pub fn lit(&self) -> bool {
        self.panel.lock().unwrap().lit
    }

    pub fn enabled(&self) -> bool {
        self.panel.lock().unwrap().enabled
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        self.engine.shutdown();
    }
}

/// Media service driven by test scripts
pub struct ScriptedMedia {
    pub players: Vec<Endpoint>,
    pub coordinator: Option<Endpoint>,
    pub discover_failures: Cell<u32>,
    pub state_failures: Cell<u32>,
    pub track: RefCell<TrackInfo>,
    pub state: Cell<TransportState>,
    pub volume: Cell<i32>,
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedMedia {
    pub fn with_players(count: usize) -> Rc<Self> {
        Rc::new(Self {
            players: (1..=count)
                .map(|n| Endpoint::new(format!("Player {n}")))
                .collect(),
            coordinator: None,
            discover_failures: Cell::new(0),
            state_failures: Cell::new(0),
            track: RefCell::new(TrackInfo {
                title: "Song".into(),
                artist: "Band".into(),
                album: "Record".into(),
                position: "0:01:23".into(),
                duration: "0:04:56".into(),
            }),
            state: Cell::new(TransportState::Playing),
            volume: Cell::new(50),
            calls: RefCell::new(Vec::new()),
        })
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == call)
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl MediaService for ScriptedMedia {
    fn discover(&self) -> Result<Vec<Endpoint>, CollaboratorError> {
        self.record("discover".into());
        let failures = self.discover_failures.get();
        if failures > 0 {
            self.discover_failures.set(failures - 1);
            return Err(CollaboratorError::Timeout);
        }
        Ok(self.players.clone())
    }

    fn group_coordinator(&self, endpoint: &Endpoint) -> Result<Endpoint, CollaboratorError> {
        self.record(format!("group_coordinator {}", endpoint.name));
        Ok(self.coordinator.clone().unwrap_or_else(|| endpoint.clone()))
    }

    fn play(&self, endpoint: &Endpoint) -> Result<(), CollaboratorError> {
        self.record(format!("play {}", endpoint.name));
        self.state.set(TransportState::Playing);
        Ok(())
    }

    fn pause(&self, endpoint: &Endpoint) -> Result<(), CollaboratorError> {
        self.record(format!("pause {}", endpoint.name));
        self.state.set(TransportState::Paused);
        Ok(())
    }

    fn volume(&self, _endpoint: &Endpoint) -> Result<i32, CollaboratorError> {
        Ok(self.volume.get())
    }

    fn set_volume(&self, endpoint: &Endpoint, volume: i32) -> Result<(), CollaboratorError> {
        self.record(format!("set_volume {} {}", endpoint.name, volume));
        self.volume.set(volume);
        Ok(())
    }

    fn track_info(&self, endpoint: &Endpoint) -> Result<TrackInfo, CollaboratorError> {
        self.record(format!("track_info {}", endpoint.name));
        Ok(self.track.borrow().clone())
    }

    fn transport_state(&self, _endpoint: &Endpoint) -> Result<TransportState, CollaboratorError> {
        let failures = self.state_failures.get();
        if failures > 0 {
            self.state_failures.set(failures - 1);
            return Err(CollaboratorError::Unavailable("speaker offline".into()));
        }
        Ok(self.state.get())
    }
}

/// Network status that always reports the same text
pub struct FixedNetwork(pub &'static str);

impl NetworkStatus for FixedNetwork {
    fn status(&self) -> Result<NetworkReport, CollaboratorError> {
        Ok(NetworkReport::from_raw(self.0))
    }
}

pub fn network() -> Rc<FixedNetwork> {
    Rc::new(FixedNetwork("wpa_state=COMPLETED\nssid=den\n"))
}

pub fn event_loop() -> (EventLoop, Arc<EventQueue>) {
    let queue = Arc::new(EventQueue::new());
    let event_loop = EventLoop::new(queue.clone(), Duration::from_millis(1), Arc::new(Shutdown::new()));
    (event_loop, queue)
}

pub fn press(queue: &EventQueue, button: Button) {
    assert!(queue.push(ButtonEvent::new(button.pin(), Instant::now())));
}

/// Poll `f` until it holds or two seconds pass
pub fn wait_until(what: &str, f: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !f() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}
