//! HD44780 character panel driver
//!
//! Drives an HD44780-compatible controller over a 4-bit parallel bus:
//! one register-select line, one enable (strobe) line, four data lines
//! (D4-D7) and a backlight line. Every byte is sent as two nibbles, high
//! nibble first, each latched by a falling edge on the enable line.

use embedded_hal::delay::DelayNs;
use marquee_core::config::PanelConfig;
use marquee_core::traits::{CharacterPanel, GlyphBitmap, PanelError};
use marquee_hal::{LineProvider, OutputPin};
use tracing::{debug, trace, warn};

/// Consumer label reported to the GPIO character device
const CONSUMER: &str = "marquee-panel";

/// HD44780 commands
mod cmd {
    pub const CLEAR: u8 = 0x01;
    pub const HOME: u8 = 0x02;
    /// Display control; OR with the mode bits below
    pub const DISPLAY_CONTROL: u8 = 0x08;
    /// Cursor/display shift; OR with a direction
    pub const SHIFT: u8 = 0x10;
    /// 4-bit bus, two lines, 5x8 font
    pub const FUNCTION_SET_4BIT: u8 = 0x28;
    pub const SET_CGRAM_ADDR: u8 = 0x40;
    pub const SET_DDRAM_ADDR: u8 = 0x80;

    pub const MODE_ENABLED: u8 = 0b100;
    pub const MODE_CURSOR: u8 = 0b010;
    pub const MODE_BLINK: u8 = 0b001;

    pub const SHIFT_RIGHT: u8 = 0b0100;
    pub const SHIFT_LEFT: u8 = 0b0000;
}

/// Power-on nibbles that force the controller into 4-bit mode
const INIT_NIBBLES: [u8; 3] = [0b0011, 0b0011, 0b0010];

// Timing, in microseconds
const STROBE_US: u32 = 1;
const SETTLE_US: u32 = 100;
const INIT_WAIT_US: u32 = 500;
const CLEAR_WAIT_US: u32 = 1500;

/// Number of user-definable glyph slots
const GLYPH_SLOTS: u8 = 8;

/// DDRAM cells behind each of the two controller lines
const DDRAM_LINE_LEN: usize = 40;

/// Direction for [`PanelDriver::shift_cursor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Left,
    Right,
}

/// Claimed lines of an initialized panel
struct Lines<P> {
    rs: P,
    enable: P,
    /// D4, D5, D6, D7
    data: [P; 4],
    backlight: P,
}

/// HD44780 panel on a 4-bit bus
///
/// Lines are claimed by [`PanelDriver::initialize`] and released by
/// [`CharacterPanel::shutdown`] or on drop.
pub struct PanelDriver<L: LineProvider, D> {
    provider: L,
    delay: D,
    config: PanelConfig,
    lines: Option<Lines<L::Output>>,
    /// Display control bits (enabled, cursor, blink)
    mode: u8,
    lit: bool,
}

impl<L, D> PanelDriver<L, D>
where
    L: LineProvider,
    D: DelayNs,
{
    /// Create a driver; no lines are claimed until `initialize`
    pub fn new(provider: L, delay: D, config: PanelConfig) -> Self {
        Self {
            provider,
            delay,
            config,
            lines: None,
            mode: 0,
            lit: false,
        }
    }

    /// Check if `initialize` has completed
    pub fn is_initialized(&self) -> bool {
        self.lines.is_some()
    }

    /// Claim the lines, run the 4-bit power-on sequence and clear the panel
    ///
    /// Calling this on an initialized panel tears the old session down first.
    pub fn initialize(&mut self, backlight: bool) -> Result<(), PanelError> {
        if self.lines.is_some() {
            debug!("Re-initializing panel; releasing previous lines");
            self.shutdown();
        }

        let lines = self.claim_lines()?;
        self.lines = Some(lines);
        self.mode = 0;
        self.lit = false;

        for nibble in INIT_NIBBLES {
            self.write_nibble(nibble)?;
        }
        self.delay.delay_us(INIT_WAIT_US);

        self.write_command(cmd::FUNCTION_SET_4BIT)?;
        self.clear()?;
        self.set_backlight(backlight)?;

        debug!(
            "Panel initialized: {}x{} on {}",
            self.config.cols, self.config.rows, self.config.chip
        );
        Ok(())
    }

    fn claim_lines(&mut self) -> Result<Lines<L::Output>, PanelError> {
        let cfg = &self.config;
        let provider = &mut self.provider;
        Ok(Lines {
            rs: provider.claim_output(cfg.rs, CONSUMER)?,
            enable: provider.claim_output(cfg.enable, CONSUMER)?,
            data: [
                provider.claim_output(cfg.data[0], CONSUMER)?,
                provider.claim_output(cfg.data[1], CONSUMER)?,
                provider.claim_output(cfg.data[2], CONSUMER)?,
                provider.claim_output(cfg.data[3], CONSUMER)?,
            ],
            backlight: provider.claim_output(cfg.backlight, CONSUMER)?,
        })
    }

    /// Put a nibble on D4-D7 and strobe it in
    fn write_nibble(&mut self, nibble: u8) -> Result<(), PanelError> {
        let lines = self.lines.as_mut().ok_or(PanelError::NotInitialized)?;
        for (bit, pin) in lines.data.iter_mut().enumerate() {
            pin.set_state((nibble >> bit) & 1 == 1);
        }

        lines.enable.set_low();
        self.delay.delay_us(STROBE_US);
        lines.enable.set_high();
        self.delay.delay_us(STROBE_US);
        lines.enable.set_low();
        self.delay.delay_us(SETTLE_US);
        Ok(())
    }

    fn write_byte(&mut self, value: u8, data: bool) -> Result<(), PanelError> {
        let lines = self.lines.as_mut().ok_or(PanelError::NotInitialized)?;
        lines.rs.set_state(data);
        self.write_nibble(value >> 4)?;
        self.write_nibble(value & 0x0F)
    }

    /// Send an instruction byte (register select low)
    pub fn write_command(&mut self, code: u8) -> Result<(), PanelError> {
        trace!("Panel command {:#04x}", code);
        self.write_byte(code, false)
    }

    /// Return the cursor to the origin without clearing
    pub fn home(&mut self) -> Result<(), PanelError> {
        self.write_command(cmd::HOME)?;
        self.delay.delay_us(CLEAR_WAIT_US);
        Ok(())
    }

    /// Update the display control register; no bus traffic if unchanged
    pub fn set_mode(&mut self, enabled: bool, cursor: bool, blink: bool) -> Result<(), PanelError> {
        let mut mode = 0;
        if enabled {
            mode |= cmd::MODE_ENABLED;
        }
        if cursor {
            mode |= cmd::MODE_CURSOR;
        }
        if blink {
            mode |= cmd::MODE_BLINK;
        }
        self.apply_mode(mode)
    }

    fn apply_mode(&mut self, mode: u8) -> Result<(), PanelError> {
        let lines = self.lines.as_mut().ok_or(PanelError::NotInitialized)?;
        // A dark display never keeps its backlight
        if mode & cmd::MODE_ENABLED == 0 && self.lit {
            lines.backlight.set_low();
            self.lit = false;
        }
        if mode != self.mode {
            self.write_command(cmd::DISPLAY_CONTROL | mode)?;
            self.mode = mode;
        }
        Ok(())
    }

    /// Show or hide the underline cursor
    pub fn set_cursor(&mut self, on: bool) -> Result<(), PanelError> {
        self.apply_mode(toggle(self.mode, cmd::MODE_CURSOR, on))
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.mode & cmd::MODE_CURSOR != 0
    }

    /// Enable or disable blinking of the cursor cell
    pub fn set_blink(&mut self, on: bool) -> Result<(), PanelError> {
        self.apply_mode(toggle(self.mode, cmd::MODE_BLINK, on))
    }

    pub fn is_blinking(&self) -> bool {
        self.mode & cmd::MODE_BLINK != 0
    }

    /// Move the cursor one cell without writing
    pub fn shift_cursor(&mut self, direction: ShiftDirection) -> Result<(), PanelError> {
        let dir = match direction {
            ShiftDirection::Left => cmd::SHIFT_LEFT,
            ShiftDirection::Right => cmd::SHIFT_RIGHT,
        };
        self.write_command(cmd::SHIFT | dir)
    }

    /// DDRAM address of a logical cell
    ///
    /// Rows 2 and 3 continue rows 0 and 1 in controller memory, so a cell
    /// past the end of its controller line has no address.
    fn address(&self, row: usize, col: usize) -> Option<u8> {
        let cols = self.config.cols;
        if row >= self.config.rows || col >= cols {
            return None;
        }
        let (line, offset) = match row {
            0 => (0x00, col),
            1 => (0x40, col),
            2 => (0x00, cols + col),
            3 => (0x40, cols + col),
            _ => return None,
        };
        if offset >= DDRAM_LINE_LEN {
            return None;
        }
        u8::try_from(line + offset).ok()
    }
}

fn toggle(mode: u8, bit: u8, on: bool) -> u8 {
    if on {
        mode | bit
    } else {
        mode & !bit
    }
}

impl<L, D> CharacterPanel for PanelDriver<L, D>
where
    L: LineProvider,
    D: DelayNs,
{
    fn dimensions(&self) -> (usize, usize) {
        (self.config.rows, self.config.cols)
    }

    fn move_to(&mut self, row: usize, col: usize) -> Result<(), PanelError> {
        let addr = self
            .address(row, col)
            .ok_or(PanelError::InvalidAddress { row, col })?;
        self.write_command(cmd::SET_DDRAM_ADDR | addr)
    }

    fn write_data(&mut self, code: u8) -> Result<(), PanelError> {
        self.write_byte(code, true)
    }

    fn clear(&mut self) -> Result<(), PanelError> {
        self.write_command(cmd::CLEAR)?;
        self.delay.delay_us(CLEAR_WAIT_US);
        Ok(())
    }

    fn load_glyph(&mut self, index: u8, bitmap: &GlyphBitmap) -> Result<(), PanelError> {
        if index >= GLYPH_SLOTS {
            return Err(PanelError::InvalidGlyph(index));
        }
        self.write_command(cmd::SET_CGRAM_ADDR | (index << 3))?;
        for row in bitmap {
            self.write_data(row & 0x1F)?;
        }
        Ok(())
    }

    fn set_enabled(&mut self, on: bool) -> Result<(), PanelError> {
        self.apply_mode(toggle(self.mode, cmd::MODE_ENABLED, on))
    }

    fn is_enabled(&self) -> bool {
        self.mode & cmd::MODE_ENABLED != 0
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), PanelError> {
        if on && !self.is_enabled() {
            self.set_enabled(true)?;
        }
        if on != self.lit {
            let lines = self.lines.as_mut().ok_or(PanelError::NotInitialized)?;
            lines.backlight.set_state(on);
            self.lit = on;
        }
        Ok(())
    }

    fn is_lit(&self) -> bool {
        self.lit
    }

    fn shutdown(&mut self) {
        if self.lines.is_none() {
            return;
        }
        if let Err(e) = self.set_enabled(false) {
            warn!("Failed to darken panel during shutdown: {}", e);
        }
        // Dropping the handles releases the lines
        self.lines = None;
        self.mode = 0;
        self.lit = false;
        debug!("Panel lines released");
    }
}

impl<L: LineProvider, D> Drop for PanelDriver<L, D> {
    fn drop(&mut self) {
        if let Some(lines) = self.lines.as_mut() {
            lines.backlight.set_low();
        }
        self.lines = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_hal::{EdgeInput, GpioError};
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const RS: u32 = 24;
    const EN: u32 = 25;
    const DATA: [u32; 4] = [22, 27, 17, 4];
    const BL: u32 = 18;

    /// Shared record of everything that happened on the mock bus
    #[derive(Default)]
    struct Bus {
        levels: BTreeMap<u32, bool>,
        claimed: BTreeSet<u32>,
        released: Vec<u32>,
        /// (register select, nibble) latched on each enable falling edge
        latched: Vec<(bool, u8)>,
        delay_ns: u64,
    }

    impl Bus {
        fn level(&self, line: u32) -> bool {
            self.levels.get(&line).copied().unwrap_or(false)
        }

        /// Pair latched nibbles into (rs, byte), skipping the power-on nibbles
        fn bytes(&self) -> Vec<(bool, u8)> {
            self.latched[INIT_NIBBLES.len()..]
                .chunks(2)
                .map(|pair| (pair[0].0, (pair[0].1 << 4) | pair[1].1))
                .collect()
        }

        fn commands(&self) -> Vec<u8> {
            self.bytes().into_iter().filter(|(rs, _)| !rs).map(|(_, b)| b).collect()
        }
    }

    type SharedBus = Arc<Mutex<Bus>>;

    struct MockPin {
        line: u32,
        bus: SharedBus,
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.bus.lock().unwrap().levels.insert(self.line, true);
        }

        fn set_low(&mut self) {
            let mut bus = self.bus.lock().unwrap();
            if self.line == EN && bus.level(EN) {
                let rs = bus.level(RS);
                let nibble = DATA
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (bit, line)| acc | (u8::from(bus.level(*line)) << bit));
                bus.latched.push((rs, nibble));
            }
            bus.levels.insert(self.line, false);
        }
    }

    impl Drop for MockPin {
        fn drop(&mut self) {
            let mut bus = self.bus.lock().unwrap();
            bus.claimed.remove(&self.line);
            bus.released.push(self.line);
        }
    }

    struct NoEdges;

    impl EdgeInput for NoEdges {
        fn wait_for_edge(&mut self, _timeout: Duration) -> Result<bool, GpioError> {
            Ok(false)
        }
    }

    struct MockProvider {
        bus: SharedBus,
    }

    impl LineProvider for MockProvider {
        type Output = MockPin;
        type Edges = NoEdges;

        fn claim_output(&mut self, line: u32, _consumer: &str) -> Result<MockPin, GpioError> {
            let mut bus = self.bus.lock().unwrap();
            if !bus.claimed.insert(line) {
                return Err(GpioError::Request {
                    line,
                    reason: "busy".into(),
                });
            }
            bus.levels.insert(line, false);
            Ok(MockPin {
                line,
                bus: self.bus.clone(),
            })
        }

        fn claim_rising_edges(&mut self, line: u32, _consumer: &str) -> Result<NoEdges, GpioError> {
            Err(GpioError::Unavailable(line))
        }
    }

    struct MockDelay {
        bus: SharedBus,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.bus.lock().unwrap().delay_ns += u64::from(ns);
        }
    }

    fn panel_config() -> PanelConfig {
        PanelConfig {
            rs: RS,
            enable: EN,
            data: DATA,
            backlight: BL,
            rows: 4,
            cols: 20,
            ..PanelConfig::default()
        }
    }

    fn driver() -> (PanelDriver<MockProvider, MockDelay>, SharedBus) {
        let bus = SharedBus::default();
        let driver = PanelDriver::new(
            MockProvider { bus: bus.clone() },
            MockDelay { bus: bus.clone() },
            panel_config(),
        );
        (driver, bus)
    }

    fn initialized() -> (PanelDriver<MockProvider, MockDelay>, SharedBus) {
        let (mut driver, bus) = driver();
        driver.initialize(false).unwrap();
        (driver, bus)
    }

    #[test]
    fn test_init_sequence() {
        let (_driver, bus) = initialized();
        let bus = bus.lock().unwrap();

        let power_on: Vec<u8> = bus.latched[..3].iter().map(|(_, n)| *n).collect();
        assert_eq!(power_on, vec![0x3, 0x3, 0x2]);
        assert_eq!(bus.commands(), vec![cmd::FUNCTION_SET_4BIT, cmd::CLEAR]);
        assert!(bus.delay_ns >= u64::from(INIT_WAIT_US + CLEAR_WAIT_US) * 1000);
    }

    #[test]
    fn test_operations_require_initialize() {
        let (mut driver, _bus) = driver();
        assert_eq!(driver.write_data(b'A'), Err(PanelError::NotInitialized));
        assert_eq!(driver.move_to(0, 0), Err(PanelError::NotInitialized));
        assert_eq!(driver.clear(), Err(PanelError::NotInitialized));
        assert_eq!(driver.set_backlight(true), Err(PanelError::NotInitialized));
    }

    #[test]
    fn test_move_to_addresses() {
        let (mut driver, bus) = initialized();
        driver.move_to(0, 0).unwrap();
        driver.move_to(1, 3).unwrap();
        driver.move_to(2, 5).unwrap();
        driver.move_to(3, 19).unwrap();

        let cmds = bus.lock().unwrap().commands();
        assert_eq!(&cmds[2..], &[0x80, 0x80 | 0x43, 0x80 | 25, 0x80 | (0x40 + 39)]);
    }

    #[test]
    fn test_move_to_out_of_range() {
        let (mut driver, bus) = initialized();
        let before = bus.lock().unwrap().latched.len();

        assert_eq!(
            driver.move_to(0, 20),
            Err(PanelError::InvalidAddress { row: 0, col: 20 })
        );
        assert_eq!(
            driver.move_to(4, 0),
            Err(PanelError::InvalidAddress { row: 4, col: 0 })
        );
        assert_eq!(bus.lock().unwrap().latched.len(), before);
    }

    #[test]
    fn test_wide_four_row_panel_has_no_overlapping_cells() {
        let bus = SharedBus::default();
        let mut driver = PanelDriver::new(
            MockProvider { bus: bus.clone() },
            MockDelay { bus: bus.clone() },
            PanelConfig {
                cols: 40,
                ..panel_config()
            },
        );
        driver.initialize(false).unwrap();

        assert_eq!(driver.address(2, 0), None);
        assert_eq!(driver.address(3, 39), None);
        assert_eq!(
            driver.move_to(2, 30),
            Err(PanelError::InvalidAddress { row: 2, col: 30 })
        );
        assert_eq!(driver.address(1, 39), Some(0x40 + 39));
    }

    #[test]
    fn test_four_row_addresses_stay_in_their_line() {
        let (driver, _bus) = driver();
        let mut seen = std::collections::HashSet::new();
        for row in 0..4 {
            for col in 0..20 {
                let addr = driver.address(row, col).unwrap();
                assert!(usize::from(addr & 0x3F) < DDRAM_LINE_LEN, "row {row} col {col}");
                assert!(seen.insert(addr), "row {row} col {col} reuses {addr:#x}");
            }
        }
    }

    #[test]
    fn test_write_data_sets_register_select() {
        let (mut driver, bus) = initialized();
        driver.write_data(b'H').unwrap();

        let bytes = bus.lock().unwrap().bytes();
        assert_eq!(bytes.last(), Some(&(true, b'H')));
    }

    #[test]
    fn test_mode_write_only_on_change() {
        let (mut driver, bus) = initialized();
        driver.set_enabled(true).unwrap();
        driver.set_enabled(true).unwrap();
        driver.set_mode(true, false, false).unwrap();

        let cmds = bus.lock().unwrap().commands();
        assert_eq!(&cmds[2..], &[0x0C]);
    }

    #[test]
    fn test_cursor_and_blink_bits() {
        let (mut driver, bus) = initialized();
        driver.set_enabled(true).unwrap();
        driver.set_cursor(true).unwrap();
        driver.set_blink(true).unwrap();
        assert!(driver.is_cursor_visible());
        assert!(driver.is_blinking());
        driver.set_cursor(false).unwrap();

        let cmds = bus.lock().unwrap().commands();
        assert_eq!(&cmds[2..], &[0x0C, 0x0E, 0x0F, 0x0D]);
    }

    #[test]
    fn test_backlight_enables_display() {
        let (mut driver, bus) = initialized();
        driver.set_backlight(true).unwrap();

        assert!(driver.is_enabled());
        assert!(driver.is_lit());
        let bus = bus.lock().unwrap();
        assert!(bus.level(BL));
        assert_eq!(&bus.commands()[2..], &[0x0C]);
    }

    #[test]
    fn test_disable_darkens_backlight() {
        let (mut driver, bus) = initialized();
        driver.set_backlight(true).unwrap();
        driver.set_enabled(false).unwrap();

        assert!(!driver.is_lit());
        assert!(!driver.is_enabled());
        assert!(!bus.lock().unwrap().level(BL));
    }

    #[test]
    fn test_set_mode_disable_darkens_backlight() {
        let (mut driver, bus) = initialized();
        driver.set_backlight(true).unwrap();
        driver.set_mode(false, true, false).unwrap();

        assert!(!driver.is_lit());
        assert!(!bus.lock().unwrap().level(BL));
    }

    #[test]
    fn test_lit_implies_enabled() {
        let (mut driver, _bus) = initialized();
        let steps = [
            (true, true),
            (false, true),
            (true, false),
            (false, false),
            (true, true),
        ];
        for (backlight, enabled) in steps {
            driver.set_backlight(backlight).unwrap();
            assert!(!driver.is_lit() || driver.is_enabled());
            driver.set_enabled(enabled).unwrap();
            assert!(!driver.is_lit() || driver.is_enabled());
        }
    }

    #[test]
    fn test_load_glyph() {
        let (mut driver, bus) = initialized();
        let bitmap = [0xFF, 0x0C, 0x0E, 0x0F, 0x0E, 0x0C, 0x08, 0x00];
        driver.load_glyph(1, &bitmap).unwrap();

        let bytes = bus.lock().unwrap().bytes();
        let tail = &bytes[bytes.len() - 9..];
        assert_eq!(tail[0], (false, 0x48));
        assert_eq!(tail[1], (true, 0x1F));
        assert_eq!(tail[2], (true, 0x0C));

        assert_eq!(driver.load_glyph(8, &bitmap), Err(PanelError::InvalidGlyph(8)));
    }

    #[test]
    fn test_shift_cursor() {
        let (mut driver, bus) = initialized();
        driver.shift_cursor(ShiftDirection::Right).unwrap();
        driver.shift_cursor(ShiftDirection::Left).unwrap();

        let cmds = bus.lock().unwrap().commands();
        assert_eq!(&cmds[2..], &[0x14, 0x10]);
    }

    #[test]
    fn test_shutdown_releases_lines() {
        let (mut driver, bus) = initialized();
        driver.set_backlight(true).unwrap();
        driver.shutdown();
        driver.shutdown();

        assert!(!driver.is_initialized());
        let bus = bus.lock().unwrap();
        assert!(bus.claimed.is_empty());
        assert_eq!(bus.released.len(), 7);
        assert!(!bus.level(BL));
    }

    #[test]
    fn test_reinitialize_tears_down_previous_session() {
        let (mut driver, bus) = initialized();
        driver.initialize(true).unwrap();

        assert!(driver.is_lit());
        let bus = bus.lock().unwrap();
        assert_eq!(bus.released.len(), 7);
        assert_eq!(bus.claimed.len(), 7);
    }

    #[test]
    fn test_drop_releases_lines() {
        let (driver, bus) = initialized();
        drop(driver);
        assert!(bus.lock().unwrap().claimed.is_empty());
    }
}
