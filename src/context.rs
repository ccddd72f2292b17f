//! The process-wide shim context and the main loop driver.
//!
//! All state lives in one explicitly owned [`Glut`] value: the window
//! and menu tables, the init-time defaults, the current-window/current-
//! menu cursors and the GL drawable bound for rendering. The toolkit
//! backend is injected at construction, so the same engine runs against
//! a display server or against the in-process [headless] backend.
//!
//! [headless]: crate::platform::headless

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use crate::callback::{IdleFn, MenuStateFn, MenuStatusFn, TimerFn};
use crate::config::{CloseAction, DisplayMode, InitState};
use crate::error::{fatal, warning};
use crate::event::{Modifiers, MAX_MOUSE_BUTTONS};
use crate::init::{parse_command_line, strip_passthrough_leftovers};
use crate::menu::Menu;
use crate::platform::{
    CursorHandle, CursorKind, DrawableHandle, GlAttrib, GlConfigHandle, TimerHandle, Toolkit,
};
use crate::registry::{MenuId, Registry, WindowId};
use crate::window::{Cursor, Window};

/// Version reported through [`State::Version`].
const VERSION: i32 = 300;

/// The whole state of the shim: one instance per process, owned by the
/// embedding application and passed to every operation.
///
/// Construction is cheap; nothing touches the toolkit until
/// [`Glut::init`] runs. Most operations are fatal before that.
pub struct Glut {
    pub(crate) toolkit: Box<dyn Toolkit>,
    pub(crate) initialized: bool,
    pub(crate) init: InitState,
    pub(crate) gl_config: Option<GlConfigHandle>,
    pub(crate) windows: Registry<Window>,
    pub(crate) menus: Registry<Menu>,
    pub(crate) current_window: Option<WindowId>,
    pub(crate) current_menu: Option<MenuId>,
    /// The drawable bound for rendering on behalf of the current
    /// window. Released before another one is bound.
    pub(crate) current_drawable: Option<DrawableHandle>,
    pub(crate) cursor_cache: HashMap<CursorKind, CursorHandle>,
    /// Modifier snapshot, defined only while an input callback runs.
    pub(crate) modifiers: Option<Modifiers>,
    pub(crate) menu_status: Option<Rc<MenuStatusFn>>,
    pub(crate) menu_state: Option<Rc<MenuStateFn>>,
    pub(crate) idle: Option<Rc<IdleFn>>,
    pub(crate) timers: HashMap<TimerHandle, (Box<TimerFn>, i32)>,
    pub(crate) close_action: CloseAction,
    pub(crate) live_toplevels: usize,
    /// Window that triggered the currently open popup, if any.
    pub(crate) active_menu_window: Option<WindowId>,
    pub(crate) loop_done: bool,
    epoch: Instant,
}

impl Glut {
    /// Creates a context around a toolkit backend. Initialization
    /// defaults mirror the legacy library: a 300x300 window wherever
    /// the window manager puts it, single-buffered RGB with depth, and
    /// the terminate-on-close policy.
    pub fn new(toolkit: Box<dyn Toolkit>) -> Self {
        Self {
            toolkit,
            initialized: false,
            init: InitState::new(),
            gl_config: None,
            windows: Registry::new(),
            menus: Registry::new(),
            current_window: None,
            current_menu: None,
            current_drawable: None,
            cursor_cache: HashMap::new(),
            modifiers: None,
            menu_status: None,
            menu_state: None,
            idle: None,
            timers: HashMap::new(),
            close_action: CloseAction::Exit,
            live_toplevels: 0,
            active_menu_window: None,
            loop_done: false,
            epoch: Instant::now(),
        }
    }

    /// Initializes the toolkit and applies command-line arguments.
    ///
    /// Recognized shim arguments (`-display`, `-geometry`, `-direct`,
    /// `-indirect`, `-iconic`, `-gldebug`, `-sync`) are stripped from
    /// `args`; what remains is the application's own argument list.
    pub fn init(&mut self, args: &mut Vec<String>) {
        let parsed = parse_command_line(&mut self.init, args);

        if let Err(err) = self.toolkit.init(args) {
            fatal!("init", "toolkit initialization failed: {err}");
        }
        self.initialized = true;

        // Geometry offsets may be screen-relative, so they resolve only
        // now that the toolkit can report the screen size.
        if let Some(mut geometry) = parsed.geometry {
            self.init_window_size(geometry.width, geometry.height);
            let (screen_w, screen_h) = self.toolkit.screen_size();
            if geometry.x < 0 {
                geometry.x += screen_w - geometry.width;
            }
            if geometry.y < 0 {
                geometry.y += screen_h - geometry.height;
            }
            self.init_window_position(geometry.x, geometry.y);
        }

        strip_passthrough_leftovers(args, &parsed.passthrough);

        self.refresh_gl_config();
    }

    /// Sets the size applied to windows created later. Non-positive
    /// components leave the previous value in place.
    pub fn init_window_size(&mut self, width: i32, height: i32) {
        if width > 0 {
            self.init.geometry.width = width;
        }
        if height > 0 {
            self.init.geometry.height = height;
        }
    }

    /// Sets the position applied to top-level windows created later.
    /// Negative coordinates leave placement to the window manager.
    pub fn init_window_position(&mut self, x: i32, y: i32) {
        self.init.geometry.x = x;
        self.init.geometry.y = y;
    }

    /// Sets the display mode requested for windows created later.
    pub fn init_display_mode(&mut self, mode: DisplayMode) {
        self.init.display_mode = Some(mode);
        self.refresh_gl_config();
    }

    /// Legacy capability-string variant of [`Glut::init_display_mode`].
    pub fn init_display_string(&mut self, string: &str) {
        self.init.display_mode = crate::config::parse_display_string(string);
        self.refresh_gl_config();
    }

    fn refresh_gl_config(&mut self) {
        if self.initialized {
            self.gl_config =
                self.init.display_mode.and_then(|mode| self.toolkit.find_gl_config(mode));
        }
    }

    /// The close policy applied when the window manager closes a
    /// top-level window.
    pub fn close_action(&self) -> CloseAction {
        self.close_action
    }

    pub fn set_close_action(&mut self, action: CloseAction) {
        self.close_action = action;
    }

    /// Keyboard modifiers captured when the current input callback was
    /// delivered. Outside an input callback the snapshot is undefined
    /// and empty is returned with a warning.
    pub fn get_modifiers(&self) -> Modifiers {
        self.check_init("get_modifiers");
        match self.modifiers {
            Some(modifiers) => modifiers.keyboard_bits(),
            None => {
                warning!("get_modifiers", "called outside an input callback");
                Modifiers::empty()
            }
        }
    }

    /// Blocks processing events until the loop is asked to stop.
    ///
    /// With no top-level windows and the terminate policy, there is
    /// nothing to run for and the process exits instead.
    pub fn main_loop(&mut self) {
        self.check_init("main_loop");

        if self.live_toplevels < 1 {
            if self.close_action == CloseAction::Exit {
                std::process::exit(0);
            }
            return;
        }

        self.loop_done = false;
        loop {
            let pump = self.toolkit.pump(true);
            for event in pump.events {
                self.dispatch_event(event);
                if self.loop_done {
                    break;
                }
            }
            if self.loop_done || pump.ended {
                break;
            }
        }
    }

    /// Drains currently pending events without blocking.
    pub fn main_loop_event(&mut self) {
        self.check_init("main_loop_event");
        let pump = self.toolkit.pump(false);
        for event in pump.events {
            self.dispatch_event(event);
            if self.loop_done {
                break;
            }
        }
    }

    /// Asks the blocking loop to return once current event processing
    /// finishes.
    pub fn leave_main_loop(&mut self) {
        self.check_init("leave_main_loop");
        self.loop_done = true;
    }

    /// Enumerated state query in the style of the legacy `glutGet`.
    /// Window-scoped queries answer for the current window; with none,
    /// they warn and return 0.
    pub fn get(&mut self, state: State) -> i32 {
        self.check_init("get");

        match state {
            State::ElapsedTime => self.epoch.elapsed().as_millis() as i32,
            State::InitDisplayMode => {
                self.init.display_mode.map(|mode| mode.bits() as i32).unwrap_or(0)
            }
            State::InitWindowX => self.init.geometry.x,
            State::InitWindowY => self.init.geometry.y,
            State::InitWindowWidth => self.init.geometry.width,
            State::InitWindowHeight => self.init.geometry.height,
            State::Version => VERSION,

            State::ScreenWidth => self.toolkit.screen_size().0,
            State::ScreenHeight => self.toolkit.screen_size().1,
            State::ScreenWidthMm => self.toolkit.screen_size_mm().0,
            State::ScreenHeightMm => self.toolkit.screen_size_mm().1,

            State::DisplayModePossible => match self.init.display_mode {
                Some(mode) => self.toolkit.find_gl_config(mode).is_some() as i32,
                None => 0,
            },
            State::ActionOnWindowClose => self.close_action.to_raw(),
            State::MenuNumItems => self.menu_num_items(),

            State::WindowX
            | State::WindowY
            | State::WindowWidth
            | State::WindowHeight
            | State::WindowParent
            | State::WindowNumChildren
            | State::WindowCursor
            | State::WindowColormapSize => self.window_state(state),

            State::WindowBufferSize => self.config_attrib(GlAttrib::BufferSize),
            State::WindowStencilSize => self.config_attrib(GlAttrib::StencilSize),
            State::WindowDepthSize => self.config_attrib(GlAttrib::DepthSize),
            State::WindowRedSize => self.config_attrib(GlAttrib::RedSize),
            State::WindowGreenSize => self.config_attrib(GlAttrib::GreenSize),
            State::WindowBlueSize => self.config_attrib(GlAttrib::BlueSize),
            State::WindowAlphaSize => self.config_attrib(GlAttrib::AlphaSize),
            State::WindowAccumRedSize => self.config_attrib(GlAttrib::AccumRedSize),
            State::WindowAccumGreenSize => self.config_attrib(GlAttrib::AccumGreenSize),
            State::WindowAccumBlueSize => self.config_attrib(GlAttrib::AccumBlueSize),
            State::WindowAccumAlphaSize => self.config_attrib(GlAttrib::AccumAlphaSize),
            State::WindowDoubleBuffer => self.config_attrib(GlAttrib::DoubleBuffered),
            State::WindowRgba => self.config_attrib(GlAttrib::Rgba),
            State::WindowNumSamples => self.config_attrib(GlAttrib::Samples),
            State::WindowStereo => self.config_attrib(GlAttrib::Stereo),
            State::WindowFormatId => self.config_attrib(GlAttrib::FormatId),
        }
    }

    fn window_state(&mut self, state: State) -> i32 {
        let Some(id) = self.active_window("get") else { return 0 };
        let record = self.window_ref(id);

        match state {
            State::WindowX | State::WindowY => {
                let widget = record.widgets.frame.unwrap_or(record.widgets.event_box);
                let geometry = self.toolkit.widget_geometry(widget);
                if state == State::WindowX {
                    geometry.x
                } else {
                    geometry.y
                }
            }
            State::WindowWidth | State::WindowHeight => {
                let geometry = self.toolkit.widget_geometry(record.widgets.drawing_area);
                if state == State::WindowWidth {
                    geometry.width
                } else {
                    geometry.height
                }
            }
            State::WindowParent => record.parent.map(|p| p.0 as i32).unwrap_or(0),
            State::WindowNumChildren => record.children.len() as i32,
            State::WindowCursor => record.cursor.to_raw(),
            // Indexed colormaps are not supported.
            State::WindowColormapSize => 0,
            _ => 0,
        }
    }

    fn config_attrib(&mut self, attrib: GlAttrib) -> i32 {
        if self.active_window("get").is_none() {
            return 0;
        }
        match self.gl_config {
            Some(config) => self.toolkit.gl_config_attrib(config, attrib),
            None => 0,
        }
    }

    /// Enumerated state update in the style of the legacy
    /// `glutSetOption`.
    pub fn set_option(&mut self, state: State, value: i32) {
        match state {
            State::InitDisplayMode => {
                self.init_display_mode(DisplayMode::from_bits_truncate(value as u32))
            }
            State::InitWindowWidth => self.init_window_size(value, -1),
            State::InitWindowHeight => self.init_window_size(-1, value),
            State::InitWindowX => {
                let y = self.init.geometry.y;
                self.init_window_position(value, y);
            }
            State::InitWindowY => {
                let x = self.init.geometry.x;
                self.init_window_position(x, value);
            }
            State::WindowCursor => match Cursor::from_raw(value) {
                Some(cursor) => self.set_cursor(cursor),
                None => warning!("set_option", "unknown cursor {value}"),
            },
            State::ActionOnWindowClose => match CloseAction::from_raw(value) {
                Some(action) => self.close_action = action,
                None => warning!("set_option", "unknown close action {value}"),
            },
            other => warning!("set_option", "option {other:?} can not be set"),
        }
    }

    /// Fixed capability answers about input devices.
    pub fn device_get(&mut self, query: DeviceQuery) -> i32 {
        self.check_init("device_get");
        match query {
            DeviceQuery::HasKeyboard | DeviceQuery::HasMouse => 1,
            DeviceQuery::NumMouseButtons => MAX_MOUSE_BUTTONS as i32,
            DeviceQuery::HasSpaceball
            | DeviceQuery::HasDialAndButtonBox
            | DeviceQuery::HasTablet
            | DeviceQuery::HasJoystick => 0,
            DeviceQuery::NumSpaceballButtons
            | DeviceQuery::NumButtonBoxButtons
            | DeviceQuery::NumDials
            | DeviceQuery::NumTabletButtons
            | DeviceQuery::JoystickButtons
            | DeviceQuery::JoystickAxes
            | DeviceQuery::JoystickPollRate => 0,
            DeviceQuery::IgnoreKeyRepeat | DeviceQuery::KeyRepeat => 0,
        }
    }

    /// Overlay-plane queries; overlays are permanently unsupported, so
    /// the answers are constants except for the damage bit.
    pub fn layer_get(&mut self, query: LayerQuery) -> i32 {
        self.check_init("layer_get");
        match query {
            LayerQuery::OverlayPossible | LayerQuery::HasOverlay => 0,
            LayerQuery::LayerInUse => 0,
            LayerQuery::TransparentIndex | LayerQuery::OverlayDamaged => -1,
            LayerQuery::NormalDamaged => match self.get_window() {
                Some(id) => self.window_ref(id).damaged as i32,
                None => 0,
            },
        }
    }

    /// Terminates unless [`Glut::init`] has run.
    pub(crate) fn check_init(&self, func_name: &str) {
        if !self.initialized {
            fatal!(func_name, "library wasn't initialized");
        }
    }

    /// The current window, warning when it no longer resolves.
    pub(crate) fn active_window(&self, func_name: &str) -> Option<WindowId> {
        let window = self.get_window();
        if window.is_none() {
            warning!(func_name, "attempted on bogus window 0");
        }
        window
    }

    pub(crate) fn window_ref(&self, window: WindowId) -> &Window {
        self.windows.get(window.0).expect("window table entry vanished")
    }

    pub(crate) fn window_mut(&mut self, window: WindowId) -> &mut Window {
        self.windows.get_mut(window.0).expect("window table entry vanished")
    }

    /// Reports GL errors accumulated during a client callback when the
    /// debug flag is set.
    pub(crate) fn gl_debug(&mut self) {
        if self.init.gl_debug {
            self.report_errors();
        }
    }
}

impl fmt::Debug for Glut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Glut")
            .field("initialized", &self.initialized)
            .field("current_window", &self.current_window)
            .field("current_menu", &self.current_menu)
            .field("live_toplevels", &self.live_toplevels)
            .field("close_action", &self.close_action)
            .field("pending_timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}

/// Keys of the enumerated state surface ([`Glut::get`] /
/// [`Glut::set_option`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    ElapsedTime,
    InitDisplayMode,
    InitWindowX,
    InitWindowY,
    InitWindowWidth,
    InitWindowHeight,
    Version,
    ScreenWidth,
    ScreenHeight,
    ScreenWidthMm,
    ScreenHeightMm,
    WindowX,
    WindowY,
    WindowWidth,
    WindowHeight,
    WindowBufferSize,
    WindowStencilSize,
    WindowDepthSize,
    WindowRedSize,
    WindowGreenSize,
    WindowBlueSize,
    WindowAlphaSize,
    WindowAccumRedSize,
    WindowAccumGreenSize,
    WindowAccumBlueSize,
    WindowAccumAlphaSize,
    WindowDoubleBuffer,
    WindowRgba,
    WindowParent,
    WindowNumChildren,
    WindowColormapSize,
    WindowNumSamples,
    WindowStereo,
    WindowCursor,
    WindowFormatId,
    DisplayModePossible,
    MenuNumItems,
    ActionOnWindowClose,
}

/// Input-device capability queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceQuery {
    HasKeyboard,
    HasMouse,
    HasSpaceball,
    HasDialAndButtonBox,
    HasTablet,
    HasJoystick,
    NumMouseButtons,
    NumSpaceballButtons,
    NumButtonBoxButtons,
    NumDials,
    NumTabletButtons,
    JoystickButtons,
    JoystickAxes,
    JoystickPollRate,
    IgnoreKeyRepeat,
    KeyRepeat,
}

/// Overlay-plane queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerQuery {
    OverlayPossible,
    LayerInUse,
    HasOverlay,
    TransparentIndex,
    NormalDamaged,
    OverlayDamaged,
}
