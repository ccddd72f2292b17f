//! In-process toolkit backend with no display server behind it.
//!
//! Every operation is recorded instead of performed, and native events
//! are whatever the driver injects through the paired [`HeadlessHandle`].
//! This is the backend the test suites run against; it is also usable
//! for exercising client code offscreen.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::ffi::c_void;
use std::rc::Rc;

use crate::config::{DisplayMode, Geometry};
use crate::error::{Error, ErrorKind, Result};
use crate::event::MouseButton;
use crate::platform::{
    CursorHandle, CursorKind, DrawableHandle, Event, EventMask, GlAttrib, GlConfigHandle,
    NativeSignal, Pump, SignalHandle, TimerHandle, Toolkit, WidgetHandle, WidgetTree,
};
use crate::registry::{MenuId, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetKind {
    Frame,
    EventBox,
    Fixed,
    DrawingArea,
    Menu,
    MenuItem,
}

/// Recorded state of one simulated widget.
#[derive(Debug, Clone)]
pub struct WidgetInfo {
    kind: WidgetKind,
    pub geometry: Geometry,
    pub shown: bool,
    pub iconified: bool,
    pub fullscreen: bool,
    pub title: Option<String>,
    pub icon_title: Option<String>,
    pub cursor: Option<CursorHandle>,
    pub event_mask: EventMask,
    gl: Option<(GlConfigHandle, bool)>,
}

impl WidgetInfo {
    fn new(kind: WidgetKind, geometry: Geometry) -> Self {
        Self {
            kind,
            geometry,
            shown: false,
            iconified: false,
            fullscreen: false,
            title: None,
            icon_title: None,
            cursor: None,
            event_mask: EventMask::empty(),
            gl: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Connection {
    window: WindowId,
    widget: WidgetHandle,
    signal: NativeSignal,
    handle: SignalHandle,
    active: bool,
}

#[derive(Debug)]
struct Shared {
    next_handle: u64,
    screen: (i32, i32),
    screen_mm: (i32, i32),
    deny_gl_config: bool,
    deny_direct: bool,
    widgets: HashMap<WidgetHandle, WidgetInfo>,
    connections: Vec<Connection>,
    pending: VecDeque<Event>,
    idle_enabled: bool,
    idle_remove_fails: bool,
    next_timer: u64,
    scheduled_timers: Vec<(TimerHandle, u32)>,
    popups: Vec<(WidgetHandle, MouseButton)>,
    warps: Vec<(WidgetHandle, i32, i32)>,
    pointer: (i32, i32),
    viewports: Vec<(i32, i32)>,
    swaps: usize,
    flushes: usize,
    invalidated: Vec<WidgetHandle>,
    gl_mode: Option<DisplayMode>,
    pending_gl_errors: Vec<u32>,
    extensions: Option<String>,
    connects_total: u64,
}

impl Shared {
    fn new() -> Self {
        Self {
            next_handle: 1,
            screen: (1280, 1024),
            screen_mm: (340, 270),
            deny_gl_config: false,
            deny_direct: false,
            widgets: HashMap::new(),
            connections: Vec::new(),
            pending: VecDeque::new(),
            idle_enabled: false,
            idle_remove_fails: false,
            next_timer: 1,
            scheduled_timers: Vec::new(),
            popups: Vec::new(),
            warps: Vec::new(),
            pointer: (0, 0),
            viewports: Vec::new(),
            swaps: 0,
            flushes: 0,
            invalidated: Vec::new(),
            gl_mode: None,
            pending_gl_errors: Vec::new(),
            extensions: Some("GL_ARB_multitexture GL_EXT_texture3D".into()),
            connects_total: 0,
        }
    }

    fn alloc(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn new_widget(&mut self, kind: WidgetKind, geometry: Geometry) -> WidgetHandle {
        let handle = WidgetHandle(self.alloc());
        self.widgets.insert(handle, WidgetInfo::new(kind, geometry));
        handle
    }
}

/// The recording backend. Create it paired with its driver handle via
/// [`Headless::new`].
#[derive(Debug)]
pub struct Headless {
    shared: Rc<RefCell<Shared>>,
}

/// Test-side view of a [`Headless`] backend: injects native events and
/// inspects what the engine asked the toolkit to do.
#[derive(Debug, Clone)]
pub struct HeadlessHandle {
    shared: Rc<RefCell<Shared>>,
}

impl Headless {
    pub fn new() -> (Self, HeadlessHandle) {
        let shared = Rc::new(RefCell::new(Shared::new()));
        (Self { shared: shared.clone() }, HeadlessHandle { shared })
    }
}

impl HeadlessHandle {
    /// Queues a native event for the next pump.
    pub fn push(&self, event: Event) {
        self.shared.borrow_mut().pending.push_back(event);
    }

    /// Whether a native listener for `signal` is currently installed on
    /// behalf of `window`.
    pub fn is_connected(&self, window: WindowId, signal: NativeSignal) -> bool {
        self.shared
            .borrow()
            .connections
            .iter()
            .any(|c| c.window == window && c.signal == signal && c.active)
    }

    /// How many listeners for `signal` are installed for `window` right
    /// now. The shared-listener invariants want exactly zero or one.
    pub fn active_connections(&self, window: WindowId, signal: NativeSignal) -> usize {
        self.shared
            .borrow()
            .connections
            .iter()
            .filter(|c| c.window == window && c.signal == signal && c.active)
            .count()
    }

    /// Total number of connect calls ever made for `window`/`signal`,
    /// including listeners that were later disconnected.
    pub fn connects_ever(&self, window: WindowId, signal: NativeSignal) -> usize {
        self.shared
            .borrow()
            .connections
            .iter()
            .filter(|c| c.window == window && c.signal == signal)
            .count()
    }

    /// The widgets created for `window`, located through its structural
    /// listeners: (frame, event box, drawing area).
    pub fn widgets_of(&self, window: WindowId) -> (Option<WidgetHandle>, Option<WidgetHandle>, Option<WidgetHandle>) {
        let shared = self.shared.borrow();
        let find = |signal: NativeSignal| {
            shared
                .connections
                .iter()
                .find(|c| c.window == window && c.signal == signal)
                .map(|c| c.widget)
        };
        (find(NativeSignal::Close), find(NativeSignal::BoxResize), find(NativeSignal::Expose))
    }

    pub fn widget(&self, handle: WidgetHandle) -> Option<WidgetInfo> {
        self.shared.borrow().widgets.get(&handle).cloned()
    }

    /// Refuse to produce any GL configuration.
    pub fn set_deny_gl_config(&self, deny: bool) {
        self.shared.borrow_mut().deny_gl_config = deny;
    }

    /// Pretend direct-rendering visuals are unavailable.
    pub fn set_deny_direct(&self, deny: bool) {
        self.shared.borrow_mut().deny_direct = deny;
    }

    /// Make the next idle-source removal fail.
    pub fn set_idle_remove_fails(&self, fails: bool) {
        self.shared.borrow_mut().idle_remove_fails = fails;
    }

    pub fn set_pointer(&self, x: i32, y: i32) {
        self.shared.borrow_mut().pointer = (x, y);
    }

    pub fn set_extensions(&self, extensions: Option<&str>) {
        self.shared.borrow_mut().extensions = extensions.map(str::to_owned);
    }

    pub fn inject_gl_error(&self, code: u32) {
        self.shared.borrow_mut().pending_gl_errors.push(code);
    }

    pub fn popups(&self) -> Vec<(WidgetHandle, MouseButton)> {
        self.shared.borrow().popups.clone()
    }

    pub fn warps(&self) -> Vec<(WidgetHandle, i32, i32)> {
        self.shared.borrow().warps.clone()
    }

    pub fn scheduled_timers(&self) -> Vec<(TimerHandle, u32)> {
        self.shared.borrow().scheduled_timers.clone()
    }

    pub fn idle_enabled(&self) -> bool {
        self.shared.borrow().idle_enabled
    }

    pub fn swap_count(&self) -> usize {
        self.shared.borrow().swaps
    }

    pub fn flush_count(&self) -> usize {
        self.shared.borrow().flushes
    }

    pub fn invalidated(&self) -> Vec<WidgetHandle> {
        self.shared.borrow().invalidated.clone()
    }

    pub fn viewports(&self) -> Vec<(i32, i32)> {
        self.shared.borrow().viewports.clone()
    }
}

impl Toolkit for Headless {
    fn init(&mut self, args: &mut Vec<String>) -> Result<()> {
        // Consume the toolkit-owned arguments the way a display-backed
        // toolkit would.
        let mut i = 0;
        while i < args.len() {
            if args[i] == "--display" {
                args.remove(i);
                if i < args.len() {
                    args.remove(i);
                }
            } else if args[i] == "--sync" {
                args.remove(i);
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    fn screen_size(&self) -> (i32, i32) {
        self.shared.borrow().screen
    }

    fn screen_size_mm(&self) -> (i32, i32) {
        self.shared.borrow().screen_mm
    }

    fn find_gl_config(&mut self, mode: DisplayMode) -> Option<GlConfigHandle> {
        let mut shared = self.shared.borrow_mut();
        if shared.deny_gl_config {
            return None;
        }
        shared.gl_mode = Some(mode);
        let handle = shared.alloc();
        Some(GlConfigHandle(handle))
    }

    fn gl_config_attrib(&self, _config: GlConfigHandle, attrib: GlAttrib) -> i32 {
        let shared = self.shared.borrow();
        let mode = shared.gl_mode.unwrap_or_else(DisplayMode::default_mode);
        match attrib {
            GlAttrib::Rgba => (!mode.contains(DisplayMode::INDEX)) as i32,
            GlAttrib::BufferSize => 24,
            GlAttrib::RedSize | GlAttrib::GreenSize | GlAttrib::BlueSize => 8,
            GlAttrib::AlphaSize => {
                if mode.contains(DisplayMode::ALPHA) {
                    8
                } else {
                    0
                }
            }
            GlAttrib::DepthSize => {
                if mode.contains(DisplayMode::DEPTH) {
                    24
                } else {
                    0
                }
            }
            GlAttrib::StencilSize => {
                if mode.contains(DisplayMode::STENCIL) {
                    8
                } else {
                    0
                }
            }
            GlAttrib::AccumRedSize
            | GlAttrib::AccumGreenSize
            | GlAttrib::AccumBlueSize
            | GlAttrib::AccumAlphaSize => {
                if mode.contains(DisplayMode::ACCUM) {
                    16
                } else {
                    0
                }
            }
            GlAttrib::DoubleBuffered => mode.contains(DisplayMode::DOUBLE) as i32,
            GlAttrib::Stereo => mode.contains(DisplayMode::STEREO) as i32,
            GlAttrib::Samples => {
                if mode.contains(DisplayMode::MULTISAMPLE) {
                    4
                } else {
                    0
                }
            }
            GlAttrib::FormatId => 1,
        }
    }

    fn create_widget_tree(
        &mut self,
        parent: Option<&WidgetTree>,
        title: Option<&str>,
        geometry: Geometry,
        iconic: bool,
    ) -> WidgetTree {
        let mut shared = self.shared.borrow_mut();

        let frame = if parent.is_none() {
            let handle = WidgetHandle(shared.alloc());
            let mut info = WidgetInfo::new(WidgetKind::Frame, geometry);
            info.title = title.map(str::to_owned);
            info.iconified = iconic;
            info.shown = true;
            shared.widgets.insert(handle, info);
            Some(handle)
        } else {
            None
        };

        let mut child = |shared: &mut Shared, kind| {
            let handle = WidgetHandle(shared.alloc());
            let mut info = WidgetInfo::new(kind, geometry);
            info.shown = true;
            shared.widgets.insert(handle, info);
            handle
        };
        let event_box = child(&mut shared, WidgetKind::EventBox);
        let fixed = child(&mut shared, WidgetKind::Fixed);
        let drawing_area = child(&mut shared, WidgetKind::DrawingArea);

        WidgetTree { frame, event_box, fixed, drawing_area }
    }

    fn set_gl_capability(
        &mut self,
        area: WidgetHandle,
        config: GlConfigHandle,
        direct: bool,
        _rgba: bool,
    ) -> bool {
        let mut shared = self.shared.borrow_mut();
        let realized_direct = direct && !shared.deny_direct;
        if let Some(info) = shared.widgets.get_mut(&area) {
            info.gl = Some((config, realized_direct));
            true
        } else {
            false
        }
    }

    fn context_is_direct(&self, area: WidgetHandle) -> bool {
        self.shared
            .borrow()
            .widgets
            .get(&area)
            .and_then(|info| info.gl)
            .map(|(_, direct)| direct)
            .unwrap_or(false)
    }

    fn destroy_widget(&mut self, widget: WidgetHandle) {
        let mut shared = self.shared.borrow_mut();
        shared.widgets.remove(&widget);
        for connection in &mut shared.connections {
            if connection.widget == widget {
                connection.active = false;
            }
        }
    }

    fn connect(
        &mut self,
        window: WindowId,
        widget: WidgetHandle,
        signal: NativeSignal,
    ) -> SignalHandle {
        let mut shared = self.shared.borrow_mut();
        let handle = SignalHandle(shared.alloc());
        shared.connects_total += 1;
        shared.connections.push(Connection { window, widget, signal, handle, active: true });
        handle
    }

    fn disconnect(&mut self, widget: WidgetHandle, handle: SignalHandle) {
        let mut shared = self.shared.borrow_mut();
        for connection in &mut shared.connections {
            if connection.widget == widget && connection.handle == handle {
                connection.active = false;
            }
        }
    }

    fn add_events(&mut self, widget: WidgetHandle, mask: EventMask) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&widget) {
            info.event_mask |= mask;
        }
    }

    fn grab_focus(&mut self, _widget: WidgetHandle) {}

    fn show_widget(&mut self, widget: WidgetHandle) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&widget) {
            info.shown = true;
        }
    }

    fn hide_widget(&mut self, widget: WidgetHandle) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&widget) {
            info.shown = false;
        }
    }

    fn iconify(&mut self, frame: WidgetHandle) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&frame) {
            info.iconified = true;
        }
    }

    fn deiconify(&mut self, frame: WidgetHandle) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&frame) {
            info.iconified = false;
        }
    }

    fn set_fullscreen(&mut self, frame: WidgetHandle, fullscreen: bool) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&frame) {
            info.fullscreen = fullscreen;
        }
    }

    fn move_frame(&mut self, frame: WidgetHandle, x: i32, y: i32) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&frame) {
            info.geometry.x = x;
            info.geometry.y = y;
        }
    }

    fn resize_frame(&mut self, frame: WidgetHandle, width: i32, height: i32) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&frame) {
            info.geometry.width = width;
            info.geometry.height = height;
        }
    }

    fn move_child(&mut self, _fixed: WidgetHandle, child: WidgetHandle, x: i32, y: i32) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&child) {
            info.geometry.x = x;
            info.geometry.y = y;
        }
    }

    fn set_size_request(&mut self, widget: WidgetHandle, width: i32, height: i32) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&widget) {
            info.geometry.width = width;
            info.geometry.height = height;
        }
    }

    fn raise(&mut self, _widget: WidgetHandle) {}

    fn lower(&mut self, _widget: WidgetHandle) {}

    fn set_title(&mut self, frame: WidgetHandle, title: &str) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&frame) {
            info.title = Some(title.to_owned());
        }
    }

    fn set_icon_title(&mut self, frame: WidgetHandle, title: &str) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&frame) {
            info.icon_title = Some(title.to_owned());
        }
    }

    fn widget_geometry(&self, widget: WidgetHandle) -> Geometry {
        self.shared
            .borrow()
            .widgets
            .get(&widget)
            .map(|info| info.geometry)
            .unwrap_or(Geometry { x: 0, y: 0, width: 0, height: 0 })
    }

    fn create_cursor(&mut self, _kind: CursorKind) -> Option<CursorHandle> {
        let handle = self.shared.borrow_mut().alloc();
        Some(CursorHandle(handle))
    }

    fn set_cursor(&mut self, widget: WidgetHandle, cursor: Option<CursorHandle>) {
        if let Some(info) = self.shared.borrow_mut().widgets.get_mut(&widget) {
            info.cursor = cursor;
        }
    }

    fn warp_pointer(&mut self, area: WidgetHandle, x: i32, y: i32) -> Result<()> {
        let mut shared = self.shared.borrow_mut();
        shared.warps.push((area, x, y));
        shared.pointer = (x, y);
        Ok(())
    }

    fn pointer_position(&self, _area: WidgetHandle) -> (i32, i32) {
        self.shared.borrow().pointer
    }

    fn invalidate(&mut self, area: WidgetHandle) {
        self.shared.borrow_mut().invalidated.push(area);
    }

    fn begin_gl(&mut self, area: WidgetHandle) -> Result<DrawableHandle> {
        let shared = self.shared.borrow();
        match shared.widgets.get(&area) {
            Some(info) if info.gl.is_some() => Ok(DrawableHandle(area.0)),
            _ => Err(Error::new(ErrorKind::BadDrawable)),
        }
    }

    fn end_gl(&mut self, _drawable: DrawableHandle) {}

    fn gl_flush(&mut self) {
        self.shared.borrow_mut().flushes += 1;
    }

    fn swap_buffers(&mut self, _drawable: DrawableHandle) {
        self.shared.borrow_mut().swaps += 1;
    }

    fn is_double_buffered(&self, _drawable: DrawableHandle) -> bool {
        let shared = self.shared.borrow();
        shared.gl_mode.map(|mode| mode.contains(DisplayMode::DOUBLE)).unwrap_or(false)
    }

    fn set_viewport(&mut self, width: i32, height: i32) {
        self.shared.borrow_mut().viewports.push((width, height));
    }

    fn gl_errors(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.shared.borrow_mut().pending_gl_errors)
    }

    fn gl_extensions(&self) -> Option<String> {
        self.shared.borrow().extensions.clone()
    }

    fn gl_proc_address(&mut self, _name: &str) -> Option<*const c_void> {
        None
    }

    fn menu_new(&mut self, _root: Option<MenuId>) -> WidgetHandle {
        let mut shared = self.shared.borrow_mut();
        shared.new_widget(WidgetKind::Menu, Geometry { x: 0, y: 0, width: 0, height: 0 })
    }

    fn menu_append_item(
        &mut self,
        menu: WidgetHandle,
        label: &str,
        _activate: Option<(MenuId, i32)>,
    ) -> WidgetHandle {
        let mut shared = self.shared.borrow_mut();
        let item =
            shared.new_widget(WidgetKind::MenuItem, Geometry { x: 0, y: 0, width: 0, height: 0 });
        if let Some(info) = shared.widgets.get_mut(&item) {
            info.title = Some(label.to_owned());
        }
        debug_assert!(shared.widgets.get(&menu).map(|m| m.kind) == Some(WidgetKind::Menu));
        item
    }

    fn menu_set_submenu(&mut self, _item: WidgetHandle, _submenu: WidgetHandle) {}

    fn menu_popup(&mut self, menu: WidgetHandle, button: MouseButton) {
        self.shared.borrow_mut().popups.push((menu, button));
    }

    fn add_timer(&mut self, msecs: u32) -> TimerHandle {
        let mut shared = self.shared.borrow_mut();
        let handle = TimerHandle(shared.next_timer);
        shared.next_timer += 1;
        shared.scheduled_timers.push((handle, msecs));
        handle
    }

    fn set_idle_enabled(&mut self, enabled: bool) -> bool {
        let mut shared = self.shared.borrow_mut();
        if !enabled && shared.idle_remove_fails {
            return false;
        }
        shared.idle_enabled = enabled;
        true
    }

    fn pump(&mut self, block: bool) -> Pump {
        let mut shared = self.shared.borrow_mut();
        let events: Vec<Event> = shared.pending.drain(..).collect();
        if events.is_empty() {
            if !block && shared.idle_enabled {
                return Pump { events: vec![Event::IdleTick], ended: false };
            }
            return Pump { events, ended: block };
        }
        Pump { events, ended: false }
    }
}
