//! Window records, lifecycle and native-event dispatch.
//!
//! A window is a nested widget tree owned by the toolkit plus the shim's
//! bookkeeping: parent/children links, the per-event-class signal slots,
//! the visibility/status state machine and the per-button menu bindings.
//! Window ids are table indices that are never recycled.

use std::any::Any;
use std::rc::Rc;

use crate::callback::{
    stale_window_warning, CloseFn, DisplayFn, EntryFn, KeyboardFn, MotionFn, MouseFn, ReshapeFn,
    SignalSlot, SpecialFn, VisibilityFn, WheelFn, WindowStatusFn,
};
use crate::config::{CloseAction, DirectRender, Geometry};
use crate::context::Glut;
use crate::error::{fatal, warning};
use crate::event::{
    ascii_fallback, special_from_keysym, ButtonState, EntryState, Keysym, Modifiers, MouseButton,
    ScrollDirection, Visibility, WindowStatus, MAX_MOUSE_BUTTONS,
};
use crate::platform::{CursorKind, Event, EventMask, NativeSignal, WidgetTree};
use crate::registry::{MenuId, WindowId};

/// Cursor selector in the legacy vocabulary.
///
/// `FullCrosshair` is served as `Crosshair`; `Inherit` restores the
/// parent window's cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cursor {
    RightArrow,
    LeftArrow,
    Info,
    Destroy,
    Help,
    Cycle,
    Spray,
    Wait,
    Text,
    Crosshair,
    UpDown,
    LeftRight,
    TopSide,
    BottomSide,
    LeftSide,
    RightSide,
    TopLeftCorner,
    TopRightCorner,
    BottomRightCorner,
    BottomLeftCorner,
    Inherit,
    None,
    FullCrosshair,
}

impl Cursor {
    pub(crate) fn from_raw(value: i32) -> Option<Self> {
        use Cursor::*;
        Some(match value {
            0 => RightArrow,
            1 => LeftArrow,
            2 => Info,
            3 => Destroy,
            4 => Help,
            5 => Cycle,
            6 => Spray,
            7 => Wait,
            8 => Text,
            9 => Crosshair,
            10 => UpDown,
            11 => LeftRight,
            12 => TopSide,
            13 => BottomSide,
            14 => LeftSide,
            15 => RightSide,
            16 => TopLeftCorner,
            17 => TopRightCorner,
            18 => BottomRightCorner,
            19 => BottomLeftCorner,
            100 => Inherit,
            101 => None,
            102 => FullCrosshair,
            _ => return Option::None,
        })
    }

    pub(crate) fn to_raw(self) -> i32 {
        use Cursor::*;
        match self {
            RightArrow => 0,
            LeftArrow => 1,
            Info => 2,
            Destroy => 3,
            Help => 4,
            Cycle => 5,
            Spray => 6,
            Wait => 7,
            Text => 8,
            Crosshair => 9,
            UpDown => 10,
            LeftRight => 11,
            TopSide => 12,
            BottomSide => 13,
            LeftSide => 14,
            RightSide => 15,
            TopLeftCorner => 16,
            TopRightCorner => 17,
            BottomRightCorner => 18,
            BottomLeftCorner => 19,
            Inherit => 100,
            None => 101,
            FullCrosshair => 102,
        }
    }

    /// The concrete image to realize, after aliasing. `None` means the
    /// selector resolves to the inherited cursor.
    fn to_kind(self) -> Option<CursorKind> {
        use Cursor::*;
        Some(match self {
            RightArrow => CursorKind::RightArrow,
            LeftArrow => CursorKind::LeftArrow,
            Info => CursorKind::Info,
            Destroy => CursorKind::Destroy,
            Help => CursorKind::Help,
            Cycle => CursorKind::Cycle,
            Spray => CursorKind::Spray,
            Wait => CursorKind::Wait,
            Text => CursorKind::Text,
            Crosshair | FullCrosshair => CursorKind::Crosshair,
            UpDown => CursorKind::UpDown,
            LeftRight => CursorKind::LeftRight,
            TopSide => CursorKind::TopSide,
            BottomSide => CursorKind::BottomSide,
            LeftSide => CursorKind::LeftSide,
            RightSide => CursorKind::RightSide,
            TopLeftCorner => CursorKind::TopLeftCorner,
            TopRightCorner => CursorKind::TopRightCorner,
            BottomRightCorner => CursorKind::BottomRightCorner,
            BottomLeftCorner => CursorKind::BottomLeftCorner,
            None => CursorKind::Blank,
            Inherit => return Option::None,
        })
    }
}

/// Everything the shim tracks about one window.
pub(crate) struct Window {
    pub(crate) widgets: WidgetTree,
    pub(crate) parent: Option<WindowId>,
    pub(crate) children: Vec<WindowId>,
    /// Drives the synthetic reshape that precedes the first paint.
    pub(crate) first_displayed: bool,
    pub(crate) fullscreen: bool,
    pub(crate) iconified: bool,
    /// Two-state visibility; `None` until the first notification (or
    /// after a registration reset).
    pub(crate) visible: Option<bool>,
    pub(crate) status: Option<WindowStatus>,
    pub(crate) cursor: Cursor,
    pub(crate) damaged: bool,
    pub(crate) display: Option<Rc<DisplayFn>>,
    pub(crate) reshape: Option<Rc<ReshapeFn>>,
    pub(crate) close: Option<Rc<CloseFn>>,
    pub(crate) visibility: SignalSlot<VisibilityFn>,
    pub(crate) status_slot: SignalSlot<WindowStatusFn>,
    pub(crate) keyboard: SignalSlot<KeyboardFn>,
    pub(crate) keyboard_up: SignalSlot<KeyboardFn>,
    pub(crate) special: SignalSlot<SpecialFn>,
    pub(crate) special_up: SignalSlot<SpecialFn>,
    pub(crate) mouse_press: SignalSlot<MouseFn>,
    pub(crate) mouse_release: SignalSlot<MouseFn>,
    pub(crate) wheel: SignalSlot<WheelFn>,
    pub(crate) motion: SignalSlot<MotionFn>,
    pub(crate) passive_motion: SignalSlot<MotionFn>,
    pub(crate) entry: SignalSlot<EntryFn>,
    /// Mouse button index to bound menu; shares the press/release
    /// listeners with the mouse callback.
    pub(crate) button_menu: [Option<MenuId>; MAX_MOUSE_BUTTONS],
    pub(crate) user_data: Option<Box<dyn Any>>,
}

impl Window {
    fn new(widgets: WidgetTree, parent: Option<WindowId>, iconified: bool) -> Self {
        Self {
            widgets,
            parent,
            children: Vec::new(),
            first_displayed: false,
            fullscreen: false,
            iconified,
            visible: Some(false),
            status: Some(WindowStatus::Hidden),
            cursor: Cursor::Inherit,
            damaged: true,
            display: None,
            reshape: None,
            close: None,
            visibility: SignalSlot::new(),
            status_slot: SignalSlot::new(),
            keyboard: SignalSlot::new(),
            keyboard_up: SignalSlot::new(),
            special: SignalSlot::new(),
            special_up: SignalSlot::new(),
            mouse_press: SignalSlot::new(),
            mouse_release: SignalSlot::new(),
            wheel: SignalSlot::new(),
            motion: SignalSlot::new(),
            passive_motion: SignalSlot::new(),
            entry: SignalSlot::new(),
            button_menu: [None; MAX_MOUSE_BUTTONS],
            user_data: None,
        }
    }
}

impl Glut {
    /// Creates a new top-level window with the init-time geometry and
    /// display mode, makes it current, and returns its id.
    pub fn create_window(&mut self, title: &str) -> WindowId {
        self.check_init("create_window");
        let geometry = self.init.geometry;
        let id = self.create_window_impl("create_window", None, geometry, Some(title));
        self.live_toplevels += 1;
        id
    }

    /// Creates a subwindow embedded in `parent` at the given position.
    /// Subwindows inherit the display mode and are invisible to the
    /// window manager.
    pub fn create_sub_window(
        &mut self,
        parent: WindowId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> WindowId {
        self.check_init("create_sub_window");

        if self.windows.get(parent.0).is_none() {
            fatal!(
                "create_sub_window",
                "trying to create a subwindow of nonexistent window {parent}"
            );
        }
        if width < 1 || height < 1 {
            fatal!("create_sub_window", "non-positive width or height not allowed");
        }

        let geometry = Geometry { x, y, width, height };
        self.create_window_impl("create_sub_window", Some(parent), geometry, None)
    }

    /// Builds the widget tree, negotiates the GL surface with the
    /// direct-to-indirect fallback, registers the structural listeners
    /// and makes the new window current.
    fn create_window_impl(
        &mut self,
        func_name: &'static str,
        parent: Option<WindowId>,
        geometry: Geometry,
        title: Option<&str>,
    ) -> WindowId {
        let Some(config) = self.gl_config else {
            fatal!(func_name, "no appropriate OpenGL-capable visual found");
        };

        let iconic = parent.is_none() && self.init.iconic;
        let parent_tree = parent.map(|p| self.window_ref(p).widgets);
        let tree = self.toolkit.create_widget_tree(parent_tree.as_ref(), title, geometry, iconic);

        // GL capability with the one automatic retry in the whole core:
        // a failed direct visual downgrades to indirect unless direct
        // was explicitly mandated.
        let rgba = self.toolkit.gl_config_attrib(config, crate::platform::GlAttrib::Rgba) != 0;
        let want_direct = self.init.direct != DirectRender::Indirect;
        if !self.toolkit.set_gl_capability(tree.drawing_area, config, want_direct, rgba)
            && !self.toolkit.set_gl_capability(tree.drawing_area, config, false, rgba)
        {
            fatal!(func_name, "can't create OpenGL visual");
        }
        self.toolkit.add_events(tree.drawing_area, EventMask::ENTER_NOTIFY);

        let is_direct = self.toolkit.context_is_direct(tree.drawing_area);
        if !is_direct {
            match self.init.direct {
                DirectRender::Unset => {
                    warning!(
                        func_name,
                        "can't create direct OpenGL visual, decreased to slower indirect rendering"
                    );
                    self.init.direct = DirectRender::Indirect;
                }
                DirectRender::Direct => {
                    fatal!(func_name, "can't create direct OpenGL visual");
                }
                DirectRender::Indirect => {}
            }
        }

        let id = WindowId(self.windows.insert(Window::new(tree, parent, iconic)));

        if let Some(parent) = parent {
            self.window_mut(parent).children.push(id);
        }

        // Structural listeners are always present, independent of which
        // client callbacks get registered later.
        if let Some(frame) = tree.frame {
            self.toolkit.connect(id, frame, NativeSignal::Close);
            self.toolkit.connect(id, frame, NativeSignal::WindowState);
        }
        self.toolkit.connect(id, tree.event_box, NativeSignal::BoxResize);
        self.toolkit.connect(id, tree.drawing_area, NativeSignal::AreaResize);
        self.toolkit.connect(id, tree.drawing_area, NativeSignal::Expose);
        self.toolkit.connect(id, tree.drawing_area, NativeSignal::Enter);

        self.set_window(id);

        id
    }

    /// Destroys `win` and every subwindow below it. For a top-level
    /// window the close callback (if any) runs first, with that window
    /// current. The id is never reused.
    pub fn destroy_window(&mut self, win: WindowId) {
        if !self.destroy_window_impl("destroy_window", win) {
            return;
        }

        if self.live_toplevels < 1 {
            match self.close_action {
                // The last window is gone; the process has nothing left
                // to run for.
                CloseAction::Exit => {
                    std::process::exit(0);
                }
                CloseAction::MainLoopReturns | CloseAction::ContinueExecution => {
                    self.loop_done = true;
                }
            }
        }
    }

    pub(crate) fn destroy_window_impl(&mut self, func_name: &'static str, win: WindowId) -> bool {
        self.check_init(func_name);

        let Some(record) = self.windows.get(win.0) else {
            warning!(func_name, "trying to destroy nonexistent window {win}");
            return false;
        };

        let parent = record.parent;
        let close = record.close.clone();
        let widget_to_destroy = match record.widgets.frame {
            Some(frame) => frame,
            None => record.widgets.event_box,
        };

        if parent.is_none() {
            self.live_toplevels -= 1;
            if let Some(close) = close {
                self.set_window(win);
                close(self);
            }
        } else if let Some(parent) = parent {
            match self.windows.get_mut(parent.0) {
                Some(parent_record) => parent_record.children.retain(|child| *child != win),
                None => warning!(func_name, "attempt on bogus window {parent}"),
            }
        }

        self.drop_window_records(win);
        self.toolkit.destroy_widget(widget_to_destroy);
        true
    }

    /// Recursively vacates the table slots; the toolkit widgets go away
    /// with the subtree root.
    fn drop_window_records(&mut self, win: WindowId) {
        let Some(record) = self.windows.vacate(win.0) else {
            warning!("destroy_window", "internal error, window {win} already destroyed");
            return;
        };

        if self.current_window == Some(win) {
            self.current_window = None;
            self.current_drawable = None;
        }

        for child in record.children {
            self.drop_window_records(child);
        }
    }

    /// Destroys every live window, top-level or not.
    pub(crate) fn destroy_all_windows(&mut self) {
        self.check_init("destroy_all_windows");
        for id in self.windows.live_ids() {
            if self.windows.get(id).is_some() {
                self.destroy_window_impl("destroy_all_windows", WindowId(id));
            }
        }
    }

    /// Selects the current window and rebinds the GL context: the
    /// previously bound drawable is released first, because native
    /// contexts do not nest.
    pub fn set_window(&mut self, win: WindowId) {
        self.check_init("set_window");

        if !self.windows.in_range(win.0) {
            warning!("set_window", "attempted on bogus window {win}");
            return;
        }

        self.current_window = Some(win);

        let Some(record) = self.windows.get(win.0) else {
            warning!("set_window", "trying to make nonexistent window {win} current");
            return;
        };
        let area = record.widgets.drawing_area;

        if let Some(previous) = self.current_drawable.take() {
            self.toolkit.end_gl(previous);
        }

        match self.toolkit.begin_gl(area) {
            Ok(drawable) => self.current_drawable = Some(drawable),
            Err(_) => warning!("set_window", "can't begin drawing on GL surface of window {win}"),
        }
    }

    /// The current window, or `None` when it was destroyed and nothing
    /// has been made current since.
    pub fn get_window(&self) -> Option<WindowId> {
        self.check_init("get_window");
        self.current_window.filter(|win| self.windows.get(win.0).is_some())
    }

    /// Finishes drawing the current window: flushes, and swaps the back
    /// buffer when the window is double-buffered.
    pub fn swap_buffers(&mut self) {
        self.check_init("swap_buffers");
        if self.active_window("swap_buffers").is_some() {
            self.toolkit.gl_flush();
            if let Some(drawable) = self.current_drawable {
                if self.toolkit.is_double_buffered(drawable) {
                    self.toolkit.swap_buffers(drawable);
                }
            }
        }
    }

    /// Marks the current window as needing a redisplay; multiple
    /// requests coalesce into one paint.
    pub fn post_redisplay(&mut self) {
        let current = self.get_window();
        self.post_redisplay_impl("post_redisplay", current);
    }

    /// Marks an arbitrary window as needing a redisplay.
    pub fn post_window_redisplay(&mut self, win: WindowId) {
        self.post_redisplay_impl("post_window_redisplay", Some(win));
    }

    fn post_redisplay_impl(&mut self, func_name: &'static str, win: Option<WindowId>) {
        self.check_init(func_name);
        let area = win.and_then(|w| self.windows.get(w.0)).map(|r| r.widgets.drawing_area);
        match area {
            Some(area) => self.toolkit.invalidate(area),
            None => {
                warning!(func_name, "attempted on bogus window {}", display_id(win))
            }
        }
    }

    /// Requests that the current window become visible.
    pub fn show_window(&mut self) {
        self.check_init("show_window");
        let Some(id) = self.active_window("show_window") else { return };
        let record = self.window_ref(id);
        let (frame, event_box, iconified) =
            (record.widgets.frame, record.widgets.event_box, record.iconified);
        match frame {
            Some(frame) => {
                if iconified {
                    self.toolkit.deiconify(frame);
                }
                self.toolkit.show_widget(frame);
            }
            None => self.toolkit.show_widget(event_box),
        }
    }

    /// Hides the current window. The hidden transition propagates to
    /// every subwindow immediately.
    pub fn hide_window(&mut self) {
        self.check_init("hide_window");
        let Some(id) = self.active_window("hide_window") else { return };

        self.change_window_status(id, false, Some(WindowStatus::Hidden), true);
        self.set_window(id);

        let record = self.window_ref(id);
        let (frame, event_box) = (record.widgets.frame, record.widgets.event_box);
        match frame {
            Some(frame) => self.toolkit.hide_widget(frame),
            None => self.toolkit.hide_widget(event_box),
        }
    }

    /// Asks the window manager to iconify the current top-level window.
    /// Subwindows have no independent iconified state.
    pub fn iconify_window(&mut self) {
        self.check_init("iconify_window");
        let Some(id) = self.active_window("iconify_window") else { return };
        match self.window_ref(id).widgets.frame {
            Some(frame) => self.toolkit.iconify(frame),
            None => {
                warning!("iconify_window", "can't call this function on subwindow {id}")
            }
        }
    }

    /// Lowers the current window to the bottom of the stacking order.
    pub fn push_window(&mut self) {
        self.check_init("push_window");
        let Some(id) = self.active_window("push_window") else { return };
        let record = self.window_ref(id);
        match record.widgets.frame {
            Some(frame) => self.toolkit.lower(frame),
            None => {
                let event_box = record.widgets.event_box;
                let parent = record.parent;
                self.toolkit.lower(event_box);
                // A subwindow lowered below its parent's surface would
                // vanish; lower the parent surface too.
                if let Some(parent) = parent {
                    let parent_area = self.window_ref(parent).widgets.drawing_area;
                    self.toolkit.lower(parent_area);
                }
            }
        }
    }

    /// Raises the current window to the top of the stacking order.
    pub fn pop_window(&mut self) {
        self.check_init("pop_window");
        let Some(id) = self.active_window("pop_window") else { return };
        let record = self.window_ref(id);
        match record.widgets.frame {
            Some(frame) => self.toolkit.raise(frame),
            None => self.toolkit.raise(record.widgets.event_box),
        }
    }

    /// Makes the current top-level window cover the whole screen.
    pub fn full_screen(&mut self) {
        self.check_init("full_screen");
        let Some(id) = self.active_window("full_screen") else { return };
        match self.window_ref(id).widgets.frame {
            Some(frame) => {
                self.toolkit.set_fullscreen(frame, true);
                self.window_mut(id).fullscreen = true;
            }
            None => warning!("full_screen", "can't call this function on subwindow {id}"),
        }
    }

    pub(crate) fn disable_fullscreen(&mut self) {
        let Some(id) = self.active_window("disable_fullscreen") else { return };
        let record = self.window_ref(id);
        match record.widgets.frame {
            Some(frame) => {
                if record.fullscreen {
                    self.toolkit.set_fullscreen(frame, false);
                    self.window_mut(id).fullscreen = false;
                }
            }
            None => {
                warning!("disable_fullscreen", "can't call this function on subwindow {id}")
            }
        }
    }

    /// Repositions the current window: top-level windows relative to
    /// the screen, subwindows inside their parent.
    pub fn position_window(&mut self, x: i32, y: i32) {
        self.check_init("position_window");
        let Some(id) = self.active_window("position_window") else { return };
        let record = self.window_ref(id);
        match record.widgets.frame {
            Some(frame) => {
                self.disable_fullscreen();
                self.toolkit.move_frame(frame, x, y);
            }
            None => {
                let event_box = record.widgets.event_box;
                let parent = record.parent;
                if let Some(parent) = parent {
                    let fixed = self.window_ref(parent).widgets.fixed;
                    self.toolkit.move_child(fixed, event_box, x, y);
                }
            }
        }
    }

    /// Resizes the current window. The window system may alter or delay
    /// the request.
    pub fn reshape_window(&mut self, width: i32, height: i32) {
        self.check_init("reshape_window");
        let Some(id) = self.active_window("reshape_window") else { return };

        if width < 1 || height < 1 {
            warning!(
                "reshape_window",
                "non-positive width or height not allowed for window {id}"
            );
            return;
        }

        let record = self.window_ref(id);
        match record.widgets.frame {
            Some(frame) => {
                self.disable_fullscreen();
                self.toolkit.resize_frame(frame, width, height);
            }
            None => {
                let event_box = record.widgets.event_box;
                self.toolkit.set_size_request(event_box, width, height);
            }
        }
    }

    /// Changes the title of the current top-level window.
    pub fn set_window_title(&mut self, title: &str) {
        self.check_init("set_window_title");
        let Some(id) = self.active_window("set_window_title") else { return };
        match self.window_ref(id).widgets.frame {
            Some(frame) => self.toolkit.set_title(frame, title),
            None => {
                warning!("set_window_title", "can't call this function on subwindow {id}")
            }
        }
    }

    /// Changes the iconified title of the current top-level window.
    pub fn set_icon_title(&mut self, title: &str) {
        self.check_init("set_icon_title");
        let Some(id) = self.active_window("set_icon_title") else { return };
        match self.window_ref(id).widgets.frame {
            Some(frame) => self.toolkit.set_icon_title(frame, title),
            None => {
                warning!("set_icon_title", "can't call this function on subwindow {id}")
            }
        }
    }

    /// Sets the cursor shown over the current window. Unrealizable
    /// cursors warn and fall back to the inherited one.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.check_init("set_cursor");
        let Some(id) = self.active_window("set_cursor") else { return };
        let event_box = self.window_ref(id).widgets.event_box;

        let realized = match cursor.to_kind() {
            Some(kind) => {
                let cached = self.cursor_cache.get(&kind).copied();
                match cached {
                    Some(handle) => Some(handle),
                    None => match self.toolkit.create_cursor(kind) {
                        Some(handle) => {
                            self.cursor_cache.insert(kind, handle);
                            Some(handle)
                        }
                        None => None,
                    },
                }
            }
            None => None,
        };

        if realized.is_none() && cursor != Cursor::Inherit {
            warning!(
                "set_cursor",
                "trying to set unsupported cursor {cursor:?}, the inherited cursor will be used"
            );
        } else {
            self.window_mut(id).cursor = cursor;
        }

        self.toolkit.set_cursor(event_box, realized);
    }

    /// Moves the pointer to window-relative coordinates, as if the user
    /// had moved it; motion callbacks may fire in response.
    pub fn warp_pointer(&mut self, x: i32, y: i32) {
        self.check_init("warp_pointer");
        let Some(id) = self.active_window("warp_pointer") else { return };
        let area = self.window_ref(id).widgets.drawing_area;
        if let Err(err) = self.toolkit.warp_pointer(area, x, y) {
            warning!("warp_pointer", "pointer warp to {x} {y} failed: {err}");
        }
    }

    /// Associates arbitrary client data with the current window.
    pub fn set_window_data(&mut self, data: Option<Box<dyn Any>>) {
        self.check_init("set_window_data");
        if let Some(id) = self.active_window("set_window_data") {
            self.window_mut(id).user_data = data;
        }
    }

    /// Client data previously stored on the current window.
    pub fn window_data(&mut self) -> Option<&mut (dyn Any + 'static)> {
        self.check_init("window_data");
        let id = self.active_window("window_data")?;
        self.window_mut(id).user_data.as_deref_mut()
    }

    /// Applies a visibility/status transition to a window, firing the
    /// registered callbacks only when the respective derived view
    /// actually changed, and recursing into subwindows when asked to.
    pub(crate) fn change_window_status(
        &mut self,
        id: WindowId,
        visible: bool,
        status: Option<WindowStatus>,
        recurse: bool,
    ) {
        let Some(record) = self.windows.get_mut(id.0) else {
            stale_window_warning("change_window_status", id);
            return;
        };

        let call_visibility = record.visible != Some(visible);
        record.visible = Some(visible);

        let mut call_status = false;
        if let Some(status) = status {
            if record.status != Some(status) {
                record.status = Some(status);
                call_status = true;
            }
        }

        let visibility_cb = record.visibility.callback();
        let status_cb = record.status_slot.callback();
        let children = record.children.clone();

        if call_visibility {
            if let Some(callback) = visibility_cb {
                self.set_window(id);
                let value = if visible { Visibility::Visible } else { Visibility::NotVisible };
                callback(self, value);
                self.gl_debug();
            }
        }

        if call_status {
            if let (Some(callback), Some(status)) = (status_cb, status) {
                self.set_window(id);
                callback(self, status);
                self.gl_debug();
            }
        }

        if recurse {
            for child in children {
                self.change_window_status(child, visible, status, recurse);
            }
        }
    }

    /// Routes one translated native event into the per-window callback
    /// bookkeeping. The window named by the event becomes current before
    /// its callback runs.
    pub(crate) fn dispatch_event(&mut self, event: Event) {
        match event {
            Event::BoxResized { window, width, height } => {
                let Some(record) = self.windows.get(window.0) else {
                    stale_window_warning("box_resized", window);
                    return;
                };
                let area = record.widgets.drawing_area;
                self.toolkit.set_size_request(area, width, height);
            }

            Event::AreaResized { window, width, height } => {
                if self.windows.get(window.0).is_none() {
                    stale_window_warning("area_resized", window);
                    return;
                }
                self.set_window(window);
                self.reshape_call(window, width, height);
            }

            Event::Exposed { window, width, height } => self.exposed(window, width, height),

            Event::PointerEntered { window } => self.pointer_crossing(window, EntryState::Entered),
            Event::PointerLeft { window } => self.pointer_crossing(window, EntryState::Left),

            Event::CloseRequested { window } => self.close_requested(window),

            Event::StateChanged { window, withdrawn, iconified } => {
                if let Some(withdrawn) = withdrawn {
                    let status =
                        if withdrawn { WindowStatus::Hidden } else { WindowStatus::FullyRetained };
                    self.change_window_status(window, !withdrawn, Some(status), false);
                }
                if let Some(iconified) = iconified {
                    let status = if iconified { Some(WindowStatus::Hidden) } else { None };
                    self.change_window_status(window, !iconified, status, true);
                    match self.windows.get_mut(window.0) {
                        Some(record) => record.iconified = iconified,
                        None => stale_window_warning("state_changed", window),
                    }
                }
            }

            Event::OcclusionChanged { window, occlusion } => {
                let visible = occlusion != crate::event::Occlusion::FullyObscured;
                self.change_window_status(window, visible, Some(occlusion.to_status()), false);
            }

            Event::Key { window, pressed, keysym, text, modifiers } => {
                self.key_event(window, pressed, keysym, text, modifiers)
            }

            Event::Button { window, pressed, button, x, y, modifiers } => {
                self.button_event(window, pressed, button, x, y, modifiers)
            }

            Event::Scroll { window, direction, x, y, modifiers } => {
                self.scroll_event(window, direction, x, y, modifiers)
            }

            Event::Motion { window, x, y, modifiers } => {
                self.motion_event(window, x, y, modifiers)
            }

            Event::MenuItemActivated { menu, value } => self.menu_item_activated(menu, value),
            Event::MenuDismissed { menu } => self.menu_dismissed(menu),

            Event::TimerExpired { timer } => {
                if let Some((func, value)) = self.timers.remove(&timer) {
                    func(self, value);
                }
            }

            Event::IdleTick => {
                if let Some(idle) = self.idle.clone() {
                    idle(self);
                }
            }
        }
    }

    /// Paint path: enforces the mandatory display callback, fires the
    /// synthetic initial reshape once, then redraws.
    fn exposed(&mut self, window: WindowId, width: i32, height: i32) {
        let Some(record) = self.windows.get(window.0) else {
            stale_window_warning("exposed", window);
            return;
        };

        if record.display.is_none() {
            fatal!("display callback", "no display callback set for window {window}");
        }

        if !record.first_displayed {
            self.window_mut(window).first_displayed = true;
            self.set_window(window);
            self.reshape_call(window, width, height);
        }

        self.set_window(window);
        if let Some(display) = self.windows.get(window.0).and_then(|r| r.display.clone()) {
            display(self);
        }
        self.gl_debug();

        if let Some(record) = self.windows.get_mut(window.0) {
            record.damaged = false;
        }
    }

    /// Invokes the reshape callback, or resets the viewport when the
    /// window has none.
    pub(crate) fn reshape_call(&mut self, window: WindowId, width: i32, height: i32) {
        let Some(record) = self.windows.get_mut(window.0) else {
            stale_window_warning("reshape", window);
            return;
        };
        record.damaged = true;

        match record.reshape.clone() {
            Some(reshape) => reshape(self, width, height),
            None => self.toolkit.set_viewport(width, height),
        }
        self.gl_debug();
    }

    fn pointer_crossing(&mut self, window: WindowId, state: EntryState) {
        let Some(record) = self.windows.get(window.0) else {
            stale_window_warning("pointer_crossing", window);
            return;
        };

        self.toolkit.grab_focus(record.widgets.drawing_area);

        if let Some(callback) = record.entry.callback() {
            self.set_window(window);
            callback(self, state);
        }
        self.gl_debug();
    }

    /// Window-manager close request; the reaction is the process-wide
    /// close policy.
    fn close_requested(&mut self, window: WindowId) {
        if self.windows.get(window.0).is_none() {
            return;
        }

        match self.close_action {
            CloseAction::Exit => {
                self.destroy_all_windows();
                std::process::exit(0);
            }
            CloseAction::MainLoopReturns => {
                self.destroy_window_impl("close_requested", window);
                self.loop_done = true;
            }
            CloseAction::ContinueExecution => {
                self.destroy_window_impl("close_requested", window);
                if self.live_toplevels < 1 {
                    self.loop_done = true;
                }
            }
        }
    }

    /// Keyboard dispatch with the fixed native-to-legacy translation.
    /// The modifier snapshot is visible only for the callback's
    /// duration.
    fn key_event(
        &mut self,
        window: WindowId,
        pressed: bool,
        keysym: Keysym,
        text: Option<char>,
        modifiers: Modifiers,
    ) {
        let Some(record) = self.windows.get(window.0) else {
            stale_window_warning("key_event", window);
            return;
        };

        let (keyboard, special) = if pressed {
            (record.keyboard.callback(), record.special.callback())
        } else {
            (record.keyboard_up.callback(), record.special_up.callback())
        };

        if keyboard.is_none() && special.is_none() {
            self.gl_debug();
            return;
        }

        let area = record.widgets.drawing_area;
        let (mouse_x, mouse_y) = self.toolkit.pointer_position(area);

        // Delete, Tab and Backspace have no printable representation
        // and must be mapped by hand.
        let fallback = if text.is_none() { ascii_fallback(keysym) } else { None };

        if let Some(key) = text.map(|ch| ch as u8).or(fallback) {
            if let Some(callback) = keyboard {
                self.modifiers = Some(modifiers);
                self.set_window(window);
                callback(self, key, mouse_x, mouse_y);
                self.modifiers = None;
            }
        } else if let Some(key) = special_from_keysym(keysym) {
            if let Some(callback) = special {
                self.modifiers = Some(modifiers);
                self.set_window(window);
                callback(self, key, mouse_x, mouse_y);
                self.modifiers = None;
            }
        }

        self.gl_debug();
    }

    /// Button dispatch. A press on a button with a menu attached opens
    /// the popup tree instead of reaching the plain mouse callback.
    fn button_event(
        &mut self,
        window: WindowId,
        pressed: bool,
        native_button: u32,
        x: i32,
        y: i32,
        modifiers: Modifiers,
    ) {
        let Some(record) = self.windows.get(window.0) else {
            stale_window_warning("button_event", window);
            return;
        };

        let Some(button) = MouseButton::from_native(native_button) else {
            self.gl_debug();
            return;
        };

        let menu = record.button_menu[button.index()];
        if let Some(menu) = menu {
            if pressed {
                self.open_menu_popup(window, menu, button, x, y);
            }
        } else {
            let slot = if pressed { &record.mouse_press } else { &record.mouse_release };
            if let Some(callback) = slot.callback() {
                let state = if pressed { ButtonState::Down } else { ButtonState::Up };
                self.modifiers = Some(modifiers);
                self.set_window(window);
                callback(self, button, state, x, y);
                self.modifiers = None;
            }
        }

        self.gl_debug();
    }

    fn scroll_event(
        &mut self,
        window: WindowId,
        direction: ScrollDirection,
        x: i32,
        y: i32,
        modifiers: Modifiers,
    ) {
        let Some(record) = self.windows.get(window.0) else {
            stale_window_warning("scroll_event", window);
            return;
        };

        if let Some(callback) = record.wheel.callback() {
            let (wheel, direction) = direction.to_wheel();
            self.modifiers = Some(modifiers);
            self.set_window(window);
            callback(self, wheel, direction, x, y);
            self.modifiers = None;
        }

        self.gl_debug();
    }

    /// Motion is a drag while any button is held, passive otherwise.
    fn motion_event(&mut self, window: WindowId, x: i32, y: i32, modifiers: Modifiers) {
        let Some(record) = self.windows.get(window.0) else {
            stale_window_warning("motion_event", window);
            return;
        };

        let callback = if modifiers.any_button() {
            record.motion.callback()
        } else {
            record.passive_motion.callback()
        };

        if let Some(callback) = callback {
            self.modifiers = Some(modifiers);
            self.set_window(window);
            callback(self, x, y);
            self.modifiers = None;
        }

        self.gl_debug();
    }
}

fn display_id(win: Option<WindowId>) -> u32 {
    win.map(|w| w.0).unwrap_or(0)
}
