//! Per-window callback registration.
//!
//! Each input/window event class keeps a [`SignalSlot`]: the client
//! callback currently registered (if any), whether the widget was ever
//! asked to report the native event class, and the handle of the native
//! listener when one is installed. Several event classes share one
//! native listener between two callback slots — press/release, active/
//! passive motion, visibility/status — so installation happens when the
//! first of the pair becomes interested and removal only when both have
//! lost interest.

use std::fmt;
use std::rc::Rc;

use crate::context::Glut;
use crate::error::warning;
use crate::event::{
    ButtonState, EntryState, MenuState, MouseButton, SpecialKey, Visibility, WheelDirection,
    WindowStatus,
};
use crate::platform::{EventMask, NativeSignal, SignalHandle};
use crate::registry::WindowId;

/// Redraw the window contents. Mandatory; a window exposed without one
/// is a fatal error.
pub type DisplayFn = dyn Fn(&mut Glut);
/// New width and height after the surface changed size.
pub type ReshapeFn = dyn Fn(&mut Glut, i32, i32);
/// ASCII key with the pointer position at press time.
pub type KeyboardFn = dyn Fn(&mut Glut, u8, i32, i32);
/// Non-ASCII key with the pointer position at press time.
pub type SpecialFn = dyn Fn(&mut Glut, SpecialKey, i32, i32);
pub type MouseFn = dyn Fn(&mut Glut, MouseButton, ButtonState, i32, i32);
pub type WheelFn = dyn Fn(&mut Glut, i32, WheelDirection, i32, i32);
pub type MotionFn = dyn Fn(&mut Glut, i32, i32);
pub type EntryFn = dyn Fn(&mut Glut, EntryState);
pub type VisibilityFn = dyn Fn(&mut Glut, Visibility);
pub type WindowStatusFn = dyn Fn(&mut Glut, WindowStatus);
/// Invoked before a top-level window is torn down.
pub type CloseFn = dyn Fn(&mut Glut);
/// Receives the value of the selected menu item.
pub type MenuFn = dyn Fn(&mut Glut, i32);
pub type MenuStatusFn = dyn Fn(&mut Glut, MenuState, i32, i32);
pub type MenuStateFn = dyn Fn(&mut Glut, MenuState);
pub type IdleFn = dyn Fn(&mut Glut);
/// One-shot; consumed when the timeout fires.
pub type TimerFn = dyn FnOnce(&mut Glut, i32);

/// Bookkeeping for one event class on one window.
pub(crate) struct SignalSlot<F: ?Sized> {
    /// Whether the native event class was ever requested from the
    /// widget. Widening the event mask is one-way.
    pub(crate) event_added: bool,
    /// Handle of the installed native listener, kept for disconnection.
    pub(crate) handle: Option<SignalHandle>,
    pub(crate) callback: Option<Rc<F>>,
}

impl<F: ?Sized> SignalSlot<F> {
    pub(crate) fn new() -> Self {
        Self { event_added: false, handle: None, callback: None }
    }

    pub(crate) fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    pub(crate) fn callback(&self) -> Option<Rc<F>> {
        self.callback.clone()
    }
}

impl<F: ?Sized> fmt::Debug for SignalSlot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSlot")
            .field("event_added", &self.event_added)
            .field("handle", &self.handle)
            .field("callback", &self.has_callback())
            .finish()
    }
}

impl Glut {
    /// Sets the display callback for the current window.
    ///
    /// Every window must have one before it is first painted; there is
    /// no way to unset it.
    pub fn display_func(&mut self, func: Rc<DisplayFn>) {
        self.check_init("display_func");
        if let Some(id) = self.active_window("display_func") {
            self.window_mut(id).display = Some(func);
        }
    }

    /// Sets the reshape callback for the current window. Without one,
    /// resizes fall back to resetting the viewport.
    pub fn reshape_func(&mut self, func: Option<Rc<ReshapeFn>>) {
        self.check_init("reshape_func");
        if let Some(id) = self.active_window("reshape_func") {
            self.window_mut(id).reshape = func;
        }
    }

    /// Sets the close callback for the current window, invoked before a
    /// top-level window is destroyed.
    pub fn close_func(&mut self, func: Option<Rc<CloseFn>>) {
        self.check_init("close_func");
        if let Some(id) = self.active_window("close_func") {
            self.window_mut(id).close = func;
        }
    }

    /// Sets the two-state visibility callback for the current window.
    ///
    /// Superseded by [`Glut::window_status_func`]; both views are driven
    /// from the same native occlusion listener.
    pub fn visibility_func(&mut self, func: Option<Rc<VisibilityFn>>) {
        self.state_func("visibility_func", func, None, false)
    }

    /// Sets the occlusion-aware window status callback for the current
    /// window.
    pub fn window_status_func(&mut self, func: Option<Rc<WindowStatusFn>>) {
        self.state_func("window_status_func", None, func, true)
    }

    /// Shared install/remove logic behind the visibility and status
    /// registrations. `status_event` names the slot being assigned; the
    /// sibling slot decides whether the shared native listener may be
    /// removed.
    fn state_func(
        &mut self,
        func_name: &'static str,
        vis: Option<Rc<VisibilityFn>>,
        status: Option<Rc<WindowStatusFn>>,
        status_event: bool,
    ) {
        self.check_init(func_name);
        let Some(id) = self.active_window(func_name) else { return };

        let registering = if status_event { status.is_some() } else { vis.is_some() };

        let (area, event_added, has_vis, has_status, handle) = {
            let win = self.window_ref(id);
            (
                win.widgets.drawing_area,
                win.visibility.event_added,
                win.visibility.has_callback(),
                win.status_slot.has_callback(),
                win.visibility.handle,
            )
        };

        if registering {
            if !event_added {
                self.toolkit.add_events(area, EventMask::VISIBILITY_NOTIFY);
                let win = self.window_mut(id);
                win.visibility.event_added = true;
                win.status_slot.event_added = true;
            }

            if !has_vis && !has_status {
                let handle = self.toolkit.connect(id, area, NativeSignal::Occlusion);
                let win = self.window_mut(id);
                win.visibility.handle = Some(handle);
                win.status_slot.handle = Some(handle);
            }

            // Force the next native notification to look like a change
            // for the view being registered.
            let win = self.window_mut(id);
            if status_event {
                win.visible = None;
            } else {
                win.status = None;
            }
        } else if (status_event && has_status && !has_vis)
            || (!status_event && !has_status && has_vis)
        {
            if let Some(handle) = handle {
                self.toolkit.disconnect(area, handle);
            }
        }

        let win = self.window_mut(id);
        if status_event {
            win.status_slot.callback = status;
        } else {
            win.visibility.callback = vis;
        }
    }

    /// Sets the ASCII keyboard callback for the current window.
    pub fn keyboard_func(&mut self, func: Option<Rc<KeyboardFn>>) {
        self.check_init("keyboard_func");
        let Some(id) = self.active_window("keyboard_func") else { return };
        self.keyboard_signal_update(id, false, func.is_some());
        self.window_mut(id).keyboard.callback = func;
    }

    /// Sets the ASCII key-release callback for the current window.
    pub fn keyboard_up_func(&mut self, func: Option<Rc<KeyboardFn>>) {
        self.check_init("keyboard_up_func");
        let Some(id) = self.active_window("keyboard_up_func") else { return };
        self.keyboard_signal_update(id, true, func.is_some());
        self.window_mut(id).keyboard_up.callback = func;
    }

    /// Sets the special-key callback for the current window.
    pub fn special_func(&mut self, func: Option<Rc<SpecialFn>>) {
        self.check_init("special_func");
        let Some(id) = self.active_window("special_func") else { return };
        self.special_signal_update(id, false, func.is_some());
        self.window_mut(id).special.callback = func;
    }

    /// Sets the special-key release callback for the current window.
    pub fn special_up_func(&mut self, func: Option<Rc<SpecialFn>>) {
        self.check_init("special_up_func");
        let Some(id) = self.active_window("special_up_func") else { return };
        self.special_signal_update(id, true, func.is_some());
        self.window_mut(id).special_up.callback = func;
    }

    /// Install/remove logic for the plain keyboard slots. The press (or
    /// release) listener is shared with the corresponding special slot.
    fn keyboard_signal_update(&mut self, id: WindowId, up: bool, registering: bool) {
        let (area, event_added, has_plain, has_special, handle) = {
            let win = self.window_ref(id);
            let (plain, special) =
                if up { (&win.keyboard_up, &win.special_up) } else { (&win.keyboard, &win.special) };
            (
                win.widgets.drawing_area,
                plain.event_added,
                plain.has_callback(),
                special.has_callback(),
                plain.handle,
            )
        };

        if registering {
            if !event_added {
                let mask = if up { EventMask::KEY_RELEASE } else { EventMask::KEY_PRESS };
                self.toolkit.add_events(area, mask);
                let win = self.window_mut(id);
                if up {
                    win.keyboard_up.event_added = true;
                    win.special_up.event_added = true;
                } else {
                    win.keyboard.event_added = true;
                    win.special.event_added = true;
                }
            }
            if !has_plain && !has_special {
                let signal = if up { NativeSignal::KeyRelease } else { NativeSignal::KeyPress };
                let handle = self.toolkit.connect(id, area, signal);
                let win = self.window_mut(id);
                if up {
                    win.keyboard_up.handle = Some(handle);
                    win.special_up.handle = Some(handle);
                } else {
                    win.keyboard.handle = Some(handle);
                    win.special.handle = Some(handle);
                }
            }
        } else if has_plain && !has_special {
            // The slot being cleared is the last one interested.
            if let Some(handle) = handle {
                self.toolkit.disconnect(area, handle);
            }
        }
    }

    /// Same as [`Glut::keyboard_signal_update`], from the special side.
    fn special_signal_update(&mut self, id: WindowId, up: bool, registering: bool) {
        let (area, event_added, has_plain, has_special, handle) = {
            let win = self.window_ref(id);
            let (plain, special) =
                if up { (&win.keyboard_up, &win.special_up) } else { (&win.keyboard, &win.special) };
            (
                win.widgets.drawing_area,
                special.event_added,
                plain.has_callback(),
                special.has_callback(),
                special.handle,
            )
        };

        if registering {
            if !event_added {
                let mask = if up { EventMask::KEY_RELEASE } else { EventMask::KEY_PRESS };
                self.toolkit.add_events(area, mask);
                let win = self.window_mut(id);
                if up {
                    win.keyboard_up.event_added = true;
                    win.special_up.event_added = true;
                } else {
                    win.keyboard.event_added = true;
                    win.special.event_added = true;
                }
            }
            if !has_plain && !has_special {
                let signal = if up { NativeSignal::KeyRelease } else { NativeSignal::KeyPress };
                let handle = self.toolkit.connect(id, area, signal);
                let win = self.window_mut(id);
                if up {
                    win.keyboard_up.handle = Some(handle);
                    win.special_up.handle = Some(handle);
                } else {
                    win.keyboard.handle = Some(handle);
                    win.special.handle = Some(handle);
                }
            }
        } else if has_special && !has_plain {
            if let Some(handle) = handle {
                self.toolkit.disconnect(area, handle);
            }
        }
    }

    /// Sets the mouse-button callback for the current window.
    ///
    /// The press/release listeners are shared with menu bindings: a
    /// button with a menu attached keeps the listeners installed even
    /// after the callback is cleared.
    pub fn mouse_func(&mut self, func: Option<Rc<MouseFn>>) {
        self.check_init("mouse_func");
        let Some(id) = self.active_window("mouse_func") else { return };

        let has_callback = self.window_ref(id).mouse_press.has_callback();
        if has_callback {
            if func.is_none() {
                self.unregister_mouse_listener(id, None);
            }
        } else if func.is_some() {
            self.register_mouse_listener(id);
        }

        let win = self.window_mut(id);
        win.mouse_press.callback = func.clone();
        win.mouse_release.callback = func;
    }

    /// Sets the mouse-wheel callback for the current window.
    pub fn mouse_wheel_func(&mut self, func: Option<Rc<WheelFn>>) {
        self.check_init("mouse_wheel_func");
        let Some(id) = self.active_window("mouse_wheel_func") else { return };

        let (area, has_callback, event_added, handle) = {
            let win = self.window_ref(id);
            (
                win.widgets.drawing_area,
                win.wheel.has_callback(),
                win.wheel.event_added,
                win.wheel.handle,
            )
        };

        if has_callback {
            if func.is_none() {
                if let Some(handle) = handle {
                    self.toolkit.disconnect(area, handle);
                }
            }
        } else if func.is_some() {
            if !event_added {
                self.toolkit
                    .add_events(area, EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE);
                let win = self.window_mut(id);
                win.mouse_press.event_added = true;
                win.mouse_release.event_added = true;
                win.wheel.event_added = true;
            }
            let handle = self.toolkit.connect(id, area, NativeSignal::Scroll);
            self.window_mut(id).wheel.handle = Some(handle);
        }

        self.window_mut(id).wheel.callback = func;
    }

    /// Sets the dragging-motion callback for the current window.
    pub fn motion_func(&mut self, func: Option<Rc<MotionFn>>) {
        self.check_init("motion_func");
        let Some(id) = self.active_window("motion_func") else { return };
        self.motion_signal_update(id, false, func.is_some());
        self.window_mut(id).motion.callback = func;
    }

    /// Sets the button-less motion callback for the current window.
    pub fn passive_motion_func(&mut self, func: Option<Rc<MotionFn>>) {
        self.check_init("passive_motion_func");
        let Some(id) = self.active_window("passive_motion_func") else { return };
        self.motion_signal_update(id, true, func.is_some());
        self.window_mut(id).passive_motion.callback = func;
    }

    /// One pointer-move listener serves both motion slots.
    fn motion_signal_update(&mut self, id: WindowId, passive: bool, registering: bool) {
        let (area, event_added, has_motion, has_passive, handle) = {
            let win = self.window_ref(id);
            (
                win.widgets.drawing_area,
                win.passive_motion.event_added,
                win.motion.has_callback(),
                win.passive_motion.has_callback(),
                win.motion.handle,
            )
        };

        if !registering {
            if (passive && has_passive && !has_motion) || (!passive && !has_passive && has_motion) {
                if let Some(handle) = handle {
                    self.toolkit.disconnect(area, handle);
                }
            }
        } else {
            if !event_added && !has_motion {
                self.toolkit.add_events(area, EventMask::POINTER_MOTION);
                let win = self.window_mut(id);
                win.motion.event_added = true;
                win.passive_motion.event_added = true;
            }
            if !has_motion && !has_passive {
                let handle = self.toolkit.connect(id, area, NativeSignal::Motion);
                let win = self.window_mut(id);
                win.motion.handle = Some(handle);
                win.passive_motion.handle = Some(handle);
            }
        }
    }

    /// Sets the pointer enter/leave callback for the current window.
    pub fn entry_func(&mut self, func: Option<Rc<EntryFn>>) {
        self.check_init("entry_func");
        let Some(id) = self.active_window("entry_func") else { return };

        let (area, has_callback, event_added, handle) = {
            let win = self.window_ref(id);
            (
                win.widgets.drawing_area,
                win.entry.has_callback(),
                win.entry.event_added,
                win.entry.handle,
            )
        };

        if has_callback {
            if func.is_none() {
                if let Some(handle) = handle {
                    self.toolkit.disconnect(area, handle);
                }
            }
        } else if func.is_some() {
            if !event_added {
                self.toolkit.add_events(area, EventMask::LEAVE_NOTIFY);
                self.window_mut(id).entry.event_added = true;
            }
            let handle = self.toolkit.connect(id, area, NativeSignal::Leave);
            self.window_mut(id).entry.handle = Some(handle);
        }

        self.window_mut(id).entry.callback = func;
    }

    /// Installs the shared press/release listeners when neither the
    /// mouse callback nor any menu binding had them installed yet.
    pub(crate) fn register_mouse_listener(&mut self, id: WindowId) {
        let (area, event_added, has_callback, any_menu) = {
            let win = self.window_ref(id);
            (
                win.widgets.drawing_area,
                win.mouse_press.event_added,
                win.mouse_press.has_callback(),
                win.button_menu.iter().any(Option::is_some),
            )
        };

        if !event_added {
            self.toolkit.add_events(area, EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE);
            let win = self.window_mut(id);
            win.mouse_press.event_added = true;
            win.mouse_release.event_added = true;
            win.wheel.event_added = true;
        }

        if !has_callback && !any_menu {
            let press = self.toolkit.connect(id, area, NativeSignal::ButtonPress);
            let release = self.toolkit.connect(id, area, NativeSignal::ButtonRelease);
            let win = self.window_mut(id);
            win.mouse_press.handle = Some(press);
            win.mouse_release.handle = Some(release);
        }
    }

    /// Removes the shared press/release listeners once no menu binding
    /// and no callback needs them. `menu_button` names the binding being
    /// detached; `None` means the plain callback is being cleared.
    pub(crate) fn unregister_mouse_listener(&mut self, id: WindowId, menu_button: Option<usize>) {
        let (area, press_handle, release_handle, remove) = {
            let win = self.window_ref(id);
            let mut remove = true;
            for (i, slot) in win.button_menu.iter().enumerate() {
                if slot.is_some() && Some(i) != menu_button {
                    remove = false;
                }
            }
            if menu_button.is_some() && win.mouse_press.has_callback() {
                remove = false;
            }
            (win.widgets.drawing_area, win.mouse_press.handle, win.mouse_release.handle, remove)
        };

        if remove {
            if let Some(handle) = press_handle {
                self.toolkit.disconnect(area, handle);
            }
            if let Some(handle) = release_handle {
                self.toolkit.disconnect(area, handle);
            }
        }
    }

    /// Sets the global menu status callback, reported with the pointer
    /// position of the transition.
    pub fn menu_status_func(&mut self, func: Option<Rc<MenuStatusFn>>) {
        self.check_init("menu_status_func");
        self.menu_status = func;
    }

    /// Sets the global menu state callback, the position-less variant of
    /// [`Glut::menu_status_func`].
    pub fn menu_state_func(&mut self, func: Option<Rc<MenuStateFn>>) {
        self.check_init("menu_state_func");
        self.menu_state = func;
    }

    /// Sets the global idle callback, replacing any previous one.
    pub fn idle_func(&mut self, func: Option<Rc<IdleFn>>) {
        self.check_init("idle_func");
        if self.idle.is_some() && !self.toolkit.set_idle_enabled(false) {
            crate::error::fatal!("idle_func", "internal error: cannot remove idle handler");
        }
        self.idle = func;
        if self.idle.is_some() {
            self.toolkit.set_idle_enabled(true);
        }
    }

    /// Schedules `func` to run once, at least `msecs` milliseconds from
    /// now. Timers cannot be cancelled and any number may be pending.
    pub fn timer_func(&mut self, msecs: u32, func: Box<TimerFn>, value: i32) {
        self.check_init("timer_func");
        let handle = self.toolkit.add_timer(msecs);
        self.timers.insert(handle, (func, value));
    }
}

/// Warns about dispatch arriving for a window that no longer exists.
pub(crate) fn stale_window_warning(func: &str, id: WindowId) {
    warning!(func, "internal error, attempt on bogus window {id}");
}
