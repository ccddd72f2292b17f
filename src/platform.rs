//! The boundary to the retained-mode widget toolkit.
//!
//! Everything the engine needs from the toolkit is expressed through the
//! [`Toolkit`] trait: widget-tree construction, native listener wiring,
//! GL capability negotiation, menu-widget primitives and the event pump.
//! The engine never touches toolkit types directly; widgets, cursors and
//! signal connections travel as opaque handles.
//!
//! The [`headless`] backend implements the trait entirely in process for
//! tests and offscreen use.

pub mod headless;

use std::ffi::c_void;

use bitflags::bitflags;

use crate::config::{DisplayMode, Geometry};
use crate::error::Result;
use crate::event::{Keysym, Modifiers, MouseButton, Occlusion, ScrollDirection};
use crate::registry::{MenuId, WindowId};

macro_rules! opaque_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);
    };
}

opaque_handle!(
    /// A single widget owned by the toolkit.
    WidgetHandle
);
opaque_handle!(
    /// A connected native listener, used to disconnect it later.
    SignalHandle
);
opaque_handle!(
    /// A negotiated GL framebuffer configuration.
    GlConfigHandle
);
opaque_handle!(
    /// A GL drawable currently begun for rendering.
    DrawableHandle
);
opaque_handle!(
    /// A realized cursor object.
    CursorHandle
);
opaque_handle!(
    /// A pending one-shot timeout source.
    TimerHandle
);

/// The nested widget hierarchy backing one shim window: an outer frame
/// (top-level only), an input-sensing box hosting the cursor, a
/// fixed-position container for subwindows, and the GL drawing surface.
#[derive(Debug, Clone, Copy)]
pub struct WidgetTree {
    /// The window-manager-visible frame; `None` for subwindows.
    pub frame: Option<WidgetHandle>,
    pub event_box: WidgetHandle,
    pub fixed: WidgetHandle,
    pub drawing_area: WidgetHandle,
}

bitflags! {
    /// Native event classes a widget asks the toolkit to start reporting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventMask: u32 {
        const KEY_PRESS         = 1 << 0;
        const KEY_RELEASE       = 1 << 1;
        const BUTTON_PRESS      = 1 << 2;
        const BUTTON_RELEASE    = 1 << 3;
        const POINTER_MOTION    = 1 << 4;
        const ENTER_NOTIFY      = 1 << 5;
        const LEAVE_NOTIFY      = 1 << 6;
        const VISIBILITY_NOTIFY = 1 << 7;
        const SCROLL            = 1 << 8;
    }
}

/// Native signals the engine connects per widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeSignal {
    /// The input-sensing box changed size.
    BoxResize,
    /// The drawing surface changed size.
    AreaResize,
    /// The drawing surface needs repainting.
    Expose,
    Enter,
    Leave,
    /// The window manager asked to close a top-level frame.
    Close,
    /// Iconified/withdrawn state of a top-level frame changed.
    WindowState,
    /// Occlusion of the drawing surface changed.
    Occlusion,
    KeyPress,
    KeyRelease,
    ButtonPress,
    ButtonRelease,
    Scroll,
    Motion,
}

/// GL attributes queryable from a framebuffer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlAttrib {
    Rgba,
    BufferSize,
    RedSize,
    GreenSize,
    BlueSize,
    AlphaSize,
    DepthSize,
    StencilSize,
    AccumRedSize,
    AccumGreenSize,
    AccumBlueSize,
    AccumAlphaSize,
    DoubleBuffered,
    Stereo,
    Samples,
    FormatId,
}

/// Concrete cursor images a window can request.
///
/// `Blank` is the realized form of the legacy "no cursor" selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorKind {
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
    Blank,
}

/// A translated native event handed from the toolkit pump to the engine.
///
/// Events carry the shim window id the listener was registered for, so
/// dispatch never has to reverse-map widgets.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BoxResized { window: WindowId, width: i32, height: i32 },
    AreaResized { window: WindowId, width: i32, height: i32 },
    Exposed { window: WindowId, width: i32, height: i32 },
    PointerEntered { window: WindowId },
    PointerLeft { window: WindowId },
    CloseRequested { window: WindowId },
    StateChanged { window: WindowId, withdrawn: Option<bool>, iconified: Option<bool> },
    OcclusionChanged { window: WindowId, occlusion: Occlusion },
    Key { window: WindowId, pressed: bool, keysym: Keysym, text: Option<char>, modifiers: Modifiers },
    Button { window: WindowId, pressed: bool, button: u32, x: i32, y: i32, modifiers: Modifiers },
    Scroll { window: WindowId, direction: ScrollDirection, x: i32, y: i32, modifiers: Modifiers },
    Motion { window: WindowId, x: i32, y: i32, modifiers: Modifiers },
    MenuItemActivated { menu: MenuId, value: i32 },
    MenuDismissed { menu: MenuId },
    TimerExpired { timer: TimerHandle },
    IdleTick,
}

/// One round of event processing.
#[derive(Debug, Default)]
pub struct Pump {
    pub events: Vec<Event>,
    /// True when a blocking pump has no event sources left to wait on;
    /// the main loop treats this as the end of the run.
    pub ended: bool,
}

/// Operations the engine requires from the widget toolkit.
///
/// A backend is driven from a single thread; methods take `&mut self`
/// and are never reentered.
pub trait Toolkit {
    /// One-time toolkit initialization. Consumes any toolkit-owned
    /// arguments (such as `--display` and `--sync`) from `args`.
    fn init(&mut self, args: &mut Vec<String>) -> Result<()>;

    fn screen_size(&self) -> (i32, i32);
    fn screen_size_mm(&self) -> (i32, i32);

    /// Negotiates a framebuffer configuration for the requested mode.
    fn find_gl_config(&mut self, mode: DisplayMode) -> Option<GlConfigHandle>;
    fn gl_config_attrib(&self, config: GlConfigHandle, attrib: GlAttrib) -> i32;

    /// Builds the widget hierarchy for a window. Top-level trees get a
    /// frame and are subject to `title` and `iconic`; child trees are
    /// placed inside `parent`'s fixed container at the given position.
    fn create_widget_tree(
        &mut self,
        parent: Option<&WidgetTree>,
        title: Option<&str>,
        geometry: Geometry,
        iconic: bool,
    ) -> WidgetTree;

    /// Attaches GL rendering capability to a drawing surface. Returns
    /// false when no matching visual exists for this rendering path.
    fn set_gl_capability(
        &mut self,
        area: WidgetHandle,
        config: GlConfigHandle,
        direct: bool,
        rgba: bool,
    ) -> bool;

    /// Whether the context realized for `area` renders directly.
    fn context_is_direct(&self, area: WidgetHandle) -> bool;

    /// Destroys a widget and everything nested inside it.
    fn destroy_widget(&mut self, widget: WidgetHandle);

    /// Installs a native listener reporting `signal` on `widget`, tagged
    /// with the shim window the events belong to.
    fn connect(&mut self, window: WindowId, widget: WidgetHandle, signal: NativeSignal)
        -> SignalHandle;
    fn disconnect(&mut self, widget: WidgetHandle, handle: SignalHandle);

    /// Widens the set of native event classes `widget` reports.
    fn add_events(&mut self, widget: WidgetHandle, mask: EventMask);
    fn grab_focus(&mut self, widget: WidgetHandle);

    fn show_widget(&mut self, widget: WidgetHandle);
    fn hide_widget(&mut self, widget: WidgetHandle);
    fn iconify(&mut self, frame: WidgetHandle);
    fn deiconify(&mut self, frame: WidgetHandle);
    fn set_fullscreen(&mut self, frame: WidgetHandle, fullscreen: bool);
    fn move_frame(&mut self, frame: WidgetHandle, x: i32, y: i32);
    fn resize_frame(&mut self, frame: WidgetHandle, width: i32, height: i32);
    /// Repositions a child widget inside a fixed container.
    fn move_child(&mut self, fixed: WidgetHandle, child: WidgetHandle, x: i32, y: i32);
    fn set_size_request(&mut self, widget: WidgetHandle, width: i32, height: i32);
    fn raise(&mut self, widget: WidgetHandle);
    fn lower(&mut self, widget: WidgetHandle);
    fn set_title(&mut self, frame: WidgetHandle, title: &str);
    fn set_icon_title(&mut self, frame: WidgetHandle, title: &str);
    fn widget_geometry(&self, widget: WidgetHandle) -> Geometry;

    /// Realizes a cursor image; `None` when the platform lacks it.
    fn create_cursor(&mut self, kind: CursorKind) -> Option<CursorHandle>;
    /// `None` restores the inherited cursor.
    fn set_cursor(&mut self, widget: WidgetHandle, cursor: Option<CursorHandle>);
    fn warp_pointer(&mut self, area: WidgetHandle, x: i32, y: i32) -> Result<()>;
    /// Pointer position relative to `area`.
    fn pointer_position(&self, area: WidgetHandle) -> (i32, i32);

    /// Marks the surface damaged so an expose event will follow.
    fn invalidate(&mut self, area: WidgetHandle);

    /// Binds the GL context of `area` for rendering. Contexts do not
    /// nest; the engine ends the previous drawable first.
    fn begin_gl(&mut self, area: WidgetHandle) -> Result<DrawableHandle>;
    fn end_gl(&mut self, drawable: DrawableHandle);
    fn gl_flush(&mut self);
    fn swap_buffers(&mut self, drawable: DrawableHandle);
    fn is_double_buffered(&self, drawable: DrawableHandle) -> bool;
    /// Default reshape behavior when no client callback is registered.
    fn set_viewport(&mut self, width: i32, height: i32);
    /// Drains the GL error queue of the bound context.
    fn gl_errors(&mut self) -> Vec<u32>;
    fn gl_extensions(&self) -> Option<String>;
    fn gl_proc_address(&mut self, name: &str) -> Option<*const c_void>;

    /// Creates an empty menu shell. A `root` id makes the shell emit
    /// [`Event::MenuDismissed`] with that id when the popup closes.
    fn menu_new(&mut self, root: Option<MenuId>) -> WidgetHandle;
    /// Appends an item; leaf items carry the (menu, value) pair reported
    /// through [`Event::MenuItemActivated`] on selection.
    fn menu_append_item(
        &mut self,
        menu: WidgetHandle,
        label: &str,
        activate: Option<(MenuId, i32)>,
    ) -> WidgetHandle;
    fn menu_set_submenu(&mut self, item: WidgetHandle, submenu: WidgetHandle);
    fn menu_popup(&mut self, menu: WidgetHandle, button: MouseButton);

    /// Schedules a one-shot timeout reported as [`Event::TimerExpired`].
    fn add_timer(&mut self, msecs: u32) -> TimerHandle;
    /// Enables or disables the idle source. Returns false when a
    /// previously installed source could not be removed.
    fn set_idle_enabled(&mut self, enabled: bool) -> bool;

    /// Processes native events: blocking until something arrives, or
    /// draining whatever is already pending.
    fn pump(&mut self, block: bool) -> Pump;
}
