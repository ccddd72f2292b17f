//! The purpose of this library is to re-expose the classic GLUT
//! windowing, input and menu API on top of a retained-mode widget
//! toolkit with an OpenGL-capable drawing surface.
//!
//! All state lives in a [`Glut`] context you construct around a
//! [`Toolkit`] backend. Windows and menus are addressed by small
//! integer handles ([`WindowId`], [`MenuId`]) that are handed out
//! sequentially and never reused, exactly like the legacy library's
//! ids. Event handling is callback-driven: you register per-window
//! callbacks for the event classes you care about, and the engine
//! installs the matching native listeners on demand — several callback
//! pairs (press/release, active/passive motion, visibility/status)
//! share one native listener underneath.
//!
//! ```no_run
//! use std::rc::Rc;
//!
//! use glutk::platform::headless::Headless;
//! use glutk::Glut;
//!
//! let (toolkit, _driver) = Headless::new();
//! let mut glut = Glut::new(Box::new(toolkit));
//! let mut args: Vec<String> = std::env::args().collect();
//! glut.init(&mut args);
//!
//! let _window = glut.create_window("scene");
//! glut.display_func(Rc::new(|glut: &mut Glut| {
//!     // draw, then:
//!     glut.swap_buffers();
//! }));
//! glut.main_loop();
//! ```
//!
//! One piece of sequencing is the caller's responsibility, as it always
//! was: the *current window* decides which GL context drawing calls
//! target. Callbacks run with their window already current; everywhere
//! else, call [`Glut::set_window`] before rendering.
//!
//! Show, hide and destroy requests take effect immediately rather than
//! through the legacy queued-event model. Overlays, game mode,
//! joysticks and indexed colormaps are accepted but permanently
//! unimplemented.

#![deny(rust_2018_idioms)]
#![deny(missing_debug_implementations)]

pub mod platform;

mod callback;
mod config;
mod context;
mod error;
mod event;
mod ext;
mod init;
mod menu;
mod refset;
mod registry;
mod unsupported;
mod window;

pub use crate::callback::{
    CloseFn, DisplayFn, EntryFn, IdleFn, KeyboardFn, MenuFn, MenuStateFn, MenuStatusFn, MotionFn,
    MouseFn, ReshapeFn, SpecialFn, TimerFn, VisibilityFn, WheelFn, WindowStatusFn,
};
pub use crate::config::{CloseAction, DisplayMode, Geometry};
pub use crate::context::{DeviceQuery, Glut, LayerQuery, State};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::event::{
    ButtonState, EntryState, Keysym, MenuState, Modifiers, MouseButton, Occlusion, ScrollDirection,
    SpecialKey, Visibility, WheelDirection, WindowStatus, MAX_MOUSE_BUTTONS,
};
pub use crate::ext::ProcAddress;
pub use crate::registry::{MenuId, WindowId};
pub use crate::window::Cursor;

pub use crate::platform::Toolkit;
