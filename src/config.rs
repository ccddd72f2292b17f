//! Framebuffer/display-mode configuration and the init-time defaults a
//! context starts from.

use bitflags::bitflags;

use crate::error::warning;

/// Default size of a window created without an explicit request.
pub(crate) const INIT_WIDTH: i32 = 300;
pub(crate) const INIT_HEIGHT: i32 = 300;

/// Negative position means "let the window manager choose".
pub(crate) const INIT_X: i32 = -1;
pub(crate) const INIT_Y: i32 = -1;

bitflags! {
    /// Requested capabilities of the framebuffer configuration, in the
    /// vocabulary legacy clients use with `glutInitDisplayMode`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DisplayMode: u32 {
        const RGBA        = 1 << 0;
        /// Alias kept for legacy spelling; same as [`DisplayMode::RGBA`].
        const RGB         = 1 << 0;
        const INDEX       = 1 << 1;
        const SINGLE      = 1 << 2;
        const DOUBLE      = 1 << 3;
        const ACCUM       = 1 << 4;
        const ALPHA       = 1 << 5;
        const DEPTH       = 1 << 6;
        const STENCIL     = 1 << 7;
        const MULTISAMPLE = 1 << 8;
        const STEREO      = 1 << 9;
        const LUMINANCE   = 1 << 10;
    }
}

impl DisplayMode {
    pub(crate) fn default_mode() -> Self {
        DisplayMode::RGB | DisplayMode::SINGLE | DisplayMode::DEPTH
    }
}

/// Window position and size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Whether the client insists on direct rendering, insists on indirect,
/// or takes whatever is available (direct preferred).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectRender {
    Unset,
    Indirect,
    Direct,
}

/// What happens when the user closes a top-level window through the
/// window manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Tear down every window, then terminate the process.
    Exit,
    /// Destroy the window and return from the blocking main loop.
    MainLoopReturns,
    /// Destroy the window; the loop keeps running while other top-level
    /// windows remain.
    ContinueExecution,
}

impl CloseAction {
    pub(crate) fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(CloseAction::Exit),
            1 => Some(CloseAction::MainLoopReturns),
            2 => Some(CloseAction::ContinueExecution),
            _ => None,
        }
    }

    pub(crate) fn to_raw(self) -> i32 {
        match self {
            CloseAction::Exit => 0,
            CloseAction::MainLoopReturns => 1,
            CloseAction::ContinueExecution => 2,
        }
    }
}

/// Mutable init-time defaults applied to windows created later.
#[derive(Debug, Clone)]
pub(crate) struct InitState {
    /// `None` means an unrecognized display string left the mode
    /// undefined; window creation will fail fatally until it is reset.
    pub display_mode: Option<DisplayMode>,
    pub geometry: Geometry,
    pub iconic: bool,
    pub gl_debug: bool,
    pub direct: DirectRender,
}

impl InitState {
    pub(crate) fn new() -> Self {
        Self {
            display_mode: Some(DisplayMode::default_mode()),
            geometry: Geometry { x: INIT_X, y: INIT_Y, width: INIT_WIDTH, height: INIT_HEIGHT },
            iconic: false,
            gl_debug: false,
            direct: DirectRender::Unset,
        }
    }
}

/// Parses the legacy capability-token display string ("rgba double depth
/// stencil ...").
///
/// Recognized boolean tokens fold into the display-mode bits; tokens the
/// legacy API specified but this layer cannot honor are accepted and
/// ignored. An unrecognized token leaves the whole mode undefined, which
/// surfaces as a fatal "no visual" error at window-creation time.
pub(crate) fn parse_display_string(string: &str) -> Option<DisplayMode> {
    let mut mode = DisplayMode::empty();

    for token in string.split_whitespace() {
        match token {
            "alpha" => mode |= DisplayMode::ALPHA,
            "acc" => mode |= DisplayMode::ACCUM,
            "depth" => mode |= DisplayMode::DEPTH,
            "double" => mode |= DisplayMode::DOUBLE,
            "index" => mode |= DisplayMode::INDEX,
            "rgba" | "rgb" => mode |= DisplayMode::RGBA,
            "luminance" => mode |= DisplayMode::LUMINANCE,
            "stencil" => mode |= DisplayMode::STENCIL,
            "single" => mode |= DisplayMode::SINGLE,
            "stereo" => mode |= DisplayMode::STEREO,
            "samples" => mode |= DisplayMode::MULTISAMPLE,

            // Accepted for compatibility, no effect on the request.
            "acca" | "blue" | "buffer" | "conformant" | "green" | "num" | "red" | "slow"
            | "win32pdf" | "win32pfd" | "xvisual" | "xstaticgray" | "xstaticgrey"
            | "xgrayscale" | "xgreyscale" | "xstaticcolor" | "xstaticcolour"
            | "xpseudocolor" | "xpseudocolour" | "xtruecolor" | "xtruecolour"
            | "xdirectcolor" | "xdirectcolour" => {}

            other => {
                warning!("init_display_string", "display string token not recognized: {other}");
                return None;
            }
        }
    }

    Some(mode)
}

#[cfg(test)]
mod tests {
    use super::{parse_display_string, DisplayMode};

    #[test]
    fn recognized_tokens_fold_into_mode_bits() {
        let mode = parse_display_string("rgba double depth stencil").unwrap();
        assert!(mode.contains(DisplayMode::RGBA));
        assert!(mode.contains(DisplayMode::DOUBLE));
        assert!(mode.contains(DisplayMode::DEPTH));
        assert!(mode.contains(DisplayMode::STENCIL));
        assert!(!mode.contains(DisplayMode::STEREO));
    }

    #[test]
    fn compatibility_tokens_are_ignored() {
        let mode = parse_display_string("rgb red green blue conformant").unwrap();
        assert_eq!(mode, DisplayMode::RGBA);
    }

    #[test]
    fn unrecognized_token_leaves_mode_undefined() {
        assert!(parse_display_string("rgba bogus-token").is_none());
    }
}
