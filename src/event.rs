//! The event vocabulary delivered to client callbacks, plus the fixed
//! translation from native key symbols to the legacy key space.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifier and pointer-button state captured at the moment
    /// an input event fired.
    ///
    /// Only the keyboard bits are reported to clients; the button bits
    /// decide whether pointer motion counts as a drag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SHIFT   = 1 << 0;
        const CTRL    = 1 << 1;
        const ALT     = 1 << 2;
        const BUTTON1 = 1 << 8;
        const BUTTON2 = 1 << 9;
        const BUTTON3 = 1 << 10;
        const BUTTON4 = 1 << 11;
        const BUTTON5 = 1 << 12;
    }
}

impl Modifiers {
    /// The subset visible through the modifier query.
    pub(crate) fn keyboard_bits(self) -> Modifiers {
        self & (Modifiers::SHIFT | Modifiers::CTRL | Modifiers::ALT)
    }

    /// True while any pointer button is held.
    pub(crate) fn any_button(self) -> bool {
        self.intersects(
            Modifiers::BUTTON1
                | Modifiers::BUTTON2
                | Modifiers::BUTTON3
                | Modifiers::BUTTON4
                | Modifiers::BUTTON5,
        )
    }
}

/// Number of mouse buttons a menu can be bound to.
pub const MAX_MOUSE_BUTTONS: usize = 5;

/// Pointer buttons in legacy numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Fourth,
    Fifth,
}

impl MouseButton {
    /// Maps a native 1-based button number; buttons past the fifth are
    /// not reported.
    pub fn from_native(button: u32) -> Option<Self> {
        match button {
            1 => Some(MouseButton::Left),
            2 => Some(MouseButton::Middle),
            3 => Some(MouseButton::Right),
            4 => Some(MouseButton::Fourth),
            5 => Some(MouseButton::Fifth),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::Fourth => 3,
            MouseButton::Fifth => 4,
        }
    }
}

/// Up/down transition of a pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Down,
    Up,
}

/// Spin direction reported to the wheel callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

/// Native scroll direction as the toolkit reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    /// (wheel index, direction) pair in the legacy vocabulary: vertical
    /// scrolling is wheel 0, horizontal is wheel 1.
    pub(crate) fn to_wheel(self) -> (i32, WheelDirection) {
        match self {
            ScrollDirection::Up => (0, WheelDirection::Up),
            ScrollDirection::Down => (0, WheelDirection::Down),
            ScrollDirection::Left => (1, WheelDirection::Up),
            ScrollDirection::Right => (1, WheelDirection::Down),
        }
    }
}

/// Pointer crossing reported to the entry callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Left,
    Entered,
}

/// The two-state view of window visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    NotVisible,
    Visible,
}

/// The richer occlusion-aware window status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    Hidden,
    FullyRetained,
    PartiallyRetained,
    FullyCovered,
}

/// Occlusion level carried by a native visibility notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occlusion {
    Unobscured,
    Partial,
    FullyObscured,
}

impl Occlusion {
    pub(crate) fn to_status(self) -> WindowStatus {
        match self {
            Occlusion::Unobscured => WindowStatus::FullyRetained,
            Occlusion::Partial => WindowStatus::PartiallyRetained,
            Occlusion::FullyObscured => WindowStatus::FullyCovered,
        }
    }
}

/// Whether a popup menu tree is currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    InUse,
    NotInUse,
}

/// Non-ASCII keys reported through the special-key callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKey {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Left,
    Up,
    Right,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
}

/// Native key symbols the toolkit reports alongside the printable text.
///
/// Only the symbols the fixed translation table cares about are named;
/// everything else arrives as `Other` and is ignored unless the event
/// carries printable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keysym {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    KpF1,
    KpF2,
    KpF3,
    KpF4,
    Left,
    Right,
    Up,
    Down,
    KpLeft,
    KpRight,
    KpUp,
    KpDown,
    Prior,
    Next,
    Home,
    End,
    Insert,
    KpPrior,
    KpNext,
    KpHome,
    KpEnd,
    KpInsert,
    Delete,
    KpDelete,
    Tab,
    KpTab,
    BackSpace,
    Other(u32),
}

/// ASCII codes for the keys whose native printable representation is
/// empty: Delete, Tab and Backspace need explicit translation.
pub(crate) fn ascii_fallback(keysym: Keysym) -> Option<u8> {
    match keysym {
        Keysym::Delete | Keysym::KpDelete => Some(127),
        Keysym::Tab | Keysym::KpTab => Some(9),
        Keysym::BackSpace => Some(8),
        _ => None,
    }
}

/// Fixed translation from native key symbols to the legacy special-key
/// vocabulary.
pub(crate) fn special_from_keysym(keysym: Keysym) -> Option<SpecialKey> {
    use Keysym::*;
    match keysym {
        F1 | KpF1 => Some(SpecialKey::F1),
        F2 | KpF2 => Some(SpecialKey::F2),
        F3 | KpF3 => Some(SpecialKey::F3),
        F4 | KpF4 => Some(SpecialKey::F4),
        F5 => Some(SpecialKey::F5),
        F6 => Some(SpecialKey::F6),
        F7 => Some(SpecialKey::F7),
        F8 => Some(SpecialKey::F8),
        F9 => Some(SpecialKey::F9),
        F10 => Some(SpecialKey::F10),
        F11 => Some(SpecialKey::F11),
        F12 => Some(SpecialKey::F12),
        Left | KpLeft => Some(SpecialKey::Left),
        Right | KpRight => Some(SpecialKey::Right),
        Up | KpUp => Some(SpecialKey::Up),
        Down | KpDown => Some(SpecialKey::Down),
        Prior | KpPrior => Some(SpecialKey::PageUp),
        Next | KpNext => Some(SpecialKey::PageDown),
        Home | KpHome => Some(SpecialKey::Home),
        End | KpEnd => Some(SpecialKey::End),
        Insert | KpInsert => Some(SpecialKey::Insert),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_less_keys_translate_to_ascii() {
        assert_eq!(ascii_fallback(Keysym::Delete), Some(127));
        assert_eq!(ascii_fallback(Keysym::KpTab), Some(9));
        assert_eq!(ascii_fallback(Keysym::BackSpace), Some(8));
        assert_eq!(ascii_fallback(Keysym::F1), None);
    }

    #[test]
    fn keypad_variants_share_special_translations() {
        assert_eq!(special_from_keysym(Keysym::KpLeft), Some(SpecialKey::Left));
        assert_eq!(special_from_keysym(Keysym::Prior), Some(SpecialKey::PageUp));
        assert_eq!(special_from_keysym(Keysym::KpF4), Some(SpecialKey::F4));
        assert_eq!(special_from_keysym(Keysym::Other(0x20)), None);
    }

    #[test]
    fn scroll_maps_to_wheel_index_and_direction() {
        assert_eq!(ScrollDirection::Down.to_wheel(), (0, WheelDirection::Down));
        assert_eq!(ScrollDirection::Left.to_wheel(), (1, WheelDirection::Up));
    }

    #[test]
    fn button_state_tracks_drag_detection() {
        let held = Modifiers::SHIFT | Modifiers::BUTTON2;
        assert!(held.any_button());
        assert_eq!(held.keyboard_bits(), Modifiers::SHIFT);
        assert!(!Modifiers::CTRL.any_button());
    }
}
