//! Native-listener bookkeeping: shared listeners install once for the
//! first interested callback of a pair and disappear only when both
//! sides lose interest. Input dispatch and the modifier snapshot are
//! exercised the same way, through injected native events.

use std::cell::RefCell;
use std::rc::Rc;

use glutk::platform::headless::{Headless, HeadlessHandle};
use glutk::platform::{Event, NativeSignal};
use glutk::{
    ButtonState, EntryState, Glut, Keysym, Modifiers, MouseButton, ScrollDirection, SpecialKey,
    WheelDirection, WindowId,
};

fn setup() -> (Glut, HeadlessHandle, WindowId) {
    let (toolkit, driver) = Headless::new();
    let mut glut = Glut::new(Box::new(toolkit));
    let mut args = vec!["prog".to_string()];
    glut.init(&mut args);
    let window = glut.create_window("input");
    (glut, driver, window)
}

#[test]
fn structural_listeners_are_always_installed() {
    let (_glut, driver, window) = setup();

    for signal in [
        NativeSignal::Close,
        NativeSignal::WindowState,
        NativeSignal::BoxResize,
        NativeSignal::AreaResize,
        NativeSignal::Expose,
        NativeSignal::Enter,
    ] {
        assert!(driver.is_connected(window, signal), "{signal:?} should be connected");
    }
    assert!(!driver.is_connected(window, NativeSignal::ButtonPress));
    assert!(!driver.is_connected(window, NativeSignal::Motion));
    assert!(!driver.is_connected(window, NativeSignal::KeyPress));
}

#[test]
fn mouse_listener_roundtrip() {
    let (mut glut, driver, window) = setup();

    glut.mouse_func(Some(Rc::new(|_: &mut Glut, _, _, _, _| {})));
    assert!(driver.is_connected(window, NativeSignal::ButtonPress));
    assert!(driver.is_connected(window, NativeSignal::ButtonRelease));
    assert_eq!(driver.active_connections(window, NativeSignal::ButtonPress), 1);

    glut.mouse_func(None);
    assert!(!driver.is_connected(window, NativeSignal::ButtonPress));
    assert!(!driver.is_connected(window, NativeSignal::ButtonRelease));
}

#[test]
fn menu_binding_keeps_the_button_listener_alive() {
    let (mut glut, driver, window) = setup();

    let menu = glut.create_menu(Rc::new(|_: &mut Glut, _| {}));
    glut.set_window(window);
    glut.attach_menu(MouseButton::Right);
    assert!(driver.is_connected(window, NativeSignal::ButtonPress));

    // The callback shares the already installed listener.
    glut.mouse_func(Some(Rc::new(|_: &mut Glut, _, _, _, _| {})));
    assert_eq!(driver.connects_ever(window, NativeSignal::ButtonPress), 1);

    // Clearing the callback is not enough to disconnect.
    glut.mouse_func(None);
    assert!(driver.is_connected(window, NativeSignal::ButtonPress));

    glut.set_menu(menu);
    glut.detach_menu(MouseButton::Right);
    assert!(!driver.is_connected(window, NativeSignal::ButtonPress));
}

#[test]
fn two_menu_bindings_share_one_listener() {
    let (mut glut, driver, window) = setup();

    glut.create_menu(Rc::new(|_: &mut Glut, _| {}));
    glut.set_window(window);
    glut.attach_menu(MouseButton::Left);
    glut.attach_menu(MouseButton::Right);
    assert_eq!(driver.connects_ever(window, NativeSignal::ButtonPress), 1);

    glut.detach_menu(MouseButton::Left);
    assert!(driver.is_connected(window, NativeSignal::ButtonPress));

    glut.detach_menu(MouseButton::Right);
    assert!(!driver.is_connected(window, NativeSignal::ButtonPress));
}

#[test]
fn motion_listener_is_shared_between_active_and_passive() {
    let (mut glut, driver, window) = setup();

    let noop: Rc<glutk::MotionFn> = Rc::new(|_: &mut Glut, _, _| {});

    glut.motion_func(Some(noop.clone()));
    assert!(driver.is_connected(window, NativeSignal::Motion));
    assert_eq!(driver.connects_ever(window, NativeSignal::Motion), 1);

    glut.motion_func(None);
    assert!(!driver.is_connected(window, NativeSignal::Motion));

    // With a passive callback present the listener survives clearing
    // the active one.
    glut.passive_motion_func(Some(noop.clone()));
    glut.motion_func(Some(noop.clone()));
    assert_eq!(driver.connects_ever(window, NativeSignal::Motion), 2);

    glut.motion_func(None);
    assert!(driver.is_connected(window, NativeSignal::Motion));

    glut.passive_motion_func(None);
    assert!(!driver.is_connected(window, NativeSignal::Motion));
}

#[test]
fn visibility_and_status_share_one_listener() {
    let (mut glut, driver, window) = setup();

    glut.visibility_func(Some(Rc::new(|_: &mut Glut, _| {})));
    assert!(driver.is_connected(window, NativeSignal::Occlusion));

    glut.window_status_func(Some(Rc::new(|_: &mut Glut, _| {})));
    assert_eq!(driver.connects_ever(window, NativeSignal::Occlusion), 1);

    glut.visibility_func(None);
    assert!(driver.is_connected(window, NativeSignal::Occlusion));

    glut.window_status_func(None);
    assert!(!driver.is_connected(window, NativeSignal::Occlusion));
}

#[test]
fn keyboard_and_special_share_the_press_listener() {
    let (mut glut, driver, window) = setup();

    glut.keyboard_func(Some(Rc::new(|_: &mut Glut, _, _, _| {})));
    assert!(driver.is_connected(window, NativeSignal::KeyPress));

    glut.special_func(Some(Rc::new(|_: &mut Glut, _, _, _| {})));
    assert_eq!(driver.connects_ever(window, NativeSignal::KeyPress), 1);
    assert!(!driver.is_connected(window, NativeSignal::KeyRelease));

    glut.keyboard_func(None);
    assert!(driver.is_connected(window, NativeSignal::KeyPress));
    glut.special_func(None);
    assert!(!driver.is_connected(window, NativeSignal::KeyPress));
}

#[test]
fn key_dispatch_translates_the_legacy_vocabulary() {
    let (mut glut, driver, window) = setup();

    let keys = Rc::new(RefCell::new(Vec::new()));
    let specials = Rc::new(RefCell::new(Vec::new()));
    {
        let keys = keys.clone();
        glut.keyboard_func(Some(Rc::new(move |_: &mut Glut, key, x, y| {
            keys.borrow_mut().push((key, x, y));
        })));
    }
    {
        let specials = specials.clone();
        glut.special_func(Some(Rc::new(move |_: &mut Glut, key, _, _| {
            specials.borrow_mut().push(key);
        })));
    }

    driver.set_pointer(42, 17);
    driver.push(Event::Key {
        window,
        pressed: true,
        keysym: Keysym::Other(0x61),
        text: Some('a'),
        modifiers: Modifiers::empty(),
    });
    driver.push(Event::Key {
        window,
        pressed: true,
        keysym: Keysym::Delete,
        text: None,
        modifiers: Modifiers::empty(),
    });
    driver.push(Event::Key {
        window,
        pressed: true,
        keysym: Keysym::KpLeft,
        text: None,
        modifiers: Modifiers::empty(),
    });
    glut.main_loop_event();

    assert_eq!(*keys.borrow(), vec![(b'a', 42, 17), (127, 42, 17)]);
    assert_eq!(*specials.borrow(), vec![SpecialKey::Left]);
}

#[test]
fn modifier_snapshot_is_scoped_to_the_callback() {
    let (mut glut, driver, window) = setup();

    let inside = Rc::new(RefCell::new(None));
    {
        let inside = inside.clone();
        glut.keyboard_func(Some(Rc::new(move |glut: &mut Glut, _, _, _| {
            *inside.borrow_mut() = Some(glut.get_modifiers());
        })));
    }

    driver.push(Event::Key {
        window,
        pressed: true,
        keysym: Keysym::Other(0x78),
        text: Some('x'),
        modifiers: Modifiers::SHIFT | Modifiers::BUTTON1,
    });
    glut.main_loop_event();

    // Button state is filtered out; only keyboard bits are visible.
    assert_eq!(*inside.borrow(), Some(Modifiers::SHIFT));
    // Outside a callback the snapshot is undefined.
    assert_eq!(glut.get_modifiers(), Modifiers::empty());
}

#[test]
fn motion_splits_into_drag_and_glide() {
    let (mut glut, driver, window) = setup();

    let dragged = Rc::new(RefCell::new(Vec::new()));
    let glided = Rc::new(RefCell::new(Vec::new()));
    {
        let dragged = dragged.clone();
        glut.motion_func(Some(Rc::new(move |_: &mut Glut, x, y| {
            dragged.borrow_mut().push((x, y));
        })));
    }
    {
        let glided = glided.clone();
        glut.passive_motion_func(Some(Rc::new(move |_: &mut Glut, x, y| {
            glided.borrow_mut().push((x, y));
        })));
    }

    driver.push(Event::Motion { window, x: 1, y: 2, modifiers: Modifiers::BUTTON2 });
    driver.push(Event::Motion { window, x: 3, y: 4, modifiers: Modifiers::empty() });
    glut.main_loop_event();

    assert_eq!(*dragged.borrow(), vec![(1, 2)]);
    assert_eq!(*glided.borrow(), vec![(3, 4)]);
}

#[test]
fn wheel_events_map_to_wheel_index_and_direction() {
    let (mut glut, driver, window) = setup();

    let spins = Rc::new(RefCell::new(Vec::new()));
    {
        let spins = spins.clone();
        glut.mouse_wheel_func(Some(Rc::new(move |_: &mut Glut, wheel, direction, x, y| {
            spins.borrow_mut().push((wheel, direction, x, y));
        })));
    }

    driver.push(Event::Scroll {
        window,
        direction: ScrollDirection::Down,
        x: 5,
        y: 6,
        modifiers: Modifiers::empty(),
    });
    driver.push(Event::Scroll {
        window,
        direction: ScrollDirection::Left,
        x: 7,
        y: 8,
        modifiers: Modifiers::empty(),
    });
    glut.main_loop_event();

    assert_eq!(
        *spins.borrow(),
        vec![(0, WheelDirection::Down, 5, 6), (1, WheelDirection::Up, 7, 8)]
    );
}

#[test]
fn mouse_dispatch_reports_press_and_release() {
    let (mut glut, driver, window) = setup();

    let clicks = Rc::new(RefCell::new(Vec::new()));
    {
        let clicks = clicks.clone();
        glut.mouse_func(Some(Rc::new(move |_: &mut Glut, button, state, x, y| {
            clicks.borrow_mut().push((button, state, x, y));
        })));
    }

    driver.push(Event::Button {
        window,
        pressed: true,
        button: 1,
        x: 10,
        y: 20,
        modifiers: Modifiers::empty(),
    });
    driver.push(Event::Button {
        window,
        pressed: false,
        button: 1,
        x: 10,
        y: 21,
        modifiers: Modifiers::empty(),
    });
    // Buttons past the fifth are not part of the legacy vocabulary.
    driver.push(Event::Button {
        window,
        pressed: true,
        button: 9,
        x: 0,
        y: 0,
        modifiers: Modifiers::empty(),
    });
    glut.main_loop_event();

    assert_eq!(
        *clicks.borrow(),
        vec![
            (MouseButton::Left, ButtonState::Down, 10, 20),
            (MouseButton::Left, ButtonState::Up, 10, 21),
        ]
    );
}

#[test]
fn entry_listener_roundtrip_and_dispatch() {
    let (mut glut, driver, window) = setup();

    let crossings = Rc::new(RefCell::new(Vec::new()));
    {
        let crossings = crossings.clone();
        glut.entry_func(Some(Rc::new(move |_: &mut Glut, state| {
            crossings.borrow_mut().push(state);
        })));
    }
    assert!(driver.is_connected(window, NativeSignal::Leave));

    driver.push(Event::PointerEntered { window });
    driver.push(Event::PointerLeft { window });
    glut.main_loop_event();

    assert_eq!(*crossings.borrow(), vec![EntryState::Entered, EntryState::Left]);

    glut.entry_func(None);
    assert!(!driver.is_connected(window, NativeSignal::Leave));
}

#[test]
fn timers_fire_once_with_their_value() {
    let (mut glut, driver, _window) = setup();

    let fired = Rc::new(RefCell::new(Vec::new()));
    {
        let fired = fired.clone();
        glut.timer_func(
            250,
            Box::new(move |_: &mut Glut, value| fired.borrow_mut().push(value)),
            7,
        );
    }

    let scheduled = driver.scheduled_timers();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].1, 250);

    driver.push(Event::TimerExpired { timer: scheduled[0].0 });
    driver.push(Event::TimerExpired { timer: scheduled[0].0 });
    glut.main_loop_event();

    // The closure is consumed on first expiry.
    assert_eq!(*fired.borrow(), vec![7]);
}

#[test]
fn idle_callback_follows_the_idle_source() {
    let (mut glut, driver, _window) = setup();

    let ticks = Rc::new(RefCell::new(0));
    {
        let ticks = ticks.clone();
        glut.idle_func(Some(Rc::new(move |_: &mut Glut| *ticks.borrow_mut() += 1)));
    }
    assert!(driver.idle_enabled());

    glut.main_loop_event();
    assert_eq!(*ticks.borrow(), 1);

    glut.idle_func(None);
    assert!(!driver.idle_enabled());
    glut.main_loop_event();
    assert_eq!(*ticks.borrow(), 1);
}
