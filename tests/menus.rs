//! Cascading menu behavior: the in-use state machine, reference-counted
//! submenu back-links, lazy widget regeneration and the popup priority
//! over the plain mouse callback.

use std::cell::RefCell;
use std::rc::Rc;

use glutk::platform::headless::{Headless, HeadlessHandle};
use glutk::platform::Event;
use glutk::{Glut, MenuId, MenuState, Modifiers, MouseButton, State, WindowId};

fn setup() -> (Glut, HeadlessHandle, WindowId) {
    let (toolkit, driver) = Headless::new();
    let mut glut = Glut::new(Box::new(toolkit));
    let mut args = vec!["prog".to_string()];
    glut.init(&mut args);
    let window = glut.create_window("menus");
    (glut, driver, window)
}

fn noop_menu(glut: &mut Glut) -> MenuId {
    glut.create_menu(Rc::new(|_: &mut Glut, _| {}))
}

fn press(driver: &HeadlessHandle, window: WindowId, button: u32, x: i32, y: i32) {
    driver.push(Event::Button { window, pressed: true, button, x, y, modifiers: Modifiers::empty() });
}

#[test]
fn menu_ids_start_at_one_and_are_never_reused() {
    let (mut glut, _driver, _window) = setup();

    let first = noop_menu(&mut glut);
    let second = noop_menu(&mut glut);
    assert_eq!(first.as_raw(), 1);
    assert_eq!(second.as_raw(), 2);

    glut.destroy_menu(first);
    let third = noop_menu(&mut glut);
    assert_eq!(third.as_raw(), 3);
}

#[test]
fn current_menu_follows_creation_and_destruction() {
    let (mut glut, _driver, _window) = setup();

    let first = noop_menu(&mut glut);
    let second = noop_menu(&mut glut);
    assert_eq!(glut.get_menu(), Some(second));

    glut.set_menu(first);
    assert_eq!(glut.get_menu(), Some(first));

    glut.destroy_menu(first);
    assert_eq!(glut.get_menu(), None);
}

#[test]
fn entries_accumulate_and_can_be_edited() {
    let (mut glut, _driver, _window) = setup();

    let menu = noop_menu(&mut glut);
    glut.add_menu_entry("one", 1);
    glut.add_menu_entry("two", 2);
    assert_eq!(glut.get(State::MenuNumItems), 2);

    glut.remove_menu_item(1);
    assert_eq!(glut.get(State::MenuNumItems), 1);

    // Out-of-range edits warn and change nothing.
    glut.remove_menu_item(5);
    glut.change_to_menu_entry(3, "nope", 0);
    assert_eq!(glut.get(State::MenuNumItems), 1);

    glut.destroy_menu(menu);
}

#[test]
fn bound_button_press_opens_the_popup_and_skips_the_mouse_callback() {
    let (mut glut, driver, window) = setup();

    let chosen = Rc::new(RefCell::new(Vec::new()));
    let clicks = Rc::new(RefCell::new(0));
    let transitions = Rc::new(RefCell::new(Vec::new()));

    let menu = {
        let chosen = chosen.clone();
        glut.create_menu(Rc::new(move |_: &mut Glut, value| chosen.borrow_mut().push(value)))
    };
    glut.add_menu_entry("first", 10);
    glut.add_menu_entry("second", 20);

    glut.set_window(window);
    {
        let clicks = clicks.clone();
        glut.mouse_func(Some(Rc::new(move |_: &mut Glut, _, _, _, _| {
            *clicks.borrow_mut() += 1;
        })));
    }
    {
        let transitions = transitions.clone();
        glut.menu_status_func(Some(Rc::new(move |_: &mut Glut, state, x, y| {
            transitions.borrow_mut().push((state, x, y));
        })));
    }
    glut.attach_menu(MouseButton::Left);

    // Press on the bound button: the popup path takes over completely.
    press(&driver, window, 1, 33, 44);
    glut.main_loop_event();

    assert_eq!(*clicks.borrow(), 0);
    assert_eq!(*transitions.borrow(), vec![(MenuState::InUse, 33, 44)]);
    assert_eq!(driver.popups().len(), 1);

    // An unbound button still reaches the plain callback.
    press(&driver, window, 3, 0, 0);
    glut.main_loop_event();
    assert_eq!(*clicks.borrow(), 1);

    // Selecting a leaf delivers its value with the triggering window
    // current.
    driver.push(Event::MenuItemActivated { menu, value: 20 });
    glut.main_loop_event();
    assert_eq!(*chosen.borrow(), vec![20]);
    assert_eq!(glut.get_window(), Some(window));

    // Dismissal reports the transition with the pointer position.
    driver.set_pointer(5, 6);
    driver.push(Event::MenuDismissed { menu });
    glut.main_loop_event();
    assert_eq!(
        *transitions.borrow(),
        vec![(MenuState::InUse, 33, 44), (MenuState::NotInUse, 5, 6)]
    );
}

#[test]
fn open_menus_reject_structural_edits() {
    let (mut glut, driver, window) = setup();

    let menu = noop_menu(&mut glut);
    glut.add_menu_entry("stable", 1);
    glut.set_window(window);
    glut.attach_menu(MouseButton::Right);

    press(&driver, window, 3, 0, 0);
    glut.main_loop_event();

    // In use: every mutation warns and leaves the menu unchanged.
    glut.add_menu_entry("rejected", 2);
    glut.change_to_menu_entry(1, "rejected", 3);
    glut.remove_menu_item(1);
    glut.destroy_menu(menu);
    glut.detach_menu(MouseButton::Right);
    assert_eq!(glut.get(State::MenuNumItems), 1);
    assert_eq!(glut.get_menu(), Some(menu));

    driver.push(Event::MenuDismissed { menu });
    glut.main_loop_event();

    // Released: the same edits apply.
    glut.add_menu_entry("accepted", 2);
    assert_eq!(glut.get(State::MenuNumItems), 2);
    glut.destroy_menu(menu);
    assert_eq!(glut.get_menu(), None);
}

#[test]
fn in_use_propagates_through_the_submenu_tree() {
    let (mut glut, driver, window) = setup();

    let submenu = noop_menu(&mut glut);
    glut.add_menu_entry("leaf", 1);

    let root = noop_menu(&mut glut);
    glut.add_sub_menu("nested", submenu);

    glut.set_window(window);
    glut.attach_menu(MouseButton::Left);
    press(&driver, window, 1, 0, 0);
    glut.main_loop_event();

    // The submenu is part of the open tree and rejects edits too.
    glut.set_menu(submenu);
    glut.add_menu_entry("rejected", 9);
    assert_eq!(glut.get(State::MenuNumItems), 1);

    driver.push(Event::MenuDismissed { menu: root });
    glut.main_loop_event();

    glut.set_menu(submenu);
    glut.add_menu_entry("accepted", 9);
    assert_eq!(glut.get(State::MenuNumItems), 2);
}

#[test]
fn popup_widgets_are_memoized_until_invalidated() {
    let (mut glut, driver, window) = setup();

    let menu = noop_menu(&mut glut);
    glut.add_menu_entry("one", 1);
    glut.set_window(window);
    glut.attach_menu(MouseButton::Left);

    press(&driver, window, 1, 0, 0);
    driver.push(Event::MenuDismissed { menu });
    press(&driver, window, 1, 0, 0);
    driver.push(Event::MenuDismissed { menu });
    glut.main_loop_event();

    let popups = driver.popups();
    assert_eq!(popups.len(), 2);
    assert_eq!(popups[0].0, popups[1].0, "unchanged menu reuses its cached widget");

    // A structural edit invalidates the cache.
    glut.add_menu_entry("two", 2);
    press(&driver, window, 1, 0, 0);
    glut.main_loop_event();

    let popups = driver.popups();
    assert_eq!(popups.len(), 3);
    assert_ne!(popups[1].0, popups[2].0, "edited menu is rebuilt");
}

#[test]
fn submenu_changes_invalidate_every_transitive_parent() {
    let (mut glut, driver, window) = setup();

    let leaf = noop_menu(&mut glut);
    glut.add_menu_entry("deep", 1);

    let middle = noop_menu(&mut glut);
    glut.add_sub_menu("leafward", leaf);

    let root = noop_menu(&mut glut);
    glut.add_sub_menu("middleward", middle);

    glut.set_window(window);
    glut.attach_menu(MouseButton::Left);

    press(&driver, window, 1, 0, 0);
    driver.push(Event::MenuDismissed { menu: root });
    glut.main_loop_event();

    // Editing the deepest menu must rebuild the root popup.
    glut.set_menu(leaf);
    glut.add_menu_entry("new", 2);

    press(&driver, window, 1, 0, 0);
    glut.main_loop_event();

    let popups = driver.popups();
    assert_eq!(popups.len(), 2);
    assert_ne!(popups[0].0, popups[1].0);
}

#[test]
fn double_linked_submenu_survives_one_detach() {
    let (mut glut, driver, window) = setup();

    let submenu = noop_menu(&mut glut);
    glut.add_menu_entry("leaf", 1);

    let root = noop_menu(&mut glut);
    // The same submenu twice under one parent: back-links are counted,
    // not flagged.
    glut.add_sub_menu("first link", submenu);
    glut.add_sub_menu("second link", submenu);

    glut.set_window(window);
    glut.attach_menu(MouseButton::Left);

    let mut open_and_dismiss = |glut: &mut Glut, driver: &HeadlessHandle| {
        press(driver, window, 1, 0, 0);
        driver.push(Event::MenuDismissed { menu: root });
        glut.main_loop_event();
        driver.popups().last().map(|(widget, _)| *widget)
    };

    let first = open_and_dismiss(&mut glut, &driver);

    // Drop one of the two links: the count goes 2 -> 1, not 2 -> 0.
    glut.set_menu(root);
    glut.change_to_menu_entry(1, "plain now", 5);
    let second = open_and_dismiss(&mut glut, &driver);
    assert_ne!(first, second, "the edit itself rebuilds the root");

    // The remaining link must still propagate staleness to the root.
    glut.set_menu(submenu);
    glut.add_menu_entry("again", 2);
    let third = open_and_dismiss(&mut glut, &driver);
    assert_ne!(second, third, "still-linked submenu must invalidate the root");

    // Dropping the last link ends the notifications.
    glut.set_menu(root);
    glut.change_to_menu_entry(2, "plain too", 6);
    let fourth = open_and_dismiss(&mut glut, &driver);

    glut.set_menu(submenu);
    glut.add_menu_entry("ignored by root", 3);
    let fifth = open_and_dismiss(&mut glut, &driver);
    assert_eq!(fourth, fifth, "unlinked submenu edits must not invalidate the root");
}

#[test]
fn submenu_cycles_are_cut_by_the_depth_bound() {
    let (mut glut, driver, window) = setup();

    let a = noop_menu(&mut glut);
    let b = noop_menu(&mut glut);

    glut.set_menu(a);
    glut.add_sub_menu("to b", b);
    glut.set_menu(b);
    glut.add_sub_menu("back to a", a);

    glut.set_window(window);
    glut.set_menu(a);
    glut.attach_menu(MouseButton::Left);

    // Opening the cyclic tree must terminate: regeneration stops at the
    // depth bound and the root still pops up.
    press(&driver, window, 1, 0, 0);
    glut.main_loop_event();
    assert_eq!(driver.popups().len(), 1);

    driver.push(Event::MenuDismissed { menu: a });
    glut.main_loop_event();

    // The in-use flag released the whole cycle.
    glut.set_menu(b);
    glut.add_menu_entry("works", 1);
    assert_eq!(glut.get(State::MenuNumItems), 2);
}

#[test]
fn menu_data_round_trips_through_the_current_menu() {
    let (mut glut, _driver, _window) = setup();

    let first = noop_menu(&mut glut);
    let second = noop_menu(&mut glut);

    glut.set_menu(first);
    glut.set_menu_data(Some(Box::new("payload".to_string())));

    glut.set_menu(second);
    assert!(glut.menu_data().is_none());

    glut.set_menu(first);
    let data = glut.menu_data().and_then(|d| d.downcast_ref::<String>().cloned());
    assert_eq!(data.as_deref(), Some("payload"));
}
