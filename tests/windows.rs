//! Window lifecycle, id stability and the visibility state machine,
//! driven through the headless toolkit backend.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glutk::platform::headless::{Headless, HeadlessHandle};
use glutk::platform::Event;
use glutk::{CloseAction, DisplayMode, Glut, Occlusion, State, Visibility, WindowStatus};

fn setup() -> (Glut, HeadlessHandle) {
    let (toolkit, driver) = Headless::new();
    let mut glut = Glut::new(Box::new(toolkit));
    let mut args = vec!["prog".to_string()];
    glut.init(&mut args);
    (glut, driver)
}

#[test]
fn window_ids_start_at_one_and_are_never_reused() {
    let (mut glut, _driver) = setup();
    glut.set_close_action(CloseAction::ContinueExecution);

    let first = glut.create_window("first");
    let second = glut.create_window("second");
    assert_eq!(first.as_raw(), 1);
    assert_eq!(second.as_raw(), 2);

    glut.destroy_window(first);
    let third = glut.create_window("third");
    assert_eq!(third.as_raw(), 3);
}

#[test]
fn newly_created_window_becomes_current() {
    let (mut glut, _driver) = setup();

    let first = glut.create_window("first");
    assert_eq!(glut.get_window(), Some(first));

    let child = glut.create_sub_window(first, 10, 10, 50, 50);
    assert_eq!(glut.get_window(), Some(child));

    glut.set_window(first);
    assert_eq!(glut.get_window(), Some(first));
}

#[test]
fn current_window_resets_when_destroyed() {
    let (mut glut, _driver) = setup();
    glut.set_close_action(CloseAction::ContinueExecution);

    let first = glut.create_window("first");
    let second = glut.create_window("second");
    assert_eq!(glut.get_window(), Some(second));

    glut.destroy_window(second);
    assert_eq!(glut.get_window(), None);

    // A stale id is distinguishable from an out-of-range one: selecting
    // it leaves no usable current window.
    glut.set_window(second);
    assert_eq!(glut.get_window(), None);

    glut.set_window(first);
    assert_eq!(glut.get_window(), Some(first));
}

#[test]
fn destroying_a_window_takes_the_whole_subtree() {
    let (mut glut, _driver) = setup();
    glut.set_close_action(CloseAction::ContinueExecution);

    let top = glut.create_window("top");
    let child = glut.create_sub_window(top, 0, 0, 100, 100);
    let grandchild = glut.create_sub_window(child, 0, 0, 50, 50);

    glut.destroy_window(top);

    for id in [top, child, grandchild] {
        glut.set_window(id);
        assert_eq!(glut.get_window(), None);
    }
}

#[test]
fn close_callback_runs_for_toplevels_only() {
    let (mut glut, _driver) = setup();
    glut.set_close_action(CloseAction::ContinueExecution);

    let closed = Rc::new(RefCell::new(Vec::new()));

    let top = glut.create_window("top");
    let child = glut.create_sub_window(top, 0, 0, 100, 100);

    for id in [top, child] {
        let closed = closed.clone();
        glut.set_window(id);
        glut.close_func(Some(Rc::new(move |glut: &mut Glut| {
            closed.borrow_mut().push(glut.get_window());
        })));
    }

    glut.set_window(top);
    glut.destroy_window(child);
    assert!(closed.borrow().is_empty());

    glut.destroy_window(top);
    assert_eq!(*closed.borrow(), vec![Some(top)]);
}

#[test]
fn window_manager_close_honours_the_loop_return_policy() {
    let (mut glut, driver) = setup();
    glut.set_close_action(CloseAction::MainLoopReturns);

    let window = glut.create_window("doomed");
    driver.push(Event::CloseRequested { window });

    // Returns instead of blocking: the close request stops the loop.
    glut.main_loop();

    glut.set_window(window);
    assert_eq!(glut.get_window(), None);
}

#[test]
fn continue_policy_keeps_running_while_windows_remain() {
    let (mut glut, driver) = setup();
    glut.set_close_action(CloseAction::ContinueExecution);

    let first = glut.create_window("first");
    let second = glut.create_window("second");

    driver.push(Event::CloseRequested { window: first });
    glut.main_loop_event();

    glut.set_window(first);
    assert_eq!(glut.get_window(), None);
    glut.set_window(second);
    assert_eq!(glut.get_window(), Some(second));
}

#[test]
fn main_loop_returns_immediately_without_windows_under_continue_policy() {
    let (mut glut, _driver) = setup();
    glut.set_close_action(CloseAction::ContinueExecution);
    glut.main_loop();
}

#[test]
fn first_expose_fires_the_synthetic_reshape_once() {
    let (mut glut, driver) = setup();

    let window = glut.create_window("scene");
    let paints = Rc::new(Cell::new(0));
    {
        let paints = paints.clone();
        glut.display_func(Rc::new(move |_: &mut Glut| paints.set(paints.get() + 1)));
    }

    driver.push(Event::Exposed { window, width: 300, height: 300 });
    driver.push(Event::Exposed { window, width: 300, height: 300 });
    glut.main_loop_event();

    assert_eq!(paints.get(), 2);
    // No reshape callback is registered, so the initial synthetic
    // reshape reset the viewport exactly once.
    assert_eq!(driver.viewports(), vec![(300, 300)]);
}

#[test]
fn reshape_callback_replaces_the_viewport_default() {
    let (mut glut, driver) = setup();

    let window = glut.create_window("scene");
    glut.display_func(Rc::new(|_: &mut Glut| {}));

    let sizes = Rc::new(RefCell::new(Vec::new()));
    {
        let sizes = sizes.clone();
        glut.reshape_func(Some(Rc::new(move |_glut: &mut Glut, w, h| {
            sizes.borrow_mut().push((w, h));
        })));
    }

    driver.push(Event::AreaResized { window, width: 640, height: 480 });
    glut.main_loop_event();

    assert_eq!(*sizes.borrow(), vec![(640, 480)]);
    assert!(driver.viewports().is_empty());
}

#[test]
fn visibility_transitions_are_debounced() {
    let (mut glut, driver) = setup();

    let window = glut.create_window("scene");
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = seen.clone();
        glut.visibility_func(Some(Rc::new(move |_glut: &mut Glut, state| {
            seen.borrow_mut().push(state);
        })));
    }

    driver.push(Event::OcclusionChanged { window, occlusion: Occlusion::Unobscured });
    driver.push(Event::OcclusionChanged { window, occlusion: Occlusion::Unobscured });
    driver.push(Event::OcclusionChanged { window, occlusion: Occlusion::Partial });
    driver.push(Event::OcclusionChanged { window, occlusion: Occlusion::FullyObscured });
    glut.main_loop_event();

    // Identical native notifications collapse; partial occlusion is
    // still "visible" in the two-state view.
    assert_eq!(*seen.borrow(), vec![Visibility::Visible, Visibility::NotVisible]);
}

#[test]
fn iconifying_a_toplevel_hides_its_subwindows() {
    let (mut glut, driver) = setup();

    let top = glut.create_window("top");
    let child = glut.create_sub_window(top, 0, 0, 100, 100);

    let child_status = Rc::new(RefCell::new(Vec::new()));
    {
        let child_status = child_status.clone();
        glut.set_window(child);
        glut.window_status_func(Some(Rc::new(move |_glut: &mut Glut, status| {
            child_status.borrow_mut().push(status);
        })));
    }

    // Bring the subwindow on screen first.
    driver.push(Event::OcclusionChanged { window: child, occlusion: Occlusion::Unobscured });
    glut.main_loop_event();
    assert_eq!(*child_status.borrow(), vec![WindowStatus::FullyRetained]);

    // Iconifying the ancestor propagates hidden to the whole subtree.
    driver.push(Event::StateChanged { window: top, withdrawn: None, iconified: Some(true) });
    glut.main_loop_event();
    assert_eq!(
        *child_status.borrow(),
        vec![WindowStatus::FullyRetained, WindowStatus::Hidden]
    );

    // De-iconify; the subwindow's own occlusion notification restores
    // its previous status.
    driver.push(Event::StateChanged { window: top, withdrawn: None, iconified: Some(false) });
    driver.push(Event::OcclusionChanged { window: child, occlusion: Occlusion::Unobscured });
    glut.main_loop_event();
    assert_eq!(
        *child_status.borrow(),
        vec![WindowStatus::FullyRetained, WindowStatus::Hidden, WindowStatus::FullyRetained]
    );
}

#[test]
fn swap_buffers_swaps_only_double_buffered_windows() {
    let (mut glut, driver) = setup();

    glut.init_display_mode(DisplayMode::RGB | DisplayMode::SINGLE | DisplayMode::DEPTH);
    glut.create_window("single");
    glut.swap_buffers();
    assert_eq!(driver.flush_count(), 1);
    assert_eq!(driver.swap_count(), 0);

    glut.init_display_mode(DisplayMode::RGB | DisplayMode::DOUBLE | DisplayMode::DEPTH);
    glut.create_window("double");
    glut.swap_buffers();
    assert_eq!(driver.flush_count(), 2);
    assert_eq!(driver.swap_count(), 1);
}

#[test]
fn post_redisplay_invalidates_the_drawing_surface() {
    let (mut glut, driver) = setup();

    let first = glut.create_window("first");
    let second = glut.create_window("second");

    glut.set_window(first);
    glut.post_redisplay();
    glut.post_window_redisplay(second);

    assert_eq!(driver.invalidated().len(), 2);
}

#[test]
fn window_queries_answer_for_the_current_window() {
    let (mut glut, _driver) = setup();

    let top = glut.create_window("top");
    let child = glut.create_sub_window(top, 7, 9, 120, 80);

    assert_eq!(glut.get(State::WindowParent), top.as_raw() as i32);
    assert_eq!(glut.get(State::WindowWidth), 120);
    assert_eq!(glut.get(State::WindowHeight), 80);

    glut.set_window(top);
    assert_eq!(glut.get(State::WindowParent), 0);
    assert_eq!(glut.get(State::WindowNumChildren), 1);

    assert_eq!(glut.get(State::ScreenWidth), 1280);
    assert_eq!(glut.get(State::ScreenHeight), 1024);
    glut.set_window(child);
    assert_eq!(glut.get(State::WindowX), 7);
    assert_eq!(glut.get(State::WindowY), 9);
}

#[test]
fn window_data_round_trips_through_the_current_window() {
    let (mut glut, _driver) = setup();

    let first = glut.create_window("first");
    let second = glut.create_window("second");

    glut.set_window(first);
    glut.set_window_data(Some(Box::new(41i32)));
    glut.set_window(second);
    assert!(glut.window_data().is_none());

    glut.set_window(first);
    let data = glut.window_data().and_then(|d| d.downcast_mut::<i32>().copied());
    assert_eq!(data, Some(41));
}
