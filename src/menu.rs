//! Cascading popup menus.
//!
//! Menus are association lists: each entry carries a label and either a
//! client value or a submenu id. The toolkit widget tree for a menu is
//! built lazily and memoized; any structural edit marks the menu and
//! every transitive parent stale through the reference-counted
//! back-link set. While a popup rooted at (or containing) a menu is on
//! screen the whole connected tree is `in_use` and structural edits are
//! rejected, so the realized widgets can't be rebuilt under an open
//! popup.

use std::any::Any;
use std::rc::Rc;

use crate::callback::MenuFn;
use crate::context::Glut;
use crate::error::warning;
use crate::event::{MenuState, MouseButton};
use crate::platform::WidgetHandle;
use crate::refset::RefSet;
use crate::registry::{MenuId, WindowId};

/// Hard bound on submenu nesting; a cycle guard, not a feature limit.
pub(crate) const MAX_MENU_DEPTH: u32 = 64;

/// One entry of a menu: a leaf value or a submenu link.
#[derive(Debug, Clone)]
pub(crate) struct MenuItem {
    /// Label with toolkit mnemonic escaping already applied.
    pub(crate) label: String,
    pub(crate) value: i32,
    pub(crate) submenu: Option<MenuId>,
}

pub(crate) struct Menu {
    pub(crate) callback: Rc<MenuFn>,
    pub(crate) items: Vec<MenuItem>,
    /// Memoized toolkit widget; rebuilt when `needs_refresh` is set.
    pub(crate) cached_widget: Option<WidgetHandle>,
    pub(crate) needs_refresh: bool,
    /// True while a popup containing this menu is on screen.
    pub(crate) in_use: bool,
    /// Window the open popup was triggered from; `None` when closed or
    /// when this menu is only reachable as a submenu.
    pub(crate) popped_up_from: Option<WindowId>,
    /// Parent menus embedding this one, reference-counted per link.
    pub(crate) parents: RefSet<MenuId>,
    pub(crate) user_data: Option<Box<dyn Any>>,
}

impl Menu {
    fn new(callback: Rc<MenuFn>) -> Self {
        Self {
            callback,
            items: Vec::new(),
            cached_widget: None,
            needs_refresh: true,
            in_use: false,
            popped_up_from: None,
            parents: RefSet::new(),
            user_data: None,
        }
    }
}

/// Applies toolkit mnemonic escaping to a client label: a literal
/// underscore must survive as text, and the legacy `&` marker becomes
/// the toolkit's own mnemonic prefix.
pub(crate) fn mnemonic_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len() * 2);
    for ch in name.chars() {
        match ch {
            '_' => label.push_str("__"),
            '&' => label.push('_'),
            other => label.push(other),
        }
    }
    label
}

impl Glut {
    /// Creates a menu whose entries report their values through
    /// `callback`, makes it the current menu and returns its id.
    pub fn create_menu(&mut self, callback: Rc<MenuFn>) -> MenuId {
        self.check_init("create_menu");

        let id = MenuId(self.menus.insert(Menu::new(callback)));
        self.set_menu(id);
        id
    }

    /// Destroys a menu. Rejected while the menu is part of an open
    /// popup. The id is never reused.
    pub fn destroy_menu(&mut self, menu: MenuId) {
        self.check_init("destroy_menu");

        match self.menus.get(menu.0) {
            None => {
                warning!("destroy_menu", "trying to destroy nonexistent menu {menu}");
                return;
            }
            Some(record) if record.in_use => {
                warning!("destroy_menu", "trying to destroy menu {menu} which is in use");
                return;
            }
            Some(_) => {}
        }

        let mut record = self.menus.vacate(menu.0).expect("menu table entry vanished");

        if let Some(widget) = record.cached_widget.take() {
            self.toolkit.destroy_widget(widget);
        }
        if !record.parents.is_empty() {
            record.parents.clear();
        }

        if self.current_menu == Some(menu) {
            self.current_menu = None;
        }
    }

    /// The current menu, or `None` after it was destroyed.
    pub fn get_menu(&self) -> Option<MenuId> {
        self.check_init("get_menu");
        self.current_menu.filter(|menu| self.menus.get(menu.0).is_some())
    }

    /// Selects the current menu.
    pub fn set_menu(&mut self, menu: MenuId) {
        self.check_init("set_menu");

        if !self.menus.in_range(menu.0) {
            warning!("set_menu", "attempted on bogus menu {menu}");
            return;
        }

        self.current_menu = Some(menu);

        if self.menus.get(menu.0).is_none() {
            warning!("set_menu", "trying to make nonexistent menu {menu} current");
        }
    }

    pub(crate) fn active_menu(&self, func_name: &str) -> Option<MenuId> {
        let menu = self.get_menu();
        if menu.is_none() {
            warning!(func_name, "attempted on bogus menu 0");
        }
        menu
    }

    /// Appends a (label, value) leaf entry to the current menu.
    pub fn add_menu_entry(&mut self, name: &str, value: i32) {
        self.add_entry_impl("add_menu_entry", name, value, None);
    }

    /// Appends `submenu` under the current menu. The same submenu may be
    /// linked any number of times; back-links are reference counted.
    pub fn add_sub_menu(&mut self, name: &str, submenu: MenuId) {
        self.add_entry_impl("add_sub_menu", name, 0, Some(submenu));
    }

    fn add_entry_impl(
        &mut self,
        func_name: &'static str,
        name: &str,
        value: i32,
        submenu: Option<MenuId>,
    ) {
        self.check_init(func_name);
        let Some(menu) = self.active_menu(func_name) else { return };

        if self.menu_ref(menu).in_use {
            warning!(func_name, "trying to change menu {menu} which is in use");
            return;
        }

        if let Some(submenu) = submenu {
            if self.menus.get(submenu.0).is_none() {
                warning!(func_name, "attempted to add bogus menu {submenu}");
                return;
            }
            // The submenu must notify this menu when it changes.
            self.menu_mut(submenu).parents.add_ref(menu);
        }

        let item = MenuItem { label: mnemonic_label(name), value, submenu };
        let record = self.menu_mut(menu);
        record.items.push(item);
        record.needs_refresh = true;
        self.notify_parent_menus(menu, 0);
    }

    /// Replaces entry `entry` (1-based) of the current menu with a leaf
    /// item.
    pub fn change_to_menu_entry(&mut self, entry: usize, name: &str, value: i32) {
        self.change_entry_impl("change_to_menu_entry", entry, name, value, None);
    }

    /// Replaces entry `entry` (1-based) of the current menu with a
    /// submenu link.
    pub fn change_to_sub_menu(&mut self, entry: usize, name: &str, submenu: MenuId) {
        self.change_entry_impl("change_to_sub_menu", entry, name, 0, Some(submenu));
    }

    fn change_entry_impl(
        &mut self,
        func_name: &'static str,
        entry: usize,
        name: &str,
        value: i32,
        submenu: Option<MenuId>,
    ) {
        self.check_init(func_name);
        let Some(menu) = self.active_menu(func_name) else { return };

        let record = self.menu_ref(menu);
        if record.in_use {
            warning!(func_name, "trying to change menu {menu} which is in use");
            return;
        }
        if entry < 1 || entry > record.items.len() {
            warning!(func_name, "attempt on bogus item entry {entry}");
            return;
        }

        if let Some(submenu) = submenu {
            if self.menus.get(submenu.0).is_none() {
                warning!(func_name, "attempt to change link to bogus menu {submenu}");
                return;
            }
        }

        let old_submenu = self.menu_ref(menu).items[entry - 1].submenu;
        if let Some(old) = old_submenu {
            // The old link goes away; one reference back to us with it.
            if self.menus.get(old.0).is_some() {
                self.menu_mut(old).parents.remove_ref(menu);
            }
        }
        if let Some(submenu) = submenu {
            self.menu_mut(submenu).parents.add_ref(menu);
        }

        let record = self.menu_mut(menu);
        let item = &mut record.items[entry - 1];
        item.label = mnemonic_label(name);
        item.value = value;
        item.submenu = submenu;
        record.needs_refresh = true;
        self.notify_parent_menus(menu, 0);
    }

    /// Deletes entry `entry` (1-based) from the current menu.
    pub fn remove_menu_item(&mut self, entry: usize) {
        self.check_init("remove_menu_item");
        let Some(menu) = self.active_menu("remove_menu_item") else { return };

        let record = self.menu_ref(menu);
        if record.in_use {
            warning!("remove_menu_item", "trying to change menu {menu} which is in use");
            return;
        }
        if entry < 1 || entry > record.items.len() {
            warning!("remove_menu_item", "attempt on bogus item entry {entry}");
            return;
        }

        let item = self.menu_mut(menu).items.remove(entry - 1);
        if let Some(old) = item.submenu {
            if self.menus.get(old.0).is_some() {
                self.menu_mut(old).parents.remove_ref(menu);
            }
        }

        let record = self.menu_mut(menu);
        record.needs_refresh = true;
        self.notify_parent_menus(menu, 0);
    }

    /// Binds the current menu to a mouse button of the current window.
    /// Presses of that button open the popup instead of reaching the
    /// mouse callback.
    pub fn attach_menu(&mut self, button: MouseButton) {
        self.check_init("attach_menu");

        let window = self.active_window("attach_menu");
        let menu = self.active_menu("attach_menu");
        let (Some(window), Some(menu)) = (window, menu) else { return };

        if self.menu_ref(menu).in_use {
            warning!("attach_menu", "trying to attach menu {menu} which is in use");
            return;
        }

        self.register_mouse_listener(window);
        self.window_mut(window).button_menu[button.index()] = Some(menu);
    }

    /// Unbinds whatever menu is attached to `button` on the current
    /// window. The shared press/release listeners go away only when no
    /// other binding or callback still needs them.
    pub fn detach_menu(&mut self, button: MouseButton) {
        self.check_init("detach_menu");

        let Some(window) = self.active_window("detach_menu") else { return };

        let bound = self.window_ref(window).button_menu[button.index()];
        let menu = bound.and_then(|m| self.menus.get(m.0).map(|_| m));
        let Some(menu) = menu else {
            warning!(
                "detach_menu",
                "trying to detach a menu from button {} which has none",
                button.index()
            );
            return;
        };

        if self.menu_ref(menu).in_use {
            warning!("detach_menu", "trying to detach menu {menu} which is in use");
            return;
        }

        self.unregister_mouse_listener(window, Some(button.index()));
        self.window_mut(window).button_menu[button.index()] = None;
    }

    /// Associates arbitrary client data with the current menu.
    pub fn set_menu_data(&mut self, data: Option<Box<dyn Any>>) {
        self.check_init("set_menu_data");
        if let Some(menu) = self.active_menu("set_menu_data") {
            self.menu_mut(menu).user_data = data;
        }
    }

    /// Client data previously stored on the current menu.
    pub fn menu_data(&mut self) -> Option<&mut (dyn Any + 'static)> {
        self.check_init("menu_data");
        let menu = self.active_menu("menu_data")?;
        self.menu_mut(menu).user_data.as_deref_mut()
    }

    /// Number of entries in the current menu.
    pub(crate) fn menu_num_items(&self) -> i32 {
        match self.get_menu() {
            Some(menu) => self.menu_ref(menu).items.len() as i32,
            None => 0,
        }
    }

    /// Flips `in_use` on the whole submenu tree reachable from `menu`.
    /// The flag check terminates cycles.
    pub(crate) fn set_menu_in_use(&mut self, menu: MenuId, in_use: bool) {
        let Some(record) = self.menus.get_mut(menu.0) else { return };
        if record.in_use == in_use {
            return;
        }
        record.in_use = in_use;

        let submenus: Vec<MenuId> = record.items.iter().filter_map(|item| item.submenu).collect();
        for submenu in submenus {
            if self.menus.get(submenu.0).is_none() {
                warning!("set_menu_in_use", "attempt on bogus submenu {submenu}");
            } else {
                self.set_menu_in_use(submenu, in_use);
            }
        }
    }

    /// Marks every transitive parent of `menu` stale so open ancestors
    /// rebuild on their next display. Depth-bounded against submenu
    /// cycles.
    pub(crate) fn notify_parent_menus(&mut self, menu: MenuId, depth: u32) {
        if depth > MAX_MENU_DEPTH {
            warning!("notify_parent_menus", "menu exceeds maximal menu depth");
            return;
        }

        let parents = match self.menus.get(menu.0) {
            Some(record) => record.parents.owners(),
            None => return,
        };

        for parent in parents {
            if let Some(record) = self.menus.get_mut(parent.0) {
                record.needs_refresh = true;
                self.notify_parent_menus(parent, depth + 1);
            }
        }
    }

    /// Returns the realized widget for `menu`, rebuilding it from the
    /// current item list when stale. Submenu widgets are rebuilt fresh
    /// on every display; only the popup root is memoized.
    pub(crate) fn regenerate_menu(&mut self, menu: MenuId, depth: u32) -> Option<WidgetHandle> {
        if depth > MAX_MENU_DEPTH {
            warning!("regenerate_menu", "menu is too deep (>{MAX_MENU_DEPTH})");
            return None;
        }

        let Some(record) = self.menus.get(menu.0) else {
            warning!("regenerate_menu", "attempt on bogus menu {menu}");
            return None;
        };

        if depth == 0 {
            if !record.needs_refresh {
                if let Some(widget) = record.cached_widget {
                    return Some(widget);
                }
            }
            if let Some(stale) = record.cached_widget {
                self.toolkit.destroy_widget(stale);
            }
        }

        let root = if depth == 0 { Some(menu) } else { None };
        let widget = self.toolkit.menu_new(root);

        let items = self.menu_ref(menu).items.clone();
        for item in items {
            let activate = if item.submenu.is_none() { Some((menu, item.value)) } else { None };
            let item_widget = self.toolkit.menu_append_item(widget, &item.label, activate);

            if let Some(submenu) = item.submenu {
                match self.regenerate_menu(submenu, depth + 1) {
                    Some(submenu_widget) => {
                        self.toolkit.menu_set_submenu(item_widget, submenu_widget)
                    }
                    None => warning!("regenerate_menu", "attempt on bogus submenu {submenu}"),
                }
            }
        }

        if depth == 0 {
            let record = self.menu_mut(menu);
            record.needs_refresh = false;
            record.cached_widget = Some(widget);
        }

        Some(widget)
    }

    /// Popup path for a press on a menu-bound button: the connected
    /// menu tree becomes `in_use`, the status callbacks fire, and the
    /// (re)built widget pops up.
    pub(crate) fn open_menu_popup(
        &mut self,
        window: WindowId,
        menu: MenuId,
        button: MouseButton,
        x: i32,
        y: i32,
    ) {
        if self.menus.get(menu.0).is_none() {
            warning!(
                "button_event",
                "an undefined menu {menu} is registered on button {}",
                button.index()
            );
            return;
        }

        self.set_menu_in_use(menu, true);
        self.menu_mut(menu).popped_up_from = Some(window);
        self.active_menu_window = Some(window);

        self.call_menu_status(MenuState::InUse, x, y, window, menu);

        if let Some(widget) = self.regenerate_menu(menu, 0) {
            self.toolkit.menu_popup(widget, button);
        }
    }

    /// A leaf entry was selected: the owning menu's callback runs with
    /// the window that triggered the popup current.
    pub(crate) fn menu_item_activated(&mut self, menu: MenuId, value: i32) {
        let Some(record) = self.menus.get(menu.0) else {
            warning!("menu_item_activated", "item callback on nonexistent menu {menu}");
            return;
        };

        let callback = record.callback.clone();
        self.set_menu(menu);
        match self.active_menu_window {
            Some(window) => self.set_window(window),
            None => warning!("menu_item_activated", "no window triggered menu {menu}"),
        }
        callback(self, value);
        self.active_menu_window = None;
    }

    /// The popup closed: leave `in_use`, report the transition with the
    /// pointer position, and clear the triggering-window marker.
    pub(crate) fn menu_dismissed(&mut self, menu: MenuId) {
        let Some(record) = self.menus.get(menu.0) else {
            warning!("menu_dismissed", "deactivated menu {menu} does not exist");
            return;
        };

        let Some(window) = record.popped_up_from else {
            // Submenus are dismissed with their root.
            return;
        };

        let Some(window_record) = self.windows.get(window.0) else {
            warning!("menu_dismissed", "menu deactivated on nonexistent window {window}");
            return;
        };
        let area = window_record.widgets.drawing_area;
        let (x, y) = self.toolkit.pointer_position(area);

        self.call_menu_status(MenuState::NotInUse, x, y, window, menu);
        self.set_menu_in_use(menu, false);
        self.menu_mut(menu).popped_up_from = None;
    }

    /// Runs the global menu status/state callbacks with the window and
    /// menu of the transition made current.
    pub(crate) fn call_menu_status(
        &mut self,
        state: MenuState,
        x: i32,
        y: i32,
        window: WindowId,
        menu: MenuId,
    ) {
        if let Some(callback) = self.menu_status.clone() {
            self.set_window(window);
            self.set_menu(menu);
            callback(self, state, x, y);
        }

        if let Some(callback) = self.menu_state.clone() {
            self.set_window(window);
            self.set_menu(menu);
            callback(self, state);
        }
    }

    pub(crate) fn menu_ref(&self, menu: MenuId) -> &Menu {
        self.menus.get(menu.0).expect("menu table entry vanished")
    }

    pub(crate) fn menu_mut(&mut self, menu: MenuId) -> &mut Menu {
        self.menus.get_mut(menu.0).expect("menu table entry vanished")
    }
}
