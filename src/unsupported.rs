//! Legacy surface that is accepted but permanently unimplemented:
//! overlays, game mode, exotic input devices, indexed colormaps and
//! video resizing. Each entry point warns and returns a harmless
//! default, matching what legacy clients already expect on platforms
//! without these features.

use crate::context::Glut;
use crate::error::warning;

fn unimplemented_warning(func_name: &str) {
    warning!(func_name, "function is not implemented");
}

impl Glut {
    pub fn establish_overlay(&mut self) {
        unimplemented_warning("establish_overlay");
    }

    pub fn remove_overlay(&mut self) {
        unimplemented_warning("remove_overlay");
    }

    pub fn use_layer(&mut self, _layer: i32) {
        unimplemented_warning("use_layer");
    }

    pub fn post_overlay_redisplay(&mut self) {
        unimplemented_warning("post_overlay_redisplay");
    }

    pub fn show_overlay(&mut self) {
        unimplemented_warning("show_overlay");
    }

    pub fn hide_overlay(&mut self) {
        unimplemented_warning("hide_overlay");
    }

    pub fn game_mode_string(&mut self, _string: &str) {
        unimplemented_warning("game_mode_string");
    }

    pub fn enter_game_mode(&mut self) -> i32 {
        unimplemented_warning("enter_game_mode");
        0
    }

    pub fn leave_game_mode(&mut self) {
        unimplemented_warning("leave_game_mode");
    }

    pub fn game_mode_get(&mut self, _query: i32) -> i32 {
        unimplemented_warning("game_mode_get");
        0
    }

    pub fn set_color(&mut self, _index: i32, _red: f32, _green: f32, _blue: f32) {
        unimplemented_warning("set_color");
    }

    pub fn get_color(&mut self, _index: i32, _component: i32) -> f32 {
        unimplemented_warning("get_color");
        0.0
    }

    pub fn copy_colormap(&mut self, _window: i32) {
        unimplemented_warning("copy_colormap");
    }

    pub fn ignore_key_repeat(&mut self, _ignore: bool) {
        unimplemented_warning("ignore_key_repeat");
    }

    pub fn set_key_repeat(&mut self, _mode: i32) {
        unimplemented_warning("set_key_repeat");
    }

    pub fn video_resize_get(&mut self, _query: i32) -> i32 {
        unimplemented_warning("video_resize_get");
        0
    }

    pub fn setup_video_resizing(&mut self) {
        unimplemented_warning("setup_video_resizing");
    }

    pub fn stop_video_resizing(&mut self) {
        unimplemented_warning("stop_video_resizing");
    }
}
