//! Command-line argument handling.
//!
//! A fixed set of shim flags is recognized and stripped before the
//! remaining arguments reach the application: `-geometry`, `-direct`,
//! `-indirect`, `-iconic` and `-gldebug` apply to the init-time state,
//! while `-display` and `-sync` are rewritten to the toolkit's own
//! spelling and left for it to consume.

use crate::config::{DirectRender, Geometry, InitState};

pub(crate) struct ParsedArgs {
    /// Geometry request, resolved against the screen after the toolkit
    /// comes up (negative offsets count from the far edge).
    pub(crate) geometry: Option<Geometry>,
    /// Arguments rewritten for the toolkit; removed afterwards if the
    /// toolkit left them behind.
    pub(crate) passthrough: Vec<String>,
}

/// Applies and strips the recognized flags from `args`, in place.
pub(crate) fn parse_command_line(init: &mut InitState, args: &mut Vec<String>) -> ParsedArgs {
    let mut parsed = ParsedArgs { geometry: None, passthrough: Vec::new() };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-display" => {
                args[i] = "--display".to_owned();
                parsed.passthrough.push("--display".to_owned());
                i += 2;
            }
            "-geometry" => {
                args.remove(i);
                if i < args.len() {
                    let spec = args.remove(i);
                    parsed.geometry = Some(parse_geometry_spec(&spec, init.geometry));
                }
            }
            "-sync" => {
                args[i] = "--sync".to_owned();
                parsed.passthrough.push("--sync".to_owned());
                i += 1;
            }
            "-indirect" => {
                init.direct = DirectRender::Indirect;
                args.remove(i);
            }
            "-direct" => {
                init.direct = DirectRender::Direct;
                args.remove(i);
            }
            "-iconic" => {
                init.iconic = true;
                args.remove(i);
            }
            "-gldebug" => {
                init.gl_debug = true;
                args.remove(i);
            }
            _ => i += 1,
        }
    }

    parsed
}

/// Removes rewritten toolkit arguments the toolkit did not consume
/// (`--display` takes its value argument with it).
pub(crate) fn strip_passthrough_leftovers(args: &mut Vec<String>, passthrough: &[String]) {
    let mut i = 0;
    while i < args.len() {
        if passthrough.iter().any(|p| *p == args[i]) {
            let takes_value = args[i] == "--display";
            args.remove(i);
            if takes_value && i < args.len() {
                args.remove(i);
            }
        } else {
            i += 1;
        }
    }
}

/// Parses a `WIDTHxHEIGHT+X+Y` specification. Missing parts keep the
/// caller's defaults; signs on the offsets are kept, so `-17` stays
/// negative and later resolves against the far screen edge.
pub(crate) fn parse_geometry_spec(spec: &str, defaults: Geometry) -> Geometry {
    let mut geometry = defaults;
    let mut rest = spec;

    if let Some((width, after)) = take_int(rest) {
        geometry.width = width;
        rest = after;
        if let Some(after) = rest.strip_prefix('x') {
            if let Some((height, after)) = take_int(after) {
                geometry.height = height;
                rest = after;
                if let Some((x, after)) = take_int(rest) {
                    geometry.x = x;
                    rest = after;
                    if let Some((y, _)) = take_int(rest) {
                        geometry.y = y;
                    }
                }
            }
        }
    }

    geometry
}

/// Reads one optionally signed decimal integer off the front of `s`.
fn take_int(s: &str) -> Option<(i32, &str)> {
    let unsigned = s.strip_prefix(|c| c == '+' || c == '-').unwrap_or(s);
    let digits = unsigned.len() - unsigned.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }

    let consumed = s.len() - unsigned.len() + digits;
    let negative = s.starts_with('-');
    let value: i32 = unsigned[..digits].parse().ok()?;
    Some((if negative { -value } else { value }, &s[consumed..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InitState;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn geometry_and_iconic_are_parsed_and_stripped() {
        let mut init = InitState::new();
        let mut argv = args(&["prog", "-geometry", "100x200+10+20", "-iconic", "file.obj"]);

        let parsed = parse_command_line(&mut init, &mut argv);

        assert_eq!(
            parsed.geometry,
            Some(Geometry { x: 10, y: 20, width: 100, height: 200 })
        );
        assert!(init.iconic);
        assert_eq!(argv, args(&["prog", "file.obj"]));
    }

    #[test]
    fn negative_offsets_stay_negative_for_later_resolution() {
        let defaults = InitState::new().geometry;
        let geometry = parse_geometry_spec("5x7+11-17", defaults);
        assert_eq!(geometry.width, 5);
        assert_eq!(geometry.height, 7);
        assert_eq!(geometry.x, 11);
        assert_eq!(geometry.y, -17);
    }

    #[test]
    fn partial_geometry_keeps_defaults() {
        let defaults = InitState::new().geometry;
        let geometry = parse_geometry_spec("640x480", defaults);
        assert_eq!(geometry.width, 640);
        assert_eq!(geometry.height, 480);
        assert_eq!(geometry.x, defaults.x);
        assert_eq!(geometry.y, defaults.y);
    }

    #[test]
    fn render_path_flags_apply_last_one_wins() {
        let mut init = InitState::new();
        let mut argv = args(&["prog", "-direct", "-indirect"]);
        parse_command_line(&mut init, &mut argv);
        assert_eq!(init.direct, DirectRender::Indirect);
        assert_eq!(argv, args(&["prog"]));
    }

    #[test]
    fn display_and_sync_are_rewritten_for_the_toolkit() {
        let mut init = InitState::new();
        let mut argv = args(&["prog", "-display", ":1", "-sync", "-gldebug"]);

        let parsed = parse_command_line(&mut init, &mut argv);

        assert!(init.gl_debug);
        assert_eq!(argv, args(&["prog", "--display", ":1", "--sync"]));

        // A toolkit that ignores them: the leftovers are removed.
        strip_passthrough_leftovers(&mut argv, &parsed.passthrough);
        assert_eq!(argv, args(&["prog"]));
    }
}
