//! Extension queries and function-pointer lookup.
//!
//! Name resolution consults the static table of entry points this
//! library provides before falling back to the toolkit's GL loader and,
//! as a last resort, to the system GL library opened at runtime.

use std::ffi::{c_void, CString};

use libloading::Library;
use once_cell::sync::Lazy;

use crate::context::Glut;
use crate::error::warning;

/// Result of a by-name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcAddress {
    /// The name is an entry point served by this library.
    Builtin,
    /// The name resolved to a native GL function.
    Native(*const c_void),
}

/// Legacy entry-point names this library serves natively.
static PROC_NAMES: &[&str] = &[
    "glutInit",
    "glutInitWindowPosition",
    "glutInitWindowSize",
    "glutInitDisplayMode",
    "glutInitDisplayString",
    "glutMainLoop",
    "glutMainLoopEvent",
    "glutLeaveMainLoop",
    "glutCreateWindow",
    "glutCreateSubWindow",
    "glutDestroyWindow",
    "glutSetWindow",
    "glutGetWindow",
    "glutSetWindowTitle",
    "glutSetIconTitle",
    "glutReshapeWindow",
    "glutPositionWindow",
    "glutShowWindow",
    "glutHideWindow",
    "glutIconifyWindow",
    "glutPushWindow",
    "glutPopWindow",
    "glutFullScreen",
    "glutPostRedisplay",
    "glutPostWindowRedisplay",
    "glutSwapBuffers",
    "glutWarpPointer",
    "glutSetCursor",
    "glutSetWindowData",
    "glutGetWindowData",
    "glutDisplayFunc",
    "glutReshapeFunc",
    "glutKeyboardFunc",
    "glutKeyboardUpFunc",
    "glutSpecialFunc",
    "glutSpecialUpFunc",
    "glutMouseFunc",
    "glutMouseWheelFunc",
    "glutMotionFunc",
    "glutPassiveMotionFunc",
    "glutEntryFunc",
    "glutVisibilityFunc",
    "glutWindowStatusFunc",
    "glutCloseFunc",
    "glutWMCloseFunc",
    "glutIdleFunc",
    "glutTimerFunc",
    "glutMenuStatusFunc",
    "glutMenuStateFunc",
    "glutCreateMenu",
    "glutDestroyMenu",
    "glutGetMenu",
    "glutSetMenu",
    "glutAddMenuEntry",
    "glutAddSubMenu",
    "glutChangeToMenuEntry",
    "glutChangeToSubMenu",
    "glutRemoveMenuItem",
    "glutAttachMenu",
    "glutDetachMenu",
    "glutSetMenuData",
    "glutGetMenuData",
    "glutGet",
    "glutSetOption",
    "glutDeviceGet",
    "glutLayerGet",
    "glutGetModifiers",
    "glutExtensionSupported",
    "glutReportErrors",
    "glutGetProcAddress",
];

type GetProcFn = unsafe extern "C" fn(*const u8) -> *const c_void;

/// Extension-loader entry of the system GL library, opened on first use.
/// The library stays mapped for the life of the process.
static GL_GET_PROC: Lazy<Option<GetProcFn>> = Lazy::new(|| unsafe {
    for name in ["libGL.so.1", "libGL.so"] {
        if let Ok(library) = Library::new(name) {
            if let Ok(symbol) = library.get::<GetProcFn>(b"glXGetProcAddressARB\0") {
                let getter = *symbol;
                std::mem::forget(library);
                return Some(getter);
            }
        }
    }
    None
});

fn system_proc_address(name: &str) -> Option<*const c_void> {
    let getter = (*GL_GET_PROC)?;
    let name = CString::new(name).ok()?;
    let address = unsafe { getter(name.as_ptr().cast()) };
    if address.is_null() {
        None
    } else {
        Some(address)
    }
}

impl Glut {
    /// Resolves a function name: entry points of this library first,
    /// then the toolkit's GL loader, then the system GL library.
    pub fn get_proc_address(&mut self, name: &str) -> Option<ProcAddress> {
        self.check_init("get_proc_address");

        if PROC_NAMES.contains(&name) {
            return Some(ProcAddress::Builtin);
        }

        if let Some(address) = self.toolkit.gl_proc_address(name) {
            return Some(ProcAddress::Native(address));
        }

        system_proc_address(name).map(ProcAddress::Native)
    }

    /// Tokenized membership test against the GL extension string of the
    /// current context.
    pub fn extension_supported(&mut self, extension: &str) -> bool {
        self.check_init("extension_supported");

        if extension.is_empty() || extension.contains(' ') {
            return false;
        }

        match self.toolkit.gl_extensions() {
            Some(extensions) => extensions.split_whitespace().any(|token| token == extension),
            None => false,
        }
    }

    /// Drains and reports every error the GL context accumulated.
    pub fn report_errors(&mut self) {
        self.check_init("report_errors");
        for code in self.toolkit.gl_errors() {
            warning!("report_errors", "GL error 0x{code:x}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PROC_NAMES;

    #[test]
    fn the_name_table_covers_the_lookup_entry_point_itself() {
        assert!(PROC_NAMES.contains(&"glutGetProcAddress"));
        assert!(PROC_NAMES.contains(&"glutCreateWindow"));
        assert!(!PROC_NAMES.contains(&"glXSwapBuffers"));
    }
}
