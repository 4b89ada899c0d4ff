//! X11 + GLX surface.
//!
//! The canonical backend: an ARGB GLX window whose `glXSwapBuffers` call is
//! what the injected hook intercepts. Input forwarding re-injects the
//! original `XEvent` at the host window via `XSendEvent`.

use super::Surface;
use crate::error::MirrorError;
use crate::event::{EventKind, InputEvent, RawPayload, WindowIdent};
use crate::hotkey::Key;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_long, c_uchar, c_ulong, c_void};
use std::ptr;
use std::time::{Duration, Instant};
use x11::glx;
use x11::xlib;

/// Minimal fixed-function GL surface, linked straight from libGL. The quad
/// pipeline predates shaders and every driver still ships it.
mod gl {
    use std::os::raw::{c_double, c_float, c_int, c_uint, c_void};

    pub type GLenum = c_uint;
    pub type GLuint = c_uint;
    pub type GLint = c_int;
    pub type GLsizei = c_int;
    pub type GLbitfield = c_uint;
    pub type GLfloat = c_float;
    pub type GLdouble = c_double;

    pub const TEXTURE_2D: GLenum = 0x0DE1;
    pub const TEXTURE_MIN_FILTER: GLenum = 0x2801;
    pub const TEXTURE_MAG_FILTER: GLenum = 0x2800;
    pub const LINEAR: GLint = 0x2601;
    pub const TEXTURE_WRAP_S: GLenum = 0x2802;
    pub const TEXTURE_WRAP_T: GLenum = 0x2803;
    pub const CLAMP_TO_EDGE: GLint = 0x812F;
    pub const RGBA8: GLint = 0x8058;
    pub const BGRA: GLenum = 0x80E1;
    pub const UNSIGNED_BYTE: GLenum = 0x1401;
    pub const COLOR_BUFFER_BIT: GLbitfield = 0x4000;
    pub const BLEND: GLenum = 0x0BE2;
    pub const SRC_ALPHA: GLenum = 0x0302;
    pub const ONE_MINUS_SRC_ALPHA: GLenum = 0x0303;
    pub const PROJECTION: GLenum = 0x1701;
    pub const MODELVIEW: GLenum = 0x1700;
    pub const QUADS: GLenum = 0x0007;
    pub const UNPACK_ALIGNMENT: GLenum = 0x0CF5;

    #[link(name = "GL")]
    extern "C" {
        pub fn glGenTextures(n: GLsizei, textures: *mut GLuint);
        pub fn glDeleteTextures(n: GLsizei, textures: *const GLuint);
        pub fn glBindTexture(target: GLenum, texture: GLuint);
        pub fn glTexParameteri(target: GLenum, pname: GLenum, param: GLint);
        pub fn glPixelStorei(pname: GLenum, param: GLint);
        pub fn glTexImage2D(
            target: GLenum,
            level: GLint,
            internalformat: GLint,
            width: GLsizei,
            height: GLsizei,
            border: GLint,
            format: GLenum,
            type_: GLenum,
            pixels: *const c_void,
        );
        pub fn glTexSubImage2D(
            target: GLenum,
            level: GLint,
            xoffset: GLint,
            yoffset: GLint,
            width: GLsizei,
            height: GLsizei,
            format: GLenum,
            type_: GLenum,
            pixels: *const c_void,
        );
        pub fn glViewport(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
        pub fn glClearColor(r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat);
        pub fn glClear(mask: GLbitfield);
        pub fn glEnable(cap: GLenum);
        pub fn glBlendFunc(sfactor: GLenum, dfactor: GLenum);
        pub fn glMatrixMode(mode: GLenum);
        pub fn glLoadIdentity();
        pub fn glOrtho(
            left: GLdouble,
            right: GLdouble,
            bottom: GLdouble,
            top: GLdouble,
            near: GLdouble,
            far: GLdouble,
        );
        pub fn glBegin(mode: GLenum);
        pub fn glEnd();
        pub fn glTexCoord2f(s: GLfloat, t: GLfloat);
        pub fn glVertex2f(x: GLfloat, y: GLfloat);
        pub fn glColor4f(r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat);
    }
}

const MWM_HINTS_DECORATIONS: c_ulong = 1 << 1;

#[repr(C)]
struct MotifWmHints {
    flags: c_ulong,
    functions: c_ulong,
    decorations: c_ulong,
    input_mode: c_long,
    status: c_ulong,
}

struct FrameTexture {
    id: gl::GLuint,
    width: u32,
    height: u32,
}

pub struct X11Surface {
    display: *mut xlib::Display,
    window: xlib::Window,
    context: glx::GLXContext,
    texture: Option<FrameTexture>,
    frame: (i32, i32, u32, u32),
    destroyed: bool,
}

// The display connection is only touched under the compositor's render
// mutex; destroy() from another thread takes the same mutex.
unsafe impl Send for X11Surface {}

const EVENT_MASK: c_long = xlib::KeyPressMask
    | xlib::KeyReleaseMask
    | xlib::ButtonPressMask
    | xlib::ButtonReleaseMask
    | xlib::PointerMotionMask
    | xlib::FocusChangeMask
    | xlib::StructureNotifyMask
    | xlib::ExposureMask;

impl X11Surface {
    pub fn new(width: u32, height: u32, title: &str) -> Result<Self, MirrorError> {
        unsafe {
            let display = xlib::XOpenDisplay(ptr::null());
            if display.is_null() {
                return Err(MirrorError::PlatformInit("cannot open X display".into()));
            }
            match Self::create_on(display, width, height, title) {
                Ok(surface) => Ok(surface),
                Err(e) => {
                    xlib::XCloseDisplay(display);
                    Err(e)
                }
            }
        }
    }

    unsafe fn create_on(
        display: *mut xlib::Display,
        width: u32,
        height: u32,
        title: &str,
    ) -> Result<Self, MirrorError> {
        let screen = xlib::XDefaultScreen(display);

        // Double-buffered, 8-bit alpha: the window has to be able to clear
        // to fully transparent so only the uploaded frame is visible.
        let attribs: [c_int; 17] = [
            glx::GLX_X_RENDERABLE,
            1,
            glx::GLX_DRAWABLE_TYPE,
            glx::GLX_WINDOW_BIT,
            glx::GLX_RENDER_TYPE,
            glx::GLX_RGBA_BIT,
            glx::GLX_DOUBLEBUFFER,
            1,
            glx::GLX_RED_SIZE,
            8,
            glx::GLX_GREEN_SIZE,
            8,
            glx::GLX_BLUE_SIZE,
            8,
            glx::GLX_ALPHA_SIZE,
            8,
            0,
        ];

        let mut count = 0;
        let configs = glx::glXChooseFBConfig(display, screen, attribs.as_ptr(), &mut count);
        if configs.is_null() || count == 0 {
            return Err(MirrorError::PlatformInit(
                "no double-buffered ARGB framebuffer config".into(),
            ));
        }

        // Prefer a 32-bit visual so the compositor actually honours alpha.
        let mut chosen = *configs;
        let mut visual: *mut xlib::XVisualInfo = ptr::null_mut();
        for i in 0..count as isize {
            let cfg = *configs.offset(i);
            let vi = glx::glXGetVisualFromFBConfig(display, cfg);
            if vi.is_null() {
                continue;
            }
            if (*vi).depth == 32 {
                if !visual.is_null() {
                    xlib::XFree(visual as *mut c_void);
                }
                chosen = cfg;
                visual = vi;
                break;
            }
            if visual.is_null() {
                chosen = cfg;
                visual = vi;
            } else {
                xlib::XFree(vi as *mut c_void);
            }
        }
        xlib::XFree(configs as *mut c_void);
        if visual.is_null() {
            return Err(MirrorError::PlatformInit("no GLX visual".into()));
        }

        let root = xlib::XRootWindow(display, screen);
        let colormap =
            xlib::XCreateColormap(display, root, (*visual).visual, xlib::AllocNone);

        let mut swa: xlib::XSetWindowAttributes = std::mem::zeroed();
        swa.colormap = colormap;
        swa.border_pixel = 0;
        swa.background_pixel = 0;
        swa.event_mask = EVENT_MASK;

        let window = xlib::XCreateWindow(
            display,
            root,
            0,
            0,
            width,
            height,
            0,
            (*visual).depth,
            xlib::InputOutput as u32,
            (*visual).visual,
            xlib::CWColormap | xlib::CWBorderPixel | xlib::CWBackPixel | xlib::CWEventMask,
            &mut swa,
        );
        if window == 0 {
            xlib::XFree(visual as *mut c_void);
            xlib::XFreeColormap(display, colormap);
            return Err(MirrorError::PlatformInit("XCreateWindow failed".into()));
        }

        if let Ok(name) = CString::new(title) {
            xlib::XStoreName(display, window, name.as_ptr() as *mut c_char);
        }
        Self::strip_decorations(display, window);
        Self::set_wm_state(display, window);

        let context =
            glx::glXCreateNewContext(display, chosen, glx::GLX_RGBA_TYPE, ptr::null_mut(), 1);
        xlib::XFree(visual as *mut c_void);
        if context.is_null() {
            xlib::XDestroyWindow(display, window);
            xlib::XFreeColormap(display, colormap);
            return Err(MirrorError::PlatformInit("glXCreateNewContext failed".into()));
        }

        let direct = glx::glXIsDirect(display, context) != 0;
        tracing::debug!(window, direct, "GLX context created");

        Ok(Self {
            display,
            window,
            context,
            texture: None,
            frame: (0, 0, width, height),
            destroyed: false,
        })
    }

    unsafe fn intern(&self, name: &str) -> xlib::Atom {
        Self::intern_on(self.display, name)
    }

    unsafe fn intern_on(display: *mut xlib::Display, name: &str) -> xlib::Atom {
        let cname = CString::new(name).unwrap_or_default();
        xlib::XInternAtom(display, cname.as_ptr(), xlib::False)
    }

    unsafe fn strip_decorations(display: *mut xlib::Display, window: xlib::Window) {
        let hints = MotifWmHints {
            flags: MWM_HINTS_DECORATIONS,
            functions: 0,
            decorations: 0,
            input_mode: 0,
            status: 0,
        };
        let atom = Self::intern_on(display, "_MOTIF_WM_HINTS");
        xlib::XChangeProperty(
            display,
            window,
            atom,
            atom,
            32,
            xlib::PropModeReplace,
            &hints as *const MotifWmHints as *const c_uchar,
            5,
        );
    }

    unsafe fn set_wm_state(display: *mut xlib::Display, window: xlib::Window) {
        // Always on top, invisible to taskbar and pager enumeration.
        let state = Self::intern_on(display, "_NET_WM_STATE");
        let values: [xlib::Atom; 3] = [
            Self::intern_on(display, "_NET_WM_STATE_ABOVE"),
            Self::intern_on(display, "_NET_WM_STATE_SKIP_TASKBAR"),
            Self::intern_on(display, "_NET_WM_STATE_SKIP_PAGER"),
        ];
        xlib::XChangeProperty(
            display,
            window,
            state,
            xlib::XA_ATOM,
            32,
            xlib::PropModeReplace,
            values.as_ptr() as *const c_uchar,
            values.len() as c_int,
        );
    }

    unsafe fn translate(&mut self, xev: &xlib::XEvent) -> Option<InputEvent> {
        let kind = match xev.get_type() {
            xlib::KeyPress | xlib::KeyRelease => {
                let mut kev = xev.key;
                let sym = xlib::XLookupKeysym(&mut kev, 0);
                let key = Key::from_x11_keysym(sym as u32);
                let ctrl = kev.state & xlib::ControlMask != 0;
                let shift = kev.state & xlib::ShiftMask != 0;
                let alt = kev.state & xlib::Mod1Mask != 0;
                if xev.get_type() == xlib::KeyPress {
                    EventKind::KeyDown { key, ctrl, shift, alt }
                } else {
                    EventKind::KeyUp { key, ctrl, shift, alt }
                }
            }
            xlib::ButtonPress => {
                let bev = xev.button;
                EventKind::ButtonDown {
                    button: bev.button as u8,
                    x: bev.x,
                    y: bev.y,
                }
            }
            xlib::ButtonRelease => {
                let bev = xev.button;
                EventKind::ButtonUp {
                    button: bev.button as u8,
                    x: bev.x,
                    y: bev.y,
                }
            }
            xlib::MotionNotify => {
                let mev = xev.motion;
                EventKind::Motion { x: mev.x, y: mev.y }
            }
            xlib::FocusIn => EventKind::FocusGained,
            xlib::FocusOut => EventKind::FocusLost,
            xlib::ConfigureNotify => {
                let cev = xev.configure;
                self.frame = (cev.x, cev.y, cev.width as u32, cev.height as u32);
                return None;
            }
            // Redraw happens next frame anyway.
            _ => return None,
        };
        Some(InputEvent {
            kind,
            raw: RawPayload::X11(*xev),
        })
    }

    fn send_mask(event_type: c_int) -> c_long {
        match event_type {
            xlib::KeyPress => xlib::KeyPressMask,
            xlib::KeyRelease => xlib::KeyReleaseMask,
            xlib::ButtonPress => xlib::ButtonPressMask,
            xlib::ButtonRelease => xlib::ButtonReleaseMask,
            xlib::MotionNotify => xlib::PointerMotionMask,
            _ => xlib::NoEventMask,
        }
    }
}

impl Surface for X11Surface {
    fn show(&mut self) -> Result<(), MirrorError> {
        unsafe {
            xlib::XMapRaised(self.display, self.window);
            // Wait for the map to actually happen before anyone renders:
            // swapping an unmapped GLX window no-ops and the hook never sees
            // a present. Bounded, so an unmapping WM cannot hang the host's
            // render thread.
            let deadline = Instant::now() + Duration::from_secs(2);
            let mut ev: xlib::XEvent = std::mem::zeroed();
            loop {
                let got = xlib::XCheckWindowEvent(
                    self.display,
                    self.window,
                    xlib::StructureNotifyMask,
                    &mut ev,
                );
                if got != 0 && ev.get_type() == xlib::MapNotify {
                    break;
                }
                if got == 0 {
                    if Instant::now() >= deadline {
                        return Err(MirrorError::PlatformInit(
                            "window manager never mapped the window".into(),
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
            }
            xlib::XSetInputFocus(
                self.display,
                self.window,
                xlib::RevertToParent,
                xlib::CurrentTime,
            );
            xlib::XFlush(self.display);
        }
        Ok(())
    }

    fn hide(&mut self) {
        unsafe {
            // Drop the binding first so the next bind does not hit a stale
            // drawable.
            glx::glXMakeCurrent(self.display, 0, ptr::null_mut());
            xlib::XUnmapWindow(self.display, self.window);
            xlib::XSync(self.display, xlib::False);
        }
    }

    fn set_frame(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.frame = (x, y, width, height);
        unsafe {
            xlib::XMoveResizeWindow(self.display, self.window, x, y, width, height);
            xlib::XFlush(self.display);
        }
    }

    fn frame(&self) -> (i32, i32, u32, u32) {
        self.frame
    }

    fn bind(&mut self) -> Result<(), MirrorError> {
        let ok = unsafe { glx::glXMakeCurrent(self.display, self.window, self.context) };
        if ok == 0 {
            return Err(MirrorError::ContextBind("glXMakeCurrent refused".into()));
        }
        Ok(())
    }

    fn upload(&mut self, buffer: &[u8], width: u32, height: u32) {
        unsafe {
            let realloc = match &self.texture {
                Some(t) => t.width != width || t.height != height,
                None => true,
            };
            if realloc {
                if let Some(t) = self.texture.take() {
                    gl::glDeleteTextures(1, &t.id);
                }
                let mut id = 0;
                gl::glGenTextures(1, &mut id);
                gl::glBindTexture(gl::TEXTURE_2D, id);
                gl::glTexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR);
                gl::glTexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR);
                gl::glTexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE);
                gl::glTexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE);
                gl::glPixelStorei(gl::UNPACK_ALIGNMENT, 1);
                gl::glTexImage2D(
                    gl::TEXTURE_2D,
                    0,
                    gl::RGBA8,
                    width as gl::GLsizei,
                    height as gl::GLsizei,
                    0,
                    gl::BGRA,
                    gl::UNSIGNED_BYTE,
                    buffer.as_ptr() as *const c_void,
                );
                self.texture = Some(FrameTexture { id, width, height });
                tracing::debug!(width, height, "frame texture (re)allocated");
            } else if let Some(t) = &self.texture {
                gl::glBindTexture(gl::TEXTURE_2D, t.id);
                gl::glTexSubImage2D(
                    gl::TEXTURE_2D,
                    0,
                    0,
                    0,
                    width as gl::GLsizei,
                    height as gl::GLsizei,
                    gl::BGRA,
                    gl::UNSIGNED_BYTE,
                    buffer.as_ptr() as *const c_void,
                );
            }
        }
    }

    fn texture_size(&self) -> Option<(u32, u32)> {
        self.texture.as_ref().map(|t| (t.width, t.height))
    }

    fn draw_frame(&mut self) {
        let (_, _, w, h) = self.frame;
        unsafe {
            gl::glViewport(0, 0, w as gl::GLsizei, h as gl::GLsizei);
            gl::glClearColor(0.0, 0.0, 0.0, 0.0);
            gl::glClear(gl::COLOR_BUFFER_BIT);

            let t = match &self.texture {
                Some(t) => t,
                None => return,
            };

            gl::glMatrixMode(gl::PROJECTION);
            gl::glLoadIdentity();
            // Top-left origin, matching the uploaded buffer.
            gl::glOrtho(0.0, w as f64, h as f64, 0.0, -1.0, 1.0);
            gl::glMatrixMode(gl::MODELVIEW);
            gl::glLoadIdentity();

            gl::glEnable(gl::TEXTURE_2D);
            gl::glEnable(gl::BLEND);
            gl::glBlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
            gl::glBindTexture(gl::TEXTURE_2D, t.id);
            gl::glColor4f(1.0, 1.0, 1.0, 1.0);

            gl::glBegin(gl::QUADS);
            gl::glTexCoord2f(0.0, 0.0);
            gl::glVertex2f(0.0, 0.0);
            gl::glTexCoord2f(1.0, 0.0);
            gl::glVertex2f(w as f32, 0.0);
            gl::glTexCoord2f(1.0, 1.0);
            gl::glVertex2f(w as f32, h as f32);
            gl::glTexCoord2f(0.0, 1.0);
            gl::glVertex2f(0.0, h as f32);
            gl::glEnd();
        }
    }

    fn present(&mut self) {
        unsafe {
            glx::glXSwapBuffers(self.display, self.window);
        }
    }

    fn drain_events(&mut self) -> Vec<InputEvent> {
        let mut out = Vec::new();
        unsafe {
            while xlib::XPending(self.display) > 0 {
                let mut xev: xlib::XEvent = std::mem::zeroed();
                xlib::XNextEvent(self.display, &mut xev);
                if let Some(ev) = self.translate(&xev) {
                    out.push(ev);
                }
            }
        }
        out
    }

    fn forward_event(&mut self, target: WindowIdent, ev: &InputEvent) {
        let RawPayload::X11(mut xev) = ev.raw else {
            return;
        };
        unsafe {
            let event_type = xev.get_type();
            xev.any.window = target.0 as xlib::Window;
            xlib::XSendEvent(
                self.display,
                target.0 as xlib::Window,
                xlib::True,
                Self::send_mask(event_type),
                &mut xev,
            );
            xlib::XFlush(self.display);
        }
    }

    fn request_focus(&mut self) {
        unsafe {
            xlib::XRaiseWindow(self.display, self.window);
            xlib::XSetInputFocus(
                self.display,
                self.window,
                xlib::RevertToParent,
                xlib::CurrentTime,
            );
            xlib::XFlush(self.display);
        }
    }

    fn tag_app_id(&mut self, app_id: u32) {
        unsafe {
            let atom = self.intern("STEAM_GAME");
            xlib::XChangeProperty(
                self.display,
                self.window,
                atom,
                xlib::XA_CARDINAL,
                32,
                xlib::PropModeReplace,
                &app_id as *const u32 as *const c_uchar,
                1,
            );
            xlib::XFlush(self.display);
        }
        tracing::debug!(app_id, "window tagged for the injection hook");
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        unsafe {
            // Texture, then context, then window, then connection. The
            // texture delete needs the context current one last time.
            if let Some(t) = self.texture.take() {
                if glx::glXMakeCurrent(self.display, self.window, self.context) != 0 {
                    gl::glDeleteTextures(1, &t.id);
                }
            }
            glx::glXMakeCurrent(self.display, 0, ptr::null_mut());
            glx::glXDestroyContext(self.display, self.context);
            xlib::XDestroyWindow(self.display, self.window);
            xlib::XCloseDisplay(self.display);
        }
    }

    fn native_id(&self) -> u64 {
        self.window as u64
    }
}
