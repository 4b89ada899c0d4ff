//! macOS surface.
//!
//! Borderless floating NSWindow with an NSOpenGLContext; `flushBuffer` is
//! the present call the injected hook interposes. Events are pulled off the
//! application queue each present cycle and forwarded with `sendEvent:`.

use super::Surface;
use crate::error::MirrorError;
use crate::event::{EventKind, InputEvent, RawPayload, WindowIdent};
use crate::hotkey::Key;
use cocoa::appkit::{
    NSBackingStoreBuffered, NSEvent, NSEventModifierFlags, NSEventType, NSOpenGLContext,
    NSOpenGLPixelFormat, NSScreen, NSWindow, NSWindowStyleMask,
};
use cocoa::base::{id, nil, NO, YES};
use cocoa::foundation::{NSAutoreleasePool, NSDate, NSPoint, NSRect, NSSize, NSString};
use objc::{class, msg_send, sel, sel_impl};

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

    #[link(name = "OpenGL", kind = "framework")]
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

// NSOpenGLPixelFormatAttribute values.
const NSOPENGL_PFA_DOUBLE_BUFFER: u32 = 5;
const NSOPENGL_PFA_COLOR_SIZE: u32 = 8;
const NSOPENGL_PFA_ALPHA_SIZE: u32 = 11;

const NS_FLOATING_WINDOW_LEVEL: i64 = 3;
// Stationary + ignores-cycle: out of Mission Control grouping and Cmd-Tab.
const COLLECTION_BEHAVIOR: u64 = (1 << 4) | (1 << 6);

struct FrameTexture {
    id: gl::GLuint,
    width: u32,
    height: u32,
}

pub struct MacSurface {
    window: id,
    context: id,
    texture: Option<FrameTexture>,
    frame: (i32, i32, u32, u32),
    was_key: bool,
    // Events retained for the current present cycle; released on the next
    // drain since input events are never kept across frames.
    retained: Vec<id>,
    destroyed: bool,
}

unsafe impl Send for MacSurface {}

impl MacSurface {
    pub fn new(width: u32, height: u32, title: &str) -> Result<Self, MirrorError> {
        unsafe {
            let rect = NSRect::new(
                NSPoint::new(0.0, 0.0),
                NSSize::new(width as f64, height as f64),
            );
            let window = NSWindow::alloc(nil).initWithContentRect_styleMask_backing_defer_(
                rect,
                NSWindowStyleMask::NSBorderlessWindowMask,
                NSBackingStoreBuffered,
                NO,
            );
            if window == nil {
                return Err(MirrorError::PlatformInit("NSWindow alloc failed".into()));
            }
            let ns_title = NSString::alloc(nil).init_str(title);
            window.setTitle_(ns_title);
            window.setOpaque_(NO);
            let clear: id = msg_send![class!(NSColor), clearColor];
            window.setBackgroundColor_(clear);
            let _: () = msg_send![window, setLevel: NS_FLOATING_WINDOW_LEVEL];
            let _: () = msg_send![window, setCollectionBehavior: COLLECTION_BEHAVIOR];

            let attrs: [u32; 6] = [
                NSOPENGL_PFA_DOUBLE_BUFFER,
                NSOPENGL_PFA_COLOR_SIZE,
                24,
                NSOPENGL_PFA_ALPHA_SIZE,
                8,
                0,
            ];
            let pixel_format = NSOpenGLPixelFormat::alloc(nil).initWithAttributes_(&attrs);
            if pixel_format == nil {
                let _: () = msg_send![window, close];
                return Err(MirrorError::PlatformInit("no NSOpenGLPixelFormat".into()));
            }
            let context =
                NSOpenGLContext::alloc(nil).initWithFormat_shareContext_(pixel_format, nil);
            let _: () = msg_send![pixel_format, release];
            if context == nil {
                let _: () = msg_send![window, close];
                return Err(MirrorError::PlatformInit("no NSOpenGLContext".into()));
            }
            // Transparent backbuffer: surface opacity off.
            let zero: i32 = 0;
            const NSOPENGL_CP_SURFACE_OPACITY: u64 = 236;
            let _: () = msg_send![context, setValues: &zero forParameter: NSOPENGL_CP_SURFACE_OPACITY];
            context.setView_(window.contentView());

            tracing::debug!(width, height, "mirror NSWindow created");

            Ok(Self {
                window,
                context,
                texture: None,
                frame: (0, 0, width, height),
                was_key: false,
                retained: Vec::new(),
                destroyed: false,
            })
        }
    }

    unsafe fn translate(&self, event: id) -> Option<InputEvent> {
        use NSEventType::*;

        let ev_type = event.eventType();
        // Cocoa's y axis is bottom-up; callers expect top-left origin.
        let flip = |p: NSPoint| (p.x as i32, (self.frame.3 as f64 - p.y) as i32);

        let kind = match ev_type {
            NSKeyDown | NSKeyUp => {
                let key = Key::from_mac_keycode(event.keyCode());
                let flags = event.modifierFlags();
                let ctrl = flags.contains(NSEventModifierFlags::NSControlKeyMask);
                let shift = flags.contains(NSEventModifierFlags::NSShiftKeyMask);
                let alt = flags.contains(NSEventModifierFlags::NSAlternateKeyMask);
                if ev_type == NSKeyDown {
                    EventKind::KeyDown { key, ctrl, shift, alt }
                } else {
                    EventKind::KeyUp { key, ctrl, shift, alt }
                }
            }
            NSLeftMouseDown | NSRightMouseDown | NSOtherMouseDown => {
                let (x, y) = flip(event.locationInWindow());
                EventKind::ButtonDown {
                    button: Self::button_number(ev_type),
                    x,
                    y,
                }
            }
            NSLeftMouseUp | NSRightMouseUp | NSOtherMouseUp => {
                let (x, y) = flip(event.locationInWindow());
                EventKind::ButtonUp {
                    button: Self::button_number(ev_type),
                    x,
                    y,
                }
            }
            NSMouseMoved | NSLeftMouseDragged | NSRightMouseDragged | NSOtherMouseDragged => {
                let (x, y) = flip(event.locationInWindow());
                EventKind::Motion { x, y }
            }
            _ => return None,
        };
        Some(InputEvent {
            kind,
            raw: RawPayload::Mac {
                event: event as usize,
            },
        })
    }

    fn button_number(ev_type: NSEventType) -> u8 {
        match ev_type {
            NSEventType::NSLeftMouseDown | NSEventType::NSLeftMouseUp => 1,
            NSEventType::NSOtherMouseDown | NSEventType::NSOtherMouseUp => 2,
            _ => 3,
        }
    }

    unsafe fn release_retained(&mut self) {
        for ev in self.retained.drain(..) {
            let _: () = msg_send![ev, release];
        }
    }
}

impl Surface for MacSurface {
    fn show(&mut self) -> Result<(), MirrorError> {
        unsafe {
            self.window.makeKeyAndOrderFront_(nil);
            let _: () = msg_send![self.window, orderFrontRegardless];
        }
        Ok(())
    }

    fn hide(&mut self) {
        unsafe {
            let _: () = msg_send![class!(NSOpenGLContext), clearCurrentContext];
            self.window.orderOut_(nil);
        }
    }

    fn set_frame(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.frame = (x, y, width, height);
        unsafe {
            // Cocoa's origin is bottom-left; callers speak top-left.
            let screen_h = NSScreen::mainScreen(nil).frame().size.height;
            let rect = NSRect::new(
                NSPoint::new(x as f64, screen_h - y as f64 - height as f64),
                NSSize::new(width as f64, height as f64),
            );
            self.window.setFrame_display_(rect, YES);
            let _: () = msg_send![self.context, update];
        }
    }

    fn frame(&self) -> (i32, i32, u32, u32) {
        self.frame
    }

    fn bind(&mut self) -> Result<(), MirrorError> {
        if self.context == nil {
            return Err(MirrorError::ContextBind("no NSOpenGLContext".into()));
        }
        unsafe {
            self.context.makeCurrentContext();
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
                    buffer.as_ptr() as *const _,
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
                    buffer.as_ptr() as *const _,
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
            self.context.flushBuffer();
        }
    }

    fn drain_events(&mut self) -> Vec<InputEvent> {
        let mut out = Vec::new();
        unsafe {
            self.release_retained();

            // No focus notifications without a delegate; key-window state
            // polled once per present cycle instead.
            let is_key: bool = msg_send![self.window, isKeyWindow];
            if is_key != self.was_key {
                self.was_key = is_key;
                out.push(InputEvent::synthetic(if is_key {
                    EventKind::FocusGained
                } else {
                    EventKind::FocusLost
                }));
            }

            let pool = NSAutoreleasePool::new(nil);
            let app: id = msg_send![class!(NSApplication), sharedApplication];
            let mode = NSString::alloc(nil).init_str("kCFRunLoopDefaultMode");
            loop {
                let event: id = msg_send![app,
                    nextEventMatchingMask: u64::MAX
                    untilDate: NSDate::distantPast(nil)
                    inMode: mode
                    dequeue: YES];
                if event == nil {
                    break;
                }
                if let Some(ev) = self.translate(event) {
                    let _: id = msg_send![event, retain];
                    self.retained.push(event);
                    out.push(ev);
                } else {
                    let _: () = msg_send![app, sendEvent: event];
                }
            }
            let _: () = msg_send![pool, drain];
        }
        out
    }

    fn forward_event(&mut self, target: WindowIdent, ev: &InputEvent) {
        let RawPayload::Mac { event } = ev.raw else {
            return;
        };
        unsafe {
            let view = target.0 as id;
            let window: id = msg_send![view, window];
            if window != nil {
                let _: () = msg_send![window, sendEvent: event as id];
            }
        }
    }

    fn request_focus(&mut self) {
        unsafe {
            self.window.makeKeyAndOrderFront_(nil);
        }
    }

    fn tag_app_id(&mut self, app_id: u32) {
        // The hook on this platform associates by process.
        tracing::debug!(app_id, "app id noted (process-scoped hook)");
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        unsafe {
            self.release_retained();
            if let Some(t) = self.texture.take() {
                self.context.makeCurrentContext();
                gl::glDeleteTextures(1, &t.id);
            }
            let _: () = msg_send![class!(NSOpenGLContext), clearCurrentContext];
            let _: () = msg_send![self.context, release];
            let _: () = msg_send![self.window, close];
        }
    }

    fn native_id(&self) -> u64 {
        self.window as u64
    }
}
