//! Windows capture surface: a layered overlay window plus `WH_MOUSE_LL` and
//! `WH_KEYBOARD_LL` hooks.
//!
//! # How it works (for beginners)
//!
//! Low-level hooks are delivered to the thread that installed them, and only
//! while that thread is retrieving messages. The session thread installs both
//! hooks and the overlay, then calls [`CaptureSurface::pump`] in its loop;
//! every hook callback and every `WM_PAINT` therefore runs on the session
//! thread. That is why the per-session state below lives in `thread_local!`
//! cells instead of global statics: two sessions can never share them.
//!
//! Button presses are suppressed (return `LRESULT(1)`) so a click that selects
//! a region does not also click the application underneath. Pointer moves pass
//! through so the cursor keeps moving. Escape, Enter and Space are consumed;
//! every other key reaches the focused application.
//!
//! # Safety
//!
//! `unsafe` is used only for Win32 FFI. Every block carries a `// SAFETY:`
//! comment.

#![cfg(target_os = "windows")]

use std::cell::RefCell;
use std::sync::mpsc::Sender;
use std::sync::Once;

use osi_core::{
    CancelReason, CaptureMode, OverlayScene, Point, PointerButton, SessionEvent, SessionKey,
    VirtualScreen,
};
use tracing::{debug, warn};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreatePen, CreateSolidBrush, DeleteObject, Ellipse, EndPaint, FillRect,
    GetStockObject, InvalidateRect, Polyline, Rectangle, SelectObject, HDC, NULL_BRUSH,
    PAINTSTRUCT, PS_SOLID,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW,
    GetClientRect, LoadCursorW, PeekMessageW, RegisterClassW, SetLayeredWindowAttributes,
    SetWindowPos, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HC_ACTION, HHOOK,
    HWND_TOPMOST, IDC_CROSS, KBDLLHOOKSTRUCT, LWA_ALPHA, MSG, MSLLHOOKSTRUCT, PM_REMOVE,
    SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_SHOWWINDOW, WH_KEYBOARD_LL, WH_MOUSE_LL,
    WINDOW_STYLE, WM_DESTROY, WM_ERASEBKGND, WM_KEYDOWN, WM_LBUTTONDOWN, WM_LBUTTONUP,
    WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEMOVE, WM_PAINT, WM_RBUTTONDOWN, WM_RBUTTONUP,
    WM_SYSKEYDOWN, WNDCLASSW, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST,
    WS_POPUP,
};

use super::{CaptureBackend, CaptureSurface, SurfaceError};

const CLASS_NAME: &str = "OsInteractionCaptureOverlay";

/// Overlay opacity (0-255). Low enough to see the desktop through the veil.
const OVERLAY_ALPHA: u8 = 110;

/// COLORREF values are 0x00BBGGRR.
const VEIL_COLOR: COLORREF = COLORREF(0x0020_2020);
const STROKE_COLOR: COLORREF = COLORREF(0x0000_40FF);
const SELECTION_COLOR: COLORREF = COLORREF(0x00FF_C000);
const POINT_COLOR: COLORREF = COLORREF(0x0000_FF40);

const PEN_WIDTH: i32 = 3;
const POINT_RADIUS: i32 = 6;

// ── Per-thread session state ──────────────────────────────────────────────────

#[derive(Default)]
struct ThreadState {
    /// Inbox of the session owning this thread. `None` once closing starts.
    events: Option<Sender<SessionEvent>>,
    scene: OverlayScene,
    origin: Point,
}

thread_local! {
    static STATE: RefCell<ThreadState> = RefCell::new(ThreadState::default());
}

fn post(event: SessionEvent) -> bool {
    STATE.with(|state| match state.borrow().events.as_ref() {
        Some(tx) => tx.send(event).is_ok(),
        None => false,
    })
}

fn is_capturing() -> bool {
    STATE.with(|state| state.borrow().events.is_some())
}

fn wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// Windows implementation of [`CaptureBackend`].
#[derive(Debug, Default)]
pub struct WindowsCaptureBackend;

impl WindowsCaptureBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for WindowsCaptureBackend {
    fn open(
        &self,
        mode: CaptureMode,
        bounds: VirtualScreen,
        events: Sender<SessionEvent>,
    ) -> Result<Box<dyn CaptureSurface>, SurfaceError> {
        // SAFETY: a null module name returns the handle of the running executable.
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .map_err(|e| SurfaceError::Overlay(format!("GetModuleHandleW: {e}")))?;
        let hinstance: HINSTANCE = module.into();

        STATE.with(|state| {
            *state.borrow_mut() = ThreadState {
                events: Some(events),
                scene: OverlayScene::default(),
                origin: Point::new(bounds.x, bounds.y),
            };
        });

        let hwnd = match create_overlay(hinstance, bounds) {
            Ok(hwnd) => hwnd,
            Err(e) => {
                reset_thread_state();
                return Err(e);
            }
        };

        // SAFETY: the hook procedures are `extern "system"` functions with the
        // HOOKPROC signature; this thread pumps messages while they are installed.
        let mouse_hook = unsafe { SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), hinstance, 0) };
        let mouse_hook = match mouse_hook {
            Ok(hook) => hook,
            Err(e) => {
                teardown(hwnd, None, None);
                return Err(SurfaceError::HookInstall {
                    kind: "mouse",
                    reason: e.to_string(),
                });
            }
        };

        // SAFETY: as above.
        let keyboard_hook =
            unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), hinstance, 0) };
        let keyboard_hook = match keyboard_hook {
            Ok(hook) => hook,
            Err(e) => {
                teardown(hwnd, Some(mouse_hook), None);
                return Err(SurfaceError::HookInstall {
                    kind: "keyboard",
                    reason: e.to_string(),
                });
            }
        };

        debug!(mode = mode.label(), ?bounds, "capture overlay and hooks installed");
        Ok(Box::new(WindowsCaptureSurface {
            hwnd,
            mouse_hook,
            keyboard_hook,
        }))
    }
}

fn create_overlay(hinstance: HINSTANCE, bounds: VirtualScreen) -> Result<HWND, SurfaceError> {
    static REGISTER_CLASS: Once = Once::new();
    let class_name = wide(CLASS_NAME);

    REGISTER_CLASS.call_once(|| {
        // SAFETY: IDC_CROSS is a predefined system cursor.
        let cursor = unsafe { LoadCursorW(HINSTANCE::default(), IDC_CROSS) }.unwrap_or_default();
        let wc = WNDCLASSW {
            hInstance: hinstance,
            hCursor: cursor,
            lpszClassName: PCWSTR(class_name.as_ptr()),
            lpfnWndProc: Some(overlay_wndproc),
            ..Default::default()
        };
        // SAFETY: `wc` and the class name buffer are valid for the call.
        unsafe {
            let _ = RegisterClassW(&wc);
        }
    });

    // SAFETY: the class is registered above; all pointers outlive the call.
    let hwnd = unsafe {
        CreateWindowExW(
            WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
            PCWSTR(class_name.as_ptr()),
            PCWSTR::null(),
            WINDOW_STYLE(WS_POPUP.0),
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height,
            None,
            None,
            hinstance,
            None,
        )
    }
    .map_err(|e| SurfaceError::Overlay(format!("CreateWindowExW: {e}")))?;

    // SAFETY: hwnd was just created on this thread.
    let layered = unsafe { SetLayeredWindowAttributes(hwnd, COLORREF(0), OVERLAY_ALPHA, LWA_ALPHA) };
    if let Err(e) = layered {
        // SAFETY: hwnd is ours and destroyed once.
        unsafe {
            let _ = DestroyWindow(hwnd);
        }
        return Err(SurfaceError::Overlay(format!("SetLayeredWindowAttributes: {e}")));
    }

    // SAFETY: hwnd is a valid top-level window owned by this thread.
    unsafe {
        let _ = SetWindowPos(
            hwnd,
            HWND_TOPMOST,
            0,
            0,
            0,
            0,
            SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE | SWP_SHOWWINDOW,
        );
    }
    Ok(hwnd)
}

fn reset_thread_state() {
    STATE.with(|state| *state.borrow_mut() = ThreadState::default());
}

/// Releases whatever `open` managed to create. The inbox sender is dropped
/// first so `WM_DESTROY` does not report our own teardown as a user close.
fn teardown(hwnd: HWND, mouse: Option<HHOOK>, keyboard: Option<HHOOK>) {
    reset_thread_state();
    // SAFETY: each handle was created on this thread and is released once.
    unsafe {
        if let Some(hook) = keyboard {
            if let Err(e) = UnhookWindowsHookEx(hook) {
                warn!("UnhookWindowsHookEx(keyboard) failed: {e}");
            }
        }
        if let Some(hook) = mouse {
            if let Err(e) = UnhookWindowsHookEx(hook) {
                warn!("UnhookWindowsHookEx(mouse) failed: {e}");
            }
        }
        if !hwnd.0.is_null() {
            let _ = DestroyWindow(hwnd);
        }
    }
    pump_messages();
}

fn pump_messages() {
    let mut msg = MSG::default();
    // SAFETY: standard non-blocking message loop on the owning thread.
    unsafe {
        while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).into() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

// ── Surface ───────────────────────────────────────────────────────────────────

struct WindowsCaptureSurface {
    hwnd: HWND,
    mouse_hook: HHOOK,
    keyboard_hook: HHOOK,
}

impl CaptureSurface for WindowsCaptureSurface {
    fn pump(&mut self) {
        pump_messages();
    }

    fn render(&mut self, scene: &OverlayScene) {
        STATE.with(|state| state.borrow_mut().scene = scene.clone());
        // SAFETY: hwnd is alive until `close`.
        unsafe {
            let _ = InvalidateRect(self.hwnd, None, false);
        }
    }

    fn close(self: Box<Self>) {
        teardown(self.hwnd, Some(self.mouse_hook), Some(self.keyboard_hook));
        debug!("capture overlay and hooks removed");
    }
}

// ── Window procedure ──────────────────────────────────────────────────────────

unsafe extern "system" fn overlay_wndproc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_ERASEBKGND => LRESULT(1),
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            // SAFETY: hwnd is the window being painted.
            let hdc = unsafe { BeginPaint(hwnd, &mut ps) };
            if !hdc.0.is_null() {
                let mut client = RECT::default();
                // SAFETY: hwnd is valid for the duration of WM_PAINT.
                if unsafe { GetClientRect(hwnd, &mut client) }.is_ok() {
                    STATE.with(|state| {
                        let state = state.borrow();
                        // SAFETY: hdc comes from BeginPaint and is valid until EndPaint.
                        unsafe { paint_scene(hdc, &client, &state.scene, state.origin) };
                    });
                }
            }
            // SAFETY: pairs with BeginPaint above.
            unsafe {
                let _ = EndPaint(hwnd, &ps);
            }
            LRESULT(0)
        }
        WM_DESTROY => {
            // Only reached with a live inbox when something other than `close`
            // destroyed the overlay.
            if post(SessionEvent::Cancel(CancelReason::OverlayClosed)) {
                warn!("capture overlay was closed externally");
            }
            LRESULT(0)
        }
        // SAFETY: default handling for everything else.
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

/// Draws the veil, strokes, selection rectangle and selected points.
/// Scene coordinates are virtual-desktop pixels; `origin` maps them to client
/// coordinates.
unsafe fn paint_scene(hdc: HDC, client: &RECT, scene: &OverlayScene, origin: Point) {
    let local = |p: &Point| POINT {
        x: p.x - origin.x,
        y: p.y - origin.y,
    };

    let veil = CreateSolidBrush(VEIL_COLOR);
    FillRect(hdc, client, veil);
    let _ = DeleteObject(veil);

    let null_brush = GetStockObject(NULL_BRUSH);
    let previous_brush = SelectObject(hdc, null_brush);

    let stroke_pen = CreatePen(PS_SOLID, PEN_WIDTH, STROKE_COLOR);
    let previous_pen = SelectObject(hdc, stroke_pen);
    for stroke in &scene.strokes {
        let points: Vec<POINT> = stroke.iter().map(local).collect();
        if points.len() >= 2 {
            let _ = Polyline(hdc, &points);
        }
    }

    let selection_pen = CreatePen(PS_SOLID, PEN_WIDTH, SELECTION_COLOR);
    SelectObject(hdc, selection_pen);
    if let Some(region) = scene.selection {
        let a = local(&Point::new(region.x1, region.y1));
        let b = local(&Point::new(region.x2, region.y2));
        let _ = Rectangle(hdc, a.x, a.y, b.x, b.y);
    }

    let point_pen = CreatePen(PS_SOLID, PEN_WIDTH, POINT_COLOR);
    SelectObject(hdc, point_pen);
    for point in &scene.points {
        let c = local(point);
        let _ = Ellipse(
            hdc,
            c.x - POINT_RADIUS,
            c.y - POINT_RADIUS,
            c.x + POINT_RADIUS,
            c.y + POINT_RADIUS,
        );
    }

    SelectObject(hdc, previous_pen);
    SelectObject(hdc, previous_brush);
    let _ = DeleteObject(stroke_pen);
    let _ = DeleteObject(selection_pen);
    let _ = DeleteObject(point_pen);
}

// ── Hook procedures ───────────────────────────────────────────────────────────

unsafe extern "system" fn mouse_hook_proc(n_code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
    if n_code != HC_ACTION as i32 || !is_capturing() {
        // SAFETY: events we do not consume must be passed on.
        return unsafe { CallNextHookEx(HHOOK::default(), n_code, w_param, l_param) };
    }

    // SAFETY: l_param points to a MSLLHOOKSTRUCT when n_code == HC_ACTION.
    let info = unsafe { &*(l_param.0 as *const MSLLHOOKSTRUCT) };
    let at = Point::new(info.pt.x, info.pt.y);

    let (event, suppress) = match w_param.0 as u32 {
        WM_MOUSEMOVE => (Some(SessionEvent::PointerMove { at }), false),
        WM_LBUTTONDOWN => (Some(pointer_down(PointerButton::Primary, at)), true),
        WM_LBUTTONUP => (Some(pointer_up(PointerButton::Primary, at)), true),
        WM_RBUTTONDOWN => (Some(pointer_down(PointerButton::Secondary, at)), true),
        WM_RBUTTONUP => (Some(pointer_up(PointerButton::Secondary, at)), true),
        WM_MBUTTONDOWN => (Some(pointer_down(PointerButton::Middle, at)), true),
        WM_MBUTTONUP => (Some(pointer_up(PointerButton::Middle, at)), true),
        _ => (None, false),
    };

    if let Some(event) = event {
        post(event);
    }
    if suppress {
        return LRESULT(1);
    }
    // SAFETY: pass-through for events we do not consume.
    unsafe { CallNextHookEx(HHOOK::default(), n_code, w_param, l_param) }
}

fn pointer_down(button: PointerButton, at: Point) -> SessionEvent {
    SessionEvent::PointerDown { button, at }
}

fn pointer_up(button: PointerButton, at: Point) -> SessionEvent {
    SessionEvent::PointerUp { button, at }
}

unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 || !is_capturing() {
        // SAFETY: events we do not consume must be passed on.
        return unsafe { CallNextHookEx(HHOOK::default(), n_code, w_param, l_param) };
    }

    // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
    let info = unsafe { &*(l_param.0 as *const KBDLLHOOKSTRUCT) };
    let key = SessionKey::from_virtual_key(info.vkCode);
    let is_down = matches!(w_param.0 as u32, WM_KEYDOWN | WM_SYSKEYDOWN);

    if is_down {
        post(SessionEvent::KeyDown(key));
    }
    // Session keys are swallowed on both edges so the focused app never sees
    // a lone key-up.
    if !matches!(key, SessionKey::Other(_)) {
        return LRESULT(1);
    }
    // SAFETY: pass-through for keys we do not consume.
    unsafe { CallNextHookEx(HHOOK::default(), n_code, w_param, l_param) }
}
