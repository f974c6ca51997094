//! Windows input injection via the SendInput API.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use osi_core::{
    protocol::commands::{MouseButton, ScrollAxis},
    Point, VirtualKey,
};
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MOUSEEVENTF_ABSOLUTE,
    MOUSEEVENTF_HWHEEL, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN,
    MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_MOVE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
    MOUSEEVENTF_VIRTUALDESK, MOUSEEVENTF_WHEEL, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

use super::{InjectionError, InputInjector};

/// Windows implementation of [`InputInjector`] using SendInput.
#[derive(Debug, Default)]
pub struct WindowsInputInjector;

impl WindowsInputInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for WindowsInputInjector {
    fn move_absolute(&self, normalized: Point) -> Result<(), InjectionError> {
        // VIRTUALDESK maps [0, 65535] onto the whole virtual screen instead of
        // the primary monitor only.
        send(&[mouse_input(
            normalized.x,
            normalized.y,
            0,
            MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE | MOUSEEVENTF_VIRTUALDESK,
        )])
    }

    fn button(&self, button: MouseButton, pressed: bool) -> Result<(), InjectionError> {
        let flags = match (button, pressed) {
            (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
            (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
            (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
            (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
            (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
            (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
        };
        send(&[mouse_input(0, 0, 0, flags)])
    }

    fn wheel(&self, axis: ScrollAxis, delta: i32) -> Result<(), InjectionError> {
        let flags = match axis {
            ScrollAxis::Vertical => MOUSEEVENTF_WHEEL,
            ScrollAxis::Horizontal => MOUSEEVENTF_HWHEEL,
        };
        // mouseData carries a signed delta in an unsigned field.
        send(&[mouse_input(0, 0, delta as u32, flags)])
    }

    fn key(&self, key: VirtualKey, pressed: bool) -> Result<(), InjectionError> {
        let mut flags = KEYBD_EVENT_FLAGS(0);
        if !pressed {
            flags |= KEYEVENTF_KEYUP;
        }
        if key.extended {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }
        send(&[keyboard_input(VIRTUAL_KEY(u16::from(key.code)), 0, flags)])
    }

    fn text(&self, text: &str) -> Result<(), InjectionError> {
        let inputs: Vec<INPUT> = text
            .encode_utf16()
            .flat_map(|unit| {
                [
                    keyboard_input(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE),
                    keyboard_input(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
                ]
            })
            .collect();
        if inputs.is_empty() {
            return Ok(());
        }
        send(&inputs)
    }

    fn cursor_position(&self) -> Result<Point, InjectionError> {
        let mut pt = POINT::default();
        // SAFETY: pt is a valid, writable POINT on the stack.
        unsafe { GetCursorPos(&mut pt) }.map_err(|e| InjectionError::Platform(e.to_string()))?;
        Ok(Point::new(pt.x, pt.y))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn mouse_input(dx: i32, dy: i32, data: u32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: data,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn keyboard_input(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(inputs: &[INPUT]) -> Result<(), InjectionError> {
    // SAFETY: every element is a fully initialised INPUT structure.
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(InjectionError::Platform(format!(
            "SendInput delivered {sent} of {} events (blocked by UIPI or another input desktop?)",
            inputs.len()
        )));
    }
    Ok(())
}
