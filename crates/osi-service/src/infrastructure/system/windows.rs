//! Windows window lookup (`FindWindowW`) and process enumeration (Toolhelp).

#![cfg(target_os = "windows")]

use osi_core::protocol::commands::WindowQuery;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use windows::Win32::UI::WindowsAndMessaging::FindWindowW;

use super::{SystemError, SystemInspector};

#[derive(Debug, Default)]
pub struct WindowsSystem;

impl WindowsSystem {
    pub fn new() -> Self {
        Self
    }
}

fn wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

impl SystemInspector for WindowsSystem {
    fn window_exists(&self, query: &WindowQuery) -> Result<bool, SystemError> {
        let class = query.class_name.as_deref().map(wide);
        let title = query.window_title.as_deref().map(wide);
        let class_ptr = class.as_ref().map_or(PCWSTR::null(), |w| PCWSTR(w.as_ptr()));
        let title_ptr = title.as_ref().map_or(PCWSTR::null(), |w| PCWSTR(w.as_ptr()));

        // SAFETY: both pointers are either null or point at NUL-terminated
        // buffers that outlive the call.
        match unsafe { FindWindowW(class_ptr, title_ptr) } {
            Ok(hwnd) => Ok(!hwnd.0.is_null()),
            // FindWindowW reports "not found" through the error path.
            Err(_) => Ok(false),
        }
    }

    fn process_names(&self) -> Result<Vec<String>, SystemError> {
        // SAFETY: snapshot flags are valid; the handle is closed by the guard.
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
            .map_err(|e| SystemError::Platform(format!("CreateToolhelp32Snapshot: {e}")))?;
        let _guard = HandleGuard(snapshot);

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };
        let mut names = Vec::new();

        // SAFETY: `entry.dwSize` is initialised as the API requires.
        let mut more = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
        while more {
            let len = entry
                .szExeFile
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(entry.szExeFile.len());
            names.push(String::from_utf16_lossy(&entry.szExeFile[..len]));
            // SAFETY: same snapshot and entry as above.
            more = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
        }
        Ok(names)
    }
}

struct HandleGuard(HANDLE);

impl Drop for HandleGuard {
    fn drop(&mut self) {
        // SAFETY: the handle came from CreateToolhelp32Snapshot and is closed once.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}
