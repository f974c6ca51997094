//! Key name resolution for keyboard injection.
//!
//! Names are matched case-insensitively after trimming, and spaces,
//! underscores and hyphens inside multi-character names are ignored, so
//! `"Page Down"`, `"page_down"` and `"PAGEDOWN"` all resolve to the same key.

pub mod windows_vk;

/// A resolved Windows virtual key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualKey {
    pub code: u8,
    /// Needs the extended-key flag when injected.
    pub extended: bool,
}

impl VirtualKey {
    pub fn from_code(code: u8) -> Self {
        Self {
            code,
            extended: windows_vk::is_extended(code),
        }
    }
}

/// Resolves a controller key name to a [`VirtualKey`].
///
/// Returns `None` for names that are not in the table.
pub fn resolve_key_name(name: &str) -> Option<VirtualKey> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    windows_vk::name_to_vk(&lower)
        .or_else(|| {
            // Only multi-character names are compacted; "-" on its own is a key.
            if lower.chars().count() > 1 {
                let compact: String = lower
                    .chars()
                    .filter(|c| !matches!(c, ' ' | '_' | '-'))
                    .collect();
                windows_vk::name_to_vk(&compact)
            } else {
                None
            }
        })
        .map(VirtualKey::from_code)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
