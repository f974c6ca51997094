//! Key name → Windows Virtual Key (VK) code table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! # What is a Windows Virtual Key (VK) code? (for beginners)
//!
//! Windows assigns each keyboard key a number called a "Virtual Key code",
//! defined in `<winuser.h>` as `VK_*` (e.g. `VK_RETURN = 0x0D`). They are
//! *logical* keys: the letter A is always `0x41` no matter which physical key
//! produces it on the active layout.
//!
//! The controller names keys with short human-readable strings (`"enter"`,
//! `"ctrl"`, `"f5"`, `"num7"`). [`NAMED_KEYS`] maps every accepted spelling to
//! its VK code. Letters and digits are not listed; they map to their ASCII
//! upper-case code point, which is how Windows numbers them.

/// Every accepted key name (lower case) and its VK code.
///
/// Several names may map to the same code; these are aliases.
pub const NAMED_KEYS: &[(&str, u8)] = &[
    // Editing and whitespace
    ("backspace", 0x08),
    ("back", 0x08),
    ("tab", 0x09),
    ("clear", 0x0C),
    ("enter", 0x0D),
    ("return", 0x0D),
    ("pause", 0x13),
    ("break", 0x13),
    ("capslock", 0x14),
    ("caps", 0x14),
    ("escape", 0x1B),
    ("esc", 0x1B),
    ("space", 0x20),
    ("spacebar", 0x20),
    // Navigation
    ("pageup", 0x21),
    ("pgup", 0x21),
    ("prior", 0x21),
    ("pagedown", 0x22),
    ("pgdn", 0x22),
    ("next", 0x22),
    ("end", 0x23),
    ("home", 0x24),
    ("left", 0x25),
    ("up", 0x26),
    ("right", 0x27),
    ("down", 0x28),
    ("select", 0x29),
    ("print", 0x2A),
    ("execute", 0x2B),
    ("printscreen", 0x2C),
    ("prtsc", 0x2C),
    ("snapshot", 0x2C),
    ("insert", 0x2D),
    ("ins", 0x2D),
    ("delete", 0x2E),
    ("del", 0x2E),
    ("help", 0x2F),
    // Windows / application keys
    ("win", 0x5B),
    ("lwin", 0x5B),
    ("winleft", 0x5B),
    ("rwin", 0x5C),
    ("winright", 0x5C),
    ("apps", 0x5D),
    ("menu", 0x5D),
    ("sleep", 0x5F),
    // Numpad
    ("num0", 0x60),
    ("numpad0", 0x60),
    ("num1", 0x61),
    ("numpad1", 0x61),
    ("num2", 0x62),
    ("numpad2", 0x62),
    ("num3", 0x63),
    ("numpad3", 0x63),
    ("num4", 0x64),
    ("numpad4", 0x64),
    ("num5", 0x65),
    ("numpad5", 0x65),
    ("num6", 0x66),
    ("numpad6", 0x66),
    ("num7", 0x67),
    ("numpad7", 0x67),
    ("num8", 0x68),
    ("numpad8", 0x68),
    ("num9", 0x69),
    ("numpad9", 0x69),
    ("multiply", 0x6A),
    ("add", 0x6B),
    ("separator", 0x6C),
    ("subtract", 0x6D),
    ("decimal", 0x6E),
    ("divide", 0x6F),
    // Function keys
    ("f1", 0x70),
    ("f2", 0x71),
    ("f3", 0x72),
    ("f4", 0x73),
    ("f5", 0x74),
    ("f6", 0x75),
    ("f7", 0x76),
    ("f8", 0x77),
    ("f9", 0x78),
    ("f10", 0x79),
    ("f11", 0x7A),
    ("f12", 0x7B),
    ("f13", 0x7C),
    ("f14", 0x7D),
    ("f15", 0x7E),
    ("f16", 0x7F),
    ("f17", 0x80),
    ("f18", 0x81),
    ("f19", 0x82),
    ("f20", 0x83),
    ("f21", 0x84),
    ("f22", 0x85),
    ("f23", 0x86),
    ("f24", 0x87),
    // Locks
    ("numlock", 0x90),
    ("scrolllock", 0x91),
    ("scroll", 0x91),
    // Modifiers
    ("shift", 0x10),
    ("ctrl", 0x11),
    ("control", 0x11),
    ("alt", 0x12),
    ("lshift", 0xA0),
    ("shiftleft", 0xA0),
    ("rshift", 0xA1),
    ("shiftright", 0xA1),
    ("lctrl", 0xA2),
    ("ctrlleft", 0xA2),
    ("rctrl", 0xA3),
    ("ctrlright", 0xA3),
    ("lalt", 0xA4),
    ("altleft", 0xA4),
    ("ralt", 0xA5),
    ("altright", 0xA5),
    ("altgr", 0xA5),
    // Media
    ("volumemute", 0xAD),
    ("volumedown", 0xAE),
    ("volumeup", 0xAF),
    ("nexttrack", 0xB0),
    ("prevtrack", 0xB1),
    ("stop", 0xB2),
    ("playpause", 0xB3),
    // OEM punctuation (US layout)
    (";", 0xBA),
    ("semicolon", 0xBA),
    ("=", 0xBB),
    ("equals", 0xBB),
    ("plus", 0xBB),
    (",", 0xBC),
    ("comma", 0xBC),
    ("-", 0xBD),
    ("minus", 0xBD),
    (".", 0xBE),
    ("period", 0xBE),
    ("/", 0xBF),
    ("slash", 0xBF),
    ("`", 0xC0),
    ("backtick", 0xC0),
    ("grave", 0xC0),
    ("[", 0xDB),
    ("bracketleft", 0xDB),
    ("\\", 0xDC),
    ("backslash", 0xDC),
    ("]", 0xDD),
    ("bracketright", 0xDD),
    ("'", 0xDE),
    ("quote", 0xDE),
];

/// VK codes that must be injected with the extended-key flag.
const EXTENDED_VKS: &[u8] = &[
    0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, // navigation cluster
    0x2C, 0x2D, 0x2E, // PrintScreen, Insert, Delete
    0x5B, 0x5C, 0x5D, // Win keys, Apps
    0x6F, // numpad divide
    0x90, // NumLock
    0xA3, 0xA5, // Right Ctrl, Right Alt
    0xAD, 0xAE, 0xAF, 0xB0, 0xB1, 0xB2, 0xB3, // media
];

/// Looks up a lower-cased key name.
pub fn name_to_vk(lower: &str) -> Option<u8> {
    if let Some(&(_, vk)) = NAMED_KEYS.iter().find(|(name, _)| *name == lower) {
        return Some(vk);
    }
    let mut chars = lower.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c.to_ascii_uppercase() as u8),
        (Some(c), None) if c.is_ascii_digit() => Some(c as u8),
        _ => None,
    }
}

/// Whether `vk` is one of the extended keys.
pub fn is_extended(vk: u8) -> bool {
    EXTENDED_VKS.contains(&vk)
}
