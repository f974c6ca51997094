//! Typed command catalog.
//!
//! [`Command::parse`] turns a decoded [`Request`] into one variant of
//! [`Command`] with a fully populated parameter struct. Each struct documents
//! its wire field names and defaults; optional fields are filled through the
//! permissive [`Params`] lookups, required fields are checked here so that a
//! handler is never invoked with a missing mandatory value.

use thiserror::Error;
use tracing::warn;

use super::envelope::Request;
use super::params::Params;

/// Reasons a request cannot be turned into a [`Command`].
///
/// The `Display` text of each variant is sent verbatim as the `Message` of the
/// Error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Request is missing the 'Command' field.")]
    MissingCommand,

    #[error("Unknown command: '{0}'")]
    UnknownCommand(String),

    #[error("Missing required parameter '{field}' for {command}")]
    MissingParameter {
        command: &'static str,
        field: &'static str,
    },

    #[error("{command} requires '{first}' or '{second}'")]
    MissingEitherParameter {
        command: &'static str,
        first: &'static str,
        second: &'static str,
    },
}

// ── Enumerated parameter values ───────────────────────────────────────────────

/// Pointer button named by `button` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "middle" => Some(Self::Middle),
            _ => None,
        }
    }
}

/// The `click_type` of a `SimulateClick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
    /// Button down only.
    Press,
    /// Button up only.
    Release,
}

impl ClickKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "single" | "click" => Some(Self::Single),
            "double" => Some(Self::Double),
            "down" | "press" => Some(Self::Press),
            "up" | "release" => Some(Self::Release),
            _ => None,
        }
    }
}

/// The `direction` of a `SimulateScroll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

impl ScrollAxis {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "vertical" => Some(Self::Vertical),
            "horizontal" => Some(Self::Horizontal),
            _ => None,
        }
    }
}

// ── Parameter structs ─────────────────────────────────────────────────────────

/// `GetPixelColor { x = 0, y = 0 }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelParams {
    pub x: i32,
    pub y: i32,
}

/// `CaptureRegion { x1 = 0, y1 = 0, x2 = screen right, y2 = screen bottom,
/// useGrayscale = false, useBinarization = false }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegionParams {
    pub x1: i32,
    pub y1: i32,
    /// `None` means "extend to the right edge of the virtual screen".
    pub x2: Option<i32>,
    /// `None` means "extend to the bottom edge of the virtual screen".
    pub y2: Option<i32>,
    pub grayscale: bool,
    pub binarize: bool,
}

/// `SimulateClick { x = 0, y = 0, button = "left", click_type = "single",
/// hold_duration = 0.0 }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickParams {
    pub x: i32,
    pub y: i32,
    pub button: MouseButton,
    pub kind: ClickKind,
    /// Seconds between press and release; never negative.
    pub hold_secs: f64,
}

/// `SimulateMouseMove { x = 0, y = 0, duration = 0.0 }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveParams {
    pub x: i32,
    pub y: i32,
    pub duration_secs: f64,
}

/// `SimulateDrag { end_x = 0, end_y = 0, button = "left", duration_seconds = 0.1 }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragParams {
    pub end_x: i32,
    pub end_y: i32,
    pub button: MouseButton,
    pub duration_secs: f64,
}

/// `SimulateScroll { scroll_amount = 0, direction = "vertical" }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollParams {
    /// Signed notch count; positive scrolls up (vertical) or right (horizontal).
    pub amount: i32,
    pub axis: ScrollAxis,
}

/// `SimulateKeyPress | SimulateKeyDown | SimulateKeyUp { key_name }` (required)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParams {
    pub key_name: String,
}

/// `SimulateTextEntry { text = "" }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextParams {
    pub text: String,
}

/// `SimulateModifiedKeyStroke { modifier, main_key }` (both required)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedKeyParams {
    pub modifier: String,
    pub main_key: String,
}

/// `CheckWindowExists { class_name?, window_title? }`, at least one non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowQuery {
    pub class_name: Option<String>,
    pub window_title: Option<String>,
}

/// `CheckProcessExists { process_name }` (required)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessQuery {
    pub process_name: String,
}

/// `StartInteractivePointSelect { num_points = 1 }`, non-positive coerced to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointSelectParams {
    pub num_points: u32,
}

// ── Command ───────────────────────────────────────────────────────────────────

/// Every operation the service understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping,
    GetScreenSize,
    GetVirtualScreenBounds,
    GetPixelColor(PixelParams),
    CaptureRegion(CaptureRegionParams),
    SimulateClick(ClickParams),
    SimulateMouseMove(MoveParams),
    SimulateDrag(DragParams),
    SimulateScroll(ScrollParams),
    SimulateKeyPress(KeyParams),
    SimulateKeyDown(KeyParams),
    SimulateKeyUp(KeyParams),
    SimulateTextEntry(TextParams),
    SimulateModifiedKeyStroke(ModifiedKeyParams),
    CheckWindowExists(WindowQuery),
    CheckProcessExists(ProcessQuery),
    StartInteractiveDrawingCapture,
    StartInteractiveRegionSelect,
    StartInteractivePointSelect(PointSelectParams),
}

impl Command {
    /// Parses a decoded request into a typed command.
    ///
    /// # Errors
    ///
    /// - [`CommandError::MissingCommand`] if `Command` is absent or blank.
    /// - [`CommandError::UnknownCommand`] if the name is not in the catalog.
    /// - [`CommandError::MissingParameter`] / [`CommandError::MissingEitherParameter`]
    ///   if a required field is absent or blank.
    pub fn parse(request: &Request) -> Result<Self, CommandError> {
        let name = request.command_name().ok_or(CommandError::MissingCommand)?;
        let p = Params::new(request.params.as_ref());

        let command = match name {
            "Ping" => Self::Ping,
            "GetScreenSize" => Self::GetScreenSize,
            "GetVirtualScreenBounds" => Self::GetVirtualScreenBounds,
            "GetPixelColor" => Self::GetPixelColor(PixelParams {
                x: p.i32_or("x", 0),
                y: p.i32_or("y", 0),
            }),
            "CaptureRegion" => Self::CaptureRegion(CaptureRegionParams {
                x1: p.i32_or("x1", 0),
                y1: p.i32_or("y1", 0),
                x2: p.i32_opt("x2"),
                y2: p.i32_opt("y2"),
                grayscale: p.bool_or("useGrayscale", false),
                binarize: p.bool_or("useBinarization", false),
            }),
            "SimulateClick" => {
                const CMD: &str = "SimulateClick";
                Self::SimulateClick(ClickParams {
                    x: p.i32_or("x", 0),
                    y: p.i32_or("y", 0),
                    button: button(&p, CMD),
                    kind: enumerated(&p, CMD, "click_type", ClickKind::Single, ClickKind::parse),
                    hold_secs: p.f64_or("hold_duration", 0.0).max(0.0),
                })
            }
            "SimulateMouseMove" => Self::SimulateMouseMove(MoveParams {
                x: p.i32_or("x", 0),
                y: p.i32_or("y", 0),
                duration_secs: p.f64_or("duration", 0.0).max(0.0),
            }),
            "SimulateDrag" => Self::SimulateDrag(DragParams {
                end_x: p.i32_or("end_x", 0),
                end_y: p.i32_or("end_y", 0),
                button: button(&p, "SimulateDrag"),
                duration_secs: p.f64_or("duration_seconds", 0.1).max(0.0),
            }),
            "SimulateScroll" => Self::SimulateScroll(ScrollParams {
                amount: p.i32_or("scroll_amount", 0),
                axis: enumerated(
                    &p,
                    "SimulateScroll",
                    "direction",
                    ScrollAxis::Vertical,
                    ScrollAxis::parse,
                ),
            }),
            "SimulateKeyPress" => Self::SimulateKeyPress(key(&p, "SimulateKeyPress")?),
            "SimulateKeyDown" => Self::SimulateKeyDown(key(&p, "SimulateKeyDown")?),
            "SimulateKeyUp" => Self::SimulateKeyUp(key(&p, "SimulateKeyUp")?),
            "SimulateTextEntry" => Self::SimulateTextEntry(TextParams {
                text: p.string_or("text", ""),
            }),
            "SimulateModifiedKeyStroke" => {
                const CMD: &str = "SimulateModifiedKeyStroke";
                Self::SimulateModifiedKeyStroke(ModifiedKeyParams {
                    modifier: required(&p, CMD, "modifier")?,
                    main_key: required(&p, CMD, "main_key")?,
                })
            }
            "CheckWindowExists" => {
                let query = WindowQuery {
                    class_name: p.non_blank("class_name"),
                    window_title: p.non_blank("window_title"),
                };
                if query.class_name.is_none() && query.window_title.is_none() {
                    return Err(CommandError::MissingEitherParameter {
                        command: "CheckWindowExists",
                        first: "class_name",
                        second: "window_title",
                    });
                }
                Self::CheckWindowExists(query)
            }
            "CheckProcessExists" => Self::CheckProcessExists(ProcessQuery {
                process_name: required(&p, "CheckProcessExists", "process_name")?,
            }),
            "StartInteractiveDrawingCapture" => Self::StartInteractiveDrawingCapture,
            "StartInteractiveRegionSelect" => Self::StartInteractiveRegionSelect,
            "StartInteractivePointSelect" => {
                let n = p.i32_or("num_points", 1);
                Self::StartInteractivePointSelect(PointSelectParams {
                    num_points: u32::try_from(n).unwrap_or(0).max(1),
                })
            }
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    /// The wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "Ping",
            Self::GetScreenSize => "GetScreenSize",
            Self::GetVirtualScreenBounds => "GetVirtualScreenBounds",
            Self::GetPixelColor(_) => "GetPixelColor",
            Self::CaptureRegion(_) => "CaptureRegion",
            Self::SimulateClick(_) => "SimulateClick",
            Self::SimulateMouseMove(_) => "SimulateMouseMove",
            Self::SimulateDrag(_) => "SimulateDrag",
            Self::SimulateScroll(_) => "SimulateScroll",
            Self::SimulateKeyPress(_) => "SimulateKeyPress",
            Self::SimulateKeyDown(_) => "SimulateKeyDown",
            Self::SimulateKeyUp(_) => "SimulateKeyUp",
            Self::SimulateTextEntry(_) => "SimulateTextEntry",
            Self::SimulateModifiedKeyStroke(_) => "SimulateModifiedKeyStroke",
            Self::CheckWindowExists(_) => "CheckWindowExists",
            Self::CheckProcessExists(_) => "CheckProcessExists",
            Self::StartInteractiveDrawingCapture => "StartInteractiveDrawingCapture",
            Self::StartInteractiveRegionSelect => "StartInteractiveRegionSelect",
            Self::StartInteractivePointSelect(_) => "StartInteractivePointSelect",
        }
    }

    /// Whether this command opens an interactive capture session.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            Self::StartInteractiveDrawingCapture
                | Self::StartInteractiveRegionSelect
                | Self::StartInteractivePointSelect(_)
        )
    }
}

fn required(
    p: &Params<'_>,
    command: &'static str,
    field: &'static str,
) -> Result<String, CommandError> {
    p.non_blank(field)
        .ok_or(CommandError::MissingParameter { command, field })
}

fn key(p: &Params<'_>, command: &'static str) -> Result<KeyParams, CommandError> {
    Ok(KeyParams {
        key_name: required(p, command, "key_name")?,
    })
}

fn button(p: &Params<'_>, command: &'static str) -> MouseButton {
    enumerated(p, command, "button", MouseButton::Left, MouseButton::parse)
}

/// Unrecognised names fall back to `default` with a warning.
fn enumerated<T: Copy + std::fmt::Debug>(
    p: &Params<'_>,
    command: &'static str,
    field: &'static str,
    default: T,
    parse: fn(&str) -> Option<T>,
) -> T {
    let Some(raw) = p.non_blank(field) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|| {
        warn!(command, field, value = %raw, ?default, "unsupported value; using default");
        default
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(command: &str, params: serde_json::Value) -> Result<Command, CommandError> {
        Command::parse(&Request::new(command, params))
    }

    #[test]
    fn test_missing_command_is_rejected() {
        let err = Command::parse(&Request::default()).unwrap_err();
        assert_eq!(err, CommandError::MissingCommand);
        assert_eq!(err.to_string(), "Request is missing the 'Command' field.");
    }

    #[test]
    fn test_unknown_command_names_the_command() {
        let err = parse("Frobnicate", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: 'Frobnicate'");
    }

    #[test]
    fn test_click_defaults() {
        // Act
        let cmd = parse("SimulateClick", json!({"x": 5, "y": 6})).expect("parse");

        // Assert
        assert_eq!(
            cmd,
            Command::SimulateClick(ClickParams {
                x: 5,
                y: 6,
                button: MouseButton::Left,
                kind: ClickKind::Single,
                hold_secs: 0.0,
            })
        );
    }

    #[test]
    fn test_click_with_explicit_values_and_aliases() {
        let cmd = parse(
            "SimulateClick",
            json!({"x": "1", "y": 2.4, "button": "RIGHT", "click_type": "press", "hold_duration": -3}),
        )
        .expect("parse");
        let Command::SimulateClick(params) = cmd else {
            panic!("expected SimulateClick");
        };
        assert_eq!((params.x, params.y), (1, 2));
        assert_eq!(params.button, MouseButton::Right);
        assert_eq!(params.kind, ClickKind::Press);
        assert_eq!(params.hold_secs, 0.0, "negative hold is clamped");
    }

    #[test]
    fn test_unsupported_button_falls_back_to_left() {
        // Act
        let cmd = parse("SimulateClick", json!({"button": "thumb"})).expect("parse");

        // Assert
        let Command::SimulateClick(params) = cmd else {
            panic!("expected SimulateClick");
        };
        assert_eq!(params.button, MouseButton::Left);
    }

    #[test]
    fn test_unsupported_click_type_and_direction_fall_back_to_defaults() {
        // Act
        let click = parse("SimulateClick", json!({"click_type": "triple"})).expect("parse");
        let scroll = parse(
            "SimulateScroll",
            json!({"scroll_amount": 2, "direction": "diagonal"}),
        )
        .expect("parse");

        // Assert
        let Command::SimulateClick(click) = click else {
            panic!("expected SimulateClick");
        };
        assert_eq!(click.kind, ClickKind::Single);
        assert_eq!(
            scroll,
            Command::SimulateScroll(ScrollParams {
                amount: 2,
                axis: ScrollAxis::Vertical,
            })
        );
    }

    #[test]
    fn test_key_press_without_key_name_is_rejected() {
        let err = parse("SimulateKeyPress", json!({})).unwrap_err();
        assert_eq!(
            err,
            CommandError::MissingParameter {
                command: "SimulateKeyPress",
                field: "key_name"
            }
        );
    }

    #[test]
    fn test_key_press_with_blank_key_name_is_rejected() {
        assert!(parse("SimulateKeyDown", json!({"key_name": "  "})).is_err());
    }

    #[test]
    fn test_modified_keystroke_requires_both_fields() {
        let err = parse("SimulateModifiedKeyStroke", json!({"modifier": "ctrl"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required parameter 'main_key' for SimulateModifiedKeyStroke"
        );
    }

    #[test]
    fn test_window_query_requires_either_field() {
        assert!(parse("CheckWindowExists", json!({"class_name": ""})).is_err());
        let cmd = parse("CheckWindowExists", json!({"window_title": "Notepad"})).expect("parse");
        assert_eq!(
            cmd,
            Command::CheckWindowExists(WindowQuery {
                class_name: None,
                window_title: Some("Notepad".to_string()),
            })
        );
    }

    #[test]
    fn test_capture_region_optional_corners() {
        let cmd = parse("CaptureRegion", json!({"x1": 10, "y1": 20, "useGrayscale": true}))
            .expect("parse");
        assert_eq!(
            cmd,
            Command::CaptureRegion(CaptureRegionParams {
                x1: 10,
                y1: 20,
                x2: None,
                y2: None,
                grayscale: true,
                binarize: false,
            })
        );
    }

    #[test]
    fn test_point_select_non_positive_count_is_one() {
        for n in [json!(0), json!(-4), json!("nope")] {
            let cmd = parse("StartInteractivePointSelect", json!({"num_points": n})).expect("parse");
            assert_eq!(
                cmd,
                Command::StartInteractivePointSelect(PointSelectParams { num_points: 1 })
            );
        }
    }

    #[test]
    fn test_drag_and_scroll_defaults() {
        let drag = parse("SimulateDrag", json!({})).expect("parse");
        assert_eq!(
            drag,
            Command::SimulateDrag(DragParams {
                end_x: 0,
                end_y: 0,
                button: MouseButton::Left,
                duration_secs: 0.1,
            })
        );
        let scroll = parse("SimulateScroll", json!({"scroll_amount": -3})).expect("parse");
        assert_eq!(
            scroll,
            Command::SimulateScroll(ScrollParams {
                amount: -3,
                axis: ScrollAxis::Vertical,
            })
        );
    }

    #[test]
    fn test_command_name_round_trips_through_parse() {
        let cmd = parse("  Ping  ", json!(null)).expect("parse");
        assert_eq!(cmd.name(), "Ping");
        assert!(!cmd.is_interactive());
        assert!(parse("StartInteractiveRegionSelect", json!({}))
            .expect("parse")
            .is_interactive());
    }
}
