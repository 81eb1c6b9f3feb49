//! winit event capture: tags each reading with its device family.
//!
//! Control names follow the stock binding set: `keyboard/<key>`,
//! `pointer/{delta,scroll,position,left_button,right_button,middle_button}`.
//! Pointer motion Y is flipped so that positive means up, matching scroll.

use glam::Vec2;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::device::{DeviceFamily, RawInput};

/// Pixels per scroll line when a platform reports pixel deltas.
const PIXELS_PER_LINE: f32 = 120.0;

/// Convert a window event into a reading, if it is one the dispatcher understands.
pub fn capture_window_event(event: &WindowEvent) -> Option<RawInput> {
    match event {
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    repeat: false,
                    ..
                },
            ..
        } => Some(RawInput::key(key_name(*code)?, *state == ElementState::Pressed)),
        WindowEvent::MouseInput { state, button, .. } => Some(RawInput::button(
            DeviceFamily::Pointer,
            button_name(*button)?,
            *state == ElementState::Pressed,
        )),
        WindowEvent::MouseWheel { delta, .. } => {
            let lines = match delta {
                MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                MouseScrollDelta::PixelDelta(p) => {
                    Vec2::new(p.x as f32, p.y as f32) / PIXELS_PER_LINE
                }
            };
            Some(RawInput::vector(DeviceFamily::Pointer, "scroll", lines))
        }
        WindowEvent::CursorMoved { position, .. } => Some(RawInput::vector(
            DeviceFamily::Pointer,
            "position",
            Vec2::new(position.x as f32, position.y as f32),
        )),
        _ => None,
    }
}

/// Convert raw device motion into a pointer delta reading.
pub fn capture_device_event(event: &DeviceEvent) -> Option<RawInput> {
    match event {
        DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(RawInput::vector(
            DeviceFamily::Pointer,
            "delta",
            Vec2::new(*dx as f32, -(*dy as f32)),
        )),
        _ => None,
    }
}

pub fn button_name(button: MouseButton) -> Option<&'static str> {
    Some(match button {
        MouseButton::Left => "left_button",
        MouseButton::Right => "right_button",
        MouseButton::Middle => "middle_button",
        MouseButton::Back => "back_button",
        MouseButton::Forward => "forward_button",
        MouseButton::Other(_) => return None,
    })
}

pub fn key_name(code: KeyCode) -> Option<&'static str> {
    Some(match code {
        KeyCode::KeyA => "a",
        KeyCode::KeyB => "b",
        KeyCode::KeyC => "c",
        KeyCode::KeyD => "d",
        KeyCode::KeyE => "e",
        KeyCode::KeyF => "f",
        KeyCode::KeyG => "g",
        KeyCode::KeyH => "h",
        KeyCode::KeyI => "i",
        KeyCode::KeyJ => "j",
        KeyCode::KeyK => "k",
        KeyCode::KeyL => "l",
        KeyCode::KeyM => "m",
        KeyCode::KeyN => "n",
        KeyCode::KeyO => "o",
        KeyCode::KeyP => "p",
        KeyCode::KeyQ => "q",
        KeyCode::KeyR => "r",
        KeyCode::KeyS => "s",
        KeyCode::KeyT => "t",
        KeyCode::KeyU => "u",
        KeyCode::KeyV => "v",
        KeyCode::KeyW => "w",
        KeyCode::KeyX => "x",
        KeyCode::KeyY => "y",
        KeyCode::KeyZ => "z",
        KeyCode::Digit0 => "0",
        KeyCode::Digit1 => "1",
        KeyCode::Digit2 => "2",
        KeyCode::Digit3 => "3",
        KeyCode::Digit4 => "4",
        KeyCode::Digit5 => "5",
        KeyCode::Digit6 => "6",
        KeyCode::Digit7 => "7",
        KeyCode::Digit8 => "8",
        KeyCode::Digit9 => "9",
        KeyCode::Space => "space",
        KeyCode::Enter => "enter",
        KeyCode::Escape => "escape",
        KeyCode::Tab => "tab",
        KeyCode::Backspace => "backspace",
        KeyCode::ShiftLeft => "left_shift",
        KeyCode::ShiftRight => "right_shift",
        KeyCode::ControlLeft => "left_ctrl",
        KeyCode::ControlRight => "right_ctrl",
        KeyCode::AltLeft => "left_alt",
        KeyCode::AltRight => "right_alt",
        KeyCode::ArrowUp => "up_arrow",
        KeyCode::ArrowDown => "down_arrow",
        KeyCode::ArrowLeft => "left_arrow",
        KeyCode::ArrowRight => "right_arrow",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RawValue;

    #[test]
    fn stock_keys_have_names() {
        assert_eq!(key_name(KeyCode::KeyW), Some("w"));
        assert_eq!(key_name(KeyCode::Space), Some("space"));
        assert_eq!(key_name(KeyCode::ShiftLeft), Some("left_shift"));
        assert_eq!(key_name(KeyCode::F13), None);
        assert_eq!(button_name(MouseButton::Left), Some("left_button"));
        assert_eq!(button_name(MouseButton::Other(9)), None);
    }

    #[test]
    fn mouse_motion_is_pointer_delta_with_up_positive() {
        let raw = capture_device_event(&DeviceEvent::MouseMotion { delta: (3.0, 4.0) }).unwrap();
        assert_eq!(raw.family, DeviceFamily::Pointer);
        assert_eq!(raw.control, "delta");
        assert_eq!(raw.value, RawValue::Vector(Vec2::new(3.0, -4.0)));
    }
}
