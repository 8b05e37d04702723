//! Hardware-level key injection via SendInput.
//!
//! SendInput is required here: the emulator reads input through
//! DirectInput/RawInput and ignores posted window messages, the same
//! reason mouse automation tools use it. The game window must be in the
//! foreground; the bot assumes the operator leaves it there.

use anyhow::{anyhow, Result};

use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYEVENTF_KEYUP,
    VIRTUAL_KEY, VK_DOWN, VK_ESCAPE, VK_LEFT, VK_RETURN, VK_RIGHT, VK_SPACE, VK_UP,
};

use crate::input::KeyInjector;

/// Maps a config key name to a Windows virtual-key code.
fn virtual_key(name: &str) -> Result<VIRTUAL_KEY> {
    let n = name.to_ascii_lowercase();
    match n.as_str() {
        "enter" => Ok(VK_RETURN),
        "esc" | "escape" => Ok(VK_ESCAPE),
        "space" => Ok(VK_SPACE),
        "up" => Ok(VK_UP),
        "down" => Ok(VK_DOWN),
        "left" => Ok(VK_LEFT),
        "right" => Ok(VK_RIGHT),
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => {
                    // 'a'-'z' and '0'-'9' map directly to their VK codes
                    Ok(VIRTUAL_KEY(c.to_ascii_uppercase() as u16))
                }
                _ => Err(anyhow!("Unknown key name: {}", name)),
            }
        }
    }
}

fn send_key_event(vk: VIRTUAL_KEY, key_up: bool) -> Result<()> {
    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                dwFlags: if key_up {
                    KEYEVENTF_KEYUP
                } else {
                    Default::default()
                },
                ..Default::default()
            },
        },
    };

    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent == 0 {
        return Err(anyhow!("SendInput sent 0 events for vk {:?}", vk));
    }
    Ok(())
}

/// Injects key events with SendInput.
pub struct SendInputInjector;

impl SendInputInjector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SendInputInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyInjector for SendInputInjector {
    fn press(&mut self, key: &str) -> Result<()> {
        send_key_event(virtual_key(key)?, false)
    }

    fn release(&mut self, key: &str) -> Result<()> {
        send_key_event(virtual_key(key)?, true)
    }
}

/// Returns true if the named key is currently held down.
/// Used to poll the operator's kill key between loop iterations.
pub fn is_key_down(name: &str) -> bool {
    match virtual_key(name) {
        Ok(vk) => {
            let state = unsafe { GetAsyncKeyState(vk.0 as i32) };
            (state as u16 & 0x8000) != 0
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_key_named_keys() {
        assert_eq!(virtual_key("enter").unwrap(), VK_RETURN);
        assert_eq!(virtual_key("esc").unwrap(), VK_ESCAPE);
        assert_eq!(virtual_key("left").unwrap(), VK_LEFT);
    }

    #[test]
    fn test_virtual_key_letters() {
        assert_eq!(virtual_key("x").unwrap().0, b'X' as u16);
        assert_eq!(virtual_key("T").unwrap().0, b'T' as u16);
    }

    #[test]
    fn test_virtual_key_unknown() {
        assert!(virtual_key("franken-key").is_err());
    }
}
