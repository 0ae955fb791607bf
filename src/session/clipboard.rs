//! Where copied result text goes.

/// Destination for copied result text.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String>;

    /// Whether text given to `set_text` can be pasted afterwards.
    fn is_pasteable(&self) -> bool {
        true
    }
}

/// Set on the helper process that keeps the X11/Wayland selection alive.
pub const HOLD_SELECTION_ENV: &str = "IPSIFT_HOLD_SELECTION";

/// The system clipboard via `arboard`. Opened lazily on each copy.
///
/// On Linux the selection only exists while its owner runs, so the text is handed to a
/// detached copy of the current executable that serves it until another program takes
/// the clipboard over. That executable must call [`hold_selection_if_requested`] first
/// thing in `main`.
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(not(target_os = "linux"))]
impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String> {
        let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
        clipboard.set_text(text).map_err(|e| e.to_string())
    }
}

#[cfg(target_os = "linux")]
impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        // Fail here, not in the detached helper, when there is no display to talk to.
        arboard::Clipboard::new().map_err(|e| e.to_string())?;

        let exe = std::env::current_exe().map_err(|e| e.to_string())?;
        let mut child = Command::new(exe)
            .env(HOLD_SELECTION_ENV, "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("failed to start clipboard owner: {}", e))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "clipboard owner has no stdin".to_string())?;
        stdin.write_all(text.as_bytes()).map_err(|e| e.to_string())?;
        log::debug!("Clipboard handed to process {}", child.id());
        Ok(())
    }
}

/// When running as the selection owner spawned by `SystemClipboard`, read the text from
/// stdin and serve it until the clipboard changes hands. Returns `None` otherwise.
#[cfg(target_os = "linux")]
pub fn hold_selection_if_requested() -> Option<Result<(), String>> {
    use arboard::SetExtLinux;
    use std::io::Read;

    std::env::var_os(HOLD_SELECTION_ENV)?;

    let serve = || -> Result<(), String> {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| e.to_string())?;
        let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
        clipboard.set().wait().text(text).map_err(|e| e.to_string())
    };
    Some(serve())
}

#[cfg(not(target_os = "linux"))]
pub fn hold_selection_if_requested() -> Option<Result<(), String>> {
    None
}

/// Accepts and discards everything; used when the caller only wants the text.
#[derive(Debug, Default)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn set_text(&mut self, _text: &str) -> Result<(), String> {
        Ok(())
    }

    fn is_pasteable(&self) -> bool {
        false
    }
}
