use super::{OutputTarget, CLIPBOARD_FAILED_MESSAGE};
use crate::domain::error::AppError;

/// arboard によるシステムクリップボード出力
pub struct ClipboardOutput;

impl ClipboardOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClipboardOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputTarget for ClipboardOutput {
    fn deliver(&self, text: &str) -> Result<(), AppError> {
        let mut ctx = arboard::Clipboard::new().map_err(|e| {
            log::error!("Clipboard init failed: {e}");
            AppError::clipboard(CLIPBOARD_FAILED_MESSAGE)
        })?;
        ctx.set_text(text).map_err(|e| {
            log::error!("Clipboard write failed: {e}");
            AppError::clipboard(CLIPBOARD_FAILED_MESSAGE)
        })?;
        log::info!("Copied FIR text to clipboard: {} chars", text.chars().count());
        Ok(())
    }

    fn name(&self) -> &str {
        "clipboard"
    }
}
