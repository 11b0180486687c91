mod clipboard;

pub use clipboard::ClipboardOutput;

use crate::domain::error::AppError;

pub const CLIPBOARD_FAILED_MESSAGE: &str = "Failed to copy to clipboard";

/// 出力先 trait（FIR本文のコピー先）
pub trait OutputTarget: Send + Sync {
    fn deliver(&self, text: &str) -> Result<(), AppError>;
    fn name(&self) -> &str;
}
