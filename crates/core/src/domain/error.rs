use serde::Serialize;

/// アプリケーション共通エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    /// サービス到達不可（タイムアウト含む）
    #[serde(rename = "E_UNREACHABLE")]
    Unreachable,
    /// サービスが入力を拒否した
    #[serde(rename = "E_REJECTED")]
    Rejected,
    /// クライアント側の入力検証
    #[serde(rename = "E_VALIDATION")]
    Validation,
    #[serde(rename = "E_PERMISSION")]
    Permission,
    #[serde(rename = "E_DEVICE")]
    Device,
    /// 生成リクエストが既に実行中
    #[serde(rename = "E_BUSY")]
    Busy,
    #[serde(rename = "E_INVALID_STATE")]
    InvalidState,
    #[serde(rename = "E_CLIPBOARD")]
    Clipboard,
    #[serde(rename = "E_EXPORT")]
    Export,
    #[serde(rename = "E_CONFIG")]
    Config,
    #[serde(rename = "E_INTERNAL")]
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unreachable => "E_UNREACHABLE",
            Self::Rejected => "E_REJECTED",
            Self::Validation => "E_VALIDATION",
            Self::Permission => "E_PERMISSION",
            Self::Device => "E_DEVICE",
            Self::Busy => "E_BUSY",
            Self::InvalidState => "E_INVALID_STATE",
            Self::Clipboard => "E_CLIPBOARD",
            Self::Export => "E_EXPORT",
            Self::Config => "E_CONFIG",
            Self::Internal => "E_INTERNAL",
        }
    }
}

/// アプリケーションエラー（イベントペイロード兼用）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub recoverable: bool,
}

impl AppError {
    pub fn new(code: ErrorCode, msg: impl Into<String>, recoverable: bool) -> Self {
        Self {
            code,
            message: msg.into(),
            recoverable,
        }
    }

    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unreachable, msg, true)
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Rejected, msg, true)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, msg, true)
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Permission, msg, false)
    }

    pub fn device(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Device, msg, true)
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Busy, msg, true)
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, msg, true)
    }

    pub fn clipboard(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Clipboard, msg, true)
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Export, msg, true)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, msg, false)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg, false)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = AppError::rejected("Description too vague");
        assert_eq!(err.to_string(), "[E_REJECTED] Description too vague");
    }

    #[test]
    fn test_permission_is_not_recoverable() {
        assert!(!AppError::permission("denied").recoverable);
        assert!(AppError::unreachable("down").recoverable);
    }
}
