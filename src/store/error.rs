//! Store error types.

use thiserror::Error;

/// Errors that can occur in the JSON-backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a state file failed.
    #[error("状態ファイルの読み書きに失敗しました: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing or deserializing a state file failed.
    #[error("状態ファイルの変換に失敗しました: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value failed validation.
    #[error("不正な設定値です: {0}")]
    Invalid(String),

    /// The home directory could not be determined.
    #[error("ホームディレクトリが見つかりません")]
    NoHomeDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Invalid("exercise_seconds".to_string());
        assert!(err.to_string().contains("exercise_seconds"));

        let err: StoreError = std::io::Error::other("disk gone").into();
        assert!(err.to_string().contains("disk gone"));
    }
}
