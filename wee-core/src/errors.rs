//! エラー型

use std::string::FromUtf8Error;
use thiserror::Error;

/// デバッガの結果型
pub type Result<T> = std::result::Result<T, DebuggerError>;

/// フレームが選択されていない場合のエラーメッセージ
pub const ERR_NO_FRAME: &str = "No frame is selected";

/// デバッガ内部で発生するエラー
///
/// どのエラーもプロンプトループの外には伝播せず、診断メッセージとして
/// 表示されたあとプロンプトが再開されます。
#[derive(Debug, Error)]
pub enum DebuggerError {
    /// ソースファイルの読み込みに失敗した（ファイルが存在しない場合は除く）
    #[error("cannot read source {file}: {source}")]
    SourceRead {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// ソースファイルがUTF-8としてデコードできない
    #[error("cannot decode source {file}: {source}")]
    SourceDecode {
        file: String,
        #[source]
        source: FromUtf8Error,
    },

    /// オペレータコンソールの入出力に失敗した
    #[error("console failure: {0}")]
    Console(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 現在のフレームが存在しない
    #[error("{}", ERR_NO_FRAME)]
    NoFrame,
}
