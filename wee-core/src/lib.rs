//! wee デバッガのコア機能
//!
//! 計装されたコードから行イベントを受け取り、行ごとに実行を止めて
//! オペレータのコマンド（ステップ実行、変数表示、ソース表示、継続、終了）を処理します。
//! イベントの配送は [`host`] モジュール、コマンドの解釈と実行モードの管理は
//! [`Debugger`] が担当します。

pub mod command;
pub mod console;
pub mod debugger;
pub mod errors;
pub mod frame;
pub mod host;
pub mod source;

pub use command::Command;
pub use console::{Console, ConsoleInput, ScriptedConsole, Transcript};
pub use debugger::{Debugger, DebuggerConfig, PromptOutcome, RunMode};
pub use errors::{DebuggerError, Result};
pub use frame::{Bindings, FrameSnapshot, Value, NOT_FOUND};
pub use host::{ExecutionContext, ExecutionObserver, ObserverDecision, TraceEvent};
pub use source::SourceCache;
