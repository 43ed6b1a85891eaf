//! rustyline を使った端末コンソール

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;
use wee_core::{Console, ConsoleInput, DebuggerError};

/// 行編集と履歴つきの端末コンソール
pub struct LineEditorConsole {
    editor: DefaultEditor,
}

impl LineEditorConsole {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Console for LineEditorConsole {
    fn read_line(&mut self, prompt: &str) -> wee_core::Result<ConsoleInput> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    // 履歴に追加できなくても入力自体は有効
                    if let Err(err) = self.editor.add_history_entry(line.as_str()) {
                        warn!("Failed to add history entry: {}", err);
                    }
                }
                Ok(ConsoleInput::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ConsoleInput::Interrupted),
            Err(ReadlineError::Eof) => Ok(ConsoleInput::Eof),
            Err(err) => Err(DebuggerError::Console(Box::new(err))),
        }
    }

    fn write_line(&mut self, line: &str) {
        println!("{}", line);
    }
}
