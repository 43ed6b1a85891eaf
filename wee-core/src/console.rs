//! オペレータコンソール

use crate::errors::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// コンソールから読み取った入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// 1行の入力（改行は含まない）
    Line(String),
    /// 入力中の割り込み（Ctrl-C）
    Interrupted,
    /// 入力の終端（Ctrl-D）
    Eof,
}

/// 行単位のテキストコンソール
pub trait Console {
    /// プロンプトを表示して1行読み取る。ここでのみブロックする
    fn read_line(&mut self, prompt: &str) -> Result<ConsoleInput>;

    /// 1行出力する
    fn write_line(&mut self, line: &str);
}

/// 出力の記録
///
/// [`ScriptedConsole`] から切り離して保持できるので、コンソールが
/// デバッガごとホストに渡された後でも出力を確認できます。
#[derive(Debug, Clone, Default)]
pub struct Transcript(Rc<RefCell<Vec<String>>>);

impl Transcript {
    pub fn lines(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// 指定した文字列を含む行があるか
    pub fn contains(&self, needle: &str) -> bool {
        self.0.borrow().iter().any(|line| line.contains(needle))
    }

    /// 指定した接頭辞で始まる行の数
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.0.borrow().iter().filter(|line| line.starts_with(prefix)).count()
    }

    fn push(&self, line: &str) {
        self.0.borrow_mut().push(line.to_string());
    }
}

/// あらかじめ用意した入力を順に返すコンソール
///
/// 入力を使い切ると [`ConsoleInput::Eof`] を返します。
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<ConsoleInput>,
    transcript: Transcript,
    prompts: usize,
}

impl ScriptedConsole {
    /// 入力行のリストから作成する
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_inputs(lines.into_iter().map(|l| ConsoleInput::Line(l.into())))
    }

    /// 割り込みなどを含む入力列から作成する
    pub fn from_inputs(inputs: impl IntoIterator<Item = ConsoleInput>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            transcript: Transcript::default(),
            prompts: 0,
        }
    }

    /// 出力の記録へのハンドルを取得する
    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }

    /// プロンプトを表示した回数
    pub fn prompts(&self) -> usize {
        self.prompts
    }

    /// まだ読まれていない入力の数
    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, _prompt: &str) -> Result<ConsoleInput> {
        self.prompts += 1;
        Ok(self.inputs.pop_front().unwrap_or(ConsoleInput::Eof))
    }

    fn write_line(&mut self, line: &str) {
        self.transcript.push(line);
    }
}
