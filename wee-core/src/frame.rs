//! フレームスナップショットと変数の検索

use crate::host::ExecutionContext;
use std::fmt;

/// どのスコープにも変数が見つからない場合に返す値
pub const NOT_FOUND: &str = "<not found>";

/// 変数の値（表示用に文字列化したもの）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value(String);

impl Value {
    /// `Debug` 表現から値を作成する
    pub fn from_debug<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Self(format!("{:?}", value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// 変数名から値への対応表
///
/// 変数名は一意です。同じ名前で挿入すると値が置き換わり、
/// 反復順序は最初に挿入された順になります。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: Vec<(String, Value)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 変数を追加する（既に存在する場合は値を置き換える）
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// 変数を名前で検索する
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (name, value) in iter {
            bindings.insert(name, value);
        }
        bindings
    }
}

/// 実行が一時停止している1地点のスナップショット
///
/// 行イベントごとに新しく作られ、次の行イベントで置き換えられます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// 実行中のソースファイル
    pub source_file: String,
    /// これから実行される行番号（1始まり）
    pub line_number: u32,
    /// ローカル変数
    pub locals: Bindings,
    /// グローバル変数（ローカル変数より優先度が低い）
    pub globals: Bindings,
}

impl FrameSnapshot {
    /// 変数を持たないスナップショットを作成する
    pub fn new(source_file: impl Into<String>, line_number: u32) -> Self {
        Self {
            source_file: source_file.into(),
            line_number,
            locals: Bindings::new(),
            globals: Bindings::new(),
        }
    }

    pub fn with_local(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.locals.insert(name, value);
        self
    }

    pub fn with_global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(name, value);
        self
    }

    /// ホストの実行コンテキストからスナップショットを作成する
    pub fn capture(context: &ExecutionContext<'_>) -> Self {
        Self {
            source_file: context.file.to_string(),
            line_number: context.line,
            locals: context
                .locals
                .iter()
                .map(|(name, value)| (*name, value.as_str()))
                .collect(),
            globals: context.globals.clone(),
        }
    }

    /// 変数を検索する
    ///
    /// ローカル変数を先に探し、なければグローバル変数を探します。
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals.get(name).or_else(|| self.globals.get(name))
    }

    /// 変数の値を文字列で返す。見つからない場合は [`NOT_FOUND`] を返す
    pub fn resolve(&self, name: &str) -> &str {
        self.lookup(name).map(Value::as_str).unwrap_or(NOT_FOUND)
    }
}
