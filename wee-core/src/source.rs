//! ソースコードの表示

use crate::errors::{DebuggerError, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 現在行に付けるマーカー
pub const CURRENT_MARKER: &str = "-->";
/// 現在行以外に付ける空白（マーカーと同じ幅）
pub const BLANK_MARKER: &str = "   ";

/// 行単位のソースキャッシュ
///
/// ファイルは最初にアクセスされたときに一度だけ読み込まれます。
/// セッション中にファイルが編集されても再読み込みはしません。
/// 存在しないファイルは空のファイルとして扱います。
#[derive(Debug, Default)]
pub struct SourceCache {
    root: Option<PathBuf>,
    files: HashMap<String, Vec<String>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 相対パスを解決するルートディレクトリを指定して作成する
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            files: HashMap::new(),
        }
    }

    /// ファイルの内容を直接登録する
    pub fn insert(&mut self, file: impl Into<String>, text: &str) {
        self.files.insert(file.into(), text.lines().map(str::to_string).collect());
    }

    /// 指定した行を取得する（1始まり）
    ///
    /// 範囲外の行や存在しないファイルの行は空文字列になります。
    pub fn line(&mut self, file: &str, line_number: u32) -> Result<&str> {
        let lines = self.load(file)?;
        let index = (line_number as usize).checked_sub(1);
        Ok(index
            .and_then(|i| lines.get(i))
            .map(String::as_str)
            .unwrap_or(""))
    }

    /// 中心行の前後 `radius` 行を整形して返す
    ///
    /// 開始行は1未満にはなりません。各行は `<marker> <行番号:4> <テキスト>` の形式です。
    pub fn window(&mut self, file: &str, center_line: u32, radius: u32) -> Result<Vec<String>> {
        let start = center_line.saturating_sub(radius).max(1);
        let end = center_line.saturating_add(radius);
        if end < start {
            return Ok(Vec::new());
        }

        let mut rendered = Vec::with_capacity((end - start + 1) as usize);
        for line_number in start..=end {
            let text = self.line(file, line_number)?.trim_end();
            let marker = if line_number == center_line {
                CURRENT_MARKER
            } else {
                BLANK_MARKER
            };
            rendered.push(format!("{} {:4} {}", marker, line_number, text));
        }
        Ok(rendered)
    }

    fn load(&mut self, file: &str) -> Result<&[String]> {
        if !self.files.contains_key(file) {
            let lines = read_lines(&self.resolve(file), file)?;
            self.files.insert(file.to_string(), lines);
        }
        Ok(self.files.get(file).map(Vec::as_slice).unwrap_or(&[]))
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        match &self.root {
            Some(root) if !path.exists() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn read_lines(path: &Path, file: &str) -> Result<Vec<String>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(DebuggerError::SourceRead {
                file: file.to_string(),
                source,
            })
        }
    };

    let text = String::from_utf8(bytes).map_err(|source| DebuggerError::SourceDecode {
        file: file.to_string(),
        source,
    })?;
    Ok(text.lines().map(str::to_string).collect())
}
