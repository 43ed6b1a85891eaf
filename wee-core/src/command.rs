//! デバッガコマンド

/// デバッガコマンド
///
/// コマンドはすべて1文字のキーで指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// ヘルプ表示
    Help,
    /// 次の行へ
    Step,
    /// 変数の値を表示
    Print,
    /// 現在行の周辺のソースを表示
    List,
    /// ローカル変数表示
    Vars,
    /// 実行継続（以降は停止しない）
    Continue,
    /// プログラムごと終了
    Quit,
}

impl Command {
    /// ヘルプに表示する順序
    pub const ALL: [Command; 7] = [
        Command::Help,
        Command::Step,
        Command::Print,
        Command::List,
        Command::Continue,
        Command::Vars,
        Command::Quit,
    ];

    /// キーからコマンドを取得する
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "h" => Some(Command::Help),
            "n" => Some(Command::Step),
            "p" => Some(Command::Print),
            "l" => Some(Command::List),
            "v" => Some(Command::Vars),
            "c" => Some(Command::Continue),
            "q" => Some(Command::Quit),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Command::Help => "h",
            Command::Step => "n",
            Command::Print => "p",
            Command::List => "l",
            Command::Vars => "v",
            Command::Continue => "c",
            Command::Quit => "q",
        }
    }

    /// ヘルプの1行
    pub fn help_line(self) -> &'static str {
        match self {
            Command::Help => "h: Show this help",
            Command::Step => "n: Step to next line",
            Command::Print => "p <var>: Print variable value",
            Command::List => "l: List source code around current line",
            Command::Vars => "v: Show all local variables",
            Command::Continue => "c: Continue execution",
            Command::Quit => "q: Quit debugging",
        }
    }

    /// 実行を再開させるコマンドか
    ///
    /// 次に何を実行するかを決めるのは step と continue だけで、
    /// それ以外は検査のみでプロンプトに戻ります。
    pub fn resumes(self) -> bool {
        matches!(self, Command::Step | Command::Continue)
    }
}

/// 入力行をコマンドと引数に分割する
///
/// 最初の空白の並びで分割し、引数は残りの部分をそのまま返します
/// （引数自体に空白が含まれていても構いません）。空行なら `None`。
pub fn split_line(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }

    match input.find(char::is_whitespace) {
        Some(pos) => Some((&input[..pos], input[pos..].trim_start())),
        None => Some((input, "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line() {
        assert_eq!(split_line("n"), Some(("n", "")));
        assert_eq!(split_line("p x"), Some(("p", "x")));
        assert_eq!(split_line("p   some name  "), Some(("p", "some name  ")));
        assert_eq!(split_line("  l"), Some(("l", "")));
        assert_eq!(split_line(""), None);
        assert_eq!(split_line("   "), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::from_key("c"), Some(Command::Continue));
        assert_eq!(Command::from_key("n"), Some(Command::Step));
        assert_eq!(Command::from_key("q"), Some(Command::Quit));
        assert_eq!(Command::from_key("x"), None);
        assert_eq!(Command::from_key("next"), None);
    }

    #[test]
    fn test_keys_round_trip() {
        for command in Command::ALL {
            assert_eq!(Command::from_key(command.key()), Some(command));
            assert!(command.help_line().starts_with(command.key()));
        }
    }

    #[test]
    fn test_only_step_and_continue_resume() {
        let resuming: Vec<_> = Command::ALL.iter().filter(|c| c.resumes()).collect();
        assert_eq!(resuming, vec![&Command::Step, &Command::Continue]);
    }
}
