//! デバッガのメインロジック

use crate::command::{split_line, Command};
use crate::console::{Console, ConsoleInput};
use crate::errors::{DebuggerError, Result};
use crate::frame::FrameSnapshot;
use crate::host::{self, ExecutionContext, ExecutionObserver, ObserverDecision, TraceEvent};
use crate::source::{SourceCache, CURRENT_MARKER};
use std::path::PathBuf;
use tracing::{debug, info, trace, warn};

/// 実行モード
///
/// `step_requested` は1回限りの要求で、行イベントの処理が終わるたびに
/// クリアされます。`continuing` は一度立つとセッションの終わりまで戻りません。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    pub step_requested: bool,
    pub continuing: bool,
}

/// 1回のコマンド処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    /// 対象プログラムの実行を再開する
    ResumeExecution,
    /// 次のコマンドを読む
    KeepPrompting,
}

/// デバッガの設定
#[derive(Debug, Clone)]
pub struct DebuggerConfig {
    /// プロンプト文字列
    pub prompt: String,
    /// `l` コマンドで表示する前後の行数
    pub list_radius: u32,
    /// ソースファイルの相対パスを解決するディレクトリ
    pub source_root: Option<PathBuf>,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            prompt: "(wee) ".to_string(),
            list_radius: 5,
            source_root: None,
        }
    }
}

/// デバッガ
///
/// ホストから行イベントごとに呼び出され、continueモードでなければ
/// 現在行を表示してオペレータのコマンドを待ちます。
pub struct Debugger<C: Console> {
    /// オペレータコンソール
    console: C,
    /// 設定
    config: DebuggerConfig,
    /// ソースキャッシュ
    sources: SourceCache,
    /// 実行モード
    mode: RunMode,
    /// 現在のフレーム
    current: Option<FrameSnapshot>,
    /// `q` コマンドで呼ばれる終了処理
    exit: fn(i32) -> !,
}

impl<C: Console> Debugger<C> {
    /// デフォルト設定でデバッガを作成する
    pub fn new(console: C) -> Self {
        Self::with_config(console, DebuggerConfig::default())
    }

    pub fn with_config(console: C, config: DebuggerConfig) -> Self {
        let sources = match &config.source_root {
            Some(root) => SourceCache::with_root(root),
            None => SourceCache::new(),
        };
        Self {
            console,
            config,
            sources,
            mode: RunMode::default(),
            current: None,
            exit: std::process::exit,
        }
    }

    /// `q` コマンドの終了処理を差し替える
    pub fn with_exit_hook(mut self, exit: fn(i32) -> !) -> Self {
        self.exit = exit;
        self
    }

    /// ソースキャッシュへの参照を取得する
    pub fn sources_mut(&mut self) -> &mut SourceCache {
        &mut self.sources
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn current_frame(&self) -> Option<&FrameSnapshot> {
        self.current.as_ref()
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// 現在のスレッドの行イベントを監視し始める
    ///
    /// 2回以上呼び出した場合の動作は未定義です。
    pub fn attach(self)
    where
        C: 'static,
    {
        info!("Debugger attached");
        host::set_trace(Some(Box::new(self)));
    }

    /// 行イベントを処理する
    ///
    /// ホストから行の実行直前に同期的に呼び出されます。
    pub fn on_line_event(&mut self, snapshot: FrameSnapshot) -> ObserverDecision {
        debug!(
            file = %snapshot.source_file,
            line = snapshot.line_number,
            continuing = self.mode.continuing,
            "Line event"
        );
        self.current = Some(snapshot);

        if !self.mode.continuing {
            self.show_current_line();
            self.prompt_loop();
        }

        // stepは1回限りなので、使われたかどうかに関わらずクリアする
        self.mode.step_requested = false;
        self.decision()
    }

    /// 実行再開を指示するコマンドが来るまでコマンドを読み続ける
    pub fn prompt_loop(&mut self) {
        while self.read_and_dispatch() == PromptOutcome::KeepPrompting {}
    }

    /// 1行読み取ってコマンドを実行する
    ///
    /// エラーはここで表示され、呼び出し元には伝播しません。
    pub fn read_and_dispatch(&mut self) -> PromptOutcome {
        let input = match self.console.read_line(&self.config.prompt) {
            Ok(input) => input,
            Err(e) => {
                warn!("Console read failed: {}", e);
                self.console.write_line(&format!("Error: {}", e));
                return self.resume_without_console();
            }
        };

        let line = match input {
            ConsoleInput::Line(line) => line,
            ConsoleInput::Interrupted => {
                self.console.write_line("");
                self.console.write_line("Use 'q' to quit");
                return PromptOutcome::KeepPrompting;
            }
            ConsoleInput::Eof => return self.resume_without_console(),
        };

        let Some((key, arg)) = split_line(&line) else {
            return PromptOutcome::KeepPrompting;
        };

        let Some(command) = Command::from_key(key) else {
            self.console.write_line(&format!("Unknown command: {}", key));
            self.print_help();
            return PromptOutcome::KeepPrompting;
        };

        debug!(?command, arg, "Dispatching command");
        match self.execute(command, arg) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(?command, "Command failed: {}", e);
                self.console.write_line(&format!("Error: {}", e));
                PromptOutcome::KeepPrompting
            }
        }
    }

    /// コマンドを実行する
    pub fn execute(&mut self, command: Command, arg: &str) -> Result<PromptOutcome> {
        match command {
            Command::Help => self.print_help(),
            Command::Step => self.mode.step_requested = true,
            Command::Print => self.print_variable(arg)?,
            Command::List => self.list_source()?,
            Command::Vars => self.list_variables(),
            Command::Continue => {
                info!("Continuing without further stops");
                self.mode.continuing = true;
            }
            Command::Quit => {
                info!("Quit requested");
                (self.exit)(0)
            }
        }

        Ok(if command.resumes() {
            PromptOutcome::ResumeExecution
        } else {
            PromptOutcome::KeepPrompting
        })
    }

    fn decision(&self) -> ObserverDecision {
        if self.mode.continuing {
            ObserverDecision::Detach
        } else {
            ObserverDecision::KeepObserving
        }
    }

    /// コンソールから入力を得られないので、continueと同じ扱いにする
    fn resume_without_console(&mut self) -> PromptOutcome {
        warn!("No more operator input, continuing without the debugger");
        self.console.write_line("");
        self.console.write_line("End of input, continuing execution");
        self.mode.continuing = true;
        PromptOutcome::ResumeExecution
    }

    fn show_current_line(&mut self) {
        let Some(frame) = &self.current else {
            return;
        };

        let (text, failure) = match self.sources.line(&frame.source_file, frame.line_number) {
            Ok(text) => (text.trim().to_string(), None),
            Err(e) => {
                warn!("Failed to read current line: {}", e);
                (String::new(), Some(e))
            }
        };
        self.console.write_line("");
        self.console
            .write_line(&format!("At {}:{}", frame.source_file, frame.line_number));
        self.console.write_line(&format!("{} {}", CURRENT_MARKER, text));
        if let Some(e) = failure {
            self.console.write_line(&format!("Error: {}", e));
        }
    }

    fn print_help(&mut self) {
        self.console.write_line("");
        self.console.write_line("Available commands:");
        for command in Command::ALL {
            self.console.write_line(command.help_line());
        }
    }

    fn print_variable(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            self.console.write_line("Usage: p <variable_name>");
            return Ok(());
        }

        let frame = self.current.as_ref().ok_or(DebuggerError::NoFrame)?;
        self.console
            .write_line(&format!("{} = {}", name, frame.resolve(name)));
        Ok(())
    }

    fn list_variables(&mut self) {
        let Some(frame) = &self.current else {
            return;
        };
        for (name, value) in frame.locals.iter() {
            self.console.write_line(&format!("{} = {}", name, value));
        }
    }

    fn list_source(&mut self) -> Result<()> {
        let Some(frame) = &self.current else {
            return Ok(());
        };

        let window = self.sources.window(
            &frame.source_file,
            frame.line_number,
            self.config.list_radius,
        )?;
        self.console.write_line("");
        self.console
            .write_line(&format!("Source code around line {}:", frame.line_number));
        for line in &window {
            self.console.write_line(line);
        }
        Ok(())
    }
}

impl<C: Console> ExecutionObserver for Debugger<C> {
    fn on_event(&mut self, event: TraceEvent<'_>, context: &ExecutionContext<'_>) -> ObserverDecision {
        match event {
            TraceEvent::Line => self.on_line_event(FrameSnapshot::capture(context)),
            other => {
                trace!(event = ?other, file = context.file, line = context.line, "Passing through");
                self.decision()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleInput, ScriptedConsole, Transcript};
    use crate::frame::NOT_FOUND;

    const PROGRAM: &str = "prog.rs";

    fn panic_on_exit(code: i32) -> ! {
        panic!("exit({})", code)
    }

    fn debugger(inputs: &[&str]) -> (Debugger<ScriptedConsole>, Transcript) {
        let console = ScriptedConsole::new(inputs.iter().copied());
        let transcript = console.transcript();
        let mut debugger = Debugger::new(console).with_exit_hook(panic_on_exit);
        let source: String = (1..=20).map(|i| format!("line {}\n", i)).collect();
        debugger.sources_mut().insert(PROGRAM, &source);
        (debugger, transcript)
    }

    fn frame(line: u32) -> FrameSnapshot {
        FrameSnapshot::new(PROGRAM, line)
            .with_local("x", "1")
            .with_local("shared", "\"local\"")
            .with_global("shared", "\"global\"")
            .with_global("only_global", "7")
    }

    #[test]
    fn test_step_is_cleared_after_event() {
        let (mut debugger, transcript) = debugger(&["n"]);
        let decision = debugger.on_line_event(frame(3));

        assert_eq!(decision, ObserverDecision::KeepObserving);
        assert_eq!(debugger.mode(), RunMode::default());
        assert!(transcript.contains("At prog.rs:3"));
        assert!(transcript.contains("--> line 3"));
    }

    #[test]
    fn test_continue_is_one_way() {
        let (mut debugger, transcript) = debugger(&["c", "n", "n"]);

        assert_eq!(debugger.on_line_event(frame(1)), ObserverDecision::Detach);
        let after_continue = transcript.lines().len();

        assert_eq!(debugger.on_line_event(frame(2)), ObserverDecision::Detach);
        assert_eq!(debugger.on_line_event(frame(3)), ObserverDecision::Detach);

        assert!(debugger.mode().continuing);
        assert!(!debugger.mode().step_requested);
        assert_eq!(transcript.lines().len(), after_continue);
        assert_eq!(debugger.console().remaining(), 2);
    }

    #[test]
    fn test_print_prefers_locals() {
        let (mut debugger, transcript) = debugger(&["p x", "p shared", "p only_global", "p nope", "n"]);
        debugger.on_line_event(frame(5));

        assert!(transcript.contains("x = 1"));
        assert!(transcript.contains("shared = \"local\""));
        assert!(transcript.contains("only_global = 7"));
        assert!(transcript.contains(&format!("nope = {}", NOT_FOUND)));
        assert_eq!(debugger.console().prompts(), 5);
    }

    #[test]
    fn test_print_without_argument_keeps_prompting() {
        let (mut debugger, transcript) = debugger(&[]);
        debugger.current = Some(frame(5));

        assert_eq!(
            debugger.execute(Command::Print, "").unwrap(),
            PromptOutcome::KeepPrompting
        );
        assert!(transcript.contains("Usage: p <variable_name>"));
        assert_eq!(debugger.mode(), RunMode::default());
    }

    #[test]
    fn test_print_with_argument_keeps_prompting() {
        let (mut debugger, _) = debugger(&[]);
        debugger.current = Some(frame(5));

        assert_eq!(
            debugger.execute(Command::Print, "x").unwrap(),
            PromptOutcome::KeepPrompting
        );
    }

    #[test]
    fn test_list_window() {
        let (mut debugger, transcript) = debugger(&["l", "n"]);
        debugger.on_line_event(frame(10));

        let lines = transcript.lines();
        let start = lines
            .iter()
            .position(|l| l == "Source code around line 10:")
            .unwrap();
        let window = &lines[start + 1..start + 12];
        assert!(window[0].ends_with("   5 line 5"));
        assert!(window[10].ends_with("  15 line 15"));
        // 現在行の表示とウィンドウ内のマーカー
        assert_eq!(transcript.count_prefix("-->   10 "), 1);
        assert_eq!(window.iter().filter(|l| l.starts_with("-->")).count(), 1);
    }

    #[test]
    fn test_list_clamps_at_first_line() {
        let (mut debugger, transcript) = debugger(&["l", "n"]);
        debugger.on_line_event(frame(2));

        let lines = transcript.lines();
        let start = lines
            .iter()
            .position(|l| l == "Source code around line 2:")
            .unwrap();
        let window: Vec<_> = lines[start + 1..]
            .iter()
            .take_while(|l| !l.is_empty())
            .collect();
        assert_eq!(window.len(), 7);
        assert!(window[0].ends_with("   1 line 1"));
        assert!(window[6].ends_with("   7 line 7"));
    }

    #[test]
    fn test_vars_lists_only_locals() {
        let (mut debugger, transcript) = debugger(&["v", "n"]);
        debugger.on_line_event(frame(4));

        assert!(transcript.contains("x = 1"));
        assert!(transcript.contains("shared = \"local\""));
        assert!(!transcript.contains("only_global"));
        assert!(!transcript.contains("\"global\""));
    }

    #[test]
    fn test_unknown_command_shows_help() {
        let (mut debugger, transcript) = debugger(&[]);
        debugger.current = Some(frame(1));

        // 入力はないので、プロンプトを直接1回だけ回す
        debugger.console = ScriptedConsole::new(["x"]);
        let transcript_x = debugger.console.transcript();
        assert_eq!(debugger.read_and_dispatch(), PromptOutcome::KeepPrompting);

        let lines = transcript_x.lines();
        assert_eq!(lines[0], "Unknown command: x");
        assert!(lines.contains(&"Available commands:".to_string()));
        for command in Command::ALL {
            assert!(lines.contains(&command.help_line().to_string()));
        }
        assert_eq!(debugger.mode(), RunMode::default());
        assert!(transcript.lines().is_empty());
    }

    #[test]
    fn test_empty_input_reprompts() {
        let (mut debugger, _) = debugger(&["", "   ", "n"]);
        debugger.on_line_event(frame(1));
        assert_eq!(debugger.console().prompts(), 3);
    }

    #[test]
    fn test_interrupt_is_absorbed() {
        let console = ScriptedConsole::from_inputs([
            ConsoleInput::Interrupted,
            ConsoleInput::Line("n".into()),
        ]);
        let transcript = console.transcript();
        let mut debugger = Debugger::new(console);

        assert_eq!(
            debugger.on_line_event(FrameSnapshot::new(PROGRAM, 1)),
            ObserverDecision::KeepObserving
        );
        assert!(transcript.contains("Use 'q' to quit"));
        assert_eq!(debugger.console().prompts(), 2);
    }

    #[test]
    fn test_eof_continues() {
        let (mut debugger, transcript) = debugger(&[]);
        assert_eq!(debugger.on_line_event(frame(1)), ObserverDecision::Detach);
        assert!(debugger.mode().continuing);
        assert!(transcript.contains("End of input"));
    }

    #[test]
    fn test_handler_failure_is_reported() {
        let path = std::env::temp_dir().join(format!("wee-bad-{}.rs", std::process::id()));
        std::fs::write(&path, [0xff, 0xfe, 0x0a]).unwrap();
        let file = path.to_string_lossy().into_owned();

        let (mut debugger, transcript) = debugger(&["l", "n"]);
        debugger.on_line_event(FrameSnapshot::new(file, 1));
        std::fs::remove_file(&path).unwrap();

        assert!(transcript.contains("Error: cannot decode source"));
        assert_eq!(debugger.console().prompts(), 2);
    }

    #[test]
    fn test_current_line_failure_is_reported() {
        let path = std::env::temp_dir().join(format!("wee-bad-line-{}.rs", std::process::id()));
        std::fs::write(&path, [0xff, 0xfe, 0x0a]).unwrap();
        let file = path.to_string_lossy().into_owned();

        let (mut debugger, transcript) = debugger(&["n"]);
        let decision = debugger.on_line_event(FrameSnapshot::new(file.clone(), 1));
        std::fs::remove_file(&path).unwrap();

        // "n" は何も出力しないので、診断は最初のプロンプトより前に出ている
        let lines = transcript.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], format!("At {}:1", file));
        assert_eq!(lines[2], "--> ");
        assert!(lines[3].starts_with("Error: cannot decode source"));
        assert_eq!(decision, ObserverDecision::KeepObserving);
        assert_eq!(debugger.console().prompts(), 1);
    }

    /// 読み取りが常に失敗するコンソール
    #[derive(Default)]
    struct BrokenConsole {
        output: Vec<String>,
    }

    impl Console for BrokenConsole {
        fn read_line(&mut self, _prompt: &str) -> Result<ConsoleInput> {
            Err(DebuggerError::Console("terminal went away".into()))
        }

        fn write_line(&mut self, line: &str) {
            self.output.push(line.to_string());
        }
    }

    #[test]
    fn test_console_failure_continues() {
        let mut debugger = Debugger::new(BrokenConsole::default());
        let decision = debugger.on_line_event(FrameSnapshot::new(PROGRAM, 1));

        assert_eq!(decision, ObserverDecision::Detach);
        assert!(debugger.mode().continuing);
        let output = &debugger.console().output;
        assert!(output
            .iter()
            .any(|l| l == "Error: console failure: terminal went away"));
        assert!(output.iter().any(|l| l == "End of input, continuing execution"));
    }

    #[test]
    fn test_list_and_vars_without_frame_print_nothing() {
        let (mut debugger, transcript) = debugger(&[]);

        assert_eq!(
            debugger.execute(Command::List, "").unwrap(),
            PromptOutcome::KeepPrompting
        );
        assert_eq!(
            debugger.execute(Command::Vars, "").unwrap(),
            PromptOutcome::KeepPrompting
        );
        assert!(transcript.lines().is_empty());
    }

    #[test]
    fn test_print_without_frame_is_an_error() {
        let (mut debugger, _) = debugger(&[]);
        assert!(matches!(
            debugger.execute(Command::Print, "x"),
            Err(DebuggerError::NoFrame)
        ));
    }

    #[test]
    #[should_panic(expected = "exit(0)")]
    fn test_quit_exits_with_zero() {
        let (mut debugger, _) = debugger(&["q", "n"]);
        debugger.on_line_event(frame(1));
    }

    #[test]
    fn test_pass_through_events_keep_observing() {
        let (mut debugger, transcript) = debugger(&[]);
        let globals = Default::default();
        let context = ExecutionContext {
            file: PROGRAM,
            line: 1,
            locals: &[],
            globals: &globals,
        };

        assert_eq!(
            debugger.on_event(TraceEvent::Call("main"), &context),
            ObserverDecision::KeepObserving
        );
        assert!(transcript.lines().is_empty());
        assert!(debugger.current_frame().is_none());
    }
}
