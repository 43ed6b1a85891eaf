//! ホスト側の計装API
//!
//! 計装されたコードは行を実行する直前に [`line_event`] を呼び出します
//! （通常は [`trace_line!`](crate::trace_line) マクロ経由）。
//! 現在のスレッドにオブザーバが登録されていれば、イベントはそのオブザーバに
//! 同期的に渡され、オブザーバの戻り値によって以降も監視を続けるかどうかが決まります。
//!
//! オブザーバの登録はスレッドごとです。他のスレッドのイベントは観測されません。

use crate::frame::{Bindings, Value};
use std::cell::RefCell;
use std::fmt;
use tracing::{debug, trace, warn};

/// 実行イベントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent<'a> {
    /// 関数呼び出し
    Call(&'a str),
    /// 新しいソース行を実行する直前
    Line,
    /// 関数からの復帰
    Return(&'a str),
}

/// オブザーバの判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverDecision {
    /// 以降のイベントも引き続き受け取る
    KeepObserving,
    /// 監視をやめる（オブザーバは破棄される）
    Detach,
}

/// ホストがオブザーバに渡す実行コンテキスト
#[derive(Debug)]
pub struct ExecutionContext<'a> {
    pub file: &'a str,
    pub line: u32,
    /// 計装箇所で捕捉したローカル変数（名前と `Debug` 表現）
    pub locals: &'a [(&'a str, String)],
    pub globals: &'a Bindings,
}

/// 実行イベントを受け取るオブザーバ
pub trait ExecutionObserver {
    fn on_event(&mut self, event: TraceEvent<'_>, context: &ExecutionContext<'_>) -> ObserverDecision;
}

thread_local! {
    static OBSERVER: RefCell<Option<Box<dyn ExecutionObserver>>> = RefCell::new(None);
    static GLOBALS: RefCell<Bindings> = RefCell::new(Bindings::new());
}

/// 現在のスレッドにオブザーバを登録する
///
/// `None` を渡すと登録を解除します。以前に登録されていたオブザーバを返します。
pub fn set_trace(observer: Option<Box<dyn ExecutionObserver>>) -> Option<Box<dyn ExecutionObserver>> {
    let installing = observer.is_some();
    let previous = OBSERVER.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), observer));
    if installing && previous.is_some() {
        warn!("Replacing an observer that was still attached");
    }
    previous
}

/// 現在のスレッドのオブザーバを解除して返す
pub fn detach() -> Option<Box<dyn ExecutionObserver>> {
    set_trace(None)
}

/// 現在のスレッドにオブザーバが登録されているか
pub fn is_tracing() -> bool {
    OBSERVER.with(|slot| slot.borrow().is_some())
}

/// グローバル変数を定義する（同名の変数は上書き）
pub fn define_global<T: fmt::Debug + ?Sized>(name: &str, value: &T) {
    GLOBALS.with(|globals| globals.borrow_mut().insert(name, Value::from_debug(value)));
}

/// 現在のスレッドのグローバル変数をすべて削除する
pub fn clear_globals() {
    GLOBALS.with(|globals| globals.borrow_mut().clear());
}

/// イベントをオブザーバに配送する
///
/// コールバックの間、オブザーバはスロットから取り出されます。
/// `KeepObserving` が返ればスロットに戻し、`Detach` なら破棄します。
pub fn emit(event: TraceEvent<'_>, file: &str, line: u32, locals: &[(&str, String)]) {
    let Some(mut observer) = OBSERVER.with(|slot| slot.borrow_mut().take()) else {
        return;
    };

    let decision = GLOBALS.with(|globals| {
        let globals = globals.borrow();
        let context = ExecutionContext {
            file,
            line,
            locals,
            globals: &globals,
        };
        observer.on_event(event, &context)
    });

    match decision {
        ObserverDecision::KeepObserving => OBSERVER.with(|slot| {
            let mut slot = slot.borrow_mut();
            // コールバック中に別のオブザーバが登録された場合はそちらを優先する
            if slot.is_none() {
                *slot = Some(observer);
            }
        }),
        ObserverDecision::Detach => {
            debug!(file, line, "Observer detached");
        }
    }
}

/// 行イベントを発行する
pub fn line_event(file: &str, line: u32, locals: &[(&str, String)]) {
    trace!(file, line, "line event");
    emit(TraceEvent::Line, file, line, locals);
}

/// 関数呼び出しイベントを発行する
pub fn call_event(function: &str, file: &str, line: u32, locals: &[(&str, String)]) {
    emit(TraceEvent::Call(function), file, line, locals);
}

/// 関数復帰イベントを発行する
pub fn return_event(function: &str, file: &str, line: u32, locals: &[(&str, String)]) {
    emit(TraceEvent::Return(function), file, line, locals);
}

/// 行イベントを発行してから文を実行する
///
/// `;` の前に並べたローカル変数が `Debug` 表現で捕捉されます。
/// 文の中の `let` 束縛はマクロの後でも有効です。
///
/// ```
/// use wee_core::trace_line;
///
/// fn add(a: i32, b: i32) -> i32 {
///     trace_line!(a, b; let sum = a + b);
///     trace_line!(a, b, sum; return sum);
/// }
///
/// assert_eq!(add(1, 2), 3);
/// ```
#[macro_export]
macro_rules! trace_line {
    ($($local:ident),* ; $stmt:stmt) => {
        $crate::host::line_event(
            file!(),
            line!(),
            &[$((stringify!($local), format!("{:?}", $local))),*],
        );
        $stmt;
    };
    ($($local:ident),*) => {
        $crate::host::line_event(
            file!(),
            line!(),
            &[$((stringify!($local), format!("{:?}", $local))),*],
        );
    };
}

/// 関数呼び出しイベントを発行する
#[macro_export]
macro_rules! trace_call {
    ($function:expr $(; $($local:ident),*)?) => {
        $crate::host::call_event(
            $function,
            file!(),
            line!(),
            &[$($((stringify!($local), format!("{:?}", $local))),*)?],
        );
    };
}

/// 関数復帰イベントを発行する
#[macro_export]
macro_rules! trace_return {
    ($function:expr $(; $($local:ident),*)?) => {
        $crate::host::return_event(
            $function,
            file!(),
            line!(),
            &[$($((stringify!($local), format!("{:?}", $local))),*)?],
        );
    };
}
