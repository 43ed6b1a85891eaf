//! wee CLI - コマンドラインインターフェース
//!
//! サンプルの計算を wee デバッガの下で1行ずつ実行する

mod console;
mod demo;

use anyhow::Result;
use clap::Parser;
use console::LineEditorConsole;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wee_core::{host, Debugger, DebuggerConfig};

/// `file!()` のパスはワークスペースのルートからの相対パス
const WORKSPACE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/..");

/// wee - line-by-line debugger for instrumented Rust code
#[derive(Parser)]
#[command(name = "wee")]
#[command(version = "0.1.0")]
#[command(about = "Line-by-line debugger for instrumented Rust code", long_about = None)]
struct Cli {
    /// Argument passed to the example workload
    #[arg(short, default_value_t = 3)]
    n: i64,

    /// Directory used to resolve relative source paths
    #[arg(long, default_value = WORKSPACE_ROOT)]
    source_root: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let config = DebuggerConfig {
        source_root: Some(cli.source_root),
        ..DebuggerConfig::default()
    };
    let console = LineEditorConsole::new()?;
    Debugger::with_config(console, config).attach();

    host::define_global("N", &cli.n);
    info!(n = cli.n, "Running example workload");

    let result = demo::example_function(cli.n);
    println!("Final result: {}", result);

    Ok(())
}

/// ログをstderrに出力する（コンソールのstdoutとは混ぜない）
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
