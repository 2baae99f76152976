use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use jade_diagnostics::{Diagnostic, DiagnosticSink, Emitter};
use jade_syntax::parse_expression;

#[derive(Parser)]
#[command(name = "jadex")]
#[command(about = "Jade 表达式解析器 - 规范形式与诊断", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 解析一个表达式并打印规范形式
    Parse {
        /// 表达式；缺省从标准输入读
        expr: Option<String>,
    },

    /// 逐行检查文件里的表达式
    Check {
        /// 输入文件
        input: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Parse { expr } => cmd_parse(expr)?,
        Commands::Check { input } => cmd_check(&input)?,
    };

    Ok(code)
}

/// 解析命令
fn cmd_parse(expr: Option<String>) -> Result<ExitCode> {
    let text = match expr {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading expression from stdin")?;
            buffer
        }
    };

    match parse_expression(&text) {
        Ok(ast) => {
            println!("{}", ast);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let emitter = Emitter::new();
            emitter.emit_with_source(&Diagnostic::from_parse_error(&err), &text);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// 检查命令 - 每个非空行当一个表达式
fn cmd_check(input: &str) -> Result<ExitCode> {
    let source = fs::read_to_string(input).with_context(|| format!("reading {}", input))?;

    let mut sink = DiagnosticSink::new();
    let mut checked = 0usize;
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        checked += 1;
        if let Err(err) = parse_expression(line) {
            sink.add(Diagnostic::from_parse_error(&err).with_note(format!("while checking: {}", line)));
        }
    }

    if sink.has_errors() {
        let emitter = Emitter::new();
        emitter.emit_all(sink.diagnostics());
        eprintln!("{} of {} expressions failed", sink.len(), checked);
        Ok(ExitCode::FAILURE)
    } else {
        println!("{} expressions OK", checked);
        Ok(ExitCode::SUCCESS)
    }
}
