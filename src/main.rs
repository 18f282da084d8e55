use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use episode_meta::scanner::FileScanner;
use episode_meta::{Classifier, EpisodeMetadata};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 要识别的文件或目录
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// 是否递归扫描子目录
    #[arg(short, long)]
    recursive: bool,

    /// 以 JSON 格式输出
    #[arg(long)]
    json: bool,

    /// 只输出视频文件
    #[arg(long)]
    videos_only: bool,

    /// 日志详细程度（可重复，如 -vv）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct LabeledPath<'a> {
    path: &'a str,
    #[serde(flatten)]
    label: &'a EpisodeMetadata,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let scanner = FileScanner::new(args.recursive);
    let files: Vec<String> = scanner
        .collect(&args.paths)
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();

    if files.is_empty() {
        eprintln!("未找到文件");
        return Ok(());
    }
    tracing::info!("Labeling {} files", files.len());

    let classification = Classifier::new().classify_detailed(&files);
    for fallback in &classification.fallbacks {
        tracing::info!("{} 使用单文件解析: {}", fallback.dir, fallback.reason);
    }

    let rows: Vec<LabeledPath> = files
        .iter()
        .zip(&classification.labels)
        .filter(|(_, label)| !args.videos_only || !label.is_blank())
        .map(|(path, label)| LabeledPath {
            path: path.as_str(),
            label,
        })
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.json {
        let json = serde_json::to_string_pretty(&rows).context("序列化结果失败")?;
        writeln!(out, "{}", json)?;
    } else {
        for row in &rows {
            if row.label.is_blank() {
                writeln!(out, "{:<12} {:<8} {}", "-", "-", row.path)?;
            } else {
                writeln!(
                    out,
                    "{:<12} {:<8} {}",
                    display_field(&row.label.season),
                    row.label.episode,
                    row.path
                )?;
            }
        }
    }

    Ok(())
}

fn display_field(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
