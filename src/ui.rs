//! UI相关功能模块
//!
//! 提供进度条、横幅和彩色提示

use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use nodeping_core::{format_elapsed, is_gist_url, Progress, ProgressSink, ResultSets};
use std::time::Duration;

/// 创建一个标准格式的进度条
pub fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    // 输出被重定向时不画进度条
    if !console::Term::stderr().is_term() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb
}

/// 用进度条展示批量测试进度
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total: usize) -> Self {
        Self { bar: create_progress_bar(total as u64) }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl ProgressSink for BarProgress {
    fn on_long_running(&self, _elapsed: Duration) {
        self.bar.println(
            "本次总节点有点多，正在测试节点延迟中，主人请不要关闭窗口走开哦~"
                .yellow()
                .to_string(),
        );
    }

    fn on_progress(&self, progress: &Progress) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.processed as u64);
        if progress.is_complete() {
            self.bar.finish_with_message(format!(
                "已测试 {}/{} 个节点，累计时间：{}",
                progress.processed,
                progress.total,
                format_elapsed(progress.elapsed)
            ));
        }
    }
}

/// 延迟颜色：100ms以内绿色，300ms以内黄色，其余红色
pub fn latency_color(ms: f64) -> Color {
    if ms <= 100.0 {
        Color::Green
    } else if ms <= 300.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn colorize_latency(ms: f64) -> ColoredString {
    format!("{:.0}ms", ms).color(latency_color(ms))
}

/// 打印测试结果摘要和延迟最低的若干节点
pub fn print_results(results: &ResultSets, elapsed: Duration, top: usize) {
    let summary = results.summary();
    println!(
        "\n{} {}  {} {}  {} {}",
        "正常节点:".green().bold(),
        summary.reachable.to_string().yellow().bold(),
        "超时节点:".red().bold(),
        summary.unreachable.to_string().yellow().bold(),
        "总用时:".bright_black(),
        format_elapsed(elapsed).bright_black()
    );
    for (i, node) in results.reachable.iter().take(top).enumerate() {
        println!(
            "{:3}. {} - {}",
            (i + 1).to_string().blue().bold(),
            node.label().cyan(),
            colorize_latency(node.delay().unwrap_or_default())
        );
    }
}

/// 开始下载订阅前的提示，只有Gist链接才提示检测到Gist
pub fn download_notice(url: &str) -> &'static str {
    if is_gist_url(url) {
        "检测到GitHub Gist链接，开始下载..."
    } else {
        "开始下载订阅内容..."
    }
}

/// 打印横幅
pub fn print_banner(version: &str) {
    println!("{}\n{}",
        r#"
╔╗╔╔═╗╔╦╗╔═╗╔═╗╦╔╗╔╔═╗
║║║║ ║ ║║║╣ ╠═╝║║║║║ ╦
╝╚╝╚═╝═╩╝╚═╝╩  ╩╝╚╝╚═╝
        "#.cyan().bold(),
        format!("Version: {}", version).yellow()
    );
}

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    println!("{} {}", "✗".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "!".yellow().bold(), msg);
}
