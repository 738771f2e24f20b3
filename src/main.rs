use anyhow::Result;
use nodeping::ui::{
    download_notice, print_banner, print_error, print_results, print_success, print_warning,
    BarProgress,
};
use nodeping::{
    check_nodes_tcp, init_logger, is_gist_url, Config, FileSink, HttpSource, NodeSource,
    ResultSink,
};
use std::io::Write;
use std::path::Path;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    init_logger();

    print_banner(VERSION);

    // 加载配置，没有配置文件时使用默认值
    let config_path = Path::new("config.toml");
    let config = if config_path.exists() {
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("加载配置失败: {}", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    println!("请输入GitHub Gist原始内容链接:");
    std::io::stdout().flush()?;
    let mut lines = BufReader::new(io::stdin()).lines();
    let url = match lines.next_line().await? {
        Some(line) => line.trim().to_string(),
        None => {
            print_error("没有读取到链接");
            return Ok(());
        }
    };

    if config.subscription.gist_only && !is_gist_url(&url) {
        print_error("错误: 仅支持GitHub Gist的URL");
        return Ok(());
    }
    info!("{}", download_notice(&url));

    let source = HttpSource::new(url, config.subscription.gist_only, config.fetch_timeout())?;
    let nodes = match source.load().await {
        Ok(nodes) if !nodes.is_empty() => nodes,
        Ok(_) => {
            print_error("无法解析订阅内容。");
            return Ok(());
        }
        Err(e) => {
            print_error(&format!("无法下载订阅内容: {}", e));
            return Ok(());
        }
    };
    print_success(&format!("成功解析到 {} 个节点", nodes.len()));

    // 进度条长度在第一次通知时更新为去重后的数量
    let progress = BarProgress::new(nodes.len());
    let report = check_nodes_tcp(nodes, &config, &progress).await?;

    if report.duplicates > 0 {
        print_warning(&format!("移除了 {} 个重复的节点", report.duplicates));
    }
    print_results(&report.results, report.elapsed, 10);

    let sink = FileSink::new(&config.output.reachable_file, &config.output.unreachable_file);
    if let Err(e) = sink.persist(&report.results) {
        print_error(&format!("保存节点信息时出错: {}", e));
    }

    Ok(())
}
