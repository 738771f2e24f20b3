use anyhow::{bail, Result};
use clap::Parser;
use colored::*;
use nodeping_cli::{Cli, SourceArg};
use nodeping_core::{
    check_nodes_tcp, format_elapsed, init_logger, Config, FileSink, FileSource, HttpSource,
    LogProgress, NodeSource, ResultSink,
};
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BANNER: &str = r#"
╔╗╔╔═╗╔╦╗╔═╗╔═╗╦╔╗╔╔═╗
║║║║ ║ ║║║╣ ╠═╝║║║║║ ╦
╝╚╝╚═╝═╩╝╚═╝╩  ╩╝╚╝╚═╝
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    init_logger();

    let cli = Cli::parse();
    if !cli.no_banner {
        println!("{} v{}", BANNER, VERSION);
    }

    // 加载或创建配置
    let config = if cli.config.exists() {
        match Config::from_file(&cli.config) {
            Ok(cfg) => {
                info!("配置已从 {} 加载", cli.config.display());
                cfg
            }
            Err(e) => {
                error!("加载配置失败: {}", e);
                Config::default()
            }
        }
    } else {
        info!("使用默认配置");
        let default_config = Config::default();
        if let Err(e) = default_config.save_to_file(&cli.config) {
            error!("保存默认配置失败: {}", e);
        } else {
            info!("默认配置已保存到 {}", cli.config.display());
        }
        default_config
    };
    let config = cli.apply(config);
    config.validate()?;

    let source: Box<dyn NodeSource> = match cli.source(&config) {
        Some(SourceArg::File(path)) => Box::new(FileSource::new(path)),
        Some(SourceArg::Url(url)) => Box::new(HttpSource::new(
            url,
            config.subscription.gist_only,
            config.fetch_timeout(),
        )?),
        None => bail!("需要通过 --url、--file 或配置文件提供订阅来源"),
    };

    info!("读取节点: {}", source.describe());
    let nodes = source.load().await?;
    if nodes.is_empty() {
        bail!("无法解析订阅内容，没有可测试的节点");
    }
    info!("成功解析到 {} 个节点", nodes.len());

    let report = check_nodes_tcp(nodes, &config, &LogProgress).await?;
    let summary = report.results.summary();

    println!(
        "{} {}  {} {}  {} {}",
        "✓ 正常:".green().bold(),
        summary.reachable.to_string().yellow().bold(),
        "✗ 超时:".red().bold(),
        summary.unreachable.to_string().yellow().bold(),
        "用时:".bright_black(),
        format_elapsed(report.elapsed).bright_black()
    );
    if let Some(fastest) = report.results.fastest() {
        println!(
            "{} {} - {}ms",
            "最快节点:".green().bold(),
            fastest.label().cyan(),
            fastest.delay().unwrap_or_default()
        );
    }

    let sink = FileSink::new(&config.output.reachable_file, &config.output.unreachable_file);
    sink.persist(&report.results)?;

    info!("NodePing CLI 已退出");
    Ok(())
}
