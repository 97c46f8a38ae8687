use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::app::{RunOptions, run};
use sparkify_etl::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            // 配置不可用时按默认日志配置记录失败原因
            #[cfg(feature = "logging")]
            {
                let defaults = sparkify_etl::config::LogConfig::default();
                if sparkify_etl::logging::init_logging(&defaults).is_ok() {
                    tracing::error!(
                        "读取配置失败 {}: {}",
                        cli.config.display(),
                        e
                    );
                }
            }
            return Err(e).with_context(|| {
                format!("读取配置失败: {}", cli.config.display())
            });
        }
    };

    #[cfg(feature = "logging")]
    {
        sparkify_etl::logging::init_logging(&config.log)
            .context("初始化日志失败")?;
        if cli.config.exists() {
            tracing::info!("已加载配置文件: {}", cli.config.display());
        } else {
            tracing::info!(
                "配置文件 {} 不存在，使用默认配置",
                cli.config.display()
            );
        }
    }

    let summary = run(&config, RunOptions { reset_schema: cli.reset_schema })
        .context("ETL 运行失败")?;

    println!("\n歌曲数据: {}", summary.songs.stats);
    println!("日志数据: {}", summary.logs.stats);
    println!("合计: {}", summary.total());
    Ok(())
}
