use clap::{Parser, Subcommand};

// 确保 Parser trait 被使用
impl Cli {
    /// 解析命令行参数
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

/// VKMatch Bot - VK 交友匹配机器人
#[derive(Parser, Debug)]
#[command(name = "vkmatch")]
#[command(version)]
#[command(about = "基于 VK Long Poll 的交友匹配机器人", long_about = None)]
pub struct Cli {
    /// 配置文件路径
    #[arg(long, value_name = "FILE", help = "指定配置文件路径")]
    pub config_file: Option<String>,

    /// 数据库连接 URL
    #[arg(long, value_name = "URL", help = "数据库连接字符串")]
    pub database_url: Option<String>,

    /// 社群 ID
    #[arg(long, value_name = "ID", help = "VK 社群 ID")]
    pub group_id: Option<u64>,

    /// 日志级别
    #[arg(
        long,
        value_name = "LEVEL",
        help = "日志级别: trace, debug, info, warn, error"
    )]
    pub log_level: Option<String>,

    /// 日志格式
    #[arg(long, value_name = "FORMAT", help = "日志格式: pretty, json, compact")]
    pub log_format: Option<String>,

    /// 详细输出（可重复使用：-v, -vv, -vvv）
    #[arg(short, action = clap::ArgAction::Count, help = "详细输出级别")]
    pub verbose: u8,

    /// 静默模式
    #[arg(long, short = 'q', help = "静默模式（不输出日志）")]
    pub quiet: bool,

    /// 开发模式（等同于 --log-level debug --log-format pretty）
    #[arg(long, help = "启用开发模式")]
    pub dev: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// 子命令
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 初始化数据库表结构后退出
    InitDb,
    /// 生成默认配置文件
    GenerateConfig {
        /// 输出路径
        #[arg(default_value = "config.toml")]
        path: String,
    },
    /// 验证配置文件
    ValidateConfig {
        /// 配置文件路径
        #[arg(default_value = "config.toml")]
        path: String,
    },
    /// 显示最终合并后的配置
    ShowConfig,
}

impl Cli {
    /// 计算有效日志级别（-v 叠加 > --log-level > dev 模式）
    pub fn get_log_level(&self) -> Option<String> {
        match self.verbose {
            0 => {
                if self.dev {
                    Some("debug".to_string())
                } else {
                    self.log_level.clone()
                }
            }
            1 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        }
    }

    /// 计算有效日志格式
    pub fn get_log_format(&self) -> Option<String> {
        if self.dev && self.log_format.is_none() {
            Some("pretty".to_string())
        } else {
            self.log_format.clone()
        }
    }
}
