//! 网络配置

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT};
use crate::error::ConfigError;

/// 网络配置（服务端监听地址或客户端目标地址）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl NetworkConfig {
    /// 解析位置参数（不含程序名）：
    /// 无参数使用默认值；一个参数为端口；两个参数为地址和端口。
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        match args {
            [] => {}
            [port] => config.port = parse_port(port.as_ref())?,
            [host, port] => {
                config.host = host.as_ref().to_string();
                config.port = parse_port(port.as_ref())?;
            }
            _ => return Err(ConfigError::TooManyArguments(args.len())),
        }
        Ok(config)
    }

    /// `host:port` 形式的地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(s: &str) -> Result<u16, ConfigError> {
    s.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(s.to_string()))
}
