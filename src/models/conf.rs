use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::variables::DEFAULT_TABLE_PREFIX;

/// 单个表格默认最多生成的行数
pub const DEFAULT_MAX_ROWS: usize = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    /// 模板路径
    pub template_path: Option<PathBuf>,
    /// 输出路径
    pub output_path: Option<PathBuf>,
    /// 变量文件路径（JSON）
    pub variables_path: Option<PathBuf>,
    /// 表格变量的前缀
    pub table_prefix: String,
    /// 生成后要删除的表格（按标题）
    pub remove_tables: Vec<String>,
    /// 文档标题
    pub title: Option<String>,
    /// 替换前是否合并格式相同的文本运行
    pub merge_runs: bool,
    /// 单个表格最多生成的行数
    pub max_rows: usize,
}

impl Default for Conf {
    fn default() -> Self {
        Conf {
            template_path: None,
            output_path: None,
            variables_path: None,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            remove_tables: Vec::new(),
            title: None,
            merge_runs: true,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl Conf {
    /// 从 JSON 配置文件读取，缺失的字段使用默认值
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let conf: Conf = serde_json::from_str(&content)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> Result<(), ConfError> {
        if self.table_prefix.is_empty() {
            return Err(ConfError::Invalid("table_prefix 不能为空".to_string()));
        }
        if self.remove_tables.iter().any(|id| id.is_empty()) {
            return Err(ConfError::Invalid("remove_tables 中存在空的表格标题".to_string()));
        }
        if self.max_rows == 0 {
            return Err(ConfError::Invalid("max_rows 必须大于 0".to_string()));
        }
        Ok(())
    }
}

/// 配置错误
#[derive(thiserror::Error, Debug)]
pub enum ConfError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("无效的配置: {0}")]
    Invalid(String),
}
