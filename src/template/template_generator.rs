//! 模板生成流程
//!
//! 读取模板 → 发现需要展开的表格 → 逐个展开 → 删除指定表格 → 替换变量 → 保存。
//! 单个表格出错只记录在报告中，不影响其他表格；读取和保存失败会结束整个流程。

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::docx::{merge_runs, DocxAdapterError, DocxPackage};
use crate::models::{Conf, ConfError, VariableMapping, VariablesFileError};

use super::row_generator::{expand_rows, resolve_row_count, template_row};
use super::table_finder::find_table;
use super::table_remover::remove_table_by_id;
use super::variable_replacer::substitute;

/// 模板生成错误
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("模板读取失败: {0}")]
    LoadError(#[source] DocxAdapterError),

    #[error("表格 '{table_id}' 的变量 '{key}' 的行号后缀不是整数")]
    MalformedRowSuffixKey { table_id: String, key: String },

    #[error("表格 '{table_id}' 需要 {rows} 行，超过上限 {max_rows}")]
    TooManyRows {
        table_id: String,
        rows: usize,
        max_rows: usize,
    },

    #[error("文档保存失败: {0}")]
    SaveError(#[source] DocxAdapterError),

    #[error("变量读取失败: {0}")]
    VariablesError(#[from] VariablesFileError),

    #[error("配置错误: {0}")]
    ConfError(#[from] ConfError),

    #[error("无效的配置: {0}")]
    InvalidConfig(String),

    #[error("当前状态 {0:?} 不允许该操作")]
    InvalidState(RunState),
}

/// 模板生成结果
pub type TemplateResult<T> = Result<T, TemplateError>;

/// 生成流程的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RunState {
    Loaded,
    Discovered,
    Expanded,
    Pruned,
    Substituted,
    Saved,
    Failed,
}

/// 单个表格的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TableOutcome {
    /// 已展开为 `rows` 行
    Expanded { rows: usize },
    /// 表格行数不足 2，没有模板行
    NoTemplateRow,
    /// 文档中没有该标题的表格
    NotFound,
    /// 处理失败
    Failed { message: String },
}

/// 表格报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table_id: String,
    #[serde(flatten)]
    pub outcome: TableOutcome,
}

/// 生成报告
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// 当前状态
    pub state: RunState,
    /// 失败前到达的最后状态
    pub failed_after: Option<RunState>,
    /// 合并的文本运行数量
    pub merged_runs: usize,
    /// 每个参数化表格的结果
    pub tables: Vec<TableReport>,
    /// 已删除的表格
    pub removed_tables: Vec<String>,
    /// 要删除但未找到的表格
    pub missing_tables: Vec<String>,
    /// 替换的占位符数量
    pub replacements: usize,
    /// 输出路径
    pub output_path: Option<PathBuf>,
}

impl RunReport {
    fn new() -> Self {
        RunReport {
            state: RunState::Loaded,
            failed_after: None,
            merged_runs: 0,
            tables: Vec::new(),
            removed_tables: Vec::new(),
            missing_tables: Vec::new(),
            replacements: 0,
            output_path: None,
        }
    }

    /// 某个表格的结果
    pub fn table(&self, table_id: &str) -> Option<&TableOutcome> {
        self.tables
            .iter()
            .find(|report| report.table_id == table_id)
            .map(|report| &report.outcome)
    }

    /// 处理失败的表格数量
    pub fn failed_tables(&self) -> usize {
        self.tables
            .iter()
            .filter(|report| matches!(report.outcome, TableOutcome::Failed { .. }))
            .count()
    }
}

/// 模板生成器
///
/// 独占一份已读取的 DOCX 包。[`TemplateGenerator::process`] 每次运行只能调用一次，
/// 因为表格展开不是幂等的；[`TemplateGenerator::save`] 失败后可以换路径重试。
pub struct TemplateGenerator {
    package: DocxPackage,
    conf: Conf,
    report: RunReport,
}

impl TemplateGenerator {
    /// 读取模板
    pub fn load(template_path: impl AsRef<Path>, conf: &Conf) -> TemplateResult<Self> {
        let template_path = template_path.as_ref();
        match DocxPackage::load(template_path) {
            Ok(package) => Ok(Self::from_package(package, conf)),
            Err(e) => {
                log::error!(
                    "【TemplateGenerator::load】模板读取失败 {}: {}",
                    template_path.display(),
                    e
                );
                Err(TemplateError::LoadError(e))
            }
        }
    }

    /// 使用已读取的包
    pub fn from_package(mut package: DocxPackage, conf: &Conf) -> Self {
        let mut report = RunReport::new();
        if conf.merge_runs {
            report.merged_runs = merge_runs(package.document_mut());
        }
        if let Some(title) = &conf.title {
            package.set_title(title);
        }
        TemplateGenerator {
            package,
            conf: conf.clone(),
            report,
        }
    }

    pub fn state(&self) -> RunState {
        self.report.state
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn package(&self) -> &DocxPackage {
        &self.package
    }

    pub fn into_package(self) -> DocxPackage {
        self.package
    }

    /// 展开表格、删除表格并替换变量
    pub fn process(&mut self, variables: &VariableMapping) -> TemplateResult<&RunReport> {
        if self.report.state != RunState::Loaded {
            return Err(TemplateError::InvalidState(self.report.state));
        }

        log::info!("【process】查找带参数的表格");
        let table_ids = variables.table_ids(&self.conf.table_prefix);
        log::info!("【process】带参数的表格: {:?}", table_ids);
        self.report.state = RunState::Discovered;

        for table_id in &table_ids {
            let outcome = match self.expand_table(table_id, variables) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("【process】表格 '{}' 处理失败: {}", table_id, e);
                    TableOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };
            self.report.tables.push(TableReport {
                table_id: table_id.clone(),
                outcome,
            });
        }
        self.report.state = RunState::Expanded;

        for table_id in &self.conf.remove_tables {
            if remove_table_by_id(self.package.document_mut(), table_id) {
                self.report.removed_tables.push(table_id.clone());
            } else {
                self.report.missing_tables.push(table_id.clone());
            }
        }
        self.report.state = RunState::Pruned;

        self.report.replacements = substitute(self.package.document_mut(), variables);
        self.report.state = RunState::Substituted;

        Ok(&self.report)
    }

    fn expand_table(
        &mut self,
        table_id: &str,
        variables: &VariableMapping,
    ) -> TemplateResult<TableOutcome> {
        let tree = self.package.document_mut();
        let table = match find_table(tree, table_id) {
            Some(table) => table,
            None => {
                log::info!("【expand_table】表格 '{}' 未在文档中找到", table_id);
                return Ok(TableOutcome::NotFound);
            }
        };

        let num_lines = resolve_row_count(table_id, variables)?;
        if num_lines > self.conf.max_rows {
            return Err(TemplateError::TooManyRows {
                table_id: table_id.to_string(),
                rows: num_lines,
                max_rows: self.conf.max_rows,
            });
        }
        if template_row(tree, table).is_none() {
            log::warn!("【expand_table】表格 '{}' 少于 2 行，无法展开", table_id);
            return Ok(TableOutcome::NoTemplateRow);
        }

        let rows = expand_rows(tree, table, num_lines);
        Ok(TableOutcome::Expanded { rows })
    }

    /// 保存生成的文档
    ///
    /// 失败时状态变为 `Failed`，文档树保持不变，可以再次调用。
    pub fn save(&mut self, output_path: impl AsRef<Path>) -> TemplateResult<&RunReport> {
        let output_path = output_path.as_ref();
        let reached = self.report.failed_after.unwrap_or(self.report.state);
        if reached < RunState::Substituted {
            return Err(TemplateError::InvalidState(self.report.state));
        }

        match self.package.save(output_path) {
            Ok(()) => {
                self.report.state = RunState::Saved;
                self.report.failed_after = None;
                self.report.output_path = Some(output_path.to_path_buf());
                Ok(&self.report)
            }
            Err(e) => {
                log::error!(
                    "【save】文件保存失败 {}: {}",
                    output_path.display(),
                    e
                );
                self.report.failed_after = Some(reached);
                self.report.state = RunState::Failed;
                Err(TemplateError::SaveError(e))
            }
        }
    }

    /// 生成的文档字节
    pub fn to_bytes(&self) -> TemplateResult<Vec<u8>> {
        self.package.to_bytes().map_err(TemplateError::SaveError)
    }
}

/// 按配置完成一次完整的生成
///
/// 配置中必须有模板路径和输出路径。
pub fn generate_document(conf: &Conf, variables: &VariableMapping) -> TemplateResult<RunReport> {
    conf.validate()?;
    let template_path = conf
        .template_path
        .as_ref()
        .ok_or_else(|| TemplateError::InvalidConfig("缺少模板路径".to_string()))?;
    let output_path = conf
        .output_path
        .as_ref()
        .ok_or_else(|| TemplateError::InvalidConfig("缺少输出路径".to_string()))?;

    log::info!("【generate_document】开始生成: {}", template_path.display());
    let mut generator = TemplateGenerator::load(template_path, conf)?;
    generator.process(variables)?;
    let report = generator.save(output_path)?;
    log::info!("【generate_document】生成完成: {}", output_path.display());
    Ok(report.clone())
}
