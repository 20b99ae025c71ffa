pub mod models;
pub mod utils;
pub mod docx;
pub mod template;
pub mod api;

pub use models::{
    Conf,
    ConfError,
    VariableMapping,
    VariablesFileError
};

pub use docx::{
    DocumentTree,
    DocxAdapterError,
    DocxPackage,
    NodeId,
    NodeKind
};

pub use template::{
    RunReport,
    RunState,
    TableOutcome,
    TemplateError,
    TemplateGenerator,
    TemplateResult,
    generate_document
};

pub use api::{
    ExportResult,
    fill_template,
    fill_template_bytes,
    fill_template_base64
};

/// 用变量填充模板
///
/// # Arguments
///
/// * `template` - DOCX 模板的字节
/// * `variables` - 变量映射
/// * `config` - 配置对象
///
/// # Returns
///
/// 生成的 DOCX 字节
pub fn fill(template: &[u8], variables: &VariableMapping, config: &Conf) -> TemplateResult<Vec<u8>> {
    fill_template_bytes(template, variables, config)
}
