//! 对外 API
//!
//! 这个模块提供了调用方（桥接层、脚本）可以直接使用的简单接口，
//! 变量以 JSON 文本传入，结果以 [`ExportResult`] 返回，不向外抛出错误。

use crate::docx::DocxPackage;
use crate::models::{Conf, VariableMapping};
use crate::template::{RunReport, TemplateError, TemplateGenerator, TemplateResult};

/// 导出结果
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub success: bool,
    pub message: String,
    pub file_path: Option<String>,
    /// Base64 编码的文档，仅 [`fill_template_base64`] 返回
    pub data: Option<String>,
    pub report: Option<RunReport>,
}

impl ExportResult {
    fn failure(message: String) -> Self {
        ExportResult {
            success: false,
            message,
            file_path: None,
            data: None,
            report: None,
        }
    }
}

/// 用 JSON 变量填充模板并保存到 `output_path`
pub fn fill_template(
    template_path: String,
    output_path: String,
    variables_json: String,
    config: Option<Conf>,
) -> ExportResult {
    let conf = config.unwrap_or_default();

    let variables = match VariableMapping::from_json_str(&variables_json) {
        Ok(variables) => variables,
        Err(e) => return ExportResult::failure(format!("变量解析失败: {}", e)),
    };

    let result = TemplateGenerator::load(&template_path, &conf).and_then(|mut generator| {
        generator.process(&variables)?;
        let report = generator.save(&output_path)?.clone();
        Ok(report)
    });

    match result {
        Ok(report) => ExportResult {
            success: true,
            message: "DOCX文档生成成功".to_string(),
            file_path: Some(output_path),
            data: None,
            report: Some(report),
        },
        Err(e) => ExportResult::failure(format!("生成失败: {}", e)),
    }
}

/// 在内存中填充模板，返回生成的文档字节
pub fn fill_template_bytes(
    template: &[u8],
    variables: &VariableMapping,
    conf: &Conf,
) -> TemplateResult<Vec<u8>> {
    let package = DocxPackage::from_bytes(template).map_err(TemplateError::LoadError)?;
    let mut generator = TemplateGenerator::from_package(package, conf);
    generator.process(variables)?;
    generator.to_bytes()
}

/// 填充模板并返回 Base64 编码的文档
pub fn fill_template_base64(
    template_path: String,
    variables_json: String,
    config: Option<Conf>,
) -> ExportResult {
    let conf = config.unwrap_or_default();

    let variables = match VariableMapping::from_json_str(&variables_json) {
        Ok(variables) => variables,
        Err(e) => return ExportResult::failure(format!("变量解析失败: {}", e)),
    };

    let result = TemplateGenerator::load(&template_path, &conf).and_then(|mut generator| {
        let report = generator.process(&variables)?.clone();
        let data = generator
            .package()
            .to_base64()
            .map_err(TemplateError::SaveError)?;
        Ok((data, report))
    });

    match result {
        Ok((data, report)) => ExportResult {
            success: true,
            message: "DOCX Base64编码生成成功".to_string(),
            file_path: None,
            data: Some(data),
            report: Some(report),
        },
        Err(e) => ExportResult::failure(format!("生成失败: {}", e)),
    }
}
