use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::core_properties;
use super::tree::DocumentTree;

/// DOCX适配器错误
#[derive(Error, Debug)]
pub enum DocxAdapterError {
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("ZIP错误: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("XML错误: {0}")]
    XmlError(String),

    #[error("缺少文档部件: {0}")]
    MissingPart(String),
}

/// DOCX适配器结果
pub type DocxAdapterResult<T> = Result<T, DocxAdapterError>;

/// 包关系文件
const PACKAGE_RELS: &str = "_rels/.rels";
/// 主文档关系类型后缀
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
/// 默认主文档部件
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

/// ZIP 包中的一个条目
#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// DOCX 包
///
/// 读取时保留所有 ZIP 条目的顺序和内容，只把主文档部件解析成 [`DocumentTree`]。
/// 保存时重新序列化主文档部件，其余条目原样写回。
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
    document_part: String,
    document: DocumentTree,
    title: Option<String>,
}

impl DocxPackage {
    /// 从文件读取 DOCX 包
    pub fn load(path: impl AsRef<Path>) -> DocxAdapterResult<Self> {
        let path = path.as_ref();
        log::info!("【DocxPackage::load】读取模板: {}", path.display());
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// 从内存中的字节读取 DOCX 包
    pub fn from_bytes(bytes: &[u8]) -> DocxAdapterResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        let document_part = find_document_part(&entries)?;
        let document_xml = entries
            .iter()
            .find(|entry| entry.name == document_part)
            .map(|entry| entry.data.as_slice())
            .ok_or_else(|| DocxAdapterError::MissingPart(document_part.clone()))?;
        let document = DocumentTree::parse(document_xml)?;

        log::debug!(
            "【DocxPackage::from_bytes】条目数量: {}, 主文档: {}",
            entries.len(),
            document_part
        );

        Ok(DocxPackage {
            entries,
            document_part,
            document,
            title: None,
        })
    }

    /// 主文档树
    pub fn document(&self) -> &DocumentTree {
        &self.document
    }

    /// 可变的主文档树
    pub fn document_mut(&mut self) -> &mut DocumentTree {
        &mut self.document
    }

    /// 主文档部件名称
    pub fn document_part(&self) -> &str {
        &self.document_part
    }

    /// 包中的条目名称
    pub fn part_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// 读取某个条目的原始字节
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    /// 设置文档标题，保存时写入 `docProps/core.xml`
    pub fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// 序列化为字节
    pub fn to_bytes(&self) -> DocxAdapterResult<Vec<u8>> {
        let document_xml = self.document.to_xml()?;
        let core_xml = match &self.title {
            Some(title) => Some(core_properties::apply_title(
                self.part(core_properties::CORE_PROPERTIES_PART),
                title,
            )?),
            None => None,
        };

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut core_written = false;

        for entry in &self.entries {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), FileOptions::default())?;
                continue;
            }

            let data = match &core_xml {
                _ if entry.name == self.document_part => document_xml.as_slice(),
                Some(core_xml) if entry.name == core_properties::CORE_PROPERTIES_PART => {
                    core_written = true;
                    core_xml.as_slice()
                }
                _ => entry.data.as_slice(),
            };

            zip.start_file(entry.name.as_str(), file_options(entry.compression))?;
            zip.write_all(data)?;
        }

        // 模板没有核心属性部件时只写入部件本身，不补关系
        if let (Some(core_xml), false) = (&core_xml, core_written) {
            zip.start_file(
                core_properties::CORE_PROPERTIES_PART,
                file_options(CompressionMethod::Deflated),
            )?;
            zip.write_all(core_xml)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// 保存到文件
    pub fn save(&self, filepath: impl AsRef<Path>) -> DocxAdapterResult<()> {
        let filepath = filepath.as_ref();
        let bytes = self.to_bytes()?;
        let mut file = File::create(filepath)?;
        file.write_all(&bytes)?;
        file.flush()?;
        log::info!("【DocxPackage::save】文件已保存到: {}", filepath.display());
        Ok(())
    }

    /// 获取 Base64 编码的文档
    pub fn to_base64(&self) -> DocxAdapterResult<String> {
        Ok(base64::encode(self.to_bytes()?))
    }
}

fn file_options(compression: CompressionMethod) -> FileOptions {
    let method = match compression {
        CompressionMethod::Stored => CompressionMethod::Stored,
        _ => CompressionMethod::Deflated,
    };
    FileOptions::default().compression_method(method)
}

/// 从 `_rels/.rels` 找到主文档部件，找不到关系时退回默认路径
fn find_document_part(entries: &[PackageEntry]) -> DocxAdapterResult<String> {
    let rels = match entries.iter().find(|entry| entry.name == PACKAGE_RELS) {
        Some(entry) => DocumentTree::parse(&entry.data)?,
        None => return Ok(DEFAULT_DOCUMENT_PART.to_string()),
    };

    let root = rels.root();
    let target = rels
        .children(root)
        .iter()
        .copied()
        .filter(|&child| rels.name(child) == Some("Relationship"))
        .find(|&child| {
            rels.attribute(child, "Type")
                .map_or(false, |t| t.ends_with(OFFICE_DOCUMENT_REL))
        })
        .and_then(|child| rels.attribute(child, "Target"));

    Ok(match target {
        Some(target) => target.trim_start_matches('/').to_string(),
        None => DEFAULT_DOCUMENT_PART.to_string(),
    })
}
