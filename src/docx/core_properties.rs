//! 核心属性（`docProps/core.xml`）
//!
//! 设置文档标题并更新修改时间。

use chrono::{SecondsFormat, Utc};

use super::docx_adapter::DocxAdapterResult;
use super::tree::DocumentTree;

/// 核心属性部件
pub const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

const CORE_NAMESPACES: [(&str, &str); 4] = [
    (
        "xmlns:cp",
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
    ),
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:dcterms", "http://purl.org/dc/terms/"),
    ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
];

/// 把标题写入核心属性，返回新的 XML
///
/// `existing` 为 `None` 时生成一个只包含标题和修改时间的部件。
pub fn apply_title(existing: Option<&[u8]>, title: &str) -> DocxAdapterResult<Vec<u8>> {
    let mut tree = match existing {
        Some(xml) => DocumentTree::parse(xml)?,
        None => {
            let mut tree = DocumentTree::new("cp:coreProperties");
            let root = tree.root();
            for (key, value) in CORE_NAMESPACES {
                tree.set_attribute(root, key, value);
            }
            tree
        }
    };

    set_element_text(&mut tree, "dc:title", title, &[]);

    let modified = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    set_element_text(
        &mut tree,
        "dcterms:modified",
        &modified,
        &[("xsi:type", "dcterms:W3CDTF")],
    );

    tree.to_xml()
}

fn set_element_text(tree: &mut DocumentTree, name: &str, value: &str, attributes: &[(&str, &str)]) {
    let root = tree.root();
    let element = match tree.child_element(root, name) {
        Some(element) => element,
        None => {
            let attributes = attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let element = tree.create_element(name, attributes);
            tree.append_child(root, element);
            element
        }
    };
    tree.set_text(element, value);
}
