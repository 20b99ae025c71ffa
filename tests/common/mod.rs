#![allow(dead_code)]

use std::io::{Cursor, Write};

use docx_template_rust::{DocumentTree, NodeId, NodeKind, VariableMapping};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

const CORE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>Plantilla</dc:title><dc:creator>Arming</dc:creator></cp:coreProperties>"#;

/// 段落
pub fn paragraph(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        text
    )
}

/// 带标题的表格，每个元素是一行，行内每个元素是一个单元格
pub fn table(caption: Option<&str>, rows: &[&[&str]]) -> String {
    let caption = caption
        .map(|c| format!(r#"<w:tblCaption w:val="{}"/>"#, c))
        .unwrap_or_default();
    let rows: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells
                .iter()
                .map(|text| format!("<w:tc>{}</w:tc>", paragraph(text)))
                .collect();
            format!("<w:tr>{}</w:tr>", cells)
        })
        .collect();
    format!(
        r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/>{}</w:tblPr><w:tblGrid><w:gridCol w:w="2000"/></w:tblGrid>{}</w:tbl>"#,
        caption, rows
    )
}

/// 完整的 `word/document.xml`
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
        body
    )
}

/// 用正文构建一个完整的 DOCX 包
pub fn build_docx(body: &str) -> Vec<u8> {
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/document.xml", document_xml(body)),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("docProps/core.xml", CORE.to_string()),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts.iter() {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// 类似原始账单模板的正文
pub fn statement_body() -> String {
    let mut body = String::new();
    body.push_str(paragraph("Cliente: {Customer Name}").as_str());
    // 被拼写检查拆开的占位符
    body.push_str(r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Email: {Customer </w:t></w:r><w:proofErr w:type="spellStart"/><w:r><w:rPr><w:b/></w:rPr><w:t>Email}</w:t></w:r><w:proofErr w:type="spellEnd"/></w:p>"#);
    body.push_str(&table(
        Some("Table1"),
        &[
            &["Nombre", "Apellido", "Segundo", "Importe"],
            &[
                "{Table1.Column1Value}",
                "{Table1.Column2Value}",
                "{Table1.Column3Value}",
                "{Table1.Column4Value}",
            ],
        ],
    ));
    body.push_str(&table(Some("Tabla2"), &[&["Borrar"], &["{Tabla2.X}"]]));
    body.push_str(&table(None, &[&["Sin titulo"], &["{Website URL}"]]));
    body.push_str(paragraph("Saldo: {New Balance} {Unknown}").as_str());
    body
}

pub fn statement_variables() -> VariableMapping {
    [
        ("Customer Name", "Federico Jimenez"),
        ("Customer Email", "info@soyou.es"),
        ("Website URL", "http://soyou.es"),
        ("New Balance", "250€"),
        ("Table1.Column1Value_0", "Pepito"),
        ("Table1.Column2Value_0", "Perez"),
        ("Table1.Column3Value_0", "Gonzalez"),
        ("Table1.Column4Value_0", "50.000"),
        ("Table1.Column1Value_1", "Juanito"),
        ("Table1.Column2Value_1", "Muñoz"),
        ("Table1.Column3Value_1", "Rodriguez"),
        ("Table1.Column4Value_1", "75.000"),
        ("Table1.Column1Value_2", "Fulanito"),
        ("Table1.Column2Value_2", "Menganez"),
        ("Table1.Column3Value_2", "Jimenez"),
        ("Table1.Column4Value_2", "45.000"),
    ]
    .into_iter()
    .collect()
}

/// 表格每一行的单元格文本
pub fn table_rows(tree: &DocumentTree, table: NodeId) -> Vec<Vec<String>> {
    tree.children_of_kind(table, NodeKind::Row)
        .into_iter()
        .map(|row| {
            tree.children_of_kind(row, NodeKind::Cell)
                .into_iter()
                .map(|cell| tree.text(cell))
                .collect()
        })
        .collect()
}

/// 所有段落文本（不含表格内的段落）
pub fn body_paragraphs(tree: &DocumentTree) -> Vec<String> {
    let body = tree.body().unwrap();
    tree.children_of_kind(body, NodeKind::Paragraph)
        .into_iter()
        .map(|p| tree.text(p))
        .collect()
}
