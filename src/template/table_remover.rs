use crate::docx::{DocumentTree, NodeId};

use super::table_finder::find_table;

/// 将表格从父节点的内容序列中移除
///
/// `None`、已被移除或没有父节点的表格都不做任何修改，返回 `false`。
pub fn remove_table(tree: &mut DocumentTree, table: Option<NodeId>) -> bool {
    let table = match table {
        Some(table) => table,
        None => return false,
    };
    let name = tree.table_caption(table).unwrap_or_default().to_string();

    let parent = match tree.parent(table) {
        Some(parent) => parent,
        None => {
            log::info!("【remove_table】表格 '{}' 不在文档中，忽略", name);
            return false;
        }
    };

    log::info!("【remove_table】删除表格: '{}'", name);
    let removed = tree.remove_child(parent, table);
    if removed {
        log::info!("【remove_table】表格 '{}' 已删除", name);
    }
    removed
}

/// 按标题查找并删除表格，找不到时返回 `false`
pub fn remove_table_by_id(tree: &mut DocumentTree, table_id: &str) -> bool {
    let table = find_table(tree, table_id);
    if table.is_none() {
        log::info!("【remove_table_by_id】表格 '{}' 未找到，无需删除", table_id);
    }
    remove_table(tree, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::NodeKind;

    const XML: &str = r#"<w:document xmlns:w="w"><w:body><w:tbl><w:tblPr><w:tblCaption w:val="Tabla2"/></w:tblPr><w:tr/></w:tbl><w:p><w:r><w:t>fin</w:t></w:r></w:p></w:body></w:document>"#;

    #[test]
    fn removes_table_from_body() {
        let mut tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        assert!(remove_table_by_id(&mut tree, "Tabla2"));
        assert!(tree.find_all(tree.root(), NodeKind::Table).is_empty());
        assert_eq!(tree.text(tree.root()), "fin");
    }

    #[test]
    fn missing_table_is_a_noop() {
        let mut tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        let before = tree.to_xml().unwrap();
        assert!(!remove_table_by_id(&mut tree, "Tabla3"));
        assert!(!remove_table(&mut tree, None));
        assert_eq!(tree.to_xml().unwrap(), before);
    }

    #[test]
    fn removing_twice_is_a_noop() {
        let mut tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        let table = find_table(&tree, "Tabla2");
        assert!(remove_table(&mut tree, table));
        assert!(!remove_table(&mut tree, table));
        assert_eq!(tree.text(tree.root()), "fin");
    }
}
