use crate::docx::{DocumentTree, NodeId, NodeKind};

/// 按标题查找表格
///
/// 深度优先遍历整棵文档树（包括嵌套在单元格、内容控件中的表格），
/// 返回第一个标题非空且与 `table_id` 完全相同（区分大小写）的表格。
/// 找不到时返回 `None`，这不是错误。
pub fn find_table(tree: &DocumentTree, table_id: &str) -> Option<NodeId> {
    log::info!("【find_table】查找表格 '{}'", table_id);
    let found = tree
        .find_all(tree.root(), NodeKind::Table)
        .into_iter()
        .find(|&table| is_this_table(tree, table, table_id));
    if found.is_some() {
        log::info!("【find_table】找到表格 '{}'", table_id);
    }
    found
}

/// 表格的标题是否等于 `table_id`
pub fn is_this_table(tree: &DocumentTree, table: NodeId, table_id: &str) -> bool {
    match tree.table_caption(table) {
        Some(caption) => !caption.is_empty() && caption == table_id,
        None => false,
    }
}

/// 文档中所有可从根节点到达的表格及其标题
pub fn tables(tree: &DocumentTree) -> Vec<(NodeId, Option<String>)> {
    tree.find_all(tree.root(), NodeKind::Table)
        .into_iter()
        .map(|table| (table, tree.table_caption(table).map(str::to_string)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<w:document xmlns:w="w"><w:body>
<w:tbl><w:tblPr><w:tblCaption w:val=""/></w:tblPr><w:tr/></w:tbl>
<w:tbl><w:tblPr/><w:tr/></w:tbl>
<w:tbl><w:tblPr><w:tblCaption w:val="Table1"/></w:tblPr><w:tr><w:tc>
  <w:tbl><w:tblPr><w:tblCaption w:val="Inner"/></w:tblPr><w:tr/></w:tbl>
</w:tc></w:tr></w:tbl>
<w:tbl><w:tblPr><w:tblCaption w:val="Table1"/></w:tblPr></w:tbl>
</w:body></w:document>"#;

    #[test]
    fn returns_first_exact_match() {
        let tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        let all = tables(&tree);
        assert_eq!(all.len(), 5);

        let found = find_table(&tree, "Table1").unwrap();
        assert_eq!(found, all[2].0);
    }

    #[test]
    fn finds_nested_tables() {
        let tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        let inner = find_table(&tree, "Inner").unwrap();
        assert_eq!(tree.table_caption(inner), Some("Inner"));
    }

    #[test]
    fn match_is_exact_and_case_sensitive() {
        let tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        assert!(find_table(&tree, "table1").is_none());
        assert!(find_table(&tree, "Table").is_none());
        assert!(find_table(&tree, "").is_none());
    }

    #[test]
    fn detached_tables_are_not_found() {
        let mut tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        let first = find_table(&tree, "Table1").unwrap();
        tree.detach(first);
        let second = find_table(&tree, "Table1").unwrap();
        assert_ne!(first, second);
        assert!(find_table(&tree, "Inner").is_none());
    }
}
