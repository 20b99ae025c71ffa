//! 表格行的动态生成
//!
//! 表格的第 2 行（下标 1）是模板行。按变量中出现的最大行号克隆模板行，
//! 给克隆行中的占位符加上 `_<行号>` 后缀，最后删除模板行。

use std::collections::BTreeSet;

use crate::docx::{DocumentTree, NodeId, NodeKind};
use crate::models::VariableMapping;
use crate::utils::suffix_placeholders;

use super::template_generator::{TemplateError, TemplateResult};

/// 模板行在表格行序列中的位置（第 1 行通常是表头）
pub const TEMPLATE_ROW_INDEX: usize = 1;

/// 根据变量的行号后缀计算表格需要生成的行数
///
/// 取表格变量键最后一个 `_` 之后的整数，返回最大值加一；
/// 行号不连续时缺失的行也会生成。没有变量时返回 0。
/// 行号必须能放进 `u32`，否则视为格式错误。
pub fn resolve_row_count(table_id: &str, variables: &VariableMapping) -> TemplateResult<usize> {
    let mut suffixes = BTreeSet::new();
    for key in variables.table_keys(table_id) {
        let suffix = key
            .rsplit_once('_')
            .map(|(_, suffix)| suffix)
            .ok_or_else(|| malformed(table_id, key))?;
        let index: u32 = suffix.parse().map_err(|_| malformed(table_id, key))?;
        suffixes.insert((index, key));
    }
    match suffixes.iter().next_back() {
        Some(&(max, key)) => usize::try_from(max)
            .ok()
            .and_then(|max| max.checked_add(1))
            .ok_or_else(|| malformed(table_id, key)),
        None => Ok(0),
    }
}

fn malformed(table_id: &str, key: &str) -> TemplateError {
    TemplateError::MalformedRowSuffixKey {
        table_id: table_id.to_string(),
        key: key.to_string(),
    }
}

/// 表格的行
pub fn rows(tree: &DocumentTree, table: NodeId) -> Vec<NodeId> {
    tree.children_of_kind(table, NodeKind::Row)
}

/// 当前处于模板行位置的行；行数不足 2 时返回 `None`
pub fn template_row(tree: &DocumentTree, table: NodeId) -> Option<NodeId> {
    rows(tree, table).get(TEMPLATE_ROW_INDEX).copied()
}

/// 克隆模板行 `num_lines` 次并删除模板行，返回生成的行数
///
/// 表格少于 2 行时不做任何修改。再次调用会把当前位于下标 1 的行当作模板。
pub fn expand_rows(tree: &mut DocumentTree, table: NodeId, num_lines: usize) -> usize {
    log::info!(
        "【expand_rows】表格: '{}'. 需要生成的行数: {}",
        tree.table_caption(table).unwrap_or_default(),
        num_lines
    );

    let template = match template_row(tree, table) {
        Some(row) => row,
        None => {
            log::info!("【expand_rows】表格没有模板行，跳过");
            return 0;
        }
    };

    for line in 0..num_lines {
        let working_row = tree.deep_clone(template);
        rewrite_row(tree, working_row, line);
        let position = insertion_point(tree, table);
        tree.insert_child(table, position, working_row);
    }

    tree.remove_child(table, template);
    num_lines
}

/// 紧跟在最后一行之后的位置
fn insertion_point(tree: &DocumentTree, table: NodeId) -> usize {
    let children = tree.children(table);
    children
        .iter()
        .rposition(|&child| tree.kind(child) == NodeKind::Row)
        .map_or(children.len(), |last| last + 1)
}

/// 改写行中所有文本的占位符
fn rewrite_row(tree: &mut DocumentTree, row: NodeId, line: usize) {
    log::debug!("【rewrite_row】改写第 {} 行", line);
    for text in tree.find_all(row, NodeKind::Text) {
        let value = tree.text(text);
        if !value.contains('}') {
            continue;
        }
        let new_value = suffix_placeholders(&value, line);
        log::debug!("【rewrite_row】当前值: '{}' 新值: '{}'", value, new_value);
        tree.set_text(text, &new_value);
    }
}
