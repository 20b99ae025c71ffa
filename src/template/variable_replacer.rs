use crate::docx::{DocumentTree, NodeKind};
use crate::models::VariableMapping;
use crate::utils::replace_placeholders;

/// 在整棵文档树中替换占位符，返回替换次数
///
/// 必须在所有表格展开之后调用，展开时生成的 `{Table1.Column1Value_0}`
/// 这样的名称才能匹配到变量。映射中没有的占位符保持原样。
pub fn substitute(tree: &mut DocumentTree, variables: &VariableMapping) -> usize {
    let mut total = 0;
    for text in tree.find_all(tree.root(), NodeKind::Text) {
        let value = tree.text(text);
        let (new_value, count) = replace_placeholders(&value, variables);
        if count > 0 {
            tree.set_text(text, &new_value);
            total += count;
        }
    }
    log::info!("【substitute】替换的占位符数量: {}", total);
    total
}
