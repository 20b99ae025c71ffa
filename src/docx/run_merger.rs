//! 文本运行合并
//!
//! Word 编辑时常把一个占位符拆进多个 `w:r`（拼写检查标记、修订 ID 不同等）。
//! 替换变量前，先把同一段落里格式相同且相邻的文本运行合并成一个，
//! 使 `{Nombre}` 这样的占位符重新落在同一个 `w:t` 中。

use super::tree::{DocumentTree, NodeData, NodeId, NodeKind};

const PROOF_ERROR: &str = "w:proofErr";
const RUN_PROPERTIES: &str = "w:rPr";

/// 修订 ID 属性（`w:rsidR`、`w:rsidRPr` 等）
fn is_revision_attribute(key: &str) -> bool {
    key.starts_with("w:rsid")
}

/// 合并整棵树中可合并的文本运行，返回被并入前一个运行的数量
pub fn merge_runs(tree: &mut DocumentTree) -> usize {
    let paragraphs = tree.find_all(tree.root(), NodeKind::Paragraph);
    let mut merged = 0;
    for paragraph in paragraphs {
        merged += merge_paragraph(tree, paragraph);
    }
    log::info!("【merge_runs】合并的文本运行数量: {}", merged);
    merged
}

fn merge_paragraph(tree: &mut DocumentTree, paragraph: NodeId) -> usize {
    let proof_errors: Vec<NodeId> = tree
        .children(paragraph)
        .iter()
        .copied()
        .filter(|&child| tree.name(child) == Some(PROOF_ERROR))
        .collect();
    for proof_error in proof_errors {
        tree.remove_child(paragraph, proof_error);
    }

    let mut merged = 0;
    let mut current: Option<(NodeId, String)> = None;
    let children = tree.children(paragraph).to_vec();

    for child in children {
        if is_blank_text(tree, child) {
            continue;
        }
        if !is_mergeable_run(tree, child) {
            current = None;
            continue;
        }

        tree.retain_attributes(child, |key| !is_revision_attribute(key));
        let signature = properties_signature(tree, child);

        match current {
            Some((target, ref target_signature)) if *target_signature == signature => {
                let text = format!("{}{}", run_text(tree, target), run_text(tree, child));
                collapse_text(tree, target, &text);
                tree.remove_child(paragraph, child);
                merged += 1;
            }
            _ => {
                let text = run_text(tree, child);
                collapse_text(tree, child, &text);
                current = Some((child, signature));
            }
        }
    }

    merged
}

fn is_blank_text(tree: &DocumentTree, id: NodeId) -> bool {
    matches!(tree.data(id), NodeData::Text(text) if text.trim().is_empty())
}

/// 只含 `w:rPr` 和至少一个 `w:t` 的运行才能合并
fn is_mergeable_run(tree: &DocumentTree, id: NodeId) -> bool {
    if tree.kind(id) != NodeKind::Run {
        return false;
    }
    let mut has_text = false;
    for &child in tree.children(id) {
        match tree.kind(child) {
            NodeKind::Text => has_text = true,
            _ if tree.name(child) == Some(RUN_PROPERTIES) => {}
            _ if is_blank_text(tree, child) => {}
            _ => return false,
        }
    }
    has_text
}

fn run_text(tree: &DocumentTree, run: NodeId) -> String {
    tree.children_of_kind(run, NodeKind::Text)
        .into_iter()
        .map(|text| tree.text(text))
        .collect()
}

/// 把运行中的所有 `w:t` 合并为第一个
fn collapse_text(tree: &mut DocumentTree, run: NodeId, text: &str) {
    let texts = tree.children_of_kind(run, NodeKind::Text);
    if let Some((&first, rest)) = texts.split_first() {
        tree.set_text(first, text);
        for &extra in rest {
            tree.remove_child(run, extra);
        }
    }
}

/// 运行属性的规范化表示，忽略修订 ID
fn properties_signature(tree: &DocumentTree, run: NodeId) -> String {
    match tree.child_element(run, RUN_PROPERTIES) {
        Some(properties) => element_signature(tree, properties),
        None => String::new(),
    }
}

fn element_signature(tree: &DocumentTree, id: NodeId) -> String {
    match tree.data(id) {
        NodeData::Element { name, attributes } => {
            let mut attributes: Vec<_> = attributes
                .iter()
                .filter(|(key, _)| !is_revision_attribute(key))
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            attributes.sort();
            let children: String = tree
                .children(id)
                .iter()
                .map(|&child| element_signature(tree, child))
                .collect();
            format!("<{} {}>{}</{}>", name, attributes.join(" "), children, name)
        }
        NodeData::Text(text) | NodeData::CData(text) => text.trim().to_string(),
        NodeData::Comment(_) => String::new(),
    }
}
