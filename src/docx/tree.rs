//! 文档树
//!
//! 将 WordprocessingML 部件（如 `word/document.xml`）解析为一棵可变的节点树。
//! 节点保存在一个 arena 中，父节点独占子节点列表，子节点只保留指向父节点的
//! 反向引用，用于查找和摘除。被摘除的节点仍留在 arena 中，但从根节点不可达。

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::docx_adapter::{DocxAdapterError, DocxAdapterResult};

/// WordprocessingML 命名空间前缀
pub const WORD_PREFIX: &str = "w";

/// 节点 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// 文档正文 `w:body`
    Body,
    /// 表格 `w:tbl`
    Table,
    /// 表格行 `w:tr`
    Row,
    /// 单元格 `w:tc`
    Cell,
    /// 段落 `w:p`
    Paragraph,
    /// 文本运行 `w:r`
    Run,
    /// 文本 `w:t`
    Text,
    /// 其他元素或字符数据
    Other,
}

impl NodeKind {
    fn from_name(name: &str) -> Self {
        match name.split_once(':') {
            Some((WORD_PREFIX, local)) => match local {
                "body" => NodeKind::Body,
                "tbl" => NodeKind::Table,
                "tr" => NodeKind::Row,
                "tc" => NodeKind::Cell,
                "p" => NodeKind::Paragraph,
                "r" => NodeKind::Run,
                "t" => NodeKind::Text,
                _ => NodeKind::Other,
            },
            _ => NodeKind::Other,
        }
    }
}

/// 节点数据
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// 元素，名称带前缀（如 `w:tbl`）
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// 字符数据（已反转义）
    Text(String),
    /// CDATA 段
    CData(String),
    /// 注释
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// 文档树
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    root: NodeId,
}

fn xml_error(err: impl std::fmt::Display) -> DocxAdapterError {
    DocxAdapterError::XmlError(err.to_string())
}

impl DocumentTree {
    /// 创建只有一个根元素的树
    pub fn new(root_name: &str) -> Self {
        let mut tree = DocumentTree {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.create_element(root_name, Vec::new());
        tree
    }

    /// 从 XML 字节解析
    pub fn parse(xml: &[u8]) -> DocxAdapterResult<Self> {
        let mut reader = Reader::from_reader(xml);
        let mut tree = DocumentTree {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let mut root = None;
        let mut stack: Vec<NodeId> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                DocxAdapterError::XmlError(format!("{} (位置 {})", e, reader.buffer_position()))
            })?;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let (name, attributes) = element_parts(e)?;
                    let id = tree.create_element(&name, attributes);
                    match stack.last() {
                        Some(&parent) => tree.append_child(parent, id),
                        None if root.is_none() => root = Some(id),
                        None => return Err(xml_error("存在多个根元素")),
                    }
                    if matches!(event, Event::Start(_)) {
                        stack.push(id);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(ref t) => {
                    if let Some(&parent) = stack.last() {
                        let text = t.unescape().map_err(xml_error)?.into_owned();
                        let id = tree.push(NodeData::Text(text));
                        tree.append_child(parent, id);
                    }
                }
                Event::CData(ref c) => {
                    if let Some(&parent) = stack.last() {
                        let text = String::from_utf8_lossy(c).into_owned();
                        let id = tree.push(NodeData::CData(text));
                        tree.append_child(parent, id);
                    }
                }
                Event::Comment(ref c) => {
                    if let Some(&parent) = stack.last() {
                        let text = String::from_utf8_lossy(c).into_owned();
                        let id = tree.push(NodeData::Comment(text));
                        tree.append_child(parent, id);
                    }
                }
                Event::Eof => break,
                // 声明、处理指令和 DOCTYPE 在序列化时重新生成
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(xml_error("XML 元素未闭合"));
        }

        tree.root = root.ok_or_else(|| xml_error("XML 中没有根元素"))?;
        Ok(tree)
    }

    /// 序列化为 XML 字节
    pub fn to_xml(&self) -> DocxAdapterResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        self.write_node(&mut writer, self.root)?;
        Ok(writer.into_inner())
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> DocxAdapterResult<()> {
        let node = &self.nodes[id.0];
        match &node.data {
            NodeData::Element { name, attributes } => {
                let mut start = BytesStart::new(name.as_str());
                for (key, value) in attributes {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                if node.children.is_empty() {
                    writer.write_event(Event::Empty(start)).map_err(xml_error)?;
                } else {
                    writer.write_event(Event::Start(start)).map_err(xml_error)?;
                    for &child in &node.children {
                        self.write_node(writer, child)?;
                    }
                    writer
                        .write_event(Event::End(BytesEnd::new(name.as_str())))
                        .map_err(xml_error)?;
                }
            }
            NodeData::Text(text) => {
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(xml_error)?;
            }
            NodeData::CData(text) => {
                writer
                    .write_event(Event::CData(BytesCData::new(text.as_str())))
                    .map_err(xml_error)?;
            }
            NodeData::Comment(text) => {
                writer
                    .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                    .map_err(xml_error)?;
            }
        }
        Ok(())
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let kind = match &data {
            NodeData::Element { name, .. } => NodeKind::from_name(name),
            _ => NodeKind::Other,
        };
        self.nodes.push(Node {
            data,
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// 创建一个未挂载的元素
    pub fn create_element(&mut self, name: &str, attributes: Vec<(String, String)>) -> NodeId {
        self.push(NodeData::Element {
            name: name.to_string(),
            attributes,
        })
    }

    /// 创建一个未挂载的字符数据节点
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    /// 元素名称（带前缀），非元素返回 `None`
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// 指定名称的第一个子元素
    pub fn child_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.name(child) == Some(name))
    }

    /// 指定类型的子节点
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.kind(child) == kind)
            .collect()
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            match attributes.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.to_string(),
                None => attributes.push((key.to_string(), value.to_string())),
            }
        }
    }

    /// 按条件删除属性，返回删除数量
    pub fn retain_attributes(&mut self, id: NodeId, keep: impl Fn(&str) -> bool) -> usize {
        match &mut self.nodes[id.0].data {
            NodeData::Element { attributes, .. } => {
                let before = attributes.len();
                attributes.retain(|(k, _)| keep(k));
                before - attributes.len()
            }
            _ => 0,
        }
    }

    /// 深度优先（先序）遍历 `id` 为根的子树，包含 `id` 本身
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// 子树中指定类型的所有节点，保持文档顺序
    pub fn find_all(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.kind(node) == kind)
            .collect()
    }

    /// 文档正文节点
    pub fn body(&self) -> Option<NodeId> {
        self.find_all(self.root, NodeKind::Body).into_iter().next()
    }

    /// 节点下所有字符数据拼接后的文本
    pub fn text(&self, id: NodeId) -> String {
        let mut result = String::new();
        for node in self.descendants(id) {
            match &self.nodes[node.0].data {
                NodeData::Text(text) | NodeData::CData(text) => result.push_str(text),
                _ => {}
            }
        }
        result
    }

    /// 替换 `w:t` 等元素的文本内容
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        let old_children = std::mem::take(&mut self.nodes[id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            let text = self.create_text(value);
            self.append_child(id, text);
        }
        // 首尾空白需要 xml:space="preserve" 才不会被 Word 丢弃
        if self.kind(id) == NodeKind::Text && value.trim() != value {
            self.set_attribute(id, "xml:space", "preserve");
        }
    }

    /// 深拷贝子树，返回未挂载的新根节点
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let data = self.nodes[id.0].data.clone();
        let copy = self.push(data);
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// 追加子节点；若子节点已挂载，先从原父节点摘除
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// 在指定位置插入子节点
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// 从父节点的内容序列中移除子节点，不在其中时返回 `false`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent.0].children;
        match children.iter().position(|&c| c == child) {
            Some(index) => {
                children.remove(index);
                if self.nodes[child.0].parent == Some(parent) {
                    self.nodes[child.0].parent = None;
                }
                true
            }
            None => false,
        }
    }

    /// 把节点从父节点摘除，没有父节点时返回 `false`
    pub fn detach(&mut self, id: NodeId) -> bool {
        match self.nodes[id.0].parent {
            Some(parent) => self.remove_child(parent, id),
            None => false,
        }
    }

    /// 节点是否仍可从根节点到达
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// 表格标题（表格属性 → 可选文字 → 标题）
    pub fn table_caption(&self, table: NodeId) -> Option<&str> {
        let properties = self.child_element(table, "w:tblPr")?;
        let caption = self.child_element(properties, "w:tblCaption")?;
        self.attribute(caption, "w:val")
    }

    /// 设置表格标题，缺少 `w:tblPr` 时创建
    pub fn set_table_caption(&mut self, table: NodeId, caption: &str) {
        let properties = match self.child_element(table, "w:tblPr") {
            Some(properties) => properties,
            None => {
                let properties = self.create_element("w:tblPr", Vec::new());
                self.insert_child(table, 0, properties);
                properties
            }
        };
        match self.child_element(properties, "w:tblCaption") {
            Some(existing) => self.set_attribute(existing, "w:val", caption),
            None => {
                let element = self.create_element(
                    "w:tblCaption",
                    vec![("w:val".to_string(), caption.to_string())],
                );
                self.append_child(properties, element);
            }
        }
    }
}

fn element_parts(e: &BytesStart) -> DocxAdapterResult<(String, Vec<(String, String)>)> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        attributes.push((key, value));
    }
    Ok((name, attributes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:tbl><w:tblPr><w:tblCaption w:val="Table1"/></w:tblPr><w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:p><w:r><w:t xml:space="preserve">{Table1.Name} &amp; co</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body></w:document>"#;

    #[test]
    fn parses_kinds_and_caption() {
        let tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        let body = tree.body().unwrap();
        assert_eq!(tree.kind(body), NodeKind::Body);

        let tables = tree.find_all(tree.root(), NodeKind::Table);
        assert_eq!(tables.len(), 1);
        assert_eq!(tree.table_caption(tables[0]), Some("Table1"));
        assert_eq!(tree.children_of_kind(tables[0], NodeKind::Row).len(), 2);

        let texts = tree.find_all(tree.root(), NodeKind::Text);
        assert_eq!(tree.text(texts[1]), "{Table1.Name} & co");
    }

    #[test]
    fn serializes_back_with_escaping() {
        let tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        let xml = String::from_utf8(tree.to_xml().unwrap()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains("{Table1.Name} &amp; co"));
        assert!(xml.contains(r#"<w:tblCaption w:val="Table1"/>"#));

        let reparsed = DocumentTree::parse(&tree.to_xml().unwrap()).unwrap();
        assert_eq!(reparsed.text(reparsed.root()), tree.text(tree.root()));
    }

    #[test]
    fn deep_clone_does_not_alias() {
        let mut tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        let table = tree.find_all(tree.root(), NodeKind::Table)[0];
        let row = tree.children_of_kind(table, NodeKind::Row)[1];
        let copy = tree.deep_clone(row);
        assert_eq!(tree.parent(copy), None);

        let copy_text = tree.find_all(copy, NodeKind::Text)[0];
        tree.set_text(copy_text, "changed");

        let original_text = tree.find_all(row, NodeKind::Text)[0];
        assert_ne!(copy_text, original_text);
        assert_eq!(tree.text(original_text), "{Table1.Name} & co");
    }

    #[test]
    fn detach_is_noop_without_parent() {
        let mut tree = DocumentTree::parse(XML.as_bytes()).unwrap();
        let table = tree.find_all(tree.root(), NodeKind::Table)[0];
        assert!(tree.detach(table));
        assert!(!tree.is_attached(table));
        assert!(!tree.detach(table));
        assert!(tree.find_all(tree.root(), NodeKind::Table).is_empty());
    }

    #[test]
    fn set_caption_creates_properties() {
        let mut tree = DocumentTree::new("w:tbl");
        let table = tree.root();
        tree.set_table_caption(table, "Orders");
        assert_eq!(tree.table_caption(table), Some("Orders"));
        tree.set_table_caption(table, "Lines");
        assert_eq!(tree.table_caption(table), Some("Lines"));
        assert_eq!(tree.children(table).len(), 1);
    }

    #[test]
    fn rejects_malformed_xml() {
        assert!(DocumentTree::parse(b"<w:document><w:body>").is_err());
        assert!(DocumentTree::parse(b"").is_err());
    }
}
