use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// 表格前缀的默认值，表格变量形如 `Table1.Column1Value_0`
pub const DEFAULT_TABLE_PREFIX: &str = "Table";

/// 变量映射：占位符名称 → 替换值
///
/// 按键排序，保证表格的发现顺序稳定。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableMapping {
    values: BTreeMap<String, String>,
}

impl VariableMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 表格 `table_id` 的所有变量键（`<table_id>.` 开头）
    pub fn table_keys<'a>(&'a self, table_id: &str) -> impl Iterator<Item = &'a str> + 'a {
        let prefix = format!("{}.", table_id);
        self.keys().filter(move |key| key.starts_with(&prefix))
    }

    /// 需要展开的表格 ID，去重并按键顺序排列
    pub fn table_ids(&self, table_prefix: &str) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for key in self.keys() {
            if let Some(id) = table_id_of(key, table_prefix) {
                if !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
        }
        ids
    }

    /// 从 JSON 文本构建，支持嵌套对象和数组
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(Self::from_json_value(&value))
    }

    /// 从 JSON 文件构建
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, VariablesFileError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&content)?)
    }

    pub fn from_json_value(value: &serde_json::Value) -> Self {
        let mut mapping = VariableMapping::new();
        flatten_json(value, "", &mut mapping.values);
        mapping
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = VariableMapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

/// 变量文件读取错误
#[derive(thiserror::Error, Debug)]
pub enum VariablesFileError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 表格变量的表格 ID（第一个 `.` 之前的部分）
///
/// 键以表格前缀开头并包含 `.` 时才是表格变量，否则返回 `None`。
pub fn table_id_of<'a>(key: &'a str, table_prefix: &str) -> Option<&'a str> {
    if !key.starts_with(table_prefix) {
        return None;
    }
    key.split_once('.').map(|(id, _)| id).filter(|id| !id.is_empty())
}

/// 将嵌套的 JSON 转换为扁平的键值对
///
/// 例如，将以下 JSON：
/// ```json
/// {
///     "Customer Name": "Pepito",
///     "Table1": [
///         { "Column1Value": "Pepito" },
///         { "Column1Value": "Juanito" }
///     ]
/// }
/// ```
///
/// 转换为：
/// ```text
/// "Customer Name" => "Pepito"
/// "Table1.Column1Value_0" => "Pepito"
/// "Table1.Column1Value_1" => "Juanito"
/// ```
fn flatten_json(value: &serde_json::Value, prefix: &str, result: &mut BTreeMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_json(val, &new_prefix, result);
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                match val {
                    // 对象数组：每个元素是表格的一行，行号后缀始终在键的最后
                    serde_json::Value::Object(row) => {
                        for (column, cell) in row {
                            let mut cells = BTreeMap::new();
                            flatten_json(cell, &format!("{}.{}", prefix, column), &mut cells);
                            for (key, value) in cells {
                                result.insert(format!("{}_{}", key, i), value);
                            }
                        }
                    }
                    _ => flatten_json(val, &format!("{}_{}", prefix, i), result),
                }
            }
        }
        serde_json::Value::String(s) => {
            result.insert(prefix.to_string(), s.clone());
        }
        serde_json::Value::Number(n) => {
            result.insert(prefix.to_string(), n.to_string());
        }
        serde_json::Value::Bool(b) => {
            result.insert(prefix.to_string(), b.to_string());
        }
        serde_json::Value::Null => {
            result.insert(prefix.to_string(), String::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_table_ids_once() {
        let vars: VariableMapping = [
            ("Customer Name", "Federico"),
            ("Table1.Column1Value_0", "Pepito"),
            ("Table1.Column2Value_0", "Perez"),
            ("Table2.Amount_0", "10"),
            ("Table", "no es tabla"),
        ]
        .into_iter()
        .collect();

        assert_eq!(vars.table_ids(DEFAULT_TABLE_PREFIX), vec!["Table1", "Table2"]);
        assert_eq!(table_id_of("Table1.Column1Value_0", DEFAULT_TABLE_PREFIX), Some("Table1"));
        assert_eq!(table_id_of("Customer Name", DEFAULT_TABLE_PREFIX), None);
        assert_eq!(table_id_of("Table", DEFAULT_TABLE_PREFIX), None);
    }

    #[test]
    fn table_keys_do_not_leak_between_similar_ids() {
        let vars: VariableMapping = [("Table1.A_0", "x"), ("Table10.A_5", "y")]
            .into_iter()
            .collect();
        assert_eq!(vars.table_keys("Table1").collect::<Vec<_>>(), vec!["Table1.A_0"]);
    }

    #[test]
    fn flattens_flat_and_nested_json() {
        let json = r#"{
            "Customer Name": "Federico",
            "Credit Card Limit": 150,
            "Active": true,
            "Notes": null,
            "Table1": [
                {"Column1Value": "Pepito", "Column4Value": "50.000"},
                {"Column1Value": "Juanito", "Column4Value": "75.000"}
            ],
            "Table2": {"Total_0": "1"},
            "Tags": ["a", "b"]
        }"#;
        let vars = VariableMapping::from_json_str(json).unwrap();

        assert_eq!(vars.get("Customer Name"), Some("Federico"));
        assert_eq!(vars.get("Credit Card Limit"), Some("150"));
        assert_eq!(vars.get("Active"), Some("true"));
        assert_eq!(vars.get("Notes"), Some(""));
        assert_eq!(vars.get("Table1.Column1Value_0"), Some("Pepito"));
        assert_eq!(vars.get("Table1.Column4Value_1"), Some("75.000"));
        assert_eq!(vars.get("Table2.Total_0"), Some("1"));
        assert_eq!(vars.get("Tags_1"), Some("b"));
        assert_eq!(vars.len(), 11);
    }

    #[test]
    fn nested_row_objects_keep_row_suffix_last() {
        let json = r#"{"Table1": [
            {"Amount": {"value": 10, "currency": "EUR"}, "Name": "Pepito"},
            {"Amount": {"value": 20, "currency": "USD"}, "Name": "Juanito"}
        ]}"#;
        let vars = VariableMapping::from_json_str(json).unwrap();

        assert_eq!(vars.get("Table1.Amount.value_0"), Some("10"));
        assert_eq!(vars.get("Table1.Amount.currency_1"), Some("USD"));
        assert_eq!(vars.get("Table1.Name_1"), Some("Juanito"));
        assert_eq!(crate::template::resolve_row_count("Table1", &vars).unwrap(), 2);
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(VariableMapping::from_json_str("{not json").is_err());
    }
}
