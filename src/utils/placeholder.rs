use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::models::VariableMapping;

lazy_static! {
    // 占位符：`{名称}`，名称中不含花括号
    pub static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\{([^{}]*)\}").unwrap();
}

/// 给文本中的占位符加上行号后缀
///
/// 每个 `}` 前都插入 `_<index>`，`{Table1.Column1Value}` 变成 `{Table1.Column1Value_0}`。
/// 普通文本里的 `}` 同样会被改写。
pub fn suffix_placeholders(text: &str, index: usize) -> String {
    text.replace('}', &format!("_{}}}", index))
}

/// 替换文本中的占位符，返回新文本和替换次数
///
/// 映射中没有的占位符原样保留，替换后的值不会再次被扫描。
pub fn replace_placeholders(text: &str, variables: &VariableMapping) -> (String, usize) {
    let mut count = 0;
    let replaced = PLACEHOLDER_REGEX.replace_all(text, |caps: &Captures| {
        match variables.get(&caps[1]) {
            Some(value) => {
                count += 1;
                value.to_string()
            }
            None => caps[0].to_string(),
        }
    });
    (replaced.into_owned(), count)
}
