//! Match Values
//!
//! 规则匹配产生的结构化值，供语义回调消费。
//! `N` 是调用方的语义节点类型（语言层用 AST 表达式实例化）。

/// 匹配值
#[derive(Debug, Clone, PartialEq)]
pub enum Value<N> {
    /// 无值：空可选项、前瞻、未捕获
    Nothing,
    /// 匹配到的文本（字面量、字符类）
    Text(String),
    /// 有序捕获序列（序列、重复）
    Seq(Vec<Value<N>>),
    /// 标签捕获：序列中出现 `label:expr` 时只保留带标签的成员
    Tagged(Vec<(String, Value<N>)>),
    /// 语义回调构造的节点
    Node(N),
}

impl<N> Value<N> {
    /// 是否为空值
    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }

    /// 按标签取捕获值
    pub fn get(&self, label: &str) -> Option<&Value<N>> {
        match self {
            Value::Tagged(pairs) => pairs.iter().find(|(l, _)| l == label).map(|(_, v)| v),
            _ => None,
        }
    }

    /// 序列成员；非序列返回空切片
    pub fn items(&self) -> &[Value<N>] {
        match self {
            Value::Seq(items) => items,
            _ => &[],
        }
    }

    /// 递归拼接所有文本叶子
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Value::Text(s) => out.push_str(s),
            Value::Seq(items) => {
                for item in items {
                    item.collect_text(out);
                }
            }
            Value::Tagged(pairs) => {
                for (_, v) in pairs {
                    v.collect_text(out);
                }
            }
            Value::Nothing | Value::Node(_) => {}
        }
    }

    /// 借用语义节点
    pub fn node(&self) -> Option<&N> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    /// 取出语义节点
    pub fn into_node(self) -> Option<N> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    /// 取出序列成员
    pub fn into_items(self) -> Vec<Value<N>> {
        match self {
            Value::Seq(items) => items,
            Value::Nothing => Vec::new(),
            other => vec![other],
        }
    }
}
