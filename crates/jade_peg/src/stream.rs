//! Token Stream
//!
//! 引擎的输入：分词器产出的工作文本，以及工作文本偏移到源码偏移的映射。
//! 词法层负责拼接工作文本（只在两个词形字符相邻处补一个空格），
//! 引擎按字符匹配工作文本，错误位置再映射回源码。

/// 引擎输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    work: String,
    /// (工作文本偏移, 源码偏移)，按记号起点排列、单调递增
    map: Vec<(usize, usize)>,
}

impl TokenStream {
    /// 由工作文本与偏移映射构造
    pub fn new(work: String, map: Vec<(usize, usize)>) -> Self {
        Self { work, map }
    }

    /// 恒等映射：工作文本就是源码（测试与简单语法用）
    pub fn raw(text: &str) -> Self {
        Self {
            work: text.to_string(),
            map: vec![(0, 0)],
        }
    }

    /// 工作文本
    pub fn work(&self) -> &str {
        &self.work
    }

    /// 工作文本偏移映射回源码字节偏移
    pub fn source_offset(&self, work_offset: usize) -> usize {
        match self
            .map
            .binary_search_by_key(&work_offset, |&(work, _)| work)
        {
            Ok(idx) => self.map[idx].1,
            Err(0) => work_offset,
            Err(idx) => {
                let (work, source) = self.map[idx - 1];
                source + (work_offset - work)
            }
        }
    }
}
