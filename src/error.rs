/// 推断错误的 Result 别名
pub type Result<T> = std::result::Result<T, InferenceError>;

/// 模板推断失败的原因，调用方一律回退到单文件解析器
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// 合并后的模板无法完整匹配某个文件名
    #[error("template {template:?} does not match {name:?}")]
    InvalidTemplate { template: String, name: String },

    /// 变量频率无法区分出季和集
    #[error("ambiguous classification: {0}")]
    Ambiguous(String),

    #[error("regex error: {0}")]
    Pattern(#[from] regex::Error),
}

impl InferenceError {
    pub fn ambiguous(reason: impl Into<String>) -> Self {
        Self::Ambiguous(reason.into())
    }
}
