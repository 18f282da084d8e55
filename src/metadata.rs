use serde::Serialize;

const COSMETIC_CHARS: &[char] = &[' ', '-', '_', '/', '\\', '*', '.', '\''];

/// 单个路径的季/集标签
///
/// 非视频文件两个字段都为空；视频文件的 `episode` 一定非空，`season` 可以为空
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EpisodeMetadata {
    pub season: String,
    pub episode: String,
}

impl EpisodeMetadata {
    pub fn new(season: impl Into<String>, episode: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            episode: episode.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.season.is_empty() && self.episode.is_empty()
    }
}

/// 清理提取值两端的分隔符和空白
pub fn post_clean(value: &str) -> String {
    value.trim_matches(COSMETIC_CHARS).trim().to_string()
}

pub(crate) fn is_blank_capture(value: &str) -> bool {
    value.chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_clean_strips_delimiters() {
        assert_eq!(post_clean(" - 01 _"), "01");
        assert_eq!(post_clean("'X2 Ketsu'."), "X2 Ketsu");
        assert_eq!(post_clean("/Season 2\\"), "Season 2");
    }

    #[test]
    fn test_post_clean_keeps_inner_text() {
        assert_eq!(post_clean("12.5"), "12.5");
        assert_eq!(post_clean("07v2"), "07v2");
    }

    #[test]
    fn test_post_clean_trims_unicode_whitespace() {
        assert_eq!(post_clean("\u{3000}第01话\u{3000}"), "第01话");
    }

    #[test]
    fn test_blank_capture() {
        assert!(is_blank_capture(""));
        assert!(is_blank_capture("  \t"));
        assert!(!is_blank_capture(" 1 "));
    }
}
