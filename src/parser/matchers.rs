use regex::Regex;

/// 匹配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub season: String,
    pub episode: String,
}

/// 匹配器 trait - 责任链中的一环
pub trait Matcher: Send + Sync {
    fn try_match(&self, text: &str) -> Option<MatchResult>;

    fn priority(&self) -> u32;

    /// 用于调试
    fn name(&self) -> &str;
}

/// 责任链管理器
pub struct MatcherChain {
    matchers: Vec<Box<dyn Matcher>>,
}

impl MatcherChain {
    pub fn new() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    pub fn add_matcher(mut self, matcher: Box<dyn Matcher>) -> Self {
        self.matchers.push(matcher);
        // 按优先级排序
        self.matchers.sort_by_key(|m| m.priority());
        self
    }

    /// 执行匹配链，返回第一个成功的匹配及匹配器名称
    pub fn execute(&self, text: &str) -> Option<(&str, MatchResult)> {
        for matcher in &self.matchers {
            if let Some(result) = matcher.try_match(text) {
                return Some((matcher.name(), result));
            }
        }
        None
    }
}

/// 01x06 格式，季数必须小于 100，避免把 1920x1080 当成季集
pub struct CrossMatcher {
    regex: Regex,
}

impl CrossMatcher {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(r"(?i)(\d+)\s*x\s*(\d+)").unwrap(),
        }
    }
}

impl Matcher for CrossMatcher {
    fn try_match(&self, text: &str) -> Option<MatchResult> {
        let cap = self.regex.captures(text)?;
        let season = cap.get(1)?.as_str();
        if season.parse::<u32>().ok()? >= 100 {
            return None;
        }
        Some(MatchResult {
            season: season.to_string(),
            episode: cap.get(2)?.as_str().to_string(),
        })
    }

    fn priority(&self) -> u32 {
        1
    }
    fn name(&self) -> &str {
        "Cross(01x06)"
    }
}

/// E06 S01 格式（集在前）
pub struct EpisodeSeasonMatcher {
    regex: Regex,
}

impl EpisodeSeasonMatcher {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(r"(?i)e\s*(\d+)\s*s\s*(\d+)").unwrap(),
        }
    }
}

impl Matcher for EpisodeSeasonMatcher {
    fn try_match(&self, text: &str) -> Option<MatchResult> {
        self.regex.captures(text).and_then(|cap| {
            Some(MatchResult {
                season: cap.get(2)?.as_str().to_string(),
                episode: cap.get(1)?.as_str().to_string(),
            })
        })
    }

    fn priority(&self) -> u32 {
        2
    }
    fn name(&self) -> &str {
        "EpisodeSeason(E06S01)"
    }
}

/// S01E12 格式
pub struct SxEyMatcher {
    regex: Regex,
}

impl SxEyMatcher {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(r"(?i)s\s*(\d+)\s*e\s*(\d+)").unwrap(),
        }
    }
}

impl Matcher for SxEyMatcher {
    fn try_match(&self, text: &str) -> Option<MatchResult> {
        self.regex.captures(text).and_then(|cap| {
            Some(MatchResult {
                season: cap.get(1)?.as_str().to_string(),
                episode: cap.get(2)?.as_str().to_string(),
            })
        })
    }

    fn priority(&self) -> u32 {
        3
    }
    fn name(&self) -> &str {
        "SxEy(S01E12)"
    }
}
