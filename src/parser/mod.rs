pub mod matchers;

use regex::{NoExpand, Regex};
use std::path::Path;
use tracing::trace;

use crate::metadata::EpisodeMetadata;
use crate::scanner::is_video;
use matchers::{CrossMatcher, EpisodeSeasonMatcher, MatcherChain, SxEyMatcher};

/// 单文件解析器的约定：视频文件的集数一定非空，非视频文件返回空标签
pub trait EpisodeOracle {
    fn parse_one(&self, path: &str) -> EpisodeMetadata;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Season,
    Episode,
}

pub struct SingleFileParser {
    format_chain: MatcherChain,
    field_extractors: Vec<(Regex, Field)>,
    delimiter_regex: Regex,
    cluster_regex: Regex,
    leading_number_regex: Regex,
    spaced_number_regex: Regex,
}

impl SingleFileParser {
    pub fn new() -> Self {
        let format_chain = MatcherChain::new()
            .add_matcher(Box::new(CrossMatcher::new()))
            .add_matcher(Box::new(EpisodeSeasonMatcher::new()))
            .add_matcher(Box::new(SxEyMatcher::new()));

        // 顺序有意义：后命中的集数覆盖先命中的
        let field_extractors = vec![
            (Regex::new(r"(?i)ep\s*(\d+)").unwrap(), Field::Episode),
            (Regex::new(r"(?i)episode\s*(\d+)").unwrap(), Field::Episode),
            (Regex::new(r"(\d+)\.\s").unwrap(), Field::Episode),
            (Regex::new(r"(?i)season\s*(\d+)").unwrap(), Field::Season),
        ];

        Self {
            format_chain,
            field_extractors,
            delimiter_regex: Regex::new(r"[-_]").unwrap(),
            cluster_regex: Regex::new(r"\s{2,}").unwrap(),
            leading_number_regex: Regex::new(r"^(\d+(?:.\d+)?)").unwrap(),
            spaced_number_regex: Regex::new(r" (\d+(?:.\d+)?)").unwrap(),
        }
    }

    /// 去掉括号内容；括号里只有不超过三位的数字时作为集数候选
    fn strip_brackets(&self, text: &str, episode: &mut Option<String>) -> String {
        let mut chars: Vec<char> = text.chars().collect();
        let mut depth = 0i32;
        let mut start = 0usize;
        let mut i = 0usize;

        while i < chars.len() {
            match chars[i] {
                '(' | '[' | '{' => {
                    depth += 1;
                    start = i;
                }
                ')' | ']' | '}' => {
                    depth -= 1;
                    if depth < 0 {
                        break;
                    }
                    if depth == 0 {
                        let inner: String = chars[start + 1..i].iter().collect();
                        if episode.is_none()
                            && !inner.is_empty()
                            && inner.len() <= 3
                            && inner.chars().all(|c| c.is_ascii_digit())
                        {
                            *episode = Some(inner);
                        }
                        chars.drain(start..=i);
                        i = 0;
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        chars.into_iter().collect()
    }

    /// 恰好一个片段以数字开头时取该数字
    fn episode_from_leading_number(&self, clusters: &mut [String]) -> Option<String> {
        let candidates: Vec<(usize, String)> = clusters
            .iter()
            .enumerate()
            .filter_map(|(i, cluster)| {
                self.leading_number_regex
                    .captures(cluster)
                    .map(|cap| (i, cap[1].to_string()))
            })
            .collect();

        take_unique_number(clusters, candidates)
    }

    /// 恰好一个片段只含一个空格分隔的数字时取该数字
    fn episode_from_spaced_number(&self, clusters: &mut [String]) -> Option<String> {
        let candidates: Vec<(usize, String)> = clusters
            .iter()
            .enumerate()
            .filter_map(|(i, cluster)| {
                let mut numbers = self.spaced_number_regex.captures_iter(cluster);
                let first = numbers.next()?;
                if numbers.next().is_some() {
                    return None;
                }
                Some((i, first[1].to_string()))
            })
            .collect();

        take_unique_number(clusters, candidates)
    }

    pub fn parse(&self, filename: &str) -> EpisodeMetadata {
        if !is_video(filename) {
            return EpisodeMetadata::default();
        }

        let path = Path::new(filename);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut spaced = self
            .delimiter_regex
            .replace_all(&stem, NoExpand(" "))
            .into_owned();

        if let Some((name, result)) = self.format_chain.execute(&spaced) {
            trace!("{} matched {}", name, filename);
            return EpisodeMetadata::new(result.season, result.episode);
        }

        let mut season: Option<String> = None;
        let mut episode: Option<String> = None;

        for (regex, field) in &self.field_extractors {
            let Some(value) = regex.captures(&spaced).map(|cap| cap[1].to_string()) else {
                continue;
            };
            match field {
                Field::Episode => episode = Some(value),
                Field::Season => season = Some(value),
            }
            spaced = regex.replace_all(&spaced, NoExpand("")).into_owned();
        }

        let spaced = self.strip_brackets(&spaced, &mut episode);

        let mut clusters: Vec<String> = self
            .cluster_regex
            .split(spaced.trim_matches(' '))
            .map(str::to_string)
            .collect();

        if episode.is_none() {
            episode = self.episode_from_leading_number(&mut clusters);
        }
        if episode.is_none() {
            episode = self.episode_from_spaced_number(&mut clusters);
        }

        // 兜底：第一个片段当作季名，只有两个片段时第二个当作集名
        if let Some(first) = clusters.first() {
            if season.is_none() {
                season = Some(first.trim_matches(' ').to_string());
            }
            if clusters.len() == 2 && episode.is_none() {
                episode = Some(clusters[1].trim_matches(' ').to_string());
            }
        }

        let mut season = season.unwrap_or_default();
        let mut episode = episode.unwrap_or_default();

        if episode.is_empty() && !season.is_empty() {
            episode = std::mem::take(&mut season);
        }
        if episode.is_empty() {
            episode = stem.trim_matches(' ').to_string();
        }
        if episode.is_empty() {
            episode = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| filename.to_string());
        }

        EpisodeMetadata::new(season, episode)
    }
}

impl EpisodeOracle for SingleFileParser {
    fn parse_one(&self, path: &str) -> EpisodeMetadata {
        self.parse(path)
    }
}

fn take_unique_number(clusters: &mut [String], candidates: Vec<(usize, String)>) -> Option<String> {
    let [(index, number)] = <[_; 1]>::try_from(candidates).ok()?;
    clusters[index] = clusters[index].replacen(&number, "", 1);
    Some(number)
}
