use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use tracing::{debug, info};

use crate::error::{InferenceError, Result};
use crate::frequency::{Assignment, assign_groups};
use crate::metadata::{EpisodeMetadata, post_clean};
use crate::parser::{EpisodeOracle, SingleFileParser};
use crate::scanner::{is_video, parent_dir};
use crate::template::restore_template;

static BRACKET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]|\(.*?\)|\{.*?\}").unwrap());

/// 去掉方括号、圆括号、花括号中的内容（字幕组、哈希等）
pub fn pre_clean(filename: &str) -> String {
    BRACKET_REGEX.replace_all(filename, NoExpand("")).into_owned()
}

struct FileEntry<'a> {
    path: &'a str,
    cleaned: String,
    is_video: bool,
    result: EpisodeMetadata,
}

/// 一个目录下的视频文件，下标指向 entries
struct DirGroup {
    dir: String,
    members: Vec<usize>,
}

/// 回退到单文件解析器的目录
#[derive(Debug, Clone)]
pub struct Fallback {
    pub dir: String,
    pub reason: String,
}

/// 批量推断的完整结果
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub labels: Vec<EpisodeMetadata>,
    pub fallbacks: Vec<Fallback>,
}

pub struct Classifier<O = SingleFileParser> {
    oracle: O,
}

impl Classifier<SingleFileParser> {
    pub fn new() -> Self {
        Self::with_oracle(SingleFileParser::new())
    }
}

impl<O: EpisodeOracle> Classifier<O> {
    pub fn with_oracle(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn classify<S: AsRef<str>>(&self, paths: &[S]) -> Vec<EpisodeMetadata> {
        self.classify_detailed(paths).labels
    }

    /// 按目录分组推断季和集，结果与输入一一对应
    pub fn classify_detailed<S: AsRef<str>>(&self, paths: &[S]) -> Classification {
        let mut entries: Vec<FileEntry> = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                FileEntry {
                    path,
                    cleaned: pre_clean(path),
                    is_video: is_video(path),
                    result: EpisodeMetadata::default(),
                }
            })
            .collect();

        let groups = group_by_dir(&entries);
        let mut fallbacks = Vec::new();

        for group in &groups {
            if let Err(e) = self.label_group(&mut entries, group) {
                debug!("Falling back to single parser for {:?}: {}", group.dir, e);
                fallbacks.push(Fallback {
                    dir: group.dir.clone(),
                    reason: e.to_string(),
                });
                for &index in &group.members {
                    entries[index].result = self.oracle.parse_one(entries[index].path);
                }
            }
        }

        if groups.len() > 1 {
            reconcile_seasons(&mut entries, &groups);
        }
        strip_common_season_prefix(&mut entries);
        self.ensure_episodes(&mut entries);

        Classification {
            labels: entries.into_iter().map(|entry| entry.result).collect(),
            fallbacks,
        }
    }

    /// 单个目录：只有一个文件时直接交给单文件解析器，否则还原模板并按频率分配变量
    fn label_group(&self, entries: &mut [FileEntry], group: &DirGroup) -> Result<()> {
        if let [index] = group.members[..] {
            entries[index].result = self.oracle.parse_one(entries[index].path);
            return Ok(());
        }

        let names: Vec<&str> = group
            .members
            .iter()
            .map(|&index| entries[index].cleaned.as_str())
            .collect();

        let template = restore_template(&names)?;
        let compiled = template.compile()?;
        let captures = names
            .iter()
            .map(|name| {
                compiled
                    .captures(name)
                    .ok_or_else(|| InferenceError::InvalidTemplate {
                        template: template.to_string(),
                        name: name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let assignment = assign_groups(&captures, compiled.var_count())?;
        debug!("{:?}: template {} -> {:?}", group.dir, template, assignment);

        let labels: Vec<EpisodeMetadata> = match assignment {
            Assignment::EpisodeOnly { episode } => {
                // 季名交给单文件解析器，用第一个文件的结果
                let season = self.oracle.parse_one(entries[group.members[0]].path).season;
                captures
                    .iter()
                    .map(|row| EpisodeMetadata::new(season.clone(), post_clean(row[episode])))
                    .collect()
            }
            Assignment::SeasonAndEpisode { season, episode } => captures
                .iter()
                .map(|row| EpisodeMetadata::new(post_clean(row[season]), post_clean(row[episode])))
                .collect(),
        };

        for (&index, label) in group.members.iter().zip(labels) {
            entries[index].result = label;
        }
        Ok(())
    }

    /// 模板捕获到空集数的视频文件改用单文件解析器的集数
    fn ensure_episodes(&self, entries: &mut [FileEntry]) {
        for entry in entries
            .iter_mut()
            .filter(|e| e.is_video && e.result.episode.is_empty())
        {
            let parsed = self.oracle.parse_one(entry.path);
            debug!(
                "Blank episode for {:?}, using {:?}",
                entry.path, parsed.episode
            );
            entry.result.episode = parsed.episode;
        }
    }
}

impl Default for Classifier<SingleFileParser> {
    fn default() -> Self {
        Self::new()
    }
}

/// 按目录分组视频文件，保持首次出现的目录顺序和目录内的相对顺序
fn group_by_dir(entries: &[FileEntry]) -> Vec<DirGroup> {
    let mut groups: Vec<DirGroup> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();

    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_video {
            continue;
        }
        let dir = parent_dir(entry.path);
        let slot = *lookup.entry(dir.clone()).or_insert_with(|| {
            groups.push(DirGroup {
                dir,
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].members.push(index);
    }

    groups
}

fn season_set<'a>(entries: &'a [FileEntry<'a>]) -> BTreeSet<&'a str> {
    entries
        .iter()
        .filter(|entry| entry.is_video)
        .map(|entry| entry.result.season.as_str())
        .collect()
}

/// 所有目录的季名都相同时，尝试从目录名中还原季名
fn reconcile_seasons(entries: &mut [FileEntry], groups: &[DirGroup]) {
    if season_set(entries).len() != 1 {
        return;
    }

    let dirs: Vec<&str> = groups.iter().map(|group| group.dir.as_str()).collect();
    let template = match restore_template(&dirs) {
        Ok(template) if template.var_count() == 1 => template,
        Ok(template) => {
            debug!(
                "Directory template {} has {} variables",
                template,
                template.var_count()
            );
            return;
        }
        Err(e) => {
            debug!("No directory template: {}", e);
            return;
        }
    };
    let Ok(compiled) = template.compile() else {
        return;
    };

    info!(
        "Deriving seasons from directory names with template {}",
        template
    );
    for group in groups {
        let Some(captures) = compiled.captures(&group.dir) else {
            continue;
        };
        let season = post_clean(captures[0]);
        for &index in &group.members {
            entries[index].result.season = season.clone();
        }
    }
}

/// 字符串集合的最长公共前缀：排序后比较首尾两项
pub fn longest_common_prefix<S: AsRef<str>>(values: &[S]) -> String {
    let mut sorted: Vec<&str> = values.iter().map(|v| v.as_ref()).collect();
    sorted.sort_unstable();

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return String::new();
    };
    first
        .chars()
        .zip(last.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect()
}

/// 去掉所有季名共有的前缀（通常是番剧名）
pub fn strip_season_prefix(seasons: &mut [&mut String]) {
    let distinct: BTreeSet<&str> = seasons.iter().map(|s| s.as_str()).collect();
    if distinct.len() < 2 {
        return;
    }
    let distinct: Vec<&str> = distinct.into_iter().collect();
    let prefix_len = longest_common_prefix(&distinct).chars().count();
    if prefix_len == 0 {
        return;
    }

    for season in seasons.iter_mut() {
        if season.chars().count() >= prefix_len {
            let rest: String = season.chars().skip(prefix_len).collect();
            **season = post_clean(&rest);
        }
    }
}

fn strip_common_season_prefix(entries: &mut [FileEntry]) {
    let mut seasons: Vec<&mut String> = entries
        .iter_mut()
        .filter(|entry| entry.is_video)
        .map(|entry| &mut entry.result.season)
        .collect();
    strip_season_prefix(&mut seasons);
}

/// 推断一批路径的季和集，见 [`Classifier`]
pub fn classify<S: AsRef<str>>(paths: &[S]) -> Vec<EpisodeMetadata> {
    Classifier::new().classify(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pre_clean() {
        assert_eq!(
            pre_clean("[Judas] Show (2011) - S01E01 {x}.mkv"),
            " Show  - S01E01 .mkv"
        );
        assert_eq!(pre_clean("[a[b]c].mkv"), "c].mkv");
    }

    #[test]
    fn test_longest_common_prefix() {
        assert_eq!(
            longest_common_prefix(&["Show X2 Ten", "Show", "Show X2 Ketsu"]),
            "Show"
        );
        assert_eq!(longest_common_prefix(&["", "Season 2"]), "");
        assert_eq!(longest_common_prefix::<&str>(&[]), "");
    }

    #[test]
    fn test_strip_season_prefix() {
        let mut values = owned(&["Show", "Show X2 Ketsu", "Show X2 Shou", "Show X2 Ten"]);
        let mut seasons: Vec<&mut String> = values.iter_mut().collect();
        strip_season_prefix(&mut seasons);
        assert_eq!(values, owned(&["", "X2 Ketsu", "X2 Shou", "X2 Ten"]));
    }

    #[test]
    fn test_strip_season_prefix_trims_trailing_delimiters() {
        let mut values = owned(&["Show - Ketsu", "Show - Shou"]);
        let mut seasons: Vec<&mut String> = values.iter_mut().collect();
        strip_season_prefix(&mut seasons);
        assert_eq!(values, owned(&["Ketsu", "Shou"]));
    }

    #[test]
    fn test_strip_season_prefix_single_value() {
        let mut values = owned(&["Show", "Show"]);
        let mut seasons: Vec<&mut String> = values.iter_mut().collect();
        strip_season_prefix(&mut seasons);
        assert_eq!(values, owned(&["Show", "Show"]));
    }

    #[test]
    fn test_group_by_dir_keeps_order() {
        let paths = ["b/1.mkv", "a/1.mkv", "b/notes.txt", "b/2.mkv", "3.mkv"];
        let entries: Vec<FileEntry> = paths
            .iter()
            .map(|path| FileEntry {
                path: *path,
                cleaned: path.to_string(),
                is_video: is_video(path),
                result: EpisodeMetadata::default(),
            })
            .collect();

        let groups = group_by_dir(&entries);
        let layout: Vec<(&str, Vec<usize>)> = groups
            .iter()
            .map(|g| (g.dir.as_str(), g.members.clone()))
            .collect();
        assert_eq!(
            layout,
            vec![("b", vec![0, 3]), ("a", vec![1]), (".", vec![4])]
        );
    }

    #[test]
    fn test_season_set_skips_non_video() {
        let labels = [
            ("a/1.mkv", "1"),
            ("a/notes.txt", ""),
            ("b/1.mkv", "2"),
            ("b/2.mkv", "2"),
        ];
        let entries: Vec<FileEntry> = labels
            .iter()
            .map(|(path, season)| FileEntry {
                path: *path,
                cleaned: path.to_string(),
                is_video: is_video(path),
                result: EpisodeMetadata::new(*season, "01"),
            })
            .collect();

        let seasons: Vec<&str> = season_set(&entries).into_iter().collect();
        assert_eq!(seasons, vec!["1", "2"]);
    }
}
