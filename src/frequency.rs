use std::collections::HashSet;

use tracing::trace;

use crate::error::{InferenceError, Result};
use crate::metadata::is_blank_capture;

/// 某个变量在一批文件名中出现的不同非空取值个数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    pub group: usize,
    pub value: usize,
}

/// 变量分配结果，下标指向模板中的变量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// 只有集数在变化，季需要从单文件解析器获取
    EpisodeOnly { episode: usize },
    SeasonAndEpisode { season: usize, episode: usize },
}

/// 统计每个变量的不同取值个数，并按个数升序排列
pub fn calc_frequencies(captures: &[Vec<&str>], var_count: usize) -> Vec<Frequency> {
    let mut frequencies: Vec<Frequency> = (0..var_count)
        .map(|group| {
            let distinct: HashSet<&str> = captures
                .iter()
                .filter_map(|row| row.get(group).copied())
                .filter(|value| !is_blank_capture(value))
                .collect();
            Frequency {
                group,
                value: distinct.len(),
            }
        })
        .collect();

    frequencies.sort_by_key(|f| f.value);
    frequencies
}

pub fn distinct_levels(frequencies: &[Frequency]) -> usize {
    frequencies
        .iter()
        .map(|f| f.value)
        .collect::<HashSet<_>>()
        .len()
}

/// 频率升序时变量位置也严格递增
pub fn is_monotonic(frequencies: &[Frequency]) -> bool {
    frequencies.windows(2).all(|w| w[0].group < w[1].group)
}

/// 根据捕获值决定哪个变量是季、哪个是集
///
/// 变化较慢的字段（季）通常写在变化较快的字段（集）前面。顺序不单调时只交换最后两项重试一次，
/// 用来兼容 `%集-%季` 这类结尾字段错位的命名。
pub fn assign_groups(captures: &[Vec<&str>], var_count: usize) -> Result<Assignment> {
    match var_count {
        0 => return Err(InferenceError::ambiguous("template has no variables")),
        1 => return Ok(Assignment::EpisodeOnly { episode: 0 }),
        _ => {}
    }

    let mut frequencies = calc_frequencies(captures, var_count);
    trace!("Variable frequencies: {:?}", frequencies);

    let levels = distinct_levels(&frequencies);
    let mut monotonic = is_monotonic(&frequencies);

    if !monotonic {
        let len = frequencies.len();
        frequencies.swap(len - 1, len - 2);
        monotonic = is_monotonic(&frequencies);
    }

    if !monotonic {
        return Err(InferenceError::ambiguous(format!(
            "frequencies are not monotonic: {:?}",
            frequencies
        )));
    }

    match levels {
        1 => Ok(Assignment::EpisodeOnly {
            episode: frequencies[frequencies.len() - 1].group,
        }),
        2 => {
            let min = frequencies.iter().map(|f| f.value).min().unwrap_or(0);
            let max = frequencies.iter().map(|f| f.value).max().unwrap_or(0);
            let season = frequencies.iter().rev().find(|f| f.value == min);
            let episode = frequencies.iter().rev().find(|f| f.value == max);

            match (season, episode) {
                (Some(season), Some(episode)) => Ok(Assignment::SeasonAndEpisode {
                    season: season.group,
                    episode: episode.group,
                }),
                _ => Err(InferenceError::ambiguous("missing frequency level")),
            }
        }
        _ => Err(InferenceError::ambiguous(format!(
            "{} distinct frequency levels",
            levels
        ))),
    }
}
