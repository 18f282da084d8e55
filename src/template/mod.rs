mod align;

use std::fmt;

use regex::Regex;
use tracing::debug;

use crate::error::{InferenceError, Result};
use crate::metadata::is_blank_capture;

pub use align::Symbol;
use align::{align, symbols_of};

/// 模板片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Variable,
}

/// 一批文件名共有的字面量/变量结构
///
/// 相邻的变量在构造时总会被合并成一个。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// 单个字符串对应的模板，没有变量
    pub fn literal(text: &str) -> Self {
        Self::from_symbols(symbols_of(text))
    }

    fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut segments = Vec::new();
        let mut run = String::new();

        for symbol in symbols {
            match symbol {
                Symbol::Char(c) => run.push(c),
                Symbol::Wildcard => {
                    if !run.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut run)));
                    }
                    if segments.last() != Some(&Segment::Variable) {
                        segments.push(Segment::Variable);
                    }
                }
            }
        }
        if !run.is_empty() {
            segments.push(Segment::Literal(run));
        }

        Self { segments }
    }

    fn symbols(&self) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => symbols.extend(text.chars().map(Symbol::Char)),
                Segment::Variable => symbols.push(Symbol::Wildcard),
            }
        }
        symbols
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn var_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Variable))
            .count()
    }

    /// 用同一个对齐算法合并两个模板，再折叠连续的通配符
    pub fn merge(&self, other: &Template) -> Template {
        Self::from_symbols(align(&self.symbols(), &other.symbols()))
    }

    /// 生成完整锚定的正则：字面量转义，变量变成非贪婪捕获组
    pub fn to_regex_string(&self) -> String {
        let mut pattern = String::from("(?s)^");
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
                Segment::Variable => pattern.push_str("(.*?)"),
            }
        }
        pattern.push('$');
        pattern
    }

    pub fn compile(&self) -> Result<CompiledTemplate> {
        Ok(CompiledTemplate {
            regex: Regex::new(&self.to_regex_string())?,
            var_count: self.var_count(),
        })
    }

    /// 去掉指定下标的变量，两侧字面量随之拼接
    fn remove_vars(&self, indices: &[usize]) -> Template {
        let mut var_index = 0;
        let symbols = self.symbols().into_iter().filter(|symbol| {
            if *symbol != Symbol::Wildcard {
                return true;
            }
            let keep = !indices.contains(&var_index);
            var_index += 1;
            keep
        });
        Self::from_symbols(symbols.collect::<Vec<_>>())
    }

    /// 删除在所有文件名中都只捕获到空白的变量
    fn prune<S: AsRef<str>>(&self, names: &[S]) -> Result<Template> {
        let compiled = self.compile()?;
        let mut non_blank = vec![0usize; compiled.var_count];

        for name in names {
            let name = name.as_ref();
            let captures = compiled.captures(name).ok_or_else(|| {
                InferenceError::InvalidTemplate {
                    template: self.to_string(),
                    name: name.to_string(),
                }
            })?;
            for (count, value) in non_blank.iter_mut().zip(&captures) {
                if !is_blank_capture(value) {
                    *count += 1;
                }
            }
        }

        let empty_vars: Vec<usize> = non_blank
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(index, _)| index)
            .collect();

        if empty_vars.is_empty() {
            Ok(self.clone())
        } else {
            debug!("Pruning blank variables {:?} from {}", empty_vars, self);
            Ok(self.remove_vars(&empty_vars))
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Variable => f.write_str("*")?,
            }
        }
        Ok(())
    }
}

/// 编译好的模板正则
pub struct CompiledTemplate {
    regex: Regex,
    var_count: usize,
}

impl CompiledTemplate {
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// 按变量顺序返回捕获值，不匹配时返回 None
    pub fn captures<'t>(&self, text: &'t str) -> Option<Vec<&'t str>> {
        let caps = self.regex.captures(text)?;
        Some(
            (1..=self.var_count)
                .map(|group| caps.get(group).map_or("", |m| m.as_str()))
                .collect(),
        )
    }

    /// 确认模板能完整匹配每一个文件名
    pub fn check<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        match names.iter().find(|name| !self.is_match(name.as_ref())) {
            Some(name) => Err(InferenceError::InvalidTemplate {
                template: self.regex.as_str().to_string(),
                name: name.as_ref().to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// 求两个字符串的配对模板
pub fn find_pair_template(a: &str, b: &str) -> Template {
    Template::from_symbols(align(&symbols_of(a), &symbols_of(b)))
}

/// 从一批字符串还原共有模板
///
/// 依次对相邻两项求配对模板，再逐个并入当前模板；最后校验模板匹配全部输入并删除无用变量。
pub fn restore_template<S: AsRef<str>>(names: &[S]) -> Result<Template> {
    match names {
        [] => return Ok(Template::default()),
        [single] => return Ok(Template::literal(single.as_ref())),
        _ => {}
    }

    let mut template = find_pair_template(names[0].as_ref(), names[1].as_ref());
    for pair in names[1..].windows(2) {
        let pair_template = find_pair_template(pair[0].as_ref(), pair[1].as_ref());
        template = template.merge(&pair_template);
    }

    template.compile()?.check(names)?;
    let template = template.prune(names)?;
    debug!("Restored template {} from {} names", template, names.len());

    Ok(template)
}
