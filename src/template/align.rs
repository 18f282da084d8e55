/// 对齐用的字母表：普通字符或通配符
///
/// 模板合并时通配符和普通字符一样参与对齐，但不会和文件名里真实的 `*` 混淆
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Char(char),
    Wildcard,
}

/// LCS 动态规划表，按 `i * width + j` 平铺存储
struct LcsTable {
    cells: Vec<usize>,
    width: usize,
}

impl LcsTable {
    fn build(a: &[Symbol], b: &[Symbol]) -> Self {
        let width = b.len() + 1;
        let mut cells = vec![0usize; (a.len() + 1) * width];

        for i in 1..=a.len() {
            for j in 1..=b.len() {
                cells[i * width + j] = if a[i - 1] == b[j - 1] {
                    cells[(i - 1) * width + (j - 1)] + 1
                } else {
                    cells[(i - 1) * width + j].max(cells[i * width + (j - 1)])
                };
            }
        }

        Self { cells, width }
    }

    fn get(&self, i: usize, j: usize) -> usize {
        self.cells[i * self.width + j]
    }
}

/// 对齐两个符号序列：公共子序列保留为字面量，每处分歧插入一个通配符
///
/// 从表尾向表头回溯。两个前驱相等时后退第二个序列，第一个序列的字符留给更早的位置匹配。
pub fn align(a: &[Symbol], b: &[Symbol]) -> Vec<Symbol> {
    let table = LcsTable::build(a, b);

    let mut index = table.get(a.len(), b.len());
    let mut common = vec![Symbol::Wildcard; index];
    // gaps[k] 表示 common[k] 之前存在分歧
    let mut gaps = vec![false; index + 1];

    let (mut i, mut j) = (a.len(), b.len());
    while i > 0 && j > 0 {
        if a[i - 1] == b[j - 1] {
            common[index - 1] = a[i - 1];
            i -= 1;
            j -= 1;
            index -= 1;
            continue;
        }

        if table.get(i - 1, j) > table.get(i, j - 1) {
            i -= 1;
        } else {
            j -= 1;
        }
        gaps[index] = true;
    }

    if i > 0 || j > 0 {
        gaps[0] = true;
    }

    let mut result = Vec::with_capacity(common.len() * 2 + 1);
    for (k, symbol) in common.iter().enumerate() {
        if gaps[k] {
            result.push(Symbol::Wildcard);
        }
        result.push(*symbol);
    }
    if gaps[common.len()] {
        result.push(Symbol::Wildcard);
    }

    result
}

pub fn symbols_of(text: &str) -> Vec<Symbol> {
    text.chars().map(Symbol::Char).collect()
}
