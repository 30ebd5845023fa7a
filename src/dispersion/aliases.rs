//! # 色散级别别名表
//!
//! 将用户书写的色散级别（`d4`, `D4(BJ)`, `d3bj` ...）映射到规范标签。
//! 只读，查询时不区分大小写。
//!
//! ## 依赖关系
//! - 被 `dispersion/plan.rs`, `dispersion/dashcoeff.rs`, `harness/dftd4.rs` 使用

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// D4 + Becke-Johnson 阻尼的规范标签
pub const D4BJ: &str = "d4bj";

/// 归一化 level_hint 时写回的短标签
pub const D4_SHORT: &str = "d4";

static BUILTIN: Lazy<DispersionAliasTable> = Lazy::new(|| {
    DispersionAliasTable::from_pairs([
        ("d2", "d2"),
        ("d3", "d3zero2b"),
        ("d3zero", "d3zero2b"),
        ("d3zero2b", "d3zero2b"),
        ("d3bj", "d3bj2b"),
        ("d3(bj)", "d3bj2b"),
        ("d3bj2b", "d3bj2b"),
        ("d3m", "d3mzero2b"),
        ("d3mzero", "d3mzero2b"),
        ("d3mzero2b", "d3mzero2b"),
        ("d3mbj", "d3mbj2b"),
        ("d3mbj2b", "d3mbj2b"),
        ("d4", D4BJ),
        ("d4bj", D4BJ),
        ("d4(bj)", D4BJ),
        ("d4bjeeqatm", D4BJ),
    ])
});

/// 别名 -> 规范标签
#[derive(Debug, Clone, Default)]
pub struct DispersionAliasTable {
    entries: BTreeMap<String, String>,
}

impl DispersionAliasTable {
    /// 内置别名表
    pub fn builtin() -> &'static DispersionAliasTable {
        &BUILTIN
    }

    pub fn from_pairs<I, A, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, T)>,
        A: Into<String>,
        T: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(alias, tag)| (alias.into().to_lowercase(), tag.into()))
            .collect();
        DispersionAliasTable { entries }
    }

    /// 按别名查询规范标签（不区分大小写）
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries
            .get(&alias.trim().to_lowercase())
            .map(String::as_str)
    }

    /// 遍历所有 (别名, 标签)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    /// 某一规范标签的全部别名
    pub fn aliases_of<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |(_, t)| *t == tag)
            .map(|(alias, _)| alias)
    }
}

/// 规范标签在 `fctldash` 中使用的短名
pub fn short_name(tag: &str) -> &str {
    match tag {
        "d2" => "d2",
        "d3zero2b" => "d3",
        "d3bj2b" => "d3bj",
        "d3mzero2b" => "d3mzero",
        "d3mbj2b" => "d3mbj",
        D4BJ => D4_SHORT,
        other => other,
    }
}
