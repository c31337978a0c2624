//! Operator keyword recognition
//!
//! The set of plan operators is a closed enumeration. A line is an operator
//! line only if, after an optional `->` marker and optional modifiers, it
//! starts with one of these keywords on a word boundary.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Start of the metric parentheticals that follow the operation text
static METRICS_START_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((?:cost=|actual\b|never executed\)|(?:plan_)?rows=)").unwrap());

/// `Label: value` detail lines such as `Sort Key:` or `Hash Cond:`
static DETAIL_LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9 _-]*:").unwrap());

/// Join node names carrying a join type, e.g. `Merge Left Join`, `Hash Right Anti Join`
static TYPED_JOIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Hash|Merge|Nested Loop)\s+(?:(?:Left|Right|Full|Semi|Anti|Right Anti|Right Semi)\s+)?Join\b")
        .unwrap()
});

/// Modifiers PostgreSQL prints in front of a node name
const MODIFIERS: &[&str] = &["Parallel", "Partial", "Finalize", "Incremental"];

/// Recognized plan operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    SeqScan,
    IndexScan,
    IndexOnlyScan,
    BitmapHeapScan,
    BitmapIndexScan,
    BitmapAnd,
    BitmapOr,
    TidScan,
    TidRangeScan,
    SampleScan,
    SubqueryScan,
    FunctionScan,
    TableFunctionScan,
    ValuesScan,
    CteScan,
    NamedTuplestoreScan,
    WorkTableScan,
    ForeignScan,
    CustomScan,
    Sort,
    Hash,
    HashJoin,
    NestedLoop,
    MergeJoin,
    Aggregate,
    HashAggregate,
    GroupAggregate,
    MixedAggregate,
    Group,
    Limit,
    Result,
    ProjectSet,
    Unique,
    Gather,
    GatherMerge,
    /// `Parallel` modifier with no recognizable node name after it
    Parallel,
    WindowAgg,
    SetOp,
    HashSetOp,
    RecursiveUnion,
    Append,
    MergeAppend,
    Materialize,
    Memoize,
    LockRows,
    Insert,
    Update,
    Delete,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 48] = [
        OperatorKind::SeqScan,
        OperatorKind::IndexScan,
        OperatorKind::IndexOnlyScan,
        OperatorKind::BitmapHeapScan,
        OperatorKind::BitmapIndexScan,
        OperatorKind::BitmapAnd,
        OperatorKind::BitmapOr,
        OperatorKind::TidScan,
        OperatorKind::TidRangeScan,
        OperatorKind::SampleScan,
        OperatorKind::SubqueryScan,
        OperatorKind::FunctionScan,
        OperatorKind::TableFunctionScan,
        OperatorKind::ValuesScan,
        OperatorKind::CteScan,
        OperatorKind::NamedTuplestoreScan,
        OperatorKind::WorkTableScan,
        OperatorKind::ForeignScan,
        OperatorKind::CustomScan,
        OperatorKind::Sort,
        OperatorKind::Hash,
        OperatorKind::HashJoin,
        OperatorKind::NestedLoop,
        OperatorKind::MergeJoin,
        OperatorKind::Aggregate,
        OperatorKind::HashAggregate,
        OperatorKind::GroupAggregate,
        OperatorKind::MixedAggregate,
        OperatorKind::Group,
        OperatorKind::Limit,
        OperatorKind::Result,
        OperatorKind::ProjectSet,
        OperatorKind::Unique,
        OperatorKind::Gather,
        OperatorKind::GatherMerge,
        OperatorKind::Parallel,
        OperatorKind::WindowAgg,
        OperatorKind::SetOp,
        OperatorKind::HashSetOp,
        OperatorKind::RecursiveUnion,
        OperatorKind::Append,
        OperatorKind::MergeAppend,
        OperatorKind::Materialize,
        OperatorKind::Memoize,
        OperatorKind::LockRows,
        OperatorKind::Insert,
        OperatorKind::Update,
        OperatorKind::Delete,
    ];

    /// Node name as printed by EXPLAIN
    pub fn keyword(&self) -> &'static str {
        match self {
            OperatorKind::SeqScan => "Seq Scan",
            OperatorKind::IndexScan => "Index Scan",
            OperatorKind::IndexOnlyScan => "Index Only Scan",
            OperatorKind::BitmapHeapScan => "Bitmap Heap Scan",
            OperatorKind::BitmapIndexScan => "Bitmap Index Scan",
            OperatorKind::BitmapAnd => "BitmapAnd",
            OperatorKind::BitmapOr => "BitmapOr",
            OperatorKind::TidScan => "Tid Scan",
            OperatorKind::TidRangeScan => "Tid Range Scan",
            OperatorKind::SampleScan => "Sample Scan",
            OperatorKind::SubqueryScan => "Subquery Scan",
            OperatorKind::FunctionScan => "Function Scan",
            OperatorKind::TableFunctionScan => "Table Function Scan",
            OperatorKind::ValuesScan => "Values Scan",
            OperatorKind::CteScan => "CTE Scan",
            OperatorKind::NamedTuplestoreScan => "Named Tuplestore Scan",
            OperatorKind::WorkTableScan => "WorkTable Scan",
            OperatorKind::ForeignScan => "Foreign Scan",
            OperatorKind::CustomScan => "Custom Scan",
            OperatorKind::Sort => "Sort",
            OperatorKind::Hash => "Hash",
            OperatorKind::HashJoin => "Hash Join",
            OperatorKind::NestedLoop => "Nested Loop",
            OperatorKind::MergeJoin => "Merge Join",
            OperatorKind::Aggregate => "Aggregate",
            OperatorKind::HashAggregate => "HashAggregate",
            OperatorKind::GroupAggregate => "GroupAggregate",
            OperatorKind::MixedAggregate => "MixedAggregate",
            OperatorKind::Group => "Group",
            OperatorKind::Limit => "Limit",
            OperatorKind::Result => "Result",
            OperatorKind::ProjectSet => "ProjectSet",
            OperatorKind::Unique => "Unique",
            OperatorKind::Gather => "Gather",
            OperatorKind::GatherMerge => "Gather Merge",
            OperatorKind::Parallel => "Parallel",
            OperatorKind::WindowAgg => "WindowAgg",
            OperatorKind::SetOp => "SetOp",
            OperatorKind::HashSetOp => "HashSetOp",
            OperatorKind::RecursiveUnion => "Recursive Union",
            OperatorKind::Append => "Append",
            OperatorKind::MergeAppend => "Merge Append",
            OperatorKind::Materialize => "Materialize",
            OperatorKind::Memoize => "Memoize",
            OperatorKind::LockRows => "LockRows",
            OperatorKind::Insert => "Insert",
            OperatorKind::Update => "Update",
            OperatorKind::Delete => "Delete",
        }
    }
}

/// Keywords ordered longest first so "Hash Join" wins over "Hash"
static KEYWORDS_BY_LENGTH: Lazy<Vec<OperatorKind>> = Lazy::new(|| {
    let mut kinds: Vec<OperatorKind> = OperatorKind::ALL
        .iter()
        .copied()
        .filter(|k| *k != OperatorKind::Parallel)
        .collect();
    kinds.sort_by(|a, b| b.keyword().len().cmp(&a.keyword().len()));
    kinds
});

/// Result of matching a trimmed line against the operator enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorMatch {
    pub kind: OperatorKind,
    /// Modifiers + keyword + descriptive text, metrics removed
    pub operation: String,
    pub modifiers: Vec<&'static str>,
}

impl OperatorMatch {
    /// Match a line (leading whitespace already stripped)
    pub fn parse(trimmed: &str) -> Option<OperatorMatch> {
        let body = trimmed.strip_prefix("->").unwrap_or(trimmed).trim_start();
        if DETAIL_LABEL_REGEX.is_match(body) {
            return None;
        }

        let mut rest = body;
        let mut modifiers = Vec::new();
        'outer: loop {
            for modifier in MODIFIERS {
                if let Some(after) = strip_word(rest, modifier) {
                    modifiers.push(*modifier);
                    rest = after.trim_start();
                    continue 'outer;
                }
            }
            break;
        }

        let kind = Self::typed_join(rest)
            .or_else(|| {
                KEYWORDS_BY_LENGTH
                    .iter()
                    .copied()
                    .find(|kind| strip_word(rest, kind.keyword()).is_some())
            })
            .or_else(|| modifiers.contains(&"Parallel").then_some(OperatorKind::Parallel))?;

        let head = match METRICS_START_REGEX.find(body) {
            Some(m) => &body[..m.start()],
            None => body,
        };

        Some(OperatorMatch {
            kind,
            operation: head.trim_end().to_string(),
            modifiers,
        })
    }

    /// Join node names with a join type between family and `Join`
    fn typed_join(rest: &str) -> Option<OperatorKind> {
        let cap = TYPED_JOIN_REGEX.captures(rest)?;
        match cap.get(1)?.as_str() {
            "Hash" => Some(OperatorKind::HashJoin),
            "Merge" => Some(OperatorKind::MergeJoin),
            _ => Some(OperatorKind::NestedLoop),
        }
    }
}

/// Strip `word` from the front of `s` when it ends on a word boundary
fn strip_word<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    let after = s.strip_prefix(word)?;
    match after.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => None,
        _ => Some(after),
    }
}
