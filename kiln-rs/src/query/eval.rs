//! Expression evaluation against notes, plus the filter, group and sort
//! operations built on top of it.

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::parser::parse_expression;
use super::value::Value;
use crate::note::Note;
use crate::parser::clean_link;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Group key for notes whose field is missing or blank.
pub const UNCATEGORIZED: &str = "Uncategorized";

// ============================================================================
// Field access
// ============================================================================

/// Resolve a field name against a note.
///
/// `file.*` names are synthetic accessors; anything else (optionally
/// written `note.key`) is looked up in the frontmatter.
pub fn field_value(note: &Note, field: &str) -> Value {
    match field {
        "file" | "file.name" => Value::from(note.name.as_str()),
        "file.fullname" => Value::from(note.file_name.as_str()),
        "file.stem" | "file.basename" => {
            let stem = match note.file_name.rfind('.') {
                Some(i) if i > 0 => &note.file_name[..i],
                _ => note.file_name.as_str(),
            };
            Value::from(stem)
        }
        "file.path" => Value::from(note.rel_path.as_str()),
        "file.link" => Value::from(note.web_path.as_str()),
        "file.ctime" => Value::Time(note.created),
        "file.mtime" => Value::Time(note.modified),
        "file.cday" => Value::String(note.created.format("%Y-%m-%d").to_string()),
        "file.mday" => Value::String(note.modified.format("%Y-%m-%d").to_string()),
        "file.size" => Value::Number(note.size as f64),
        "file.ext" => Value::from(note.ext.trim_start_matches('.')),
        "file.links" => string_list(&note.links),
        "file.embeds" => string_list(&note.embeds),
        "file.tags" => {
            // Both spellings, so `contains "#x"` and `contains "x"` both work
            let mut tags: Vec<Value> = Vec::new();
            for tag in &note.tags {
                let bare = tag.trim_start_matches('#');
                for form in [format!("#{}", bare), bare.to_string()] {
                    let form = Value::String(form);
                    if !tags.contains(&form) {
                        tags.push(form);
                    }
                }
            }
            Value::List(tags)
        }
        "file.folder" => Value::from(note.folder.as_str()),
        _ => {
            let key = field.strip_prefix("note.").unwrap_or(field);
            note.frontmatter
                .get(key)
                .map_or(Value::Null, Value::from_yaml)
        }
    }
}

fn string_list(items: &[String]) -> Value {
    Value::List(items.iter().map(|s| Value::from(s.as_str())).collect())
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate an expression for one note.
pub fn evaluate(expr: &Expr, note: &Note) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::FieldRef(name) => field_value(note, name),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, note);
            match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::IsEmpty => Value::Bool(value.is_empty()),
                UnaryOp::IsNotEmpty => Value::Bool(!value.is_empty()),
            }
        }
        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, note),
        Expr::MethodCall { object, name, args } => evaluate_method(object, name, args, note),
    }
}

/// Whether an expression holds for a note. Only a boolean `true` counts.
pub fn matches(expr: &Expr, note: &Note) -> bool {
    evaluate(expr, note).is_truthy()
}

/// Parse and evaluate in one go. A query that fails to parse is false.
pub fn eval_query(query: &str, note: &Note) -> bool {
    match parse_expression(query) {
        Ok(expr) => matches(&expr, note),
        Err(e) => {
            log::debug!("{}", e);
            false
        }
    }
}

fn evaluate_binary(op: BinaryOp, left: &Expr, right: &Expr, note: &Note) -> Value {
    // Logical operators short-circuit
    match op {
        BinaryOp::And => {
            return Value::Bool(matches(left, note) && matches(right, note));
        }
        BinaryOp::Or => {
            return Value::Bool(matches(left, note) || matches(right, note));
        }
        _ => {}
    }

    let l = evaluate(left, note);
    let r = evaluate(right, note);

    let result = match op {
        BinaryOp::Eq => equals(&l, &r),
        BinaryOp::NotEq => !equals(&l, &r),
        BinaryOp::Gt => !l.is_empty() && l.compare(&r) == Ordering::Greater,
        BinaryOp::Gte => !l.is_empty() && l.compare(&r) != Ordering::Less,
        BinaryOp::Lt => !l.is_empty() && l.compare(&r) == Ordering::Less,
        BinaryOp::Lte => !l.is_empty() && l.compare(&r) != Ordering::Greater,
        BinaryOp::On => !l.is_empty() && l.same_day(&r),
        BinaryOp::NotOn => !l.same_day(&r),
        BinaryOp::Contains => contains(&l, &r),
        BinaryOp::ContainsAnyOf => contains_any(&l, &flatten(vec![r])),
        BinaryOp::ContainsAllOf => contains_all(&l, &flatten(vec![r])),
        BinaryOp::NotContains => !l.is_empty() && !contains(&l, &r),
        BinaryOp::NotContainsAnyOf => !l.is_empty() && !contains_any(&l, &flatten(vec![r])),
        BinaryOp::NotContainsAllOf => !l.is_empty() && !contains_all(&l, &flatten(vec![r])),
        BinaryOp::StartsWith => l.to_string().starts_with(&r.to_string()),
        BinaryOp::NotStartsWith => !l.to_string().starts_with(&r.to_string()),
        BinaryOp::EndsWith => l.to_string().ends_with(&r.to_string()),
        BinaryOp::NotEndsWith => !l.to_string().ends_with(&r.to_string()),
        BinaryOp::And | BinaryOp::Or => unreachable!(),
    };
    Value::Bool(result)
}

// Equal by value, or on the same calendar day
fn equals(l: &Value, r: &Value) -> bool {
    l.compare(r) == Ordering::Equal || l.same_day(r)
}

fn evaluate_method(object: &Expr, name: &str, args: &[Expr], note: &Note) -> Value {
    let method = name.to_lowercase();

    if method == "isempty" {
        return Value::Bool(evaluate(object, note).is_empty());
    }

    let args: Vec<Value> = args.iter().map(|arg| evaluate(arg, note)).collect();
    let first = args.first().map(|a| a.to_string()).unwrap_or_default();

    if matches!(object, Expr::FieldRef(field) if field == "file") {
        match method.as_str() {
            "haslink" => return Value::Bool(has_link(note, &first)),
            "hastag" => {
                return Value::Bool(args.iter().any(|tag| note.has_tag(&tag.to_string())));
            }
            "hasproperty" => {
                let key = first.to_lowercase();
                return Value::Bool(note.frontmatter.keys().any(|k| k.to_lowercase() == key));
            }
            "infolder" => return Value::Bool(in_folder(note, &first)),
            _ => {}
        }
    }

    let obj = evaluate(object, note);
    if obj == Value::Null {
        return Value::Null;
    }

    match method.as_str() {
        "contains" => {
            let targets = flatten(args);
            match targets.first() {
                Some(target) => Value::Bool(contains(&obj, target)),
                None => Value::Bool(false),
            }
        }
        "containsany" | "containsanyof" => Value::Bool(contains_any(&obj, &flatten(args))),
        "containsall" | "containsallof" => Value::Bool(contains_all(&obj, &flatten(args))),
        "startswith" => Value::Bool(obj.to_string().starts_with(&first)),
        "endswith" => Value::Bool(obj.to_string().ends_with(&first)),
        "lower" => Value::String(obj.to_string().to_lowercase()),
        "upper" => Value::String(obj.to_string().to_uppercase()),
        "length" | "len" => match &obj {
            Value::List(items) => Value::Number(items.len() as f64),
            other => Value::Number(other.to_string().chars().count() as f64),
        },
        _ => obj,
    }
}

fn has_link(note: &Note, target: &str) -> bool {
    let name = target.rsplit('/').next().unwrap_or(target);
    let name = name.strip_suffix(".md").unwrap_or(name).to_lowercase();
    note.links
        .iter()
        .any(|link| clean_link(link).to_lowercase().contains(&name))
}

fn in_folder(note: &Note, folder: &str) -> bool {
    if folder.is_empty() || folder == "/" {
        return true;
    }
    let folder = folder.trim_matches('/');
    note.folder == folder || note.folder.starts_with(&format!("{}/", folder))
}

// ============================================================================
// Containment
// ============================================================================

/// A single list argument spreads into its items.
fn flatten(args: Vec<Value>) -> Vec<Value> {
    match <[Value; 1]>::try_from(args) {
        Ok([Value::List(items)]) => items,
        Ok([single]) => vec![single],
        Err(args) => args,
    }
}

// A list item matches when its raw text or its cleaned link target equals
// the wanted value, case-sensitively.
fn item_matches(item: &Value, wanted: &str) -> bool {
    let raw = item.to_string();
    raw == wanted || clean_link(&raw) == wanted
}

fn contains(container: &Value, target: &Value) -> bool {
    let wanted = target.to_string();
    match container.as_list() {
        Some(items) => items.iter().any(|item| item_matches(item, &wanted)),
        None => container
            .to_string()
            .to_lowercase()
            .contains(&wanted.to_lowercase()),
    }
}

fn contains_any(container: &Value, targets: &[Value]) -> bool {
    targets.iter().any(|t| contains(container, t))
}

fn contains_all(container: &Value, targets: &[Value]) -> bool {
    targets.iter().all(|t| contains(container, t))
}

// ============================================================================
// Filter, group, sort
// ============================================================================

/// Query strings combined as: all of `and`, none of `not`, and at least one
/// of `or` when any are given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub and: Vec<String>,
    pub or: Vec<String>,
    pub not: Vec<String>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty() && self.not.is_empty()
    }
}

/// Filters with every query parsed once. Unparseable queries stay as
/// `None` and never match.
struct CompiledFilters {
    and: Vec<Option<Expr>>,
    or: Vec<Option<Expr>>,
    not: Vec<Option<Expr>>,
}

impl CompiledFilters {
    fn new(filters: &Filters) -> Self {
        let compile = |queries: &[String]| -> Vec<Option<Expr>> {
            queries
                .iter()
                .map(|q| match parse_expression(q) {
                    Ok(expr) => Some(expr),
                    Err(e) => {
                        log::warn!("{}", e);
                        None
                    }
                })
                .collect()
        };
        Self {
            and: compile(&filters.and),
            or: compile(&filters.or),
            not: compile(&filters.not),
        }
    }

    fn accepts(&self, note: &Note) -> bool {
        let holds = |expr: &Option<Expr>| expr.as_ref().is_some_and(|e| matches(e, note));

        self.and.iter().all(holds)
            && !self.not.iter().any(holds)
            && (self.or.is_empty() || self.or.iter().any(holds))
    }
}

/// Keep the notes accepted by `filters`, in their original order.
pub fn filter_notes<'n>(
    notes: impl IntoIterator<Item = &'n Note>,
    filters: &Filters,
) -> Vec<&'n Note> {
    let compiled = CompiledFilters::new(filters);
    notes.into_iter().filter(|n| compiled.accepts(n)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Read a direction name; anything starting with `desc` is descending.
    pub fn from_name(name: &str) -> Self {
        if name.trim().to_lowercase().starts_with("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }
}

/// One bucket of notes sharing a field value.
#[derive(Debug, Clone)]
pub struct NoteGroup<'n> {
    pub key: String,
    pub notes: Vec<&'n Note>,
}

/// Bucket notes by the stringified value of `field`.
///
/// Blank values go to [`UNCATEGORIZED`]. Buckets come back ordered by key
/// (reversed for descending), notes keep their relative order.
pub fn group_by<'n>(notes: &[&'n Note], field: &str, direction: Direction) -> Vec<NoteGroup<'n>> {
    if field.is_empty() {
        return Vec::new();
    }

    let mut buckets: BTreeMap<String, Vec<&'n Note>> = BTreeMap::new();
    for note in notes {
        let key = field_value(note, field).to_string();
        let key = if key.trim().is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            key
        };
        buckets.entry(key).or_default().push(note);
    }

    let groups = buckets
        .into_iter()
        .map(|(key, notes)| NoteGroup { key, notes });
    match direction {
        Direction::Asc => groups.collect(),
        Direction::Desc => groups.rev().collect(),
    }
}

/// Stable sort by `field` using the ordering-operator comparison. Notes
/// without a value sort last in either direction.
pub fn sort_notes(notes: &mut [&Note], field: &str, direction: Direction) {
    notes.sort_by_cached_key(|note| SortKey {
        value: field_value(note, field),
        direction,
    });
}

struct SortKey {
    value: Value,
    direction: Direction,
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.value, &other.value) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (a, b) => match self.direction {
                Direction::Asc => a.compare(b),
                Direction::Desc => b.compare(a),
            },
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}
