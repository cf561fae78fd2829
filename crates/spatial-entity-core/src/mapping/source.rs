//! Scanner for mappings declared inline in Rust sources.
//!
//! Both the annotation and the attribute driver read `*.rs` files line by
//! line. Mapping tags collect until the item they describe: a `struct` line
//! opens an entity when an `entity` tag is pending, and each field line inside
//! it becomes a mapped field when an `id` or `column` tag is pending. Fields
//! without tags are not mapped. A column type that is not given is inferred
//! from the Rust type of the field.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::{parse_bool, resolve_type};
use crate::catalog::{EntityDef, FieldDef};
use crate::error::{Error, Result};
use crate::types::TypeRegistry;

static DOC_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@([A-Za-z]+)(?:\(([^)]*)\))?").expect("doc tag pattern compiles")
});

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\[\s*([A-Za-z_]+)\s*(?:\(([^)]*)\))?\s*\]").expect("attribute pattern compiles")
});

static ARG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([\w.:-]+))"#).expect("argument pattern compiles")
});

static STRUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:pub(?:\([^)]*\))?\s+)?struct\s+([A-Za-z_]\w*)").expect("struct pattern compiles")
});

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:pub(?:\([^)]*\))?\s+)?([A-Za-z_]\w*)\s*:\s*(.+?),?\s*$")
        .expect("field pattern compiles")
});

/// How mapping tags are written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagSyntax {
    /// `/// @Entity(table = "orders")`
    DocComment,
    /// `#[entity(table = "orders")]`
    Attribute,
}

/// A mapping tag with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    name: String,
    args: BTreeMap<String, String>,
}

impl Tag {
    fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }
}

const MAPPING_TAGS: [&str; 4] = ["entity", "table", "id", "column"];

impl TagSyntax {
    /// Extract the mapping tags written on one trimmed line.
    fn tags(&self, line: &str) -> Vec<Tag> {
        let re = match self {
            TagSyntax::DocComment if line.starts_with("///") => &*DOC_TAG_RE,
            TagSyntax::Attribute if line.starts_with("#[") => &*ATTRIBUTE_RE,
            _ => return Vec::new(),
        };
        re.captures_iter(line)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str().to_ascii_lowercase();
                MAPPING_TAGS.contains(&name.as_str()).then(|| Tag {
                    name,
                    args: caps.get(2).map(|a| parse_args(a.as_str())).unwrap_or_default(),
                })
            })
            .collect()
    }
}

fn parse_args(args: &str) -> BTreeMap<String, String> {
    ARG_RE
        .captures_iter(args)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_string();
            let value = caps
                .get(2)
                .map(|v| v.as_str().replace("\\\"", "\""))
                .or_else(|| caps.get(3).map(|v| v.as_str().to_string()))?;
            Some((key, value))
        })
        .collect()
}

/// Scan one source file for mapped entities.
pub(crate) fn scan(
    source: &str,
    file: &Path,
    syntax: TagSyntax,
    types: &TypeRegistry,
) -> Result<Vec<EntityDef>> {
    let mut entities = Vec::new();
    let mut pending: Vec<Tag> = Vec::new();
    let mut current: Option<EntityDef> = None;

    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        let at = |message: String| Error::mapping(file, format!("line {}: {message}", index + 1));

        if line.starts_with("//") || line.starts_with("#[") {
            pending.extend(syntax.tags(line));
            continue;
        }
        if line.is_empty() {
            continue;
        }

        if current.is_some() {
            if line.starts_with('}') {
                entities.extend(current.take());
            } else if let (Some(entity), Some(caps)) = (current.as_mut(), FIELD_RE.captures(line)) {
                let id = pending.iter().any(|t| t.name == "id");
                let column = pending.iter().find(|t| t.name == "column");
                if id || column.is_some() {
                    let field = mapped_field(&caps[1], &caps[2], column, file, types).map_err(
                        |e| match e {
                            Error::Mapping { message, .. } => at(message),
                            other => other,
                        },
                    )?;
                    entity.add_field(field, id).map_err(|e| match e {
                        Error::Mapping { message, .. } => at(message),
                        other => other,
                    })?;
                }
            }
            pending.clear();
            continue;
        }

        if let Some(caps) = STRUCT_RE.captures(line) {
            if let Some(tag) = pending.iter().find(|t| t.name == "entity") {
                if !line.ends_with('{') {
                    return Err(at(format!(
                        "entity '{}' must be a struct with named fields",
                        &caps[1]
                    )));
                }
                let table = tag
                    .arg("table")
                    .or_else(|| {
                        pending
                            .iter()
                            .find(|t| t.name == "table")
                            .and_then(|t| t.arg("name"))
                    })
                    .map(str::to_string);
                let mut entity = EntityDef::new(&caps[1]).with_source(file.display().to_string());
                if let Some(table) = table {
                    entity = entity.with_table(table);
                }
                current = Some(entity);
            }
        }
        pending.clear();
    }

    if let Some(entity) = current {
        return Err(Error::mapping(
            file,
            format!("entity '{}' is not closed", entity.name),
        ));
    }
    Ok(entities)
}

fn mapped_field(
    name: &str,
    rust_type: &str,
    column: Option<&Tag>,
    file: &Path,
    types: &TypeRegistry,
) -> Result<FieldDef> {
    let (inner_type, optional) = match rust_type
        .strip_prefix("Option<")
        .and_then(|t| t.strip_suffix('>'))
    {
        Some(inner) => (inner.trim(), true),
        None => (rust_type.trim(), false),
    };

    let type_name = match column.and_then(|c| c.arg("type")) {
        Some(explicit) => explicit,
        None => infer_type_name(inner_type).ok_or_else(|| {
            Error::mapping(
                file,
                format!("cannot infer column type of '{name}: {rust_type}', set type explicitly"),
            )
        })?,
    };

    let nullable = match column.and_then(|c| c.arg("nullable")) {
        Some(value) => parse_bool(value, file)?,
        None => optional,
    };

    let mut field = FieldDef::new(name, resolve_type(Some(type_name), file, types)?)
        .with_nullable(nullable);
    if let Some(column_name) = column.and_then(|c| c.arg("name")) {
        field = field.with_column(column_name);
    }
    Ok(field)
}

/// Mapping type name for common Rust field types.
fn infer_type_name(rust_type: &str) -> Option<&'static str> {
    let last = rust_type.rsplit("::").next().unwrap_or(rust_type);
    let name = match last {
        "bool" => "boolean",
        "i8" | "i16" | "u8" => "smallint",
        "i32" | "u16" => "integer",
        "i64" | "u32" | "u64" | "isize" | "usize" => "bigint",
        "f32" | "f64" => "float",
        "String" | "&str" | "str" => "string",
        "Decimal" => "decimal",
        "NaiveDate" => "date",
        "NaiveTime" => "time",
        "NaiveDateTime" | "SystemTime" | "OffsetDateTime" => "datetime",
        "Uuid" => "guid",
        "Vec<u8>" => "binary",
        "Value" => "json",
        _ if last.starts_with("DateTime<") => "datetime",
        _ => return None,
    };
    Some(name)
}
