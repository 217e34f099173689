//! Selective JSON formatting.
//!
//! Coverage documents are mostly small nested objects that read well when
//! indented, plus a few huge numeric arrays that do not. The serializer
//! pretty-prints everything except subtrees whose path matches a
//! [`CompactPaths`] rule; those are rendered on their own, validated, and
//! carried through the tree as [`JsonTree::Raw`] nodes that the pretty
//! printer writes out verbatim.
//!
//! ```text
//! {
//!   "domain": {
//!     "axes": {
//!       "x": {
//!         "values": [0.0,0.5,1.0]      <- domain.axes.*.values
//!       }
//!     }
//!   }
//! }
//! ```

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::value::RawValue;
use serde_json::{Number, Value};
use std::io;

use crate::error::{CoverageError, Result};

/// Default indent width in spaces.
pub const DEFAULT_INDENT: usize = 2;

/// How a matched subtree is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompactStyle {
    /// No whitespace at all: `[1,2,3]`.
    Compact,
    /// One line with a space after separators: `[1, 2, 3]`.
    SingleLine,
}

/// A JSON tree whose nodes may be pre-rendered JSON text.
#[derive(Debug, Clone)]
pub enum JsonTree {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<JsonTree>),
    /// Object members in output order.
    Object(Vec<(String, JsonTree)>),
    /// Already-rendered JSON, written out as is.
    Raw(Box<RawValue>),
}

impl JsonTree {
    /// Wrap pre-rendered JSON text, rejecting anything that is not a
    /// complete JSON value on its own.
    pub fn raw(json: String) -> Result<Self> {
        RawValue::from_string(json)
            .map(JsonTree::Raw)
            .map_err(|e| CoverageError::SerializationIntegrity(e.to_string()))
    }

    /// Render a value in the given style and wrap it as a raw node.
    pub fn render(value: &Value, style: CompactStyle) -> Result<Self> {
        let text = match style {
            CompactStyle::Compact => serde_json::to_string(value)?,
            CompactStyle::SingleLine => {
                let mut buf = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, SingleLineFormatter);
                value.serialize(&mut ser)?;
                String::from_utf8(buf)
                    .map_err(|e| CoverageError::SerializationIntegrity(e.to_string()))?
            }
        };
        Self::raw(text)
    }

    /// Number of raw nodes in the tree.
    pub fn raw_count(&self) -> usize {
        match self {
            JsonTree::Raw(_) => 1,
            JsonTree::Array(items) => items.iter().map(JsonTree::raw_count).sum(),
            JsonTree::Object(members) => members.iter().map(|(_, v)| v.raw_count()).sum(),
            _ => 0,
        }
    }
}

impl From<Value> for JsonTree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsonTree::Null,
            Value::Bool(b) => JsonTree::Bool(b),
            Value::Number(n) => JsonTree::Number(n),
            Value::String(s) => JsonTree::String(s),
            Value::Array(items) => JsonTree::Array(items.into_iter().map(JsonTree::from).collect()),
            Value::Object(map) => {
                JsonTree::Object(map.into_iter().map(|(k, v)| (k, JsonTree::from(v))).collect())
            }
        }
    }
}

impl Serialize for JsonTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            JsonTree::Null => serializer.serialize_unit(),
            JsonTree::Bool(b) => serializer.serialize_bool(*b),
            JsonTree::Number(n) => n.serialize(serializer),
            JsonTree::String(s) => serializer.serialize_str(s),
            JsonTree::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            JsonTree::Object(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (k, v) in members {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            JsonTree::Raw(raw) => raw.serialize(serializer),
        }
    }
}

/// One segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Any,
}

/// Subtrees of a coverage document written compactly by default.
pub const COVERAGE_COMPACT_PATHS: &[&str] = &[
    "domain.axes.*.values",
    "domain.referencing.*.coordinates",
    "ranges.*.values",
    "ranges.*.shape",
    "ranges.*.axisNames",
    "ranges.*.tileSets.*.tileShape",
];

/// Subtrees of a tile document written compactly.
pub const TILE_COMPACT_PATHS: &[&str] = &["values", "shape", "axisNames"];

/// A dotted path pattern such as `ranges.*.values`.
///
/// `*` matches any single object key or array index. Array indices are
/// matched as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(CoverageError::InvalidConfig(
                "compact path pattern must not be empty".to_string(),
            ));
        }
        if pattern.split('.').any(str::is_empty) {
            return Err(CoverageError::InvalidConfig(format!(
                "compact path pattern '{}' has an empty segment",
                pattern
            )));
        }
        Ok(Self::split(pattern))
    }

    fn split(pattern: &str) -> Self {
        let segments = pattern
            .split('.')
            .map(|s| match s {
                "*" => Segment::Any,
                key => Segment::Key(key.to_string()),
            })
            .collect();
        Self { segments }
    }

    pub fn matches(&self, path: &[String]) -> bool {
        self.segments.len() == path.len()
            && self.segments.iter().zip(path).all(|(seg, part)| match seg {
                Segment::Any => true,
                Segment::Key(k) => k == part,
            })
    }
}

/// Set of path patterns rendered compactly instead of indented.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompactPaths {
    rules: Vec<(PathPattern, CompactStyle)>,
}

impl CompactPaths {
    /// No compact subtrees: plain pretty-printing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Compact rules for a full coverage document.
    pub fn coverage_defaults() -> Self {
        Self::builtin(COVERAGE_COMPACT_PATHS)
    }

    /// Compact rules for a standalone tile (`NdArray`) document.
    pub fn tile_defaults() -> Self {
        Self::builtin(TILE_COMPACT_PATHS)
    }

    fn builtin(patterns: &[&str]) -> Self {
        let rules = patterns
            .iter()
            .map(|p| (PathPattern::split(p), CompactStyle::Compact))
            .collect();
        Self { rules }
    }

    pub fn from_patterns<I, S>(patterns: I, style: CompactStyle) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths = Self::none();
        for p in patterns {
            paths.add(p.as_ref(), style)?;
        }
        Ok(paths)
    }

    pub fn add(&mut self, pattern: &str, style: CompactStyle) -> Result<()> {
        self.rules.push((PathPattern::parse(pattern)?, style));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Style of the first rule matching `path`, if any.
    pub fn style_for(&self, path: &[String]) -> Option<CompactStyle> {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, style)| *style)
    }
}

/// Pretty JSON encoder that renders selected subtrees compactly.
#[derive(Debug, Clone)]
pub struct SelectiveSerializer {
    compact: CompactPaths,
    indent: usize,
}

impl SelectiveSerializer {
    pub fn new(compact: CompactPaths, indent: usize) -> Self {
        Self { compact, indent }
    }

    /// Serializer for full coverage documents.
    pub fn for_coverage() -> Self {
        Self::new(CompactPaths::coverage_defaults(), DEFAULT_INDENT)
    }

    /// Serializer for tile documents.
    pub fn for_tiles() -> Self {
        Self::new(CompactPaths::tile_defaults(), DEFAULT_INDENT)
    }

    pub fn compact_paths(&self) -> &CompactPaths {
        &self.compact
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Convert a value into a tree, rendering matched subtrees as raw nodes.
    ///
    /// Object keys keep their serialization order.
    pub fn to_tree<T: Serialize + ?Sized>(&self, value: &T) -> Result<JsonTree> {
        let value = serde_json::to_value(value)?;
        let mut path = Vec::new();
        self.build(value, &mut path)
    }

    fn build(&self, value: Value, path: &mut Vec<String>) -> Result<JsonTree> {
        if !path.is_empty() {
            if let Some(style) = self.compact.style_for(path) {
                return JsonTree::render(&value, style);
            }
        }

        match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    path.push(i.to_string());
                    let node = self.build(item, path);
                    path.pop();
                    out.push(node?);
                }
                Ok(JsonTree::Array(out))
            }
            Value::Object(map) => {
                let mut out = Vec::with_capacity(map.len());
                for (key, item) in map {
                    path.push(key);
                    let node = self.build(item, path);
                    let key = path.pop().unwrap_or_default();
                    out.push((key, node?));
                }
                Ok(JsonTree::Object(out))
            }
            scalar => Ok(JsonTree::from(scalar)),
        }
    }

    /// Write a tree with the configured indent.
    pub fn write_tree<W: io::Write>(&self, writer: W, tree: &JsonTree) -> Result<()> {
        let indent = vec![b' '; self.indent];
        let formatter = PrettyFormatter::with_indent(&indent);
        let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
        tree.serialize(&mut ser)?;
        Ok(())
    }

    pub fn to_writer<W: io::Write, T: Serialize + ?Sized>(&self, writer: W, value: &T) -> Result<()> {
        let tree = self.to_tree(value)?;
        self.write_tree(writer, &tree)
    }

    pub fn to_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CoverageError::SerializationIntegrity(e.to_string()))
    }
}

impl Default for SelectiveSerializer {
    fn default() -> Self {
        Self::for_coverage()
    }
}

/// Single-line formatter with `", "` and `": "` separators.
#[derive(Debug, Clone, Copy, Default)]
struct SingleLineFormatter;

impl Formatter for SingleLineFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}
