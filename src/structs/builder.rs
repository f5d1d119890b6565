//! # **ArrayBuilder** - *Layouts inferred from a stream of events*
//!
//! Values arrive as events (`integer`, `begin_list`, `field`, ...) and are
//! staged in growable buffers. The staged node is promoted in place when an
//! event does not fit it: integers widen to floats, a first `null` wraps the
//! node in an option, and an unrelated kind turns it into a union.
//!
//! [`ArrayBuilder::snapshot`] turns the staged buffers into a [`Content`]
//! without consuming them, so building can continue afterwards.
//!
//! ## Example
//! ```rust
//! use jagged::ArrayBuilder;
//!
//! let mut b = ArrayBuilder::default();
//! b.integer(1).unwrap();
//! b.null().unwrap();
//! b.real(2.5).unwrap();
//! let array = b.snapshot().unwrap();
//! assert_eq!(array.to_value().unwrap().to_json(), "[1.0,null,2.5]");
//! ```

use std::fmt;

use log::debug;

use crate::aliases::{Index64, Index8, Result};
use crate::enums::content::Content;
use crate::enums::error::JaggedError;
use crate::enums::value::Value;
use crate::structs::variants::empty::EmptyArray;
use crate::structs::variants::indexed_option::IndexedOptionArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::numpy::NumpyArray;
use crate::structs::variants::record::RecordArray;
use crate::structs::variants::union::UnionArray;

/// Capacity policy for the staging buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuilderOptions {
    /// Capacity reserved by a buffer the first time it grows.
    pub initial: usize,
    /// Growth factor once a buffer is full; must exceed 1.
    pub resize: f64,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        BuilderOptions {
            initial: 1024,
            resize: 8.0,
        }
    }
}

/// Appends `value`, growing by the configured factor when full.
fn push<T>(buffer: &mut Vec<T>, value: T, options: &BuilderOptions) {
    if buffer.len() == buffer.capacity() {
        let target = if buffer.capacity() == 0 {
            options.initial.max(1)
        } else {
            (buffer.capacity() as f64 * options.resize).ceil() as usize
        };
        buffer.reserve_exact(target.saturating_sub(buffer.len()).max(1));
    }
    buffer.push(value);
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Str(String),
    BeginList,
    EndList,
    BeginTuple(usize),
    Index(usize),
    EndTuple,
    BeginRecord,
    Field(String),
    EndRecord,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Event::Null => "null",
            Event::Boolean(_) => "boolean",
            Event::Integer(_) => "integer",
            Event::Real(_) => "real",
            Event::Str(_) => "string",
            Event::BeginList => "begin_list",
            Event::EndList => "end_list",
            Event::BeginTuple(_) => "begin_tuple",
            Event::Index(_) => "index",
            Event::EndTuple => "end_tuple",
            Event::BeginRecord => "begin_record",
            Event::Field(_) => "field",
            Event::EndRecord => "end_record",
        };
        f.write_str(name)
    }
}

impl Event {
    /// Events that only make sense inside an open list, tuple or record.
    fn closes_or_addresses(&self) -> bool {
        matches!(
            self,
            Event::EndList | Event::EndTuple | Event::EndRecord | Event::Index(_) | Event::Field(_)
        )
    }
}

fn usage(event: &Event, message: impl fmt::Display) -> JaggedError {
    JaggedError::value("ArrayBuilder", format!("called '{}' {}", event, message))
}

#[derive(Debug, Clone)]
struct ListStage {
    offsets: Vec<i64>,
    content: Box<Stage>,
    begun: bool,
}

#[derive(Debug, Clone)]
struct TupleStage {
    contents: Vec<Stage>,
    length: usize,
    begun: bool,
    current: Option<usize>,
}

#[derive(Debug, Clone)]
struct RecordStage {
    fields: Vec<String>,
    contents: Vec<Stage>,
    length: usize,
    begun: bool,
    current: Option<usize>,
}

#[derive(Debug, Clone)]
struct UnionStage {
    tags: Vec<i8>,
    index: Vec<i64>,
    contents: Vec<Stage>,
    current: Option<usize>,
}

#[derive(Debug, Clone)]
struct OptionStage {
    index: Vec<i64>,
    content: Box<Stage>,
}

/// Staged node. `Unknown(n)` has seen `n` nulls and nothing else.
#[derive(Debug, Clone)]
enum Stage {
    Unknown(usize),
    Bool(Vec<bool>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    String { offsets: Vec<i64>, chars: Vec<u8> },
    List(ListStage),
    Tuple(TupleStage),
    Record(RecordStage),
    Union(UnionStage),
    Option(OptionStage),
}

impl Stage {
    fn length(&self) -> usize {
        match self {
            Stage::Unknown(n) => *n,
            Stage::Bool(v) => v.len(),
            Stage::Int64(v) => v.len(),
            Stage::Float64(v) => v.len(),
            Stage::String { offsets, .. } => offsets.len() - 1,
            Stage::List(l) => l.offsets.len() - 1,
            Stage::Tuple(t) => t.length,
            Stage::Record(r) => r.length,
            Stage::Union(u) => u.tags.len() - u.open(),
            Stage::Option(o) => o.index.len() - usize::from(o.content.active()),
        }
    }

    /// Inside an open list, tuple or record somewhere below this node.
    fn active(&self) -> bool {
        match self {
            Stage::List(l) => l.begun,
            Stage::Tuple(t) => t.begun,
            Stage::Record(r) => r.begun,
            Stage::Option(o) => o.content.active(),
            Stage::Union(u) => u.open() == 1,
            _ => false,
        }
    }

    /// Whether a union content of this kind can take `event` without
    /// becoming a union itself.
    fn accepts(&self, event: &Event) -> bool {
        match (self, event) {
            (Stage::Bool(_), Event::Boolean(_)) => true,
            (Stage::Int64(_) | Stage::Float64(_), Event::Integer(_) | Event::Real(_)) => true,
            (Stage::String { .. }, Event::Str(_)) => true,
            (Stage::List(_), Event::BeginList) => true,
            (Stage::Tuple(t), Event::BeginTuple(n)) => t.contents.len() == *n,
            (Stage::Record(_), Event::BeginRecord) => true,
            _ => false,
        }
    }

    /// A node of the kind `event` starts.
    fn fresh(event: &Event) -> Stage {
        match event {
            Event::Boolean(_) => Stage::Bool(Vec::new()),
            Event::Integer(_) => Stage::Int64(Vec::new()),
            Event::Real(_) => Stage::Float64(Vec::new()),
            Event::Str(_) => Stage::String {
                offsets: vec![0],
                chars: Vec::new(),
            },
            Event::BeginList => Stage::List(ListStage {
                offsets: vec![0],
                content: Box::new(Stage::Unknown(0)),
                begun: false,
            }),
            Event::BeginTuple(n) => Stage::Tuple(TupleStage {
                contents: (0..*n).map(|_| Stage::Unknown(0)).collect(),
                length: 0,
                begun: false,
                current: None,
            }),
            Event::BeginRecord => Stage::Record(RecordStage {
                fields: Vec::new(),
                contents: Vec::new(),
                length: 0,
                begun: false,
                current: None,
            }),
            _ => Stage::Unknown(0),
        }
    }

    fn take(&mut self) -> Stage {
        std::mem::replace(self, Stage::Unknown(0))
    }

    fn apply(&mut self, event: &Event, options: &BuilderOptions) -> Result<()> {
        match self {
            Stage::List(l) if l.begun => {
                if *event == Event::EndList && !l.content.active() {
                    let end = l.content.length() as i64;
                    push(&mut l.offsets, end, options);
                    l.begun = false;
                    return Ok(());
                }
                return l.content.apply(event, options);
            }
            Stage::Tuple(t) if t.begun => return t.apply(event, options),
            Stage::Record(r) if r.begun => return r.apply(event, options),
            Stage::Option(o) => return o.apply(event, options),
            Stage::Union(u) if u.open() == 1 => {
                return u.apply_current(event, options);
            }
            _ => {}
        }
        if event.closes_or_addresses() {
            return Err(usage(event, "outside of the list, tuple or record it belongs to"));
        }

        match (&mut *self, event) {
            (Stage::Unknown(n), Event::Null) => *n += 1,
            (Stage::Unknown(n), _) => {
                let nulls = *n;
                if nulls == 0 {
                    *self = Stage::fresh(event);
                    self.apply(event, options)?;
                } else {
                    let mut option = OptionStage {
                        index: vec![-1; nulls],
                        content: Box::new(Stage::Unknown(0)),
                    };
                    option.apply(event, options)?;
                    *self = Stage::Option(option);
                }
            }
            (Stage::Bool(v), Event::Boolean(x)) => push(v, *x, options),
            (Stage::Int64(v), Event::Integer(x)) => push(v, *x, options),
            (Stage::Int64(v), Event::Real(x)) => {
                let mut promoted: Vec<f64> = Vec::with_capacity(v.capacity());
                promoted.extend(v.iter().map(|&i| i as f64));
                push(&mut promoted, *x, options);
                *self = Stage::Float64(promoted);
            }
            (Stage::Float64(v), Event::Integer(x)) => push(v, *x as f64, options),
            (Stage::Float64(v), Event::Real(x)) => push(v, *x, options),
            (Stage::String { offsets, chars }, Event::Str(s)) => {
                for &byte in s.as_bytes() {
                    push(chars, byte, options);
                }
                push(offsets, chars.len() as i64, options);
            }
            (Stage::List(l), Event::BeginList) => l.begun = true,
            (Stage::Tuple(t), Event::BeginTuple(n)) if t.contents.len() == *n => {
                t.begun = true;
                t.current = None;
            }
            (Stage::Record(r), Event::BeginRecord) => {
                r.begun = true;
                r.current = None;
            }
            (Stage::Union(u), _) if *event != Event::Null => u.apply_new(event, options)?,
            (_, Event::Null) => {
                let length = self.length();
                let content = self.take();
                let mut index = Vec::with_capacity(length + 1);
                index.extend(0..length as i64);
                push(&mut index, -1, options);
                *self = Stage::Option(OptionStage {
                    index,
                    content: Box::new(content),
                });
            }
            (_, _) => {
                let length = self.length();
                let content = self.take();
                let mut union = UnionStage {
                    tags: vec![0; length],
                    index: (0..length as i64).collect(),
                    contents: vec![content],
                    current: None,
                };
                union.apply_new(event, options)?;
                *self = Stage::Union(union);
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Content> {
        match self {
            Stage::Unknown(0) => Ok(EmptyArray::new().into()),
            Stage::Unknown(n) => {
                Ok(IndexedOptionArray::new(Index64::from(vec![-1i64; *n]), EmptyArray::new().into())?.into())
            }
            Stage::Bool(v) => Ok(NumpyArray::from_vec(v.clone()).into()),
            Stage::Int64(v) => Ok(NumpyArray::from_vec(v.clone()).into()),
            Stage::Float64(v) => Ok(NumpyArray::from_vec(v.clone()).into()),
            Stage::String { offsets, chars } => {
                let chars = NumpyArray::from_vec(chars.clone()).with_parameter("__array__", "char");
                Ok(ListOffsetArray::new(Index64::from(offsets.clone()), chars.into())?
                    .with_parameter("__array__", "string")
                    .into())
            }
            Stage::List(l) => {
                Ok(ListOffsetArray::new(Index64::from(l.offsets.clone()), l.content.snapshot()?)?.into())
            }
            Stage::Tuple(t) => {
                let contents = t.contents.iter().map(Stage::snapshot).collect::<Result<Vec<_>>>()?;
                Ok(RecordArray::new(contents, None, Some(t.length))?.into())
            }
            Stage::Record(r) => {
                let contents = r.contents.iter().map(Stage::snapshot).collect::<Result<Vec<_>>>()?;
                Ok(RecordArray::new(contents, Some(r.fields.clone()), Some(r.length))?.into())
            }
            Stage::Union(u) => {
                let contents = u.contents.iter().map(Stage::snapshot).collect::<Result<Vec<_>>>()?;
                let n = u.tags.len() - u.open();
                let tags = Index8::from(u.tags[..n].to_vec());
                Ok(UnionArray::new(tags, Index64::from(u.index[..n].to_vec()), contents)?.into())
            }
            Stage::Option(o) => {
                // an entry whose list or record is still open is left out
                let n = self.length();
                Ok(IndexedOptionArray::new(Index64::from(o.index[..n].to_vec()), o.content.snapshot()?)?.into())
            }
        }
    }
}

impl OptionStage {
    fn apply(&mut self, event: &Event, options: &BuilderOptions) -> Result<()> {
        if self.content.active() {
            return self.content.apply(event, options);
        }
        match event {
            Event::Null => push(&mut self.index, -1, options),
            e if e.closes_or_addresses() => {
                return Err(usage(e, "outside of the list, tuple or record it belongs to"));
            }
            e => {
                let position = self.content.length() as i64;
                self.content.apply(e, options)?;
                push(&mut self.index, position, options);
            }
        }
        Ok(())
    }
}

impl UnionStage {
    /// 1 while the latest entry is still open.
    fn open(&self) -> usize {
        usize::from(self.current.is_some_and(|j| self.contents[j].active()))
    }

    fn apply_current(&mut self, event: &Event, options: &BuilderOptions) -> Result<()> {
        if let Some(j) = self.current {
            self.contents[j].apply(event, options)?;
            if !self.contents[j].active() {
                self.current = None;
            }
        }
        Ok(())
    }

    /// Routes a value or `begin_*` event to a content of its kind, adding
    /// one if none fits.
    fn apply_new(&mut self, event: &Event, options: &BuilderOptions) -> Result<()> {
        let j = match self.contents.iter().position(|c| c.accepts(event)) {
            Some(j) => j,
            None => {
                if self.contents.len() >= i8::MAX as usize {
                    return Err(usage(event, "on a union that already has 127 contents"));
                }
                self.contents.push(Stage::Unknown(0));
                self.contents.len() - 1
            }
        };
        let position = self.contents[j].length() as i64;
        self.contents[j].apply(event, options)?;
        push(&mut self.tags, j as i8, options);
        push(&mut self.index, position, options);
        self.current = self.contents[j].active().then_some(j);
        Ok(())
    }
}

/// Checks every slot of a tuple or record against the number of completed
/// entries before the entry is closed, then pads unset slots with null.
fn close_entry(contents: &mut [Stage], length: usize, event: &Event, options: &BuilderOptions) -> Result<()> {
    if let Some(extra) = contents.iter().find(|c| c.length() > length + 1) {
        return Err(usage(
            event,
            format!("after {} values were given for one slot", extra.length() - length),
        ));
    }
    for content in contents.iter_mut() {
        if content.length() == length {
            content.apply(&Event::Null, options)?;
        }
    }
    Ok(())
}

impl TupleStage {
    fn apply(&mut self, event: &Event, options: &BuilderOptions) -> Result<()> {
        if let Some(j) = self.current {
            if self.contents[j].active() {
                return self.contents[j].apply(event, options);
            }
        }
        match event {
            Event::Index(i) => {
                if *i >= self.contents.len() {
                    return Err(usage(
                        event,
                        format!("with {} on a tuple of {} slots", i, self.contents.len()),
                    ));
                }
                self.current = Some(*i);
            }
            Event::EndTuple => {
                close_entry(&mut self.contents, self.length, event, options)?;
                self.length += 1;
                self.begun = false;
                self.current = None;
            }
            Event::EndList | Event::EndRecord | Event::Field(_) => {
                return Err(usage(event, "inside a tuple"));
            }
            _ => match self.current {
                Some(j) => self.contents[j].apply(event, options)?,
                None => return Err(usage(event, "inside a tuple without 'index' before it")),
            },
        }
        Ok(())
    }
}

impl RecordStage {
    fn apply(&mut self, event: &Event, options: &BuilderOptions) -> Result<()> {
        if let Some(j) = self.current {
            if self.contents[j].active() {
                return self.contents[j].apply(event, options);
            }
        }
        match event {
            Event::Field(key) => {
                let j = match self.fields.iter().position(|f| f == key) {
                    Some(j) => j,
                    None => {
                        self.fields.push(key.clone());
                        // earlier records lack this field
                        self.contents.push(Stage::Unknown(self.length));
                        self.fields.len() - 1
                    }
                };
                self.current = Some(j);
            }
            Event::EndRecord => {
                close_entry(&mut self.contents, self.length, event, options)?;
                self.length += 1;
                self.begun = false;
                self.current = None;
            }
            Event::EndList | Event::EndTuple | Event::Index(_) => {
                return Err(usage(event, "inside a record"));
            }
            _ => match self.current {
                Some(j) => self.contents[j].apply(event, options)?,
                None => return Err(usage(event, "inside a record without 'field' before it")),
            },
        }
        Ok(())
    }
}

/// Builds a [`Content`] from a stream of events, choosing the layout as it
/// goes.
#[derive(Debug, Clone)]
pub struct ArrayBuilder {
    root: Stage,
    options: BuilderOptions,
}

impl Default for ArrayBuilder {
    fn default() -> Self {
        ArrayBuilder {
            root: Stage::Unknown(0),
            options: BuilderOptions::default(),
        }
    }
}

impl ArrayBuilder {
    pub fn new(options: BuilderOptions) -> Result<Self> {
        if options.resize.is_nan() || options.resize <= 1.0 {
            return Err(JaggedError::value(
                "ArrayBuilder",
                format!("resize must be greater than 1, not {}", options.resize),
            ));
        }
        Ok(ArrayBuilder {
            root: Stage::Unknown(0),
            options,
        })
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Completed top-level entries.
    pub fn length(&self) -> usize {
        self.root.length()
    }

    /// Discards everything staged so far.
    pub fn clear(&mut self) {
        self.root = Stage::Unknown(0);
    }

    fn event(&mut self, event: Event) -> Result<()> {
        self.root.apply(&event, &self.options)
    }

    pub fn null(&mut self) -> Result<()> {
        self.event(Event::Null)
    }

    pub fn boolean(&mut self, x: bool) -> Result<()> {
        self.event(Event::Boolean(x))
    }

    pub fn integer(&mut self, x: i64) -> Result<()> {
        self.event(Event::Integer(x))
    }

    pub fn real(&mut self, x: f64) -> Result<()> {
        self.event(Event::Real(x))
    }

    pub fn string(&mut self, x: &str) -> Result<()> {
        self.event(Event::Str(x.to_string()))
    }

    pub fn begin_list(&mut self) -> Result<()> {
        self.event(Event::BeginList)
    }

    pub fn end_list(&mut self) -> Result<()> {
        self.event(Event::EndList)
    }

    /// Opens a tuple of `numfields` slots; fill them with [`Self::index`].
    pub fn begin_tuple(&mut self, numfields: usize) -> Result<()> {
        self.event(Event::BeginTuple(numfields))
    }

    pub fn index(&mut self, i: usize) -> Result<()> {
        self.event(Event::Index(i))
    }

    /// Closes the tuple; slots not given a value are null.
    pub fn end_tuple(&mut self) -> Result<()> {
        self.event(Event::EndTuple)
    }

    pub fn begin_record(&mut self) -> Result<()> {
        self.event(Event::BeginRecord)
    }

    pub fn field(&mut self, key: &str) -> Result<()> {
        self.event(Event::Field(key.to_string()))
    }

    /// Closes the record; fields not given a value are null.
    pub fn end_record(&mut self) -> Result<()> {
        self.event(Event::EndRecord)
    }

    /// Appends a whole value as the matching events.
    pub fn append(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.null(),
            Value::Bool(b) => self.boolean(*b),
            Value::Int(i) => self.integer(*i),
            Value::UInt(u) => match i64::try_from(*u) {
                Ok(i) => self.integer(i),
                Err(_) => self.real(*u as f64),
            },
            Value::Float(x) => self.real(*x),
            Value::Str(s) => self.string(s),
            Value::List(items) => {
                self.begin_list()?;
                for item in items {
                    self.append(item)?;
                }
                self.end_list()
            }
            Value::Tuple(items) => {
                self.begin_tuple(items.len())?;
                for (i, item) in items.iter().enumerate() {
                    self.index(i)?;
                    self.append(item)?;
                }
                self.end_tuple()
            }
            Value::Record(fields) => {
                self.begin_record()?;
                for (key, item) in fields {
                    self.field(key)?;
                    self.append(item)?;
                }
                self.end_record()
            }
        }
    }

    /// The completed entries as a layout. The staged buffers are untouched.
    pub fn snapshot(&self) -> Result<Content> {
        let content = self.root.snapshot()?;
        debug!("ArrayBuilder snapshot: {} of length {}", content.classname(), content.length());
        content.checked()
    }

    /// One entry per value.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Result<Content> {
        let mut builder = ArrayBuilder::default();
        for value in values {
            builder.append(value)?;
        }
        builder.snapshot()
    }

    /// A JSON array gives one entry per item; any other JSON value gives a
    /// single entry.
    pub fn from_json(text: &str) -> Result<Content> {
        match Value::from_json(text)? {
            Value::List(items) => Self::from_values(&items),
            other => Self::from_values([&other]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(b: &ArrayBuilder) -> String {
        b.snapshot().unwrap().to_value().unwrap().to_json()
    }

    #[test]
    fn test_empty_and_nulls_only() {
        let mut b = ArrayBuilder::default();
        assert_eq!(b.snapshot().unwrap().classname(), "EmptyArray");
        b.null().unwrap();
        b.null().unwrap();
        assert_eq!(b.snapshot().unwrap().classname(), "IndexedOptionArray64");
        assert_eq!(json(&b), "[null,null]");
    }

    #[test]
    fn test_integers_promote_to_floats() {
        let mut b = ArrayBuilder::default();
        b.integer(1).unwrap();
        b.integer(2).unwrap();
        b.real(0.5).unwrap();
        b.integer(3).unwrap();
        assert_eq!(json(&b), "[1.0,2.0,0.5,3.0]");
    }

    #[test]
    fn test_leading_nulls_become_option() {
        let mut b = ArrayBuilder::default();
        b.null().unwrap();
        b.string("a").unwrap();
        b.null().unwrap();
        b.string("bc").unwrap();
        assert_eq!(json(&b), r#"[null,"a",null,"bc"]"#);
    }

    #[test]
    fn test_nested_lists() {
        let mut b = ArrayBuilder::default();
        for row in [vec![vec![1i64, 2], vec![]], vec![], vec![vec![3]]] {
            b.begin_list().unwrap();
            for inner in row {
                b.begin_list().unwrap();
                for x in inner {
                    b.integer(x).unwrap();
                }
                b.end_list().unwrap();
            }
            b.end_list().unwrap();
        }
        let array = b.snapshot().unwrap();
        assert_eq!(array.purelist_depth(), 3);
        assert_eq!(array.to_value().unwrap().to_json(), "[[[1,2],[]],[],[[3]]]");
    }

    #[test]
    fn test_mixed_kinds_become_union() {
        let mut b = ArrayBuilder::default();
        b.integer(1).unwrap();
        b.string("two").unwrap();
        b.begin_list().unwrap();
        b.real(3.5).unwrap();
        b.end_list().unwrap();
        b.integer(4).unwrap();
        let array = b.snapshot().unwrap();
        assert!(array.is_union());
        assert_eq!(array.to_value().unwrap().to_json(), r#"[1,"two",[3.5],4]"#);
    }

    #[test]
    fn test_records_fill_missing_fields() {
        let mut b = ArrayBuilder::default();
        b.begin_record().unwrap();
        b.field("x").unwrap();
        b.integer(1).unwrap();
        b.end_record().unwrap();
        b.begin_record().unwrap();
        b.field("y").unwrap();
        b.begin_list().unwrap();
        b.real(2.5).unwrap();
        b.end_list().unwrap();
        b.field("x").unwrap();
        b.integer(2).unwrap();
        b.end_record().unwrap();
        assert_eq!(json(&b), r#"[{"x":1,"y":null},{"x":2,"y":[2.5]}]"#);
    }

    #[test]
    fn test_tuples() {
        let mut b = ArrayBuilder::default();
        b.begin_tuple(2).unwrap();
        b.index(0).unwrap();
        b.integer(1).unwrap();
        b.index(1).unwrap();
        b.string("a").unwrap();
        b.end_tuple().unwrap();
        b.begin_tuple(2).unwrap();
        b.index(1).unwrap();
        b.string("b").unwrap();
        b.end_tuple().unwrap();
        assert_eq!(b.length(), 2);
        assert!(b.index(0).is_err());
        assert_eq!(
            b.snapshot().unwrap().to_value().unwrap(),
            Value::List(vec![
                Value::Tuple(vec![Value::Int(1), Value::Str("a".into())]),
                Value::Tuple(vec![Value::Null, Value::Str("b".into())]),
            ])
        );
    }

    #[test]
    fn test_mismatched_end_leaves_builder_unchanged() {
        let mut b = ArrayBuilder::default();
        b.begin_list().unwrap();
        b.integer(1).unwrap();
        let before = json(&b);
        assert!(b.end_record().is_err());
        assert!(b.end_tuple().is_err());
        assert_eq!(json(&b), before);
        b.end_list().unwrap();
        assert!(b.end_list().is_err());
        assert_eq!(json(&b), "[[1]]");
    }

    #[test]
    fn test_value_inside_record_needs_field() {
        let mut b = ArrayBuilder::default();
        b.begin_record().unwrap();
        assert!(b.integer(1).is_err());
    }

    #[test]
    fn test_snapshot_does_not_disturb_building() {
        let mut b = ArrayBuilder::default();
        b.begin_list().unwrap();
        b.integer(1).unwrap();
        b.end_list().unwrap();
        b.begin_list().unwrap();
        b.integer(2).unwrap();
        // the open list is not part of the snapshot
        assert_eq!(json(&b), "[[1]]");
        assert_eq!(json(&b), "[[1]]");
        b.integer(3).unwrap();
        b.end_list().unwrap();
        assert_eq!(json(&b), "[[1],[2,3]]");
    }

    #[test]
    fn test_from_json_round_trip() {
        let text = r#"[{"x":1,"y":[1.5,null]},null,{"x":3,"y":[]}]"#;
        let array = ArrayBuilder::from_json(text).unwrap();
        assert_eq!(array.length(), 3);
        assert_eq!(array.to_value().unwrap().to_json(), text);
    }

    #[test]
    fn test_options_validated() {
        let bad = BuilderOptions { initial: 16, resize: 1.0 };
        assert!(ArrayBuilder::new(bad).is_err());
        let mut b = ArrayBuilder::new(BuilderOptions { initial: 2, resize: 1.5 }).unwrap();
        for i in 0..10 {
            b.integer(i).unwrap();
        }
        assert_eq!(json(&b), "[0,1,2,3,4,5,6,7,8,9]");
    }
}
