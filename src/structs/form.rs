//! # **Form** - *Data-free layout description and buffer exchange*
//!
//! A [`Form`] mirrors a layout tree without any buffers: node classes,
//! index widths, dtypes, field names and parameters. Serialised with serde,
//! a form is JSON tagged by `"class"`:
//!
//! ```json
//! {"class": "ListOffsetArray", "offsets": "i64",
//!  "content": {"class": "NumpyArray", "primitive": "float64", "form_key": "node1"},
//!  "form_key": "node0"}
//! ```
//!
//! [`Content::to_buffers`] pairs a keyed form with a flat map of
//! little-endian buffers named `"{form_key}-{role}"`, and
//! [`Content::from_buffers`] rebuilds and validates the tree.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::aliases::{Index8, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::dtype::DType;
use crate::enums::error::JaggedError;
use crate::structs::bitmask::Bitmask;
use crate::structs::index::Index;
use crate::structs::variants::bit_masked::BitMaskedArray;
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::empty::EmptyArray;
use crate::structs::variants::indexed::IndexedArray;
use crate::structs::variants::indexed_option::IndexedOptionArray;
use crate::structs::variants::list::ListArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::numpy::{NumpyArray, NumpyData};
use crate::structs::variants::record::RecordArray;
use crate::structs::variants::regular::RegularArray;
use crate::structs::variants::union::UnionArray;
use crate::structs::variants::unmasked::UnmaskedArray;
use crate::traits::index_type::{IndexType, ListIndex, SignedIndex};
use crate::traits::layout::Layout;

/// Flat little-endian buffers keyed `"{form_key}-{role}"`.
pub type Buffers = BTreeMap<String, Vec<u8>>;

/// Element width of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    #[serde(rename = "i8")]
    I8,
    #[serde(rename = "u8")]
    U8,
    #[serde(rename = "i32")]
    I32,
    #[serde(rename = "u32")]
    U32,
    #[serde(rename = "i64")]
    I64,
}

impl IndexKind {
    fn of<T: IndexType>() -> IndexKind {
        match T::SUFFIX {
            "8" => IndexKind::I8,
            "U8" => IndexKind::U8,
            "32" => IndexKind::I32,
            "U32" => IndexKind::U32,
            _ => IndexKind::I64,
        }
    }
}

/// Parameters and buffer key shared by every form node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormInfo {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: Parameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Form {
    EmptyArray {
        #[serde(flatten)]
        info: FormInfo,
    },
    NumpyArray {
        primitive: DType,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        inner_shape: Vec<usize>,
        #[serde(flatten)]
        info: FormInfo,
    },
    RegularArray {
        size: usize,
        content: Box<Form>,
        #[serde(flatten)]
        info: FormInfo,
    },
    ListArray {
        starts: IndexKind,
        stops: IndexKind,
        content: Box<Form>,
        #[serde(flatten)]
        info: FormInfo,
    },
    ListOffsetArray {
        offsets: IndexKind,
        content: Box<Form>,
        #[serde(flatten)]
        info: FormInfo,
    },
    IndexedArray {
        index: IndexKind,
        content: Box<Form>,
        #[serde(flatten)]
        info: FormInfo,
    },
    IndexedOptionArray {
        index: IndexKind,
        content: Box<Form>,
        #[serde(flatten)]
        info: FormInfo,
    },
    ByteMaskedArray {
        mask: IndexKind,
        valid_when: bool,
        content: Box<Form>,
        #[serde(flatten)]
        info: FormInfo,
    },
    BitMaskedArray {
        mask: IndexKind,
        valid_when: bool,
        lsb_order: bool,
        content: Box<Form>,
        #[serde(flatten)]
        info: FormInfo,
    },
    UnmaskedArray {
        content: Box<Form>,
        #[serde(flatten)]
        info: FormInfo,
    },
    RecordArray {
        contents: Vec<Form>,
        fields: Option<Vec<String>>,
        #[serde(flatten)]
        info: FormInfo,
    },
    UnionArray {
        tags: IndexKind,
        index: IndexKind,
        contents: Vec<Form>,
        #[serde(flatten)]
        info: FormInfo,
    },
}

impl Form {
    pub fn info(&self) -> &FormInfo {
        match self {
            Form::EmptyArray { info }
            | Form::NumpyArray { info, .. }
            | Form::RegularArray { info, .. }
            | Form::ListArray { info, .. }
            | Form::ListOffsetArray { info, .. }
            | Form::IndexedArray { info, .. }
            | Form::IndexedOptionArray { info, .. }
            | Form::ByteMaskedArray { info, .. }
            | Form::BitMaskedArray { info, .. }
            | Form::UnmaskedArray { info, .. }
            | Form::RecordArray { info, .. }
            | Form::UnionArray { info, .. } => info,
        }
    }

    #[inline]
    pub fn form_key(&self) -> Option<&str> {
        self.info().form_key.as_deref()
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.info().parameters
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| JaggedError::value("Form", e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Form> {
        serde_json::from_str(text).map_err(|e| JaggedError::value("Form", format!("invalid form JSON: {}", e)))
    }
}

/// Collects buffers and hands out `node{n}` keys in depth-first order.
#[derive(Default)]
struct BufferSink {
    next: usize,
    buffers: Buffers,
}

impl BufferSink {
    fn next_key(&mut self) -> String {
        let key = format!("node{}", self.next);
        self.next += 1;
        key
    }

    fn put(&mut self, key: &str, role: &str, bytes: Vec<u8>) {
        self.buffers.insert(format!("{}-{}", key, role), bytes);
    }
}

fn index_bytes<T: IndexType>(index: &Index<T>) -> Vec<u8> {
    let mut out = Vec::with_capacity(index.len() * T::WIDTH);
    for &v in index.as_slice() {
        v.write_le(&mut out);
    }
    out
}

/// Records a buffer when writing; `bytes` is only evaluated then.
fn put(sink: &mut Option<&mut BufferSink>, key: Option<&str>, role: &str, bytes: impl FnOnce() -> Vec<u8>) {
    if let (Some(s), Some(k)) = (sink.as_deref_mut(), key) {
        s.put(k, role, bytes());
    }
}

/// Builds the form of `content`, writing buffers into `sink` when given.
fn form_of(content: &Content, mut sink: Option<&mut BufferSink>) -> Result<Form> {
    let key = sink.as_deref_mut().map(|s| s.next_key());
    let k = key.as_deref();
    let info = FormInfo {
        parameters: content.parameters().clone(),
        form_key: key.clone(),
    };
    let form = match content {
        Content::Empty(_) => Form::EmptyArray { info },
        Content::Numpy(n) => {
            put(&mut sink, k, "data", || {
                let mut bytes = Vec::with_capacity(n.data().len() * n.dtype().itemsize());
                n.data().write_le(&mut bytes);
                bytes
            });
            Form::NumpyArray {
                primitive: n.dtype(),
                inner_shape: n.inner_shape().to_vec(),
                info,
            }
        }
        Content::Regular(r) => {
            let stop = (r.length() * r.size()).min(r.content().length());
            let content = r.content().getitem_range_nowrap(0, stop)?;
            Form::RegularArray {
                size: r.size(),
                content: Box::new(form_of(&content, sink)?),
                info,
            }
        }
        Content::List32(l) => list_form(l.starts(), l.stops(), l.content(), info, sink)?,
        Content::ListU32(l) => list_form(l.starts(), l.stops(), l.content(), info, sink)?,
        Content::List64(l) => list_form(l.starts(), l.stops(), l.content(), info, sink)?,
        Content::ListOffset32(l) => list_offset_form(l.offsets(), l.content(), info, sink)?,
        Content::ListOffsetU32(l) => list_offset_form(l.offsets(), l.content(), info, sink)?,
        Content::ListOffset64(l) => list_offset_form(l.offsets(), l.content(), info, sink)?,
        Content::Indexed32(n) => indexed_form(n.index(), n.content(), false, info, sink)?,
        Content::IndexedU32(n) => indexed_form(n.index(), n.content(), false, info, sink)?,
        Content::Indexed64(n) => indexed_form(n.index(), n.content(), false, info, sink)?,
        Content::IndexedOption32(n) => indexed_form(n.index(), n.content(), true, info, sink)?,
        Content::IndexedOption64(n) => indexed_form(n.index(), n.content(), true, info, sink)?,
        Content::ByteMasked(m) => {
            put(&mut sink, k, "mask", || index_bytes(m.mask()));
            Form::ByteMaskedArray {
                mask: IndexKind::I8,
                valid_when: m.valid_when(),
                content: Box::new(form_of(m.content(), sink)?),
                info,
            }
        }
        Content::BitMasked(m) => {
            put(&mut sink, k, "mask", || m.mask().bytes().to_vec());
            Form::BitMaskedArray {
                mask: IndexKind::U8,
                valid_when: m.valid_when(),
                lsb_order: m.lsb_order(),
                content: Box::new(form_of(m.content(), sink)?),
                info,
            }
        }
        Content::Unmasked(u) => Form::UnmaskedArray {
            content: Box::new(form_of(u.content(), sink)?),
            info,
        },
        Content::Record(r) => {
            let mut contents = Vec::with_capacity(r.num_fields());
            for c in r.contents() {
                contents.push(form_of(c, sink.as_deref_mut())?);
            }
            Form::RecordArray {
                contents,
                fields: r.recordlookup().cloned(),
                info,
            }
        }
        Content::Union8I32(u) => union_form(u, info, sink)?,
        Content::Union8U32(u) => union_form(u, info, sink)?,
        Content::Union8I64(u) => union_form(u, info, sink)?,
    };
    Ok(form)
}

fn list_form<T: IndexType>(
    starts: &Index<T>,
    stops: &Index<T>,
    content: &Content,
    info: FormInfo,
    mut sink: Option<&mut BufferSink>,
) -> Result<Form> {
    let k = info.form_key.as_deref();
    put(&mut sink, k, "starts", || index_bytes(starts));
    put(&mut sink, k, "stops", || index_bytes(&stops.range(0, starts.len())));
    Ok(Form::ListArray {
        starts: IndexKind::of::<T>(),
        stops: IndexKind::of::<T>(),
        content: Box::new(form_of(content, sink)?),
        info,
    })
}

fn list_offset_form<T: IndexType>(
    offsets: &Index<T>,
    content: &Content,
    info: FormInfo,
    mut sink: Option<&mut BufferSink>,
) -> Result<Form> {
    put(&mut sink, info.form_key.as_deref(), "offsets", || index_bytes(offsets));
    Ok(Form::ListOffsetArray {
        offsets: IndexKind::of::<T>(),
        content: Box::new(form_of(content, sink)?),
        info,
    })
}

fn indexed_form<T: IndexType>(
    index: &Index<T>,
    content: &Content,
    option: bool,
    info: FormInfo,
    mut sink: Option<&mut BufferSink>,
) -> Result<Form> {
    put(&mut sink, info.form_key.as_deref(), "index", || index_bytes(index));
    let content = Box::new(form_of(content, sink)?);
    let index = IndexKind::of::<T>();
    Ok(if option {
        Form::IndexedOptionArray { index, content, info }
    } else {
        Form::IndexedArray { index, content, info }
    })
}

fn union_form<T: ListIndex>(node: &UnionArray<T>, info: FormInfo, mut sink: Option<&mut BufferSink>) -> Result<Form> {
    let k = info.form_key.as_deref();
    put(&mut sink, k, "tags", || index_bytes(node.tags()));
    put(&mut sink, k, "index", || index_bytes(&node.index().range(0, node.tags().len())));
    let mut contents = Vec::with_capacity(node.contents().len());
    for c in node.contents() {
        contents.push(form_of(c, sink.as_deref_mut())?);
    }
    Ok(Form::UnionArray {
        tags: IndexKind::I8,
        index: IndexKind::of::<T>(),
        contents,
        info,
    })
}

// --------------------------------------------------------------------
// Reading
// --------------------------------------------------------------------

fn buffer<'a>(buffers: &'a Buffers, form: &Form, role: &str) -> Result<&'a [u8]> {
    let Some(key) = form.form_key() else {
        return Err(JaggedError::value("Form", "form node without a form_key"));
    };
    let name = format!("{}-{}", key, role);
    buffers
        .get(&name)
        .map(|b| b.as_slice())
        .ok_or_else(|| JaggedError::value("Form", format!("missing buffer {:?}", name)))
}

fn read_index<T: IndexType>(buffers: &Buffers, form: &Form, role: &str, len: usize) -> Result<Index<T>> {
    let bytes = buffer(buffers, form, role)?;
    if bytes.len() < len * T::WIDTH {
        return Err(JaggedError::value(
            "Form",
            format!("buffer {} of {} bytes holds fewer than {} values", role, bytes.len(), len),
        ));
    }
    Ok(bytes.chunks_exact(T::WIDTH).take(len).map(T::read_le).collect())
}

/// Number of content elements an index reaches.
fn reach<T: IndexType>(index: &Index<T>) -> usize {
    index.iter_i64().max().map(|m| (m + 1).max(0) as usize).unwrap_or(0)
}

fn keep_u32() -> bool {
    cfg!(feature = "keep_u32_index")
}

fn unsupported(form: &str, kind: IndexKind) -> JaggedError {
    JaggedError::value("Form", format!("{} cannot have an index of kind {:?}", form, kind))
}

fn read_list<T: ListIndex>(starts: Index<T>, stops: Index<T>, content: &Form, buffers: &Buffers) -> Result<Content> {
    let reach = (0..starts.len())
        .filter(|&i| stops.get_i64(i) > starts.get_i64(i))
        .map(|i| stops.get_i64(i))
        .max()
        .unwrap_or(0)
        .max(0) as usize;
    let content = read(content, reach, buffers)?;
    Ok(ListArray::new(starts, stops, content)?.into())
}

fn read_list_offset<T: ListIndex>(offsets: Index<T>, content: &Form, buffers: &Buffers) -> Result<Content> {
    let last = offsets.len().checked_sub(1).map(|i| offsets.get_i64(i)).unwrap_or(0);
    let content = read(content, last.max(0) as usize, buffers)?;
    Ok(ListOffsetArray::new(offsets, content)?.into())
}

fn read_indexed<T: ListIndex>(index: Index<T>, content: &Form, buffers: &Buffers) -> Result<Content> {
    let content = read(content, reach(&index), buffers)?;
    Ok(IndexedArray::new(index, content)?.into())
}

fn read_indexed_option<T: SignedIndex>(index: Index<T>, content: &Form, buffers: &Buffers) -> Result<Content> {
    let content = read(content, reach(&index), buffers)?;
    Ok(IndexedOptionArray::new(index, content)?.into())
}

fn read_union<T: ListIndex>(tags: Index8, index: Index<T>, contents: &[Form], buffers: &Buffers) -> Result<Content> {
    let mut lengths = vec![0usize; contents.len()];
    for i in 0..tags.len() {
        let tag = tags.get(i);
        let Some(length) = lengths.get_mut(tag.max(0) as usize).filter(|_| tag >= 0) else {
            return Err(JaggedError::value("Form", format!("union tag {} out of range at {}", tag, i)));
        };
        *length = (*length).max((index.get_i64(i) + 1).max(0) as usize);
    }
    let contents = contents
        .iter()
        .zip(lengths)
        .map(|(form, length)| read(form, length, buffers))
        .collect::<Result<Vec<_>>>()?;
    Ok(UnionArray::new(tags, index, contents)?.into())
}

fn read(form: &Form, length: usize, buffers: &Buffers) -> Result<Content> {
    let out: Content = match form {
        Form::EmptyArray { .. } => {
            if length != 0 {
                return Err(JaggedError::value("Form", format!("EmptyArray with length {}", length)));
            }
            EmptyArray::new().into()
        }
        Form::NumpyArray {
            primitive, inner_shape, ..
        } => {
            let inner: usize = inner_shape.iter().product();
            let data = NumpyData::read_le(*primitive, buffer(buffers, form, "data")?, length * inner)?;
            let mut shape = vec![length];
            shape.extend_from_slice(inner_shape);
            NumpyArray::new(data, shape)?.into()
        }
        Form::RegularArray { size, content, .. } => {
            let content = read(content, length * size, buffers)?;
            RegularArray::new(content, *size, length)?.into()
        }
        Form::ListArray {
            starts, stops, content, ..
        } => {
            if starts != stops {
                return Err(JaggedError::value("Form", "ListArray starts and stops differ in width"));
            }
            match starts {
                IndexKind::I32 => read_list::<i32>(
                    read_index(buffers, form, "starts", length)?,
                    read_index(buffers, form, "stops", length)?,
                    content,
                    buffers,
                )?,
                IndexKind::U32 if keep_u32() => read_list::<u32>(
                    read_index(buffers, form, "starts", length)?,
                    read_index(buffers, form, "stops", length)?,
                    content,
                    buffers,
                )?,
                IndexKind::U32 => read_list::<i64>(
                    read_index::<u32>(buffers, form, "starts", length)?.to_index64(),
                    read_index::<u32>(buffers, form, "stops", length)?.to_index64(),
                    content,
                    buffers,
                )?,
                IndexKind::I64 => read_list::<i64>(
                    read_index(buffers, form, "starts", length)?,
                    read_index(buffers, form, "stops", length)?,
                    content,
                    buffers,
                )?,
                other => return Err(unsupported("ListArray", *other)),
            }
        }
        Form::ListOffsetArray { offsets, content, .. } => match offsets {
            IndexKind::I32 => read_list_offset::<i32>(read_index(buffers, form, "offsets", length + 1)?, content, buffers)?,
            IndexKind::U32 if keep_u32() => {
                read_list_offset::<u32>(read_index(buffers, form, "offsets", length + 1)?, content, buffers)?
            }
            IndexKind::U32 => read_list_offset::<i64>(
                read_index::<u32>(buffers, form, "offsets", length + 1)?.to_index64(),
                content,
                buffers,
            )?,
            IndexKind::I64 => read_list_offset::<i64>(read_index(buffers, form, "offsets", length + 1)?, content, buffers)?,
            other => return Err(unsupported("ListOffsetArray", *other)),
        },
        Form::IndexedArray { index, content, .. } => match index {
            IndexKind::I32 => read_indexed::<i32>(read_index(buffers, form, "index", length)?, content, buffers)?,
            IndexKind::U32 if keep_u32() => {
                read_indexed::<u32>(read_index(buffers, form, "index", length)?, content, buffers)?
            }
            IndexKind::U32 => read_indexed::<i64>(
                read_index::<u32>(buffers, form, "index", length)?.to_index64(),
                content,
                buffers,
            )?,
            IndexKind::I64 => read_indexed::<i64>(read_index(buffers, form, "index", length)?, content, buffers)?,
            other => return Err(unsupported("IndexedArray", *other)),
        },
        Form::IndexedOptionArray { index, content, .. } => match index {
            IndexKind::I32 => read_indexed_option::<i32>(read_index(buffers, form, "index", length)?, content, buffers)?,
            IndexKind::I64 => read_indexed_option::<i64>(read_index(buffers, form, "index", length)?, content, buffers)?,
            other => return Err(unsupported("IndexedOptionArray", *other)),
        },
        Form::ByteMaskedArray {
            mask, valid_when, content, ..
        } => {
            if *mask != IndexKind::I8 {
                return Err(unsupported("ByteMaskedArray", *mask));
            }
            let mask: Index8 = read_index(buffers, form, "mask", length)?;
            ByteMaskedArray::new(mask, read(content, length, buffers)?, *valid_when)?.into()
        }
        Form::BitMaskedArray {
            valid_when,
            lsb_order,
            content,
            ..
        } => {
            let bytes = buffer(buffers, form, "mask")?;
            let needed = length.div_ceil(8);
            if bytes.len() < needed {
                return Err(JaggedError::value(
                    "Form",
                    format!("BitMaskedArray mask of {} bytes for length {}", bytes.len(), length),
                ));
            }
            let mask = Bitmask::new(bytes[..needed].to_vec(), length);
            BitMaskedArray::new(mask, read(content, length, buffers)?, *valid_when, length, *lsb_order)?.into()
        }
        Form::UnmaskedArray { content, .. } => UnmaskedArray::new(read(content, length, buffers)?).into(),
        Form::RecordArray { contents, fields, .. } => {
            let contents = contents
                .iter()
                .map(|c| read(c, length, buffers))
                .collect::<Result<Vec<_>>>()?;
            RecordArray::new(contents, fields.clone(), Some(length))?.into()
        }
        Form::UnionArray {
            tags, index, contents, ..
        } => {
            if *tags != IndexKind::I8 {
                return Err(unsupported("UnionArray", *tags));
            }
            let tagvalues: Index8 = read_index(buffers, form, "tags", length)?;
            match index {
                IndexKind::I32 => read_union::<i32>(tagvalues, read_index(buffers, form, "index", length)?, contents, buffers)?,
                IndexKind::U32 if keep_u32() => {
                    read_union::<u32>(tagvalues, read_index(buffers, form, "index", length)?, contents, buffers)?
                }
                IndexKind::U32 => read_union::<i64>(
                    tagvalues,
                    read_index::<u32>(buffers, form, "index", length)?.to_index64(),
                    contents,
                    buffers,
                )?,
                IndexKind::I64 => read_union::<i64>(tagvalues, read_index(buffers, form, "index", length)?, contents, buffers)?,
                other => return Err(unsupported("UnionArray", *other)),
            }
        }
    };
    if form.parameters().is_empty() {
        Ok(out)
    } else {
        Ok(out.with_parameters(form.parameters().clone()))
    }
}

impl Content {
    /// The data-free description of this tree, without buffer keys.
    pub fn form(&self) -> Result<Form> {
        form_of(self, None)
    }

    /// A keyed form, the length and every buffer of the tree.
    pub fn to_buffers(&self) -> Result<(Form, usize, Buffers)> {
        let mut sink = BufferSink::default();
        let form = form_of(self, Some(&mut sink))?;
        debug!(
            "to_buffers on {} wrote {} buffers",
            self.classname(),
            sink.buffers.len()
        );
        Ok((form, self.length(), sink.buffers))
    }

    /// Rebuilds a tree from a keyed form and its buffers, then validates it.
    pub fn from_buffers(form: &Form, length: usize, buffers: &Buffers) -> Result<Content> {
        let out = read(form, length, buffers)?;
        out.validate()?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::Index64;

    fn sample() -> Content {
        let values: Content = NumpyArray::from_vec(vec![1.5f64, 2.5, 3.5]).into();
        let option: Content = IndexedOptionArray::new(Index64::from(vec![0i64, -1, 2, 1]), values)
            .unwrap()
            .into();
        let lists: Content = ListOffsetArray::new(Index64::from(vec![0i64, 2, 2, 4]), option)
            .unwrap()
            .into();
        let names: Content = ListOffsetArray::from_strings(&["a", "bc", "d"]).unwrap().into();
        RecordArray::from_fields(vec![("x", lists), ("name", names)])
            .unwrap()
            .into()
    }

    #[test]
    fn test_form_json_is_class_tagged() {
        let values: Content = NumpyArray::from_vec(vec![1i64]).into();
        let lists: Content = ListOffsetArray::new(Index64::from(vec![0i64, 1]), values)
            .unwrap()
            .into();
        let json = lists.form().unwrap().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"class":"ListOffsetArray","offsets":"i64","content":{"class":"NumpyArray","primitive":"int64"}}"#
        );
        assert_eq!(Form::from_json(&json).unwrap(), lists.form().unwrap());
    }

    #[test]
    fn test_buffers_round_trip() {
        let a = sample();
        let (form, length, buffers) = a.to_buffers().unwrap();
        assert_eq!(form.form_key(), Some("node0"));
        assert!(buffers.contains_key("node1-offsets"));
        let offsets: Vec<u8> = [0i64, 2, 2, 4].iter().flat_map(|v| v.to_le_bytes()).collect();
        assert_eq!(buffers["node1-offsets"], offsets);
        let back = Content::from_buffers(&form, length, &buffers).unwrap();
        assert_eq!(back.to_value().unwrap(), a.to_value().unwrap());
    }

    #[test]
    fn test_missing_buffer_is_value_error() {
        let (form, length, mut buffers) = sample().to_buffers().unwrap();
        buffers.remove("node3-data");
        let err = Content::from_buffers(&form, length, &buffers).unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Value);
    }

    #[test]
    fn test_bit_masked_round_trip() {
        let values: Content = NumpyArray::from_vec(vec![1i64, 2, 3]).into();
        let mask = Bitmask::from_bools(&[true, false, true], true);
        let a: Content = BitMaskedArray::new(mask, values, true, 3, true).unwrap().into();
        let (form, length, buffers) = a.to_buffers().unwrap();
        let back = Content::from_buffers(&form, length, &buffers).unwrap();
        assert_eq!(back.to_value().unwrap().to_json(), "[1,null,3]");
    }
}
