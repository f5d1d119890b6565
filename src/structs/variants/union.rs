//! # **UnionArray** - *Heterogeneous elements by tag*
//!
//! Element `i` is `contents[tags[i]][index[i]]`. Tags are `i8`, so a union
//! holds at most 127 contents. Operations that produce a union go through
//! [`UnionArray::simplify`], which merges compatible contents, flattens
//! nested unions and drops the union entirely when one content remains.

use crate::aliases::{Index64, Index8, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::kernels::getitem::index_carry;
use crate::kernels::reducers::listoffsetarray_reduce_local_outoffsets;
use crate::kernels::structure::{
    unionarray_flatten_combine, unionarray_positions, unionarray_project, unionarray_regular_index,
    unionarray_simplify, unionarray_simplify_one,
};
use crate::structs::index::Index;
use crate::structs::slice::Slice;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::traits::concatenate::merge_as_union;
use crate::traits::index_type::ListIndex;
use crate::traits::layout::Layout;

/// Tags are `i8`.
pub const MAX_UNION_CONTENTS: usize = 127;

#[derive(Clone, Debug)]
pub struct UnionArray<T> {
    tags: Index8,
    index: Index<T>,
    contents: Vec<Content>,
    parameters: Parameters,
}

impl<T: ListIndex> UnionArray<T> {
    pub fn new(tags: Index8, index: Index<T>, contents: Vec<Content>) -> Result<Self> {
        let classname = format!("UnionArray8_{}", T::SUFFIX);
        if index.len() < tags.len() {
            return Err(JaggedError::value(classname, "len(index) < len(tags)"));
        }
        if contents.is_empty() {
            return Err(JaggedError::value(classname, "a union needs at least one content"));
        }
        if contents.len() > MAX_UNION_CONTENTS {
            return Err(JaggedError::value(
                classname,
                format!("{} contents exceed the {} a union can tag", contents.len(), MAX_UNION_CONTENTS),
            ));
        }
        Ok(UnionArray {
            tags,
            index,
            contents,
            parameters: Parameters::new(),
        })
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub(crate) fn replace_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[inline]
    pub fn tags(&self) -> &Index8 {
        &self.tags
    }

    #[inline]
    pub fn index(&self) -> &Index<T> {
        &self.index
    }

    #[inline]
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    /// The elements tagged `which`, in order.
    pub fn project(&self, which: usize) -> Result<Content> {
        let Some(content) = self.contents.get(which) else {
            return Err(JaggedError::index(
                self.classname(),
                format!("no content {} in a union of {}", which, self.contents.len()),
            ));
        };
        let nextcarry = unionarray_project(&self.tags, &self.index, which as i8).ctx(&self.classname())?;
        content.carry(&nextcarry)
    }

    /// Merges mergeable contents and inlines nested unions. A single
    /// remaining content replaces the union.
    pub fn simplify(&self) -> Result<Content> {
        let classname = self.classname();
        let length = self.tags.len();
        let mut totags = vec![0i8; length];
        let mut toindex = vec![0i64; length];
        let mut outcontents: Vec<Content> = Vec::new();
        for (i, content) in self.contents.iter().enumerate() {
            if let Some((innertags, innerindex, innercontents)) = union_parts(content) {
                for (j, inner) in innercontents.iter().enumerate() {
                    let (k, offset) = absorb(&mut outcontents, inner)?;
                    unionarray_simplify(
                        &mut totags,
                        &mut toindex,
                        &self.tags,
                        &self.index,
                        &innertags,
                        &innerindex,
                        k as i8,
                        j as i8,
                        i as i8,
                        offset,
                    )
                    .ctx(&classname)?;
                }
            } else {
                let (k, offset) = absorb(&mut outcontents, content)?;
                unionarray_simplify_one(&mut totags, &mut toindex, &self.tags, &self.index, i as i8, k as i8, offset);
            }
        }
        if outcontents.len() > MAX_UNION_CONTENTS {
            return Err(JaggedError::value(
                classname,
                format!("simplified union has {} contents", outcontents.len()),
            ));
        }
        let toindex: Index64 = toindex.into();
        if outcontents.len() == 1 {
            return outcontents[0].carry(&toindex);
        }
        Ok(UnionArray::new(totags.into(), toindex, outcontents)?
            .replace_parameters(self.parameters.clone())
            .into())
    }

    fn element_position(&self, at: usize) -> Result<(usize, usize)> {
        let tag = self.tags.get(at);
        let j = self.index.get_i64(at);
        match self.contents.get(tag.max(0) as usize) {
            Some(content) if tag >= 0 && j >= 0 && (j as usize) < content.length() => Ok((tag as usize, j as usize)),
            _ => Err(JaggedError::index(
                self.classname(),
                format!("element {} has tag {} and index {}, out of range", at, tag, j),
            )),
        }
    }

    fn with_contents(&self, contents: Vec<Content>) -> Result<Content> {
        UnionArray::new(self.tags.clone(), self.index.clone(), contents)?.simplify()
    }
}

impl UnionArray<i64> {
    /// A union whose index counts up separately for every tag.
    pub fn regular(tags: Index8, contents: Vec<Content>) -> Result<Self> {
        let index = unionarray_regular_index(&tags).ctx("UnionArray8_64")?;
        UnionArray::new(tags, index, contents)
    }
}

/// Tags, widened index and contents of a union node.
pub(crate) fn union_parts(content: &Content) -> Option<(Index8, Index64, Vec<Content>)> {
    match content {
        Content::Union8I32(u) => Some((u.tags.clone(), u.index.to_index64(), u.contents.clone())),
        Content::Union8U32(u) => Some((u.tags.clone(), u.index.to_index64(), u.contents.clone())),
        Content::Union8I64(u) => Some((u.tags.clone(), u.index.clone(), u.contents.clone())),
        _ => None,
    }
}

/// Appends `content` to the first mergeable output, returning its slot and
/// the offset of the appended elements.
fn absorb(outcontents: &mut Vec<Content>, content: &Content) -> Result<(usize, i64)> {
    for (k, out) in outcontents.iter_mut().enumerate() {
        if out.mergeable(content, false) {
            let offset = out.length() as i64;
            *out = out.merge(content)?;
            return Ok((k, offset));
        }
    }
    outcontents.push(content.clone());
    Ok((outcontents.len() - 1, 0))
}

impl<T: ListIndex> Layout for UnionArray<T> {
    fn classname(&self) -> String {
        format!("UnionArray8_{}", T::SUFFIX)
    }

    fn length(&self) -> usize {
        self.tags.len()
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Content {
        self.clone().replace_parameters(parameters).into()
    }

    fn children(&self) -> Vec<Content> {
        self.contents.clone()
    }

    fn getitem_at_nowrap(&self, at: usize) -> Result<Element> {
        let (tag, j) = self.element_position(at)?;
        self.contents[tag].getitem_at_nowrap(j)
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        let (tag, j) = self.element_position(at)?;
        self.contents[tag].value_at(j)
    }

    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        Ok(UnionArray {
            tags: self.tags.range(start, stop),
            index: self.index.range(start, stop),
            contents: self.contents.clone(),
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_field(&self, key: &str) -> Result<Content> {
        let contents = self
            .contents
            .iter()
            .map(|c| c.getitem_field(key))
            .collect::<Result<Vec<_>>>()?;
        self.with_contents(contents)
    }

    fn getitem_fields(&self, keys: &[String]) -> Result<Content> {
        let contents = self
            .contents
            .iter()
            .map(|c| c.getitem_fields(keys))
            .collect::<Result<Vec<_>>>()?;
        self.with_contents(contents)
    }

    fn carry(&self, carry: &Index64) -> Result<Content> {
        let classname = self.classname();
        Ok(UnionArray {
            tags: index_carry(&self.tags, carry).ctx(&classname)?,
            index: index_carry(&self.index, carry).ctx(&classname)?,
            contents: self.contents.clone(),
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        let classname = self.classname();
        let advanced = advanced.filter(|a| !a.is_empty());
        let mut outcontents = Vec::with_capacity(self.contents.len());
        for which in 0..self.contents.len() {
            let projection = self.project(which)?;
            let nextadvanced = match advanced {
                Some(a) => {
                    let positions = unionarray_positions(&self.tags, which as i8);
                    Some(index_carry(a, &positions).ctx(&classname)?)
                }
                None => None,
            };
            outcontents.push(projection.getitem_next(Some(head), tail, nextadvanced.as_ref())?);
        }
        let outindex = unionarray_regular_index(&self.tags).ctx(&classname)?;
        UnionArray::new(self.tags.clone(), outindex, outcontents)?.simplify()
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        let classname = self.classname();
        if slicestarts.len() != self.length() || slicestops.len() < slicestarts.len() {
            return Err(JaggedError::index(
                classname.clone(),
                format!(
                    "cannot fit jagged slice with length {} into {} of size {}",
                    slicestarts.len(),
                    classname,
                    self.length()
                ),
            ));
        }
        let mut outcontents = Vec::with_capacity(self.contents.len());
        for which in 0..self.contents.len() {
            let positions = unionarray_positions(&self.tags, which as i8);
            let starts = index_carry(slicestarts, &positions).ctx(&classname)?;
            let stops = index_carry(slicestops, &positions).ctx(&classname)?;
            let projection = self.project(which)?;
            outcontents.push(projection.getitem_next_jagged(&starts, &stops, slicecontent, tail)?);
        }
        let outindex = unionarray_regular_index(&self.tags).ctx(&classname)?;
        UnionArray::new(self.tags.clone(), outindex, outcontents)?.simplify()
    }

    /// `-1` when the contents disagree.
    fn purelist_depth(&self) -> i64 {
        let mut depths = self.contents.iter().map(|c| c.purelist_depth());
        let first = depths.next().unwrap_or(1);
        if depths.all(|d| d == first) { first } else { -1 }
    }

    fn minmax_depth(&self) -> (i64, i64) {
        self.contents
            .iter()
            .map(|c| c.minmax_depth())
            .fold((i64::MAX, i64::MIN), |(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
    }

    fn branch_depth(&self) -> (bool, i64) {
        let mut depths = self.contents.iter().map(|c| c.branch_depth());
        let Some((mut branch, mut depth)) = depths.next() else {
            return (false, 1);
        };
        for (b, d) in depths {
            if b || d != depth {
                branch = true;
            }
            depth = depth.min(d);
        }
        (branch, depth)
    }

    /// Fields present in every content.
    fn keys(&self) -> Vec<String> {
        let mut contents = self.contents.iter();
        let Some(first) = contents.next() else {
            return Vec::new();
        };
        let rest: Vec<Vec<String>> = contents.map(|c| c.keys()).collect();
        first
            .keys()
            .into_iter()
            .filter(|k| rest.iter().all(|keys| keys.contains(k)))
            .collect()
    }

    fn validity_error(&self, path: &str) -> Option<String> {
        let classname = self.classname();
        if self.index.len() < self.tags.len() {
            return Some(format!("at {} ({}): len(index) < len(tags)", path, classname));
        }
        for i in 0..self.tags.len() {
            let tag = self.tags.get(i);
            let j = self.index.get_i64(i);
            let Some(content) = self.contents.get(tag.max(0) as usize).filter(|_| tag >= 0) else {
                return Some(format!("at {} ({}): tags[i] out of range at i={}", path, classname, i));
            };
            if j < 0 || j as usize >= content.length() {
                return Some(format!("at {} ({}): index[i] out of range at i={}", path, classname, i));
            }
        }
        self.contents
            .iter()
            .enumerate()
            .find_map(|(k, c)| c.validity_error_at(&format!("{}.content({})", path, k)))
    }

    fn reduce_next(
        &self,
        reducer: Reducer,
        negaxis: i64,
        starts: &Index64,
        parents: &Index64,
        outlength: usize,
        mask: bool,
        keepdims: bool,
    ) -> Result<Content> {
        let classname = self.classname();
        let simplified = self.simplify()?;
        if !simplified.is_union() {
            return simplified.reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims);
        }
        let (branch, depth) = self.branch_depth();
        if !branch && negaxis == depth {
            return Err(JaggedError::not_implemented(format!(
                "cannot reduce an irreducible union ({}) at the axis it holds",
                classname
            )));
        }
        let mut outcontents = Vec::with_capacity(self.contents.len());
        for which in 0..self.contents.len() {
            let positions = unionarray_positions(&self.tags, which as i8);
            let nextparents = index_carry(parents, &positions).ctx(&classname)?;
            let projection = self.project(which)?;
            let out = projection.reduce_next(reducer, negaxis, starts, &nextparents, outlength, mask, keepdims)?;
            if !out.is_list() {
                return Err(JaggedError::not_implemented(format!(
                    "reduction of a union content produced {} above the reduced axis",
                    out.classname()
                )));
            }
            let lists = out.to_list_offset_array64(true)?;
            outcontents.push(lists.content().getitem_range_nowrap(0, lists.content_stop())?);
        }
        let outindex = unionarray_regular_index(&self.tags).ctx(&classname)?;
        let inner = UnionArray::new(self.tags.clone(), outindex, outcontents)?.simplify()?;
        let outoffsets = listoffsetarray_reduce_local_outoffsets(parents, outlength).ctx(&classname)?;
        Ok(ListOffsetArray::new(outoffsets, inner)?.into())
    }

    fn mergeable(&self, _other: &Content, _mergebool: bool) -> bool {
        true
    }

    fn merge(&self, other: &Content) -> Result<Content> {
        merge_as_union(&self.clone().into(), other)
    }

    fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        let contents = self
            .contents
            .iter()
            .map(|c| c.num_next(axis, depth))
            .collect::<Result<Vec<_>>>()?;
        self.with_contents(contents)
    }

    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        let classname = self.classname();
        let mut offsetsraws = Vec::with_capacity(self.contents.len());
        let mut contents = Vec::with_capacity(self.contents.len());
        for content in &self.contents {
            let (offsets, flattened) = content.offsets_and_flattened(axis, depth)?;
            offsetsraws.push(offsets);
            contents.push(flattened);
        }
        if offsetsraws.iter().all(|o| o.is_none()) {
            return Ok((None, self.with_contents(contents)?));
        }
        let Some(offsetsraws) = offsetsraws.into_iter().collect::<Option<Vec<_>>>() else {
            return Err(JaggedError::value(
                classname,
                "cannot flatten a union whose contents have lists at different depths",
            ));
        };
        let (totags, toindex, tooffsets) =
            unionarray_flatten_combine(&self.tags, &self.index, &offsetsraws).ctx(&classname)?;
        let flattened = UnionArray::new(totags, toindex, contents)?.simplify()?;
        Ok((Some(tooffsets), flattened))
    }

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        let contents = self
            .contents
            .iter()
            .map(|c| c.local_index_next(axis, depth))
            .collect::<Result<Vec<_>>>()?;
        self.with_contents(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::variants::numpy::NumpyArray;

    fn mixed() -> Content {
        let numbers: Content = NumpyArray::from_vec(vec![1.5f64, 2.5]).into();
        let words: Content = ListOffsetArray::from_strings(&["one", "two"]).unwrap().into();
        UnionArray::regular(Index8::from(vec![0i8, 1, 1, 0]), vec![numbers, words])
            .unwrap()
            .into()
    }

    #[test]
    fn test_values() {
        let u = mixed();
        assert!(u.is_union());
        assert_eq!(u.classname(), "UnionArray8_64");
        assert_eq!(u.to_value().unwrap().to_json(), r#"[1.5,"one","two",2.5]"#);
    }

    #[test]
    fn test_simplify_merges_compatible_contents() {
        let a: Content = NumpyArray::from_vec(vec![1i64, 2]).into();
        let b: Content = NumpyArray::from_vec(vec![0.5f64]).into();
        let u = UnionArray::regular(Index8::from(vec![1i8, 0, 0]), vec![a, b]).unwrap();
        let simplified = u.simplify().unwrap();
        assert!(!simplified.is_union());
        assert_eq!(simplified.to_value().unwrap().to_json(), "[0.5,1.0,2.0]");
    }

    #[test]
    fn test_project_and_carry() {
        let u = mixed();
        let Content::Union8I64(node) = &u else {
            panic!("expected a union");
        };
        assert_eq!(node.project(1).unwrap().to_value().unwrap().to_json(), r#"["one","two"]"#);
        let picked = u.carry(&Index64::from(vec![3i64, 1])).unwrap();
        assert_eq!(picked.to_value().unwrap().to_json(), r#"[2.5,"one"]"#);
    }

    #[test]
    fn test_too_many_contents() {
        let contents: Vec<Content> = (0..128).map(|_| NumpyArray::from_vec(vec![0i64]).into()).collect();
        assert!(UnionArray::regular(Index8::from(vec![0i8]), contents).is_err());
    }
}
