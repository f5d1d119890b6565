//! # **Layout Trait** - *Per-kind contract of a layout node*
//!
//! Every node struct implements [`Layout`]; [`Content`] dispatches to it with
//! `match_content!`. Operations that behave the same for every kind
//! (ellipsis, newaxis, field projection, missing-value slices) live on
//! `Content` instead, so node implementations only see the heads that
//! consume a dimension: `At`, `Range`, `Array` and `Jagged`.

use crate::aliases::{Index64, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::structs::slice::Slice;

pub trait Layout: Clone + Into<Content> {
    /// Kind and index width, e.g. `"ListOffsetArray64"`.
    fn classname(&self) -> String;

    fn length(&self) -> usize;

    fn parameters(&self) -> &Parameters;

    /// The same node carrying `parameters`.
    fn with_parameters(&self, parameters: Parameters) -> Content;

    /// Direct children, in order.
    fn children(&self) -> Vec<Content>;

    /// Element `at`, with `at < length()` guaranteed by the caller.
    fn getitem_at_nowrap(&self, at: usize) -> Result<Element>;

    /// Plain value of element `at`, with `at < length()`.
    fn value_at(&self, at: usize) -> Result<Value>;

    /// Elements `[start, stop)`, with `start <= stop <= length()`.
    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content>;

    fn getitem_field(&self, key: &str) -> Result<Content>;

    fn getitem_fields(&self, keys: &[String]) -> Result<Content>;

    /// Gathers elements by position.
    fn carry(&self, carry: &Index64) -> Result<Content>;

    /// Applies a dimension-consuming `head` to the inner dimension of every
    /// element, then continues with `tail`.
    fn getitem_next(
        &self,
        head: &SliceItem,
        tail: &Slice,
        advanced: Option<&Index64>,
    ) -> Result<Content>;

    /// Applies row `i` of a jagged slice (`slicestarts[i]..slicestops[i]`
    /// into `slicecontent`) to element `i`.
    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content>;

    fn purelist_depth(&self) -> i64;

    fn minmax_depth(&self) -> (i64, i64);

    /// `(is_branching, min_depth)`
    fn branch_depth(&self) -> (bool, i64);

    fn keys(&self) -> Vec<String>;

    /// First structural violation found under `path`, if any.
    fn validity_error(&self, path: &str) -> Option<String>;

    #[allow(clippy::too_many_arguments)]
    fn reduce_next(
        &self,
        reducer: Reducer,
        negaxis: i64,
        starts: &Index64,
        parents: &Index64,
        outlength: usize,
        mask: bool,
        keepdims: bool,
    ) -> Result<Content>;

    /// Type-only check that `other` can be concatenated after this node
    /// without a union.
    fn mergeable(&self, other: &Content, mergebool: bool) -> bool;

    /// Concatenates `other` after this node. `other` is never empty, option,
    /// indexed or union; `Content::merge` routes those.
    fn merge(&self, other: &Content) -> Result<Content>;

    /// Element counts at `axis`; `depth` is this node's list depth, starting
    /// at 1 for the root.
    fn num_next(&self, axis: i64, depth: i64) -> Result<Content>;

    /// Removes the list level at `axis`. A list level that was flattened
    /// returns its offsets over the flattened content.
    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)>;

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content>;
}
