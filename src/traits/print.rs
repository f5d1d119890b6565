//! # **Print Module** - *Pretty Printing with Attitude*
//!
//! Contains implementations of the Display trait
//! and an additional `Print` trait which wraps it to provide
//! `myobj.print()` for any object that implements it.
//!
//! `Content` displays as its values, previewing the first [`MAX_PREVIEW`]
//! elements; [`Content::layout_string`] renders the node tree instead.
use std::fmt::{self, Display, Formatter};

use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::traits::primitive::Float;

pub(crate) const MAX_PREVIEW: usize = 50;

/// # Print
///
/// Provides a more convenient way to activate `Display`
/// for other types such as arrays via `myarr.print()`,
/// avoiding the need to write `println!("{}", myarr);`
pub trait Print {
    #[inline]
    fn print(&self)
    where
        Self: Display,
    {
        println!("{}", self);
    }
}

impl<T: Display> Print for T where T: Display {}

/// Formats floating point numbers:
/// - Keeps up to 6 decimal digits
/// - Trims trailing zeroes and unnecessary decimal point
#[inline]
pub(crate) fn format_float<T: Float>(v: T) -> String {
    let s = format!("{:.6}", v);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

impl Display for Content {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let n = self.length();
        f.write_str("[")?;
        for i in 0..n.min(MAX_PREVIEW) {
            if i > 0 {
                f.write_str(", ")?;
            }
            match self.value_at(i) {
                Ok(v) => write!(f, "{}", v)?,
                Err(_) => f.write_str("??")?,
            }
        }
        if n > MAX_PREVIEW {
            write!(f, ", ... ({} more)", n - MAX_PREVIEW)?;
        }
        f.write_str("]")
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Element::Scalar(s) => write!(f, "{}", s),
            Element::List(c) => write!(f, "{}", c),
            Element::Record(r) => match r.to_value() {
                Ok(v) => write!(f, "{}", v),
                Err(_) => f.write_str("{??}"),
            },
            Element::None => f.write_str("None"),
        }
    }
}

fn preview_index(values: impl Iterator<Item = i64>, len: usize) -> String {
    let shown: Vec<String> = values.take(MAX_PREVIEW).map(|v| v.to_string()).collect();
    if len > MAX_PREVIEW {
        format!("[{}, ...]", shown.join(", "))
    } else {
        format!("[{}]", shown.join(", "))
    }
}

impl Content {
    /// Indented description of the node tree with index previews.
    pub fn layout_string(&self) -> String {
        let mut out = String::new();
        self.write_layout(&mut out, 0);
        out
    }

    fn write_layout(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        out.push_str(&format!("{}{} len={}", pad, self.classname(), self.length()));
        if !self.parameters().is_empty() {
            if let Ok(p) = serde_json::to_string(self.parameters()) {
                out.push_str(&format!(" parameters={}", p));
            }
        }
        out.push('\n');
        let line = |out: &mut String, name: &str, text: String| {
            out.push_str(&format!("{}  {}: {}\n", pad, name, text));
        };
        match self {
            Content::Numpy(a) => {
                line(out, "dtype", a.dtype().name().to_string());
                line(out, "shape", format!("{:?}", a.shape()));
            }
            Content::Regular(a) => line(out, "size", a.size().to_string()),
            Content::List32(a) => {
                line(out, "starts", preview_index(a.starts().iter_i64(), a.starts().len()));
                line(out, "stops", preview_index(a.stops().iter_i64(), a.stops().len()));
            }
            Content::ListU32(a) => {
                line(out, "starts", preview_index(a.starts().iter_i64(), a.starts().len()));
                line(out, "stops", preview_index(a.stops().iter_i64(), a.stops().len()));
            }
            Content::List64(a) => {
                line(out, "starts", preview_index(a.starts().iter_i64(), a.starts().len()));
                line(out, "stops", preview_index(a.stops().iter_i64(), a.stops().len()));
            }
            Content::ListOffset32(a) => {
                line(out, "offsets", preview_index(a.offsets().iter_i64(), a.offsets().len()))
            }
            Content::ListOffsetU32(a) => {
                line(out, "offsets", preview_index(a.offsets().iter_i64(), a.offsets().len()))
            }
            Content::ListOffset64(a) => {
                line(out, "offsets", preview_index(a.offsets().iter_i64(), a.offsets().len()))
            }
            Content::Indexed32(a) => {
                line(out, "index", preview_index(a.index().iter_i64(), a.index().len()))
            }
            Content::IndexedU32(a) => {
                line(out, "index", preview_index(a.index().iter_i64(), a.index().len()))
            }
            Content::Indexed64(a) => {
                line(out, "index", preview_index(a.index().iter_i64(), a.index().len()))
            }
            Content::IndexedOption32(a) => {
                line(out, "index", preview_index(a.index().iter_i64(), a.index().len()))
            }
            Content::IndexedOption64(a) => {
                line(out, "index", preview_index(a.index().iter_i64(), a.index().len()))
            }
            Content::ByteMasked(a) => {
                line(out, "valid_when", a.valid_when().to_string());
                line(out, "mask", preview_index(a.mask().iter_i64(), a.mask().len()));
            }
            Content::BitMasked(a) => {
                line(out, "valid_when", a.valid_when().to_string());
                line(out, "lsb_order", a.lsb_order().to_string());
            }
            Content::Record(a) => {
                if let Some(keys) = a.recordlookup() {
                    line(out, "fields", format!("{:?}", keys));
                }
            }
            Content::Union8I32(a) => {
                line(out, "tags", preview_index(a.tags().iter_i64(), a.tags().len()))
            }
            Content::Union8U32(a) => {
                line(out, "tags", preview_index(a.tags().iter_i64(), a.tags().len()))
            }
            Content::Union8I64(a) => {
                line(out, "tags", preview_index(a.tags().iter_i64(), a.tags().len()))
            }
            Content::Empty(_) | Content::Unmasked(_) => {}
        }
        for child in self.children() {
            child.write_layout(out, indent + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ListOffsetArray, NumpyArray, Index64};

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0f64), "1");
        assert_eq!(format_float(2.25f32), "2.25");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn test_content_display_and_layout() {
        let content: Content = NumpyArray::from_vec(vec![1.5f64, 2.0, 3.25]).into();
        let list: Content = ListOffsetArray::new(Index64::from(vec![0i64, 2, 2, 3]), content)
            .unwrap()
            .into();
        assert_eq!(list.to_string(), "[[1.5, 2], [], [3.25]]");
        let layout = list.layout_string();
        assert!(layout.starts_with("ListOffsetArray64 len=3"));
        assert!(layout.contains("offsets: [0, 2, 2, 3]"));
        assert!(layout.contains("NumpyArray len=3"));
        assert!(layout.contains("dtype: float64"));
    }
}
