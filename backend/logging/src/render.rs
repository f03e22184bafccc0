//! Text and JSON rendering of arbitrary `Serialize` values.
//!
//! - simple:    `{Name:Dog Age:5}`
//! - qualified: `my_app::Animal{Name:"Dog", Age:5}`
//!
//! Both renderers stop at [`MAX_DEPTH`] levels of nesting, which is how a
//! value that refers back to itself (e.g. through `Rc<RefCell<_>>`) is caught.

use serde::Serialize;
use serde::ser::{self, Serializer};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io;

use crate::error::LogError;

/// Deepest nesting of containers either renderer accepts.
pub const MAX_DEPTH: usize = 128;

/// Smart pointers and cells whose `Serialize` impl is transparent.
const TRANSPARENT_WRAPPERS: [&str; 5] = [
    "alloc::boxed::Box<",
    "alloc::rc::Rc<",
    "alloc::sync::Arc<",
    "alloc::borrow::Cow<",
    "core::cell::RefCell<",
];

/// Render `value` as a single line of text.
///
/// `simple` annotates values with field names only; otherwise the top-level
/// type name is included and strings are quoted. Never fails: if the value's
/// `Serialize` impl errors or nests too deep, `%!(<error>)` is appended where
/// rendering stopped.
pub fn render_value<T: Serialize + ?Sized>(value: &T, simple: bool) -> String {
    let mut renderer = Renderer {
        qualified: !simple,
        out: String::new(),
        root_type: Some(root_label(std::any::type_name::<T>())),
        depth: 0,
    };
    if let Err(err) = value.serialize(&mut renderer) {
        renderer.out.push_str(&format!("%!({err})"));
    }
    renderer.out
}

/// Serialize `value` to JSON indented by four spaces.
pub fn render_value_as_json<T: Serialize + ?Sized>(value: &T) -> Result<String, LogError> {
    let mut buf = Vec::new();
    let formatter = DepthLimited {
        inner: PrettyFormatter::with_indent(b"    "),
        depth: 0,
    };
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Type name of the value behind any reference or transparent wrapper.
fn root_label(mut name: &'static str) -> &'static str {
    loop {
        let bare = name.trim_start_matches('&').trim_start_matches("mut ");
        let bare = TRANSPARENT_WRAPPERS
            .iter()
            .find_map(|wrapper| bare.strip_prefix(wrapper)?.strip_suffix('>'))
            .unwrap_or(bare);
        if bare == name {
            return name;
        }
        name = bare;
    }
}

fn too_deep() -> String {
    format!("exceeded maximum nesting depth of {MAX_DEPTH}")
}

// ---------------------------------------------------------------------------
// JSON depth guard
// ---------------------------------------------------------------------------

/// Pretty JSON formatter that fails once arrays/objects nest past [`MAX_DEPTH`].
struct DepthLimited<'a> {
    inner: PrettyFormatter<'a>,
    depth: usize,
}

impl DepthLimited<'_> {
    fn descend(&mut self) -> io::Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(io::Error::other(too_deep()));
        }
        self.depth += 1;
        Ok(())
    }
}

impl Formatter for DepthLimited<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.descend()?;
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth -= 1;
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.descend()?;
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth -= 1;
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

// ---------------------------------------------------------------------------
// Text serializer
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct RenderError(String);

impl ser::Error for RenderError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        RenderError(msg.to_string())
    }
}

struct Renderer {
    qualified: bool,
    out: String,
    /// Full type name of the top-level value, used in place of its serde name.
    root_type: Option<&'static str>,
    depth: usize,
}

impl Renderer {
    fn qualified(&self) -> bool {
        self.qualified
    }

    fn separator(&self) -> &'static str {
        if self.qualified() { ", " } else { " " }
    }

    fn label(&mut self, serde_name: &'static str) -> &'static str {
        self.root_type.take().unwrap_or(serde_name)
    }

    fn push(&mut self, text: &str) -> Result<(), RenderError> {
        self.root_type = None;
        self.out.push_str(text);
        Ok(())
    }

    fn descend(&mut self) -> Result<(), RenderError> {
        if self.depth >= MAX_DEPTH {
            return Err(RenderError(too_deep()));
        }
        self.depth += 1;
        Ok(())
    }

    /// Serialize a value that adds no delimiters of its own, one level down.
    fn transparent<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RenderError> {
        self.root_type = None;
        self.descend()?;
        value.serialize(&mut *self)?;
        self.depth -= 1;
        Ok(())
    }

    fn open(&mut self, prefix: &str, close: &'static str) -> Result<Compound<'_>, RenderError> {
        self.descend()?;
        self.root_type = None;
        self.out.push_str(prefix);
        Ok(Compound {
            ser: self,
            first: true,
            close,
        })
    }
}

macro_rules! display_primitives {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<(), RenderError> {
                self.push(&v.to_string())
            }
        )*
    };
}

impl<'a> Serializer for &'a mut Renderer {
    type Ok = ();
    type Error = RenderError;
    type SerializeSeq = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;
    type SerializeMap = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;

    display_primitives! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_i128: i128,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_u128: u128,
        serialize_f32: f32,
        serialize_f64: f64,
    }

    fn serialize_char(self, v: char) -> Result<(), RenderError> {
        if self.qualified() {
            self.push(&format!("{v:?}"))
        } else {
            self.push(&v.to_string())
        }
    }

    fn serialize_str(self, v: &str) -> Result<(), RenderError> {
        if self.qualified() {
            self.push(&format!("{v:?}"))
        } else {
            self.push(v)
        }
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), RenderError> {
        let mut seq = self.open("[", "]")?;
        for byte in v {
            ser::SerializeSeq::serialize_element(&mut seq, byte)?;
        }
        seq.finish()
    }

    fn serialize_none(self) -> Result<(), RenderError> {
        if self.qualified() {
            self.push("nil")
        } else {
            self.push("<nil>")
        }
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), RenderError> {
        self.transparent(value)
    }

    fn serialize_unit(self) -> Result<(), RenderError> {
        self.push("{}")
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<(), RenderError> {
        if self.qualified() {
            let label = self.label(name);
            self.push(&format!("{label}{{}}"))
        } else {
            self.push("{}")
        }
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<(), RenderError> {
        if self.qualified() {
            let label = self.label(name);
            self.push(&format!("{label}::{variant}"))
        } else {
            self.push(variant)
        }
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<(), RenderError> {
        if !self.qualified() {
            return self.transparent(value);
        }
        let label = self.label(name);
        let mut inner = self.open(&format!("{label}("), ")")?;
        inner.element(value)?;
        inner.finish()
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), RenderError> {
        let prefix = self.variant_prefix(name, variant, "(");
        let mut inner = self.open(&prefix, ")")?;
        inner.element(value)?;
        inner.finish()
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'a>, RenderError> {
        self.open("[", "]")
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound<'a>, RenderError> {
        if self.qualified() {
            self.open("(", ")")
        } else {
            self.open("{", "}")
        }
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, RenderError> {
        if self.qualified() {
            let label = self.label(name);
            self.open(&format!("{label}("), ")")
        } else {
            self.open("{", "}")
        }
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, RenderError> {
        let prefix = self.variant_prefix(name, variant, "(");
        self.open(&prefix, ")")
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound<'a>, RenderError> {
        self.open("map[", "]")
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, RenderError> {
        if self.qualified() {
            let label = self.label(name);
            self.open(&format!("{label}{{"), "}")
        } else {
            self.open("{", "}")
        }
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, RenderError> {
        let prefix = self.variant_prefix(name, variant, "{");
        self.open(&prefix, "}")
    }
}

impl Renderer {
    fn variant_prefix(&mut self, name: &'static str, variant: &'static str, open: &str) -> String {
        if self.qualified() {
            let label = self.label(name);
            format!("{label}::{variant}{open}")
        } else {
            format!("{variant}{open}")
        }
    }
}

struct Compound<'a> {
    ser: &'a mut Renderer,
    first: bool,
    close: &'static str,
}

impl Compound<'_> {
    fn separate(&mut self) {
        if !self.first {
            let sep = self.ser.separator();
            self.ser.out.push_str(sep);
        }
        self.first = false;
    }

    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RenderError> {
        self.separate();
        value.serialize(&mut *self.ser)
    }

    fn field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), RenderError> {
        self.separate();
        self.ser.out.push_str(key);
        self.ser.out.push(':');
        value.serialize(&mut *self.ser)
    }

    fn finish(self) -> Result<(), RenderError> {
        self.ser.out.push_str(self.close);
        self.ser.depth -= 1;
        Ok(())
    }
}

impl ser::SerializeSeq for Compound<'_> {
    type Ok = ();
    type Error = RenderError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RenderError> {
        self.element(value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.finish()
    }
}

impl ser::SerializeTuple for Compound<'_> {
    type Ok = ();
    type Error = RenderError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RenderError> {
        self.element(value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for Compound<'_> {
    type Ok = ();
    type Error = RenderError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RenderError> {
        self.element(value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for Compound<'_> {
    type Ok = ();
    type Error = RenderError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RenderError> {
        self.element(value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.finish()
    }
}

impl ser::SerializeMap for Compound<'_> {
    type Ok = ();
    type Error = RenderError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), RenderError> {
        self.element(key)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RenderError> {
        self.ser.out.push(':');
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<(), RenderError> {
        self.finish()
    }
}

impl ser::SerializeStruct for Compound<'_> {
    type Ok = ();
    type Error = RenderError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), RenderError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for Compound<'_> {
    type Ok = ();
    type Error = RenderError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), RenderError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::SerializeStruct;
    use serde::{Deserialize, Serializer};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Animal {
        name: String,
        age: u32,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Kennel {
        owner: String,
        pets: Vec<Animal>,
        capacity: BTreeMap<String, u8>,
        nickname: Option<String>,
    }

    #[derive(Serialize)]
    enum Mood {
        Calm,
        Barking { volume: u8 },
    }

    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(ser::Error::custom("boom"))
        }
    }

    struct Node {
        next: RefCell<Option<Rc<Node>>>,
    }

    impl Serialize for Node {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut state = serializer.serialize_struct("Node", 1)?;
            state.serialize_field("next", &self.next.borrow().as_deref())?;
            state.end()
        }
    }

    /// A node whose `next` points back at itself.
    fn looped_node() -> Rc<Node> {
        let node = Rc::new(Node { next: RefCell::new(None) });
        *node.next.borrow_mut() = Some(Rc::clone(&node));
        node
    }

    fn dog() -> Animal {
        Animal { name: "Dog".into(), age: 5 }
    }

    fn kennel() -> Kennel {
        Kennel {
            owner: "Ann".into(),
            pets: vec![dog(), Animal { name: "Cat".into(), age: 2 }],
            capacity: BTreeMap::from([("big".to_string(), 2), ("small".to_string(), 4)]),
            nickname: None,
        }
    }

    #[test]
    fn simple_annotates_field_names() {
        assert_eq!(render_value(&dog(), true), "{Name:Dog Age:5}");
    }

    #[test]
    fn qualified_includes_type_name_and_quotes() {
        let out = render_value(&dog(), false);
        assert!(out.ends_with("Animal{Name:\"Dog\", Age:5}"), "{out}");
        assert!(out.contains("::"), "type name should be fully qualified: {out}");
    }

    #[test]
    fn wrappers_do_not_leak_into_type_name() {
        let plain = render_value(&dog(), false);
        assert_eq!(render_value(&Box::new(dog()), false), plain);
        assert_eq!(render_value(&Box::new(RefCell::new(dog())), false), plain);
        assert_eq!(root_label("alloc::sync::Arc<app::Animal>"), "app::Animal");
        assert_eq!(root_label("&mut alloc::boxed::Box<app::Animal>"), "app::Animal");
        assert_eq!(root_label("app::Pair<app::Animal>"), "app::Pair<app::Animal>");
    }

    #[test]
    fn self_referencing_value_stops_text_rendering() {
        let node = looped_node();
        let out = render_value(&*node, true);
        assert!(out.starts_with("{next:{next:"));
        assert!(out.ends_with(&format!("%!({})", too_deep())), "{}", &out[out.len() - 80..]);
        node.next.borrow_mut().take();
    }

    #[test]
    fn self_referencing_value_fails_json() {
        let node = looped_node();
        let err = render_value_as_json(&*node).unwrap_err();
        assert!(matches!(err, LogError::Serialization(_)));
        assert!(err.to_string().contains("maximum nesting depth"));
        node.next.borrow_mut().take();
    }

    #[test]
    fn nesting_within_limit_is_rendered() {
        let mut nested = serde_json::json!(1);
        for _ in 0..MAX_DEPTH {
            nested = serde_json::json!([nested]);
        }
        assert!(render_value_as_json(&nested).is_ok());
        assert!(!render_value(&nested, true).contains("%!"));

        let deeper = serde_json::json!([nested]);
        assert!(render_value_as_json(&deeper).is_err());
        assert!(render_value(&deeper, true).contains("%!"));
    }

    #[test]
    fn simple_never_mentions_type_names() {
        let out = render_value(&kennel(), true);
        assert_eq!(
            out,
            "{owner:Ann pets:[{Name:Dog Age:5} {Name:Cat Age:2}] capacity:map[big:2 small:4] nickname:<nil>}"
        );
        assert!(!out.contains("Kennel") && !out.contains("Animal"));
    }

    #[test]
    fn qualified_nested_values() {
        let out = render_value(&kennel(), false);
        assert!(out.contains("Kennel{owner:\"Ann\", "), "{out}");
        assert!(out.contains(
            "pets:[Animal{Name:\"Dog\", Age:5}, Animal{Name:\"Cat\", Age:2}]"
        ));
        assert!(out.ends_with("capacity:map[\"big\":2, \"small\":4], nickname:nil}"));
    }

    #[test]
    fn reference_does_not_leak_into_type_name() {
        let animal = dog();
        let by_ref = &animal;
        assert_eq!(render_value(&by_ref, false), render_value(&animal, false));
    }

    #[test]
    fn enums_and_primitives() {
        assert_eq!(render_value(&Mood::Calm, true), "Calm");
        assert!(render_value(&Mood::Calm, false).ends_with("Mood::Calm"));
        assert_eq!(render_value(&Mood::Barking { volume: 9 }, true), "Barking{volume:9}");
        assert_eq!(render_value(&42u8, false), "42");
        assert_eq!(render_value("hi", true), "hi");
        assert_eq!(render_value("hi", false), "\"hi\"");
        assert_eq!(render_value(&(1, 'x'), false), "(1, 'x')");
        assert_eq!(render_value(&(1, 'x'), true), "{1 x}");
    }

    #[test]
    fn failing_serialize_is_reported_inline() {
        assert_eq!(render_value(&Broken, true), "%!(boom)");
        let out = render_value(&vec![1, 2], true);
        assert_eq!(out, "[1 2]");
    }

    #[test]
    fn json_uses_four_space_indent() {
        let json = render_value_as_json(&dog()).unwrap();
        assert_eq!(json, "{\n    \"Name\": \"Dog\",\n    \"Age\": 5\n}");
    }

    #[test]
    fn json_round_trips_nested_values() {
        let original = kennel();
        let json = render_value_as_json(&original).unwrap();
        let parsed: Kennel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn json_rejects_unsupported_values() {
        let err = render_value_as_json(&Broken).unwrap_err();
        assert!(matches!(err, LogError::Serialization(_)));
        assert!(!err.is_fatal());

        let tuple_keys = BTreeMap::from([((1u8, 2u8), "pair")]);
        let err = render_value_as_json(&tuple_keys).unwrap_err();
        assert!(matches!(err, LogError::Serialization(_)));
    }
}
