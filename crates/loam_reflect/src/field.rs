//! Field descriptors
//!
//! A [`FieldDescriptor`] reads or rewrites one field of a component value.
//! Components are values, so `set` never writes through a reference: it builds
//! a new whole value and hands it back for the caller to store.

use std::fmt;
use std::sync::Arc;

use loam_core::{Color, Guid, Rect, Vec2};
use loam_ecs::{BoxedComponent, Component, ComponentValue};
use serde_json::{json, Value};

/// Closed set of field kinds tooling knows how to edit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Float,
    Int,
    Bool,
    String,
    Vector2,
    Color,
    Rectangle,
    Enum,
    Guid,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Float => "float",
            FieldKind::Int => "int",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Vector2 => "vector2",
            FieldKind::Color => "color",
            FieldKind::Rectangle => "rectangle",
            FieldKind::Enum => "enum",
            FieldKind::Guid => "guid",
        };
        f.write_str(name)
    }
}

/// A field value, tagged with its kind
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Int(i64),
    Bool(bool),
    String(String),
    Vector2(Vec2),
    Color(Color),
    Rectangle(Rect),
    /// Variant index
    Enum(i32),
    Guid(Guid),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Vector2(_) => FieldKind::Vector2,
            FieldValue::Color(_) => FieldKind::Color,
            FieldValue::Rectangle(_) => FieldKind::Rectangle,
            FieldValue::Enum(_) => FieldKind::Enum,
            FieldValue::Guid(_) => FieldKind::Guid,
        }
    }

    /// Convert to `kind` where the conversion loses nothing.
    ///
    /// Ints widen to floats, integral floats narrow to ints, and ints and enum
    /// indices convert both ways.
    pub fn coerce(self, kind: FieldKind) -> Option<FieldValue> {
        if self.kind() == kind {
            return Some(self);
        }
        match (self, kind) {
            (FieldValue::Int(i), FieldKind::Float) => Some(FieldValue::Float(i as f32)),
            (FieldValue::Float(f), FieldKind::Int) if f.fract() == 0.0 => {
                Some(FieldValue::Int(f as i64))
            }
            (FieldValue::Int(i), FieldKind::Enum) => i32::try_from(i).ok().map(FieldValue::Enum),
            (FieldValue::Enum(i), FieldKind::Int) => Some(FieldValue::Int(i as i64)),
            _ => None,
        }
    }

    /// Encode as JSON. Enum indices are written as variant names when known.
    pub fn to_json(&self, variants: Option<&[String]>) -> Value {
        match self {
            FieldValue::Float(f) => json!(f),
            FieldValue::Int(i) => json!(i),
            FieldValue::Bool(b) => json!(b),
            FieldValue::String(s) => json!(s),
            FieldValue::Vector2(v) => json!({ "x": v.x, "y": v.y }),
            FieldValue::Color(c) => json!({ "r": c.r, "g": c.g, "b": c.b, "a": c.a }),
            FieldValue::Rectangle(r) => {
                json!({ "x": r.x, "y": r.y, "width": r.width, "height": r.height })
            }
            FieldValue::Enum(i) => {
                let name = variants.and_then(|v| usize::try_from(*i).ok().and_then(|i| v.get(i)));
                match name {
                    Some(name) => json!(name),
                    None => json!(i),
                }
            }
            FieldValue::Guid(g) => json!(g.as_str()),
        }
    }

    /// Decode JSON as a value of `kind`. Returns `None` if the shape is wrong.
    pub fn from_json(kind: FieldKind, json: &Value, variants: Option<&[String]>) -> Option<Self> {
        match kind {
            FieldKind::Float => json.as_f64().map(|f| FieldValue::Float(f as f32)),
            FieldKind::Int => json.as_i64().map(FieldValue::Int),
            FieldKind::Bool => json.as_bool().map(FieldValue::Bool),
            FieldKind::String => json.as_str().map(|s| FieldValue::String(s.to_string())),
            FieldKind::Vector2 => vec2_from_json(json).map(FieldValue::Vector2),
            FieldKind::Color => {
                let r = number(json, "r")?;
                let g = number(json, "g")?;
                let b = number(json, "b")?;
                let a = match json.get("a") {
                    Some(a) => a.as_f64()? as f32,
                    None => 1.0,
                };
                Some(FieldValue::Color(Color::new(r, g, b, a)))
            }
            FieldKind::Rectangle => Some(FieldValue::Rectangle(Rect::new(
                number(json, "x")?,
                number(json, "y")?,
                number(json, "width")?,
                number(json, "height")?,
            ))),
            FieldKind::Enum => match json {
                Value::String(name) => variants?
                    .iter()
                    .position(|v| v == name)
                    .map(|i| FieldValue::Enum(i as i32)),
                other => other
                    .as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .map(FieldValue::Enum),
            },
            FieldKind::Guid => json.as_str().map(|s| FieldValue::Guid(Guid::from(s))),
        }
    }
}

fn number(json: &Value, key: &str) -> Option<f32> {
    json.get(key)?.as_f64().map(|f| f as f32)
}

/// Vectors are written as `{x, y}`; `[x, y]` is accepted on read
fn vec2_from_json(json: &Value) -> Option<Vec2> {
    match json {
        Value::Array(items) if items.len() == 2 => Some(Vec2::new(
            items[0].as_f64()? as f32,
            items[1].as_f64()? as f32,
        )),
        _ => Some(Vec2::new(number(json, "x")?, number(json, "y")?)),
    }
}

/// Rust types that map onto a [`FieldKind`]
pub trait FieldType: Sized + 'static {
    const KIND: FieldKind;
    fn into_field(self) -> FieldValue;
    fn from_field(value: FieldValue) -> Option<Self>;
}

macro_rules! impl_field_type {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl FieldType for $ty {
            const KIND: FieldKind = FieldKind::$kind;

            fn into_field(self) -> FieldValue {
                FieldValue::$variant(self)
            }

            fn from_field(value: FieldValue) -> Option<Self> {
                match value.coerce(FieldKind::$kind)? {
                    FieldValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_field_type!(f32, Float, Float);
impl_field_type!(i64, Int, Int);
impl_field_type!(bool, Bool, Bool);
impl_field_type!(String, String, String);
impl_field_type!(Vec2, Vector2, Vector2);
impl_field_type!(Color, Color, Color);
impl_field_type!(Rect, Rectangle, Rectangle);
impl_field_type!(Guid, Guid, Guid);

impl FieldType for i32 {
    const KIND: FieldKind = FieldKind::Int;

    fn into_field(self) -> FieldValue {
        FieldValue::Int(self as i64)
    }

    fn from_field(value: FieldValue) -> Option<Self> {
        i64::from_field(value).and_then(|i| i32::try_from(i).ok())
    }
}

type Getter = Arc<dyn Fn(&dyn ComponentValue) -> Option<FieldValue> + Send + Sync>;
type Setter = Arc<dyn Fn(&dyn ComponentValue, FieldValue) -> Option<BoxedComponent> + Send + Sync>;

/// Metadata plus accessors for one field of one component type
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    enum_variants: Option<Vec<String>>,
    range: Option<(f32, f32)>,
    tooltip: Option<String>,
    getter: Getter,
    setter: Setter,
}

impl FieldDescriptor {
    /// Build from raw accessors over erased values.
    ///
    /// The getter must return values of `kind`; anything else is rejected by
    /// [`get`](Self::get).
    pub fn from_accessors(
        name: impl Into<String>,
        kind: FieldKind,
        getter: impl Fn(&dyn ComponentValue) -> Option<FieldValue> + Send + Sync + 'static,
        setter: impl Fn(&dyn ComponentValue, FieldValue) -> Option<BoxedComponent>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            enum_variants: None,
            range: None,
            tooltip: None,
            getter: Arc::new(getter),
            setter: Arc::new(setter),
        }
    }

    /// Field of a compile-time component type
    pub fn of<T: Component, F: FieldType>(
        name: impl Into<String>,
        get: fn(&T) -> F,
        set: fn(&mut T, F),
    ) -> Self {
        Self::from_accessors(
            name,
            F::KIND,
            move |value: &dyn ComponentValue| value.downcast_ref::<T>().map(|v| get(v).into_field()),
            move |value: &dyn ComponentValue, field: FieldValue| {
                let mut next = value.downcast_ref::<T>()?.clone();
                set(&mut next, F::from_field(field)?);
                Some(Box::new(next) as BoxedComponent)
            },
        )
    }

    /// Enum field of a compile-time component type, addressed by variant index
    pub fn enumeration<T: Component>(
        name: impl Into<String>,
        variants: &[&str],
        get: fn(&T) -> i32,
        set: fn(&mut T, i32) -> bool,
    ) -> Self {
        Self::from_accessors(
            name,
            FieldKind::Enum,
            move |value: &dyn ComponentValue| {
                value.downcast_ref::<T>().map(|v| FieldValue::Enum(get(v)))
            },
            move |value: &dyn ComponentValue, field: FieldValue| {
                let FieldValue::Enum(index) = field.coerce(FieldKind::Enum)? else {
                    return None;
                };
                let mut next = value.downcast_ref::<T>()?.clone();
                set(&mut next, index).then(|| Box::new(next) as BoxedComponent)
            },
        )
        .with_enum_variants(variants.iter().map(|v| v.to_string()).collect())
    }

    pub fn with_enum_variants(mut self, variants: Vec<String>) -> Self {
        self.enum_variants = Some(variants);
        self
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Variant names for enum fields
    pub fn enum_variants(&self) -> Option<&[String]> {
        self.enum_variants.as_deref()
    }

    /// Suggested editing range, not enforced
    pub fn range(&self) -> Option<(f32, f32)> {
        self.range
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Read the field from a component value
    pub fn get(&self, value: &dyn ComponentValue) -> Option<FieldValue> {
        let field = (self.getter)(value)?;
        if field.kind() != self.kind {
            log::warn!(
                "field '{}' declared as {} but accessor returned {}",
                self.name,
                self.kind,
                field.kind()
            );
            return None;
        }
        Some(field)
    }

    /// Produce a copy of `value` with this field replaced.
    ///
    /// Returns `None` if `value` is not the owning component type or `field`
    /// cannot be converted to this field's kind. `value` is never modified.
    pub fn set(&self, value: &dyn ComponentValue, field: FieldValue) -> Option<BoxedComponent> {
        let field = field.coerce(self.kind)?;
        if let (FieldValue::Enum(index), Some(variants)) = (&field, &self.enum_variants) {
            if usize::try_from(*index).map_or(true, |i| i >= variants.len()) {
                return None;
            }
        }
        (self.setter)(value, field)
    }

    /// Read the field and encode it as JSON
    pub fn get_json(&self, value: &dyn ComponentValue) -> Option<Value> {
        self.get(value)
            .map(|field| field.to_json(self.enum_variants()))
    }

    /// Decode JSON as this field's kind
    pub fn decode_json(&self, json: &Value) -> Option<FieldValue> {
        FieldValue::from_json(self.kind, json, self.enum_variants())
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("enum_variants", &self.enum_variants)
            .field("range", &self.range)
            .finish()
    }
}
