//! Descriptors for plugin-defined component types
//!
//! A plugin component value lives in the world as a [`DynamicValue`]: the raw
//! bytes of one instance plus the id of its runtime type. Field access reads
//! and writes those bytes at the offsets the module exported.
//!
//! Every descriptor holds a weak lease on its module. Once the host releases
//! the module the lease is dead and every operation reports
//! [`ReflectError::ModuleUnloaded`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use loam_core::{Color, Guid, Rect, Vec2};
use loam_ecs::{BoxedComponent, ComponentType, ComponentValue, DynamicTypeId, Entity, World};
use loam_plugin_api::{type_code, GUID_REF_TAG};
use loam_reflect::{ComponentDescriptor, FieldDescriptor, FieldKind, FieldValue, ReflectError};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::manifest::{ExportedField, ExportedType};

/// Category used when a module does not name one
pub const DEFAULT_CATEGORY: &str = "Plugin";

/// Proof that a module is still loaded. The host owns the only strong
/// reference.
#[derive(Debug)]
pub struct ModuleToken {
    module: String,
    guids: GuidTable,
}

impl ModuleToken {
    pub fn new(module: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            module: module.into(),
            guids: GuidTable::default(),
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Identifiers referenced from this module's `GUID` fields
    pub fn guids(&self) -> &GuidTable {
        &self.guids
    }
}

// ============================================================================
// Guid references
// ============================================================================

/// Packs guids into the 16 bytes of a `GUID` field.
///
/// Canonical UUID text is stored as its uuid bytes. Every other identifier is
/// interned and stored as [`GUID_REF_TAG`] followed by its index, so any
/// non-empty string survives. Entries live as long as the module's token.
#[derive(Debug, Default)]
pub struct GuidTable {
    inner: Mutex<GuidTableInner>,
}

#[derive(Debug, Default)]
struct GuidTableInner {
    entries: Vec<Guid>,
    index: HashMap<Guid, u64>,
}

impl GuidTable {
    pub fn encode(&self, guid: &Guid) -> [u8; 16] {
        if guid.is_empty() {
            return [0; 16];
        }
        if let Some(bytes) = uuid_bytes(guid) {
            return bytes;
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let next = inner.entries.len() as u64;
        let slot = *inner.index.entry(guid.clone()).or_insert(next);
        if slot == next {
            inner.entries.push(guid.clone());
        }

        let mut bytes = [0; 16];
        bytes[..8].copy_from_slice(&GUID_REF_TAG);
        bytes[8..].copy_from_slice(&slot.to_ne_bytes());
        bytes
    }

    /// `None` for a reference this table never handed out
    pub fn decode(&self, bytes: [u8; 16]) -> Option<Guid> {
        if bytes == [0; 16] {
            return Some(Guid::empty());
        }
        if bytes[..8] == GUID_REF_TAG {
            let slot = u64::from_ne_bytes(bytes[8..].try_into().ok()?);
            let slot = usize::try_from(slot).ok()?;
            return self.inner.lock().entries.get(slot).cloned();
        }
        Some(Guid::from(Uuid::from_bytes(bytes).hyphenated().to_string()))
    }

    /// Number of interned identifiers
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uuid bytes for text that reads back identically from them
fn uuid_bytes(guid: &Guid) -> Option<[u8; 16]> {
    let uuid = Uuid::parse_str(guid.as_str()).ok()?;
    let bytes = *uuid.as_bytes();
    let canonical = uuid.hyphenated().to_string() == guid.as_str();
    (canonical && bytes != [0; 16] && bytes[..8] != GUID_REF_TAG).then_some(bytes)
}

/// One instance of a plugin component type
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicValue {
    component_id: DynamicTypeId,
    bytes: Vec<u8>,
}

impl DynamicValue {
    pub fn component_id(&self) -> DynamicTypeId {
        self.component_id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ============================================================================
// Field slots
// ============================================================================

#[derive(Clone, Copy, Debug)]
struct Slot {
    offset: usize,
    code: u32,
}

impl Slot {
    fn kind(code: u32) -> Option<FieldKind> {
        Some(match code {
            type_code::F32 => FieldKind::Float,
            type_code::I32 => FieldKind::Int,
            type_code::BOOL => FieldKind::Bool,
            type_code::VEC2 => FieldKind::Vector2,
            type_code::COLOR => FieldKind::Color,
            type_code::RECT => FieldKind::Rectangle,
            type_code::ENUM_I32 => FieldKind::Enum,
            type_code::GUID => FieldKind::Guid,
            _ => return None,
        })
    }

    fn size(&self) -> usize {
        match self.code {
            type_code::BOOL => 1,
            type_code::VEC2 => 8,
            type_code::COLOR | type_code::RECT | type_code::GUID => 16,
            _ => 4,
        }
    }

    fn read(&self, bytes: &[u8], guids: &GuidTable) -> Option<FieldValue> {
        let raw = bytes.get(self.offset..self.offset.checked_add(self.size())?)?;
        Some(match self.code {
            type_code::F32 => FieldValue::Float(f32_at(raw, 0)?),
            type_code::I32 => FieldValue::Int(i32_at(raw)? as i64),
            type_code::BOOL => FieldValue::Bool(raw[0] != 0),
            type_code::VEC2 => FieldValue::Vector2(Vec2::new(f32_at(raw, 0)?, f32_at(raw, 4)?)),
            type_code::COLOR => FieldValue::Color(Color::from_array(f32x4(raw)?)),
            type_code::RECT => FieldValue::Rectangle(Rect::from_array(f32x4(raw)?)),
            type_code::ENUM_I32 => FieldValue::Enum(i32_at(raw)?),
            type_code::GUID => FieldValue::Guid(guids.decode(raw.try_into().ok()?)?),
            _ => return None,
        })
    }

    fn write(&self, bytes: &mut [u8], value: &FieldValue, guids: &GuidTable) -> Option<()> {
        let end = self.offset.checked_add(self.size())?;
        let raw = bytes.get_mut(self.offset..end)?;
        match (self.code, value) {
            (type_code::F32, FieldValue::Float(f)) => raw.copy_from_slice(&f.to_ne_bytes()),
            (type_code::I32, FieldValue::Int(i)) => {
                raw.copy_from_slice(&i32::try_from(*i).ok()?.to_ne_bytes())
            }
            (type_code::BOOL, FieldValue::Bool(b)) => raw[0] = u8::from(*b),
            (type_code::VEC2, FieldValue::Vector2(v)) => put_f32s(raw, &[v.x, v.y]),
            (type_code::COLOR, FieldValue::Color(c)) => put_f32s(raw, &c.to_array()),
            (type_code::RECT, FieldValue::Rectangle(r)) => put_f32s(raw, &r.to_array()),
            (type_code::ENUM_I32, FieldValue::Enum(i)) => raw.copy_from_slice(&i.to_ne_bytes()),
            (type_code::GUID, FieldValue::Guid(g)) => raw.copy_from_slice(&guids.encode(g)),
            _ => return None,
        }
        Some(())
    }
}

fn f32_at(raw: &[u8], at: usize) -> Option<f32> {
    let chunk: [u8; 4] = raw.get(at..at + 4)?.try_into().ok()?;
    Some(f32::from_ne_bytes(chunk))
}

fn i32_at(raw: &[u8]) -> Option<i32> {
    Some(i32::from_ne_bytes(raw.get(0..4)?.try_into().ok()?))
}

fn f32x4(raw: &[u8]) -> Option<[f32; 4]> {
    Some([
        f32_at(raw, 0)?,
        f32_at(raw, 4)?,
        f32_at(raw, 8)?,
        f32_at(raw, 12)?,
    ])
}

fn put_f32s(raw: &mut [u8], values: &[f32]) {
    for (chunk, value) in raw.chunks_exact_mut(4).zip(values) {
        chunk.copy_from_slice(&value.to_ne_bytes());
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// Descriptor for a component type exported by a plugin module
pub struct DynamicComponentDescriptor {
    name: String,
    category: String,
    component_id: DynamicTypeId,
    default: Vec<u8>,
    fields: Vec<FieldDescriptor>,
    lease: Weak<ModuleToken>,
}

impl DynamicComponentDescriptor {
    /// Build a descriptor for `export` under a fresh runtime type id.
    ///
    /// Fields with a type code the host does not understand, or that do not
    /// fit inside the value, are left out.
    pub fn new(export: &ExportedType, token: &Arc<ModuleToken>) -> Self {
        let component_id = DynamicTypeId::allocate();
        let lease = Arc::downgrade(token);
        let fields = export
            .fields
            .iter()
            .filter_map(|field| build_field(component_id, field, export, &lease))
            .collect();

        let mut default = export.default_bytes.clone();
        default.resize(export.size, 0);

        Self {
            name: export.name.clone(),
            category: export
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            component_id,
            default,
            fields,
            lease,
        }
    }

    pub fn component_id(&self) -> DynamicTypeId {
        self.component_id
    }

    /// Whether the module behind this descriptor is still loaded
    pub fn is_live(&self) -> bool {
        self.lease.strong_count() > 0
    }

    fn key(&self) -> ComponentType {
        ComponentType::Dynamic(self.component_id)
    }

    fn check_live(&self) -> loam_reflect::Result<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(ReflectError::ModuleUnloaded(self.name.clone()))
        }
    }

    fn default_value(&self) -> DynamicValue {
        DynamicValue {
            component_id: self.component_id,
            bytes: self.default.clone(),
        }
    }

    fn typed<'a>(&self, value: &'a dyn ComponentValue) -> loam_reflect::Result<&'a DynamicValue> {
        value
            .downcast_ref::<DynamicValue>()
            .filter(|v| v.component_id == self.component_id && v.bytes.len() == self.default.len())
            .ok_or_else(|| {
                ReflectError::type_mismatch(&self.name, self.key().to_string(), value.value_type_name())
            })
    }

    fn unbox(&self, value: BoxedComponent) -> loam_reflect::Result<BoxedComponent> {
        self.typed(&*value)?;
        Ok(value)
    }
}

fn build_field(
    component_id: DynamicTypeId,
    field: &ExportedField,
    export: &ExportedType,
    lease: &Weak<ModuleToken>,
) -> Option<FieldDescriptor> {
    let Some(kind) = Slot::kind(field.type_code) else {
        log::debug!(
            "'{}.{}' has type code {:#x}, not exposed",
            export.name,
            field.name,
            field.type_code
        );
        return None;
    };
    let slot = Slot {
        offset: field.offset,
        code: field.type_code,
    };
    if field.offset.checked_add(slot.size()).map_or(true, |end| end > export.size) {
        log::debug!(
            "'{}.{}' at offset {} overruns the {} byte value, not exposed",
            export.name,
            field.name,
            field.offset,
            export.size
        );
        return None;
    }

    let read_lease = lease.clone();
    let write_lease = lease.clone();
    let descriptor = FieldDescriptor::from_accessors(
        field.name.clone(),
        kind,
        move |value: &dyn ComponentValue| {
            let token = read_lease.upgrade()?;
            let value = value
                .downcast_ref::<DynamicValue>()
                .filter(|v| v.component_id == component_id)?;
            slot.read(&value.bytes, token.guids())
        },
        move |value: &dyn ComponentValue, field: FieldValue| {
            let token = write_lease.upgrade()?;
            let mut next = value
                .downcast_ref::<DynamicValue>()
                .filter(|v| v.component_id == component_id)?
                .clone();
            slot.write(&mut next.bytes, &field, token.guids())?;
            Some(Box::new(next) as BoxedComponent)
        },
    );

    if kind == FieldKind::Enum && !field.enum_variants.is_empty() {
        Some(descriptor.with_enum_variants(field.enum_variants.clone()))
    } else {
        Some(descriptor)
    }
}

impl ComponentDescriptor for DynamicComponentDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn component_type(&self) -> ComponentType {
        self.key()
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn is_internal(&self) -> bool {
        false
    }

    fn is_core_transform(&self) -> bool {
        false
    }

    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn has(&self, world: &World, entity: Entity) -> bool {
        self.is_live() && world.has_keyed(entity, self.key())
    }

    fn get(&self, world: &World, entity: Entity) -> loam_reflect::Result<BoxedComponent> {
        self.check_live()?;
        let value = world
            .get_keyed(entity, self.key())
            .ok_or_else(|| ReflectError::component_missing(&self.name, entity))?;
        Ok(Box::new(self.typed(value)?.clone()))
    }

    fn set(&self, world: &mut World, entity: Entity, value: BoxedComponent) -> loam_reflect::Result<()> {
        self.check_live()?;
        let value = self.unbox(value)?;
        if !world.has_keyed(entity, self.key()) {
            return Err(ReflectError::component_missing(&self.name, entity));
        }
        world.insert_keyed(entity, self.key(), value)?;
        Ok(())
    }

    fn add(
        &self,
        world: &mut World,
        entity: Entity,
        value: Option<BoxedComponent>,
    ) -> loam_reflect::Result<bool> {
        self.check_live()?;
        if world.has_keyed(entity, self.key()) {
            return Ok(false);
        }
        let value = match value {
            Some(v) => self.unbox(v)?,
            None => Box::new(self.default_value()),
        };
        world.insert_keyed(entity, self.key(), value)?;
        Ok(true)
    }

    fn remove(&self, world: &mut World, entity: Entity) -> loam_reflect::Result<bool> {
        self.check_live()?;
        Ok(world.remove_keyed(entity, self.key()).is_some())
    }

    fn encode_value(&self, value: &dyn ComponentValue) -> loam_reflect::Result<Value> {
        self.check_live()?;
        let value = self.typed(value)?;
        let mut object = Map::new();
        for field in &self.fields {
            if let Some(json) = field.get_json(value) {
                object.insert(field.name().to_string(), json);
            }
        }
        Ok(Value::Object(object))
    }

    /// Fields missing from `json` keep their default; unknown keys are ignored
    fn deserialize_from_json(&self, json: &Value) -> loam_reflect::Result<BoxedComponent> {
        self.check_live()?;
        let Value::Object(entries) = json else {
            return Err(ReflectError::malformed(&self.name, "expected an object"));
        };

        let mut current: BoxedComponent = Box::new(self.default_value());
        for (key, raw) in entries {
            let Some(field) = self.field(key) else {
                log::debug!("'{}' has no field '{}', ignoring", self.name, key);
                continue;
            };
            let decoded = field.decode_json(raw).ok_or_else(|| {
                ReflectError::malformed(
                    &self.name,
                    format!("field '{}' expects {}, got {}", key, field.kind(), raw),
                )
            })?;
            current = field.set(&*current, decoded).ok_or_else(|| {
                ReflectError::malformed(&self.name, format!("value {} out of range for '{}'", raw, key))
            })?;
        }
        Ok(current)
    }

    fn create_default(&self) -> loam_reflect::Result<BoxedComponent> {
        self.check_live()?;
        Ok(Box::new(self.default_value()))
    }
}
