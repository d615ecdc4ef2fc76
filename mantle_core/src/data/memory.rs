// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory data graph.

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

use super::{DataAccessor, DataField, DataIndex, DataRef, DataValue, Primitive};
use crate::unit::Unit;

#[derive(Clone, Debug)]
enum Slot {
    Scalar(DataValue),
    Record(Vec<(String, DataRef)>),
    Array(Vec<DataRef>),
    Text(String),
}

#[derive(Clone, Debug)]
struct Object {
    type_name: String,
    unit: Unit,
    slot: Slot,
}

/// A [`DataAccessor`] over objects owned by the graph itself.
///
/// Every value, including scalars, is an object with its own [`DataRef`], so
/// any field can be written through [`DataAccessor::set_scalar`].
#[derive(Clone, Debug, Default)]
pub struct MemoryGraph {
    objects: Vec<Object>,
}

impl MemoryGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, type_name: &str, unit: Unit, slot: Slot) -> DataRef {
        let r = DataRef(self.objects.len() as u64);
        self.objects.push(Object {
            type_name: type_name.to_owned(),
            unit,
            slot,
        });
        r
    }

    fn object(&self, r: DataRef) -> Option<&Object> {
        usize::try_from(r.0).ok().and_then(|i| self.objects.get(i))
    }

    fn object_mut(&mut self, r: DataRef) -> Option<&mut Object> {
        usize::try_from(r.0).ok().and_then(|i| self.objects.get_mut(i))
    }

    /// Creates an empty record.
    pub fn record(&mut self, type_name: &str) -> DataRef {
        self.alloc(type_name, Unit::Px, Slot::Record(Vec::new()))
    }

    /// Creates an empty array.
    pub fn array(&mut self, type_name: &str) -> DataRef {
        self.alloc(type_name, Unit::Px, Slot::Array(Vec::new()))
    }

    /// Creates a free-standing scalar.
    pub fn scalar(&mut self, type_name: &str, value: DataValue) -> DataRef {
        self.alloc(type_name, Unit::Px, Slot::Scalar(value))
    }

    /// Creates a free-standing character array.
    pub fn text(&mut self, type_name: &str, text: &str) -> DataRef {
        self.alloc(type_name, Unit::Px, Slot::Text(text.to_owned()))
    }

    /// Binds `child` as field `name` of `record`, replacing any previous
    /// binding.
    ///
    /// # Panics
    ///
    /// Panics if `record` is not a record of this graph.
    pub fn link(&mut self, record: DataRef, name: &str, child: DataRef) {
        let Some(Object {
            slot: Slot::Record(fields),
            ..
        }) = self.object_mut(record)
        else {
            panic!("{record:?} is not a record");
        };
        match fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, r)) => *r = child,
            None => fields.push((name.to_owned(), child)),
        }
    }

    /// Appends `child` to `array`.
    ///
    /// # Panics
    ///
    /// Panics if `array` is not an array of this graph.
    pub fn push(&mut self, array: DataRef, child: DataRef) {
        let Some(Object {
            slot: Slot::Array(items),
            ..
        }) = self.object_mut(array)
        else {
            panic!("{array:?} is not an array");
        };
        items.push(child);
    }

    /// Adds a scalar field to `record` and returns the scalar's handle.
    pub fn insert(&mut self, record: DataRef, name: &str, value: DataValue) -> DataRef {
        self.insert_with_unit(record, name, value, Unit::Px)
    }

    /// Adds a scalar field stored in `unit`.
    pub fn insert_with_unit(
        &mut self,
        record: DataRef,
        name: &str,
        value: DataValue,
        unit: Unit,
    ) -> DataRef {
        let child = self.alloc("", unit, Slot::Scalar(value));
        self.link(record, name, child);
        child
    }

    /// Adds a string field to `record`.
    pub fn insert_text(&mut self, record: DataRef, name: &str, text: &str) -> DataRef {
        let child = self.text("", text);
        self.link(record, name, child);
        child
    }

    /// Number of elements in an array, or `None` for non-arrays.
    #[must_use]
    pub fn len_of(&self, array: DataRef) -> Option<usize> {
        match &self.object(array)?.slot {
            Slot::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    fn describe(&self, r: DataRef) -> DataField {
        let Some(object) = self.object(r) else {
            return DataField::none();
        };
        let value = match &object.slot {
            Slot::Scalar(v) => v.clone(),
            Slot::Record(_) => DataValue::Object(r),
            Slot::Array(_) => DataValue::Array {
                element: Primitive::Object,
                obj: r,
            },
            Slot::Text(_) => DataValue::Array {
                element: Primitive::Char,
                obj: r,
            },
        };
        DataField {
            value,
            obj: Some(r),
            unit: object.unit,
            type_name: object.type_name.clone(),
        }
    }
}

impl DataAccessor for MemoryGraph {
    fn get_field(&self, obj: DataRef, name: Option<&str>) -> DataField {
        let Some(name) = name else {
            return self.describe(obj);
        };
        match self.object(obj).map(|o| &o.slot) {
            Some(Slot::Record(fields)) => fields
                .iter()
                .find(|(n, _)| n == name)
                .map_or_else(DataField::none, |(_, r)| self.describe(*r)),
            _ => DataField::none(),
        }
    }

    fn get_index(&self, obj: DataRef, index: DataIndex) -> DataField {
        let Some(object) = self.object(obj) else {
            return DataField::none();
        };
        match (&object.slot, index) {
            (Slot::Array(items), DataIndex::At(i)) => {
                items.get(i).map_or_else(DataField::none, |r| self.describe(*r))
            }
            (Slot::Text(s), DataIndex::All) => DataField {
                value: DataValue::Text(s.clone()),
                obj: Some(obj),
                unit: object.unit,
                type_name: object.type_name.clone(),
            },
            (Slot::Text(s), DataIndex::At(i)) => match s.as_bytes().get(i) {
                Some(&c) => DataField {
                    value: DataValue::Char(c),
                    ..DataField::none()
                },
                None => DataField::none(),
            },
            (Slot::Array(_), DataIndex::All) => self.describe(obj),
            _ => DataField::none(),
        }
    }

    fn set_scalar(&mut self, obj: DataRef, value: DataValue) -> bool {
        let Some(object) = self.object_mut(obj) else {
            return false;
        };
        match (&mut object.slot, value) {
            (Slot::Text(s), DataValue::Text(t)) => {
                *s = t;
                true
            }
            (Slot::Scalar(v), value) => {
                *v = value;
                true
            }
            _ => false,
        }
    }

    fn set_range(
        &mut self,
        obj: DataRef,
        element: Primitive,
        values: &[DataValue],
        offset: usize,
        count: usize,
    ) -> bool {
        match self.object(obj).map(|o| &o.slot) {
            Some(Slot::Array(items)) if offset <= items.len() => {}
            Some(Slot::Text(s)) if offset <= s.len() => {
                let bytes: Option<Vec<u8>> = values
                    .iter()
                    .map(|v| match *v {
                        DataValue::Char(c) | DataValue::Byte(c) => Some(c),
                        _ => None,
                    })
                    .collect();
                let Some(bytes) = bytes else {
                    return false;
                };
                let Some(Object {
                    slot: Slot::Text(s),
                    ..
                }) = self.object_mut(obj)
                else {
                    return false;
                };
                let mut raw = core::mem::take(s).into_bytes();
                let end = (offset + count).min(raw.len());
                raw.splice(offset..end, bytes);
                *s = String::from_utf8_lossy(&raw).into_owned();
                return true;
            }
            _ => return false,
        }

        let fresh: Vec<DataRef> = values
            .iter()
            .map(|v| {
                let scalar = if v.primitive() == element {
                    v.clone()
                } else {
                    DataValue::None
                };
                self.alloc("", Unit::Px, Slot::Scalar(scalar))
            })
            .collect();
        let Some(Object {
            slot: Slot::Array(items),
            ..
        }) = self.object_mut(obj)
        else {
            return false;
        };
        let end = (offset + count).min(items.len());
        items.splice(offset..end, fresh);
        true
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn records_arrays_and_scalars() {
        let mut g = MemoryGraph::new();
        let root = g.record("root");
        let list = g.array("list");
        g.link(root, "items", list);
        for i in 0..3 {
            let item = g.record("item");
            g.insert(item, "n", DataValue::Int32(i));
            g.push(list, item);
        }
        assert_eq!(g.len_of(list), Some(3));

        let items = g.get_field(root, Some("items"));
        assert_eq!(
            items.value,
            DataValue::Array {
                element: Primitive::Object,
                obj: list
            }
        );
        let second = g.get_index(list, DataIndex::At(1));
        assert_eq!(second.type_name, "item");
        let n = g.get_field(second.obj.unwrap(), Some("n"));
        assert_eq!(n.value, DataValue::Int32(1));
        assert!(g.get_index(list, DataIndex::At(3)).value.is_none());
    }

    #[test]
    fn scalars_are_writable() {
        let mut g = MemoryGraph::new();
        let root = g.record("root");
        let fill = g.insert(root, "fill", DataValue::Int64(1));
        assert!(g.set_scalar(fill, DataValue::Int64(2)));
        assert_eq!(g.get_field(root, Some("fill")).value, DataValue::Int64(2));
        assert!(!g.set_scalar(root, DataValue::Int64(3)), "records are not scalars");
    }

    #[test]
    fn text_reads_and_splices() {
        let mut g = MemoryGraph::new();
        let root = g.record("root");
        let title = g.insert_text(root, "title", "cat");
        assert_eq!(
            g.get_index(title, DataIndex::All).value,
            DataValue::Text("cat".to_string())
        );
        assert_eq!(g.get_index(title, DataIndex::At(1)).value, DataValue::Char(b'a'));

        assert!(g.set_range(title, Primitive::Char, &[DataValue::Char(b'o')], 1, 1));
        assert_eq!(
            g.get_index(title, DataIndex::All).value,
            DataValue::Text("cot".to_string())
        );
        assert!(g.set_scalar(title, DataValue::Text("dog".to_string())));
        assert_eq!(
            g.get_index(title, DataIndex::All).value,
            DataValue::Text("dog".to_string())
        );
    }

    #[test]
    fn array_ranges_replace_elements() {
        let mut g = MemoryGraph::new();
        let list = g.array("list");
        for v in [1, 2, 3] {
            let s = g.scalar("n", DataValue::Int32(v));
            g.push(list, s);
        }
        assert!(g.set_range(
            list,
            Primitive::Int32,
            &[DataValue::Int32(9), DataValue::Int32(8)],
            1,
            2
        ));
        let values: alloc::vec::Vec<DataValue> = (0..3)
            .map(|i| g.get_index(list, DataIndex::At(i)).value)
            .collect();
        assert_eq!(
            values,
            [DataValue::Int32(1), DataValue::Int32(9), DataValue::Int32(8)]
        );
        assert!(!g.set_range(list, Primitive::Int32, &[], 9, 0), "offset past the end");
    }
}
