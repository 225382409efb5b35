// Vertex maps — id-keyed, insertion-ordered vertex collections with a name index.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::Result;
use crate::vertex::{Vertex, VertexType};

/// Vertices keyed by diagram id.
///
/// Re-inserting a known id merges the incoming vertex into the stored one.
/// The secondary name index maps a filtered name to the id that most recently
/// claimed it.
#[derive(Debug, Clone, Default)]
pub struct VertexMap {
    vertices: IndexMap<String, Vertex>,
    names: HashMap<String, String>,
}

impl VertexMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consuming builder form of [`insert`](Self::insert).
    pub fn with(mut self, vertices: impl IntoIterator<Item = Vertex>) -> Result<Self> {
        for vertex in vertices {
            self.insert(vertex)?;
        }
        Ok(self)
    }

    pub fn insert(&mut self, vertex: Vertex) -> Result<()> {
        let id = vertex.id().to_string();
        let previous_name = match self.vertices.get_mut(&id) {
            Some(existing) => {
                let previous = existing.name().to_string();
                existing.merge(&vertex)?;
                Some(previous)
            }
            None => {
                self.vertices.insert(id.clone(), vertex);
                None
            }
        };

        let Some(name) = self.vertices.get(&id).map(|v| v.name().to_string()) else {
            return Ok(());
        };
        if let Some(previous) = previous_name {
            if previous != name {
                self.release_name(&previous, &id);
            }
        }
        self.names.insert(name, id);
        Ok(())
    }

    /// Merge every vertex of `other` into this map, in order.
    pub fn extend_from(&mut self, other: &VertexMap) -> Result<()> {
        for vertex in other.iter() {
            self.insert(vertex.clone())?;
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Vertex> {
        let removed = self.vertices.shift_remove(id)?;
        self.release_name(removed.name(), id);
        Some(removed)
    }

    pub fn has(&self, id: &str) -> bool {
        self.vertices.contains_key(id)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn vertex_by_name(&self, name: &str) -> Option<&Vertex> {
        self.names.get(name).and_then(|id| self.vertices.get(id))
    }

    pub(crate) fn vertex_mut(&mut self, id: &str) -> Option<&mut Vertex> {
        self.vertices.get_mut(id)
    }

    /// New map holding only the vertices of `kind`.
    pub fn filter_by_type(&self, kind: VertexType) -> VertexMap {
        let mut filtered = VertexMap::new();
        for vertex in self.iter().filter(|v| v.kind() == kind) {
            filtered.names.insert(vertex.name().to_string(), vertex.id().to_string());
            filtered
                .vertices
                .insert(vertex.id().to_string(), vertex.clone());
        }
        filtered
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices in insertion order. Every call starts a fresh traversal.
    pub fn iter(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.vertices.keys().map(String::as_str)
    }

    /// Drop the name → id entry owned by `id`, falling back to the most
    /// recently inserted remaining vertex that shares the name.
    fn release_name(&mut self, name: &str, id: &str) {
        if self.names.get(name).is_none_or(|owner| owner != id) {
            return;
        }
        self.names.remove(name);
        if let Some(fallback) = self
            .vertices
            .values()
            .rev()
            .find(|v| v.name() == name && v.id() != id)
        {
            self.names
                .insert(name.to_string(), fallback.id().to_string());
        }
    }
}

impl PartialEq for VertexMap {
    fn eq(&self, other: &Self) -> bool {
        self.vertices.iter().eq(other.vertices.iter()) && self.names == other.names
    }
}

impl Serialize for VertexMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.vertices.values())
    }
}

impl<'a> IntoIterator for &'a VertexMap {
    type Item = &'a Vertex;
    type IntoIter = indexmap::map::Values<'a, String, Vertex>;

    fn into_iter(self) -> Self::IntoIter {
        self.vertices.values()
    }
}

// ── Per-type maps ──────────────────────────────────────────────────

/// One [`VertexMap`] per [`VertexType`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexMaps {
    maps: [VertexMap; VertexType::COUNT],
}

impl VertexMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: VertexType) -> &VertexMap {
        &self.maps[kind.index()]
    }

    pub fn get_mut(&mut self, kind: VertexType) -> &mut VertexMap {
        &mut self.maps[kind.index()]
    }

    pub fn set(&mut self, kind: VertexType, map: VertexMap) {
        self.maps[kind.index()] = map;
    }

    /// Swap in `map` for `kind`, handing back the previous one.
    pub fn replace(&mut self, kind: VertexType, map: VertexMap) -> VertexMap {
        std::mem::replace(&mut self.maps[kind.index()], map)
    }

    pub fn has(&self, kind: VertexType, id: &str) -> bool {
        self.get(kind).has(id)
    }

    pub fn vertex(&self, kind: VertexType, id: &str) -> Option<&Vertex> {
        self.get(kind).vertex(id)
    }

    /// Look an id up across every kind.
    pub fn find(&self, id: &str) -> Option<&Vertex> {
        self.maps.iter().find_map(|map| map.vertex(id))
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut Vertex> {
        self.maps.iter_mut().find_map(|map| map.vertex_mut(id))
    }

    /// Remove an id from whichever map holds it.
    pub fn remove(&mut self, id: &str) -> Option<Vertex> {
        self.maps.iter_mut().find_map(|map| map.remove(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexType, &VertexMap)> {
        VertexType::ALL.into_iter().zip(self.maps.iter())
    }

    /// Total vertex count over all kinds.
    pub fn len(&self) -> usize {
        self.maps.iter().map(VertexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.iter().all(VertexMap::is_empty)
    }
}
