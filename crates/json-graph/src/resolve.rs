//! Reference resolution: string IDs to handles, handles to instances.
//!
//! The registry map is the only index; nothing is cached on the side.

use json_graph_schema::ClassId;

use crate::graph::{Instance, InstanceRef, ObjectGraph, Registry};

impl Registry {
    /// Handle to the instance registered under `id`.
    pub fn resolve(&self, id: &str) -> Option<InstanceRef> {
        self.index_of(id)
            .map(|index| InstanceRef::new(self.class(), index))
    }
}

impl ObjectGraph {
    /// Handle to the instance of `class` registered under `id`; `None` if
    /// the ID is unknown or the class is not part of this graph.
    pub fn resolve(&self, class: ClassId, id: &str) -> Option<InstanceRef> {
        self.registries().get(class.0)?.resolve(id)
    }

    /// Instance behind a handle; `None` for a dangling handle.
    pub fn instance(&self, handle: InstanceRef) -> Option<&Instance> {
        self.registries()
            .get(handle.class().0)?
            .get_index(handle.index())
            .map(|(_, instance)| instance)
    }

    pub fn instance_mut(&mut self, handle: InstanceRef) -> Option<&mut Instance> {
        if handle.class().0 >= self.registries().len() {
            return None;
        }
        self.registry_mut(handle.class())
            .get_index_mut(handle.index())
    }

    /// ID of the instance behind a handle.
    pub fn id_of(&self, handle: InstanceRef) -> Option<&str> {
        self.instance(handle).map(Instance::id)
    }
}
