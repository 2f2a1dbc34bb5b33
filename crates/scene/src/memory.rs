//! In-memory scene graph implementing [`SceneHost`].

use std::collections::BTreeMap;

use glam::DVec3;
use stacker_core::{ObjectRef, MAX_OBJECT_NAME_LEN};
use stacker_geometry::Aabb;
use tracing::debug;

use crate::{HostError, SceneHost, Translation};

#[derive(Debug, Clone)]
enum NodeKind {
    Mesh { bounds: Aabb },
    Group { children: Vec<ObjectRef> },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    pivot: DVec3,
    parent: Option<ObjectRef>,
}

/// Flat-namespace scene of meshes and groups.
///
/// Meshes carry world-space bounds and a pivot (bounds center unless set
/// explicitly). Groups derive their bounds from their members; moving a group
/// moves every descendant.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: BTreeMap<ObjectRef, Node>,
    selection: Vec<ObjectRef>,
}

impl MemoryScene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mesh with the given world bounds.
    pub fn add_mesh(&mut self, name: &ObjectRef, bounds: Aabb) -> Result<(), HostError> {
        if self.nodes.contains_key(name) {
            return Err(HostError::rejected(name, "name already in use"));
        }
        self.nodes.insert(
            name.clone(),
            Node {
                kind: NodeKind::Mesh { bounds },
                pivot: bounds.center(),
                parent: None,
            },
        );
        Ok(())
    }

    /// Override an object's pivot without moving its geometry.
    pub fn set_pivot(&mut self, object: &ObjectRef, pivot: DVec3) -> Result<(), HostError> {
        let node = self.node_mut(object)?;
        node.pivot = pivot;
        Ok(())
    }

    /// Current pivot of `object`.
    pub fn pivot(&self, object: &ObjectRef) -> Result<DVec3, HostError> {
        Ok(self.node(object)?.pivot)
    }

    /// Parent group of `object`, if any.
    pub fn parent(&self, object: &ObjectRef) -> Result<Option<&ObjectRef>, HostError> {
        Ok(self.node(object)?.parent.as_ref())
    }

    /// Direct members of a group (empty for meshes).
    pub fn children(&self, object: &ObjectRef) -> Result<&[ObjectRef], HostError> {
        match &self.node(object)?.kind {
            NodeKind::Group { children } => Ok(children),
            NodeKind::Mesh { .. } => Ok(&[]),
        }
    }

    /// Whether `object` is a group.
    pub fn is_group(&self, object: &ObjectRef) -> bool {
        matches!(
            self.nodes.get(object).map(|node| &node.kind),
            Some(NodeKind::Group { .. })
        )
    }

    /// All object names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &ObjectRef> {
        self.nodes.keys()
    }

    /// Number of objects (meshes and groups).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no objects.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove `object` and all of its descendants.
    pub fn delete(&mut self, object: &ObjectRef) -> Result<(), HostError> {
        self.node(object)?;
        self.detach(object);
        let mut doomed = Vec::new();
        self.collect_subtree(object, &mut doomed);
        for name in &doomed {
            self.nodes.remove(name);
        }
        self.selection.retain(|selected| !doomed.contains(selected));
        debug!(object = %object, removed = doomed.len(), "deleted object");
        Ok(())
    }

    fn node(&self, object: &ObjectRef) -> Result<&Node, HostError> {
        self.nodes
            .get(object)
            .ok_or_else(|| HostError::NotFound(object.clone()))
    }

    fn node_mut(&mut self, object: &ObjectRef) -> Result<&mut Node, HostError> {
        self.nodes
            .get_mut(object)
            .ok_or_else(|| HostError::NotFound(object.clone()))
    }

    fn collect_subtree(&self, object: &ObjectRef, out: &mut Vec<ObjectRef>) {
        out.push(object.clone());
        if let Some(Node {
            kind: NodeKind::Group { children },
            ..
        }) = self.nodes.get(object)
        {
            for child in children {
                self.collect_subtree(child, out);
            }
        }
    }

    fn translate_subtree(&mut self, object: &ObjectRef, delta: DVec3) {
        let mut subtree = Vec::new();
        self.collect_subtree(object, &mut subtree);
        for name in subtree {
            if let Some(node) = self.nodes.get_mut(&name) {
                node.pivot += delta;
                if let NodeKind::Mesh { bounds } = &mut node.kind {
                    *bounds = bounds.translated(delta);
                }
            }
        }
    }

    /// Lowest free `<stem><n>` name, where `stem` is `base` without trailing
    /// digits. Long stems are shortened so the suffix still fits.
    fn next_free_name(&self, base: &str) -> Result<ObjectRef, HostError> {
        let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
        let stem = if stem.is_empty() { "node" } else { stem };
        let mut n = 1usize;
        loop {
            let suffix = n.to_string();
            let keep = stem.len().min(MAX_OBJECT_NAME_LEN.saturating_sub(suffix.len()));
            let name = format!("{}{suffix}", &stem[..keep]);
            let candidate = ObjectRef::parse(&name).map_err(|err| HostError::InvalidName {
                name: name.clone(),
                reason: err.to_string(),
            })?;
            if !self.nodes.contains_key(&candidate) {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    fn duplicate_under(
        &mut self,
        source: &ObjectRef,
        parent: Option<ObjectRef>,
    ) -> Result<ObjectRef, HostError> {
        let node = self.node(source)?.clone();
        let copy = self.next_free_name(source.short_name())?;
        let kind = match &node.kind {
            NodeKind::Mesh { bounds } => NodeKind::Mesh { bounds: *bounds },
            NodeKind::Group { .. } => NodeKind::Group { children: vec![] },
        };
        self.nodes.insert(
            copy.clone(),
            Node {
                kind,
                pivot: node.pivot,
                parent: parent.clone(),
            },
        );
        if let NodeKind::Group { children } = &node.kind {
            let mut copies = Vec::with_capacity(children.len());
            for child in children {
                copies.push(self.duplicate_under(child, Some(copy.clone()))?);
            }
            if let Some(Node {
                kind: NodeKind::Group { children },
                ..
            }) = self.nodes.get_mut(&copy)
            {
                *children = copies;
            }
        }
        Ok(copy)
    }

    fn detach(&mut self, object: &ObjectRef) {
        let parent = self.nodes.get(object).and_then(|node| node.parent.clone());
        if let Some(parent) = parent {
            if let Some(Node {
                kind: NodeKind::Group { children },
                ..
            }) = self.nodes.get_mut(&parent)
            {
                children.retain(|child| child != object);
            }
        }
    }

    pub(crate) fn mesh_bounds(&self, object: &ObjectRef) -> Option<Aabb> {
        match self.nodes.get(object)?.kind {
            NodeKind::Mesh { bounds } => Some(bounds),
            NodeKind::Group { .. } => None,
        }
    }
}

impl SceneHost for MemoryScene {
    fn exists(&self, object: &ObjectRef) -> bool {
        self.nodes.contains_key(object)
    }

    fn bounding_box(&self, object: &ObjectRef) -> Result<Aabb, HostError> {
        match &self.node(object)?.kind {
            NodeKind::Mesh { bounds } => Ok(*bounds),
            NodeKind::Group { children } => {
                let mut union: Option<Aabb> = None;
                for child in children {
                    let child_bounds = match self.bounding_box(child) {
                        Ok(bounds) => bounds,
                        // Empty sub-groups contribute nothing.
                        Err(HostError::Rejected { .. }) if self.is_group(child) => continue,
                        Err(err) => return Err(err),
                    };
                    union = Some(match union {
                        Some(acc) => acc.union(&child_bounds),
                        None => child_bounds,
                    });
                }
                union.ok_or_else(|| HostError::rejected(object, "empty group has no bounds"))
            }
        }
    }

    fn move_object(
        &mut self,
        object: &ObjectRef,
        translation: Translation,
    ) -> Result<(), HostError> {
        let pivot = self.node(object)?.pivot;
        let delta = match translation {
            Translation::Relative(delta) => delta,
            Translation::Absolute(placement) => DVec3::new(
                placement.x.map_or(0.0, |x| x - pivot.x),
                placement.y.map_or(0.0, |y| y - pivot.y),
                placement.z.map_or(0.0, |z| z - pivot.z),
            ),
        };
        if !delta.is_finite() {
            return Err(HostError::rejected(object, "non-finite translation"));
        }
        self.translate_subtree(object, delta);
        debug!(object = %object, ?delta, "moved object");
        Ok(())
    }

    fn duplicate(&mut self, object: &ObjectRef) -> Result<ObjectRef, HostError> {
        let parent = self.node(object)?.parent.clone();
        let copy = self.duplicate_under(object, parent.clone())?;
        if let Some(parent) = parent {
            if let Some(Node {
                kind: NodeKind::Group { children },
                ..
            }) = self.nodes.get_mut(&parent)
            {
                children.push(copy.clone());
            }
        }
        debug!(source = %object, copy = %copy, "duplicated object");
        Ok(copy)
    }

    fn group(
        &mut self,
        members: &[ObjectRef],
        name: Option<&str>,
    ) -> Result<ObjectRef, HostError> {
        for (i, member) in members.iter().enumerate() {
            self.node(member)?;
            if members[..i].contains(member) {
                return Err(HostError::rejected(member, "listed twice in group members"));
            }
        }
        let group = match name {
            Some(name) => {
                let group = ObjectRef::parse(name).map_err(|err| HostError::InvalidName {
                    name: name.to_string(),
                    reason: err.to_string(),
                })?;
                if self.nodes.contains_key(&group) {
                    return Err(HostError::rejected(&group, "name already in use"));
                }
                group
            }
            None => self.next_free_name("group")?,
        };
        if members.is_empty() {
            return Err(HostError::rejected(&group, "cannot group an empty member list"));
        }

        for member in members {
            self.detach(member);
            if let Some(node) = self.nodes.get_mut(member) {
                node.parent = Some(group.clone());
            }
        }
        self.nodes.insert(
            group.clone(),
            Node {
                kind: NodeKind::Group {
                    children: members.to_vec(),
                },
                pivot: DVec3::ZERO,
                parent: None,
            },
        );
        // Pivot defaults to the center of the grouped geometry.
        if let Ok(bounds) = self.bounding_box(&group) {
            if let Some(node) = self.nodes.get_mut(&group) {
                node.pivot = bounds.center();
            }
        }
        debug!(group = %group, members = members.len(), "grouped objects");
        Ok(group)
    }

    fn current_selection(&self) -> Vec<ObjectRef> {
        self.selection.clone()
    }

    fn select(&mut self, objects: &[ObjectRef]) -> Result<(), HostError> {
        for object in objects {
            self.node(object)?;
        }
        self.selection = objects.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(name: &str) -> ObjectRef {
        ObjectRef::parse(name).unwrap()
    }

    fn unit_cube(scene: &mut MemoryScene, name: &str, base: DVec3) -> ObjectRef {
        let name = obj(name);
        scene
            .add_mesh(&name, Aabb::from_base(base, DVec3::ONE))
            .unwrap();
        name
    }

    #[test]
    fn relative_move_shifts_bounds_and_pivot() {
        let mut scene = MemoryScene::new();
        let cube = unit_cube(&mut scene, "pCube1", DVec3::ZERO);
        scene
            .move_object(&cube, Translation::relative(DVec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        let bounds = scene.bounding_box(&cube).unwrap();
        assert_eq!(bounds.bottom_center(), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.pivot(&cube).unwrap(), DVec3::new(1.0, 2.5, 3.0));
    }

    #[test]
    fn absolute_x_places_pivot_and_keeps_other_axes() {
        let mut scene = MemoryScene::new();
        let cube = unit_cube(&mut scene, "pCube1", DVec3::new(0.0, 4.0, -2.0));
        scene.move_object(&cube, Translation::absolute_x(10.0)).unwrap();
        assert_eq!(scene.pivot(&cube).unwrap(), DVec3::new(10.0, 4.5, -2.0));
        let bounds = scene.bounding_box(&cube).unwrap();
        assert_eq!(bounds.min.x, 9.5);
        assert_eq!(bounds.max.x, 10.5);
    }

    #[test]
    fn duplicate_picks_next_free_suffix() {
        let mut scene = MemoryScene::new();
        let cube = unit_cube(&mut scene, "pCube1", DVec3::ZERO);
        unit_cube(&mut scene, "pCube2", DVec3::ZERO);
        let copy = scene.duplicate(&cube).unwrap();
        assert_eq!(copy.as_str(), "pCube3");
        assert_eq!(
            scene.bounding_box(&copy).unwrap(),
            scene.bounding_box(&cube).unwrap()
        );
    }

    #[test]
    fn group_bounds_are_union_and_moves_propagate() {
        let mut scene = MemoryScene::new();
        let a = unit_cube(&mut scene, "a", DVec3::ZERO);
        let b = unit_cube(&mut scene, "b", DVec3::new(3.0, 0.0, 0.0));
        let group = scene.group(&[a.clone(), b.clone()], Some("stack001")).unwrap();
        assert_eq!(group.as_str(), "stack001");
        assert_eq!(scene.parent(&a).unwrap(), Some(&group));

        let bounds = scene.bounding_box(&group).unwrap();
        assert_eq!(bounds.min, DVec3::new(-0.5, 0.0, -0.5));
        assert_eq!(bounds.max, DVec3::new(3.5, 1.0, 0.5));
        assert_eq!(scene.pivot(&group).unwrap(), bounds.center());

        scene
            .move_object(&group, Translation::relative(DVec3::Y))
            .unwrap();
        assert_eq!(scene.bounding_box(&b).unwrap().min.y, 1.0);
    }

    #[test]
    fn duplicating_max_length_names_stays_within_limit() {
        let mut scene = MemoryScene::new();
        let long = unit_cube(&mut scene, &"a".repeat(MAX_OBJECT_NAME_LEN), DVec3::ZERO);
        let copy = scene.duplicate(&long).unwrap();
        assert_eq!(copy.as_str().len(), MAX_OBJECT_NAME_LEN);
        assert!(copy.as_str().ends_with("a1"));

        let stem = "b".repeat(MAX_OBJECT_NAME_LEN - 1);
        let source = unit_cube(&mut scene, &format!("{stem}1"), DVec3::ZERO);
        let copies: Vec<_> = (0..10).map(|_| scene.duplicate(&source).unwrap()).collect();
        assert_eq!(copies[0].as_str(), format!("{stem}2"));
        let tenth = copies[9].as_str();
        assert_eq!(tenth.len(), MAX_OBJECT_NAME_LEN);
        assert!(tenth.ends_with("b11"));
    }

    #[test]
    fn repeated_group_member_is_rejected() {
        let mut scene = MemoryScene::new();
        let a = unit_cube(&mut scene, "a", DVec3::ZERO);
        let err = scene.group(&[a.clone(), a.clone()], Some("g")).unwrap_err();
        assert!(matches!(err, HostError::Rejected { ref object, .. } if *object == a));
        assert!(!scene.exists(&obj("g")));
        assert_eq!(scene.parent(&a).unwrap(), None);

        scene.move_object(&a, Translation::relative(DVec3::Y)).unwrap();
        assert_eq!(scene.bounding_box(&a).unwrap().min.y, 1.0);
    }

    #[test]
    fn invalid_group_name_is_refused() {
        let mut scene = MemoryScene::new();
        let a = unit_cube(&mut scene, "a", DVec3::ZERO);
        let err = scene.group(&[a.clone()], Some("bad name")).unwrap_err();
        assert!(matches!(err, HostError::InvalidName { .. }));
        assert_eq!(scene.parent(&a).unwrap(), None);
    }

    #[test]
    fn unnamed_groups_count_up() {
        let mut scene = MemoryScene::new();
        let a = unit_cube(&mut scene, "a", DVec3::ZERO);
        let b = unit_cube(&mut scene, "b", DVec3::ZERO);
        assert_eq!(scene.group(&[a], None).unwrap().as_str(), "group1");
        assert_eq!(scene.group(&[b], None).unwrap().as_str(), "group2");
    }

    #[test]
    fn regrouping_reparents_member() {
        let mut scene = MemoryScene::new();
        let a = unit_cube(&mut scene, "a", DVec3::ZERO);
        let first = scene.group(&[a.clone()], None).unwrap();
        let second = scene.group(&[a.clone()], None).unwrap();
        assert!(scene.children(&first).unwrap().is_empty());
        assert_eq!(scene.children(&second).unwrap(), &[a]);
        assert!(scene.bounding_box(&first).is_err());
    }

    #[test]
    fn duplicating_group_copies_members() {
        let mut scene = MemoryScene::new();
        let a = unit_cube(&mut scene, "pCube1", DVec3::ZERO);
        let group = scene.group(&[a], Some("stack1")).unwrap();
        let copy = scene.duplicate(&group).unwrap();
        assert_eq!(copy.as_str(), "stack2");
        let members = scene.children(&copy).unwrap().to_vec();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].as_str(), "pCube2");
        assert_eq!(scene.parent(&members[0]).unwrap(), Some(&copy));
    }

    #[test]
    fn delete_removes_subtree_and_selection() {
        let mut scene = MemoryScene::new();
        let a = unit_cube(&mut scene, "a", DVec3::ZERO);
        let b = unit_cube(&mut scene, "b", DVec3::ZERO);
        let group = scene.group(&[a.clone()], None).unwrap();
        scene.select(&[a.clone(), b.clone()]).unwrap();
        scene.delete(&group).unwrap();
        assert!(!scene.exists(&a));
        assert!(!scene.exists(&group));
        assert_eq!(scene.current_selection(), vec![b]);
    }

    #[test]
    fn operations_on_missing_objects_report_not_found() {
        let mut scene = MemoryScene::new();
        let ghost = obj("ghost");
        assert_eq!(
            scene.bounding_box(&ghost).unwrap_err(),
            HostError::NotFound(ghost.clone())
        );
        assert!(scene
            .move_object(&ghost, Translation::relative(DVec3::X))
            .is_err());
        assert!(scene.select(&[ghost]).is_err());
    }
}
