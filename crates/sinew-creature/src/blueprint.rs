//! Creature blueprints
//!
//! A blueprint is the static topology of a creature in design space: nodes
//! joined by muscles and bones. Blueprints are produced by
//! [`BlueprintBuilder`] (or deserialized) and stay read-only for the whole of
//! an evolution run.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of nodes a creature may have
pub const MAX_NODES: usize = 20;

/// Builder area in design-space coordinates (left, right, top, bottom)
pub const BUILD_AREA: (f32, f32, f32, f32) = (-220.0, 220.0, -160.0, 160.0);

/// Inset from the build area edges where nodes may be placed
pub const BUILD_MARGIN: f32 = 18.0;

/// Node placement in design space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub x: f32,
    pub y: f32,
    /// Anchored nodes never move during simulation
    #[serde(default)]
    pub fixed: bool,
}

impl NodeSpec {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Spring between two nodes, referenced by index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub a: usize,
    pub b: usize,
    pub rest: f32,
}

impl Spring {
    pub fn new(a: usize, b: usize, rest: f32) -> Self {
        Self { a, b, rest }
    }

    /// True if this spring joins the same pair of nodes, in either order
    pub fn joins(&self, a: usize, b: usize) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }

    /// Copy with the rest length multiplied by `scale`
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            rest: self.rest * scale,
            ..*self
        }
    }
}

/// Kind of link between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    Muscle,
    Bone,
}

/// Link between two blueprint nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Link {
    /// Contractible spring driven by the controller
    Muscle(Spring),
    /// Stiff spring with a fixed target length
    Bone(Spring),
}

impl Link {
    pub fn kind(&self) -> LinkKind {
        match self {
            Link::Muscle(_) => LinkKind::Muscle,
            Link::Bone(_) => LinkKind::Bone,
        }
    }

    pub fn spring(&self) -> &Spring {
        match self {
            Link::Muscle(spring) | Link::Bone(spring) => spring,
        }
    }

    fn spring_mut(&mut self) -> &mut Spring {
        match self {
            Link::Muscle(spring) | Link::Bone(spring) => spring,
        }
    }
}

/// Axis-aligned bounds of the blueprint nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Bounds {
    /// Compute bounds of a node list (all zero when empty)
    pub fn of(nodes: &[NodeSpec]) -> Self {
        if nodes.is_empty() {
            return Self {
                min_x: 0.0,
                max_x: 0.0,
                min_y: 0.0,
                max_y: 0.0,
            };
        }
        nodes.iter().fold(
            Self {
                min_x: f32::INFINITY,
                max_x: f32::NEG_INFINITY,
                min_y: f32::INFINITY,
                max_y: f32::NEG_INFINITY,
            },
            |b, n| Self {
                min_x: b.min_x.min(n.x),
                max_x: b.max_x.max(n.x),
                min_y: b.min_y.min(n.y),
                max_y: b.max_y.max(n.y),
            },
        )
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Structural problems that prevent a blueprint from being simulated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlueprintError {
    #[error("need at least two nodes before running evolution (have {0})")]
    TooFewNodes(usize),
    #[error("connect nodes with muscles so the controller has something to drive")]
    NoMuscles,
    #[error("limit the creature to {max} nodes (current: {count})")]
    TooManyNodes { count: usize, max: usize },
    #[error("link {link} references node {node}, but only {count} nodes exist")]
    InvalidLinkIndex {
        link: usize,
        node: usize,
        count: usize,
    },
}

/// Validated creature topology
///
/// Stored bounds are ignored on load and recomputed from the nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlueprint")]
pub struct Blueprint {
    nodes: Vec<NodeSpec>,
    links: Vec<Link>,
    bounds: Bounds,
}

#[derive(Deserialize)]
struct RawBlueprint {
    nodes: Vec<NodeSpec>,
    links: Vec<Link>,
}

impl From<RawBlueprint> for Blueprint {
    fn from(raw: RawBlueprint) -> Self {
        Self {
            bounds: Bounds::of(&raw.nodes),
            nodes: raw.nodes,
            links: raw.links,
        }
    }
}

impl Blueprint {
    /// Validate nodes and links into a blueprint
    pub fn new(nodes: Vec<NodeSpec>, links: Vec<Link>) -> Result<Self, BlueprintError> {
        let blueprint = Self {
            bounds: Bounds::of(&nodes),
            nodes,
            links,
        };
        blueprint.validate()?;
        Ok(blueprint)
    }

    /// Check structural invariants
    ///
    /// Deserialized blueprints bypass [`Blueprint::new`], so callers that
    /// load one from disk should validate it before use.
    pub fn validate(&self) -> Result<(), BlueprintError> {
        let count = self.nodes.len();
        if count < 2 {
            return Err(BlueprintError::TooFewNodes(count));
        }
        if count > MAX_NODES {
            return Err(BlueprintError::TooManyNodes {
                count,
                max: MAX_NODES,
            });
        }
        for (link, l) in self.links.iter().enumerate() {
            let spring = l.spring();
            for node in [spring.a, spring.b] {
                if node >= count {
                    return Err(BlueprintError::InvalidLinkIndex { link, node, count });
                }
            }
        }
        if self.muscle_count() == 0 {
            return Err(BlueprintError::NoMuscles);
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Muscle springs in link order
    pub fn muscles(&self) -> impl Iterator<Item = &Spring> {
        self.links.iter().filter_map(|link| match link {
            Link::Muscle(spring) => Some(spring),
            Link::Bone(_) => None,
        })
    }

    /// Bone springs in link order
    pub fn bones(&self) -> impl Iterator<Item = &Spring> {
        self.links.iter().filter_map(|link| match link {
            Link::Bone(spring) => Some(spring),
            Link::Muscle(_) => None,
        })
    }

    pub fn muscle_count(&self) -> usize {
        self.muscles().count()
    }

    pub fn bone_count(&self) -> usize {
        self.bones().count()
    }
}

/// Reasons the builder refuses an edit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("node limit reached ({0}); delete or reuse existing nodes")]
    NodeLimit(usize),
    #[error("no node at index {0}")]
    NoSuchNode(usize),
    #[error("a node cannot be linked to itself")]
    SelfLink,
    #[error("those nodes already share a {0:?} connection")]
    DuplicateLink(LinkKind),
}

/// Mutable design-space editor that produces [`Blueprint`]s
#[derive(Debug, Clone, Default)]
pub struct BlueprintBuilder {
    nodes: Vec<NodeSpec>,
    links: Vec<Link>,
}

impl BlueprintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing blueprint (e.g. to tweak a preset)
    pub fn from_blueprint(blueprint: &Blueprint) -> Self {
        Self {
            nodes: blueprint.nodes.clone(),
            links: blueprint.links.clone(),
        }
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Add a free node, clamped into the build area. Returns its index.
    pub fn add_node(&mut self, x: f32, y: f32) -> Result<usize, BuilderError> {
        if self.nodes.len() >= MAX_NODES {
            return Err(BuilderError::NodeLimit(MAX_NODES));
        }
        let (left, right, top, bottom) = BUILD_AREA;
        self.nodes.push(NodeSpec {
            x: x.clamp(left + BUILD_MARGIN, right - BUILD_MARGIN),
            y: y.clamp(top + BUILD_MARGIN, bottom - BUILD_MARGIN),
            fixed: false,
        });
        Ok(self.nodes.len() - 1)
    }

    /// Remove a node together with every link touching it
    ///
    /// Links to later nodes are re-indexed so they keep pointing at the same
    /// nodes.
    pub fn remove_node(&mut self, index: usize) -> Result<(), BuilderError> {
        if index >= self.nodes.len() {
            return Err(BuilderError::NoSuchNode(index));
        }
        self.nodes.remove(index);
        self.links
            .retain(|link| link.spring().a != index && link.spring().b != index);
        for link in &mut self.links {
            let spring = link.spring_mut();
            if spring.a > index {
                spring.a -= 1;
            }
            if spring.b > index {
                spring.b -= 1;
            }
        }
        Ok(())
    }

    pub fn add_muscle(&mut self, a: usize, b: usize) -> Result<(), BuilderError> {
        self.add_link(a, b, LinkKind::Muscle)
    }

    pub fn add_bone(&mut self, a: usize, b: usize) -> Result<(), BuilderError> {
        self.add_link(a, b, LinkKind::Bone)
    }

    /// Link two nodes; the rest length is their current distance (at least 1)
    pub fn add_link(&mut self, a: usize, b: usize, kind: LinkKind) -> Result<(), BuilderError> {
        if a == b {
            return Err(BuilderError::SelfLink);
        }
        let (Some(na), Some(nb)) = (self.nodes.get(a), self.nodes.get(b)) else {
            return Err(BuilderError::NoSuchNode(a.max(b)));
        };
        let duplicate = self
            .links
            .iter()
            .any(|link| link.kind() == kind && link.spring().joins(a, b));
        if duplicate {
            return Err(BuilderError::DuplicateLink(kind));
        }

        let rest = na.position().distance(nb.position()).max(1.0);
        let spring = Spring::new(a, b, rest);
        self.links.push(match kind {
            LinkKind::Muscle => Link::Muscle(spring),
            LinkKind::Bone => Link::Bone(spring),
        });
        Ok(())
    }

    /// Flip a node between anchored and free. Returns the new state.
    pub fn toggle_anchor(&mut self, index: usize) -> Result<bool, BuilderError> {
        let node = self
            .nodes
            .get_mut(index)
            .ok_or(BuilderError::NoSuchNode(index))?;
        node.fixed = !node.fixed;
        Ok(node.fixed)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
    }

    /// Validate the current design into a blueprint
    pub fn build(&self) -> Result<Blueprint, BlueprintError> {
        Blueprint::new(self.nodes.clone(), self.links.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_builder() -> BlueprintBuilder {
        let mut builder = BlueprintBuilder::new();
        builder.add_node(-25.0, 0.0).unwrap();
        builder.add_node(25.0, 0.0).unwrap();
        builder
    }

    #[test]
    fn test_build_valid_blueprint() {
        let mut builder = two_node_builder();
        builder.add_muscle(0, 1).unwrap();

        let blueprint = builder.build().unwrap();
        assert_eq!(blueprint.node_count(), 2);
        assert_eq!(blueprint.muscle_count(), 1);
        assert_eq!(blueprint.bone_count(), 0);
        assert!((blueprint.muscles().next().unwrap().rest - 50.0).abs() < 1e-4);
        assert_eq!(blueprint.bounds().width(), 50.0);
    }

    #[test]
    fn test_rejects_too_few_nodes() {
        let mut builder = BlueprintBuilder::new();
        builder.add_node(0.0, 0.0).unwrap();
        assert_eq!(builder.build(), Err(BlueprintError::TooFewNodes(1)));
    }

    #[test]
    fn test_rejects_no_muscles() {
        let mut builder = two_node_builder();
        builder.add_bone(0, 1).unwrap();
        assert_eq!(builder.build(), Err(BlueprintError::NoMuscles));
    }

    #[test]
    fn test_rejects_too_many_nodes() {
        let nodes: Vec<NodeSpec> = (0..MAX_NODES + 1)
            .map(|i| NodeSpec {
                x: i as f32 * 10.0,
                y: 0.0,
                fixed: false,
            })
            .collect();
        let links = vec![Link::Muscle(Spring::new(0, 1, 10.0))];

        assert_eq!(
            Blueprint::new(nodes, links),
            Err(BlueprintError::TooManyNodes {
                count: MAX_NODES + 1,
                max: MAX_NODES
            })
        );
    }

    #[test]
    fn test_rejects_out_of_range_link() {
        let nodes = vec![
            NodeSpec {
                x: 0.0,
                y: 0.0,
                fixed: false,
            },
            NodeSpec {
                x: 10.0,
                y: 0.0,
                fixed: false,
            },
        ];
        let links = vec![Link::Muscle(Spring::new(0, 5, 10.0))];

        assert!(matches!(
            Blueprint::new(nodes, links),
            Err(BlueprintError::InvalidLinkIndex { node: 5, .. })
        ));
    }

    #[test]
    fn test_node_limit() {
        let mut builder = BlueprintBuilder::new();
        for i in 0..MAX_NODES {
            builder.add_node(i as f32, 0.0).unwrap();
        }
        assert_eq!(
            builder.add_node(0.0, 0.0),
            Err(BuilderError::NodeLimit(MAX_NODES))
        );
    }

    #[test]
    fn test_add_node_clamps_to_build_area() {
        let mut builder = BlueprintBuilder::new();
        let idx = builder.add_node(1000.0, -1000.0).unwrap();
        let node = builder.nodes()[idx];
        assert_eq!(node.x, 220.0 - BUILD_MARGIN);
        assert_eq!(node.y, -160.0 + BUILD_MARGIN);
    }

    #[test]
    fn test_duplicate_and_self_links() {
        let mut builder = two_node_builder();
        builder.add_muscle(0, 1).unwrap();

        assert_eq!(
            builder.add_muscle(1, 0),
            Err(BuilderError::DuplicateLink(LinkKind::Muscle))
        );
        assert_eq!(builder.add_muscle(1, 1), Err(BuilderError::SelfLink));
        // A bone may share a pair with a muscle
        assert!(builder.add_bone(0, 1).is_ok());
    }

    #[test]
    fn test_rest_length_floored() {
        let mut builder = BlueprintBuilder::new();
        builder.add_node(0.0, 0.0).unwrap();
        builder.add_node(0.0, 0.0).unwrap();
        builder.add_muscle(0, 1).unwrap();
        assert_eq!(builder.links()[0].spring().rest, 1.0);
    }

    #[test]
    fn test_remove_node_reindexes_links() {
        let mut builder = BlueprintBuilder::new();
        for x in [0.0, 50.0, 100.0] {
            builder.add_node(x, 0.0).unwrap();
        }
        builder.add_muscle(0, 1).unwrap();
        builder.add_bone(1, 2).unwrap();
        builder.add_muscle(0, 2).unwrap();

        builder.remove_node(1).unwrap();

        assert_eq!(builder.nodes().len(), 2);
        assert_eq!(builder.links().len(), 1);
        let spring = builder.links()[0].spring();
        assert_eq!((spring.a, spring.b), (0, 1));
        assert_eq!(builder.links()[0].kind(), LinkKind::Muscle);
    }

    #[test]
    fn test_loaded_bounds_follow_nodes() {
        let text = "(nodes: [(x: 0.0, y: 0.0), (x: 150.0, y: 100.0)], \
                    links: [Muscle((a: 0, b: 1, rest: 180.0))], \
                    bounds: (min_x: 0.0, max_x: 150.0, min_y: 0.0, max_y: 0.0))";
        let blueprint: Blueprint = ron::from_str(text).unwrap();

        assert_eq!(blueprint.bounds(), Bounds::of(blueprint.nodes()));
        assert_eq!(blueprint.bounds().max_y, 100.0);
        assert!(blueprint.validate().is_ok());
    }

    #[test]
    fn test_toggle_anchor() {
        let mut builder = two_node_builder();
        assert_eq!(builder.toggle_anchor(0), Ok(true));
        assert!(builder.nodes()[0].fixed);
        assert_eq!(builder.toggle_anchor(0), Ok(false));
        assert_eq!(builder.toggle_anchor(9), Err(BuilderError::NoSuchNode(9)));
    }

    #[test]
    fn test_error_messages() {
        let err = BlueprintError::TooManyNodes { count: 21, max: 20 };
        assert_eq!(err.to_string(), "limit the creature to 20 nodes (current: 21)");
    }
}
