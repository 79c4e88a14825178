//! Tileset planner.
//!
//! Walks a tileset tree depth-first and selects the content needed to
//! cover an area of interest down to a maximum depth. Branches whose
//! region misses the area are discarded without fetching anything below
//! them.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::types::{BoundingVolume, PlannedTile, Refine, TileContent, TileNode, Tileset};
use super::uri;
use crate::geodesy::GeodeticBox;
use crate::provider::TilesetService;

/// Counters collected during a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Nodes examined, including spliced sub-tileset roots.
    pub visited: usize,
    /// Nodes discarded (with their subtrees) by the spatial test.
    pub pruned: usize,
    /// Nested tileset documents fetched and spliced in.
    pub sub_tilesets_fetched: usize,
    /// Nested tileset documents that could not be fetched.
    pub sub_tileset_failures: usize,
}

/// The ordered plan produced by a walk.
#[derive(Debug, Clone, Default)]
pub struct TilesetPlan {
    pub tiles: Vec<PlannedTile>,
    pub stats: WalkStats,
}

impl TilesetPlan {
    /// Whether no tile was selected.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Depth-first tileset planner.
///
/// # Example
///
/// ```ignore
/// let walker = TilesetWalker::new(&service, 16).with_area(aoi_box);
/// let plan = walker.plan(&service.fetch_root_tileset()?);
/// ```
pub struct TilesetWalker<'a> {
    service: &'a dyn TilesetService,
    max_depth: u32,
    area: Option<GeodeticBox>,
}

impl<'a> TilesetWalker<'a> {
    /// Creates a walker that descends at most `max_depth` levels below the root.
    ///
    /// Without an area every node with a bounding volume is considered
    /// intersecting.
    pub fn new(service: &'a dyn TilesetService, max_depth: u32) -> Self {
        Self {
            service,
            max_depth,
            area: None,
        }
    }

    /// Restricts the walk to an area's geodetic box.
    pub fn with_area(mut self, area: GeodeticBox) -> Self {
        self.area = Some(area);
        self
    }

    /// Plans the tiles needed from `tileset`.
    pub fn plan(&self, tileset: &Tileset) -> TilesetPlan {
        let mut walk = Walk {
            walker: self,
            plan: TilesetPlan::default(),
            expanded: HashSet::new(),
        };
        walk.expanded.insert(uri::strip_query(&tileset.uri).to_string());
        walk.visit(&tileset.root, &tileset.uri, 0, Refine::default());

        debug!(
            tiles = walk.plan.tiles.len(),
            visited = walk.plan.stats.visited,
            pruned = walk.plan.stats.pruned,
            sub_tilesets = walk.plan.stats.sub_tilesets_fetched,
            "Tileset walk complete"
        );
        walk.plan
    }

    fn intersects(&self, volume: Option<&BoundingVolume>) -> bool {
        match (volume, &self.area) {
            // No spatial information is never grounds for inclusion
            (None, _) => false,
            (Some(_), None) => true,
            (Some(volume), Some(area)) => volume.intersects(area),
        }
    }
}

/// Mutable state of a single walk.
struct Walk<'w, 'a> {
    walker: &'w TilesetWalker<'a>,
    plan: TilesetPlan,
    /// Nested documents already spliced, by URI without query.
    expanded: HashSet<String>,
}

impl Walk<'_, '_> {
    fn visit(&mut self, node: &TileNode, base: &str, depth: u32, inherited: Refine) {
        self.plan.stats.visited += 1;

        if !self.walker.intersects(node.bounding_volume.as_ref()) {
            self.plan.stats.pruned += 1;
            return;
        }
        let Some(volume) = node.bounding_volume else {
            return;
        };

        let refine = node.refine.unwrap_or(inherited);
        let terminal = node.children.is_empty() || depth >= self.walker.max_depth;

        match &node.content {
            Some(TileContent::External { uri }) => {
                self.splice(uri, base, depth, refine);
            }
            // Under ADD an interior node's content is drawn together with its children
            Some(TileContent::Mesh { uri }) if terminal || refine == Refine::Add => {
                self.plan.tiles.push(PlannedTile {
                    uri: uri::resolve(base, uri),
                    depth,
                    bounding_volume: volume,
                    refine,
                });
            }
            _ => {}
        }

        if terminal {
            return;
        }
        for child in &node.children {
            self.visit(child, base, depth + 1, refine);
        }
    }

    /// Fetches a nested tileset and walks its root in place of the
    /// referencing node, at the same depth.
    fn splice(&mut self, reference: &str, base: &str, depth: u32, refine: Refine) {
        let resolved = uri::resolve(base, reference);
        if !self.expanded.insert(uri::strip_query(&resolved).to_string()) {
            debug!(uri = %resolved, "Tileset already expanded, skipping");
            return;
        }

        match self.walker.service.fetch_sub_tileset(&resolved) {
            Ok(sub) => {
                self.plan.stats.sub_tilesets_fetched += 1;
                self.visit(&sub.root, &sub.uri, depth, refine);
            }
            Err(e) => {
                self.plan.stats.sub_tileset_failures += 1;
                warn!(uri = %resolved, error = %e, "Failed to fetch nested tileset, skipping branch");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::testing::{leaf, node, region, InMemoryService};
    use crate::tileset::types::{OrientedBox, Sphere};

    fn root_tileset(root: TileNode) -> Tileset {
        Tileset {
            uri: "root.json".to_string(),
            version: None,
            geometric_error: 0.0,
            root,
        }
    }

    fn uris(plan: &TilesetPlan) -> Vec<&str> {
        plan.tiles.iter().map(|t| t.uri.as_str()).collect()
    }

    #[test]
    fn test_prunes_non_overlapping_sibling() {
        let tree = node(
            region(0.0, 0.0, 20.0, 10.0),
            None,
            None,
            vec![
                node(
                    region(0.0, 0.0, 10.0, 10.0),
                    None,
                    None,
                    vec![leaf(region(0.0, 0.0, 5.0, 5.0), "west-a.glb"), leaf(region(5.0, 5.0, 10.0, 10.0), "west-b.glb")],
                ),
                node(
                    region(10.5, 0.0, 20.0, 10.0),
                    None,
                    None,
                    vec![leaf(region(10.5, 0.0, 20.0, 10.0), "east.glb")],
                ),
            ],
        );
        let service = InMemoryService::default();
        let walker = TilesetWalker::new(&service, 10).with_area(GeodeticBox::new(1.0, 1.0, 9.0, 9.0));

        let plan = walker.plan(&root_tileset(tree));

        assert_eq!(uris(&plan), vec!["west-a.glb", "west-b.glb"]);
        assert_eq!(plan.stats.pruned, 1);
    }

    #[test]
    fn test_depth_bound_stops_descent() {
        let tree = node(
            region(0.0, 0.0, 10.0, 10.0),
            None,
            Some("d0.glb"),
            vec![node(
                region(0.0, 0.0, 10.0, 10.0),
                None,
                Some("d1.glb"),
                vec![leaf(region(0.0, 0.0, 10.0, 10.0), "d2.glb")],
            )],
        );
        let service = InMemoryService::default();

        let plan = TilesetWalker::new(&service, 1).plan(&root_tileset(tree.clone()));
        assert_eq!(uris(&plan), vec!["d1.glb"]);
        assert_eq!(plan.tiles[0].depth, 1);

        let plan = TilesetWalker::new(&service, 0).plan(&root_tileset(tree));
        assert_eq!(uris(&plan), vec!["d0.glb"]);
    }

    #[test]
    fn test_replace_keeps_only_child_content() {
        let tree = node(
            region(0.0, 0.0, 1.0, 1.0),
            Some(Refine::Replace),
            Some("root.glb"),
            vec![leaf(region(0.0, 0.0, 1.0, 1.0), "child.glb")],
        );
        let service = InMemoryService::default();

        let plan = TilesetWalker::new(&service, 5).plan(&root_tileset(tree));

        assert_eq!(uris(&plan), vec!["child.glb"]);
    }

    #[test]
    fn test_add_keeps_parent_and_child_content() {
        let tree = node(
            region(0.0, 0.0, 1.0, 1.0),
            Some(Refine::Add),
            Some("root.glb"),
            vec![leaf(region(0.0, 0.0, 1.0, 1.0), "child.glb")],
        );
        let service = InMemoryService::default();

        let plan = TilesetWalker::new(&service, 5).plan(&root_tileset(tree));

        assert_eq!(uris(&plan), vec!["root.glb", "child.glb"]);
        assert!(plan.tiles.iter().all(|t| t.refine == Refine::Add));
    }

    #[test]
    fn test_refine_inherited_from_nearest_ancestor() {
        let tree = node(
            region(0.0, 0.0, 1.0, 1.0),
            Some(Refine::Add),
            None,
            vec![node(
                region(0.0, 0.0, 1.0, 1.0),
                None,
                Some("mid.glb"),
                vec![leaf(region(0.0, 0.0, 1.0, 1.0), "deep.glb")],
            )],
        );
        let service = InMemoryService::default();

        let plan = TilesetWalker::new(&service, 5).plan(&root_tileset(tree));

        assert_eq!(uris(&plan), vec!["mid.glb", "deep.glb"]);
        assert_eq!(plan.tiles[0].refine, Refine::Add);
    }

    #[test]
    fn test_missing_bounding_volume_is_dropped() {
        let mut child = leaf(region(0.0, 0.0, 1.0, 1.0), "nobv.glb");
        child.bounding_volume = None;
        let tree = node(region(0.0, 0.0, 1.0, 1.0), None, None, vec![child, leaf(region(0.0, 0.0, 1.0, 1.0), "ok.glb")]);
        let service = InMemoryService::default();

        let plan = TilesetWalker::new(&service, 5).plan(&root_tileset(tree));

        assert_eq!(uris(&plan), vec!["ok.glb"]);
        assert_eq!(plan.stats.pruned, 1);
    }

    #[test]
    fn test_box_and_sphere_volumes_never_prune() {
        let tree = node(
            region(0.0, 0.0, 1.0, 1.0),
            None,
            None,
            vec![
                leaf(BoundingVolume::Box(OrientedBox([0.0; 12])), "box.glb"),
                leaf(
                    BoundingVolume::Sphere(Sphere {
                        center: [0.0; 3],
                        radius: 1.0,
                    }),
                    "sphere.glb",
                ),
            ],
        );
        let service = InMemoryService::default();
        let walker = TilesetWalker::new(&service, 5).with_area(GeodeticBox::new(0.1, 0.1, 0.2, 0.2));

        let plan = walker.plan(&root_tileset(tree));

        assert_eq!(uris(&plan), vec!["box.glb", "sphere.glb"]);
    }

    #[test]
    fn test_zero_overlap_yields_empty_plan() {
        let tree = leaf(region(50.0, 50.0, 51.0, 51.0), "far.glb");
        let service = InMemoryService::default();
        let walker = TilesetWalker::new(&service, 5).with_area(GeodeticBox::new(0.0, 0.0, 1.0, 1.0));

        let plan = walker.plan(&root_tileset(tree));

        assert!(plan.is_empty());
        assert_eq!(plan.stats.visited, 1);
    }

    #[test]
    fn test_splices_sub_tileset_and_resolves_uris() {
        let sub = Tileset {
            uri: "data/sub/tileset.json".to_string(),
            version: None,
            geometric_error: 0.0,
            root: node(
                region(0.0, 0.0, 1.0, 1.0),
                Some(Refine::Add),
                Some("sub-root.glb"),
                vec![leaf(region(0.0, 0.0, 1.0, 1.0), "sub-leaf.glb")],
            ),
        };
        let service = InMemoryService::default().with_tileset(sub);
        let tree = node(
            region(0.0, 0.0, 1.0, 1.0),
            None,
            None,
            vec![leaf(region(0.0, 0.0, 1.0, 1.0), "sub/tileset.json")],
        );
        let root = Tileset {
            uri: "data/root.json".to_string(),
            ..root_tileset(tree)
        };

        let plan = TilesetWalker::new(&service, 5).plan(&root);

        assert_eq!(uris(&plan), vec!["data/sub/sub-root.glb", "data/sub/sub-leaf.glb"]);
        // The sub-tileset root takes the referencing child's depth
        assert_eq!(plan.tiles[0].depth, 1);
        assert_eq!(plan.tiles[1].depth, 2);
        assert_eq!(plan.stats.sub_tilesets_fetched, 1);
    }

    #[test]
    fn test_sub_tileset_inherits_refine_from_referencing_node() {
        let sub = Tileset {
            uri: "sub.json".to_string(),
            version: None,
            geometric_error: 0.0,
            root: node(
                region(0.0, 0.0, 1.0, 1.0),
                None,
                Some("sub-root.glb"),
                vec![leaf(region(0.0, 0.0, 1.0, 1.0), "sub-leaf.glb")],
            ),
        };
        let service = InMemoryService::default().with_tileset(sub);
        let tree = node(
            region(0.0, 0.0, 1.0, 1.0),
            Some(Refine::Add),
            None,
            vec![leaf(region(0.0, 0.0, 1.0, 1.0), "sub.json")],
        );

        let plan = TilesetWalker::new(&service, 5).plan(&root_tileset(tree));

        assert_eq!(uris(&plan), vec!["sub-root.glb", "sub-leaf.glb"]);
    }

    #[test]
    fn test_pruned_reference_is_never_fetched() {
        let service = InMemoryService::default();
        let tree = node(
            region(0.0, 0.0, 20.0, 20.0),
            None,
            None,
            vec![leaf(region(15.0, 15.0, 20.0, 20.0), "far/tileset.json")],
        );
        let walker = TilesetWalker::new(&service, 5).with_area(GeodeticBox::new(0.0, 0.0, 1.0, 1.0));

        let plan = walker.plan(&root_tileset(tree));

        assert!(plan.is_empty());
        assert_eq!(service.fetch_count(), 0);
    }

    #[test]
    fn test_failed_sub_tileset_is_skipped() {
        let service = InMemoryService::default();
        let tree = node(
            region(0.0, 0.0, 1.0, 1.0),
            None,
            None,
            vec![
                leaf(region(0.0, 0.0, 1.0, 1.0), "missing.json"),
                leaf(region(0.0, 0.0, 1.0, 1.0), "ok.glb"),
            ],
        );

        let plan = TilesetWalker::new(&service, 5).plan(&root_tileset(tree));

        assert_eq!(uris(&plan), vec!["ok.glb"]);
        assert_eq!(plan.stats.sub_tileset_failures, 1);
    }

    #[test]
    fn test_cyclic_reference_is_expanded_once() {
        let cyclic = Tileset {
            uri: "loop.json".to_string(),
            version: None,
            geometric_error: 0.0,
            root: node(
                region(0.0, 0.0, 1.0, 1.0),
                None,
                None,
                vec![
                    leaf(region(0.0, 0.0, 1.0, 1.0), "loop.json"),
                    leaf(region(0.0, 0.0, 1.0, 1.0), "tile.glb"),
                ],
            ),
        };
        let service = InMemoryService::default().with_tileset(cyclic);
        let tree = node(region(0.0, 0.0, 1.0, 1.0), None, None, vec![leaf(region(0.0, 0.0, 1.0, 1.0), "loop.json")]);

        let plan = TilesetWalker::new(&service, 50).plan(&root_tileset(tree));

        assert_eq!(uris(&plan), vec!["tile.glb"]);
        assert_eq!(service.fetch_count(), 1);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        /// Full binary tree of the given height where every node has content.
        fn full_tree(height: u32, refine: Option<Refine>, name: String) -> TileNode {
            let children = if height == 0 {
                Vec::new()
            } else {
                vec![
                    full_tree(height - 1, None, format!("{}0", name)),
                    full_tree(height - 1, None, format!("{}1", name)),
                ]
            };
            node(region(0.0, 0.0, 1.0, 1.0), refine, Some(&format!("{}.glb", name)), children)
        }

        proptest! {
            #[test]
            fn test_no_planned_tile_exceeds_max_depth(
                height in 0u32..6,
                max_depth in 0u32..8,
                additive in any::<bool>()
            ) {
                let refine = if additive { Refine::Add } else { Refine::Replace };
                let tree = full_tree(height, Some(refine), "t".to_string());
                let service = InMemoryService::default();

                let plan = TilesetWalker::new(&service, max_depth).plan(&root_tileset(tree));

                prop_assert!(!plan.tiles.is_empty());
                for tile in &plan.tiles {
                    prop_assert!(tile.depth <= max_depth);
                }
                let deepest = height.min(max_depth);
                let expected = if additive {
                    (0..=deepest).map(|d| 1usize << d).sum::<usize>()
                } else {
                    1usize << deepest
                };
                prop_assert_eq!(plan.tiles.len(), expected);
            }
        }
    }
}
