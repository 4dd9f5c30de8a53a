use crate::body::Body;
use crate::config::{GravityParameters, QuadTreeConfig};
use ultraviolet::DVec2;

/// Marks an absent entry link.
const NONE: u32 = u32::MAX;

/// One of the four children of a subdivided [`Quad`].
/// `y` grows southwards, matching screen coordinates.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    NorthWest = 0,
    NorthEast = 1,
    SouthWest = 2,
    SouthEast = 3,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    /// Bit 0 is "east", bit 1 is "south".
    pub fn index(self) -> usize {
        self as usize
    }

    fn is_east(self) -> bool {
        self.index() & 1 != 0
    }

    fn is_south(self) -> bool {
        self.index() & 2 != 0
    }
}

/// An axis-aligned square region, `[origin.x, origin.x + size] × [origin.y, origin.y + size]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub origin: DVec2,
    pub size: f64,
}

impl Quad {
    pub fn new(origin: DVec2, size: f64) -> Self {
        debug_assert!(size > 0.0, "quad size must be positive, got {size}");
        Self { origin, size }
    }

    /// The simulation domain `[0, extent]²`.
    pub fn domain(extent: f64) -> Self {
        Self::new(DVec2::zero(), extent)
    }

    pub fn center(&self) -> DVec2 {
        self.origin + DVec2::broadcast(self.size * 0.5)
    }

    /// Closed containment test, inclusive on all four edges.
    /// Always false for non-finite positions.
    pub fn contains(&self, pos: DVec2) -> bool {
        pos.x >= self.origin.x
            && pos.x <= self.origin.x + self.size
            && pos.y >= self.origin.y
            && pos.y <= self.origin.y + self.size
    }

    /// Determines which quadrant a position falls into relative to the quad's center.
    /// Points on a midline belong to the east/south side, so every point of the
    /// quad maps to exactly one child, and that child contains it.
    pub fn find_quadrant(&self, pos: DVec2) -> Quadrant {
        let center = self.center();
        let index = ((pos.y >= center.y) as usize) << 1 | (pos.x >= center.x) as usize;
        Quadrant::ALL[index]
    }

    /// The sub-square of half the side length in the given quadrant.
    pub fn quadrant(&self, quadrant: Quadrant) -> Self {
        let size = self.size * 0.5;
        let mut origin = self.origin;
        if quadrant.is_east() {
            origin.x += size;
        }
        if quadrant.is_south() {
            origin.y += size;
        }
        Self::new(origin, size)
    }

    /// Divides the quad into 4 equal sub-quadrants, indexed by [`Quadrant::index`].
    pub fn subdivide(&self) -> [Quad; 4] {
        Quadrant::ALL.map(|q| self.quadrant(q))
    }
}

/// A body as seen by the tree: a snapshot of its position and mass taken
/// at insertion, plus its index in the body set.
#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub index: usize,
    pub pos: DVec2,
    pub mass: f64,
    /// Next entry held by the same leaf. Only leaves at the depth cutoff
    /// hold more than one.
    next: u32,
}

#[derive(Clone, Debug)]
pub struct Node {
    /// Index of the first of four contiguous children (0 if leaf).
    pub children: u32,
    /// Index of the next sibling, or of the parent's next sibling for the
    /// last child (0 marks the end of the traversal).
    pub next: u32,
    /// Center of mass of the subtree.
    pub pos: DVec2,
    /// Total mass of the subtree.
    pub mass: f64,
    /// Spatial bounds of the node.
    pub quad: Quad,
    /// Head of the chain of entries held by this leaf.
    entry: u32,
}

impl Node {
    fn new(next: u32, quad: Quad) -> Self {
        Self {
            children: 0,
            next,
            pos: DVec2::zero(),
            mass: 0.0,
            quad,
            entry: NONE,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children == 0
    }

    pub fn is_branch(&self) -> bool {
        self.children != 0
    }

    pub fn is_empty(&self) -> bool {
        self.mass == 0.0
    }

    /// Folds a body into the running mass-weighted centroid.
    fn absorb(&mut self, pos: DVec2, mass: f64) {
        let total = self.mass + mass;
        self.pos = (self.pos * self.mass + pos * mass) / total;
        self.mass = total;
    }
}

/// Work done by one force evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Traversal {
    /// Internal nodes that were opened.
    pub expansions: usize,
    /// Pairwise or pseudo-body contributions applied.
    pub interactions: usize,
}

impl std::ops::AddAssign for Traversal {
    fn add_assign(&mut self, rhs: Self) {
        self.expansions += rhs.expansions;
        self.interactions += rhs.interactions;
    }
}

/// The Quadtree data structure for the Barnes-Hut simulation.
/// Nodes live in a flat vector; the four children of a node are contiguous.
#[derive(Debug)]
pub struct Quadtree {
    /// Theta squared (opening angle threshold for approximation).
    t_sq: f64,
    gravity: GravityParameters,
    pub max_depth: usize,
    /// Linearized tree nodes.
    pub nodes: Vec<Node>,
    /// Bodies held by the leaves.
    pub entries: Vec<Entry>,
}

impl Quadtree {
    pub const ROOT: usize = 0;

    pub fn new(gravity: &GravityParameters, config: &QuadTreeConfig) -> Self {
        Self {
            t_sq: gravity.opening_angle * gravity.opening_angle,
            gravity: gravity.clone(),
            max_depth: config.max_depth,
            nodes: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn gravity(&self) -> &GravityParameters {
        &self.gravity
    }

    /// Changes the opening angle used by later force evaluations. The tree
    /// itself does not depend on it.
    pub fn set_opening_angle(&mut self, theta: f64) {
        self.gravity.opening_angle = theta;
        self.t_sq = theta * theta;
    }

    /// Resets the tree and initializes an empty root node with the given bounds.
    pub fn clear(&mut self, quad: Quad) {
        self.nodes.clear();
        self.entries.clear();
        self.nodes.push(Node::new(0, quad));
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    /// Index of the given child of `node`, if `node` is subdivided.
    pub fn child(&self, node: usize, quadrant: Quadrant) -> Option<usize> {
        let n = &self.nodes[node];
        n.is_branch().then(|| n.children as usize + quadrant.index())
    }

    /// The bodies held directly by `node` (empty for internal nodes).
    pub fn entries_of(&self, node: usize) -> impl Iterator<Item = &Entry> + '_ {
        let mut e = self.nodes[node].entry;
        std::iter::from_fn(move || {
            if e == NONE {
                return None;
            }
            let entry = &self.entries[e as usize];
            e = entry.next;
            Some(entry)
        })
    }

    /// Subdivides a leaf node into 4 children.
    /// Returns the index of the first child.
    fn subdivide(&mut self, node: usize) -> usize {
        let children = self.nodes.len() as u32;
        self.nodes[node].children = children;

        // The last child links to the parent's successor so the force walk
        // can run without a stack.
        let nexts = [
            children + 1,
            children + 2,
            children + 3,
            self.nodes[node].next,
        ];
        let quads = self.nodes[node].quad.subdivide();
        for i in 0..4 {
            self.nodes.push(Node::new(nexts[i], quads[i]));
        }

        children as usize
    }

    /// Inserts every body, keyed by its index in `bodies`.
    /// Returns how many were dropped for lying outside the root region.
    pub fn insert_all(&mut self, bodies: &[Body]) -> usize {
        bodies
            .iter()
            .enumerate()
            .filter(|(index, body)| !self.insert(*index, body.pos, body.mass))
            .count()
    }

    /// Inserts a body (position and mass) into the tree, updating the mass
    /// and center of mass of every node on the way down.
    ///
    /// Returns `false` without touching the tree if the root region does not
    /// contain `pos`. `mass` must be positive.
    pub fn insert(&mut self, index: usize, pos: DVec2, mass: f64) -> bool {
        if self.nodes.is_empty() || !self.root().quad.contains(pos) {
            log::trace!("dropping body {index} at {pos:?}: outside the root region");
            return false;
        }

        let entry = self.entries.len() as u32;
        self.entries.push(Entry {
            index,
            pos,
            mass,
            next: NONE,
        });

        let mut node = Self::ROOT;
        let mut depth = 0;
        loop {
            if self.nodes[node].is_branch() {
                self.nodes[node].absorb(pos, mass);
                let quadrant = self.nodes[node].quad.find_quadrant(pos);
                node = self.nodes[node].children as usize + quadrant.index();
                depth += 1;
                continue;
            }

            let held = self.nodes[node].entry;

            // Empty leaf: the body lives here
            if held == NONE {
                let n = &mut self.nodes[node];
                n.entry = entry;
                n.mass = mass;
                n.pos = pos;
                return true;
            }

            // Too deep, or too small to halve: share the leaf
            if depth >= self.max_depth || self.nodes[node].quad.size * 0.5 == 0.0 {
                self.entries[entry as usize].next = held;
                let n = &mut self.nodes[node];
                n.entry = entry;
                n.absorb(pos, mass);
                log::trace!("body {index} merged into a leaf at depth {depth}");
                return true;
            }

            // Occupied leaf: push the resident body down one level. The node's
            // aggregate already accounts for it; the next iteration treats the
            // node as a branch and folds in the new body.
            let children = self.subdivide(node);
            self.nodes[node].entry = NONE;
            let resident = self.entries[held as usize];
            let quadrant = self.nodes[node].quad.find_quadrant(resident.pos);
            let n = &mut self.nodes[children + quadrant.index()];
            n.entry = held;
            n.mass = resident.mass;
            n.pos = resident.pos;
        }
    }

    /// Adds to `body.force` the pull of every body in the tree except the one
    /// stored under `index`.
    ///
    /// An internal node whose side `s` and distance `d` to its center of mass
    /// satisfy `s / d < theta` acts as a single pseudo-body; otherwise its
    /// children are visited. Leaves always contribute exactly.
    pub fn update_force(&self, index: usize, body: &mut Body) -> Traversal {
        let mut stats = Traversal::default();
        if self.nodes.is_empty() {
            return stats;
        }

        let mut node = Self::ROOT;
        loop {
            let n = &self.nodes[node];

            if !n.is_empty() {
                if n.is_leaf() {
                    for entry in self.entries_of(node) {
                        if entry.index != index {
                            body.add_force(entry.pos, entry.mass, &self.gravity);
                            stats.interactions += 1;
                        }
                    }
                } else {
                    // s/d < theta  <=>  s^2 < d^2 * theta^2 ; never true at d = 0
                    let d_sq = (n.pos - body.pos).mag_sq();
                    if n.quad.size * n.quad.size < d_sq * self.t_sq {
                        body.add_force(n.pos, n.mass, &self.gravity);
                        stats.interactions += 1;
                    } else {
                        stats.expansions += 1;
                        node = n.children as usize;
                        continue;
                    }
                }
            }

            if n.next == 0 {
                break;
            }
            node = n.next as usize;
        }

        stats
    }
}
