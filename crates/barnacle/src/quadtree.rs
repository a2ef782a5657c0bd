//! Quadtree spatial index for Barnes-Hut force approximation.
//!
//! Cells live in a flat arena that is reset (capacity retained) every
//! simulation step; child links are indices into the arena. Building the
//! tree costs O(n log n) and each force query O(log n) amortized, which is
//! the whole point versus the O(n²) exact pairwise sum.

/// Axis-aligned bounding region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Quadrant index for a point: 0 = NW, 1 = NE, 2 = SW, 3 = SE.
    fn quadrant_of(&self, x: f64, y: f64) -> usize {
        let east = x >= self.mid_x();
        let south = y >= self.mid_y();
        (south as usize) * 2 + (east as usize)
    }

    fn quadrant(&self, i: usize) -> Region {
        let w = self.width / 2.0;
        let h = self.height / 2.0;
        let x = if i % 2 == 0 { self.x } else { self.x + w };
        let y = if i < 2 { self.y } else { self.y + h };
        Region {
            x,
            y,
            width: w,
            height: h,
        }
    }

    /// Side length used for the Barnes-Hut opening criterion.
    fn extent(&self) -> f64 {
        self.width.max(self.height)
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    x: f64,
    y: f64,
    mass: f64,
}

#[derive(Debug, Clone)]
struct Cell {
    region: Region,
    /// Aggregate mass of every body in this subtree.
    mass: f64,
    /// Mass-weighted average position of those bodies.
    com_x: f64,
    com_y: f64,
    /// Index of the first of four contiguous children, if subdivided.
    children: Option<usize>,
    /// Leaf payload; coincident bodies merge into one.
    body: Option<Body>,
}

impl Cell {
    fn empty(region: Region) -> Self {
        Self {
            region,
            mass: 0.0,
            com_x: 0.0,
            com_y: 0.0,
            children: None,
            body: None,
        }
    }

    fn accumulate(&mut self, x: f64, y: f64, mass: f64) {
        let total = self.mass + mass;
        self.com_x = (self.com_x * self.mass + x * mass) / total;
        self.com_y = (self.com_y * self.mass + y * mass) / total;
        self.mass = total;
    }
}

/// Two points closer than this contribute no force to each other (covers a
/// query point meeting its own leaf).
const COINCIDENT_EPSILON: f64 = 1e-9;

/// Distance floor for the inverse-square law; prevents blow-up for
/// near-coincident points.
const MIN_DISTANCE: f64 = 1.0;

/// Past this depth, inserts merge into the deepest leaf instead of
/// subdividing further (duplicate coordinates would otherwise recurse
/// forever).
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone)]
pub struct QuadTree {
    cells: Vec<Cell>,
    region: Region,
    /// Scratch stack for force traversals, reused across queries.
    stack: Vec<usize>,
}

impl QuadTree {
    pub fn new(region: Region) -> Self {
        Self {
            cells: Vec::new(),
            region,
            stack: Vec::new(),
        }
    }

    /// Recycles the arena for a new bounding region. Capacity is retained,
    /// so per-step rebuilds settle into zero allocations.
    pub fn reset(&mut self, region: Region) {
        self.cells.clear();
        self.region = region;
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() || self.cells[0].mass == 0.0
    }

    /// Aggregate mass of everything inserted since the last reset.
    pub fn mass(&self) -> f64 {
        self.cells.first().map_or(0.0, |root| root.mass)
    }

    /// Mass-weighted average position of everything inserted, or `None` for
    /// an empty tree.
    pub fn center_of_mass(&self) -> Option<(f64, f64)> {
        match self.cells.first() {
            Some(root) if root.mass > 0.0 => Some((root.com_x, root.com_y)),
            _ => None,
        }
    }

    /// Adds a point mass, subdividing on demand. Duplicate or coincident
    /// coordinates never error; at the depth limit they merge into the
    /// deepest leaf's combined mass. Non-finite input is ignored.
    pub fn insert(&mut self, x: f64, y: f64, mass: f64) {
        if !(x.is_finite() && y.is_finite() && mass.is_finite()) || mass <= 0.0 {
            return;
        }
        if self.cells.is_empty() {
            self.cells.push(Cell::empty(self.region));
        }

        let mut idx = 0;
        let mut depth = 0;
        loop {
            self.cells[idx].accumulate(x, y, mass);

            if let Some(first_child) = self.cells[idx].children {
                idx = first_child + self.cells[idx].region.quadrant_of(x, y);
                depth += 1;
                continue;
            }

            let Some(existing) = self.cells[idx].body else {
                self.cells[idx].body = Some(Body { x, y, mass });
                return;
            };

            let dx = existing.x - x;
            let dy = existing.y - y;
            let coincident = dx * dx + dy * dy < COINCIDENT_EPSILON;
            if depth >= MAX_DEPTH || coincident || self.cells[idx].region.extent() <= f64::EPSILON {
                // The cell aggregate already includes the new mass; collapse
                // the leaf body onto it.
                let cell = &mut self.cells[idx];
                cell.body = Some(Body {
                    x: cell.com_x,
                    y: cell.com_y,
                    mass: cell.mass,
                });
                return;
            }

            // Split the leaf: relocate the existing body one level down,
            // then keep descending with the new point.
            let first_child = self.subdivide(idx);
            let region = self.cells[idx].region;
            let child = first_child + region.quadrant_of(existing.x, existing.y);
            self.cells[child].accumulate(existing.x, existing.y, existing.mass);
            self.cells[child].body = Some(existing);

            idx = first_child + region.quadrant_of(x, y);
            depth += 1;
        }
    }

    fn subdivide(&mut self, idx: usize) -> usize {
        let first_child = self.cells.len();
        let region = self.cells[idx].region;
        for i in 0..4 {
            self.cells.push(Cell::empty(region.quadrant(i)));
        }
        self.cells[idx].children = Some(first_child);
        self.cells[idx].body = None;
        first_child
    }

    /// Net repulsive force on `(x, y, mass)` from everything in the tree.
    ///
    /// Barnes-Hut opening criterion: a region of side `s` whose center of
    /// mass sits at distance `d` is treated as a single point mass when
    /// `s / d < theta`; otherwise its children are visited. `theta = 0`
    /// therefore degenerates to the exact pairwise sum. The force between
    /// two point masses is `strength * mass_a * mass_b / d²`, directed from
    /// the region's center of mass toward the query point.
    pub fn calculate_force(
        &mut self,
        x: f64,
        y: f64,
        mass: f64,
        theta: f64,
        strength: f64,
    ) -> (f64, f64) {
        let mut fx = 0.0;
        let mut fy = 0.0;
        if self.cells.is_empty() {
            return (fx, fy);
        }

        self.stack.clear();
        self.stack.push(0);
        while let Some(idx) = self.stack.pop() {
            let cell = &self.cells[idx];
            if cell.mass <= 0.0 {
                continue;
            }

            let dx = x - cell.com_x;
            let dy = y - cell.com_y;
            let dist_sq = dx * dx + dy * dy;

            let s = cell.region.extent();
            let approximable = s * s < theta * theta * dist_sq;
            if cell.children.is_none() || approximable {
                if dist_sq < COINCIDENT_EPSILON {
                    continue;
                }
                let dist = dist_sq.sqrt();
                let floored = dist.max(MIN_DISTANCE);
                let force = strength * mass * cell.mass / (floored * floored);
                fx += force * dx / dist;
                fy += force * dy / dist;
                continue;
            }

            let first_child = cell.children.unwrap_or_default();
            self.stack.extend([
                first_child,
                first_child + 1,
                first_child + 2,
                first_child + 3,
            ]);
        }

        (fx, fy)
    }
}
