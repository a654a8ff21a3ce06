//! Procedural geometry.
//!
//! Everything here emits *unindexed* triangle lists: three unique vertices
//! per triangle, no shared vertices. That choice is load-bearing for the
//! barycentric edge markers — the (1,0,0)/(0,1,0)/(0,0,1) cycle indexed by
//! vertex position only lands on triangle corners when the stream is fully
//! expanded. Perturbation happens at grid-point level before expansion, so
//! corners shared by adjacent triangles move together and the surface stays
//! crack-free.

use glam::Vec3;
use rand::Rng;

/// Unindexed triangle-list geometry: positions plus per-vertex normals.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Per-vertex barycentric edge markers.
    ///
    /// Cycles (1,0,0), (0,1,0), (0,0,1) aligned to vertex index modulo 3 —
    /// one 3-vector per vertex, not per triangle. An edge-highlight fragment
    /// shader uses the interpolated value to measure distance to the nearest
    /// triangle edge without a separate wireframe pass. Empty input produces
    /// an empty marker set.
    pub fn barycentric_markers(vertex_count: usize) -> Vec<[f32; 3]> {
        const CYCLE: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        (0..vertex_count).map(|i| CYCLE[i % 3]).collect()
    }

    /// Regular tetrahedron centered at the origin, flat per-face normals.
    ///
    /// `radius` is the distance from the center to each corner.
    pub fn tetrahedron(radius: f32) -> Self {
        let r = radius / 3.0_f32.sqrt();
        let corners = [
            Vec3::new(r, r, r),
            Vec3::new(r, -r, -r),
            Vec3::new(-r, r, -r),
            Vec3::new(-r, -r, r),
        ];
        // Each face wound counter-clockwise seen from outside.
        let faces: [[usize; 3]; 4] = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];

        let mut geo = Geometry::default();
        for face in faces {
            let [a, b, c] = face.map(|i| corners[i]);
            let normal = (b - a).cross(c - a).normalize();
            geo.positions.extend([a, b, c]);
            geo.normals.extend([normal; 3]);
        }
        geo
    }
}

/// Planar grid in the XY plane, centered at the origin.
///
/// Grid points are held in indexed form so perturbation moves shared triangle
/// corners together; [`PlaneGrid::triangulate`] expands to the unindexed
/// stream the passes consume.
#[derive(Debug, Clone)]
pub struct PlaneGrid {
    segs_x: u32,
    segs_y: u32,
    points: Vec<Vec3>,
}

impl PlaneGrid {
    /// Builds a `width` x `height` grid with the given subdivision counts.
    ///
    /// Zero subdivisions yield a grid with no cells; triangulation then
    /// produces empty geometry rather than panicking.
    pub fn new(width: f32, height: f32, segs_x: u32, segs_y: u32) -> Self {
        let cols = segs_x + 1;
        let rows = segs_y + 1;
        let mut points = Vec::with_capacity((cols * rows) as usize);

        for row in 0..rows {
            for col in 0..cols {
                let fx = if segs_x == 0 { 0.5 } else { col as f32 / segs_x as f32 };
                let fy = if segs_y == 0 { 0.5 } else { row as f32 / segs_y as f32 };
                points.push(Vec3::new(
                    (fx - 0.5) * width,
                    (fy - 0.5) * height,
                    0.0,
                ));
            }
        }

        Self {
            segs_x,
            segs_y,
            points,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Adds uniform random noise in `[-amount, amount]` independently to every
    /// coordinate component of every grid point.
    pub fn perturb<R: Rng>(&mut self, rng: &mut R, amount: f32) {
        for p in &mut self.points {
            p.x += rng.gen_range(-amount..=amount);
            p.y += rng.gen_range(-amount..=amount);
            p.z += rng.gen_range(-amount..=amount);
        }
    }

    /// Expands the grid into an unindexed triangle list with smooth vertex
    /// normals recomputed from the (possibly perturbed) positions.
    ///
    /// Normals are accumulated per grid point with area weighting and
    /// renormalized, then carried onto every expanded corner, matching what
    /// a shared-vertex normal recomputation would produce.
    pub fn triangulate(&self) -> Geometry {
        if self.segs_x == 0 || self.segs_y == 0 {
            return Geometry::default();
        }

        let cols = self.segs_x + 1;
        let idx = |col: u32, row: u32| (row * cols + col) as usize;

        // Two triangles per cell.
        let mut triangles: Vec<[usize; 3]> =
            Vec::with_capacity((self.segs_x * self.segs_y * 2) as usize);
        for row in 0..self.segs_y {
            for col in 0..self.segs_x {
                let a = idx(col, row);
                let b = idx(col + 1, row);
                let c = idx(col + 1, row + 1);
                let d = idx(col, row + 1);
                triangles.push([a, b, d]);
                triangles.push([b, c, d]);
            }
        }

        // Area-weighted normal accumulation at grid points.
        let mut point_normals = vec![Vec3::ZERO; self.points.len()];
        for &[a, b, c] in &triangles {
            let face = (self.points[b] - self.points[a]).cross(self.points[c] - self.points[a]);
            point_normals[a] += face;
            point_normals[b] += face;
            point_normals[c] += face;
        }
        for n in &mut point_normals {
            *n = n.normalize_or_zero();
            if *n == Vec3::ZERO {
                *n = Vec3::Z;
            }
        }

        let mut geo = Geometry {
            positions: Vec::with_capacity(triangles.len() * 3),
            normals: Vec::with_capacity(triangles.len() * 3),
        };
        for tri in triangles {
            for i in tri {
                geo.positions.push(self.points[i]);
                geo.normals.push(point_normals[i]);
            }
        }
        geo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn barycentric_cycle_aligns_to_vertex_index() {
        let markers = Geometry::barycentric_markers(96);
        assert_eq!(markers.len(), 96);
        for (i, m) in markers.iter().enumerate() {
            let expected = match i % 3 {
                0 => [1.0, 0.0, 0.0],
                1 => [0.0, 1.0, 0.0],
                _ => [0.0, 0.0, 1.0],
            };
            assert_eq!(*m, expected, "marker {i}");
        }
    }

    #[test]
    fn barycentric_markers_empty_for_zero_vertices() {
        assert!(Geometry::barycentric_markers(0).is_empty());
    }

    #[test]
    fn plane_grid_vertex_counts() {
        let grid = PlaneGrid::new(15.0, 10.0, 4, 4);
        assert_eq!(grid.point_count(), 25);

        let geo = grid.triangulate();
        // 4x4 cells, two triangles each, three vertices per triangle.
        assert_eq!(geo.vertex_count(), 4 * 4 * 2 * 3);
        assert_eq!(geo.normals.len(), geo.positions.len());
        assert_eq!(geo.vertex_count() % 3, 0);
    }

    #[test]
    fn zero_subdivision_grid_triangulates_to_empty() {
        let geo = PlaneGrid::new(15.0, 10.0, 0, 0).triangulate();
        assert!(geo.is_empty());
        assert!(Geometry::barycentric_markers(geo.vertex_count()).is_empty());
    }

    #[test]
    fn unperturbed_plane_normals_point_along_z() {
        let geo = PlaneGrid::new(15.0, 10.0, 4, 4).triangulate();
        for n in &geo.normals {
            assert!((*n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn perturbed_normals_are_unit_length() {
        let mut grid = PlaneGrid::new(15.0, 10.0, 4, 4);
        let mut rng = StdRng::seed_from_u64(7);
        grid.perturb(&mut rng, 1.5);

        let geo = grid.triangulate();
        for n in &geo.normals {
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn perturbation_stays_within_bounds() {
        let reference = PlaneGrid::new(15.0, 10.0, 4, 4);
        let mut grid = reference.clone();
        let mut rng = StdRng::seed_from_u64(42);
        grid.perturb(&mut rng, 1.5);

        for (p, q) in grid.points.iter().zip(&reference.points) {
            let d = *p - *q;
            assert!(d.x.abs() <= 1.5 && d.y.abs() <= 1.5 && d.z.abs() <= 1.5);
        }
    }

    #[test]
    fn shared_corners_stay_shared_after_perturbation() {
        // Adjacent triangles expanded from the same grid point must carry
        // identical positions, or the surface would crack.
        let mut grid = PlaneGrid::new(15.0, 10.0, 2, 2);
        let mut rng = StdRng::seed_from_u64(3);
        grid.perturb(&mut rng, 1.5);
        let geo = grid.triangulate();

        // First cell: triangles [a,b,d] and [b,c,d] share b and d.
        assert_eq!(geo.positions[1], geo.positions[3]); // b
        assert_eq!(geo.positions[2], geo.positions[5]); // d
    }

    #[test]
    fn tetrahedron_has_twelve_outward_facing_vertices() {
        let geo = Geometry::tetrahedron(1.0);
        assert_eq!(geo.vertex_count(), 12);

        for tri in 0..4 {
            let a = geo.positions[tri * 3];
            let n = geo.normals[tri * 3];
            // Flat shading: all three corners share the face normal.
            assert_eq!(n, geo.normals[tri * 3 + 1]);
            assert_eq!(n, geo.normals[tri * 3 + 2]);
            // Outward: the normal points away from the centroid at the origin.
            assert!(n.dot(a) > 0.0);
        }
    }
}
