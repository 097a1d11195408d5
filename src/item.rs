//! A shape plus an affine placement (translation + rotation), with a lazily
//! computed, version-gated transform cache.

use std::cell::RefCell;
use std::f64::consts::TAU;

use crate::bin_shape::Bin;
use crate::geometry::{Bounds, GeometryProvider, Polygon};
use crate::units::Point;

#[derive(Clone)]
struct ItemCache {
    version: u64,
    transformed: Polygon,
    reference_vertex: Point,
    leftmost_bottom: Point,
    rightmost_top: Point,
    bbox: Bounds,
}

/// A polygon (immutable after construction) plus a mutable pose.
pub struct Item {
    id: usize,
    raw: Polygon,
    translation: Point,
    rotation: f64,
    pose_version: u64,
    area: f64,
    cache: RefCell<Option<ItemCache>>,
    bin_id: Option<usize>,
}

impl Clone for Item {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            raw: self.raw.clone(),
            translation: self.translation,
            rotation: self.rotation,
            pose_version: self.pose_version,
            area: self.area,
            cache: RefCell::new(self.cache.borrow().clone()),
            bin_id: self.bin_id,
        }
    }
}

impl Item {
    pub fn new(id: usize, polygon: Polygon, geo: &dyn GeometryProvider) -> Self {
        let area = geo.area(&polygon).abs();
        Self {
            id,
            raw: polygon,
            translation: Point::new(0, 0),
            rotation: 0.0,
            pose_version: 0,
            area,
            cache: RefCell::new(None),
            bin_id: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn raw_shape(&self) -> &Polygon {
        &self.raw
    }

    pub fn translation(&self) -> Point {
        self.translation
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    fn invalidate(&mut self) {
        self.pose_version += 1;
    }

    pub fn translate(&mut self, delta: Point) {
        self.translation = self.translation + delta;
        self.invalidate();
    }

    pub fn rotate(&mut self, radians: f64) {
        self.rotation = normalize_angle(self.rotation + radians);
        self.invalidate();
    }

    pub fn set_pose(&mut self, translation: Point, rotation: f64) {
        self.translation = translation;
        self.rotation = normalize_angle(rotation);
        self.invalidate();
    }

    /// Replace the raw shape in place (used by distance-margin offsetting),
    /// recomputing the pose-invariant area and invalidating the transform
    /// cache. The pose itself is left untouched.
    pub fn set_raw_shape(&mut self, polygon: Polygon, geo: &dyn GeometryProvider) {
        self.area = geo.area(&polygon).abs();
        self.raw = polygon;
        self.invalidate();
    }

    pub fn bin_id(&self) -> Option<usize> {
        self.bin_id
    }

    pub fn set_bin_id(&mut self, bin_id: Option<usize>) {
        self.bin_id = bin_id;
    }

    /// Pose-invariant area, precomputed at construction.
    pub fn area(&self) -> f64 {
        self.area
    }

    fn ensure_cache(&self, geo: &dyn GeometryProvider) {
        let needs_recompute = match &*self.cache.borrow() {
            Some(c) => c.version != self.pose_version,
            None => true,
        };
        if !needs_recompute {
            return;
        }

        let mut transformed = self.raw.clone();
        geo.rotate(&mut transformed, self.rotation);
        geo.translate(&mut transformed, self.translation);

        let bbox = geo
            .bounding_box(&transformed)
            .expect("item polygon must have at least 3 vertices");

        let reference_vertex = *transformed
            .contour
            .iter()
            .max_by_key(|p| p.y_then_x())
            .expect("non-empty contour");
        let leftmost_bottom = *transformed
            .contour
            .iter()
            .min_by_key(|p| p.y_then_x())
            .expect("non-empty contour");
        let rightmost_top = reference_vertex;

        *self.cache.borrow_mut() = Some(ItemCache {
            version: self.pose_version,
            transformed,
            reference_vertex,
            leftmost_bottom,
            rightmost_top,
            bbox,
        });
    }

    pub fn transformed_shape(&self, geo: &dyn GeometryProvider) -> Polygon {
        self.ensure_cache(geo);
        self.cache.borrow().as_ref().unwrap().transformed.clone()
    }

    /// Rightmost-topmost vertex of the transformed shape — the handle used
    /// to drag the item along an NFP boundary.
    pub fn reference_vertex(&self, geo: &dyn GeometryProvider) -> Point {
        self.ensure_cache(geo);
        self.cache.borrow().as_ref().unwrap().reference_vertex
    }

    pub fn leftmost_bottom(&self, geo: &dyn GeometryProvider) -> Point {
        self.ensure_cache(geo);
        self.cache.borrow().as_ref().unwrap().leftmost_bottom
    }

    pub fn rightmost_top(&self, geo: &dyn GeometryProvider) -> Point {
        self.ensure_cache(geo);
        self.cache.borrow().as_ref().unwrap().rightmost_top
    }

    pub fn bounding_box(&self, geo: &dyn GeometryProvider) -> Bounds {
        self.ensure_cache(geo);
        self.cache.borrow().as_ref().unwrap().bbox
    }

    pub fn is_inside(&self, geo: &dyn GeometryProvider, bin: &Bin) -> bool {
        let shape = self.transformed_shape(geo);
        bin.contains(geo, &shape)
    }
}

fn normalize_angle(angle: f64) -> f64 {
    let a = angle % TAU;
    if a < 0.0 { a + TAU } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoProvider;

    fn square() -> Polygon {
        Polygon::new(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
            Point::new(0, 0),
        ])
    }

    #[test]
    fn translate_moves_transformed_shape() {
        let geo = GeoProvider;
        let mut item = Item::new(0, square(), &geo);
        item.translate(Point::new(5, 5));
        let shape = item.transformed_shape(&geo);
        assert_eq!(shape.contour[0], Point::new(5, 5));
    }

    #[test]
    fn cache_invalidates_on_pose_change() {
        let geo = GeoProvider;
        let mut item = Item::new(0, square(), &geo);
        let first = item.transformed_shape(&geo);
        item.translate(Point::new(1, 1));
        let second = item.transformed_shape(&geo);
        assert_ne!(first.contour[0], second.contour[0]);
    }

    #[test]
    fn reference_vertex_is_rightmost_top() {
        let geo = GeoProvider;
        let item = Item::new(0, square(), &geo);
        assert_eq!(item.reference_vertex(&geo), Point::new(10, 10));
        assert_eq!(item.leftmost_bottom(&geo), Point::new(0, 0));
    }

    #[test]
    fn area_is_pose_invariant() {
        let geo = GeoProvider;
        let mut item = Item::new(0, square(), &geo);
        let area_before = item.area();
        item.translate(Point::new(100, -50));
        item.rotate(1.2);
        assert_eq!(item.area(), area_before);
    }

    #[test]
    fn normalizes_rotation_modulo_tau() {
        let geo = GeoProvider;
        let mut item = Item::new(0, square(), &geo);
        item.rotate(TAU + 0.1);
        assert!((item.rotation() - 0.1).abs() < 1e-9);
    }
}
