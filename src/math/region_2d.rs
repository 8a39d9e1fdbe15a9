//! Planar region algebra.
//!
//! A [`Region2`] is a set of disjoint shapes in a plane's UV frame, each an
//! outer contour with optional holes. Boolean operations run through
//! `i_overlay`; results are always normalized (outer contours
//! counter-clockwise, holes clockwise, no self-overlap).

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;

use super::polygon_2d::{bounds, distance_to_loop, signed_area, winding_number};
use super::Point2;

type Path = Vec<[f64; 2]>;

/// How overlapping input loops combine when a region is built from raw loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopFill {
    /// A point is inside if it is enclosed by an odd number of loops.
    EvenOdd,
    /// A point is inside if the loops' winding number around it is non-zero.
    NonZero,
}

impl From<LoopFill> for FillRule {
    fn from(fill: LoopFill) -> Self {
        match fill {
            LoopFill::EvenOdd => FillRule::EvenOdd,
            LoopFill::NonZero => FillRule::NonZero,
        }
    }
}

/// One connected piece of a region: an outer contour and its holes.
#[derive(Debug, Clone)]
pub struct Shape2 {
    outer: Vec<Point2>,
    holes: Vec<Vec<Point2>>,
}

impl Shape2 {
    /// The outer contour.
    #[must_use]
    pub fn outer(&self) -> &[Point2] {
        &self.outer
    }

    /// Hole contours.
    #[must_use]
    pub fn holes(&self) -> &[Vec<Point2>] {
        &self.holes
    }

    /// Enclosed area (outer minus holes).
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        signed_area(&self.outer).abs() - holes
    }

    /// Bounding rectangle of the outer contour.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point2, Point2)> {
        bounds(&self.outer)
    }

    /// Whether `point` lies inside the shape and further than `margin` from every contour.
    #[must_use]
    pub fn contains_strictly(&self, point: &Point2, margin: f64) -> bool {
        if winding_number(point, &self.outer) == 0 {
            return false;
        }
        if self.holes.iter().any(|h| winding_number(point, h) != 0) {
            return false;
        }
        if distance_to_loop(point, &self.outer) <= margin {
            return false;
        }
        self.holes.iter().all(|h| distance_to_loop(point, h) > margin)
    }

    /// The shape as a standalone region.
    #[must_use]
    pub fn to_region(&self) -> Region2 {
        Region2 {
            shapes: vec![self.clone()],
        }
    }

    fn to_paths(&self) -> Vec<Path> {
        std::iter::once(&self.outer)
            .chain(&self.holes)
            .map(|c| to_path(c))
            .collect()
    }
}

/// A planar region made of zero or more disjoint shapes.
#[derive(Debug, Clone, Default)]
pub struct Region2 {
    shapes: Vec<Shape2>,
}

impl Region2 {
    /// The empty region.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a normalized region from raw closed loops.
    ///
    /// Loops with fewer than three points are ignored.
    #[must_use]
    pub fn from_loops(loops: &[Vec<Point2>], fill: LoopFill) -> Self {
        let subject: Vec<Path> = loops
            .iter()
            .filter(|l| l.len() >= 3)
            .map(|l| to_path(l))
            .collect();
        if subject.is_empty() {
            return Self::empty();
        }
        let clip: Vec<Path> = Vec::new();
        let shapes = subject.overlay(&clip, OverlayRule::Union, fill.into());
        Self::from_shapes(shapes)
    }

    /// Connected pieces of the region.
    #[must_use]
    pub fn shapes(&self) -> &[Shape2] {
        &self.shapes
    }

    /// Whether the region has no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Total enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.shapes.iter().map(Shape2::area).sum()
    }

    /// Boolean union.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.boolean(other, OverlayRule::Union)
    }

    /// Boolean difference `self − other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.boolean(other, OverlayRule::Difference)
    }

    /// Boolean intersection.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.boolean(other, OverlayRule::Intersect)
    }

    fn boolean(&self, other: &Self, rule: OverlayRule) -> Self {
        let subject = self.to_paths();
        let clip = other.to_paths();
        if subject.is_empty() && clip.is_empty() {
            return Self::empty();
        }
        // Both operands are normalized, so even-odd and non-zero agree.
        let shapes = subject.overlay(&clip, rule, FillRule::EvenOdd);
        Self::from_shapes(shapes)
    }

    fn to_paths(&self) -> Vec<Path> {
        self.shapes.iter().flat_map(Shape2::to_paths).collect()
    }

    fn from_shapes(shapes: Vec<Vec<Path>>) -> Self {
        let shapes = shapes
            .into_iter()
            .filter_map(|shape| {
                let mut contours = shape.into_iter().map(|c| from_path(&c));
                let outer = contours.next()?;
                if outer.len() < 3 {
                    return None;
                }
                let holes = contours.filter(|h| h.len() >= 3).collect();
                Some(Shape2 { outer, holes })
            })
            .collect();
        Self { shapes }
    }
}

fn to_path(contour: &[Point2]) -> Path {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn from_path(path: &[[f64; 2]]) -> Vec<Point2> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn from_loops_normalizes_clockwise_input() {
        let mut cw = rect(0.0, 0.0, 2.0, 1.0);
        cw.reverse();
        let region = Region2::from_loops(&[cw], LoopFill::EvenOdd);
        assert_eq!(region.shapes().len(), 1);
        assert_relative_eq!(region.area(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn even_odd_nested_loops_make_a_hole() {
        let region = Region2::from_loops(
            &[rect(0.0, 0.0, 4.0, 4.0), rect(1.0, 1.0, 3.0, 3.0)],
            LoopFill::EvenOdd,
        );
        assert_eq!(region.shapes().len(), 1);
        assert_eq!(region.shapes()[0].holes().len(), 1);
        assert_relative_eq!(region.area(), 12.0, epsilon = 1e-6);
    }

    #[test]
    fn non_zero_overlapping_loops_union() {
        let region = Region2::from_loops(
            &[rect(0.0, 0.0, 2.0, 1.0), rect(1.0, 0.0, 3.0, 1.0)],
            LoopFill::NonZero,
        );
        assert_eq!(region.shapes().len(), 1);
        assert_relative_eq!(region.area(), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn difference_and_intersection() {
        let a = Region2::from_loops(&[rect(0.0, 0.0, 2.0, 2.0)], LoopFill::EvenOdd);
        let b = Region2::from_loops(&[rect(1.0, 0.0, 3.0, 2.0)], LoopFill::EvenOdd);
        assert_relative_eq!(a.difference(&b).area(), 2.0, epsilon = 1e-6);
        assert_relative_eq!(a.intersection(&b).area(), 2.0, epsilon = 1e-6);
        assert_relative_eq!(a.union(&b).area(), 6.0, epsilon = 1e-6);
    }

    #[test]
    fn touching_rectangles_do_not_intersect() {
        let a = Region2::from_loops(&[rect(0.0, 0.0, 1.0, 1.0)], LoopFill::EvenOdd);
        let b = Region2::from_loops(&[rect(1.0, 0.0, 2.0, 1.0)], LoopFill::EvenOdd);
        assert!(a.intersection(&b).area() < 1e-6);
    }

    #[test]
    fn difference_splits_into_disjoint_shapes() {
        let a = Region2::from_loops(&[rect(0.0, 0.0, 3.0, 1.0)], LoopFill::EvenOdd);
        let b = Region2::from_loops(&[rect(1.0, -1.0, 2.0, 2.0)], LoopFill::EvenOdd);
        assert_eq!(a.difference(&b).shapes().len(), 2);
    }

    #[test]
    fn strict_containment_respects_margin_and_holes() {
        let region = Region2::from_loops(
            &[rect(0.0, 0.0, 4.0, 4.0), rect(1.0, 1.0, 3.0, 3.0)],
            LoopFill::EvenOdd,
        );
        let shape = &region.shapes()[0];
        assert!(shape.contains_strictly(&Point2::new(0.5, 2.0), 0.1));
        assert!(!shape.contains_strictly(&Point2::new(0.05, 2.0), 0.1));
        assert!(!shape.contains_strictly(&Point2::new(2.0, 2.0), 0.1));
        assert!(!shape.contains_strictly(&Point2::new(5.0, 2.0), 0.1));
    }
}
