//! Eye-line geometry: least-squares line fitting and eye-center estimation.

/// A 2D point in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// The four canonical eye-corner points, in image pixel space.
///
/// "Right" is the subject's right eye, which sits at the smaller x in an
/// unmirrored image.
#[derive(Debug, Clone, Copy)]
pub struct EyeCorners {
    pub right_outer: Point,
    pub right_inner: Point,
    pub left_inner: Point,
    pub left_outer: Point,
}

impl EyeCorners {
    pub fn points(&self) -> [Point; 4] {
        [
            self.right_outer,
            self.right_inner,
            self.left_inner,
            self.left_outer,
        ]
    }
}

/// Best-fit line y = k*x + b.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub k: f32,
    pub b: f32,
}

impl Line {
    pub fn y_at(&self, x: f32) -> f32 {
        self.k * x + self.b
    }
}

/// Stabilizer added to the normal-equations denominator so a vertical
/// point set yields a large but finite slope instead of dividing by zero.
const DENOM_EPSILON: f64 = 1e-6;

/// Least-squares fit of y = k*x + b through `points`, minimizing squared
/// vertical residuals. Always returns a value for n >= 2 points.
pub fn fit_line(points: &[Point]) -> Line {
    let n = points.len() as f64;
    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for p in points {
        let (x, y) = (p.x as f64, p.y as f64);
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
    }
    let k = (n * sxy - sx * sy) / (n * sxx - sx * sx + DENOM_EPSILON);
    let b = (sy - k * sx) / n;
    Line {
        k: k as f32,
        b: b as f32,
    }
}

/// Left and right eye centers, both lying on the shared fitted eye line.
#[derive(Debug, Clone, Copy)]
pub struct EyeCenters {
    pub right: Point,
    pub left: Point,
}

impl EyeCenters {
    /// Euclidean inter-eye distance.
    pub fn distance(&self) -> f32 {
        self.right.distance(&self.left)
    }

    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.right.x + self.left.x) / 2.0,
            (self.right.y + self.left.y) / 2.0,
        )
    }
}

/// Estimate the eye centers from the four corners.
///
/// A single line is fitted through all four corners so both centers share
/// one head-tilt estimate; per eye, x is the midpoint of that eye's corner
/// x-coordinates and y is the line evaluated there. Centers land on whole
/// pixels.
pub fn eye_centers(corners: &EyeCorners) -> EyeCenters {
    let line = fit_line(&corners.points());
    let right_x = (corners.right_outer.x + corners.right_inner.x) / 2.0;
    let left_x = (corners.left_inner.x + corners.left_outer.x) / 2.0;
    EyeCenters {
        right: Point::new(right_x.round(), line.y_at(right_x).round()),
        left: Point::new(left_x.round(), line.y_at(left_x).round()),
    }
}
