use nalgebra::{Matrix3, Point3, Vector3};

/// Squared separation of two points under the minimum-image convention.
///
/// Along every axis flagged periodic the raw displacement `d` is folded back with
/// `d - round(d / L) * L`, so the result measures the distance to the nearest periodic
/// replica. Axes that are not periodic, or whose cell length is not positive, use the raw
/// displacement.
pub fn minimum_image_distance_squared(
    a: &Point3<f64>,
    b: &Point3<f64>,
    cell_dimensions: &[f64; 3],
    periodic: &[bool; 3],
) -> f64 {
    minimum_image_displacement(a, b, cell_dimensions, periodic).norm_squared()
}

/// Displacement `a - b` folded into the nearest periodic image.
pub fn minimum_image_displacement(
    a: &Point3<f64>,
    b: &Point3<f64>,
    cell_dimensions: &[f64; 3],
    periodic: &[bool; 3],
) -> Vector3<f64> {
    let mut d = a - b;
    for axis in 0..3 {
        let length = cell_dimensions[axis];
        if periodic[axis] && length > 0.0 {
            d[axis] -= (d[axis] / length).round() * length;
        }
    }
    d
}

/// Builds the lattice matrix (rows are the `a`, `b`, `c` cell vectors) from cell lengths
/// and angles in degrees, with `a` along x and `b` in the xy plane.
pub fn cell_matrix(dimensions: &[f64; 3], angles_degrees: &[f64; 3]) -> Matrix3<f64> {
    let [a, b, c] = *dimensions;
    let (cos_alpha, cos_beta) = (
        angles_degrees[0].to_radians().cos(),
        angles_degrees[1].to_radians().cos(),
    );
    let (sin_gamma, cos_gamma) = angles_degrees[2].to_radians().sin_cos();

    let cx = c * cos_beta;
    let cy = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
    let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();

    Matrix3::new(
        a,
        0.0,
        0.0,
        b * cos_gamma,
        b * sin_gamma,
        0.0,
        cx,
        cy,
        cz,
    )
}

pub fn fractional_to_cartesian(fractional: &Vector3<f64>, lattice: &Matrix3<f64>) -> Point3<f64> {
    Point3::from(lattice.transpose() * fractional)
}
