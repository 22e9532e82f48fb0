use super::AnalysisError;
use crate::core::models::cluster::Cluster;
use crate::core::utils::elements::{MassLookup, PeriodicTable};
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};
use tracing::debug;

impl Cluster {
    fn masses_with<M: MassLookup>(&self, masses: &M) -> Result<Vec<f64>, AnalysisError> {
        self.atoms()
            .map(|atom| {
                masses
                    .mass_of(atom.symbol)
                    .ok_or_else(|| AnalysisError::UnknownElement(atom.symbol.to_string()))
            })
            .collect()
    }

    /// Recomputes the cached center of mass using the built-in periodic table.
    pub fn compute_center_of_mass(&mut self) -> Result<Point3<f64>, AnalysisError> {
        self.compute_center_of_mass_with(&PeriodicTable)
    }

    /// Recomputes the cached center of mass, `Σ mᵢ rᵢ / Σ mᵢ`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownElement`] if `masses` has no entry for a species,
    /// and [`AnalysisError::DegenerateMass`] if the total mass is not positive (which
    /// includes the empty cluster and clusters made only of massless dummy sites).
    pub fn compute_center_of_mass_with<M: MassLookup>(
        &mut self,
        masses: &M,
    ) -> Result<Point3<f64>, AnalysisError> {
        let masses = self.masses_with(masses)?;
        let total: f64 = masses.iter().sum();
        if total.is_nan() || total <= 0.0 {
            return Err(AnalysisError::DegenerateMass { total });
        }

        let weighted = self
            .positions()
            .iter()
            .zip(&masses)
            .fold(Vector3::zeros(), |acc, (p, &m)| acc + p.coords * m);

        self.center_of_mass = Point3::from(weighted / total);
        Ok(self.center_of_mass)
    }

    pub fn compute_moment_of_inertia(&mut self) -> Result<Matrix3<f64>, AnalysisError> {
        self.compute_moment_of_inertia_with(&PeriodicTable)
    }

    /// Recomputes the cached inertia tensor about the coordinate origin.
    ///
    /// Recenter first (see [`recenter_on_center_of_mass`](Self::recenter_on_center_of_mass))
    /// to obtain the tensor about the center of mass.
    pub fn compute_moment_of_inertia_with<M: MassLookup>(
        &mut self,
        masses: &M,
    ) -> Result<Matrix3<f64>, AnalysisError> {
        let masses = self.masses_with(masses)?;

        let (mut ixx, mut iyy, mut izz) = (0.0, 0.0, 0.0);
        let (mut ixy, mut ixz, mut iyz) = (0.0, 0.0, 0.0);
        for (p, &m) in self.positions().iter().zip(&masses) {
            ixx += m * (p.y * p.y + p.z * p.z);
            iyy += m * (p.x * p.x + p.z * p.z);
            izz += m * (p.x * p.x + p.y * p.y);
            ixy -= m * p.x * p.y;
            ixz -= m * p.x * p.z;
            iyz -= m * p.y * p.z;
        }

        self.moment_of_inertia = Matrix3::new(
            ixx, ixy, ixz, //
            ixy, iyy, iyz, //
            ixz, iyz, izz,
        );
        Ok(self.moment_of_inertia)
    }

    /// Expresses every position in the basis whose vectors are the columns of `basis`:
    /// `new[j] = Σ_k old[k] * basis[(k, j)]`.
    ///
    /// The basis is used as given; it is not checked for orthonormality.
    pub fn rotate_to_basis(&mut self, basis: &Matrix3<f64>) {
        let transform = basis.transpose();
        for p in self.positions_mut() {
            *p = Point3::from(transform * p.coords);
        }
    }

    /// Translates every atom by minus the cached center of mass.
    ///
    /// The cache itself is left as is; call
    /// [`compute_center_of_mass`](Self::compute_center_of_mass) first if it may be stale.
    pub fn recenter_on_center_of_mass(&mut self) {
        let shift = self.center_of_mass.coords;
        for p in self.positions_mut() {
            *p -= shift;
        }
    }

    pub fn align_to_principal_axes(&mut self) -> Result<Vector3<f64>, AnalysisError> {
        self.align_to_principal_axes_with(&PeriodicTable)
    }

    /// Moves the center of mass to the origin and rotates the cluster so that its
    /// principal axes coincide with x, y, z in order of ascending principal moment.
    ///
    /// The rotation is always proper (determinant +1). On return the cached center of
    /// mass and inertia tensor describe the aligned cluster.
    ///
    /// # Return
    ///
    /// The principal moments, ascending.
    pub fn align_to_principal_axes_with<M: MassLookup>(
        &mut self,
        masses: &M,
    ) -> Result<Vector3<f64>, AnalysisError> {
        self.compute_center_of_mass_with(masses)?;
        self.recenter_on_center_of_mass();
        let tensor = self.compute_moment_of_inertia_with(masses)?;

        let eigen = SymmetricEigen::new(tensor);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

        let mut basis = Matrix3::from_columns(&[
            eigen.eigenvectors.column(order[0]).into_owned(),
            eigen.eigenvectors.column(order[1]).into_owned(),
            eigen.eigenvectors.column(order[2]).into_owned(),
        ]);
        if basis.determinant() < 0.0 {
            let flipped = -basis.column(2);
            basis.set_column(2, &flipped);
        }
        let moments = Vector3::new(
            eigen.eigenvalues[order[0]],
            eigen.eigenvalues[order[1]],
            eigen.eigenvalues[order[2]],
        );
        debug!(
            "Principal moments: {:.6} {:.6} {:.6}",
            moments.x, moments.y, moments.z
        );

        self.rotate_to_basis(&basis);
        self.compute_center_of_mass_with(masses)?;
        self.compute_moment_of_inertia_with(masses)?;
        Ok(moments)
    }
}
