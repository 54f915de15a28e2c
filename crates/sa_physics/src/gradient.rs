// crates/sa_physics/src/gradient.rs

//! Green-Gauss 梯度计算
//!
//! 使用 Green 定理将体积分转化为面积分:
//! ∇φ ≈ (1/V) ∮ φ·n dS
//!
//! 对于离散网格:
//! ∇φ_i ≈ (1/A_i) Σ_f φ_f · n_f · L_f
//!
//! 内部面取算术平均插值，边界面直接使用场的边界面值。
//! 单元数超过阈值时使用 rayon 并行逐单元计算。

use crate::field::{ScalarField, VectorField};
use crate::mesh::FvMesh;
use glam::DVec2;
use rayon::prelude::*;
use sa_foundation::Scalar;

/// 速度梯度张量
///
/// # 2D 分量
///
/// ```text
/// ∇U = [∂u/∂x  ∂u/∂y]
///      [∂v/∂x  ∂v/∂y]
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityGradient {
    /// ∂u/∂x
    pub du_dx: Scalar,
    /// ∂u/∂y
    pub du_dy: Scalar,
    /// ∂v/∂x
    pub dv_dx: Scalar,
    /// ∂v/∂y
    pub dv_dy: Scalar,
}

impl VelocityGradient {
    /// 创建新的速度梯度
    #[inline]
    pub fn new(du_dx: Scalar, du_dy: Scalar, dv_dx: Scalar, dv_dy: Scalar) -> Self {
        Self { du_dx, du_dy, dv_dx, dv_dy }
    }

    /// 涡度（z 分量）
    ///
    /// ω_z = ∂v/∂x - ∂u/∂y
    #[inline]
    pub fn vorticity(&self) -> Scalar {
        self.dv_dx - self.du_dy
    }

    /// 应变率张量的模
    ///
    /// |S| = √(2(∂u/∂x)² + 2(∂v/∂y)² + (∂u/∂y + ∂v/∂x)²)
    #[inline]
    pub fn strain_rate_magnitude(&self) -> Scalar {
        let s11 = self.du_dx;
        let s22 = self.dv_dy;
        let s12 = 0.5 * (self.du_dy + self.dv_dx);
        (2.0 * s11 * s11 + 2.0 * s22 * s22 + 4.0 * s12 * s12).sqrt()
    }

    /// 涡量模 √2·|skew(∇U)|
    ///
    /// 二维时 skew(∇U) 只有一个独立分量，化简为 |∂v/∂x - ∂u/∂y|。
    #[inline]
    pub fn rotation_rate_magnitude(&self) -> Scalar {
        self.vorticity().abs()
    }

    /// 梯度是否有效（全部有限）
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.du_dx.is_finite()
            && self.du_dy.is_finite()
            && self.dv_dx.is_finite()
            && self.dv_dy.is_finite()
    }
}

/// Green-Gauss 梯度计算器
#[derive(Debug, Clone)]
pub struct GreenGauss {
    /// 并行阈值（单元数）
    pub parallel_threshold: usize,
}

impl Default for GreenGauss {
    fn default() -> Self {
        Self { parallel_threshold: 1024 }
    }
}

impl GreenGauss {
    /// 创建新实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 计算单个单元的标量梯度
    fn cell_scalar_gradient(mesh: &FvMesh, field: &ScalarField, cell: usize) -> DVec2 {
        let area = mesh.cell_area_unchecked(cell);
        if area < 1e-14 {
            return DVec2::ZERO;
        }

        let phi_c = field.cells()[cell];
        let mut grad = DVec2::ZERO;

        for face in mesh.cell_faces(cell) {
            let owner = mesh.face_owner(face);
            // owner 侧法向指向外侧，neighbor 取相反号
            let sign = if owner == cell { 1.0 } else { -1.0 };
            let ds = mesh.face_normal(face) * mesh.face_length(face) * sign;

            let phi_face = match mesh.face_neighbor(face) {
                Some(neigh) => {
                    let other = if owner == cell { neigh } else { owner };
                    0.5 * (phi_c + field.cells()[other])
                }
                None => field.boundary()[mesh.boundary_index(face)],
            };

            grad += ds * phi_face;
        }

        grad / area
    }

    /// 计算单个单元的速度梯度张量
    fn cell_velocity_gradient(mesh: &FvMesh, u: &VectorField, cell: usize) -> VelocityGradient {
        let area = mesh.cell_area_unchecked(cell);
        if area < 1e-14 {
            return VelocityGradient::default();
        }

        let u_c = u.cells()[cell];
        let mut grad_u = DVec2::ZERO;
        let mut grad_v = DVec2::ZERO;

        for face in mesh.cell_faces(cell) {
            let owner = mesh.face_owner(face);
            let sign = if owner == cell { 1.0 } else { -1.0 };
            let ds = mesh.face_normal(face) * mesh.face_length(face) * sign;

            let u_face = match mesh.face_neighbor(face) {
                Some(neigh) => {
                    let other = if owner == cell { neigh } else { owner };
                    0.5 * (u_c + u.cells()[other])
                }
                None => u.boundary()[mesh.boundary_index(face)],
            };

            grad_u += ds * u_face.x;
            grad_v += ds * u_face.y;
        }

        grad_u /= area;
        grad_v /= area;

        VelocityGradient::new(grad_u.x, grad_u.y, grad_v.x, grad_v.y)
    }

    /// 计算标量场的单元梯度
    pub fn scalar_gradient(&self, mesh: &FvMesh, field: &ScalarField) -> Vec<DVec2> {
        if mesh.n_cells() >= self.parallel_threshold {
            (0..mesh.n_cells())
                .into_par_iter()
                .map(|c| Self::cell_scalar_gradient(mesh, field, c))
                .collect()
        } else {
            (0..mesh.n_cells())
                .map(|c| Self::cell_scalar_gradient(mesh, field, c))
                .collect()
        }
    }

    /// 计算速度场的单元梯度张量
    pub fn velocity_gradient(&self, mesh: &FvMesh, u: &VectorField) -> Vec<VelocityGradient> {
        if mesh.n_cells() >= self.parallel_threshold {
            (0..mesh.n_cells())
                .into_par_iter()
                .map(|c| Self::cell_velocity_gradient(mesh, u, c))
                .collect()
        } else {
            (0..mesh.n_cells())
                .map(|c| Self::cell_velocity_gradient(mesh, u, c))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_gradient_vorticity() {
        let grad = VelocityGradient::new(0.0, 1.0, -1.0, 0.0);
        // ω = -1 - 1 = -2
        assert!((grad.vorticity() - (-2.0)).abs() < 1e-10);
        assert!((grad.rotation_rate_magnitude() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_velocity_gradient_strain_rate() {
        // 纯剪切流: u = y, v = 0
        let grad = VelocityGradient::new(0.0, 1.0, 0.0, 0.0);
        // |S| = √(4 * 0.25) = 1.0
        assert!((grad.strain_rate_magnitude() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_velocity_gradient_validity() {
        assert!(VelocityGradient::new(1.0, 2.0, 3.0, 4.0).is_valid());
        assert!(!VelocityGradient::new(Scalar::NAN, 0.0, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_linear_scalar_gradient() {
        // φ = x，内部单元梯度应为 (1, 0)
        let mesh = FvMesh::rect(5, 3, 1.0, 1.0);
        let mut field = ScalarField::zeros(&mesh);
        for c in mesh.cells() {
            field.cells_mut()[c] = mesh.cell_center(c).x;
        }
        // 边界值用精确线性分布，避免边界外推误差
        for f in mesh.boundary_faces() {
            let b = mesh.boundary_index(f);
            field.boundary_mut()[b] = mesh.face_center(f).x;
        }

        let gg = GreenGauss::new();
        let grads = gg.scalar_gradient(&mesh, &field);

        // 内部单元 (2,1) = 2 + 1*5 = 7
        assert!((grads[7].x - 1.0).abs() < 1e-10);
        assert!(grads[7].y.abs() < 1e-10);
    }

    #[test]
    fn test_shear_velocity_gradient() {
        // u = (y, 0)，du/dy = 1，涡度 = -1
        let mesh = FvMesh::rect(4, 4, 1.0, 1.0);
        let mut u = VectorField::zeros(&mesh);
        for c in mesh.cells() {
            u.cells_mut()[c] = DVec2::new(mesh.cell_center(c).y, 0.0);
        }
        // 边界用精确分布
        for f in mesh.boundary_faces() {
            let b = mesh.boundary_index(f);
            u.set_bc(b, crate::field::VectorBc::FixedValue(DVec2::new(mesh.face_center(f).y, 0.0)));
        }
        u.correct_boundary_conditions(&mesh);

        let gg = GreenGauss::new();
        let grads = gg.velocity_gradient(&mesh, &u);

        // 内部单元 (1,1) = 5
        assert!((grads[5].du_dy - 1.0).abs() < 1e-10);
        assert!(grads[5].du_dx.abs() < 1e-10);
        assert!((grads[5].rotation_rate_magnitude() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_uniform_field_zero_gradient() {
        let mesh = FvMesh::rect(3, 3, 0.5, 0.5);
        let mut field = ScalarField::uniform(&mesh, 4.2);
        field.correct_boundary_conditions(&mesh);

        let gg = GreenGauss::new();
        let grads = gg.scalar_gradient(&mesh, &field);
        for g in grads {
            assert!(g.length() < 1e-12);
        }
    }
}
