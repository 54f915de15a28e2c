// crates/sa_physics/src/equation.rs

//! 标量输运方程组装
//!
//! 面寻址的隐式标量输运方程：对角系数按单元存储，非对角系数按
//! 内部面存储（owner 行/列各一个），源项按单元存储。组装完成后
//! 转为 CSR 交给 BiCGStab 求解。
//!
//! # 算子约定
//!
//! 方程写成 A·x = b。时间导数、对流、扩散组装进 A 与 b；
//! 显式源加到 b；隐式汇通过 [`add_implicit_sink`](ScalarTransportEqn::add_implicit_sink)
//! 加到对角——破坏项必须走隐式路径，显式处理会让被输运量数值爆破。
//!
//! # 松弛
//!
//! [`relax`](ScalarTransportEqn::relax) 实现对角占优保证 + 欠松弛：
//!
//! ```text
//! aP ← max(|aP|, Σ|a_nb|) / α
//! b  ← b + (aP_new - aP_old) · x_ref
//! ```
//!
//! 收敛后的不动点不受松弛因子影响。

use crate::error::{PhysicsError, PhysicsResult};
use crate::field::{ScalarBc, ScalarField};
use crate::linalg::{BiCgStab, CsrBuilder, JacobiPreconditioner, SolverControls, SolverReport};
use crate::mesh::FvMesh;
use sa_foundation::scalar::consts::SMALL;
use sa_foundation::Scalar;

/// 面插值方法（扩散系数）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FaceInterpolation {
    /// 算术平均
    #[default]
    Arithmetic,
    /// 调和平均（系数跨面跳变大时更稳健）
    Harmonic,
}

#[inline]
fn harmonic_mean(a: Scalar, b: Scalar) -> Scalar {
    if a.abs() < 1e-14 || b.abs() < 1e-14 {
        0.0
    } else {
        2.0 * a * b / (a + b)
    }
}

/// 隐式标量输运方程
///
/// 创建时对被求解场做快照：单元值作为旧时间层值与松弛参考，
/// 边界值供对流入流与固定值扩散边界使用。
pub struct ScalarTransportEqn<'m> {
    mesh: &'m FvMesh,
    name: &'static str,
    diag: Vec<Scalar>,
    /// A[owner][neighbor]，按内部面索引
    upper: Vec<Scalar>,
    /// A[neighbor][owner]，按内部面索引
    lower: Vec<Scalar>,
    source: Vec<Scalar>,
    x_ref: Vec<Scalar>,
    boundary_ref: Vec<Scalar>,
    bcs: Vec<ScalarBc>,
}

impl<'m> ScalarTransportEqn<'m> {
    /// 为指定场创建空方程
    pub fn new(mesh: &'m FvMesh, field: &ScalarField, name: &'static str) -> Self {
        let n_bnd = mesh.n_boundary_faces();
        let mut bcs = Vec::with_capacity(n_bnd);
        for b in 0..n_bnd {
            bcs.push(field.bc(b));
        }

        Self {
            mesh,
            name,
            diag: vec![0.0; mesh.n_cells()],
            upper: vec![0.0; mesh.n_interior_faces()],
            lower: vec![0.0; mesh.n_interior_faces()],
            source: vec![0.0; mesh.n_cells()],
            x_ref: field.cells().to_vec(),
            boundary_ref: field.boundary().to_vec(),
            bcs,
        }
    }

    /// 对角系数（测试 / 约束钩子用）
    #[inline]
    pub fn diag(&self) -> &[Scalar] {
        &self.diag
    }

    /// 源项（测试 / 约束钩子用）
    #[inline]
    pub fn source(&self) -> &[Scalar] {
        &self.source
    }

    /// 创建方程时的场快照
    #[inline]
    pub fn x_ref(&self) -> &[Scalar] {
        &self.x_ref
    }

    // =========================================================================
    // 离散算子
    // =========================================================================

    /// 隐式 Euler 时间导数 d/dt(α·ρ·x)
    ///
    /// 旧时间层值取创建方程时的场快照。
    pub fn ddt(&mut self, alpha: &ScalarField, rho: &ScalarField, dt: Scalar) {
        debug_assert!(dt > 0.0, "时间步长必须为正");
        for c in self.mesh.cells() {
            let a = alpha.cells()[c] * rho.cells()[c] * self.mesh.cell_area_unchecked(c) / dt;
            self.diag[c] += a;
            self.source[c] += a * self.x_ref[c];
        }
    }

    /// 一阶迎风隐式对流 div(φ·x)
    ///
    /// `face_flux` 为面质量通量（owner→neighbor 为正），长度 = 面数。
    /// 边界入流通过场的边界面值进入源项。
    pub fn div(&mut self, face_flux: &[Scalar]) {
        debug_assert_eq!(face_flux.len(), self.mesh.n_faces());

        for f in self.mesh.interior_faces() {
            let flux = face_flux[f];
            let owner = self.mesh.face_owner(f);
            let neigh = self.mesh.face_neighbor(f).expect("内部面必有 neighbor");

            // owner 行：F>0 取 x_P，F<0 取 x_N
            self.diag[owner] += flux.max(0.0);
            self.upper[f] += flux.min(0.0);
            // neighbor 行：通量取 -F
            self.diag[neigh] += (-flux).max(0.0);
            self.lower[f] += (-flux).min(0.0);
        }

        for f in self.mesh.boundary_faces() {
            let flux = face_flux[f];
            let owner = self.mesh.face_owner(f);
            if flux >= 0.0 {
                // 出流：一阶外推 x_face = x_P
                self.diag[owner] += flux;
            } else {
                // 入流：使用边界面值
                self.source[owner] -= flux * self.boundary_ref[self.mesh.boundary_index(f)];
            }
        }
    }

    /// 隐式扩散 -∇·(Γ∇x)
    ///
    /// 两点通量近似。固定值边界进入对角与源项，零梯度边界无贡献。
    pub fn laplacian(&mut self, gamma: &ScalarField, interp: FaceInterpolation) {
        for f in self.mesh.interior_faces() {
            let owner = self.mesh.face_owner(f);
            let neigh = self.mesh.face_neighbor(f).expect("内部面必有 neighbor");

            let g_face = match interp {
                FaceInterpolation::Arithmetic => {
                    0.5 * (gamma.cells()[owner] + gamma.cells()[neigh])
                }
                FaceInterpolation::Harmonic => {
                    harmonic_mean(gamma.cells()[owner], gamma.cells()[neigh])
                }
            };

            let dist = self.mesh.face_dist(f).max(SMALL);
            let d = g_face * self.mesh.face_length(f) / dist;

            self.diag[owner] += d;
            self.upper[f] -= d;
            self.diag[neigh] += d;
            self.lower[f] -= d;
        }

        for f in self.mesh.boundary_faces() {
            let b = self.mesh.boundary_index(f);
            if let ScalarBc::FixedValue(_) = self.bcs[b] {
                let owner = self.mesh.face_owner(f);
                let dist = self.mesh.face_dist(f).max(SMALL);
                let d = gamma.boundary()[b] * self.mesh.face_length(f) / dist;
                self.diag[owner] += d;
                self.source[owner] += d * self.boundary_ref[b];
            }
        }
    }

    /// 显式源（逐单元率，体积积分后加到右端）
    pub fn add_source(&mut self, rate: &[Scalar]) {
        debug_assert_eq!(rate.len(), self.mesh.n_cells());
        for c in self.mesh.cells() {
            self.source[c] += rate[c] * self.mesh.cell_area_unchecked(c);
        }
    }

    /// 隐式线性化汇（对角贡献）
    ///
    /// 汇项 -coeff·x 以隐式形式进入方程：对角 += coeff·V。
    /// `coeff >= 0` 时增强对角占优；这是破坏项的唯一合法入口。
    pub fn add_implicit_sink(&mut self, coeff: &[Scalar]) {
        debug_assert_eq!(coeff.len(), self.mesh.n_cells());
        for c in self.mesh.cells() {
            self.diag[c] += coeff[c] * self.mesh.cell_area_unchecked(c);
        }
    }

    /// 将某单元约束为固定值（大系数法）
    ///
    /// 供外部约束钩子使用。
    pub fn pin_value(&mut self, cell: usize, value: Scalar) {
        let mut row_mag = self.diag[cell].abs();
        for f in self.mesh.interior_faces() {
            if self.mesh.face_owner(f) == cell {
                row_mag += self.upper[f].abs();
            } else if self.mesh.face_neighbor(f) == Some(cell) {
                row_mag += self.lower[f].abs();
            }
        }
        let big = row_mag.max(SMALL) * 1e12;
        self.diag[cell] += big;
        self.source[cell] += big * value;
    }

    // =========================================================================
    // 松弛与求解
    // =========================================================================

    /// 欠松弛（含对角占优保证）
    ///
    /// # Panics
    /// - `factor` 不在 (0, 1] 内
    pub fn relax(&mut self, factor: Scalar) {
        assert!(factor > 0.0 && factor <= 1.0, "松弛因子必须在 (0, 1] 内");

        let mut sum_off = vec![0.0; self.mesh.n_cells()];
        for f in self.mesh.interior_faces() {
            let owner = self.mesh.face_owner(f);
            let neigh = self.mesh.face_neighbor(f).expect("内部面必有 neighbor");
            sum_off[owner] += self.upper[f].abs();
            sum_off[neigh] += self.lower[f].abs();
        }

        for c in self.mesh.cells() {
            let d0 = self.diag[c];
            let d1 = d0.abs().max(sum_off[c]) / factor;
            self.source[c] += (d1 - d0) * self.x_ref[c];
            self.diag[c] = d1;
        }
    }

    /// 组装 CSR 并用 Jacobi 预条件的 BiCGStab 求解
    ///
    /// 初始猜测取场快照；收敛后把解写回场的单元值。
    /// 任何非收敛状态都映射为 [`PhysicsError::Solver`]。
    pub fn solve(
        self,
        controls: &SolverControls,
        field: &mut ScalarField,
    ) -> PhysicsResult<SolverReport> {
        let n = self.mesh.n_cells();
        let mut builder = CsrBuilder::new(n);

        for c in self.mesh.cells() {
            builder.add(c, c, self.diag[c]);
        }
        for f in self.mesh.interior_faces() {
            let owner = self.mesh.face_owner(f);
            let neigh = self.mesh.face_neighbor(f).expect("内部面必有 neighbor");
            builder.add(owner, neigh, self.upper[f]);
            builder.add(neigh, owner, self.lower[f]);
        }

        let matrix = builder.build();
        let precond = JacobiPreconditioner::from_matrix(&matrix);
        let mut solver = BiCgStab::new(controls.clone());

        let mut x = self.x_ref.clone();
        let report = solver.solve(&matrix, &self.source, &mut x, &precond);

        if !report.is_converged() {
            return Err(PhysicsError::Solver {
                solver: solver.name(),
                status: report.status,
                iterations: report.iterations,
                residual: report.residual_norm,
            });
        }

        log::debug!(
            "{}: 求解 {}, 初始残差 {:.3e}, 最终残差 {:.3e}, 迭代 {}",
            solver.name(),
            self.name,
            report.initial_residual_norm,
            report.residual_norm,
            report.iterations
        );

        field.cells_mut().copy_from_slice(&x);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ScalarBc;

    fn controls() -> SolverControls {
        SolverControls { rtol: 1e-12, atol: 1e-16, max_iter: 500, verbose: false }
    }

    #[test]
    fn test_pure_ddt_keeps_field() {
        // 只有时间导数时解等于旧值
        let mesh = FvMesh::rect(3, 3, 1.0, 1.0);
        let alpha = ScalarField::uniform(&mesh, 1.0);
        let rho = ScalarField::uniform(&mesh, 1.0);
        let mut field = ScalarField::uniform(&mesh, 2.5);

        let mut eqn = ScalarTransportEqn::new(&mesh, &field, "phi");
        eqn.ddt(&alpha, &rho, 0.1);
        eqn.solve(&controls(), &mut field).unwrap();

        for &v in field.cells() {
            assert!((v - 2.5).abs() < 1e-10);
        }
    }

    #[test]
    fn test_steady_diffusion_linear_profile() {
        // 3x1 网格，左端固定 0，右端固定 1：稳态解为线性分布
        let mesh = FvMesh::rect(3, 1, 1.0, 1.0);
        let mut field = ScalarField::zeros(&mesh);

        for f in mesh.boundary_faces() {
            let b = mesh.boundary_index(f);
            let n = mesh.face_normal(f);
            if n.x < -0.5 {
                field.set_bc(b, ScalarBc::FixedValue(0.0));
            } else if n.x > 0.5 {
                field.set_bc(b, ScalarBc::FixedValue(1.0));
            }
        }
        field.correct_boundary_conditions(&mesh);

        let gamma = ScalarField::uniform(&mesh, 1.0);
        let mut eqn = ScalarTransportEqn::new(&mesh, &field, "phi");
        eqn.laplacian(&gamma, FaceInterpolation::Arithmetic);
        eqn.solve(&controls(), &mut field).unwrap();

        let expected = [1.0 / 6.0, 0.5, 5.0 / 6.0];
        for (c, &e) in expected.iter().enumerate() {
            assert!((field.cells()[c] - e).abs() < 1e-8, "cell {}: {} != {}", c, field.cells()[c], e);
        }
    }

    #[test]
    fn test_upwind_advection_carries_inflow() {
        // 3x1 网格，x 方向单位通量：稳态解处处等于入流值
        let mesh = FvMesh::rect(3, 1, 1.0, 1.0);
        let mut field = ScalarField::zeros(&mesh);

        let mut flux = vec![0.0; mesh.n_faces()];
        for f in mesh.faces() {
            let n = mesh.face_normal(f);
            if n.x.abs() > 0.5 {
                // 物理流向 +x：左边界面法向 -x，通量为负（入流）
                flux[f] = n.x * mesh.face_length(f);
            }
        }

        // 入流值 2.0
        for f in mesh.boundary_faces() {
            if mesh.face_normal(f).x < -0.5 {
                let b = mesh.boundary_index(f);
                field.set_bc(b, ScalarBc::FixedValue(2.0));
            }
        }
        field.correct_boundary_conditions(&mesh);

        let mut eqn = ScalarTransportEqn::new(&mesh, &field, "phi");
        eqn.div(&flux);
        eqn.solve(&controls(), &mut field).unwrap();

        for &v in field.cells() {
            assert!((v - 2.0).abs() < 1e-8);
        }
    }

    #[test]
    fn test_implicit_sink_decay() {
        // (V/dt + c·V)·x = V/dt·x_old  =>  x = x_old / (1 + c·dt)
        let mesh = FvMesh::rect(2, 2, 1.0, 1.0);
        let alpha = ScalarField::uniform(&mesh, 1.0);
        let rho = ScalarField::uniform(&mesh, 1.0);
        let mut field = ScalarField::uniform(&mesh, 1.0);

        let dt = 0.5;
        let c = 2.0;
        let mut eqn = ScalarTransportEqn::new(&mesh, &field, "phi");
        eqn.ddt(&alpha, &rho, dt);
        eqn.add_implicit_sink(&vec![c; mesh.n_cells()]);
        eqn.solve(&controls(), &mut field).unwrap();

        let expected = 1.0 / (1.0 + c * dt);
        for &v in field.cells() {
            assert!((v - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_explicit_source_accumulates() {
        // (V/dt)·x = (V/dt)·x_old + s·V  =>  x = x_old + s·dt
        let mesh = FvMesh::rect(2, 1, 1.0, 1.0);
        let alpha = ScalarField::uniform(&mesh, 1.0);
        let rho = ScalarField::uniform(&mesh, 1.0);
        let mut field = ScalarField::uniform(&mesh, 1.0);

        let mut eqn = ScalarTransportEqn::new(&mesh, &field, "phi");
        eqn.ddt(&alpha, &rho, 0.25);
        eqn.add_source(&vec![4.0; mesh.n_cells()]);
        eqn.solve(&controls(), &mut field).unwrap();

        for &v in field.cells() {
            assert!((v - 2.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_relax_preserves_fixed_point() {
        // 松弛不改变已收敛解
        let mesh = FvMesh::rect(3, 1, 1.0, 1.0);
        let alpha = ScalarField::uniform(&mesh, 1.0);
        let rho = ScalarField::uniform(&mesh, 1.0);
        let mut field = ScalarField::uniform(&mesh, 3.0);

        let mut eqn = ScalarTransportEqn::new(&mesh, &field, "phi");
        eqn.ddt(&alpha, &rho, 1.0);
        eqn.relax(0.5);
        eqn.solve(&controls(), &mut field).unwrap();

        for &v in field.cells() {
            assert!((v - 3.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_pin_value() {
        let mesh = FvMesh::rect(2, 2, 1.0, 1.0);
        let alpha = ScalarField::uniform(&mesh, 1.0);
        let rho = ScalarField::uniform(&mesh, 1.0);
        let mut field = ScalarField::uniform(&mesh, 1.0);

        let mut eqn = ScalarTransportEqn::new(&mesh, &field, "phi");
        eqn.ddt(&alpha, &rho, 1.0);
        eqn.pin_value(0, 7.0);
        eqn.solve(&controls(), &mut field).unwrap();

        assert!((field.cells()[0] - 7.0).abs() < 1e-4);
        assert!((field.cells()[3] - 1.0).abs() < 1e-8);
    }

    #[test]
    #[should_panic(expected = "松弛因子")]
    fn test_relax_rejects_bad_factor() {
        let mesh = FvMesh::rect(2, 1, 1.0, 1.0);
        let field = ScalarField::zeros(&mesh);
        let mut eqn = ScalarTransportEqn::new(&mesh, &field, "phi");
        eqn.relax(0.0);
    }
}
