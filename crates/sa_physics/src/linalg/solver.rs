// crates/sa_physics/src/linalg/solver.rs

//! 迭代线性求解器
//!
//! 提供求解稀疏线性系统 Ax = b 的双共轭梯度稳定法（BiCGStab）。
//! 对流-扩散离散产生的矩阵非对称，BiCGStab 是本项目唯一需要的
//! Krylov 方法。
//!
//! # 使用示例
//!
//! ```ignore
//! use sa_physics::linalg::{BiCgStab, JacobiPreconditioner, SolverControls};
//!
//! let precond = JacobiPreconditioner::from_matrix(&matrix);
//! let mut solver = BiCgStab::new(SolverControls::default());
//! let report = solver.solve(&matrix, &b, &mut x, &precond);
//! assert!(report.is_converged());
//! ```

use super::csr::CsrMatrix;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, copy, dot, norm2};
use sa_foundation::Scalar;
use serde::{Deserialize, Serialize};

/// 求解器控制参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverControls {
    /// 相对收敛容差
    #[serde(default = "default_rtol")]
    pub rtol: Scalar,
    /// 绝对收敛容差
    #[serde(default = "default_atol")]
    pub atol: Scalar,
    /// 最大迭代次数
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// 是否打印迭代信息
    #[serde(default)]
    pub verbose: bool,
}

fn default_rtol() -> Scalar {
    1e-8
}
fn default_atol() -> Scalar {
    1e-14
}
fn default_max_iter() -> usize {
    1000
}

impl Default for SolverControls {
    fn default() -> Self {
        Self {
            rtol: default_rtol(),
            atol: default_atol(),
            max_iter: default_max_iter(),
            verbose: false,
        }
    }
}

/// 求解终止状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞（breakdown）
    Stagnated,
}

/// 求解报告
#[derive(Debug, Clone)]
pub struct SolverReport {
    /// 终止状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: Scalar,
    /// 初始残差范数
    pub initial_residual_norm: Scalar,
}

impl SolverReport {
    /// 是否成功收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// 双共轭梯度稳定法求解器
///
/// 工作向量内部复用，跨多次 `solve` 调用不重复分配。
pub struct BiCgStab {
    controls: SolverControls,
    r: Vec<Scalar>,
    r0: Vec<Scalar>,
    p: Vec<Scalar>,
    v: Vec<Scalar>,
    s: Vec<Scalar>,
    t: Vec<Scalar>,
    p_hat: Vec<Scalar>,
    s_hat: Vec<Scalar>,
}

impl BiCgStab {
    /// 创建求解器
    pub fn new(controls: SolverControls) -> Self {
        Self {
            controls,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            p_hat: Vec::new(),
            s_hat: Vec::new(),
        }
    }

    /// 求解器名称
    pub fn name(&self) -> &'static str {
        "BiCGStab"
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.r0 = vec![0.0; n];
            self.p = vec![0.0; n];
            self.v = vec![0.0; n];
            self.s = vec![0.0; n];
            self.t = vec![0.0; n];
            self.p_hat = vec![0.0; n];
            self.s_hat = vec![0.0; n];
        } else {
            for buf in [
                &mut self.r,
                &mut self.r0,
                &mut self.p,
                &mut self.v,
                &mut self.s,
                &mut self.t,
                &mut self.p_hat,
                &mut self.s_hat,
            ] {
                buf.fill(0.0);
            }
        }
    }

    /// 求解线性系统 Ax = b
    ///
    /// # 参数
    ///
    /// - `matrix`: 系数矩阵 A
    /// - `b`: 右端项
    /// - `x`: 解向量（输入初始猜测，输出解）
    /// - `precond`: 预条件器
    pub fn solve<P: Preconditioner>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[Scalar],
        x: &mut [Scalar],
        precond: &P,
    ) -> SolverReport {
        let n = b.len();
        self.ensure_workspace(n);

        const STAG_TOL: Scalar = 1e-30;
        const DIV_FACTOR: Scalar = 1e6;

        // r = b - A*x
        matrix.mul_vec(x, &mut self.r);
        for i in 0..n {
            self.r[i] = b[i] - self.r[i];
        }

        let initial_norm = norm2(&self.r);
        let b_norm = norm2(b);

        // 鲁棒的收敛判据：b ≈ 0 时退化为绝对容差
        let effective_tol = if b_norm < Scalar::MIN_POSITIVE {
            self.controls.atol
        } else {
            self.controls.atol.max(self.controls.rtol * b_norm)
        };

        if initial_norm <= effective_tol {
            return SolverReport {
                status: SolverStatus::Converged,
                iterations: 0,
                residual_norm: initial_norm,
                initial_residual_norm: initial_norm,
            };
        }

        // r0 影子残差固定为初始残差
        copy(&self.r, &mut self.r0);

        let mut rho_old: Scalar = 1.0;
        let mut alpha: Scalar = 1.0;
        let mut omega: Scalar = 1.0;

        for iter in 0..self.controls.max_iter {
            let rho = dot(&self.r0, &self.r);
            if rho.abs() < STAG_TOL {
                return self.report(SolverStatus::Stagnated, iter, initial_norm);
            }

            // 首次迭代 p = r
            let beta = if iter == 0 { 0.0 } else { (rho / rho_old) * (alpha / omega) };
            rho_old = rho;

            // p = r + beta * (p - omega * v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            // p_hat = M⁻¹ p; v = A p_hat
            precond.apply(&self.p, &mut self.p_hat);
            matrix.mul_vec(&self.p_hat, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if r0v.abs() < STAG_TOL {
                return self.report(SolverStatus::Stagnated, iter, initial_norm);
            }
            alpha = rho / r0v;

            // s = r - alpha * v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            let s_norm = norm2(&self.s);
            if s_norm <= effective_tol {
                axpy(alpha, &self.p_hat, x);
                return SolverReport {
                    status: SolverStatus::Converged,
                    iterations: iter + 1,
                    residual_norm: s_norm,
                    initial_residual_norm: initial_norm,
                };
            }

            // s_hat = M⁻¹ s; t = A s_hat
            precond.apply(&self.s, &mut self.s_hat);
            matrix.mul_vec(&self.s_hat, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt.abs() < STAG_TOL { 1.0 } else { dot(&self.t, &self.s) / tt };
            if omega.abs() < STAG_TOL {
                axpy(alpha, &self.p_hat, x);
                return self.report(SolverStatus::Stagnated, iter + 1, initial_norm);
            }

            // x += alpha * p_hat + omega * s_hat
            axpy(alpha, &self.p_hat, x);
            axpy(omega, &self.s_hat, x);

            // r = s - omega * t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = norm2(&self.r);

            if self.controls.verbose {
                log::trace!("BiCGStab iter {}: residual = {:.6e}", iter + 1, res_norm);
            }

            if res_norm <= effective_tol {
                return SolverReport {
                    status: SolverStatus::Converged,
                    iterations: iter + 1,
                    residual_norm: res_norm,
                    initial_residual_norm: initial_norm,
                };
            }

            if res_norm > initial_norm * DIV_FACTOR {
                return self.report(SolverStatus::Diverged, iter + 1, initial_norm);
            }
        }

        self.report(SolverStatus::MaxIterationsReached, self.controls.max_iter, initial_norm)
    }

    fn report(&self, status: SolverStatus, iterations: usize, initial_norm: Scalar) -> SolverReport {
        SolverReport {
            status,
            iterations,
            residual_norm: norm2(&self.r),
            initial_residual_norm: initial_norm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::csr::CsrBuilder;
    use crate::linalg::preconditioner::{IdentityPreconditioner, JacobiPreconditioner};

    /// 非对称对角占优矩阵（上风对流 + 扩散的典型形态）
    fn advection_diffusion_matrix(n: usize) -> CsrMatrix {
        let mut builder = CsrBuilder::new(n);
        for i in 0..n {
            builder.set(i, i, 4.0);
            if i > 0 {
                builder.set(i, i - 1, -2.0);
            }
            if i < n - 1 {
                builder.set(i, i + 1, -1.0);
            }
        }
        builder.build()
    }

    #[test]
    fn test_bicgstab_converges() {
        let matrix = advection_diffusion_matrix(20);
        let b = vec![1.0; 20];
        let mut x = vec![0.0; 20];

        let precond = JacobiPreconditioner::from_matrix(&matrix);
        let mut solver = BiCgStab::new(SolverControls::default());
        let report = solver.solve(&matrix, &b, &mut x, &precond);

        assert!(report.is_converged());

        // 验证残差
        let mut ax = vec![0.0; 20];
        matrix.mul_vec(&x, &mut ax);
        let res: Scalar = ax.iter().zip(b.iter()).map(|(a, b)| (a - b) * (a - b)).sum::<Scalar>().sqrt();
        assert!(res < 1e-6);
    }

    #[test]
    fn test_bicgstab_zero_rhs() {
        let matrix = advection_diffusion_matrix(10);
        let b = vec![0.0; 10];
        let mut x = vec![0.0; 10];

        let precond = IdentityPreconditioner::new();
        let mut solver = BiCgStab::new(SolverControls::default());
        let report = solver.solve(&matrix, &b, &mut x, &precond);

        // 零右端项 + 零初猜：立即收敛，解保持为零
        assert!(report.is_converged());
        assert_eq!(report.iterations, 0);
        assert!(x.iter().all(|&v| v.abs() < 1e-14));
    }

    #[test]
    fn test_bicgstab_already_converged() {
        let matrix = advection_diffusion_matrix(5);
        let x_exact = vec![1.0, 2.0, 3.0, 2.0, 1.0];
        let mut b = vec![0.0; 5];
        matrix.mul_vec(&x_exact, &mut b);

        let mut x = x_exact.clone();
        let precond = JacobiPreconditioner::from_matrix(&matrix);
        let mut solver = BiCgStab::new(SolverControls::default());
        let report = solver.solve(&matrix, &b, &mut x, &precond);

        assert!(report.is_converged());
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn test_bicgstab_max_iterations() {
        let matrix = advection_diffusion_matrix(50);
        let b = vec![1.0; 50];
        let mut x = vec![0.0; 50];

        let controls = SolverControls { rtol: 1e-14, atol: 1e-30, max_iter: 1, verbose: false };
        let precond = IdentityPreconditioner::new();
        let mut solver = BiCgStab::new(controls);
        let report = solver.solve(&matrix, &b, &mut x, &precond);

        assert!(!report.is_converged());
    }

    #[test]
    fn test_solver_controls_defaults() {
        let controls = SolverControls::default();
        assert!((controls.rtol - 1e-8).abs() < 1e-20);
        assert_eq!(controls.max_iter, 1000);
        assert!(!controls.verbose);
    }
}
