// crates/sa_physics/src/linalg/preconditioner.rs

//! 预条件器
//!
//! 将原问题 Ax = b 转换为条件数更好的问题 M⁻¹Ax = M⁻¹b。
//! 有限体积输运矩阵对角占优，Jacobi 预条件已足够有效。

use super::csr::CsrMatrix;
use sa_foundation::Scalar;

/// 预条件器 trait
///
/// 核心操作是 `apply`: z = M⁻¹ * r
pub trait Preconditioner: Send + Sync {
    /// 应用预条件器: z = M⁻¹ * r
    fn apply(&self, r: &[Scalar], z: &mut [Scalar]);

    /// 预条件器名称
    fn name(&self) -> &'static str;
}

/// 恒等预条件器（无预条件）
#[derive(Debug, Clone, Default)]
pub struct IdentityPreconditioner;

impl IdentityPreconditioner {
    /// 创建恒等预条件器
    pub fn new() -> Self {
        Self
    }
}

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[Scalar], z: &mut [Scalar]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }
}

/// Jacobi 预条件器（对角预条件）
///
/// M = diag(A)，即 z_i = r_i / A_ii
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<Scalar>,
}

impl JacobiPreconditioner {
    /// 从 CSR 矩阵创建
    ///
    /// 对角元接近零的行退化为单位预条件。
    pub fn from_matrix(matrix: &CsrMatrix) -> Self {
        let n = matrix.n_rows();
        let mut inv_diag = vec![1.0; n];

        for i in 0..n {
            if let Some(diag) = matrix.diagonal_value(i) {
                if diag.abs() > 1e-14 {
                    inv_diag[i] = 1.0 / diag;
                }
            }
        }

        Self { inv_diag }
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[Scalar], z: &mut [Scalar]) {
        debug_assert_eq!(r.len(), self.inv_diag.len());
        for i in 0..r.len() {
            z[i] = r[i] * self.inv_diag[i];
        }
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }
}
