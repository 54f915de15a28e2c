// crates/sa_physics/src/linalg/vector_ops.rs

//! 向量运算（BLAS Level 1 风格）
//!
//! 迭代求解器内部使用的基础向量运算。

use sa_foundation::Scalar;

/// 点积 x·y
#[inline]
pub fn dot(x: &[Scalar], y: &[Scalar]) -> Scalar {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y.iter()).map(|(&xi, &yi)| xi * yi).sum()
}

/// 二范数 ||x||₂
#[inline]
pub fn norm2(x: &[Scalar]) -> Scalar {
    dot(x, x).sqrt()
}

/// AXPY: y = α*x + y
#[inline]
pub fn axpy(alpha: Scalar, x: &[Scalar], y: &mut [Scalar]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

/// 复制: y = x
#[inline]
pub fn copy(x: &[Scalar], y: &mut [Scalar]) {
    debug_assert_eq!(x.len(), y.len());
    y.copy_from_slice(x);
}
