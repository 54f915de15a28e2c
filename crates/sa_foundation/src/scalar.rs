// crates/sa_foundation/src/scalar.rs

//! 统一标量类型系统
//!
//! 整个项目的计算标量固定为 f64。湍流闭合对近壁量（壁面距离、
//! 阻尼函数分母）极为敏感，f32 精度不足以支撑 y⁻² 量级的源项，
//! 因此不提供精度切换。
//!
//! # 用法
//!
//! ```
//! use sa_foundation::scalar::{Scalar, consts::SMALL};
//!
//! let y: Scalar = 0.01;
//! let denom = y.max(SMALL);
//! assert!(denom > 0.0);
//! ```

/// 计算用标量类型
pub type Scalar = f64;

/// 数值常量
pub mod consts {
    use super::Scalar;

    /// 小量下限，用于防止除零（与分母钳位配合使用）
    pub const SMALL: Scalar = 1e-15;

    /// 大量上限，用于"无穷远"语义（如无壁面网格的壁面距离）
    pub const GREAT: Scalar = 1e15;

    /// √2
    pub const ROOT_TWO: Scalar = std::f64::consts::SQRT_2;
}

/// 三次方
#[inline]
pub fn pow3(x: Scalar) -> Scalar {
    x * x * x
}

/// 六次方
#[inline]
pub fn pow6(x: Scalar) -> Scalar {
    let x3 = pow3(x);
    x3 * x3
}

/// 平方
#[inline]
pub fn sqr(x: Scalar) -> Scalar {
    x * x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow_helpers() {
        assert!((pow3(2.0) - 8.0).abs() < 1e-12);
        assert!((pow6(2.0) - 64.0).abs() < 1e-12);
        assert!((sqr(3.0) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_consts_ordering() {
        assert!(consts::SMALL > 0.0);
        assert!(consts::GREAT > 1.0 / consts::SMALL * 1e-2);
        assert!((consts::ROOT_TWO * consts::ROOT_TWO - 2.0).abs() < 1e-14);
    }
}
