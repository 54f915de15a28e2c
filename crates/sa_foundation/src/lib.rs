// crates/sa_foundation/src/lib.rs

//! Spalart Foundation Layer
//!
//! 基础层，提供上层物理代码共用的标量类型与存储抽象。
//!
//! # 模块概览
//!
//! - [`scalar`]: 标量类型别名、数值常量、幂次辅助函数
//! - [`memory`]: 64 字节对齐的场缓冲 [`AlignedVec`]
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 serde 和 bytemuck
//! 2. **固定精度**: 全项目 f64，不做 f32 切换（近壁源项对精度敏感）
//! 3. **长度不可变**: 场缓冲长度由网格决定，不提供增长接口

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod scalar;

pub use memory::AlignedVec;
pub use scalar::{pow3, pow6, sqr, Scalar};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::memory::AlignedVec;
    pub use crate::scalar::consts::{GREAT, ROOT_TWO, SMALL};
    pub use crate::scalar::{pow3, pow6, sqr, Scalar};
}
