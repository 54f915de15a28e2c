// crates/sa_physics/src/lib.rs

//! Spalart-Allmaras 单方程 RANS 湍流闭合
//!
//! 输运代理粘性 ν̃ 并派生涡粘性 ν_t 的二维有限体积实现。
//!
//! # 模块概览
//!
//! - [`mesh`]: 面寻址有限体积网格
//! - [`field`]: 标量 / 向量场容器与边界条件
//! - [`gradient`]: Green-Gauss 梯度算子
//! - [`walldist`]: 按网格键控的壁面距离注册表
//! - [`linalg`]: CSR 稀疏矩阵与 BiCGStab 求解器
//! - [`equation`]: 隐式标量输运方程组装
//! - [`sources`]: 可插拔外部源项机制
//! - [`config`]: JSON 配置与系数字典
//! - [`turbulence`]: 模型本体（系数、闭合函数库、控制器）
//!
//! # 使用示例
//!
//! ```
//! use std::sync::Arc;
//! use sa_physics::config::RasConfig;
//! use sa_physics::field::{FieldStore, ScalarField};
//! use sa_physics::mesh::FvMesh;
//! use sa_physics::turbulence::{EddyViscosityBase, FlowState, RansModel, SpalartAllmaras};
//!
//! let mesh = Arc::new(FvMesh::rect(8, 8, 0.1, 0.1));
//! let flow = FlowState::quiescent(&mesh, 1e-5, 0.01);
//! let base = EddyViscosityBase::new(Arc::clone(&mesh), flow, true);
//!
//! let mut config = RasConfig::default();
//! let mut store = FieldStore::new();
//! store.insert("nuTilda", ScalarField::uniform(&mesh, 3e-5));
//!
//! let mut model = SpalartAllmaras::new(base, &mut config, &mut store).unwrap();
//! model.correct().unwrap();
//! assert!(model.nut().cells().iter().all(|v| v.is_finite()));
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod equation;
pub mod error;
pub mod field;
pub mod gradient;
pub mod linalg;
pub mod mesh;
pub mod sources;
pub mod turbulence;
pub mod walldist;

pub use error::{ConfigError, PhysicsError, PhysicsResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::config::{CoeffDict, RasConfig};
    pub use crate::equation::{FaceInterpolation, ScalarTransportEqn};
    pub use crate::error::{ConfigError, PhysicsError, PhysicsResult};
    pub use crate::field::{bound, FieldStore, ScalarBc, ScalarField, VectorField};
    pub use crate::gradient::{GreenGauss, VelocityGradient};
    pub use crate::linalg::{BiCgStab, SolverControls, SolverStatus};
    pub use crate::mesh::{BoundaryKind, FvMesh, MeshId};
    pub use crate::sources::{SourceRegistry, SourceTerm};
    pub use crate::turbulence::{
        EddyViscosityBase, FlowState, RansModel, SpalartAllmaras, SpalartAllmarasCoeffs,
    };
}
