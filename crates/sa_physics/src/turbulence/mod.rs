// crates/sa_physics/src/turbulence/mod.rs

//! 湍流闭合模型
//!
//! - [`coeffs`]: Spalart-Allmaras 模型系数
//! - [`closure`]: 闭合函数库（纯场到场函数）
//! - [`spalart_allmaras`]: 单方程模型本体
//!
//! 本模块还定义模型的公共接口 [`RansModel`]、输运场集合
//! [`FlowState`] 与涡粘性基类 [`EddyViscosityBase`]。

pub mod closure;
pub mod coeffs;
pub mod spalart_allmaras;

pub use coeffs::SpalartAllmarasCoeffs;
pub use spalart_allmaras::SpalartAllmaras;

use crate::config::RasConfig;
use crate::error::PhysicsResult;
use crate::field::{ScalarField, VectorField};
use crate::mesh::FvMesh;
use sa_foundation::Scalar;
use std::sync::Arc;

/// RANS 湍流模型公共接口
pub trait RansModel {
    /// 模型名称
    fn name(&self) -> &'static str;

    /// 涡粘性场
    fn nut(&self) -> &ScalarField;

    /// 湍动能场（单方程模型不建模，返回零场）
    fn k(&self) -> ScalarField;

    /// 耗散率场（单方程模型不建模，返回零场并告警）
    fn epsilon(&self) -> ScalarField;

    /// 单步修正：求解输运方程并更新涡粘性
    fn correct(&mut self) -> PhysicsResult<()>;

    /// 重载系数；返回基类是否也成功重载
    fn read(&mut self, config: &RasConfig) -> PhysicsResult<bool>;
}

/// 基类提供的输运场集合
///
/// α（相分数）、ρ（密度）、φ（面质量通量）、U（速度）、
/// ν（分子粘性）与时间步长。字段由外部求解器在两步之间更新，
/// `correct()` 调用期间只读。
#[derive(Debug)]
pub struct FlowState {
    /// 速度场
    pub u: VectorField,
    /// 相分数场（单相时为 1）
    pub alpha: ScalarField,
    /// 密度场（不可压缩时为 1）
    pub rho: ScalarField,
    /// 分子运动粘性场
    pub nu: ScalarField,
    /// 面质量通量 α·ρ·φ（owner→neighbor 为正），长度 = 面数
    pub alpha_rho_phi: Vec<Scalar>,
    /// 时间步长 [s]
    pub dt: Scalar,
}

impl FlowState {
    /// 静止单相流场（α=ρ=1，U=0，φ=0）
    pub fn quiescent(mesh: &FvMesh, nu: Scalar, dt: Scalar) -> Self {
        Self {
            u: VectorField::zeros(mesh),
            alpha: ScalarField::uniform(mesh, 1.0),
            rho: ScalarField::uniform(mesh, 1.0),
            nu: ScalarField::uniform(mesh, nu),
            alpha_rho_phi: vec![0.0; mesh.n_faces()],
            dt,
        }
    }
}

/// 涡粘性模型基类
///
/// 持有网格、输运场与涡粘性场，提供具体模型扩展的通用
/// `correct` / `read` 钩子。
#[derive(Debug)]
pub struct EddyViscosityBase {
    mesh: Arc<FvMesh>,
    flow: FlowState,
    nut: ScalarField,
    turbulence: bool,
}

impl EddyViscosityBase {
    /// 创建基类
    pub fn new(mesh: Arc<FvMesh>, flow: FlowState, turbulence: bool) -> Self {
        let nut = ScalarField::zeros(&mesh);
        Self { mesh, flow, nut, turbulence }
    }

    /// 网格句柄
    #[inline]
    pub fn mesh(&self) -> &Arc<FvMesh> {
        &self.mesh
    }

    /// 输运场
    #[inline]
    pub fn flow(&self) -> &FlowState {
        &self.flow
    }

    /// 输运场（可变，供外部求解器在两步之间更新）
    #[inline]
    pub fn flow_mut(&mut self) -> &mut FlowState {
        &mut self.flow
    }

    /// 涡粘性场
    #[inline]
    pub fn nut(&self) -> &ScalarField {
        &self.nut
    }

    /// 涡粘性场（可变）
    #[inline]
    pub fn nut_mut(&mut self) -> &mut ScalarField {
        &mut self.nut
    }

    /// 湍流是否启用
    #[inline]
    pub fn turbulence(&self) -> bool {
        self.turbulence
    }

    /// 基类单步簿记：刷新输运场的边界值
    pub fn correct(&mut self) {
        self.flow.u.correct_boundary_conditions(&self.mesh);
        self.flow.alpha.correct_boundary_conditions(&self.mesh);
        self.flow.rho.correct_boundary_conditions(&self.mesh);
        self.flow.nu.correct_boundary_conditions(&self.mesh);
    }

    /// 基类配置重载；返回是否成功
    pub fn read(&mut self, config: &RasConfig) -> bool {
        if config.validate().is_err() {
            return false;
        }
        self.turbulence = config.turbulence;
        true
    }

    /// 涡粘性更新完成的通知钩子
    pub fn on_nut_updated(&self) {
        log::trace!(
            "nut 已更新: min {:.3e}, max {:.3e}",
            self.nut.min(),
            self.nut.max()
        );
    }
}
