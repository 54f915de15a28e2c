// crates/sa_physics/src/field.rs

//! 场容器
//!
//! 提供单元中心场（标量 / 向量），每个场同时携带边界面值和
//! 每边界面的边界条件。边界值不自动更新：求解一步后需显式调用
//! `correct_boundary_conditions` 刷新。
//!
//! [`FieldStore`] 是初始条件来源的最小抽象：按名称存取场，
//! 取不到必需场时返回 [`PhysicsError::MissingField`]。

use crate::error::{PhysicsError, PhysicsResult};
use crate::mesh::FvMesh;
use glam::DVec2;
use sa_foundation::{AlignedVec, Scalar};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 标量场边界条件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ScalarBc {
    /// 固定值
    FixedValue(Scalar),
    /// 零梯度（边界值取 owner 单元值）
    #[default]
    ZeroGradient,
}

/// 向量场边界条件
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VectorBc {
    /// 固定值
    FixedValue(DVec2),
    /// 零梯度
    #[default]
    ZeroGradient,
}

/// 单元中心标量场
///
/// 单元值放在对齐缓冲中，边界面值与边界条件按边界面索引排列
/// （即 `face - n_interior_faces`）。
#[derive(Debug, Clone)]
pub struct ScalarField {
    cells: AlignedVec<Scalar>,
    boundary: Vec<Scalar>,
    bcs: Vec<ScalarBc>,
}

impl ScalarField {
    /// 创建全零场（边界条件零梯度）
    pub fn zeros(mesh: &FvMesh) -> Self {
        Self::uniform(mesh, 0.0)
    }

    /// 创建均匀值场（边界条件零梯度）
    pub fn uniform(mesh: &FvMesh, value: Scalar) -> Self {
        let n_bnd = mesh.n_boundary_faces();
        Self {
            cells: AlignedVec::filled(mesh.n_cells(), value),
            boundary: vec![value; n_bnd],
            bcs: vec![ScalarBc::ZeroGradient; n_bnd],
        }
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// 单元值切片
    #[inline]
    pub fn cells(&self) -> &[Scalar] {
        &self.cells
    }

    /// 单元值可变切片
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Scalar] {
        &mut self.cells
    }

    /// 边界面值切片
    #[inline]
    pub fn boundary(&self) -> &[Scalar] {
        &self.boundary
    }

    /// 边界面值可变切片
    #[inline]
    pub fn boundary_mut(&mut self) -> &mut [Scalar] {
        &mut self.boundary
    }

    /// 某边界面的边界条件
    #[inline]
    pub fn bc(&self, boundary_index: usize) -> ScalarBc {
        self.bcs[boundary_index]
    }

    /// 设置某边界面的边界条件
    pub fn set_bc(&mut self, boundary_index: usize, bc: ScalarBc) {
        self.bcs[boundary_index] = bc;
    }

    /// 对所有边界面设置同一边界条件
    pub fn set_bc_all(&mut self, bc: ScalarBc) {
        self.bcs.fill(bc);
    }

    /// 全场填充同一值（单元 + 边界）
    pub fn fill(&mut self, value: Scalar) {
        self.cells.fill(value);
        self.boundary.fill(value);
    }

    /// 逐元素映射（单元与边界一起），边界条件原样继承
    pub fn map(&self, f: impl Fn(Scalar) -> Scalar) -> Self {
        Self {
            cells: self.cells.iter().map(|&v| f(v)).collect(),
            boundary: self.boundary.iter().map(|&v| f(v)).collect(),
            bcs: self.bcs.clone(),
        }
    }

    /// 与另一场逐元素合并，边界条件继承自 self
    pub fn zip_with(&self, other: &Self, f: impl Fn(Scalar, Scalar) -> Scalar) -> Self {
        debug_assert_eq!(self.n_cells(), other.n_cells());
        Self {
            cells: self
                .cells
                .iter()
                .zip(other.cells.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            boundary: self
                .boundary
                .iter()
                .zip(other.boundary.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            bcs: self.bcs.clone(),
        }
    }

    /// 按边界条件刷新边界面值
    pub fn correct_boundary_conditions(&mut self, mesh: &FvMesh) {
        for face in mesh.boundary_faces() {
            let b = mesh.boundary_index(face);
            self.boundary[b] = match self.bcs[b] {
                ScalarBc::FixedValue(v) => v,
                ScalarBc::ZeroGradient => self.cells[mesh.face_owner(face)],
            };
        }
    }

    /// 单元最小值
    pub fn min(&self) -> Scalar {
        self.cells.iter().copied().fold(Scalar::INFINITY, Scalar::min)
    }

    /// 单元最大值
    pub fn max(&self) -> Scalar {
        self.cells.iter().copied().fold(Scalar::NEG_INFINITY, Scalar::max)
    }

    /// 单元算术平均
    pub fn average(&self) -> Scalar {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().sum::<Scalar>() / self.cells.len() as Scalar
    }
}

/// 单元中心向量场
#[derive(Debug, Clone)]
pub struct VectorField {
    cells: Vec<DVec2>,
    boundary: Vec<DVec2>,
    bcs: Vec<VectorBc>,
}

impl VectorField {
    /// 创建均匀值场（边界条件零梯度）
    pub fn uniform(mesh: &FvMesh, value: DVec2) -> Self {
        let n_bnd = mesh.n_boundary_faces();
        Self {
            cells: vec![value; mesh.n_cells()],
            boundary: vec![value; n_bnd],
            bcs: vec![VectorBc::ZeroGradient; n_bnd],
        }
    }

    /// 创建全零场
    pub fn zeros(mesh: &FvMesh) -> Self {
        Self::uniform(mesh, DVec2::ZERO)
    }

    /// 单元值切片
    #[inline]
    pub fn cells(&self) -> &[DVec2] {
        &self.cells
    }

    /// 单元值可变切片
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [DVec2] {
        &mut self.cells
    }

    /// 边界面值切片
    #[inline]
    pub fn boundary(&self) -> &[DVec2] {
        &self.boundary
    }

    /// 设置某边界面的边界条件
    pub fn set_bc(&mut self, boundary_index: usize, bc: VectorBc) {
        self.bcs[boundary_index] = bc;
    }

    /// 按边界条件刷新边界面值
    pub fn correct_boundary_conditions(&mut self, mesh: &FvMesh) {
        for face in mesh.boundary_faces() {
            let b = mesh.boundary_index(face);
            self.boundary[b] = match self.bcs[b] {
                VectorBc::FixedValue(v) => v,
                VectorBc::ZeroGradient => self.cells[mesh.face_owner(face)],
            };
        }
    }
}

/// 场下界钳位
///
/// 将单元与边界值钳到 `min_value` 以下界，发生钳位时输出
/// 调试日志（钳位前的最小值与平均值）。
pub fn bound(name: &str, field: &mut ScalarField, min_value: Scalar) {
    let current_min = field.min();
    if current_min >= min_value {
        return;
    }

    log::debug!(
        "限制场 {} 下界: min {:.6e} -> {:.6e}, 平均 {:.6e}",
        name,
        current_min,
        min_value,
        field.average()
    );

    for v in field.cells_mut() {
        if *v < min_value {
            *v = min_value;
        }
    }
    for v in field.boundary_mut() {
        if *v < min_value {
            *v = min_value;
        }
    }
}

/// 按名称存取场的初始条件仓库
#[derive(Debug, Default)]
pub struct FieldStore {
    fields: HashMap<String, ScalarField>,
}

impl FieldStore {
    /// 创建空仓库
    pub fn new() -> Self {
        Self::default()
    }

    /// 存入场（同名覆盖）
    pub fn insert(&mut self, name: impl Into<String>, field: ScalarField) {
        self.fields.insert(name.into(), field);
    }

    /// 取出必需场，不存在则报 `MissingField`
    pub fn take(&mut self, name: &str) -> PhysicsResult<ScalarField> {
        self.fields
            .remove(name)
            .ok_or_else(|| PhysicsError::MissingField { name: name.to_string() })
    }

    /// 是否包含指定场
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}
