// crates/sa_physics/src/sources.rs

//! 外部源项机制
//!
//! 定义输运方程的可插拔源项接口：源项可以向方程追加贡献
//! （`add_to`）、约束方程（`constrain`）、以及在求解后修正场
//! （`correct`）。注册表按注册顺序依次应用所有启用的源项。

use crate::equation::ScalarTransportEqn;
use crate::field::ScalarField;
use sa_foundation::Scalar;

/// 源项 Trait
///
/// 三个钩子都有空默认实现，具体源项按需覆盖。
pub trait SourceTerm: Send + Sync {
    /// 源项名称
    fn name(&self) -> &'static str;

    /// 是否启用
    fn is_enabled(&self) -> bool {
        true
    }

    /// 向方程追加贡献（组装期）
    fn add_to(
        &self,
        _eqn: &mut ScalarTransportEqn,
        _alpha: &ScalarField,
        _rho: &ScalarField,
        _field: &ScalarField,
    ) {
    }

    /// 约束方程（组装完成、求解之前）
    fn constrain(&self, _eqn: &mut ScalarTransportEqn) {}

    /// 修正求解后的场
    fn correct(&self, _field: &mut ScalarField) {}
}

/// 源项注册表
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Box<dyn SourceTerm>>,
}

impl SourceRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册新源项
    pub fn register(&mut self, source: Box<dyn SourceTerm>) {
        self.sources.push(source);
    }

    /// 已注册数量
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// 所有源项名称
    pub fn names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// 应用所有源项的方程贡献
    pub fn add_all(
        &self,
        eqn: &mut ScalarTransportEqn,
        alpha: &ScalarField,
        rho: &ScalarField,
        field: &ScalarField,
    ) {
        for source in self.sources.iter().filter(|s| s.is_enabled()) {
            source.add_to(eqn, alpha, rho, field);
        }
    }

    /// 应用所有源项的方程约束
    pub fn constrain_all(&self, eqn: &mut ScalarTransportEqn) {
        for source in self.sources.iter().filter(|s| s.is_enabled()) {
            source.constrain(eqn);
        }
    }

    /// 应用所有源项的场修正
    pub fn correct_all(&self, field: &mut ScalarField) {
        for source in self.sources.iter().filter(|s| s.is_enabled()) {
            source.correct(field);
        }
    }
}

/// 显式体积率源
///
/// 把逐单元给定的率（乘以 α·ρ 前的裸率）加到方程右端。
pub struct ExplicitRateSource {
    rate: Vec<Scalar>,
    enabled: bool,
}

impl ExplicitRateSource {
    /// 创建显式率源
    pub fn new(rate: Vec<Scalar>) -> Self {
        Self { rate, enabled: true }
    }

    /// 开关
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl SourceTerm for ExplicitRateSource {
    fn name(&self) -> &'static str {
        "explicitRate"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn add_to(
        &self,
        eqn: &mut ScalarTransportEqn,
        _alpha: &ScalarField,
        _rho: &ScalarField,
        _field: &ScalarField,
    ) {
        eqn.add_source(&self.rate);
    }
}

/// 固定值约束
///
/// 将指定单元的解钉到给定值：组装后用大系数法约束方程，
/// 求解后再把场值覆写一遍，保证与约束一致。
pub struct FixedValueConstraint {
    cells: Vec<(usize, Scalar)>,
}

impl FixedValueConstraint {
    /// 创建固定值约束
    pub fn new(cells: Vec<(usize, Scalar)>) -> Self {
        Self { cells }
    }
}

impl SourceTerm for FixedValueConstraint {
    fn name(&self) -> &'static str {
        "fixedValueConstraint"
    }

    fn constrain(&self, eqn: &mut ScalarTransportEqn) {
        for &(cell, value) in &self.cells {
            eqn.pin_value(cell, value);
        }
    }

    fn correct(&self, field: &mut ScalarField) {
        for &(cell, value) in &self.cells {
            field.cells_mut()[cell] = value;
        }
    }
}
