// crates/sa_physics/src/turbulence/spalart_allmaras.rs

//! Spalart-Allmaras 单方程模型
//!
//! 输运代理粘性 ν̃，并经 fv1 阻尼派生涡粘性 ν_t = ν̃·fv1。
//!
//! # ν̃ 输运方程
//!
//! ```text
//! d/dt(αρν̃) + div(αρφ, ν̃) - ∇·(αρ·D̃·∇ν̃) - (Cb2/σ)αρ|∇ν̃|²
//!   = [ν̃≥0]: Cb1(1-ft2)αρS̃ν̃ - Sp((Cw1·fw - Cb1·ft2/κ²)αρν̃/y²)
//!   + [ν̃<0]: Cb1(1-Ct3)αρΩν̃ + Sp(Cw1·αρν̃/y²)
//!   + 外部源项
//! ```
//!
//! 两个分支按每个单元当前 ν̃ 的符号逐点选择，指示权重之和为 1。
//! 破坏项一律以隐式线性化（对角贡献）进入方程。
//!
//! # 单步流程
//!
//! 基类簿记 → 闭合函数求值 → 组装方程 → 松弛 → 外部约束 →
//! 求解 → 外部修正 → 钳位（非负模式）→ 刷新边界 → 派生 ν_t。
//! 湍流关闭时 `correct()` 直接返回；求解失败原样上抛，不做重试。

use super::closure;
use super::coeffs::SpalartAllmarasCoeffs;
use super::{EddyViscosityBase, RansModel};
use crate::config::RasConfig;
use crate::equation::{FaceInterpolation, ScalarTransportEqn};
use crate::error::{PhysicsError, PhysicsResult};
use crate::field::{bound, FieldStore, ScalarField};
use crate::gradient::GreenGauss;
use crate::linalg::SolverControls;
use crate::sources::SourceRegistry;
use crate::walldist::{self, WallDistance};
use sa_foundation::scalar::consts::SMALL;
use sa_foundation::{sqr, Scalar};
use std::sync::{Arc, Weak};

/// Spalart-Allmaras 模型
pub struct SpalartAllmaras {
    base: EddyViscosityBase,
    coeffs: SpalartAllmarasCoeffs,
    /// 负 ν̃ 模式：启用备选近壁公式并关闭非负钳位
    neg: bool,
    relax: Scalar,
    solver: SolverControls,
    nu_tilda: ScalarField,
    /// 壁面距离的非所有句柄，注册表持有所有权
    y: Weak<WallDistance>,
    gradient: GreenGauss,
    /// 外部源项注册表（可插拔）
    pub fv_options: SourceRegistry,
}

impl SpalartAllmaras {
    /// 初始条件仓库中代理粘性场的名称
    pub const FIELD_NU_TILDA: &'static str = "nuTilda";

    /// 构造模型
    ///
    /// 初始 ν̃ 必须存在于 `store`，否则报
    /// [`PhysicsError::MissingField`]。系数从 `config.coeffs` 解析，
    /// 缺失项写回标准值。构造完成后涡粘性已与初始 ν̃ 一致。
    pub fn new(
        base: EddyViscosityBase,
        config: &mut RasConfig,
        store: &mut FieldStore,
    ) -> PhysicsResult<Self> {
        config.validate()?;

        let nu_tilda = store.take(Self::FIELD_NU_TILDA)?;
        let coeffs = SpalartAllmarasCoeffs::from_dict(&mut config.coeffs)?;
        let neg = config.coeffs.lookup_or_insert_bool("neg", false)?;

        let y = Arc::downgrade(&walldist::get(base.mesh()));

        coeffs.log_report("SpalartAllmaras");
        if neg {
            log::info!("启用负 nuTilda 模式");
        }

        let mut model = Self {
            base,
            coeffs,
            neg,
            relax: config.relax_nu_tilda,
            solver: config.solver.clone(),
            nu_tilda,
            y,
            gradient: GreenGauss::new(),
            fv_options: SourceRegistry::new(),
        };

        // 首次读取即建立 ν_t 与初始 ν̃ 的一致性
        model.correct_nut();
        Ok(model)
    }

    /// 当前系数集
    #[inline]
    pub fn coeffs(&self) -> &SpalartAllmarasCoeffs {
        &self.coeffs
    }

    /// 是否处于负 ν̃ 模式
    #[inline]
    pub fn allow_negative(&self) -> bool {
        self.neg
    }

    /// 代理粘性场
    #[inline]
    pub fn nu_tilda(&self) -> &ScalarField {
        &self.nu_tilda
    }

    /// 基类访问（输运场更新入口）
    #[inline]
    pub fn base_mut(&mut self) -> &mut EddyViscosityBase {
        &mut self.base
    }

    /// 基类访问（只读）
    #[inline]
    pub fn base(&self) -> &EddyViscosityBase {
        &self.base
    }

    /// 仅重新派生涡粘性 ν_t = ν̃·fv1
    ///
    /// 对当前 ν̃ 是纯函数：不求解方程，连续调用结果相同。
    pub fn correct_nut(&mut self) {
        let fv1 = closure::fv1(
            &self.coeffs,
            &closure::chi(&self.nu_tilda, &self.base.flow().nu),
        );
        self.correct_nut_with(&fv1);
    }

    /// 用给定的 fv1 派生涡粘性
    fn correct_nut_with(&mut self, fv1: &ScalarField) {
        {
            let nu_tilda = &self.nu_tilda;
            let nut = self.base.nut_mut();
            for c in 0..nut.n_cells() {
                nut.cells_mut()[c] = nu_tilda.cells()[c] * fv1.cells()[c];
            }
            for b in 0..nut.boundary().len() {
                nut.boundary_mut()[b] = nu_tilda.boundary()[b] * fv1.boundary()[b];
            }
        }

        if !self.neg {
            bound("nut", self.base.nut_mut(), 0.0);
        }

        let mesh = Arc::clone(self.base.mesh());
        self.base.nut_mut().correct_boundary_conditions(&mesh);
        self.fv_options.correct_all(self.base.nut_mut());
        self.base.on_nut_updated();
    }

    /// 分支源项：返回（显式生成率，隐式汇系数）
    ///
    /// 每个单元按 ν̃ 符号恰好贡献一个分支；指示权重 pos + neg = 1。
    fn branch_sources(
        &self,
        stilda: &ScalarField,
        ft2: &ScalarField,
        fw: &ScalarField,
        omega: &ScalarField,
        y: &WallDistance,
    ) -> (Vec<Scalar>, Vec<Scalar>) {
        let flow = self.base.flow();
        let c = &self.coeffs;
        let cw1 = c.cw1();
        let kappa2 = sqr(c.kappa);

        let n = self.nu_tilda.n_cells();
        let mut prod = vec![0.0; n];
        let mut sink = vec![0.0; n];

        for i in 0..n {
            let nt = self.nu_tilda.cells()[i];
            let ar = flow.alpha.cells()[i] * flow.rho.cells()[i];
            let y2 = sqr(y.cells()[i].max(SMALL));

            let pos = if nt >= 0.0 { 1.0 } else { 0.0 };
            let neg = 1.0 - pos;

            prod[i] = pos * c.cb1 * (1.0 - ft2.cells()[i]) * ar * stilda.cells()[i] * nt
                + neg * c.cb1 * (1.0 - c.ct3) * ar * omega.cells()[i] * nt;

            sink[i] = pos * (cw1 * fw.cells()[i] - c.cb1 * ft2.cells()[i] / kappa2) * ar * nt / y2
                - neg * cw1 * ar * nt / y2;
        }

        (prod, sink)
    }

    fn upgrade_wall_dist(&self) -> PhysicsResult<Arc<WallDistance>> {
        self.y
            .upgrade()
            .ok_or_else(|| PhysicsError::MissingField { name: "wallDist".to_string() })
    }
}

impl RansModel for SpalartAllmaras {
    fn name(&self) -> &'static str {
        "SpalartAllmaras"
    }

    fn nut(&self) -> &ScalarField {
        self.base.nut()
    }

    fn k(&self) -> ScalarField {
        // 单方程模型不输运湍动能
        ScalarField::zeros(self.base.mesh())
    }

    fn epsilon(&self) -> ScalarField {
        log::warn!("Spalart-Allmaras 模型未定义湍流耗散率，返回零场");
        ScalarField::zeros(self.base.mesh())
    }

    fn correct(&mut self) -> PhysicsResult<()> {
        if !self.base.turbulence() {
            return Ok(());
        }

        // 基类簿记
        self.base.correct();

        let mesh = Arc::clone(self.base.mesh());
        let y = self.upgrade_wall_dist()?;

        // 闭合函数求值
        let chi = closure::chi(&self.nu_tilda, &self.base.flow().nu);
        let fv1 = closure::fv1(&self.coeffs, &chi);

        // 速度梯度只算一次，Ω 与 S̃ 共用同一份
        let grads = self.gradient.velocity_gradient(&mesh, &self.base.flow().u);
        let mut omega = ScalarField::zeros(&mesh);
        for c in mesh.cells() {
            omega.cells_mut()[c] = grads[c].rotation_rate_magnitude();
        }
        omega.correct_boundary_conditions(&mesh);

        let stilda =
            closure::stilda(&self.coeffs, self.neg, &self.nu_tilda, &chi, &fv1, &omega, &y);
        let ft2 = closure::ft2(&self.coeffs, &chi);
        let fw = closure::fw(&self.coeffs, &self.nu_tilda, &stilda, &y);

        // 有效扩散系数 αρ·D̃
        let dnueff =
            closure::dnutilda_eff(&self.coeffs, &self.nu_tilda, &chi, &self.base.flow().nu);
        let gamma = dnueff
            .zip_with(&self.base.flow().alpha, |d, a| d * a)
            .zip_with(&self.base.flow().rho, |d, r| d * r);

        let grad_nt = self.gradient.scalar_gradient(&mesh, &self.nu_tilda);

        // 组装方程
        let mut eqn = ScalarTransportEqn::new(&mesh, &self.nu_tilda, "nuTilda");
        {
            let flow = self.base.flow();
            eqn.ddt(&flow.alpha, &flow.rho, flow.dt);
            eqn.div(&flow.alpha_rho_phi);
            eqn.laplacian(&gamma, FaceInterpolation::Arithmetic);

            // (Cb2/σ)αρ|∇ν̃|² 梯度平方项，显式入源
            let cb2_over_sigma = self.coeffs.cb2 / self.coeffs.sigma_nut;
            let mut rate = vec![0.0; mesh.n_cells()];
            for c in mesh.cells() {
                rate[c] = cb2_over_sigma
                    * flow.alpha.cells()[c]
                    * flow.rho.cells()[c]
                    * grad_nt[c].length_squared();
            }
            eqn.add_source(&rate);
        }

        let (prod, sink) = self.branch_sources(&stilda, &ft2, &fw, &omega, &y);
        eqn.add_source(&prod);
        eqn.add_implicit_sink(&sink);

        // 外部源项贡献
        self.fv_options
            .add_all(&mut eqn, &self.base.flow().alpha, &self.base.flow().rho, &self.nu_tilda);

        eqn.relax(self.relax);
        self.fv_options.constrain_all(&mut eqn);

        eqn.solve(&self.solver, &mut self.nu_tilda)?;
        self.fv_options.correct_all(&mut self.nu_tilda);

        if !self.neg {
            bound("nuTilda", &mut self.nu_tilda, 0.0);
        }
        self.nu_tilda.correct_boundary_conditions(&mesh);

        // 用更新后的场重算 fv1 并派生涡粘性
        let fv1 = closure::fv1(
            &self.coeffs,
            &closure::chi(&self.nu_tilda, &self.base.flow().nu),
        );
        self.correct_nut_with(&fv1);

        Ok(())
    }

    fn read(&mut self, config: &RasConfig) -> PhysicsResult<bool> {
        if !self.base.read(config) {
            return Ok(false);
        }

        self.coeffs.refresh(&config.coeffs)?;
        if let Some(neg) = config.coeffs.read_bool_if_present("neg")? {
            if neg != self.neg {
                log::info!("负 nuTilda 模式切换: {} -> {}", self.neg, neg);
            }
            self.neg = neg;
        }
        self.relax = config.relax_nu_tilda;
        self.solver = config.solver.clone();

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FvMesh;
    use crate::turbulence::FlowState;

    fn build_model(nu_tilda_init: Scalar, neg: bool) -> SpalartAllmaras {
        let mesh = Arc::new(FvMesh::rect(4, 4, 1.0, 1.0));
        let flow = FlowState::quiescent(&mesh, 1e-5, 1.0);
        let base = EddyViscosityBase::new(Arc::clone(&mesh), flow, true);

        let mut config = RasConfig::default();
        config.coeffs.set_bool("neg", neg);

        let mut store = FieldStore::new();
        store.insert(
            SpalartAllmaras::FIELD_NU_TILDA,
            ScalarField::uniform(&mesh, nu_tilda_init),
        );

        SpalartAllmaras::new(base, &mut config, &mut store).unwrap()
    }

    #[test]
    fn test_missing_initial_field() {
        let mesh = Arc::new(FvMesh::rect(2, 2, 1.0, 1.0));
        let flow = FlowState::quiescent(&mesh, 1e-5, 1.0);
        let base = EddyViscosityBase::new(mesh, flow, true);

        let mut config = RasConfig::default();
        let mut store = FieldStore::new();

        match SpalartAllmaras::new(base, &mut config, &mut store) {
            Err(PhysicsError::MissingField { name }) => assert_eq!(name, "nuTilda"),
            other => panic!("期望 MissingField, 得到 {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_construction_writes_coeff_defaults() {
        let mesh = Arc::new(FvMesh::rect(2, 2, 1.0, 1.0));
        let flow = FlowState::quiescent(&mesh, 1e-5, 1.0);
        let base = EddyViscosityBase::new(Arc::clone(&mesh), flow, true);

        let mut config = RasConfig::default();
        let mut store = FieldStore::new();
        store.insert(SpalartAllmaras::FIELD_NU_TILDA, ScalarField::zeros(&mesh));

        let model = SpalartAllmaras::new(base, &mut config, &mut store).unwrap();
        assert!((model.coeffs().kappa - 0.41).abs() < 1e-12);
        // 字典中已写回 13 个系数 + neg
        assert_eq!(config.coeffs.len(), 14);
        assert!(!model.allow_negative());
    }

    #[test]
    fn test_correct_nut_idempotent() {
        let mut model = build_model(3e-4, false);
        model.correct_nut();
        let first: Vec<Scalar> = model.nut().cells().to_vec();

        model.correct_nut();
        let second = model.nut().cells();

        for (a, b) in first.iter().zip(second.iter()) {
            assert!((a - b).abs() < 1e-16);
        }
    }

    #[test]
    fn test_nut_derivation_value() {
        // ν_t = ν̃·fv1(χ)
        let model = build_model(3e-5, false);
        let chi = 3e-5 / 1e-5;
        let cv1_3 = sa_foundation::pow3(model.coeffs().cv1);
        let fv1 = chi * chi * chi / (chi * chi * chi + cv1_3);
        let expected = 3e-5 * fv1;
        assert!((model.nut().cells()[0] - expected).abs() < 1e-14);
    }

    #[test]
    fn test_quiescent_zero_state_stays_zero() {
        // ν̃=0、零速度梯度：一步之后 ν̃ 与 ν_t 仍为零
        let mut model = build_model(0.0, false);
        model.correct().unwrap();

        for &v in model.nu_tilda().cells() {
            assert!(v.abs() < 1e-14);
        }
        for &v in model.nut().cells() {
            assert!(v.abs() < 1e-14);
        }
    }

    #[test]
    fn test_sign_consistency_after_correct() {
        // 初值带负值，非负模式一步后全场非负
        let mut model = build_model(1e-4, false);
        model.nu_tilda.cells_mut()[5] = -2e-4;
        model.nu_tilda.cells_mut()[9] = -1e-6;

        model.correct().unwrap();

        for &v in model.nu_tilda().cells() {
            assert!(v >= 0.0);
        }
        for &v in model.nut().cells() {
            assert!(v >= 0.0);
        }
    }

    #[test]
    fn test_turbulence_disabled_short_circuits() {
        let mesh = Arc::new(FvMesh::rect(2, 2, 1.0, 1.0));
        let flow = FlowState::quiescent(&mesh, 1e-5, 1.0);
        let base = EddyViscosityBase::new(Arc::clone(&mesh), flow, false);

        let mut config = RasConfig::default();
        let mut store = FieldStore::new();
        store.insert(SpalartAllmaras::FIELD_NU_TILDA, ScalarField::uniform(&mesh, 5e-4));

        let mut model = SpalartAllmaras::new(base, &mut config, &mut store).unwrap();
        let before = model.nu_tilda().cells().to_vec();
        model.correct().unwrap();

        // 短路返回：场不变
        assert_eq!(model.nu_tilda().cells(), &before[..]);
    }

    #[test]
    fn test_branch_sources_negative_cell() {
        // ν̃<0 的单元只贡献负分支：Cb1(1-Ct3)αρΩν̃ 与 -Cw1·αρν̃/y²，
        // 与 S̃、ft2、fw 的值无关
        let mut model = build_model(1e-4, true);
        let cell = 5;
        model.nu_tilda.cells_mut()[cell] = -2e-4;

        let mesh = Arc::clone(model.base().mesh());
        let y = WallDistance::compute(&mesh);

        let omega = ScalarField::uniform(&mesh, 3.0);
        // 给正分支量喂任意值，负分支结果必须不受影响
        let stilda = ScalarField::uniform(&mesh, 123.0);
        let ft2 = ScalarField::uniform(&mesh, 0.456);
        let fw = ScalarField::uniform(&mesh, 7.89);

        let (prod, sink) = model.branch_sources(&stilda, &ft2, &fw, &omega, &y);

        let c = model.coeffs();
        let nt = -2e-4;
        let y2 = sqr(y.cells()[cell]);
        let expected_prod = c.cb1 * (1.0 - c.ct3) * 3.0 * nt;
        let expected_sink = -c.cw1() * nt / y2;

        assert!((prod[cell] - expected_prod).abs() < 1e-12);
        assert!((sink[cell] - expected_sink).abs() < 1e-12);
        // 隐式汇系数为正，增强对角
        assert!(sink[cell] > 0.0);
    }

    #[test]
    fn test_branch_sources_positive_cell() {
        let model = build_model(2e-4, false);
        let cell = 6;

        let mesh = Arc::clone(model.base().mesh());
        let y = WallDistance::compute(&mesh);

        let omega = ScalarField::uniform(&mesh, 3.0);
        let stilda = ScalarField::uniform(&mesh, 2.0);
        let ft2 = ScalarField::uniform(&mesh, 0.1);
        let fw = ScalarField::uniform(&mesh, 1.5);

        let (prod, sink) = model.branch_sources(&stilda, &ft2, &fw, &omega, &y);

        let c = model.coeffs();
        let nt = 2e-4;
        let y2 = sqr(y.cells()[cell]);
        let expected_prod = c.cb1 * 0.9 * 2.0 * nt;
        let expected_sink = (c.cw1() * 1.5 - c.cb1 * 0.1 / sqr(c.kappa)) * nt / y2;

        assert!((prod[cell] - expected_prod).abs() < 1e-12);
        assert!((sink[cell] - expected_sink).abs() < 1e-12);
    }

    #[test]
    fn test_read_roundtrip() {
        let mut model = build_model(1e-4, false);
        let before = *model.coeffs();
        let cw1_before = model.coeffs().cw1();

        // 构造时的配置（系数已写回默认值）
        let mut config = RasConfig::default();
        let _ = SpalartAllmarasCoeffs::from_dict(&mut config.coeffs).unwrap();
        config.coeffs.set_bool("neg", false);

        assert!(model.read(&config).unwrap());
        assert_eq!(*model.coeffs(), before);
        assert!((model.coeffs().cw1() - cw1_before).abs() < 1e-15);
    }

    #[test]
    fn test_read_updates_coefficient() {
        let mut model = build_model(1e-4, false);

        let mut config = RasConfig::default();
        config.coeffs.set("Cb1", 0.2);
        assert!(model.read(&config).unwrap());

        assert!((model.coeffs().cb1 - 0.2).abs() < 1e-12);
        // 派生系数随依赖变化
        let expected_cw1 = 0.2 / sqr(0.41) + 1.622 / 0.66666;
        assert!((model.coeffs().cw1() - expected_cw1).abs() < 1e-10);
    }

    #[test]
    fn test_k_epsilon_zero_fields() {
        let model = build_model(1e-4, false);
        assert!(model.k().cells().iter().all(|&v| v == 0.0));
        assert!(model.epsilon().cells().iter().all(|&v| v == 0.0));
    }
}
