// crates/sa_physics/src/turbulence/coeffs.rs

//! Spalart-Allmaras 模型系数
//!
//! 13 个独立系数从配置字典解析：缺失的取标准值并写回字典，
//! 存在的按用户值使用，类型不对的报配置错误。
//!
//! 派生系数 Cw1 = Cb1/κ² + (1+Cb2)/σ 只提供计算访问器，
//! 不落地存储，从根上消除过期风险。
//!
//! # 标准值
//!
//! | 系数 | 值 | 系数 | 值 |
//! |------|-----|------|-----|
//! | sigmaNut | 0.66666 | Cv1 | 7.1 |
//! | kappa | 0.41 | Cv2 | 0.7 |
//! | Cb1 | 0.1355 | Cv3 | 0.9 |
//! | Cb2 | 0.622 | Ct3 | 1.2 |
//! | Cw2 | 0.3 | Ct4 | 0.5 |
//! | Cw3 | 2.0 | Cn1 | 16.0 |
//! | Cs | 0.3 | | |

use crate::config::CoeffDict;
use crate::error::ConfigError;
use sa_foundation::{sqr, Scalar};
use serde::{Deserialize, Serialize};

/// Spalart-Allmaras 系数集
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpalartAllmarasCoeffs {
    /// 湍流 Prandtl 数 σ
    pub sigma_nut: Scalar,
    /// von Karman 常数 κ
    pub kappa: Scalar,
    /// 生成项系数
    pub cb1: Scalar,
    /// 梯度平方项系数
    pub cb2: Scalar,
    /// 壁面破坏函数系数
    pub cw2: Scalar,
    /// 壁面破坏函数系数
    pub cw3: Scalar,
    /// fv1 阻尼系数
    pub cv1: Scalar,
    /// S̃ 负分支正则化系数
    pub cv2: Scalar,
    /// S̃ 负分支正则化系数
    pub cv3: Scalar,
    /// ft2 幅值系数
    pub ct3: Scalar,
    /// ft2 衰减系数
    pub ct4: Scalar,
    /// 负 χ 扩散延拓系数
    pub cn1: Scalar,
    /// S̃ 下限系数（非负模式）
    pub cs: Scalar,
}

impl Default for SpalartAllmarasCoeffs {
    fn default() -> Self {
        Self {
            sigma_nut: 0.66666,
            kappa: 0.41,
            cb1: 0.1355,
            cb2: 0.622,
            cw2: 0.3,
            cw3: 2.0,
            cv1: 7.1,
            cv2: 0.7,
            cv3: 0.9,
            ct3: 1.2,
            ct4: 0.5,
            cn1: 16.0,
            cs: 0.3,
        }
    }
}

impl SpalartAllmarasCoeffs {
    /// 从字典解析，缺失项写回标准值
    pub fn from_dict(dict: &mut CoeffDict) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            sigma_nut: dict.lookup_or_insert("sigmaNut", d.sigma_nut)?,
            kappa: dict.lookup_or_insert("kappa", d.kappa)?,
            cb1: dict.lookup_or_insert("Cb1", d.cb1)?,
            cb2: dict.lookup_or_insert("Cb2", d.cb2)?,
            cw2: dict.lookup_or_insert("Cw2", d.cw2)?,
            cw3: dict.lookup_or_insert("Cw3", d.cw3)?,
            cv1: dict.lookup_or_insert("Cv1", d.cv1)?,
            cv2: dict.lookup_or_insert("Cv2", d.cv2)?,
            cv3: dict.lookup_or_insert("Cv3", d.cv3)?,
            ct3: dict.lookup_or_insert("Ct3", d.ct3)?,
            ct4: dict.lookup_or_insert("Ct4", d.ct4)?,
            cn1: dict.lookup_or_insert("Cn1", d.cn1)?,
            cs: dict.lookup_or_insert("Cs", d.cs)?,
        })
    }

    /// 重读字典中存在的系数，缺失项保持当前值
    pub fn refresh(&mut self, dict: &CoeffDict) -> Result<(), ConfigError> {
        if let Some(v) = dict.read_if_present("sigmaNut")? {
            self.sigma_nut = v;
        }
        if let Some(v) = dict.read_if_present("kappa")? {
            self.kappa = v;
        }
        if let Some(v) = dict.read_if_present("Cb1")? {
            self.cb1 = v;
        }
        if let Some(v) = dict.read_if_present("Cb2")? {
            self.cb2 = v;
        }
        if let Some(v) = dict.read_if_present("Cw2")? {
            self.cw2 = v;
        }
        if let Some(v) = dict.read_if_present("Cw3")? {
            self.cw3 = v;
        }
        if let Some(v) = dict.read_if_present("Cv1")? {
            self.cv1 = v;
        }
        if let Some(v) = dict.read_if_present("Cv2")? {
            self.cv2 = v;
        }
        if let Some(v) = dict.read_if_present("Cv3")? {
            self.cv3 = v;
        }
        if let Some(v) = dict.read_if_present("Ct3")? {
            self.ct3 = v;
        }
        if let Some(v) = dict.read_if_present("Ct4")? {
            self.ct4 = v;
        }
        if let Some(v) = dict.read_if_present("Cn1")? {
            self.cn1 = v;
        }
        if let Some(v) = dict.read_if_present("Cs")? {
            self.cs = v;
        }
        Ok(())
    }

    /// 派生系数 Cw1 = Cb1/κ² + (1+Cb2)/σ
    ///
    /// 永远按当前依赖值计算，无存储副本。
    #[inline]
    pub fn cw1(&self) -> Scalar {
        self.cb1 / sqr(self.kappa) + (1.0 + self.cb2) / self.sigma_nut
    }

    /// 输出生效系数（构造期报告）
    pub fn log_report(&self, model: &str) {
        log::info!(
            "{} 系数: sigmaNut={} kappa={} Cb1={} Cb2={} Cw1={:.6} Cw2={} Cw3={} \
             Cv1={} Cv2={} Cv3={} Ct3={} Ct4={} Cn1={} Cs={}",
            model,
            self.sigma_nut,
            self.kappa,
            self.cb1,
            self.cb2,
            self.cw1(),
            self.cw2,
            self.cw3,
            self.cv1,
            self.cv2,
            self.cv3,
            self.ct3,
            self.ct4,
            self.cn1,
            self.cs
        );
    }
}
