// crates/sa_physics/src/turbulence/closure.rs

//! 闭合函数库
//!
//! Spalart-Allmaras 模型的全部代数闭合函数。所有函数对场状态
//! 与系数是纯函数：输入只读，返回新场，不触碰任何模型状态。
//! 单元值与边界面值一并计算。
//!
//! # 函数一览
//!
//! ```text
//! χ    = ν̃/ν
//! fv1  = χ³/(χ³ + Cv1³)
//! fv2  = 1 - χ/(1 + χ·fv1)
//! ft2  = Ct3·exp(-Ct4·χ²)
//! S̃    = Ω 与 S̄ = fv2·ν̃/(κy)² 的组合（按模式分支）
//! fw   = g·((1+Cw3⁶)/(g⁶+Cw3⁶))^(1/6),  g = r + Cw2(r⁶-r)
//! D̃    = (ν̃·fn + ν)/σ
//! ```

use super::coeffs::SpalartAllmarasCoeffs;
use crate::field::ScalarField;
use crate::walldist::WallDistance;
use sa_foundation::scalar::consts::SMALL;
use sa_foundation::{pow3, pow6, sqr, Scalar};

/// 粘性比 χ = ν̃/ν
pub fn chi(nu_tilda: &ScalarField, nu: &ScalarField) -> ScalarField {
    nu_tilda.zip_with(nu, |nt, n| nt / n)
}

/// 近壁阻尼函数 fv1 = χ³/(χ³ + Cv1³)
pub fn fv1(c: &SpalartAllmarasCoeffs, chi: &ScalarField) -> ScalarField {
    let cv1_3 = pow3(c.cv1);
    chi.map(|x| {
        let x3 = pow3(x);
        x3 / (x3 + cv1_3)
    })
}

/// 阻尼函数 fv2 = 1 - χ/(1 + χ·fv1)
pub fn fv2(chi: &ScalarField, fv1: &ScalarField) -> ScalarField {
    chi.zip_with(fv1, |x, f1| 1.0 - x / (1.0 + x * f1))
}

/// 层流抑制函数 ft2 = Ct3·exp(-Ct4·χ²)
pub fn ft2(c: &SpalartAllmarasCoeffs, chi: &ScalarField) -> ScalarField {
    let (ct3, ct4) = (c.ct3, c.ct4);
    chi.map(|x| ct3 * (-ct4 * sqr(x)).exp())
}

/// 修正涡量 S̃
///
/// S̄ = fv2·ν̃/(κy)²。负模式下按 Cv2·Ω + S̄ 的符号在
/// `Ω + S̄` 与正则化负分支之间逐点选择；非负模式下取
/// `max(Ω + S̄, Cs·Ω)` 下限。
pub fn stilda(
    c: &SpalartAllmarasCoeffs,
    allow_negative: bool,
    nu_tilda: &ScalarField,
    chi: &ScalarField,
    fv1: &ScalarField,
    omega: &ScalarField,
    y: &WallDistance,
) -> ScalarField {
    let fv2 = fv2(chi, fv1);

    let eval = |nt: Scalar, f2: Scalar, om: Scalar, yy: Scalar| -> Scalar {
        let sbar = f2 * nt / sqr(c.kappa * yy.max(SMALL));
        if allow_negative {
            if c.cv2 * om + sbar >= 0.0 {
                om + sbar
            } else {
                // S̄ 强负时的正则化分支，分母在该分支内恒正
                om + om * (sqr(c.cv2) * om + c.cv3 * sbar)
                    / ((c.cv3 - 2.0 * c.cv2) * om - sbar)
            }
        } else {
            (om + sbar).max(c.cs * om)
        }
    };

    let mut out = nu_tilda.map(|_| 0.0);
    for i in 0..out.n_cells() {
        out.cells_mut()[i] = eval(
            nu_tilda.cells()[i],
            fv2.cells()[i],
            omega.cells()[i],
            y.cells()[i],
        );
    }
    for b in 0..out.boundary().len() {
        out.boundary_mut()[b] = eval(
            nu_tilda.boundary()[b],
            fv2.boundary()[b],
            omega.boundary()[b],
            y.boundary()[b],
        );
    }
    out
}

/// 壁面破坏函数 fw
///
/// r = min(ν̃/(max(S̃, SMALL)·(κy)²), 10)，边界面 r 强制为 0。
pub fn fw(
    c: &SpalartAllmarasCoeffs,
    nu_tilda: &ScalarField,
    stilda: &ScalarField,
    y: &WallDistance,
) -> ScalarField {
    let r_of = |nt: Scalar, st: Scalar, yy: Scalar| -> Scalar {
        (nt / (st.max(SMALL) * sqr(c.kappa * yy.max(SMALL)))).min(10.0)
    };

    let mut r = nu_tilda.map(|_| 0.0);
    for i in 0..r.n_cells() {
        r.cells_mut()[i] = r_of(nu_tilda.cells()[i], stilda.cells()[i], y.cells()[i]);
    }
    // 壁面边界处理：边界面 r 置零
    for v in r.boundary_mut() {
        *v = 0.0;
    }

    let (cw2, cw3_6) = (c.cw2, pow6(c.cw3));
    r.map(|rv| {
        let g = rv + cw2 * (pow6(rv) - rv);
        g * ((1.0 + cw3_6) / (pow6(g) + cw3_6)).powf(1.0 / 6.0)
    })
}

/// 有效扩散系数 D̃ = (ν̃·fn + ν)/σ
///
/// fn 在 χ ≥ 0 时为 1，χ < 0 时取 (Cn1+χ³)/(Cn1-χ³) 光滑延拓，
/// 保证负 ν̃ 下扩散系数不变号。
pub fn dnutilda_eff(
    c: &SpalartAllmarasCoeffs,
    nu_tilda: &ScalarField,
    chi: &ScalarField,
    nu: &ScalarField,
) -> ScalarField {
    let cn1 = c.cn1;
    let sigma = c.sigma_nut;

    let fn_of = |x: Scalar| -> Scalar {
        if x >= 0.0 {
            1.0
        } else {
            (cn1 + pow3(x)) / (cn1 - pow3(x))
        }
    };

    let with_fn = nu_tilda.zip_with(chi, |nt, x| nt * fn_of(x));
    with_fn.zip_with(nu, |a, n| (a + n) / sigma)
}
