// crates/sa_physics/src/error.rs

//! 错误类型
//!
//! 本模块不做任何本地恢复：所有失败一律向调用方传播。
//! 配置类失败在构造期出现，求解类失败在 `correct()` 内出现并终止当前步。

use crate::linalg::SolverStatus;
use sa_foundation::Scalar;
use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },
}

/// 物理层结果类型
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// 物理层错误
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// 配置错误（构造期）
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 缺失必需场（如初始 nuTilda 不存在）
    #[error("缺失必需场: {name}")]
    MissingField {
        /// 场名
        name: String,
    },

    /// 线性求解失败（对调用步是致命的，不做重试）
    #[error("线性求解失败 ({solver}): {status:?}, {iterations} 次迭代, 残差 {residual:.3e}")]
    Solver {
        /// 求解器名称
        solver: &'static str,
        /// 终止状态
        status: SolverStatus,
        /// 已执行迭代数
        iterations: usize,
        /// 最终残差范数
        residual: Scalar,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "kappa".to_string(),
            value: "\"abc\"".to_string(),
            reason: "必须为数值".to_string(),
        };
        assert!(err.to_string().contains("kappa"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = PhysicsError::MissingField { name: "nuTilda".to_string() };
        assert!(err.to_string().contains("nuTilda"));
    }
}
