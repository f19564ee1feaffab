/*
 * @Author       : 老董
 * @Date         : 2026-10-07
 * @Description  : Keras优化器及其超参数
 */

use crate::utils::python;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Optimizer {
    /// RMSProp：学习率、衰减系数rho、数值稳定项、学习率衰减
    RmsProp {
        learning_rate: f64,
        rho: f64,
        epsilon: f64,
        decay: f64,
    },
    /// 随机梯度下降：θ = θ - α * ∇θ（可选动量与Nesterov）
    Sgd {
        learning_rate: f64,
        momentum: f64,
        decay: f64,
        nesterov: bool,
    },
    Adam {
        learning_rate: f64,
        beta_1: f64,
        beta_2: f64,
        epsilon: f64,
        decay: f64,
    },
}

impl Optimizer {
    pub fn rms_prop() -> Self {
        Self::RmsProp {
            learning_rate: 0.001,
            rho: 0.9,
            epsilon: 1e-7,
            decay: 0.0,
        }
    }

    pub fn sgd() -> Self {
        Self::Sgd {
            learning_rate: 0.01,
            momentum: 0.0,
            decay: 0.0,
            nesterov: false,
        }
    }

    pub fn adam() -> Self {
        Self::Adam {
            learning_rate: 0.001,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-7,
            decay: 0.0,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::RmsProp { .. } => "RMSProp",
            Self::Sgd { .. } => "Stochastic gradient descent",
            Self::Adam { .. } => "Adam",
        }
    }

    pub const fn keras_class(&self) -> &'static str {
        match self {
            Self::RmsProp { .. } => "keras.optimizers.RMSprop",
            Self::Sgd { .. } => "keras.optimizers.SGD",
            Self::Adam { .. } => "keras.optimizers.Adam",
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match *self {
            Self::RmsProp { learning_rate, .. }
            | Self::Sgd { learning_rate, .. }
            | Self::Adam { learning_rate, .. } => learning_rate,
        }
    }

    /// 校验超参数
    pub fn validate(&self) -> Result<(), String> {
        let positive = |name: &str, v: f64| {
            if v > 0.0 { Ok(()) } else { Err(format!("{name}必须大于0，实际为{v}")) }
        };
        let non_negative = |name: &str, v: f64| {
            if v >= 0.0 { Ok(()) } else { Err(format!("{name}不能为负数，实际为{v}")) }
        };
        let unit = |name: &str, v: f64| {
            if (0.0..1.0).contains(&v) { Ok(()) } else { Err(format!("{name}必须在[0, 1)之间，实际为{v}")) }
        };
        match *self {
            Self::RmsProp { learning_rate, rho, epsilon, decay } => {
                positive("学习率", learning_rate)?;
                non_negative("rho", rho)?;
                positive("epsilon", epsilon)?;
                non_negative("decay", decay)
            }
            Self::Sgd { learning_rate, momentum, decay, .. } => {
                positive("学习率", learning_rate)?;
                non_negative("动量", momentum)?;
                non_negative("decay", decay)
            }
            Self::Adam { learning_rate, beta_1, beta_2, epsilon, decay } => {
                positive("学习率", learning_rate)?;
                unit("beta_1", beta_1)?;
                unit("beta_2", beta_2)?;
                positive("epsilon", epsilon)?;
                non_negative("decay", decay)
            }
        }
    }

    /// 生成的Python构造表达式，如`keras.optimizers.SGD(lr=0.01, momentum=0.0, ...)`
    pub fn to_python(&self) -> String {
        let f = python::float_to_python;
        let args = match *self {
            Self::RmsProp { learning_rate, rho, epsilon, decay } => format!(
                "lr={}, rho={}, epsilon={}, decay={}",
                f(learning_rate), f(rho), f(epsilon), f(decay)
            ),
            Self::Sgd { learning_rate, momentum, decay, nesterov } => format!(
                "lr={}, momentum={}, decay={}, nesterov={}",
                f(learning_rate), f(momentum), f(decay), python::bool_to_python(nesterov)
            ),
            Self::Adam { learning_rate, beta_1, beta_2, epsilon, decay } => format!(
                "lr={}, beta_1={}, beta_2={}, epsilon={}, decay={}",
                f(learning_rate), f(beta_1), f(beta_2), f(epsilon), f(decay)
            ),
        };
        format!("{}({args})", self.keras_class())
    }
}
