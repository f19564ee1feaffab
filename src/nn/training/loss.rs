/*
 * @Author       : 老董
 * @Date         : 2026-09-28
 * @Description  : Keras损失函数
 */

use crate::tensor::TensorSpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossFunction {
    #[serde(rename = "mean_squared_error")]
    MeanSquaredError,
    #[serde(rename = "mean_absolute_error")]
    MeanAbsoluteError,
    #[serde(rename = "mean_absolute_percentage_error")]
    MeanAbsolutePercentageError,
    #[serde(rename = "mean_squared_logarithmic_error")]
    MeanSquaredLogarithmicError,
    #[serde(rename = "kullback_leibler_divergence")]
    KullbackLeiblerDivergence,
    #[serde(rename = "cosine_proximity")]
    CosineProximity,
    #[serde(rename = "binary_crossentropy")]
    BinaryCrossEntropy,
    #[serde(rename = "categorical_crossentropy")]
    CategoricalCrossEntropy,
}

impl LossFunction {
    pub const ALL: &'static [Self] = &[
        Self::MeanSquaredError,
        Self::MeanAbsoluteError,
        Self::MeanAbsolutePercentageError,
        Self::MeanSquaredLogarithmicError,
        Self::KullbackLeiblerDivergence,
        Self::CosineProximity,
        Self::BinaryCrossEntropy,
        Self::CategoricalCrossEntropy,
    ];

    /// Keras中的标识
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::MeanSquaredError => "mean_squared_error",
            Self::MeanAbsoluteError => "mean_absolute_error",
            Self::MeanAbsolutePercentageError => "mean_absolute_percentage_error",
            Self::MeanSquaredLogarithmicError => "mean_squared_logarithmic_error",
            Self::KullbackLeiblerDivergence => "kullback_leibler_divergence",
            Self::CosineProximity => "cosine_proximity",
            Self::BinaryCrossEntropy => "binary_crossentropy",
            Self::CategoricalCrossEntropy => "categorical_crossentropy",
        }
    }

    /// 展示名
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MeanSquaredError => "Mean squared error",
            Self::MeanAbsoluteError => "Mean absolute error",
            Self::MeanAbsolutePercentageError => "Mean absolute percentage error",
            Self::MeanSquaredLogarithmicError => "Mean squared logarithmic error",
            Self::KullbackLeiblerDivergence => "Kullback-Leibler divergence",
            Self::CosineProximity => "Cosine proximity",
            Self::BinaryCrossEntropy => "Binary cross entropy",
            Self::CategoricalCrossEntropy => "Categorical cross entropy",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.identifier() == identifier)
    }

    /// 生成的Python表达式，如`keras.losses.mean_squared_error`
    pub fn to_python(&self) -> String {
        format!("keras.losses.{}", self.identifier())
    }

    /// 校验损失函数能否用于该输出
    pub fn check_target(&self, target: &TensorSpec) -> Result<(), String> {
        if !target.element_type().is_float() {
            return Err(format!(
                "损失函数`{}`要求输出`{}`为浮点类型",
                self.identifier(),
                target.name()
            ));
        }
        if matches!(self, Self::CategoricalCrossEntropy) && target.rank() == 0 {
            return Err(format!(
                "损失函数`{}`要求输出`{}`至少有1维（类别维）",
                self.identifier(),
                target.name()
            ));
        }
        Ok(())
    }
}
