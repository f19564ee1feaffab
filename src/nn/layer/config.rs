/*
 * @Author       : 老董
 * @Date         : 2026-08-12 20:11:08
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-04 13:15:33
 * @Description  : 层参数中使用的可选值（激活函数、初始化器）
 */

use crate::errors::LayerError;

macro_rules! keras_choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $keras:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Keras中的标识
            pub const fn keras_name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $keras),+
                }
            }

            pub fn from_keras_name(name: &str) -> Result<Self, LayerError> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.keras_name() == name)
                    .ok_or_else(|| {
                        LayerError::InvalidSettings(format!(
                            "`{}`不是有效的{}",
                            name,
                            stringify!($name)
                        ))
                    })
            }
        }
    };
}

keras_choice!(
    /// 激活函数
    Activation {
        Elu => "elu",
        HardSigmoid => "hard_sigmoid",
        Linear => "linear",
        Relu => "relu",
        Selu => "selu",
        Sigmoid => "sigmoid",
        Softmax => "softmax",
        Softplus => "softplus",
        Softsign => "softsign",
        Tanh => "tanh",
    }
);

impl Activation {
    /// TensorFlow中对应的算子名（用于生成张量名）
    pub const fn tf_op_name(&self) -> &'static str {
        match self {
            Self::Elu => "Elu",
            Self::HardSigmoid => "clip_by_value",
            Self::Linear => "Identity",
            Self::Relu => "Relu",
            Self::Selu => "mul_1",
            Self::Sigmoid => "Sigmoid",
            Self::Softmax => "Softmax",
            Self::Softplus => "Softplus",
            Self::Softsign => "Softsign",
            Self::Tanh => "Tanh",
        }
    }
}

keras_choice!(
    /// 权重初始化器
    Initializer {
        Zeros => "zeros",
        Ones => "ones",
        RandomUniform => "random_uniform",
        RandomNormal => "random_normal",
        GlorotUniform => "glorot_uniform",
        GlorotNormal => "glorot_normal",
        HeUniform => "he_uniform",
        HeNormal => "he_normal",
        LecunUniform => "lecun_uniform",
        Orthogonal => "orthogonal",
    }
);
