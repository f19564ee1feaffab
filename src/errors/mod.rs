/*
 * @Author       : 老董
 * @Date         : 2026-09-13 18:35:01
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-01 17:14:55
 * @Description  : 层图相关的错误类型
 *
 * - `LayerGraphError`: 对外暴露的统一错误（携带出错层的身份信息）
 * - `LayerError`: 单个层内部校验时使用的轻量错误（不知道自己在图中的位置），
 *   由图级组件（推断器、序列化器等）补充层身份后转换为`LayerGraphError`
 */

use crate::nn::LayerId;
use thiserror::Error;

/// 可被包装进序列化/物化错误中的底层错误
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum LayerGraphError {
    #[error("层{name}（{layer}）的第{slot}个父节点槽位尚未绑定")]
    UnboundParent {
        layer: LayerId,
        name: String,
        slot: usize,
    },
    #[error("层{name}（{layer}）的输入张量规格无效：{message}")]
    InvalidTensorSpec {
        layer: LayerId,
        name: String,
        message: String,
    },
    #[error("层{name}（{layer}）的参数无效：{message}")]
    InvalidParameters {
        layer: LayerId,
        name: String,
        message: String,
    },
    #[error("层图中存在环，环经过{layer}")]
    CyclicGraph { layer: LayerId },
    #[error("未知的层类型`{0}`，是否缺少相应的扩展？")]
    UnknownLayerType(String),
    #[error("层类型`{0}`已被注册")]
    DuplicateLayerType(String),
    #[error("层{0}不存在")]
    LayerNotFound(LayerId),
    #[error("无效操作：{0}")]
    InvalidOperation(String),
    #[error("设置无效：{0}")]
    InvalidSettings(String),
    #[error("保存层图时出错：{message}")]
    GraphSerialization {
        message: String,
        #[source]
        source: BoxedError,
    },
    #[error("加载层图时出错：{message}")]
    GraphDeserialization {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },
    #[error("物化层{layer}时后端编译失败")]
    Materialization {
        layer: String,
        #[source]
        source: BoxedError,
    },
    #[error("训练配置无效：{0}")]
    InvalidTrainingConfig(String),
}

impl LayerGraphError {
    pub(crate) fn serialization(message: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::GraphSerialization {
            message: message.into(),
            source: source.into(),
        }
    }

    pub(crate) fn deserialization(message: impl Into<String>) -> Self {
        Self::GraphDeserialization {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn deserialization_caused_by(
        message: impl Into<String>,
        source: impl Into<BoxedError>,
    ) -> Self {
        Self::GraphDeserialization {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// 单个层在校验参数、校验输入或读写参数时产生的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    #[error("{0}")]
    InvalidParameters(String),
    #[error("{0}")]
    InvalidTensorSpec(String),
    #[error("{0}")]
    InvalidSettings(String),
}

impl LayerError {
    /// 补充层的身份信息，转换为图级错误
    pub(crate) fn at_layer(self, layer: LayerId, name: &str) -> LayerGraphError {
        match self {
            Self::InvalidParameters(message) => LayerGraphError::InvalidParameters {
                layer,
                name: name.to_string(),
                message,
            },
            Self::InvalidTensorSpec(message) => LayerGraphError::InvalidTensorSpec {
                layer,
                name: name.to_string(),
                message,
            },
            Self::InvalidSettings(message) => {
                LayerGraphError::InvalidSettings(format!("{name}（{layer}）：{message}"))
            }
        }
    }
}

/// 校验条件，不满足时返回`LayerError::InvalidTensorSpec`
pub(crate) fn check_input_spec(condition: bool, message: &str) -> Result<(), LayerError> {
    if condition {
        Ok(())
    } else {
        Err(LayerError::InvalidTensorSpec(message.to_string()))
    }
}

/// 校验条件，不满足时返回`LayerError::InvalidParameters`
pub(crate) fn check_parameter(condition: bool, message: impl FnOnce() -> String) -> Result<(), LayerError> {
    if condition {
        Ok(())
    } else {
        Err(LayerError::InvalidParameters(message()))
    }
}
