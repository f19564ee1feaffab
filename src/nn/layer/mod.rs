/*
 * @Author       : 老董
 * @Date         : 2026-10-07
 * @Description  : Layer 模块 - 层图中的顶点
 *
 * 两类能力集：
 * - 输入层（TraitInputLayer）：没有父节点，提供张量规格的来源
 *   （用户声明的新输入，或某个已物化基础网络的输出）
 * - 内部层（TraitInnerLayer）：有序的父节点槽位 + 纯函数的形状/类型推断规则
 * 两者共享 TraitLayer：类型标记、参数校验、参数读写、后端调用参数
 * 内置层之外的内部层通过`ExtensionLayer`包装接入。
 */

mod config;
mod extension;
mod inner;
mod input;

pub use config::{Activation, Initializer};
pub use extension::{CustomInnerLayer, ExtensionLayer};
pub use inner::{
    ActivationLayer, AddLayer, ConcatenateLayer, DenseLayer, DropoutLayer, EmbeddingLayer,
    FlattenLayer, LstmLayer, ReshapeLayer,
};
pub use input::{BaseNetworkOutputLayer, DefaultInputLayer};

use crate::errors::LayerError;
use crate::nn::network::BaseNetwork;
use crate::nn::params::ParameterBlock;
use crate::tensor::{DimensionOrder, ElementType, Shape, TensorSpec};
use enum_dispatch::enum_dispatch;
use std::sync::Arc;

#[enum_dispatch]
#[derive(Debug, Clone, PartialEq)]
pub enum InputLayerType {
    DefaultInputLayer,
    BaseNetworkOutputLayer,
}

#[enum_dispatch]
#[derive(Debug, Clone, PartialEq)]
pub enum InnerLayerType {
    DenseLayer,
    AddLayer,
    ConcatenateLayer,
    EmbeddingLayer,
    ActivationLayer,
    DropoutLayer,
    FlattenLayer,
    ReshapeLayer,
    LstmLayer,
    /// 注册表之外的自定义层
    ExtensionLayer,
}

/// 所有层共有的能力
#[enum_dispatch(InputLayerType, InnerLayerType)]
pub trait TraitLayer {
    /// 持久化时使用的类型标记（注册表据此重建层）
    fn type_tag(&self) -> &'static str;

    /// Keras风格的命名前缀，如"dense"，生成的张量名为"dense_1/BiasAdd:0"
    fn name_prefix(&self) -> &'static str;

    /// 校验参数本身（与图上下文无关）
    fn validate_parameters(&self) -> Result<(), LayerError>;

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError>;

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError>;

    /// 后端调用参数：位置参数与命名参数（均为Python字面量）
    fn populate_call(&self, positional: &mut Vec<String>, named: &mut Vec<(String, String)>);
}

/// 输入层张量规格的来源
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource<'a> {
    /// 用户声明的新网络输入（名称由推断器分配）
    Declared {
        shape: Shape,
        batch_size: Option<u64>,
        element_type: ElementType,
        dimension_order: DimensionOrder,
    },
    /// 引用某个基础网络的第`output_index`个输出（规格原样复制）
    BaseNetwork {
        network: &'a Arc<BaseNetwork>,
        output_index: usize,
    },
}

#[enum_dispatch(InputLayerType)]
pub trait TraitInputLayer {
    fn input_source(&self) -> Result<InputSource<'_>, LayerError>;
}

/// 内部层推断出的单个输出（名称、批大小由推断器补全）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredTensor {
    pub shape: Shape,
    pub element_type: ElementType,
}

impl InferredTensor {
    pub fn new(shape: Shape, element_type: ElementType) -> Self {
        Self {
            shape,
            element_type,
        }
    }
}

#[enum_dispatch(InnerLayerType)]
pub trait TraitInnerLayer {
    /// 父节点槽位数（加入层图时据此分配槽位）
    fn num_parents(&self) -> usize;

    fn num_outputs(&self) -> usize {
        1
    }

    /// 输出张量名中的算子部分，如Dense的"BiasAdd"
    fn tensor_op_name(&self) -> &'static str;

    /// 校验父节点的输出规格（元素类型、形状约束）
    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError>;

    /// 根据父节点规格与自身参数推断输出；必须是无副作用的纯函数，
    /// 调用前输入已通过`validate_inputs`
    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError>;
}

/// 层图中的一个层（输入层或内部层）
#[derive(Debug, Clone, PartialEq)]
pub enum LayerNode {
    Input(InputLayerType),
    Inner(InnerLayerType),
}

impl LayerNode {
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    pub fn as_input(&self) -> Option<&InputLayerType> {
        match self {
            Self::Input(layer) => Some(layer),
            Self::Inner(_) => None,
        }
    }

    pub fn as_inner(&self) -> Option<&InnerLayerType> {
        match self {
            Self::Inner(layer) => Some(layer),
            Self::Input(_) => None,
        }
    }

    pub fn as_inner_mut(&mut self) -> Option<&mut InnerLayerType> {
        match self {
            Self::Inner(layer) => Some(layer),
            Self::Input(_) => None,
        }
    }

    pub fn as_layer(&self) -> &dyn TraitLayer {
        match self {
            Self::Input(layer) => layer,
            Self::Inner(layer) => layer,
        }
    }

    pub fn as_layer_mut(&mut self) -> &mut dyn TraitLayer {
        match self {
            Self::Input(layer) => layer,
            Self::Inner(layer) => layer,
        }
    }

    /// 父节点槽位数（输入层为0）
    pub fn num_parents(&self) -> usize {
        self.as_inner().map_or(0, TraitInnerLayer::num_parents)
    }

    pub fn type_tag(&self) -> &'static str {
        self.as_layer().type_tag()
    }
}

macro_rules! impl_into_layer_node {
    ($variant:ident: $($layer:ident),+ $(,)?) => {
        $(
            impl From<$layer> for LayerNode {
                fn from(layer: $layer) -> Self {
                    Self::$variant(layer.into())
                }
            }
        )+
    };
}

impl_into_layer_node!(Input: DefaultInputLayer, BaseNetworkOutputLayer);
impl_into_layer_node!(
    Inner: DenseLayer,
    AddLayer,
    ConcatenateLayer,
    EmbeddingLayer,
    ActivationLayer,
    DropoutLayer,
    FlattenLayer,
    ReshapeLayer,
    LstmLayer,
    ExtensionLayer,
);

// ========== 供各具体层使用的公共校验 ==========

/// 一元层：取唯一的输入
pub(crate) fn single_input<'a>(inputs: &[&'a TensorSpec]) -> Result<&'a TensorSpec, LayerError> {
    match inputs {
        [input] => Ok(input),
        _ => Err(LayerError::InvalidTensorSpec(format!(
            "需要1个输入，实际为{}个",
            inputs.len()
        ))),
    }
}

/// 多个输入的元素类型必须一致，返回该类型
pub(crate) fn common_element_type(inputs: &[&TensorSpec]) -> Result<ElementType, LayerError> {
    let first = inputs
        .first()
        .ok_or_else(|| LayerError::InvalidTensorSpec("至少需要1个输入".to_string()))?
        .element_type();
    if inputs.iter().any(|i| i.element_type() != first) {
        return Err(LayerError::InvalidTensorSpec(format!(
            "所有输入的元素类型必须相同，实际为[{}]",
            inputs
                .iter()
                .map(|i| i.element_type().name())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    Ok(first)
}

/// 合并两个可能未知的维度：都已知时必须相等
pub(crate) fn merge_dim(a: Option<u64>, b: Option<u64>) -> Result<Option<u64>, String> {
    match (a, b) {
        (Some(x), Some(y)) if x != y => Err(format!("维度{x}与{y}不兼容")),
        (Some(x), _) | (_, Some(x)) => Ok(Some(x)),
        (None, None) => Ok(None),
    }
}

/// 层参数中常用的正整数范围
pub(crate) const MAX_UNITS: u64 = 1_000_000;

#[cfg(test)]
mod tests;
