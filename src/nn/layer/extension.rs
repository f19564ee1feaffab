/*
 * @Author       : 老董
 * @Date         : 2026-10-01
 * @Description  : 扩展层（ExtensionLayer）：在内置层集合之外接入自定义的内部层
 *
 * 自定义层只需实现`TraitLayer + TraitInnerLayer`并可克隆，包装为`ExtensionLayer`后
 * 即可加入层图、参与推断、持久化与物化。持久化时写入的是自定义层自己的类型标记，
 * 解码时由注册表中以同一标记登记的构造函数重建。
 */

use crate::errors::LayerError;
use crate::nn::layer::{InferredTensor, TraitInnerLayer, TraitLayer};
use crate::nn::params::ParameterBlock;
use crate::tensor::TensorSpec;
use std::fmt;

/// 可被`ExtensionLayer`包装的自定义内部层
pub trait CustomInnerLayer: TraitLayer + TraitInnerLayer + fmt::Debug + Send + Sync {
    fn clone_box(&self) -> Box<dyn CustomInnerLayer>;
}

impl<T> CustomInnerLayer for T
where
    T: TraitLayer + TraitInnerLayer + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn clone_box(&self) -> Box<dyn CustomInnerLayer> {
        Box::new(self.clone())
    }
}

#[derive(Debug)]
pub struct ExtensionLayer(Box<dyn CustomInnerLayer>);

impl ExtensionLayer {
    pub fn new<L: CustomInnerLayer + 'static>(layer: L) -> Self {
        Self(Box::new(layer))
    }

    pub fn inner(&self) -> &dyn CustomInnerLayer {
        self.0.as_ref()
    }
}

impl Clone for ExtensionLayer {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

/// 类型标记相同且保存出的参数一致即视为相等
impl PartialEq for ExtensionLayer {
    fn eq(&self, other: &Self) -> bool {
        if self.0.type_tag() != other.0.type_tag() {
            return false;
        }
        let mut mine = ParameterBlock::new();
        let mut theirs = ParameterBlock::new();
        self.0.save_parameters(&mut mine).is_ok()
            && other.0.save_parameters(&mut theirs).is_ok()
            && mine == theirs
    }
}

impl TraitLayer for ExtensionLayer {
    fn type_tag(&self) -> &'static str {
        self.0.type_tag()
    }

    fn name_prefix(&self) -> &'static str {
        self.0.name_prefix()
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        self.0.validate_parameters()
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        self.0.save_parameters(params)
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        self.0.load_parameters(params)
    }

    fn populate_call(&self, positional: &mut Vec<String>, named: &mut Vec<(String, String)>) {
        self.0.populate_call(positional, named);
    }
}

impl TraitInnerLayer for ExtensionLayer {
    fn num_parents(&self) -> usize {
        self.0.num_parents()
    }

    fn num_outputs(&self) -> usize {
        self.0.num_outputs()
    }

    fn tensor_op_name(&self) -> &'static str {
        self.0.tensor_op_name()
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        self.0.validate_inputs(inputs)
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        self.0.infer_outputs(inputs)
    }
}
