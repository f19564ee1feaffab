/*
 * @Author       : 老董
 * @Date         : 2026-09-13
 * @Description  : 逐元素相加层（Add）
 *
 * 两个父节点的秩必须相同，对应维度兼容（都已知时必须相等），元素类型必须相同。
 */

use crate::errors::{LayerError, check_input_spec};
use crate::nn::layer::{InferredTensor, TraitInnerLayer, TraitLayer, common_element_type, merge_dim};
use crate::nn::params::ParameterBlock;
use crate::tensor::{Shape, TensorSpec, format_shape};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddLayer;

impl AddLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.Add";

    pub fn new() -> Self {
        Self
    }

    fn merged_shape(inputs: &[&TensorSpec]) -> Result<Shape, LayerError> {
        let (first, rest) = inputs
            .split_first()
            .ok_or_else(|| LayerError::InvalidTensorSpec("Add层缺少输入".to_string()))?;
        let mut shape = first.shape().to_vec();
        for other in rest {
            check_input_spec(
                other.rank() == shape.len(),
                "Add层的所有输入必须具有相同的秩",
            )?;
            for (dim, &incoming) in shape.iter_mut().zip(other.shape()) {
                *dim = merge_dim(*dim, incoming).map_err(|e| {
                    LayerError::InvalidTensorSpec(format!(
                        "Add层输入形状[{}]与[{}]不兼容：{}",
                        format_shape(first.shape()),
                        format_shape(other.shape()),
                        e
                    ))
                })?;
            }
        }
        Ok(shape)
    }
}

impl TraitLayer for AddLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "add"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        Ok(())
    }

    fn save_parameters(&self, _params: &mut ParameterBlock) -> Result<(), LayerError> {
        Ok(())
    }

    fn load_parameters(&mut self, _params: &ParameterBlock) -> Result<(), LayerError> {
        Ok(())
    }

    fn populate_call(&self, _positional: &mut Vec<String>, _named: &mut Vec<(String, String)>) {}
}

impl TraitInnerLayer for AddLayer {
    fn num_parents(&self) -> usize {
        2
    }

    fn tensor_op_name(&self) -> &'static str {
        "add"
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        common_element_type(inputs)?;
        Self::merged_shape(inputs).map(|_| ())
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        Ok(vec![InferredTensor::new(
            Self::merged_shape(inputs)?,
            common_element_type(inputs)?,
        )])
    }
}
