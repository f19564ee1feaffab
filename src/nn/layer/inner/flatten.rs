/*
 * @Author       : 老董
 * @Date         : 2026-08-07
 * @Description  : 展平层（Flatten）：把除批维度外的所有维度合并为1维
 */

use crate::errors::{LayerError, check_input_spec};
use crate::nn::layer::{InferredTensor, TraitInnerLayer, TraitLayer, single_input};
use crate::nn::params::ParameterBlock;
use crate::tensor::{TensorSpec, num_elements};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenLayer;

impl FlattenLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.Flatten";

    pub fn new() -> Self {
        Self
    }
}

impl TraitLayer for FlattenLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "flatten"
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

impl TraitInnerLayer for FlattenLayer {
    fn num_parents(&self) -> usize {
        1
    }

    fn tensor_op_name(&self) -> &'static str {
        "Reshape"
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        let input = single_input(inputs)?;
        check_input_spec(input.rank() >= 1, "Flatten层的输入至少需要1维")?;
        num_elements(input.shape())
            .map(|_| ())
            .map_err(LayerError::InvalidTensorSpec)
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        let input = single_input(inputs)?;
        let total = num_elements(input.shape()).map_err(LayerError::InvalidTensorSpec)?;
        Ok(vec![InferredTensor::new(
            vec![total],
            input.element_type(),
        )])
    }
}
