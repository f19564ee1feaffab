/*
 * @Author       : 老董
 * @Date         : 2026-09-10
 * @Description  : 激活层：逐元素应用激活函数，形状与类型不变
 */

use crate::errors::{LayerError, check_input_spec};
use crate::nn::layer::{Activation, InferredTensor, TraitInnerLayer, TraitLayer, single_input};
use crate::nn::params::ParameterBlock;
use crate::tensor::TensorSpec;
use crate::utils::python;

const CFG_KEY_ACTIVATION: &str = "activation";

#[derive(Debug, Clone, PartialEq)]
pub struct ActivationLayer {
    activation: Activation,
}

impl Default for ActivationLayer {
    fn default() -> Self {
        Self {
            activation: Activation::Linear,
        }
    }
}

impl ActivationLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.Activation";

    pub fn new(activation: Activation) -> Self {
        Self { activation }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl TraitLayer for ActivationLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "activation"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        Ok(())
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        params.add_string(CFG_KEY_ACTIVATION, self.activation.keras_name());
        Ok(())
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        self.activation = Activation::from_keras_name(&params.get_string(CFG_KEY_ACTIVATION)?)?;
        Ok(())
    }

    fn populate_call(&self, positional: &mut Vec<String>, _named: &mut Vec<(String, String)>) {
        positional.push(python::str_to_python(self.activation.keras_name()));
    }
}

impl TraitInnerLayer for ActivationLayer {
    fn num_parents(&self) -> usize {
        1
    }

    fn tensor_op_name(&self) -> &'static str {
        self.activation.tf_op_name()
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        let input = single_input(inputs)?;
        check_input_spec(
            input.element_type().is_float(),
            "激活层的输入必须是浮点类型",
        )
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        let input = single_input(inputs)?;
        Ok(vec![InferredTensor::new(
            input.shape().to_vec(),
            input.element_type(),
        )])
    }
}
