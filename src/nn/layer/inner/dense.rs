/*
 * @Author       : 老董
 * @Date         : 2026-10-13
 * @Description  : 全连接层（Dense）
 *
 * 输出形状：把输入的最后一维替换为`units`，其余维度不变。
 * 例如：[?, 10] -> units=4 -> [?, 4]
 */

use crate::errors::{LayerError, check_input_spec, check_parameter};
use crate::nn::layer::{
    Activation, InferredTensor, Initializer, MAX_UNITS, TraitInnerLayer, TraitLayer, single_input,
};
use crate::nn::params::ParameterBlock;
use crate::tensor::TensorSpec;
use crate::utils::python;

const CFG_KEY_UNITS: &str = "units";
const CFG_KEY_ACTIVATION: &str = "activation";
const CFG_KEY_USE_BIAS: &str = "use_bias";
const CFG_KEY_KERNEL_INITIALIZER: &str = "kernel_initializer";
const CFG_KEY_BIAS_INITIALIZER: &str = "bias_initializer";

#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    units: u64,
    activation: Activation,
    use_bias: bool,
    kernel_initializer: Initializer,
    bias_initializer: Initializer,
}

impl Default for DenseLayer {
    fn default() -> Self {
        Self {
            units: 1,
            activation: Activation::Linear,
            use_bias: true,
            kernel_initializer: Initializer::GlorotUniform,
            bias_initializer: Initializer::Zeros,
        }
    }
}

impl DenseLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.Dense";

    pub fn new(units: u64) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = use_bias;
        self
    }

    pub fn with_initializers(mut self, kernel: Initializer, bias: Initializer) -> Self {
        self.kernel_initializer = kernel;
        self.bias_initializer = bias;
        self
    }

    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl TraitLayer for DenseLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "dense"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        check_parameter((1..=MAX_UNITS).contains(&self.units), || {
            format!("单元数必须在1到{}之间，实际为{}", MAX_UNITS, self.units)
        })
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        params.add_u64(CFG_KEY_UNITS, self.units)?;
        params.add_string(CFG_KEY_ACTIVATION, self.activation.keras_name());
        params.add_bool(CFG_KEY_USE_BIAS, self.use_bias);
        params.add_string(CFG_KEY_KERNEL_INITIALIZER, self.kernel_initializer.keras_name());
        params.add_string(CFG_KEY_BIAS_INITIALIZER, self.bias_initializer.keras_name());
        Ok(())
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        self.units = params.get_u64(CFG_KEY_UNITS)?;
        self.activation = Activation::from_keras_name(&params.get_string(CFG_KEY_ACTIVATION)?)?;
        self.use_bias = params.get_bool(CFG_KEY_USE_BIAS)?;
        self.kernel_initializer =
            Initializer::from_keras_name(&params.get_string(CFG_KEY_KERNEL_INITIALIZER)?)?;
        self.bias_initializer =
            Initializer::from_keras_name(&params.get_string(CFG_KEY_BIAS_INITIALIZER)?)?;
        Ok(())
    }

    fn populate_call(&self, positional: &mut Vec<String>, named: &mut Vec<(String, String)>) {
        positional.push(self.units.to_string());
        named.push((
            "activation".into(),
            python::str_to_python(self.activation.keras_name()),
        ));
        named.push(("use_bias".into(), python::bool_to_python(self.use_bias)));
        named.push((
            "kernel_initializer".into(),
            python::str_to_python(self.kernel_initializer.keras_name()),
        ));
        named.push((
            "bias_initializer".into(),
            python::str_to_python(self.bias_initializer.keras_name()),
        ));
    }
}

impl TraitInnerLayer for DenseLayer {
    fn num_parents(&self) -> usize {
        1
    }

    fn tensor_op_name(&self) -> &'static str {
        match (self.activation, self.use_bias) {
            (Activation::Linear, true) => "BiasAdd",
            (Activation::Linear, false) => "MatMul",
            (activation, _) => activation.tf_op_name(),
        }
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        let input = single_input(inputs)?;
        check_input_spec(input.rank() >= 1, "Dense层的输入至少需要1维")?;
        check_input_spec(
            input.shape().last().is_some_and(Option::is_some),
            "Dense层输入的最后一维必须已知",
        )
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        let input = single_input(inputs)?;
        let mut shape = input.shape().to_vec();
        if let Some(last) = shape.last_mut() {
            *last = Some(self.units);
        }
        Ok(vec![InferredTensor::new(shape, input.element_type())])
    }
}
