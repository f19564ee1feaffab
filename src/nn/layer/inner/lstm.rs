/*
 * @Author       : 老董
 * @Date         : 2026-09-19 11:58:40
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-04 17:03:33
 * @Description  : 长短期记忆层（LSTM）
 *
 * 输入形状：[timesteps, features]（不含批维度），features必须已知，元素类型必须为浮点
 * 输出：
 * - return_sequences=false：[units]
 * - return_sequences=true ：[timesteps, units]
 * - return_state=true时额外输出隐藏状态h与细胞状态c，形状均为[units]（共3个输出）
 */

use crate::errors::{LayerError, check_input_spec, check_parameter};
use crate::nn::layer::{Activation, InferredTensor, MAX_UNITS, TraitInnerLayer, TraitLayer, single_input};
use crate::nn::params::ParameterBlock;
use crate::tensor::TensorSpec;
use crate::utils::python;

const CFG_KEY_UNITS: &str = "units";
const CFG_KEY_ACTIVATION: &str = "activation";
const CFG_KEY_RECURRENT_ACTIVATION: &str = "recurrent_activation";
const CFG_KEY_USE_BIAS: &str = "use_bias";
const CFG_KEY_RETURN_SEQUENCES: &str = "return_sequences";
const CFG_KEY_RETURN_STATE: &str = "return_state";

#[derive(Debug, Clone, PartialEq)]
pub struct LstmLayer {
    units: u64,
    activation: Activation,
    recurrent_activation: Activation,
    use_bias: bool,
    return_sequences: bool,
    return_state: bool,
}

impl Default for LstmLayer {
    fn default() -> Self {
        Self {
            units: 1,
            activation: Activation::Tanh,
            recurrent_activation: Activation::HardSigmoid,
            use_bias: true,
            return_sequences: false,
            return_state: false,
        }
    }
}

impl LstmLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.LSTM";

    pub fn new(units: u64) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    pub fn with_return_sequences(mut self, return_sequences: bool) -> Self {
        self.return_sequences = return_sequences;
        self
    }

    pub fn with_return_state(mut self, return_state: bool) -> Self {
        self.return_state = return_state;
        self
    }

    pub fn with_activations(mut self, activation: Activation, recurrent: Activation) -> Self {
        self.activation = activation;
        self.recurrent_activation = recurrent;
        self
    }

    pub fn units(&self) -> u64 {
        self.units
    }
}

impl TraitLayer for LstmLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "lstm"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        check_parameter((1..=MAX_UNITS).contains(&self.units), || {
            format!("单元数必须在1到{}之间，实际为{}", MAX_UNITS, self.units)
        })
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        params.add_u64(CFG_KEY_UNITS, self.units)?;
        params.add_string(CFG_KEY_ACTIVATION, self.activation.keras_name());
        params.add_string(CFG_KEY_RECURRENT_ACTIVATION, self.recurrent_activation.keras_name());
        params.add_bool(CFG_KEY_USE_BIAS, self.use_bias);
        params.add_bool(CFG_KEY_RETURN_SEQUENCES, self.return_sequences);
        params.add_bool(CFG_KEY_RETURN_STATE, self.return_state);
        Ok(())
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        self.units = params.get_u64(CFG_KEY_UNITS)?;
        self.activation = Activation::from_keras_name(&params.get_string(CFG_KEY_ACTIVATION)?)?;
        self.recurrent_activation =
            Activation::from_keras_name(&params.get_string(CFG_KEY_RECURRENT_ACTIVATION)?)?;
        self.use_bias = params.get_bool(CFG_KEY_USE_BIAS)?;
        self.return_sequences = params.get_bool(CFG_KEY_RETURN_SEQUENCES)?;
        self.return_state = params.get_bool(CFG_KEY_RETURN_STATE)?;
        Ok(())
    }

    fn populate_call(&self, positional: &mut Vec<String>, named: &mut Vec<(String, String)>) {
        positional.push(self.units.to_string());
        named.push((
            "activation".into(),
            python::str_to_python(self.activation.keras_name()),
        ));
        named.push((
            "recurrent_activation".into(),
            python::str_to_python(self.recurrent_activation.keras_name()),
        ));
        named.push(("use_bias".into(), python::bool_to_python(self.use_bias)));
        named.push((
            "return_sequences".into(),
            python::bool_to_python(self.return_sequences),
        ));
        named.push(("return_state".into(), python::bool_to_python(self.return_state)));
    }
}

impl TraitInnerLayer for LstmLayer {
    fn num_parents(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        if self.return_state { 3 } else { 1 }
    }

    fn tensor_op_name(&self) -> &'static str {
        "while/Exit"
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        let input = single_input(inputs)?;
        check_input_spec(
            input.rank() == 2,
            "LSTM层的输入必须是2维的[timesteps, features]",
        )?;
        check_input_spec(
            input.shape()[1].is_some(),
            "LSTM层输入的特征维度必须已知",
        )?;
        check_input_spec(
            input.element_type().is_float(),
            "LSTM层的输入必须是浮点类型",
        )
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        let input = single_input(inputs)?;
        let element_type = input.element_type();
        let units = Some(self.units);
        let output = if self.return_sequences {
            vec![input.shape().first().copied().flatten(), units]
        } else {
            vec![units]
        };
        let mut outputs = vec![InferredTensor::new(output, element_type)];
        if self.return_state {
            outputs.push(InferredTensor::new(vec![units], element_type));
            outputs.push(InferredTensor::new(vec![units], element_type));
        }
        Ok(outputs)
    }
}
