/*
 * @Author       : 老董
 * @Date         : 2026-10-04 19:31:16
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-07 13:31:52
 * @Description  : Dropout层：训练时随机置零，推断时恒等；形状与类型不变
 */

use crate::errors::{LayerError, check_parameter};
use crate::nn::layer::{InferredTensor, TraitInnerLayer, TraitLayer, single_input};
use crate::nn::params::ParameterBlock;
use crate::tensor::TensorSpec;
use crate::utils::python;

const CFG_KEY_RATE: &str = "rate";
const CFG_KEY_SEED: &str = "seed";

#[derive(Debug, Clone, PartialEq)]
pub struct DropoutLayer {
    rate: f64,
    seed: Option<i64>,
}

impl Default for DropoutLayer {
    fn default() -> Self {
        Self {
            rate: 0.5,
            seed: None,
        }
    }
}

impl DropoutLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.Dropout";

    pub fn new(rate: f64) -> Self {
        Self { rate, seed: None }
    }

    pub fn with_seed(mut self, seed: Option<i64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn seed(&self) -> Option<i64> {
        self.seed
    }
}

impl TraitLayer for DropoutLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "dropout"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        check_parameter((0.0..1.0).contains(&self.rate), || {
            format!("丢弃率必须在[0, 1)之间，实际为{}", self.rate)
        })
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        params.add_float(CFG_KEY_RATE, self.rate);
        params.add_optional_int(CFG_KEY_SEED, self.seed);
        Ok(())
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        self.rate = params.get_float(CFG_KEY_RATE)?;
        self.seed = params.get_optional_int(CFG_KEY_SEED)?;
        Ok(())
    }

    fn populate_call(&self, positional: &mut Vec<String>, named: &mut Vec<(String, String)>) {
        positional.push(python::float_to_python(self.rate));
        named.push((
            "seed".into(),
            python::optional_to_python(self.seed, python::int_to_python),
        ));
    }
}

impl TraitInnerLayer for DropoutLayer {
    fn num_parents(&self) -> usize {
        1
    }

    fn tensor_op_name(&self) -> &'static str {
        "cond/Merge"
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        single_input(inputs).map(|_| ())
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        let input = single_input(inputs)?;
        Ok(vec![InferredTensor::new(
            input.shape().to_vec(),
            input.element_type(),
        )])
    }
}
