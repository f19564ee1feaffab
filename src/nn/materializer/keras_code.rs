/*
 * @Author       : 老董
 * @Date         : 2026-08-06
 * @Description  : 参考后端：把层图生成为Keras函数式API的Python脚本
 *
 * 生成的脚本形如：
 * ```text
 * import keras
 * x0 = keras.layers.Input(shape=(1,), batch_size=32, dtype='float32', name='input_1')
 * x1 = keras.layers.Dense(4, activation='linear', ..., name='dense_1')(x0)
 * model = keras.models.Model(inputs=[x0], outputs=[x1])
 * ```
 * 基础网络通过`keras.models.load_model`加载，按位置只加载一次。
 */

use super::{BuildRequest, LayerCall, NetworkBackend, TensorRef};
use crate::nn::network::BaseNetwork;
use crate::utils::python;
use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KerasCodeError {
    #[error("层{index}引用的父节点{parent}尚未生成")]
    MissingParent { index: usize, parent: usize },
    #[error("无法在生成的代码中找到层{index}的第{port}个输出")]
    UnresolvedTensor { index: usize, port: usize },
    #[error("写入脚本失败：{0}")]
    Io(#[from] std::io::Error),
}

/// 生成Keras函数式API脚本的后端
#[derive(Debug, Default)]
pub struct KerasCodeBackend {
    save_location: Option<String>,
    lines: Vec<String>,
    /// 遍历下标 -> (变量名, 输出个数)
    variables: HashMap<usize, (String, usize)>,
    /// 基础网络位置 -> 变量名
    base_networks: Vec<(String, String)>,
}

impl KerasCodeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成的脚本在最后把模型保存到`location`
    pub fn with_save_location(mut self, location: &str) -> Self {
        self.save_location = Some(location.to_string());
        self
    }

    fn parent_expr(&self, index: usize, parent: usize, port: usize) -> Result<String, KerasCodeError> {
        let (var, num_outputs) = self
            .variables
            .get(&parent)
            .ok_or(KerasCodeError::MissingParent { index, parent })?;
        Ok(if *num_outputs > 1 {
            format!("{var}[{port}]")
        } else {
            var.clone()
        })
    }

    /// 按位置复用已加载的基础网络变量，首次出现时生成加载语句
    fn base_network_var(&mut self, network: &BaseNetwork) -> String {
        let location = network.location().as_str();
        if let Some((_, var)) = self.base_networks.iter().find(|(loc, _)| loc == location) {
            return var.clone();
        }
        let var = format!("base_network_{}", self.base_networks.len());
        self.lines.push(format!(
            "{var} = keras.models.load_model({})",
            python::str_to_python(location)
        ));
        self.base_networks.push((location.to_string(), var.clone()));
        var
    }

    /// 张量按来源解析，不同基础网络中同名的张量互不混淆
    fn resolve(&mut self, tensor: TensorRef<'_>) -> Result<String, KerasCodeError> {
        match tensor {
            TensorRef::BaseInput { network, index } => {
                Ok(format!("{}.inputs[{index}]", self.base_network_var(network)))
            }
            TensorRef::BaseOutput { network, index } => {
                Ok(format!("{}.outputs[{index}]", self.base_network_var(network)))
            }
            TensorRef::Layer { index, port } => {
                let (var, num_outputs) = self
                    .variables
                    .get(&index)
                    .ok_or(KerasCodeError::UnresolvedTensor { index, port })?;
                Ok(if *num_outputs > 1 {
                    format!("{var}[{port}]")
                } else {
                    var.clone()
                })
            }
        }
    }

    /// 直接把生成的脚本写入`writer`
    pub fn write_script_to<W: Write>(script: &str, mut writer: W) -> Result<(), KerasCodeError> {
        writer.write_all(script.as_bytes())?;
        Ok(())
    }
}

impl NetworkBackend for KerasCodeBackend {
    type Network = String;
    type Error = KerasCodeError;

    fn add_layer(&mut self, call: &LayerCall<'_>) -> Result<(), Self::Error> {
        let var = format!("x{}", call.index);
        if let Some(base) = call.base_output {
            let network_var = self.base_network_var(base.network);
            self.lines.push(format!(
                "{var} = {network_var}.outputs[{}]",
                base.output_index
            ));
        } else {
            let mut args = call.positional_args.clone();
            args.extend(call.named_args.iter().map(|(k, v)| format!("{k}={v}")));
            if let Some(name) = call.layer_name {
                args.push(format!("name={}", python::str_to_python(name)));
            }
            let mut line = format!("{var} = {}({})", call.type_tag, args.join(", "));
            let parents = call
                .parents
                .iter()
                .map(|&(parent, port)| self.parent_expr(call.index, parent, port))
                .collect::<Result<Vec<_>, _>>()?;
            match parents.as_slice() {
                [] => {}
                [single] => line.push_str(&format!("({single})")),
                many => line.push_str(&format!("({})", python::list_to_python(many))),
            }
            self.lines.push(line);
        }

        let num_outputs = call.output_specs.len().max(1);
        self.variables.insert(call.index, (var, num_outputs));
        Ok(())
    }

    fn build(&mut self, request: &BuildRequest<'_>) -> Result<Self::Network, Self::Error> {
        let inputs = request
            .inputs
            .iter()
            .map(|&t| self.resolve(t))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = request
            .outputs
            .iter()
            .map(|&t| self.resolve(t))
            .collect::<Result<Vec<_>, _>>()?;

        let mut script = String::from("import keras\n\n");
        for line in &self.lines {
            script.push_str(line);
            script.push('\n');
        }
        script.push_str(&format!(
            "\nmodel = keras.models.Model(inputs={}, outputs={})\n",
            python::list_to_python(&inputs),
            python::list_to_python(&outputs)
        ));
        if let Some(location) = &self.save_location {
            script.push_str(&format!("model.save({})\n", python::str_to_python(location)));
        }
        Ok(script)
    }
}
