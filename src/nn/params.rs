/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : 层参数块（ParameterBlock）
 *
 * 每种层通过`save_parameters`/`load_parameters`把自身参数写入/读出参数块，
 * 序列化器只负责把参数块整体嵌入持久化结构，不关心其内部结构。
 * 参数块中不包含任何父节点/拓扑信息。
 */

use crate::errors::LayerError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 有序的键值参数块（键按写入顺序保存）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBlock(Map<String, Value>);

impl ParameterBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub(crate) fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub(crate) fn from_value(value: Value) -> Result<Self, LayerError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(LayerError::InvalidSettings(format!(
                "参数块必须是键值结构，实际为`{other}`"
            ))),
        }
    }

    // ========== 写入 ==========

    pub fn add_int(&mut self, key: &str, value: i64) {
        self.0.insert(key.to_string(), Value::from(value));
    }

    /// 写入无符号整数；超出`i64`范围时报错
    pub fn add_u64(&mut self, key: &str, value: u64) -> Result<(), LayerError> {
        let value = i64::try_from(value).map_err(|_| {
            LayerError::InvalidSettings(format!("参数`{key}`的值{value}超出了可保存的整数范围"))
        })?;
        self.add_int(key, value);
        Ok(())
    }

    pub fn add_usize(&mut self, key: &str, value: usize) -> Result<(), LayerError> {
        let value = u64::try_from(value).map_err(|_| {
            LayerError::InvalidSettings(format!("参数`{key}`的值{value}超出了可保存的整数范围"))
        })?;
        self.add_u64(key, value)
    }

    pub fn add_optional_u64(&mut self, key: &str, value: Option<u64>) -> Result<(), LayerError> {
        match value {
            Some(value) => self.add_u64(key, value),
            None => {
                self.add_optional_int(key, None);
                Ok(())
            }
        }
    }

    pub fn add_float(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), Value::from(value));
    }

    pub fn add_bool(&mut self, key: &str, value: bool) {
        self.0.insert(key.to_string(), Value::Bool(value));
    }

    pub fn add_string(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), Value::String(value.to_string()));
    }

    /// `None`写为`null`，读回时仍为`None`
    pub fn add_optional_string(&mut self, key: &str, value: Option<&str>) {
        let value = value.map_or(Value::Null, |v| Value::String(v.to_string()));
        self.0.insert(key.to_string(), value);
    }

    pub fn add_optional_int(&mut self, key: &str, value: Option<i64>) {
        self.0.insert(key.to_string(), value.map_or(Value::Null, Value::from));
    }

    /// 写入任意可序列化的结构化值
    pub fn add_value<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), LayerError> {
        let value = serde_json::to_value(value)
            .map_err(|e| LayerError::InvalidSettings(format!("无法写入参数`{key}`：{e}")))?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    // ========== 读取 ==========

    fn require(&self, key: &str) -> Result<&Value, LayerError> {
        self.0
            .get(key)
            .ok_or_else(|| LayerError::InvalidSettings(format!("缺少参数`{key}`")))
    }

    fn wrong_type(key: &str, expected: &str, value: &Value) -> LayerError {
        LayerError::InvalidSettings(format!("参数`{key}`应为{expected}，实际为`{value}`"))
    }

    pub fn get_int(&self, key: &str) -> Result<i64, LayerError> {
        let value = self.require(key)?;
        value
            .as_i64()
            .ok_or_else(|| Self::wrong_type(key, "整数", value))
    }

    pub fn get_float(&self, key: &str) -> Result<f64, LayerError> {
        let value = self.require(key)?;
        value
            .as_f64()
            .ok_or_else(|| Self::wrong_type(key, "浮点数", value))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, LayerError> {
        let value = self.require(key)?;
        value
            .as_bool()
            .ok_or_else(|| Self::wrong_type(key, "布尔值", value))
    }

    pub fn get_string(&self, key: &str) -> Result<String, LayerError> {
        let value = self.require(key)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Self::wrong_type(key, "字符串", value))
    }

    pub fn get_optional_string(&self, key: &str) -> Result<Option<String>, LayerError> {
        match self.require(key)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(Self::wrong_type(key, "字符串或null", other)),
        }
    }

    pub fn get_optional_int(&self, key: &str) -> Result<Option<i64>, LayerError> {
        match self.require(key)? {
            Value::Null => Ok(None),
            other => other
                .as_i64()
                .map(Some)
                .ok_or_else(|| Self::wrong_type(key, "整数或null", other)),
        }
    }

    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<T, LayerError> {
        let value = self.require(key)?;
        T::deserialize(value)
            .map_err(|e| LayerError::InvalidSettings(format!("无法读取参数`{key}`：{e}")))
    }

    /// 读取可转为`usize`的非负整数
    pub fn get_usize(&self, key: &str) -> Result<usize, LayerError> {
        let value = self.get_int(key)?;
        usize::try_from(value).map_err(|_| {
            LayerError::InvalidSettings(format!("参数`{key}`应为非负整数，实际为{value}"))
        })
    }

    /// 读取可转为`u64`的非负整数
    pub fn get_u64(&self, key: &str) -> Result<u64, LayerError> {
        let value = self.get_int(key)?;
        u64::try_from(value).map_err(|_| {
            LayerError::InvalidSettings(format!("参数`{key}`应为非负整数，实际为{value}"))
        })
    }
}
