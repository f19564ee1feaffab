/*
 * @Author       : 老董
 * @Date         : 2026-08-25
 * @Description  : 形状相关的工具函数
 *
 * 形状不包含批维度，每一维都可能未知（`None`）。
 * 文本形式如`"10, ?"`，`?`或`None`表示未知维度，可被参数持久化直接使用。
 */

/// 张量形状：各维度可以未知
pub type Shape = Vec<Option<u64>>;

/// 将文本解析为形状，如`"1"`、`"10, ?"`、`"(28, 28, None)"`
pub fn parse_shape(text: &str) -> Result<Shape, String> {
    let trimmed = text
        .trim()
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']']);
    if trimmed.trim().is_empty() {
        return Err(format!("形状`{text}`为空"));
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| match dim {
            "?" | "None" | "none" => Ok(None),
            _ => dim
                .parse::<u64>()
                .map(Some)
                .map_err(|_| format!("形状`{text}`中的维度`{dim}`不是非负整数")),
        })
        .collect()
}

/// 将形状格式化为文本（`parse_shape`的逆操作）
pub fn format_shape(shape: &[Option<u64>]) -> String {
    shape
        .iter()
        .map(|dim| dim.map_or_else(|| "?".to_string(), |d| d.to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 若所有维度都已知，返回固定形状
pub fn fixed_shape(shape: &[Option<u64>]) -> Option<Vec<u64>> {
    shape.iter().copied().collect()
}

/// 元素个数（存在未知维度时为`None`）；乘积超出`u64`时报错
pub fn num_elements(shape: &[Option<u64>]) -> Result<Option<u64>, String> {
    let Some(dims) = fixed_shape(shape) else {
        return Ok(None);
    };
    dims.iter()
        .try_fold(1u64, |acc, &d| acc.checked_mul(d))
        .map(Some)
        .ok_or_else(|| format!("形状[{}]的元素个数超出了u64范围", format_shape(shape)))
}
