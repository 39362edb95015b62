//! Style Queries - 风格目录查询

use std::collections::BTreeMap;

/// 获取风格目录（styles / genres / types）
#[derive(Debug, Clone, Default)]
pub struct GetStyleOptions;

/// 风格目录响应
#[derive(Debug, Clone)]
pub struct StyleOptionsResponse {
    pub styles: BTreeMap<String, Vec<String>>,
    pub genres: BTreeMap<String, Vec<String>>,
    pub types: BTreeMap<String, Vec<String>>,
}

/// 随机组合一条风格提示词（"Surprise Me"）
#[derive(Debug, Clone, Default)]
pub struct SurpriseStyle;

/// 随机风格响应
#[derive(Debug, Clone)]
pub struct SurpriseStyleResponse {
    pub prompt: String,
}
