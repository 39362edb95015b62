//! Style Query Handlers

use std::sync::Arc;

use crate::application::queries::style_queries::{
    GetStyleOptions, StyleOptionsResponse, SurpriseStyle, SurpriseStyleResponse,
};
use crate::domain::StyleCatalog;

/// GetStyleOptions Handler - 返回风格目录
pub struct GetStyleOptionsHandler {
    catalog: Arc<StyleCatalog>,
}

impl GetStyleOptionsHandler {
    pub fn new(catalog: Arc<StyleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn handle(&self, _query: GetStyleOptions) -> StyleOptionsResponse {
        StyleOptionsResponse {
            styles: self.catalog.styles.clone(),
            genres: self.catalog.genres.clone(),
            types: self.catalog.types.clone(),
        }
    }
}

/// SurpriseStyle Handler - 随机组合风格提示词
pub struct SurpriseStyleHandler {
    catalog: Arc<StyleCatalog>,
}

impl SurpriseStyleHandler {
    pub fn new(catalog: Arc<StyleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn handle(&self, _query: SurpriseStyle) -> SurpriseStyleResponse {
        let mut rng = rand::thread_rng();
        let prompt = self.catalog.surprise(&mut rng);
        SurpriseStyleResponse {
            prompt: prompt.as_str().to_string(),
        }
    }
}
