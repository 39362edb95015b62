//! Style HTTP Handlers - 风格目录

use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::{GetStyleOptions, SurpriseStyle};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct StyleOptionsDto {
    pub styles: BTreeMap<String, Vec<String>>,
    pub genres: BTreeMap<String, Vec<String>>,
    pub types: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SurpriseStyleDto {
    pub prompt: String,
}

/// 风格目录（styles / genres / types）
pub async fn get_style_options(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StyleOptionsDto>>, ApiError> {
    let result = state.get_style_options_handler.handle(GetStyleOptions);

    Ok(Json(ApiResponse::success(StyleOptionsDto {
        styles: result.styles,
        genres: result.genres,
        types: result.types,
    })))
}

/// 随机组合一条风格提示词（"Surprise Me"）
pub async fn surprise_style(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SurpriseStyleDto>>, ApiError> {
    let result = state.surprise_style_handler.handle(SurpriseStyle);

    Ok(Json(ApiResponse::success(SurpriseStyleDto {
        prompt: result.prompt,
    })))
}
