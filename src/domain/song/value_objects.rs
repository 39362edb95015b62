//! Song Context - Value Objects

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::SongError;

/// 歌曲标题
///
/// 不变量:
/// - 非空，不超过 200 字符
/// - `file_stem()` 产出可安全用于文件路径的 stem
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongTitle(String);

impl SongTitle {
    pub fn new(title: impl Into<String>) -> Result<Self, SongError> {
        let title = title.into();
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(SongError::InvalidTitle("title cannot be empty".to_string()));
        }
        if trimmed.chars().count() > 200 {
            return Err(SongError::InvalidTitle(
                "title cannot exceed 200 characters".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 文件名安全的 stem
    ///
    /// 字母/数字/下划线/空白/连字符以外的字符替换为 `_`，
    /// trim 后为空才回退为 "song"
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim();
        if stem.is_empty() {
            "song".to_string()
        } else {
            stem.to_string()
        }
    }

    /// 歌曲 wav 文件名
    pub fn wav_name(&self) -> String {
        format!("{}.wav", self.file_stem())
    }

    /// 封面 png 文件名
    pub fn cover_name(&self) -> String {
        format!("{}.png", self.file_stem())
    }

    /// 元数据 json 文件名
    pub fn metadata_name(&self) -> String {
        format!("{}.json", self.file_stem())
    }
}

impl std::fmt::Display for SongTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 歌词段落标签
pub const SECTION_TAGS: &[&str] = &["[verse]", "[chorus]", "[bridge]", "[outro]", "[instrumental]"];

/// 歌词
///
/// 支持 [verse] / [chorus] / [bridge] / [outro] / [instrumental] 段落标签。
/// 空歌词表示纯器乐曲目。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lyrics(String);

impl Lyrics {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_instrumental(&self) -> bool {
        self.word_count() == 0
    }

    /// 歌词词数（段落标签不计入）
    pub fn word_count(&self) -> usize {
        self.0
            .split_whitespace()
            .filter(|w| !SECTION_TAGS.contains(&w.to_lowercase().as_str()))
            .count()
    }

    /// 歌词中出现的段落标签（按出现顺序，小写）
    pub fn sections(&self) -> Vec<String> {
        self.0
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| SECTION_TAGS.contains(&w.as_str()))
            .collect()
    }
}

/// 风格描述
///
/// 自由文本，涵盖风格/流派/类型（如 "dark atmospheric rock, metal, ballad"）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StylePrompt(String);

impl StylePrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into().trim().to_string())
    }

    /// 由多个部分逗号拼接（空部分跳过）
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = parts
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for StylePrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 模型版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelVersion {
    #[serde(rename = "1B")]
    V1B,
    #[serde(rename = "3B")]
    V3B,
    #[serde(rename = "8B")]
    V8B,
}

impl ModelVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVersion::V1B => "1B",
            ModelVersion::V3B => "3B",
            ModelVersion::V8B => "8B",
        }
    }
}

impl Default for ModelVersion {
    fn default() -> Self {
        ModelVersion::V3B
    }
}

impl std::str::FromStr for ModelVersion {
    type Err = SongError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1B" => Ok(ModelVersion::V1B),
            "3B" => Ok(ModelVersion::V3B),
            "8B" => Ok(ModelVersion::V8B),
            _ => Err(SongError::InvalidParams(format!(
                "unknown model version: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 采样参数范围
pub const TOPK_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=2.0;
pub const CFG_SCALE_RANGE: std::ops::RangeInclusive<f32> = 1.0..=5.0;
pub const AUDIO_LENGTH_MS_RANGE: std::ops::RangeInclusive<u64> = 30_000..=600_000;

/// 生成参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenParams {
    /// 模型 checkpoint 目录
    pub model_path: PathBuf,
    /// 模型版本
    pub version: ModelVersion,
    /// Top-k 采样
    pub topk: u32,
    /// 采样温度
    pub temperature: f32,
    /// CFG scale
    pub cfg_scale: f32,
    /// 目标音频时长（毫秒）
    pub max_audio_length_ms: u64,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./ckpt"),
            version: ModelVersion::default(),
            topk: 50,
            temperature: 1.0,
            cfg_scale: 1.5,
            max_audio_length_ms: 240_000,
        }
    }
}

impl GenParams {
    /// 校验所有参数落在合法范围内
    pub fn validate(&self) -> Result<(), SongError> {
        if !TOPK_RANGE.contains(&self.topk) {
            return Err(SongError::InvalidParams(format!(
                "topk {} out of range {:?}",
                self.topk, TOPK_RANGE
            )));
        }
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(SongError::InvalidParams(format!(
                "temperature {} out of range {:?}",
                self.temperature, TEMPERATURE_RANGE
            )));
        }
        if !CFG_SCALE_RANGE.contains(&self.cfg_scale) {
            return Err(SongError::InvalidParams(format!(
                "cfg_scale {} out of range {:?}",
                self.cfg_scale, CFG_SCALE_RANGE
            )));
        }
        if !AUDIO_LENGTH_MS_RANGE.contains(&self.max_audio_length_ms) {
            return Err(SongError::InvalidParams(format!(
                "max_audio_length_ms {} out of range {:?}",
                self.max_audio_length_ms, AUDIO_LENGTH_MS_RANGE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_rejects_empty() {
        assert!(SongTitle::new("").is_err());
        assert!(SongTitle::new("   ").is_err());
    }

    #[test]
    fn test_title_file_stem_sanitizes() {
        let title = SongTitle::new("My Song: B-Side / Demo?").unwrap();
        assert_eq!(title.file_stem(), "My Song_ B-Side _ Demo_");
        assert_eq!(title.wav_name(), "My Song_ B-Side _ Demo_.wav");
    }

    #[test]
    fn test_title_file_stem_keeps_fully_replaced_stem() {
        // 全部被替换的标题保留下划线 stem，不回退
        let title = SongTitle::new("???").unwrap();
        assert_eq!(title.file_stem(), "___");
    }

    #[test]
    fn test_title_file_stem_preserves_inner_whitespace() {
        let title = SongTitle::new("late\tnight run").unwrap();
        assert_eq!(title.file_stem(), "late\tnight run");
    }

    #[test]
    fn test_lyrics_word_count_skips_tags() {
        let lyrics = Lyrics::new("[verse]\nwalking down the street\n[chorus]\nevery step I take");
        assert_eq!(lyrics.word_count(), 8);
        assert_eq!(lyrics.sections(), vec!["[verse]", "[chorus]"]);
        assert!(!lyrics.is_instrumental());
    }

    #[test]
    fn test_empty_lyrics_is_instrumental() {
        let lyrics = Lyrics::new("");
        assert!(lyrics.is_instrumental());
        let tags_only = Lyrics::new("[instrumental]");
        assert!(tags_only.is_instrumental());
    }

    #[test]
    fn test_style_prompt_from_parts_skips_empty() {
        let prompt = StylePrompt::from_parts(["dark rock", "", "metal"]);
        assert_eq!(prompt.as_str(), "dark rock, metal");
    }

    #[test]
    fn test_gen_params_validation() {
        let mut params = GenParams::default();
        assert!(params.validate().is_ok());

        params.topk = 0;
        assert!(params.validate().is_err());

        params.topk = 50;
        params.temperature = 3.0;
        assert!(params.validate().is_err());

        params.temperature = 1.0;
        params.max_audio_length_ms = 1_000;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_model_version_parse() {
        assert_eq!("3B".parse::<ModelVersion>().unwrap(), ModelVersion::V3B);
        assert!("13B".parse::<ModelVersion>().is_err());
    }
}
