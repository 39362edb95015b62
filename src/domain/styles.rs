//! 风格目录
//!
//! 对应 assets/styles_db.json: 三个族（styles / genres / types），
//! 每个条目带可选子条目列表。"Surprise Me" 从三族各随机取一项拼成风格描述。

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::song::StylePrompt;

/// 风格目录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleCatalog {
    #[serde(default)]
    pub styles: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub genres: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub types: BTreeMap<String, Vec<String>>,
}

impl StyleCatalog {
    /// 从 JSON 文件加载，文件不存在时返回空目录
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(catalog) => catalog,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Invalid styles db, using empty catalog");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!(path = %path.display(), "Styles db not found, using empty catalog");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty() && self.genres.is_empty() && self.types.is_empty()
    }

    /// 随机组合一条风格描述
    ///
    /// 组成: "style substyle, genre, type subtype"。空的族跳过；
    /// 没有子条目的条目只取条目名。
    pub fn surprise<R: Rng>(&self, rng: &mut R) -> StylePrompt {
        let mut parts = Vec::with_capacity(3);

        if let Some(part) = Self::pick_with_sub(&self.styles, rng) {
            parts.push(part);
        }
        if let Some(genre) = self.genres.keys().choose(rng) {
            parts.push(genre.clone());
        }
        if let Some(part) = Self::pick_with_sub(&self.types, rng) {
            parts.push(part);
        }

        StylePrompt::from_parts(parts)
    }

    /// 随机取 "条目名 子条目" 或仅条目名
    fn pick_with_sub<R: Rng>(
        family: &BTreeMap<String, Vec<String>>,
        rng: &mut R,
    ) -> Option<String> {
        let name = family.keys().choose(rng)?;
        let subs = &family[name];
        match subs.choose(rng) {
            Some(sub) => Some(format!("{} {}", name, sub)),
            None => Some(name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_catalog() -> StyleCatalog {
        serde_json::from_str(
            r#"{
                "styles": {"rock": ["heavy", "soft"], "jazz": []},
                "genres": {"metal": [], "blues": []},
                "types": {"ballad": ["slow"]}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_surprise_combines_three_families() {
        let catalog = sample_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let prompt = catalog.surprise(&mut rng);

        let parts: Vec<&str> = prompt.as_str().split(", ").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].starts_with("rock") || parts[0].starts_with("jazz"));
        assert!(parts[1] == "metal" || parts[1] == "blues");
        assert_eq!(parts[2], "ballad slow");
    }

    #[test]
    fn test_surprise_on_empty_catalog() {
        let catalog = StyleCatalog::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(catalog.surprise(&mut rng).is_empty());
    }

    #[test]
    fn test_entry_without_subentries_uses_name_only() {
        let mut catalog = StyleCatalog::default();
        catalog.styles.insert("jazz".to_string(), Vec::new());
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(catalog.surprise(&mut rng).as_str(), "jazz");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let catalog = StyleCatalog::load(Path::new("/nonexistent/styles_db.json"));
        assert!(catalog.is_empty());
    }
}
