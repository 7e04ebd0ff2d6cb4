// ==========================================
// 周度内容排期引擎 - 发送类型分类表
// ==========================================
// 职责: 发送类型定义（只读参考数据）与分类表校验
// 红线: 每日上限为硬约束，周上限次之
// ==========================================

use crate::domain::types::{Category, PageType, PageTypeRestriction, RevenueRole};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ==========================================
// SendTypeDefinition - 发送类型定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTypeDefinition {
    pub key: String,                           // 类型键
    pub category: Category,                    // 所属类别
    pub daily_max: u32,                        // 单日上限
    #[serde(default)]
    pub weekly_max: Option<u32>,               // 周上限（可空）
    pub min_spacing_minutes: u32,              // 同日同类型最小间隔（分钟）
    pub page_type_restriction: PageTypeRestriction,
    #[serde(default)]
    pub can_have_followup: bool,               // 是否可挂跟进消息

    // ===== 扩展字段 =====
    #[serde(default)]
    pub revenue_role: Option<RevenueRole>,     // 仅营收类有效
    #[serde(default)]
    pub requires_campaign: bool,               // 需有效活动才可排
    #[serde(default = "default_priority")]
    pub priority: u8,                          // 1 = 最高
}

fn default_priority() -> u8 {
    3
}

impl SendTypeDefinition {
    pub fn is_special(&self) -> bool {
        self.revenue_role == Some(RevenueRole::Special)
    }

    pub fn is_primary(&self) -> bool {
        self.revenue_role == Some(RevenueRole::Primary)
    }

    pub fn allows_page(&self, page_type: PageType) -> bool {
        self.page_type_restriction.allows(page_type)
    }
}

// ==========================================
// SendTypeCatalog - 经校验的分类表
// ==========================================
#[derive(Debug, Clone)]
pub struct SendTypeCatalog {
    definitions: Vec<SendTypeDefinition>,
    index: HashMap<String, usize>,
}

impl SendTypeCatalog {
    /// 由定义列表构建分类表
    ///
    /// # 验证规则
    /// 1. 分类表不能为空
    /// 2. 类型键唯一且非空
    /// 3. daily_max >= 1，weekly_max（若有）>= daily_max
    /// 4. 营收类必须声明 revenue_role，非营收类不得声明
    /// 5. 营收与互动类别必须至少各有一个类型
    pub fn new(definitions: Vec<SendTypeDefinition>) -> Result<Self, ConfigError> {
        if definitions.is_empty() {
            return Err(ConfigError::MissingTaxonomy);
        }

        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if def.key.trim().is_empty() {
                return Err(ConfigError::MalformedTaxonomy(format!("第 {} 项类型键为空", i)));
            }
            if index.insert(def.key.clone(), i).is_some() {
                return Err(ConfigError::MalformedTaxonomy(format!("类型键重复: {}", def.key)));
            }
            if def.daily_max == 0 {
                return Err(ConfigError::MalformedTaxonomy(format!(
                    "{} 的 daily_max 必须 >= 1",
                    def.key
                )));
            }
            if let Some(weekly) = def.weekly_max {
                if weekly < def.daily_max {
                    return Err(ConfigError::MalformedTaxonomy(format!(
                        "{} 的 weekly_max={} 小于 daily_max={}",
                        def.key, weekly, def.daily_max
                    )));
                }
            }
            match (def.category, def.revenue_role) {
                (Category::Revenue, None) => {
                    return Err(ConfigError::MalformedTaxonomy(format!(
                        "营收类型 {} 缺少 revenue_role",
                        def.key
                    )));
                }
                (Category::Engagement | Category::Retention, Some(_)) => {
                    return Err(ConfigError::MalformedTaxonomy(format!(
                        "非营收类型 {} 不应声明 revenue_role",
                        def.key
                    )));
                }
                _ => {}
            }
        }

        for required in [Category::Revenue, Category::Engagement] {
            if !definitions.iter().any(|d| d.category == required) {
                return Err(ConfigError::MalformedTaxonomy(format!(
                    "缺少 {} 类别的发送类型",
                    required.as_str()
                )));
            }
        }

        Ok(Self { definitions, index })
    }

    /// 内置 22 项默认分类表
    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(standard_definitions())
    }

    pub fn get(&self, key: &str) -> Option<&SendTypeDefinition> {
        self.index.get(key).map(|&i| &self.definitions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SendTypeDefinition> {
        self.definitions.iter()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &SendTypeDefinition> {
        self.definitions.iter().filter(move |d| d.category == category)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Special 组全部类型键
    pub fn special_keys(&self) -> HashSet<&str> {
        self.definitions
            .iter()
            .filter(|d| d.is_special())
            .map(|d| d.key.as_str())
            .collect()
    }
}

// ==========================================
// 默认分类表
// ==========================================

#[allow(clippy::too_many_arguments)]
fn def(
    key: &str,
    category: Category,
    daily_max: u32,
    weekly_max: Option<u32>,
    min_spacing_minutes: u32,
    page: PageTypeRestriction,
    can_have_followup: bool,
    revenue_role: Option<RevenueRole>,
    requires_campaign: bool,
    priority: u8,
) -> SendTypeDefinition {
    SendTypeDefinition {
        key: key.to_string(),
        category,
        daily_max,
        weekly_max,
        min_spacing_minutes,
        page_type_restriction: page,
        can_have_followup,
        revenue_role,
        requires_campaign,
        priority,
    }
}

/// 默认 22 项发送类型
#[rustfmt::skip]
pub fn standard_definitions() -> Vec<SendTypeDefinition> {
    use Category::*;
    use PageTypeRestriction as P;
    use RevenueRole::*;

    vec![
        // ===== 营收 (9) =====
        def("ppv_unlock", Revenue, 4, None, 120, P::Both, true, Some(Primary), false, 1),
        def("ppv_wall", Revenue, 2, None, 180, P::Free, true, Some(Primary), false, 1),
        def("bundle", Revenue, 1, Some(3), 240, P::Both, true, Some(Primary), false, 1),
        def("tip_goal", Revenue, 2, None, 180, P::Paid, false, Some(Secondary), false, 2),
        def("flash_bundle", Revenue, 1, Some(3), 240, P::Both, true, Some(Secondary), false, 2),
        def("game_post", Revenue, 1, Some(3), 240, P::Both, false, Some(Secondary), true, 2),
        def("first_to_tip", Revenue, 1, Some(3), 240, P::Both, false, Some(Special), false, 3),
        def("vip_program", Revenue, 1, Some(1), 240, P::Paid, false, Some(Special), false, 3),
        def("snapchat_bundle", Revenue, 1, Some(1), 240, P::Both, false, Some(Special), false, 3),
        // ===== 互动 (9) =====
        def("link_drop", Engagement, 2, None, 120, P::Both, false, None, false, 2),
        def("wall_link_drop", Engagement, 2, None, 120, P::Both, false, None, false, 2),
        def("bump_normal", Engagement, 2, None, 90, P::Both, false, None, false, 3),
        def("bump_descriptive", Engagement, 2, None, 90, P::Both, false, None, false, 3),
        def("bump_text_only", Engagement, 2, None, 90, P::Both, false, None, false, 3),
        def("bump_flyer", Engagement, 2, None, 120, P::Both, false, None, false, 3),
        def("dm_farm", Engagement, 1, None, 240, P::Both, false, None, false, 4),
        def("like_farm", Engagement, 1, None, 240, P::Both, false, None, false, 4),
        def("live_promo", Engagement, 1, Some(3), 240, P::Both, false, None, true, 2),
        // ===== 留存 (4) =====
        def("renew_on_post", Retention, 1, None, 240, P::Paid, false, None, false, 2),
        def("renew_on_message", Retention, 1, None, 240, P::Paid, false, None, false, 2),
        def("ppv_followup", Retention, 2, None, 120, P::Both, false, None, false, 3),
        def("expired_winback", Retention, 1, Some(2), 240, P::Paid, false, None, false, 3),
    ]
}
