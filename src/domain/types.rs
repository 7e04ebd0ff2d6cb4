// ==========================================
// 周度内容排期引擎 - 领域类型定义
// ==========================================
// 红线: AVOID 档文案永不入选
// 红线: 同日相邻两条不得为同一发送类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 发送类别 (Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Revenue,    // 营收
    Engagement, // 互动
    Retention,  // 留存
}

impl Category {
    /// 全部类别（交错顺序: 营收 → 互动 → 留存）
    pub const ALL: [Category; 3] = [Category::Revenue, Category::Engagement, Category::Retention];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Revenue => "revenue",
            Category::Engagement => "engagement",
            Category::Retention => "retention",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Revenue => write!(f, "REVENUE"),
            Category::Engagement => write!(f, "ENGAGEMENT"),
            Category::Retention => write!(f, "RETENTION"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "revenue" => Ok(Category::Revenue),
            "engagement" => Ok(Category::Engagement),
            "retention" => Ok(Category::Retention),
            other => Err(format!("未知发送类别: {}", other)),
        }
    }
}

// ==========================================
// 页面类型 (Page Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageType {
    Paid, // 付费页
    Free, // 免费页
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageType::Paid => write!(f, "PAID"),
            PageType::Free => write!(f, "FREE"),
        }
    }
}

// ==========================================
// 发送类型的页面限制
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageTypeRestriction {
    Paid,
    Free,
    Both,
}

impl PageTypeRestriction {
    /// 是否允许在指定页面类型上使用
    pub fn allows(&self, page_type: PageType) -> bool {
        match self {
            PageTypeRestriction::Both => true,
            PageTypeRestriction::Paid => page_type == PageType::Paid,
            PageTypeRestriction::Free => page_type == PageType::Free,
        }
    }
}

// ==========================================
// 营收角色 (仅营收类发送类型有效)
// ==========================================
// 每日先排满 2 个 Primary，再允许 Secondary / Special
// Special 组互相封顶: 每日至多 1 个
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueRole {
    Primary,
    Secondary,
    Special,
}

// ==========================================
// 内容档位 (Content Tier)
// ==========================================
// 顺序: Top > Mid > Low > Avoid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentTier {
    Top,
    Mid,
    Low,
    Avoid, // 硬排除
}

impl ContentTier {
    /// 文案评分中的档位权重 (0-100)
    pub fn weight(&self) -> f64 {
        match self {
            ContentTier::Top => 100.0,
            ContentTier::Mid => 60.0,
            ContentTier::Low => 30.0,
            ContentTier::Avoid => 0.0,
        }
    }

    /// 内容类型权重提示 (0-1)，供文案匹配的类型优先级使用
    pub fn hint(&self) -> f64 {
        match self {
            ContentTier::Top => 1.0,
            ContentTier::Mid => 0.7,
            ContentTier::Low => 0.4,
            ContentTier::Avoid => 0.0,
        }
    }
}

impl fmt::Display for ContentTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentTier::Top => write!(f, "TOP"),
            ContentTier::Mid => write!(f, "MID"),
            ContentTier::Low => write!(f, "LOW"),
            ContentTier::Avoid => write!(f, "AVOID"),
        }
    }
}

// ==========================================
// 账号体量档位 (Volume Tier)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeTier {
    Low,
    Mid,
    High,
    Ultra,
}

impl fmt::Display for VolumeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeTier::Low => write!(f, "LOW"),
            VolumeTier::Mid => write!(f, "MID"),
            VolumeTier::High => write!(f, "HIGH"),
            VolumeTier::Ultra => write!(f, "ULTRA"),
        }
    }
}

// ==========================================
// 文案匹配状态 (Resolution State)
// ==========================================
// 状态机: Unresolved → {PrimaryMatch | FallbackL1..L4 | ManualRequired}
// 只能前进，非 Unresolved 状态均为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionState {
    Unresolved,
    PrimaryMatch,
    #[serde(rename = "FALLBACK_L1")]
    FallbackL1,
    #[serde(rename = "FALLBACK_L2")]
    FallbackL2,
    #[serde(rename = "FALLBACK_L3")]
    FallbackL3,
    #[serde(rename = "FALLBACK_L4")]
    FallbackL4,
    ManualRequired,
}

impl ResolutionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResolutionState::Unresolved)
    }

    /// 是否允许迁移到目标状态
    pub fn can_transition_to(&self, to: ResolutionState) -> bool {
        *self == ResolutionState::Unresolved && to.is_terminal()
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionState::Unresolved => write!(f, "UNRESOLVED"),
            ResolutionState::PrimaryMatch => write!(f, "PRIMARY_MATCH"),
            ResolutionState::FallbackL1 => write!(f, "FALLBACK_L1"),
            ResolutionState::FallbackL2 => write!(f, "FALLBACK_L2"),
            ResolutionState::FallbackL3 => write!(f, "FALLBACK_L3"),
            ResolutionState::FallbackL4 => write!(f, "FALLBACK_L4"),
            ResolutionState::ManualRequired => write!(f, "MANUAL_REQUIRED"),
        }
    }
}

// ==========================================
// 校验结论 (Validation Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Approved,
    NeedsReview,
    Rejected,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Approved => write!(f, "APPROVED"),
            ValidationStatus::NeedsReview => write!(f, "NEEDS_REVIEW"),
            ValidationStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_state_forward_only() {
        assert!(ResolutionState::Unresolved.can_transition_to(ResolutionState::FallbackL2));
        assert!(!ResolutionState::Unresolved.can_transition_to(ResolutionState::Unresolved));
        assert!(!ResolutionState::PrimaryMatch.can_transition_to(ResolutionState::ManualRequired));
        assert!(!ResolutionState::ManualRequired.can_transition_to(ResolutionState::PrimaryMatch));
    }

    #[test]
    fn test_page_restriction() {
        assert!(PageTypeRestriction::Both.allows(PageType::Free));
        assert!(PageTypeRestriction::Paid.allows(PageType::Paid));
        assert!(!PageTypeRestriction::Paid.allows(PageType::Free));
        assert!(!PageTypeRestriction::Free.allows(PageType::Paid));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Revenue".parse::<Category>().unwrap(), Category::Revenue);
        assert!("unknown".parse::<Category>().is_err());
    }

    #[test]
    fn test_resolution_state_serde_name() {
        let json = serde_json::to_string(&ResolutionState::FallbackL3).unwrap();
        assert_eq!(json, "\"FALLBACK_L3\"");
    }
}
