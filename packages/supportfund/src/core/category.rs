use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    SocialEnterprise,
    Cooperative,
    VillageEnterprise,
    SocialVenture,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::SocialEnterprise,
        Category::Cooperative,
        Category::VillageEnterprise,
        Category::SocialVenture,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::SocialEnterprise => "사회적기업",
            Category::Cooperative => "협동조합",
            Category::VillageEnterprise => "마을기업",
            Category::SocialVenture => "소셜벤처",
            Category::Other => "기타",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// 제목에 포함된 키워드로 분류합니다. 여러 키워드가 함께 있으면 앞선 규칙이 우선합니다.
pub fn classify(title: &str) -> Category {
    if title.contains("사회적") {
        Category::SocialEnterprise
    } else if title.contains("협동") {
        Category::Cooperative
    } else if title.contains("마을") {
        Category::VillageEnterprise
    } else if title.contains("소셜") || title.contains("벤처") {
        Category::SocialVenture
    } else {
        Category::Other
    }
}
