use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One canned reply. `category` is normally a [`Category`] key, but stored data and
/// callers may carry any string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Pricing,
    Objections,
    Advantages,
}

impl Category {
    /// Display order.
    pub const ALL: [Category; 4] = [
        Category::General,
        Category::Pricing,
        Category::Objections,
        Category::Advantages,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Pricing => "pricing",
            Category::Objections => "objections",
            Category::Advantages => "advantages",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::General => "الاستفسارات العامة",
            Category::Pricing => "معلومات الأسعار",
            Category::Objections => "الاعتراضات والردود",
            Category::Advantages => "مميزات العمل معي",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::General => "message-circle",
            Category::Pricing => "dollar-sign",
            Category::Objections => "shield",
            Category::Advantages => "star",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

/// The collection a fresh session starts with when nothing has been stored yet.
pub fn default_responses() -> Vec<ResponseRecord> {
    let entries = [
        (
            "1",
            "ترحيب بالعميل الجديد",
            "أهلاً وسهلاً بك! يسعدني التواصل معك. كيف يمكنني مساعدتك اليوم؟ أنا هنا للإجابة على جميع استفساراتك وتقديم أفضل الخدمات.",
            Category::General,
        ),
        (
            "2",
            "الاستفسار عن الخدمات",
            "نقدم مجموعة شاملة من الخدمات المتخصصة التي تلبي احتياجاتك بأعلى معايير الجودة والاحترافية. يمكنني تقديم تفاصيل أكثر حول الخدمة التي تهتم بها.",
            Category::General,
        ),
        (
            "3",
            "أسعار الخدمات الأساسية",
            "أسعارنا تنافسية جداً مقارنة بالسوق، ونقدم قيمة استثنائية مقابل السعر. يمكنني إرسال عرض سعر مفصل يناسب احتياجاتك المحددة.",
            Category::Pricing,
        ),
        (
            "4",
            "التعامل مع الاعتراض على السعر",
            "أتفهم قلقك بشأن التكلفة. دعني أوضح لك القيمة الحقيقية التي ستحصل عليها والنتائج المضمونة التي ستحققها من استثمارك معنا.",
            Category::Objections,
        ),
        (
            "5",
            "مميزات العمل معي",
            "خبرة عملية واسعة، التزام بالمواعيد، جودة عالية في التنفيذ، متابعة مستمرة، وضمان الرضا التام. نحن نضمن تحقيق أهدافك بأفضل الطرق الممكنة.",
            Category::Advantages,
        ),
    ];

    entries
        .into_iter()
        .map(|(id, title, content, category)| ResponseRecord {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            category: category.key().to_string(),
        })
        .collect()
}
