/// Catalog of pathology categories used to classify certificates and to
/// resolve dashboard bucket labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathologyCategory {
    pub value: &'static str,
    pub label: &'static str,
    keywords: &'static [&'static str],
}

pub const PATHOLOGY_CATEGORIES: &[PathologyCategory] = &[
    PathologyCategory {
        value: "musculoskeletal",
        label: "Musculoskeletal disorders",
        keywords: &["muscul", "lumbar", "back", "fracture", "sprain", "ergonomic"],
    },
    PathologyCategory {
        value: "respiratory",
        label: "Respiratory diseases",
        keywords: &["respirat", "flu", "asthma", "cough", "bronch"],
    },
    PathologyCategory {
        value: "cardiovascular",
        label: "Cardiovascular",
        keywords: &["cardi", "heart", "hypertens"],
    },
    PathologyCategory {
        value: "neurological",
        label: "Neurological",
        keywords: &["neuro", "migraine", "headache", "epilep"],
    },
    PathologyCategory {
        value: "mental-health",
        label: "Mental health / Stress",
        keywords: &["stress", "anxiety", "mental", "burnout", "depress"],
    },
    PathologyCategory {
        value: "gastrointestinal",
        label: "Gastrointestinal",
        keywords: &["gastro", "stomach", "digest"],
    },
    PathologyCategory {
        value: "dermatological",
        label: "Dermatological",
        keywords: &["derma", "skin", "rash"],
    },
    PathologyCategory {
        value: "infectious",
        label: "Infectious diseases",
        keywords: &["infect", "viral", "covid", "contagious"],
    },
    PathologyCategory {
        value: "metabolic",
        label: "Metabolic / Endocrine",
        keywords: &["diabet", "metabol", "thyroid", "endocrin"],
    },
    PathologyCategory {
        value: "other",
        label: "Other",
        keywords: &[],
    },
];

/// Find a category by its stable value.
pub fn category_by_value(value: &str) -> Option<&'static PathologyCategory> {
    PATHOLOGY_CATEGORIES.iter().find(|c| c.value == value)
}

/// Classify free text (certificate type, title, reason) into a category.
/// Falls back to "other" so every certificate lands in some bucket.
pub fn classify(text: &str) -> &'static PathologyCategory {
    let haystack = text.to_lowercase();
    PATHOLOGY_CATEGORIES
        .iter()
        .find(|category| {
            category
                .keywords
                .iter()
                .any(|keyword| haystack.contains(keyword))
        })
        .unwrap_or(&PATHOLOGY_CATEGORIES[PATHOLOGY_CATEGORIES.len() - 1])
}
