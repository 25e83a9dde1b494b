//! Hong Kong districts and the sub-districts that roll up into them

use std::collections::HashMap;

/// The eighteen districts, in administrative order
pub const DISTRICTS: &[&str] = &[
    "Central and Western",
    "Wan Chai",
    "Eastern",
    "Southern",
    "Yau Tsim Mong",
    "Sham Shui Po",
    "Kowloon City",
    "Wong Tai Sin",
    "Kwun Tong",
    "Kwai Tsing",
    "Tsuen Wan",
    "Tuen Mun",
    "Yuen Long",
    "North",
    "Tai Po",
    "Sha Tin",
    "Sai Kung",
    "Islands",
];

/// Sub-districts grouped under their district
pub const SUB_DISTRICTS_BY_DISTRICT: &[(&str, &[&str])] = &[
    ("Central and Western", &[
        "Kennedy Town", "Shek Tong Tsui", "Sai Ying Pun", "Sheung Wan",
        "Central", "Admiralty", "Mid-levels", "Peak",
    ]),
    ("Wan Chai", &[
        "Wan Chai", "Causeway Bay", "Happy Valley", "Tai Hang",
        "So Kon Po", "Jardine's Lookout",
    ]),
    ("Eastern", &[
        "Tin Hau", "Braemar Hill", "North Point", "Quarry Bay",
        "Sai Wan Ho", "Shau Kei Wan", "Chai Wan", "Siu Sai Wan",
    ]),
    ("Southern", &[
        "Pok Fu Lam", "Aberdeen", "Ap Lei Chau", "Wong Chuk Hang",
        "Shouson Hill", "Repulse Bay", "Chung Hom Kok", "Stanley",
        "Tai Tam", "Shek O",
    ]),
    ("Yau Tsim Mong", &[
        "Tsim Sha Tsui", "Yau Ma Tei", "West Kowloon Reclamation",
        "King's Park", "Mong Kok", "Tai Kok Tsui",
    ]),
    ("Sham Shui Po", &[
        "Mei Foo", "Lai Chi Kok", "Cheung Sha Wan", "Sham Shui Po",
        "Shek Kip Mei", "Yau Yat Tsuen", "Tai Wo Ping", "Stonecutters Island",
    ]),
    ("Kowloon City", &[
        "Hung Hom", "To Kwa Wan", "Ma Tau Kok", "Ma Tau Wai", "Kai Tak",
        "Kowloon City", "Ho Man Tin", "Kowloon Tong", "Beacon Hill",
    ]),
    ("Wong Tai Sin", &[
        "San Po Kong", "Wong Tai Sin", "Tung Tau", "Wang Tau Hom",
        "Lok Fu", "Diamond Hill", "Tsz Wan Shan", "Ngau Chi Wan",
    ]),
    ("Kwun Tong", &[
        "Ping Shek", "Kowloon Bay", "Ngau Tau Kok", "Jordan Valley",
        "Kwun Tong", "Sai Cho Wan", "Lam Tin", "Yau Tong", "Lei Yue Mun",
    ]),
    ("Kwai Tsing", &["Kwai Chung", "Tsing Yi"]),
    ("Tsuen Wan", &[
        "Tsuen Wan", "Lei Muk Shue", "Ting Kau", "Sham Tseng",
        "Tsing Lung Tau", "Ma Wan", "Sunny Bay",
    ]),
    ("Tuen Mun", &["Tai Lam Chung", "So Kwun Wat", "Tuen Mun", "Lam Tei"]),
    ("Yuen Long", &[
        "Hung Shui Kiu", "Ha Tsuen", "Lau Fau Shan", "Tin Shui Wai",
        "Yuen Long", "San Tin", "Lok Ma Chau", "Kam Tin", "Shek Kong",
        "Pat Heung",
    ]),
    ("North", &[
        "Fanling", "Luen Wo Hui", "Sheung Shui", "Shek Wu Hui",
        "Sha Tau Kok", "Luk Keng", "Wu Kau Tang",
    ]),
    ("Tai Po", &[
        "Tai Po Market", "Tai Po", "Tai Po Kau", "Tai Mei Tuk",
        "Shuen Wan", "Cheung Muk Tau", "Kei Ling Ha",
    ]),
    ("Sha Tin", &["Tai Wai", "Sha Tin", "Fo Tan", "Ma Liu Shui", "Wu Kai Sha", "Ma On Shan"]),
    ("Sai Kung", &[
        "Clear Water Bay", "Sai Kung", "Tai Mong Tsai", "Tseung Kwan O",
        "Hang Hau", "Tiu Keng Leng", "Ma Yau Tong",
    ]),
    ("Islands", &["Cheung Chau", "Peng Chau", "Lantau Island", "Tung Chung", "Lamma Island"]),
];

/// All sub-district names, in table order
pub fn sub_districts() -> Vec<&'static str> {
    SUB_DISTRICTS_BY_DISTRICT
        .iter()
        .flat_map(|(_, subs)| subs.iter().copied())
        .collect()
}

/// Lookup from sub-district to district
#[derive(Debug, Clone, Default)]
pub struct DistrictMap {
    by_sub_district: HashMap<String, String>,
}

impl DistrictMap {
    /// The built-in Hong Kong mapping
    pub fn hong_kong() -> Self {
        let mut map = Self::default();
        for (district, subs) in SUB_DISTRICTS_BY_DISTRICT {
            for sub in *subs {
                map.insert(sub, district);
            }
        }
        map
    }

    pub fn insert(&mut self, sub_district: &str, district: &str) {
        self.by_sub_district
            .insert(sub_district.to_string(), district.to_string());
    }

    pub fn district_of(&self, sub_district: &str) -> Option<&str> {
        self.by_sub_district.get(sub_district).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_sub_district.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sub_district.is_empty()
    }
}
