//! Normalize `(locality, country)` pairs from statistics rows into the region
//! keys the feature index uses.
//!
//! Rules, first match wins:
//! 1. `"Mainland China"`: locality is translated to the Chinese province name.
//! 2. `"UK"`: country becomes `"United Kingdom"`.
//! 3. `"City, ST"`: the abbreviation after the comma becomes the full
//!    state/province name.
//! 4. Otherwise the locality itself, with the country as fallback.

use crate::error::ChoroplethError;
use crate::features::FeatureStore;
use crate::models::RegionKey;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

pub const MAINLAND_CHINA: &str = "Mainland China";
pub const UK_SHORT: &str = "UK";
pub const UNITED_KINGDOM: &str = "United Kingdom";

/// English province names (and the romanizations the data uses) to the names
/// the Chinese province layer is indexed by.
pub const CHINA_PROVINCES: &[(&str, &str)] = &[
    ("Anhui", "安徽"),
    ("Beijing", "北京"),
    ("Chongqing", "重庆"),
    ("Fujian", "福建"),
    ("Gansu", "甘肃"),
    ("Guangdong", "广东"),
    ("Guangxi", "广西"),
    ("Guizhou", "贵州"),
    ("Hainan", "海南"),
    ("Hebei", "河北"),
    ("Heilongjiang", "黑龙江"),
    ("Henan", "河南"),
    ("Hubei", "湖北"),
    ("Hunan", "湖南"),
    ("Inner Mongolia", "内蒙古"),
    ("Jiangsu", "江苏"),
    ("Jiangxi", "江西"),
    ("Jilin", "吉林"),
    ("Liaoning", "辽宁"),
    ("Macao", "澳门"),
    ("Ningxia", "宁夏"),
    ("Qinghai", "青海"),
    ("Shaanxi", "陕西"),
    ("Shandong", "山东"),
    ("Shanxi", "山西"),
    ("Shanghai", "上海"),
    ("Sichuan", "四川"),
    ("Taiwan", "台湾"),
    ("Tianjin", "天津"),
    ("Tibet", "西藏"),
    ("Xianggang", "香港"),
    ("Xinjiang", "新疆"),
    ("Xizang", "西藏"),
    ("Yunnan", "云南"),
    ("Zhejiang", "浙江"),
];

/// Postal abbreviations of US states, DC, and Canadian provinces/territories.
pub const NORTH_AMERICAN_SUBDIVISIONS: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    ("AB", "Alberta"),
    ("BC", "British Columbia"),
    ("MB", "Manitoba"),
    ("NB", "New Brunswick"),
    ("NL", "Newfoundland and Labrador"),
    ("NS", "Nova Scotia"),
    ("NT", "Northwest Territories"),
    ("NU", "Nunavut"),
    ("ON", "Ontario"),
    ("PE", "Prince Edward Island"),
    ("QC", "Quebec"),
    ("SK", "Saskatchewan"),
    ("YT", "Yukon"),
];

/// Extra entries layered over the built-in tables (loaded from configuration).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionAliases {
    pub china_provinces: Vec<(String, String)>,
    pub subdivisions: Vec<(String, String)>,
}

/// Key candidates produced by the rules, before consulting the feature index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates {
    pub primary: RegionKey,
    pub fallback: Option<RegionKey>,
}

#[derive(Debug, Clone)]
pub struct RegionKeyResolver {
    china: AHashMap<String, String>,
    subdivisions: AHashMap<String, String>,
}

impl Default for RegionKeyResolver {
    fn default() -> Self {
        Self::with_aliases(&RegionAliases::default())
    }
}

impl RegionKeyResolver {
    /// Built-in tables extended (and overridden) by `aliases`.
    pub fn with_aliases(aliases: &RegionAliases) -> Self {
        let table = |builtin: &[(&str, &str)], extra: &[(String, String)]| {
            builtin
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .chain(extra.iter().cloned())
                .collect::<AHashMap<_, _>>()
        };
        Self {
            china: table(CHINA_PROVINCES, &aliases.china_provinces),
            subdivisions: table(NORTH_AMERICAN_SUBDIVISIONS, &aliases.subdivisions),
        }
    }

    /// Apply the normalization rules. `None` means the pair can never match.
    pub fn candidates(&self, locality: &str, country: &str) -> Option<Candidates> {
        let locality = locality.trim();
        let country = country.trim();

        let fallback_for = |c: &str| (!c.is_empty()).then(|| RegionKey::from(c));

        if country == MAINLAND_CHINA {
            let province = self.china.get(locality)?;
            return Some(Candidates {
                primary: RegionKey::from(province.as_str()),
                fallback: fallback_for(country),
            });
        }

        if country == UK_SHORT {
            return Some(Candidates {
                primary: RegionKey::from(locality),
                fallback: fallback_for(UNITED_KINGDOM),
            });
        }

        if let Some((_, abbrev)) = locality.split_once(',') {
            let full = self.subdivisions.get(abbrev.trim())?;
            return Some(Candidates {
                primary: RegionKey::from(full.as_str()),
                fallback: fallback_for(country),
            });
        }

        Some(Candidates {
            primary: RegionKey::from(locality),
            fallback: fallback_for(country),
        })
    }

    /// Resolve against the feature index: primary candidate first, then the
    /// fallback.
    pub fn resolve<S: FeatureStore + ?Sized>(
        &self,
        locality: &str,
        country: &str,
        store: &S,
    ) -> Result<RegionKey, ChoroplethError> {
        let unresolved = || ChoroplethError::UnresolvedRegion {
            locality: locality.to_string(),
            country: country.to_string(),
        };
        let c = self.candidates(locality, country).ok_or_else(unresolved)?;
        if store.contains(c.primary.as_str()) {
            return Ok(c.primary);
        }
        match c.fallback {
            Some(fb) if store.contains(fb.as_str()) => Ok(fb),
            _ => Err(unresolved()),
        }
    }
}
