//! State fluoridation guideline directory
//!
//! Maps a full state name to the health department page a summary should
//! point readers at. The built-in table is initialized once and never mutated.

use once_cell::sync::Lazy;
use std::collections::HashMap;

const BUILTIN_GUIDELINES: &[(&str, &str)] = &[
    ("Alabama", "https://www.alabamapublichealth.gov/oralhealth/fluoridation.html"),
    ("Alaska", "http://dhss.alaska.gov/dph/wcfh/Pages/oralhealth/fluoride.aspx"),
    ("Arizona", "https://www.azdhs.gov/prevention/womens-childrens-health/oral-health/index.php#community-water-fluoridation"),
    ("Arkansas", "https://www.healthy.arkansas.gov/programs-services/topics/community-water-fluoridation"),
    ("California", "https://www.cdph.ca.gov/Programs/CCDPHP/DCDIC/CDCB/Pages/OralHealthProgram/Fluoridation.aspx"),
    ("Colorado", "https://cdphe.colorado.gov/fluoride"),
    ("Connecticut", "https://portal.ct.gov/DPH/Health-Education-Management--Surveillance/Oral-Health/Community-Water-Fluoridation"),
    ("Delaware", "https://www.dhss.delaware.gov/dhss/dph/hsm/fluoridation.html"),
    ("Florida", "http://www.floridahealth.gov/programs-and-services/community-health/dental-health/fluoridation/index.html"),
    ("Georgia", "https://dph.georgia.gov/oral-health/fluoridation"),
    ("Hawaii", "https://health.hawaii.gov/about/contact/"),
    ("Idaho", "https://healthandwelfare.idaho.gov/"),
    ("Illinois", "http://www.dph.illinois.gov/"),
    ("Indiana", "https://www.in.gov/health/"),
    ("Iowa", "https://idph.iowa.gov/"),
    ("Kansas", "http://www.kdheks.gov/"),
    ("Kentucky", "https://chfs.ky.gov/"),
    ("Louisiana", "https://ldh.la.gov/"),
    ("Maine", "https://www.maine.gov/dhhs/"),
    ("Maryland", "https://health.maryland.gov/"),
    ("Massachusetts", "https://www.mass.gov/orgs/department-of-public-health"),
    ("Michigan", "https://www.michigan.gov/mdhhs/adult-child-serv/childrenfamilies/familyhealth/oralhealth/community-water-fluoridation"),
    ("Minnesota", "https://www.health.state.mn.us/"),
    ("Mississippi", "https://msdh.ms.gov/"),
    ("Missouri", "https://health.mo.gov/"),
    ("Montana", "https://dphhs.mt.gov/"),
    ("Nebraska", "http://dhhs.ne.gov/"),
    ("Nevada", "https://dpbh.nv.gov/"),
    ("New Hampshire", "https://www.dhhs.nh.gov/"),
    ("New Jersey", "https://www.nj.gov/health/"),
    ("New Mexico", "https://www.nmhealth.org/"),
    ("New York", "https://www.health.ny.gov/prevention/dental/fluoridation/"),
    ("North Carolina", "https://www.ncdhhs.gov/"),
    ("North Dakota", "https://www.health.nd.gov/"),
    ("Ohio", "https://odh.ohio.gov/"),
    ("Oklahoma", "https://oklahoma.gov/health.html"),
    ("Oregon", "https://www.oregon.gov/oha/"),
    ("Pennsylvania", "https://www.health.pa.gov/"),
    ("Rhode Island", "https://health.ri.gov/"),
    ("South Carolina", "https://www.scdhec.gov/"),
    ("South Dakota", "https://doh.sd.gov/"),
    ("Tennessee", "https://www.tn.gov/health.html"),
    ("Texas", "https://www.dshs.state.tx.us/dental/oralhealthfluoridation.shtm"),
    ("Utah", "https://health.utah.gov/"),
    ("Vermont", "https://www.healthvermont.gov/wellness/oral-health/fluoride"),
    ("Virginia", "https://www.vdh.virginia.gov/"),
    ("Washington", "https://www.doh.wa.gov/"),
    ("West Virginia", "https://dhhr.wv.gov/"),
    ("Wisconsin", "https://www.dhs.wisconsin.gov/oral-health/index.htm"),
    ("Wyoming", "https://health.wyo.gov/publichealth/mch/oralhealth/"),
    ("District of Columbia", "https://dchealth.dc.gov/"),
];

static BUILTIN: Lazy<GuidelineDirectory> =
    Lazy::new(|| GuidelineDirectory::from_entries(BUILTIN_GUIDELINES.iter().copied()));

/// Read-only state name -> guideline URL lookup
#[derive(Debug, Clone, Default)]
pub struct GuidelineDirectory {
    urls: HashMap<String, String>,
}

impl GuidelineDirectory {
    /// Shared directory covering every state and DC
    pub fn builtin() -> &'static GuidelineDirectory {
        &BUILTIN
    }

    /// Build a directory from explicit (state name, url) pairs
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            urls: entries
                .into_iter()
                .map(|(state, url)| (state.into(), url.into()))
                .collect(),
        }
    }

    pub fn lookup(&self, state_name: &str) -> Option<&str> {
        self.urls.get(state_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::STATE_ABBREVIATIONS;

    #[test]
    fn test_builtin_covers_every_state() {
        let directory = GuidelineDirectory::builtin();
        for (_, name) in STATE_ABBREVIATIONS {
            assert!(directory.lookup(name).is_some(), "no guideline for {}", name);
        }
        assert_eq!(directory.len(), STATE_ABBREVIATIONS.len());
    }

    #[test]
    fn test_lookup_by_full_name_only() {
        let directory = GuidelineDirectory::builtin();
        assert_eq!(directory.lookup("Colorado"), Some("https://cdphe.colorado.gov/fluoride"));
        assert_eq!(directory.lookup("CO"), None);
        assert_eq!(directory.lookup("Puerto Rico"), None);
    }

    #[test]
    fn test_custom_directory() {
        let directory = GuidelineDirectory::from_entries([("Texas", "https://example.org/tx")]);
        assert_eq!(directory.lookup("Texas"), Some("https://example.org/tx"));
        assert_eq!(directory.lookup("Ohio"), None);
        assert!(GuidelineDirectory::default().is_empty());
    }
}
