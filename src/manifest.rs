use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Feed manifest: the list of agencies with their GTFS archive URL and
/// optional GTFS-RT endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub source: String,
    pub agencies: Vec<AgencyEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgencyEntry {
    pub name: String,
    pub slug: String,
    pub gtfs_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gtfs_rt: Option<GtfsRtEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GtfsRtEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_positions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_updates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<String>,
}

impl Manifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Manifest, Box<dyn std::error::Error + Sync + Send>> {
        let data = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&data)?;
        Ok(manifest)
    }

    /// Keep only agencies whose slug is in the comma-separated filter.
    /// An empty filter keeps everything.
    pub fn filter_slugs(&self, filter: Option<&str>) -> Vec<AgencyEntry> {
        let wanted: HashSet<&str> = match filter {
            Some(list) => list
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect(),
            None => HashSet::new(),
        };

        self.agencies
            .iter()
            .filter(|a| wanted.is_empty() || wanted.contains(a.slug.as_str()))
            .cloned()
            .collect()
    }

    /// Agencies declaring at least one GTFS-RT endpoint.
    pub fn realtime_agencies(&self) -> Vec<AgencyEntry> {
        self.agencies
            .iter()
            .filter(|a| a.gtfs_rt.is_some())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        serde_json::from_str(
            r#"{
                "source": "test fixtures",
                "agencies": [
                    {"name": "Bilbobus", "slug": "bilbobus", "gtfs_url": "https://example.com/bilbobus.zip",
                     "gtfs_rt": {"vehicle_positions": "https://example.com/vp.pb"}},
                    {"name": "EuskoTren", "slug": "euskotren", "gtfs_url": "https://example.com/euskotren.zip"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_optional_rt_block() {
        let m = sample();
        assert_eq!(m.agencies.len(), 2);
        assert!(m.agencies[0].gtfs_rt.is_some());
        assert!(m.agencies[1].gtfs_rt.is_none());
        assert_eq!(
            m.agencies[0].gtfs_rt.as_ref().unwrap().vehicle_positions.as_deref(),
            Some("https://example.com/vp.pb")
        );
        assert!(m.agencies[0].gtfs_rt.as_ref().unwrap().trip_updates.is_none());
    }

    #[test]
    fn test_filter_slugs_empty_keeps_all() {
        let m = sample();
        assert_eq!(m.filter_slugs(None).len(), 2);
        assert_eq!(m.filter_slugs(Some("")).len(), 2);
    }

    #[test]
    fn test_filter_slugs_selects() {
        let m = sample();
        let picked = m.filter_slugs(Some("euskotren"));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].slug, "euskotren");
    }

    #[test]
    fn test_filter_slugs_trims_whitespace() {
        let m = sample();
        let picked = m.filter_slugs(Some(" bilbobus , euskotren "));
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn test_realtime_agencies() {
        let m = sample();
        let rt = m.realtime_agencies();
        assert_eq!(rt.len(), 1);
        assert_eq!(rt[0].slug, "bilbobus");
    }
}
