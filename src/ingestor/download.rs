use std::io::{Cursor, Read};
use zip::ZipArchive;

pub type GtfsArchive = ZipArchive<Cursor<Vec<u8>>>;

/// Fetches a GTFS bundle. `file://` URLs read from disk, everything else
/// goes through the HTTP client (120 s timeout set at construction).
pub async fn fetch_archive(
    client: &reqwest::Client,
    url: &str,
) -> Result<GtfsArchive, Box<dyn std::error::Error + Sync + Send>> {
    let body: Vec<u8> = match url.strip_prefix("file://") {
        Some(path) => tokio::fs::read(path).await?,
        None => {
            let response = client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(format!("HTTP {} for {}", response.status(), url).into());
            }
            response.bytes().await?.to_vec()
        }
    };

    let archive = ZipArchive::new(Cursor::new(body))?;
    Ok(archive)
}

/// Reads one CSV table out of the bundle, matching the name
/// case-insensitively. Missing tables return None.
pub fn read_table(archive: &mut GtfsArchive, name: &str) -> Option<String> {
    let entry_name = archive
        .file_names()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
        .map(|s| s.to_string())?;

    let mut entry = archive.by_name(&entry_name).ok()?;
    let mut content = String::new();
    entry.read_to_string(&mut content).ok()?;
    Some(content)
}
