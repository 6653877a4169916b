use crate::archive::RemoteFile;
use crate::error::Era5Error;
use crate::util::urljoin;

#[derive(Debug, serde::Deserialize)]
struct Link {
    #[serde(default)]
    rel: Option<String>,
    href: String,
}

fn find_link(links: &[Link], rel: &str) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel.as_deref() == Some(rel))
        .map(|l| l.href.clone())
}

/// Response to `POST .../processes/{id}/execution`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct SubmittedJob {
    #[serde(default, alias = "jobID")]
    pub(crate) job_id: Option<String>,
    #[serde(default)]
    links: Vec<Link>,
}

impl SubmittedJob {
    pub(crate) fn monitor_url(&self) -> Option<String> {
        find_link(&self.links, "monitor")
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct JobStatus {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    links: Vec<Link>,
}

impl JobStatus {
    pub(crate) fn results_url(&self) -> Option<String> {
        find_link(&self.links, "results")
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct JobResults {
    asset: Asset,
}

#[derive(Debug, serde::Deserialize)]
struct Asset {
    value: AssetValue,
}

#[derive(Debug, serde::Deserialize)]
struct AssetValue {
    href: String,
    #[serde(rename = "file:size")]
    file_size: u64,
    #[serde(default, rename = "type")]
    content_type: Option<String>,
}

impl JobResults {
    pub(crate) fn remote_file(&self, results_url: &str) -> Result<RemoteFile, Era5Error> {
        let href = self.asset.value.href.trim();
        if href.is_empty() {
            return Err(Era5Error::Transport(
                "job results carry no asset href".to_string(),
            ));
        }

        Ok(RemoteFile {
            location: urljoin(results_url, href),
            content_length: self.asset.value.file_size,
            content_type: self.asset.value.content_type.clone(),
        })
    }
}
