mod helpers;

use era5_mcp::request::DatasetRequest;
use era5_mcp::{ErrorCategory, FetchStatus, fetch};
use helpers::{Behavior, FakeArchive};

#[cfg(test)]
mod tests {
    use super::*;

    fn t2m_request() -> DatasetRequest {
        DatasetRequest::single_levels("2m_temperature", "2023".into(), "01").unwrap()
    }

    #[test]
    fn test_success_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("nested/deeper/out.nc");
        let bytes = b"CDF\x01 pretend netcdf payload".to_vec();
        let archive = FakeArchive::new(Behavior::Succeed(bytes.clone()));

        let result = fetch(&archive, &t2m_request(), &destination);

        assert_eq!(result.status, FetchStatus::Success);
        assert_eq!(
            result.local_path.as_deref(),
            Some(destination.display().to_string().as_str())
        );
        assert_eq!(result.bytes_written, Some(bytes.len() as u64));
        assert_eq!(result.error_message, None);
        assert_eq!(std::fs::read(&destination).unwrap(), bytes);

        let calls = archive.calls.lock().unwrap();
        assert_eq!(calls.submitted.len(), 1);
        assert_eq!(calls.waits, 1);
        assert_eq!(calls.downloads, 1);
    }

    #[test]
    fn test_submitted_body_for_multi_year_pressure_request() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FakeArchive::new(Behavior::Succeed(b"x".to_vec()));
        let request = DatasetRequest::pressure_levels(
            "geopotential",
            Some(500),
            vec!["2021", "2022", "2023"].into(),
            "01",
        )
        .unwrap();

        let result = fetch(&archive, &request, &dir.path().join("z500.nc"));
        assert!(result.is_success());

        let calls = archive.calls.lock().unwrap();
        let (dataset, body) = &calls.submitted[0];
        assert_eq!(dataset, "reanalysis-era5-pressure-levels-monthly-means");
        assert_eq!(body["year"], serde_json::json!(["2021", "2022", "2023"]));
        assert_eq!(body["pressure_level"], serde_json::json!(["500"]));
        assert_eq!(body["data_format"], "netcdf");
    }

    #[test]
    fn test_remote_failure_carries_message_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("data/out.nc");
        let archive = FakeArchive::new(Behavior::FailJob(
            "the request you have submitted is not valid: year 1800".to_string(),
        ));

        let result = fetch(&archive, &t2m_request(), &destination);

        assert_eq!(result.status, FetchStatus::Failure);
        assert_eq!(result.local_path, None);
        assert_eq!(result.error_kind, Some(ErrorCategory::RemoteJob));
        let message = result.error_message.unwrap();
        assert!(message.contains("not valid: year 1800"), "{message}");
        assert!(message.starts_with("CDS job failed"));
        assert!(!destination.exists());
        assert!(!dir.path().join("data").exists());
        assert_eq!(archive.calls.lock().unwrap().downloads, 0);
    }

    #[test]
    fn test_transport_failure_is_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FakeArchive::new(Behavior::RefuseConnection);

        let result = fetch(&archive, &t2m_request(), &dir.path().join("out.nc"));

        assert_eq!(result.error_kind, Some(ErrorCategory::Transport));
        assert!(result.error_message.unwrap().contains("connection refused"));
        assert_eq!(archive.submitted(), 0);
    }

    #[test]
    fn test_broken_download_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.nc");
        let archive = FakeArchive::new(Behavior::BreakDownload(vec![7u8; 64]));

        let result = fetch(&archive, &t2m_request(), &destination);

        assert!(!result.is_success());
        assert_eq!(result.error_kind, Some(ErrorCategory::Transport));
        assert!(!destination.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_download_keeps_the_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.nc");
        std::fs::write(&destination, b"user data from last month").unwrap();
        let archive = FakeArchive::new(Behavior::FailDownload);

        let result = fetch(&archive, &t2m_request(), &destination);

        assert_eq!(result.status, FetchStatus::Failure);
        assert_eq!(result.error_kind, Some(ErrorCategory::Transport));
        assert_eq!(
            std::fs::read(&destination).unwrap(),
            b"user data from last month"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_broken_download_keeps_the_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.nc");
        std::fs::write(&destination, b"user data from last month").unwrap();
        let archive = FakeArchive::new(Behavior::BreakDownload(vec![7u8; 64]));

        let result = fetch(&archive, &t2m_request(), &destination);

        assert!(!result.is_success());
        assert_eq!(
            std::fs::read(&destination).unwrap(),
            b"user data from last month"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_success_replaces_the_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.nc");
        std::fs::write(&destination, b"an older and much longer download").unwrap();
        let archive = FakeArchive::new(Behavior::Succeed(b"CDF\x01 new".to_vec()));

        let result = fetch(&archive, &t2m_request(), &destination);

        assert!(result.is_success());
        assert_eq!(std::fs::read(&destination).unwrap(), b"CDF\x01 new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_directory_destination_is_a_write_error_before_submitting() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FakeArchive::new(Behavior::Succeed(b"x".to_vec()));

        let result = fetch(&archive, &t2m_request(), dir.path());

        assert_eq!(result.error_kind, Some(ErrorCategory::Write));
        assert!(result.error_message.unwrap().starts_with("could not write"));
        assert_eq!(archive.submitted(), 0);
    }

    #[test]
    fn test_unwritable_parent_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is needed.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let archive = FakeArchive::new(Behavior::Succeed(b"x".to_vec()));

        let result = fetch(&archive, &t2m_request(), &blocker.join("out.nc"));

        assert_eq!(result.error_kind, Some(ErrorCategory::Write));
        assert_eq!(archive.calls.lock().unwrap().downloads, 0);
    }
}
