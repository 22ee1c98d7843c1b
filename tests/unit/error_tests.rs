//! Unit tests for `AppError` display format.

use logistics_relay::AppError;

#[test]
fn display_prefixes_each_variant() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Slack("bad".into()), "slack: bad"),
        (AppError::Directory("bad".into()), "directory: bad"),
        (AppError::Download("bad".into()), "download: bad"),
        (AppError::Upload("bad".into()), "upload: bad"),
        (AppError::Io("bad".into()), "io: bad"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn download_and_upload_are_distinct() {
    let download = AppError::Download("status 404".into());
    let upload = AppError::Upload("status 404".into());
    assert_ne!(download.to_string(), upload.to_string());
}

#[test]
fn toml_error_maps_to_config() {
    let parse_err = toml::from_str::<toml::Value>("= nope").expect_err("invalid toml");
    let err = AppError::from(parse_err);
    assert!(matches!(err, AppError::Config(_)));
    assert!(err.to_string().starts_with("config: invalid config"));
}

#[test]
fn io_error_maps_to_io() {
    let err = AppError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
    assert_eq!(err.to_string(), "io: gone");
}

#[test]
fn implements_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    let err = AppError::Directory("unavailable".into());
    assert_error(&err);
    assert!(format!("{err:?}").contains("Directory"));
}
